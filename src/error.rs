use thiserror::Error;

/// Rule violations raised by the services layer.
///
/// Services return `anyhow::Result`; callers that need to branch on the
/// reason downcast to this type.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KhatmaError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("limit reached: {0}")]
    LimitReached(String),

    #[error("not accepting: {0}")]
    NotAccepting(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("no acting user; pass --user <name> or run `khatma setup`")]
    NoActor,
}

impl KhatmaError {
    pub fn not_found(what: impl Into<String>) -> anyhow::Error {
        KhatmaError::NotFound(what.into()).into()
    }

    pub fn denied(what: impl Into<String>) -> anyhow::Error {
        KhatmaError::PermissionDenied(what.into()).into()
    }

    pub fn exists(what: impl Into<String>) -> anyhow::Error {
        KhatmaError::AlreadyExists(what.into()).into()
    }

    pub fn invalid(what: impl Into<String>) -> anyhow::Error {
        KhatmaError::InvalidInput(what.into()).into()
    }
}

/// Pull the domain error out of an `anyhow::Error`, if that is what it wraps.
pub fn domain_error(err: &anyhow::Error) -> Option<&KhatmaError> {
    err.downcast_ref::<KhatmaError>()
}
