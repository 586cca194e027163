pub mod header;
pub mod khatmas;
pub mod notifications;
pub mod parts;
pub mod standing;
pub mod statusbar;
