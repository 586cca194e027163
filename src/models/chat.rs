use serde::{Deserialize, Serialize};

text_enum! {
    ChatScope, "chat scope" {
        Khatma => ("khatma", "Khatma"),
        Group => ("group", "Group"),
    }
}

text_enum! {
    MessageType, "message type" {
        Text => ("text", "Text"),
        System => ("system", "System"),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: i64,
    pub scope: ChatScope,
    pub scope_id: i64,
    pub user_id: i64,
    pub username: String,
    pub message: String,
    pub message_type: MessageType,
    pub is_pinned: bool,
    pub created_at: String,
}
