use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_session_id: Option<Uuid>,
    pub message_type: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A chat session as the session-storage endpoints return it. Owned by
/// the backend; the client only mirrors it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub message_count: i64,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub document_id: Option<Uuid>,
}

/// Session plus its full ordered transcript, from the
/// `with-messages` listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionWithMessages {
    #[serde(flatten)]
    pub session: ChatSession,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
pub struct CreateSessionRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct SaveMessageRequest {
    pub content: String,
    pub message_type: MessageRole,
}

/// Response of the document service's multipart upload endpoint. The
/// service creates a chat session for the document as a side effect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub chat_id: Option<String>,
    pub chat_name: Option<String>,
    pub document_id: Option<String>,
    /// Free-form summary block (agreement type, word count, text).
    pub initial_summary: Option<serde_json::Value>,
}

/// Response of `POST /api/ask-question`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub success: bool,
    pub response: String,
    pub chat_id: Option<String>,
    pub message_count: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct AskRequest {
    pub query: String,
    pub chat_id: Option<String>,
    pub document_id: Option<String>,
}
