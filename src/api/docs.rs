use std::sync::Arc;

use bytes::Bytes;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::gateway::{Gateway, MultipartFile, RequestDescriptor};
use crate::models::chat::{
    AskRequest, AskResponse, ChatMessage, ChatSession, CreateSessionRequest, MessageRole,
    SaveMessageRequest, SessionWithMessages, UploadResponse,
};

const UPLOAD_FIELD: &str = "file";
const PDF_MIME: &str = "application/pdf";

/// Typed client for the document service and the chat-session storage
/// endpoints the auth service proxies. Everything here runs through the
/// authenticated gateway and so inherits the refresh-and-retry cycle.
pub struct DocsApi {
    gateway: Arc<Gateway>,
}

impl DocsApi {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    /// POST /api/upload-document — multipart form with a single `file`
    /// field. The service builds a chat session for the document and
    /// returns its id alongside an initial summary.
    pub async fn upload_document(
        &self,
        file_name: &str,
        bytes: Bytes,
    ) -> Result<UploadResponse, ApiError> {
        let descriptor = RequestDescriptor::upload(
            self.gateway.docs_url("/api/upload-document"),
            MultipartFile {
                field: UPLOAD_FIELD.to_string(),
                file_name: file_name.to_string(),
                mime: PDF_MIME.to_string(),
                bytes,
            },
        );
        let response = self.gateway.send(descriptor).await?;
        if !response.status().is_success() {
            return Err(ApiError::from_response("upload", response).await);
        }
        response
            .json()
            .await
            .map_err(|source| ApiError::Decode { context: "upload", source })
    }

    /// POST /api/ask-question. `chat_id` continues an existing session,
    /// `document_id` scopes retrieval to one uploaded document.
    pub async fn ask_question(
        &self,
        query: &str,
        chat_id: Option<&str>,
        document_id: Option<&str>,
    ) -> Result<AskResponse, ApiError> {
        let body = AskRequest {
            query: query.to_string(),
            chat_id: chat_id.map(String::from),
            document_id: document_id.map(String::from),
        };
        let descriptor = RequestDescriptor::post_json(
            self.gateway.docs_url("/api/ask-question"),
            serde_json::to_value(&body).expect("ask request serializes"),
        );
        let response = self.gateway.send(descriptor).await?;
        if !response.status().is_success() {
            return Err(ApiError::from_response("question", response).await);
        }
        response
            .json()
            .await
            .map_err(|source| ApiError::Decode { context: "question", source })
    }

    /// POST /api/geniai/chat-sessions/.
    pub async fn create_session(
        &self,
        name: &str,
        document_id: Option<Uuid>,
    ) -> Result<ChatSession, ApiError> {
        let body = CreateSessionRequest {
            name: name.to_string(),
            document_id,
        };
        let descriptor = RequestDescriptor::post_json(
            self.gateway.auth_url("/api/geniai/chat-sessions/"),
            serde_json::to_value(&body).expect("create-session request serializes"),
        );
        let response = self.gateway.send(descriptor).await?;
        if !response.status().is_success() {
            return Err(ApiError::from_response("create session", response).await);
        }
        response.json().await.map_err(|source| ApiError::Decode {
            context: "create session",
            source,
        })
    }

    /// GET /api/geniai/chat-sessions/list/ — newest activity first.
    pub async fn list_sessions(&self) -> Result<Vec<ChatSession>, ApiError> {
        let descriptor =
            RequestDescriptor::get(self.gateway.auth_url("/api/geniai/chat-sessions/list/"));
        let response = self.gateway.send(descriptor).await?;
        if !response.status().is_success() {
            return Err(ApiError::from_response("list sessions", response).await);
        }
        response.json().await.map_err(|source| ApiError::Decode {
            context: "list sessions",
            source,
        })
    }

    /// GET /api/geniai/chat-sessions/{id}/messages/ — ordered transcript.
    pub async fn session_messages(&self, session_id: Uuid) -> Result<Vec<ChatMessage>, ApiError> {
        let descriptor = RequestDescriptor::get(
            self.gateway
                .auth_url(&format!("/api/geniai/chat-sessions/{}/messages/", session_id)),
        );
        let response = self.gateway.send(descriptor).await?;
        if !response.status().is_success() {
            return Err(ApiError::from_response("list messages", response).await);
        }
        response.json().await.map_err(|source| ApiError::Decode {
            context: "list messages",
            source,
        })
    }

    /// POST /api/geniai/chat-sessions/{id}/messages/ — record one side
    /// of an exchange.
    pub async fn save_message(
        &self,
        session_id: Uuid,
        content: &str,
        message_type: MessageRole,
    ) -> Result<ChatMessage, ApiError> {
        let body = SaveMessageRequest {
            content: content.to_string(),
            message_type,
        };
        let descriptor = RequestDescriptor::post_json(
            self.gateway
                .auth_url(&format!("/api/geniai/chat-sessions/{}/messages/", session_id)),
            serde_json::to_value(&body).expect("save-message request serializes"),
        );
        let response = self.gateway.send(descriptor).await?;
        if !response.status().is_success() {
            return Err(ApiError::from_response("save message", response).await);
        }
        response.json().await.map_err(|source| ApiError::Decode {
            context: "save message",
            source,
        })
    }

    /// GET /api/geniai/chat-sessions/with-messages/ — the full-fetch
    /// shape the session cache is rebuilt from.
    pub async fn sessions_with_messages(&self) -> Result<Vec<SessionWithMessages>, ApiError> {
        let descriptor = RequestDescriptor::get(
            self.gateway
                .auth_url("/api/geniai/chat-sessions/with-messages/"),
        );
        let response = self.gateway.send(descriptor).await?;
        if !response.status().is_success() {
            return Err(ApiError::from_response("sync sessions", response).await);
        }
        response.json().await.map_err(|source| ApiError::Decode {
            context: "sync sessions",
            source,
        })
    }
}
