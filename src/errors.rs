use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure (DNS, connect, TLS, timeout). Not
    /// interpretable by the gateway; surfaced to the caller as-is.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-2xx, non-401 response. `detail` carries the backend's
    /// `error`/`detail` field when the body had one, raw text otherwise.
    #[error("{context} failed ({status}): {detail}")]
    Http {
        context: &'static str,
        status: StatusCode,
        detail: String,
    },

    /// 401 with no path to recovery. The credential store has already
    /// been cleared and a session-invalidated event emitted.
    #[error("authentication failed, please log in again")]
    AuthenticationFailed,

    /// Descriptor URL outside both service bases.
    #[error("url does not belong to a known service base: {0}")]
    UnknownBase(String),

    #[error("credential store error: {0}")]
    Store(#[from] anyhow::Error),

    #[error("unexpected response shape from {context}: {source}")]
    Decode {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

impl ApiError {
    /// Build an `Http` error from a failed response, pulling the
    /// backend's own message out of the body when it is JSON-shaped.
    pub async fn from_response(context: &'static str, res: reqwest::Response) -> Self {
        let status = res.status();
        let text = res.text().await.unwrap_or_default();
        ApiError::Http {
            context,
            status,
            detail: extract_detail(&text, context, status),
        }
    }
}

/// The auth backend reports failures as `{"error": "..."}` or
/// `{"detail": "..."}`; fall back to the raw body, then to a generic
/// `<context> failed (<status>)` line.
fn extract_detail(body: &str, context: &str, status: StatusCode) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["error", "detail"] {
            if let Some(msg) = value.get(key).and_then(|v| v.as_str()) {
                return msg.to_string();
            }
        }
    }
    if body.trim().is_empty() {
        format!("{} failed ({})", context, status.as_u16())
    } else {
        body.trim().to_string()
    }
}
