use serde::{Deserialize, Serialize};

/// The client-side credential set. Persisted by a [`CredentialStore`]
/// implementation and read on every authenticated request.
///
/// An absent access token means the caller is unauthenticated. A present
/// refresh token with an absent or expired access token means one
/// refresh is attempted before giving up.
///
/// [`CredentialStore`]: crate::store::CredentialStore
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub user_email: Option<String>,
    pub display_name: Option<String>,
}

impl Credentials {
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }
}

/// Token pair returned by login, signup and google-login.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthTokens {
    pub message: Option<String>,
    pub access: String,
    pub refresh: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl AuthTokens {
    /// Build the credential set to persist after a successful
    /// authentication. `fallback_email` is the address the user typed,
    /// used when the backend omits one.
    pub fn into_credentials(self, fallback_email: Option<&str>) -> Credentials {
        Credentials {
            access_token: Some(self.access),
            refresh_token: Some(self.refresh),
            user_email: self.email.or_else(|| fallback_email.map(String::from)),
            display_name: self.display_name,
        }
    }
}

/// Body of `POST /api/token/refresh/`. A 2xx without an `access` field
/// still counts as a failed refresh.
#[derive(Debug, Deserialize)]
pub struct RefreshResponse {
    pub access: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Response of the protected probe (`GET /api/protected/`).
#[derive(Debug, Deserialize)]
pub struct WhoamiResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}
