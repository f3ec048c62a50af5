pub mod descriptor;

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Response, StatusCode};
use tokio::sync::{broadcast, Mutex};
use url::Url;

use crate::config::Config;
use crate::errors::ApiError;
use crate::models::auth::{Credentials, RefreshResponse};
use crate::store::CredentialStore;

pub use descriptor::{MultipartFile, RequestBody, RequestDescriptor, ServiceBase};

// Header names must be lowercase for `HeaderMap::insert`; the wire is
// case-insensitive so the backends see what they expect.
pub const USER_EMAIL_HEADER: &str = "x-user-email";
pub const CSRF_HEADER: &str = "x-csrftoken";
const CSRF_COOKIE: &str = "csrftoken";
const REFRESH_PATH: &str = "/api/token/refresh/";

/// Emitted when the gateway gives up on the current session: the store
/// has been cleared and the caller got an authentication error. The
/// presentation layer decides what to do next (the CLI tells the user
/// to log in again); the gateway performs no navigation itself.
#[derive(Debug, Clone)]
pub struct SessionInvalidated {
    pub reason: String,
}

/// Client-side façade over the two backend services.
///
/// Attaches the stored credentials to every request, recovers from an
/// expired access token with a single refresh-and-retry cycle, and
/// invalidates the session when recovery is impossible. Refresh
/// attempts are serialized: concurrent 401s share one refresh call.
pub struct Gateway {
    config: Config,
    store: Arc<dyn CredentialStore>,
    /// Client for the auth base. Replays the service's own cookies,
    /// which is where the CSRF token comes from.
    auth_http: Client,
    /// Client for the docs base. No cookie forwarding.
    docs_http: Client,
    jar: Arc<Jar>,
    refresh_lock: Mutex<()>,
    invalidated_tx: broadcast::Sender<SessionInvalidated>,
}

impl Gateway {
    pub fn new(config: Config, store: Arc<dyn CredentialStore>) -> Self {
        let jar = Arc::new(Jar::default());
        let auth_http = Client::builder()
            .use_rustls_tls()
            .cookie_provider(jar.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .expect("failed to build HTTP client");
        let docs_http = Client::builder()
            .use_rustls_tls()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .expect("failed to build HTTP client");
        let (invalidated_tx, _) = broadcast::channel(8);

        Self {
            config,
            store,
            auth_http,
            docs_http,
            jar,
            refresh_lock: Mutex::new(()),
            invalidated_tx,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// Subscribe to session-invalidated events.
    pub fn subscribe_invalidations(&self) -> broadcast::Receiver<SessionInvalidated> {
        self.invalidated_tx.subscribe()
    }

    /// Resolve a path against the auth-service base.
    pub fn auth_url(&self, path: &str) -> Url {
        self.config
            .auth_base_url
            .join(path)
            .expect("valid auth endpoint path")
    }

    /// Resolve a path against the document-service base.
    pub fn docs_url(&self, path: &str) -> Url {
        self.config
            .docs_base_url
            .join(path)
            .expect("valid docs endpoint path")
    }

    /// Issue an authenticated request.
    ///
    /// Attaches the stored credentials, and on a 401 runs the refresh
    /// cycle: one refresh call, one reissue of the original request. A
    /// second 401, a failed refresh, or a missing refresh token clears
    /// the store, emits [`SessionInvalidated`] and returns
    /// [`ApiError::AuthenticationFailed`]. Any other status is returned
    /// to the caller uninterpreted; network errors propagate as-is.
    pub async fn send(&self, descriptor: RequestDescriptor) -> Result<Response, ApiError> {
        let base = self.classify(&descriptor.url)?;
        let credentials = self.load_credentials().await?;
        let access = credentials.as_ref().and_then(|c| c.access_token.clone());

        let response = self
            .dispatch(&descriptor, base, access.as_deref(), credentials.as_ref())
            .await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        tracing::debug!(url = %descriptor.url, "request rejected with 401, attempting token refresh");
        let refreshed = self.refresh_access_token(access.as_deref()).await?;
        let Some(new_access) = refreshed else {
            self.invalidate("credential refresh failed").await?;
            return Err(ApiError::AuthenticationFailed);
        };

        // Reload so the retry sees the refreshed set (and any identity
        // fields another caller wrote in the meantime).
        let credentials = self.load_credentials().await?;
        let retried = self
            .dispatch(&descriptor, base, Some(&new_access), credentials.as_ref())
            .await?;
        if retried.status() == StatusCode::UNAUTHORIZED {
            self.invalidate("request rejected again after refresh").await?;
            return Err(ApiError::AuthenticationFailed);
        }
        Ok(retried)
    }

    /// Issue a request with no credential headers and no refresh cycle.
    /// Used by the endpoints that establish credentials in the first
    /// place (login, signup, password reset, the refresh call itself).
    pub async fn send_public(&self, descriptor: RequestDescriptor) -> Result<Response, ApiError> {
        let base = self.classify(&descriptor.url)?;
        let client = self.client_for(base);
        let request = client
            .request(descriptor.method.clone(), descriptor.url.clone())
            .headers(descriptor.headers.clone());
        let request = apply_body(request, &descriptor.body);
        Ok(request.send().await?)
    }

    fn classify(&self, url: &Url) -> Result<ServiceBase, ApiError> {
        ServiceBase::classify(url, &self.config.auth_base_url, &self.config.docs_base_url)
            .ok_or_else(|| ApiError::UnknownBase(url.to_string()))
    }

    fn client_for(&self, base: ServiceBase) -> &Client {
        match base {
            ServiceBase::Auth => &self.auth_http,
            ServiceBase::Docs => &self.docs_http,
        }
    }

    async fn load_credentials(&self) -> Result<Option<Credentials>, ApiError> {
        self.store.load().await.map_err(ApiError::Store)
    }

    async fn dispatch(
        &self,
        descriptor: &RequestDescriptor,
        base: ServiceBase,
        access: Option<&str>,
        credentials: Option<&Credentials>,
    ) -> Result<Response, ApiError> {
        let request = self
            .client_for(base)
            .request(descriptor.method.clone(), descriptor.url.clone())
            .headers(descriptor.headers.clone())
            .headers(self.credential_headers(access, credentials));
        let request = apply_body(request, &descriptor.body);
        Ok(request.send().await?)
    }

    /// Headers derived from the current credential set: bearer token,
    /// user identity, CSRF token from the auth-service cookie.
    fn credential_headers(
        &self,
        access: Option<&str>,
        credentials: Option<&Credentials>,
    ) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(token) = access {
            match HeaderValue::from_str(&format!("Bearer {}", token)) {
                Ok(value) => {
                    headers.insert(AUTHORIZATION, value);
                }
                Err(_) => tracing::warn!("stored access token is not a valid header value"),
            }
        }
        if let Some(email) = credentials.and_then(|c| c.user_email.as_deref()) {
            match HeaderValue::from_str(email) {
                Ok(value) => {
                    headers.insert(USER_EMAIL_HEADER, value);
                }
                Err(_) => tracing::warn!("stored user email is not a valid header value"),
            }
        }
        if let Some(csrf) = self.csrf_token() {
            if let Ok(value) = HeaderValue::from_str(&csrf) {
                headers.insert(CSRF_HEADER, value);
            }
        }
        headers
    }

    /// The CSRF token the auth service set as a same-site cookie, if
    /// any. Read from the jar that backs the auth-base client.
    fn csrf_token(&self) -> Option<String> {
        let header = self.jar.cookies(&self.config.auth_base_url)?;
        csrf_from_cookie_header(header.to_str().ok()?)
    }

    /// Mint a new access token, serialized across concurrent callers.
    ///
    /// `stale_access` is the token the failing request carried. After
    /// acquiring the guard the store is re-read: if another caller
    /// already refreshed while we waited, its token is reused and no
    /// second refresh call is issued.
    ///
    /// `Ok(None)` means the refresh is not possible (no refresh token,
    /// rejected refresh, network failure during refresh, or a 2xx
    /// without an access token) — all of which the caller must treat as
    /// unrecoverable. `Err` is reserved for credential-store failures.
    async fn refresh_access_token(
        &self,
        stale_access: Option<&str>,
    ) -> Result<Option<String>, ApiError> {
        let _guard = self.refresh_lock.lock().await;

        let current = self.load_credentials().await?;
        if let Some(credentials) = &current {
            if credentials.access_token.is_some()
                && credentials.access_token.as_deref() != stale_access
            {
                tracing::debug!("reusing access token refreshed by a concurrent request");
                return Ok(credentials.access_token.clone());
            }
        }

        let Some(refresh_token) = current.as_ref().and_then(|c| c.refresh_token.clone()) else {
            return Ok(None);
        };

        let url = self.auth_url(REFRESH_PATH);
        let response = match self
            .auth_http
            .post(url)
            .json(&serde_json::json!({ "refresh": refresh_token }))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("token refresh failed at the network level: {}", e);
                return Ok(None);
            }
        };
        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "token refresh rejected");
            return Ok(None);
        }
        let body: RefreshResponse = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("token refresh returned an unreadable body: {}", e);
                return Ok(None);
            }
        };
        let Some(access) = body.access else {
            tracing::warn!("token refresh succeeded but carried no access token");
            return Ok(None);
        };

        // Read-modify-write of the stored set; only the access token
        // changes.
        let mut credentials = current.unwrap_or_default();
        credentials.access_token = Some(access.clone());
        self.store
            .save(&credentials)
            .await
            .map_err(ApiError::Store)?;
        tracing::debug!("access token refreshed");
        Ok(Some(access))
    }

    /// Clear the whole credential set and notify subscribers.
    async fn invalidate(&self, reason: &str) -> Result<(), ApiError> {
        self.store.clear().await.map_err(ApiError::Store)?;
        tracing::warn!(reason, "session invalidated, credentials cleared");
        let _ = self.invalidated_tx.send(SessionInvalidated {
            reason: reason.to_string(),
        });
        Ok(())
    }
}

fn apply_body(
    request: reqwest::RequestBuilder,
    body: &RequestBody,
) -> reqwest::RequestBuilder {
    match body {
        RequestBody::Empty => request,
        RequestBody::Json(value) => request.json(value),
        RequestBody::Multipart(file) => request.multipart(file.to_form()),
    }
}

fn csrf_from_cookie_header(raw: &str) -> Option<String> {
    raw.split(';')
        .map(str::trim)
        .find_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            (name == CSRF_COOKIE).then(|| value.to_string())
        })
}
