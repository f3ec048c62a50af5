use std::sync::Arc;

use serde_json::json;

use crate::errors::ApiError;
use crate::gateway::{Gateway, RequestDescriptor};
use crate::models::auth::{AuthTokens, MessageResponse, SignupRequest, WhoamiResponse};

/// Typed client for the authentication service.
///
/// The credential-establishing endpoints go out unauthenticated; on
/// success the returned token pair is persisted through the gateway's
/// credential store. Only `whoami` runs through the authenticated path.
pub struct AuthApi {
    gateway: Arc<Gateway>,
}

impl AuthApi {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    /// POST /api/login/ — persists the credential set on success.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthTokens, ApiError> {
        let descriptor = RequestDescriptor::post_json(
            self.gateway.auth_url("/api/login/"),
            json!({ "email": email, "password": password }),
        );
        let response = self.gateway.send_public(descriptor).await?;
        if !response.status().is_success() {
            return Err(ApiError::from_response("login", response).await);
        }
        let tokens: AuthTokens = response
            .json()
            .await
            .map_err(|source| ApiError::Decode { context: "login", source })?;
        self.persist(&tokens, Some(email)).await?;
        Ok(tokens)
    }

    /// POST /api/signup/ — persists the credential set on success.
    pub async fn signup(&self, request: &SignupRequest) -> Result<AuthTokens, ApiError> {
        let descriptor = RequestDescriptor::post_json(
            self.gateway.auth_url("/api/signup/"),
            serde_json::to_value(request).expect("signup request serializes"),
        );
        let response = self.gateway.send_public(descriptor).await?;
        if !response.status().is_success() {
            return Err(ApiError::from_response("signup", response).await);
        }
        let tokens: AuthTokens = response
            .json()
            .await
            .map_err(|source| ApiError::Decode { context: "signup", source })?;
        self.persist(&tokens, Some(&request.email)).await?;
        Ok(tokens)
    }

    /// POST /api/google-login/ with a Google OAuth access token.
    pub async fn google_login(&self, token: &str) -> Result<AuthTokens, ApiError> {
        let descriptor = RequestDescriptor::post_json(
            self.gateway.auth_url("/api/google-login/"),
            json!({ "token": token }),
        );
        let response = self.gateway.send_public(descriptor).await?;
        if !response.status().is_success() {
            return Err(ApiError::from_response("google login", response).await);
        }
        let tokens: AuthTokens = response.json().await.map_err(|source| ApiError::Decode {
            context: "google login",
            source,
        })?;
        self.persist(&tokens, None).await?;
        Ok(tokens)
    }

    /// GET /api/protected/ — authenticated probe, exercises the refresh
    /// path when the access token has expired.
    pub async fn whoami(&self) -> Result<WhoamiResponse, ApiError> {
        let descriptor = RequestDescriptor::get(self.gateway.auth_url("/api/protected/"));
        let response = self.gateway.send(descriptor).await?;
        if !response.status().is_success() {
            return Err(ApiError::from_response("whoami", response).await);
        }
        response
            .json()
            .await
            .map_err(|source| ApiError::Decode { context: "whoami", source })
    }

    /// POST /api/forgot-password/.
    pub async fn forgot_password(&self, email: &str) -> Result<MessageResponse, ApiError> {
        let descriptor = RequestDescriptor::post_json(
            self.gateway.auth_url("/api/forgot-password/"),
            json!({ "email": email }),
        );
        let response = self.gateway.send_public(descriptor).await?;
        if !response.status().is_success() {
            return Err(ApiError::from_response("forgot password", response).await);
        }
        response.json().await.map_err(|source| ApiError::Decode {
            context: "forgot password",
            source,
        })
    }

    /// POST /api/reset-password/ with the emailed reset token.
    pub async fn reset_password(
        &self,
        email: &str,
        token: &str,
        new_password: &str,
    ) -> Result<MessageResponse, ApiError> {
        let descriptor = RequestDescriptor::post_json(
            self.gateway.auth_url("/api/reset-password/"),
            json!({ "email": email, "token": token, "new_password": new_password }),
        );
        let response = self.gateway.send_public(descriptor).await?;
        if !response.status().is_success() {
            return Err(ApiError::from_response("password reset", response).await);
        }
        response.json().await.map_err(|source| ApiError::Decode {
            context: "password reset",
            source,
        })
    }

    /// Drop the stored credential set. Client-side only; the backend
    /// has no logout endpoint.
    pub async fn logout(&self) -> Result<(), ApiError> {
        self.gateway.store().clear().await.map_err(ApiError::Store)
    }

    async fn persist(&self, tokens: &AuthTokens, fallback_email: Option<&str>) -> Result<(), ApiError> {
        let credentials = tokens.clone().into_credentials(fallback_email);
        self.gateway
            .store()
            .save(&credentials)
            .await
            .map_err(ApiError::Store)
    }
}
