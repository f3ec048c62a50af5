//! Integration tests for the typed API clients against mock backends:
//! credential persistence after login/signup, error-detail surfacing,
//! endpoint payload shapes, and the session cache fed from a full
//! `with-messages` fetch.

use std::sync::Arc;

use lexia::api::{AuthApi, DocsApi};
use lexia::config::Config;
use lexia::errors::ApiError;
use lexia::gateway::Gateway;
use lexia::models::auth::{Credentials, SignupRequest};
use lexia::models::chat::MessageRole;
use lexia::session::SessionCache;
use lexia::store::memory::MemoryStore;
use lexia::store::CredentialStore;
use url::Url;
use wiremock::matchers::{body_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Harness {
    auth_server: MockServer,
    docs_server: MockServer,
    store: Arc<MemoryStore>,
    auth: AuthApi,
    docs: DocsApi,
    gateway: Arc<Gateway>,
}

async fn harness() -> Harness {
    let auth_server = MockServer::start().await;
    let docs_server = MockServer::start().await;
    let store = Arc::new(MemoryStore::new());
    let config = Config::with_bases(
        Url::parse(&auth_server.uri()).unwrap(),
        Url::parse(&docs_server.uri()).unwrap(),
    );
    let gateway = Arc::new(Gateway::new(config, store.clone()));
    Harness {
        auth_server,
        docs_server,
        store,
        auth: AuthApi::new(gateway.clone()),
        docs: DocsApi::new(gateway.clone()),
        gateway,
    }
}

fn logged_in(access: &str, refresh: &str) -> Credentials {
    Credentials {
        access_token: Some(access.into()),
        refresh_token: Some(refresh.into()),
        user_email: Some("a@b.com".into()),
        display_name: None,
    }
}

// ── Auth endpoints ───────────────────────────────────────────

#[tokio::test]
async fn login_persists_the_returned_token_pair() {
    let h = harness().await;

    Mock::given(method("POST"))
        .and(path("/api/login/"))
        .and(body_json(serde_json::json!({
            "email": "a@b.com",
            "password": "x"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"message":"Login successful","access":"T1","refresh":"R1","email":"a@b.com","display_name":"Ada"}"#,
        ))
        .expect(1)
        .mount(&h.auth_server)
        .await;

    let tokens = h.auth.login("a@b.com", "x").await.unwrap();
    assert_eq!(tokens.access, "T1");

    let stored = h.store.load().await.unwrap().unwrap();
    assert_eq!(stored.access_token.as_deref(), Some("T1"));
    assert_eq!(stored.refresh_token.as_deref(), Some("R1"));
    assert_eq!(stored.user_email.as_deref(), Some("a@b.com"));
    assert_eq!(stored.display_name.as_deref(), Some("Ada"));
}

#[tokio::test]
async fn login_failure_surfaces_the_backend_detail() {
    let h = harness().await;

    Mock::given(method("POST"))
        .and(path("/api/login/"))
        .respond_with(
            ResponseTemplate::new(401).set_body_string(r#"{"error":"Incorrect password"}"#),
        )
        .expect(1)
        .mount(&h.auth_server)
        .await;

    let err = h.auth.login("a@b.com", "wrong").await.unwrap_err();
    match err {
        ApiError::Http {
            context,
            status,
            detail,
        } => {
            assert_eq!(context, "login");
            assert_eq!(status.as_u16(), 401);
            assert_eq!(detail, "Incorrect password");
        }
        other => panic!("expected Http error, got {:?}", other),
    }
    // A failed login must not leave credentials behind.
    assert!(h.store.load().await.unwrap().is_none());
}

#[tokio::test]
async fn signup_falls_back_to_the_typed_email() {
    let h = harness().await;

    // Backend omits the email field; the address the user typed is kept.
    Mock::given(method("POST"))
        .and(path("/api/signup/"))
        .and(body_json(serde_json::json!({
            "email": "new@b.com",
            "password": "pw",
            "display_name": "New User"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_string(
            r#"{"message":"User registered successfully","access":"T1","refresh":"R1"}"#,
        ))
        .expect(1)
        .mount(&h.auth_server)
        .await;

    h.auth
        .signup(&SignupRequest {
            email: "new@b.com".into(),
            password: "pw".into(),
            display_name: Some("New User".into()),
        })
        .await
        .unwrap();

    let stored = h.store.load().await.unwrap().unwrap();
    assert_eq!(stored.user_email.as_deref(), Some("new@b.com"));
}

#[tokio::test]
async fn whoami_retries_with_the_refreshed_token() {
    let h = harness().await;
    h.store.save(&logged_in("T1", "R1")).await.unwrap();

    Mock::given(method("GET"))
        .and(path("/api/protected/"))
        .and(header("Authorization", "Bearer T1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&h.auth_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/token/refresh/"))
        .and(body_json(serde_json::json!({ "refresh": "R1" })))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"access":"T2"}"#))
        .expect(1)
        .mount(&h.auth_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/protected/"))
        .and(header("Authorization", "Bearer T2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"{"message":"Welcome Ada"}"#),
        )
        .expect(1)
        .mount(&h.auth_server)
        .await;

    let who = h.auth.whoami().await.unwrap();
    assert_eq!(who.message, "Welcome Ada");
    assert_eq!(
        h.store.load().await.unwrap().unwrap().access_token.as_deref(),
        Some("T2")
    );
}

#[tokio::test]
async fn failed_refresh_logs_the_session_out() {
    let h = harness().await;
    h.store.save(&logged_in("T1", "R1")).await.unwrap();
    let mut invalidations = h.gateway.subscribe_invalidations();

    Mock::given(method("GET"))
        .and(path("/api/protected/"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&h.auth_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/token/refresh/"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&h.auth_server)
        .await;

    let err = h.auth.whoami().await.unwrap_err();
    assert!(matches!(err, ApiError::AuthenticationFailed));
    assert!(h.store.load().await.unwrap().is_none());
    // The presentation layer is told instead of being redirected.
    invalidations.try_recv().expect("invalidation event expected");
}

#[tokio::test]
async fn forgot_and_reset_password_round_trip() {
    let h = harness().await;

    Mock::given(method("POST"))
        .and(path("/api/forgot-password/"))
        .and(body_json(serde_json::json!({ "email": "a@b.com" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"{"message":"Reset email sent"}"#),
        )
        .expect(1)
        .mount(&h.auth_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/reset-password/"))
        .and(body_json(serde_json::json!({
            "email": "a@b.com",
            "token": "reset-tok",
            "new_password": "pw2"
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"{"message":"Password reset successful"}"#),
        )
        .expect(1)
        .mount(&h.auth_server)
        .await;

    let sent = h.auth.forgot_password("a@b.com").await.unwrap();
    assert_eq!(sent.message, "Reset email sent");
    let reset = h
        .auth
        .reset_password("a@b.com", "reset-tok", "pw2")
        .await
        .unwrap();
    assert_eq!(reset.message, "Password reset successful");
}

#[tokio::test]
async fn logout_clears_the_store() {
    let h = harness().await;
    h.store.save(&logged_in("T1", "R1")).await.unwrap();

    h.auth.logout().await.unwrap();
    assert!(h.store.load().await.unwrap().is_none());
}

// ── Document / chat endpoints ────────────────────────────────

#[tokio::test]
async fn upload_sends_a_multipart_file_field() {
    let h = harness().await;
    h.store.save(&logged_in("T1", "R1")).await.unwrap();

    Mock::given(method("POST"))
        .and(path("/api/upload-document"))
        .and(header("Authorization", "Bearer T1"))
        .and(body_string_contains(r#"name="file""#))
        .and(body_string_contains(r#"filename="contract.pdf""#))
        .and(body_string_contains("fake pdf bytes"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"success":true,"message":"uploaded","chat_id":"c1","chat_name":"Contract Review","document_id":"d1","initial_summary":{"summary":"An agreement."}}"#,
        ))
        .expect(1)
        .mount(&h.docs_server)
        .await;

    let uploaded = h
        .docs
        .upload_document("contract.pdf", "fake pdf bytes".into())
        .await
        .unwrap();

    assert!(uploaded.success);
    assert_eq!(uploaded.chat_id.as_deref(), Some("c1"));
    assert_eq!(uploaded.document_id.as_deref(), Some("d1"));
}

#[tokio::test]
async fn ask_question_sends_nullable_session_and_document() {
    let h = harness().await;
    h.store.save(&logged_in("T1", "R1")).await.unwrap();

    Mock::given(method("POST"))
        .and(path("/api/ask-question"))
        .and(body_json(serde_json::json!({
            "query": "What is the notice period?",
            "chat_id": null,
            "document_id": null
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"success":true,"response":"30 days.","chat_id":"c1","message_count":2}"#,
        ))
        .expect(1)
        .mount(&h.docs_server)
        .await;

    let answer = h
        .docs
        .ask_question("What is the notice period?", None, None)
        .await
        .unwrap();

    assert_eq!(answer.response, "30 days.");
    assert_eq!(answer.chat_id.as_deref(), Some("c1"));
}

#[tokio::test]
async fn save_message_posts_the_role_tag() {
    let h = harness().await;
    h.store.save(&logged_in("T1", "R1")).await.unwrap();
    let session_id = "7f2f9c2e-8f7a-4b3e-9d2a-1c5e7a9b0d41";

    Mock::given(method("POST"))
        .and(path(format!(
            "/api/geniai/chat-sessions/{}/messages/",
            session_id
        )))
        .and(body_json(serde_json::json!({
            "content": "What does clause 4 mean?",
            "message_type": "user"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_string(format!(
            r#"{{"id":"2e9d1b34-6a7c-4f08-92e3-5b8d0c6f1a27","chat_session_id":"{}","message_type":"user","content":"What does clause 4 mean?","created_at":"2026-08-05T10:00:00Z"}}"#,
            session_id
        )))
        .expect(1)
        .mount(&h.auth_server)
        .await;

    let saved = h
        .docs
        .save_message(
            session_id.parse().unwrap(),
            "What does clause 4 mean?",
            MessageRole::User,
        )
        .await
        .unwrap();

    assert_eq!(saved.message_type, MessageRole::User);
    assert_eq!(saved.content, "What does clause 4 mean?");
}

#[tokio::test]
async fn session_listing_feeds_the_cache_in_activity_order() {
    let h = harness().await;
    h.store.save(&logged_in("T1", "R1")).await.unwrap();

    Mock::given(method("GET"))
        .and(path("/api/geniai/chat-sessions/with-messages/"))
        .and(header("Authorization", "Bearer T1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"[
              {"id":"6a0f38f2-1f4b-41f8-8a44-30d8f7f4a5b1","name":"Lease Q&A","message_count":1,
               "created_at":"2026-08-01T09:00:00Z","last_updated":"2026-08-01T09:05:00Z","document_id":null,
               "messages":[{"id":"9f3f2a10-62f1-4f5e-8a6e-7b2d9c0e4f13","chat_session_id":"6a0f38f2-1f4b-41f8-8a44-30d8f7f4a5b1","message_type":"user","content":"hi","created_at":"2026-08-01T09:05:00Z"}]},
              {"id":"f3d9a7c4-2b6e-4f0a-bb1d-8c5e2a9d7f60","name":"NDA Review","message_count":0,
               "created_at":"2026-08-03T12:00:00Z","last_updated":"2026-08-03T12:00:00Z","document_id":"0b7c5d2e-9a4f-4e8b-a1d6-3f2c8e0b9a75",
               "messages":[]}
            ]"#,
        ))
        .expect(1)
        .mount(&h.auth_server)
        .await;

    let fetched = h.docs.sessions_with_messages().await.unwrap();
    assert_eq!(fetched.len(), 2);

    let cache = SessionCache::new();
    cache.replace_all(fetched);
    let listed = cache.list();
    assert_eq!(listed[0].name, "NDA Review");
    assert_eq!(listed[1].name, "Lease Q&A");
    assert_eq!(listed[1].message_count, 1);
}

#[tokio::test]
async fn create_session_returns_the_server_owned_record() {
    let h = harness().await;
    h.store.save(&logged_in("T1", "R1")).await.unwrap();

    Mock::given(method("POST"))
        .and(path("/api/geniai/chat-sessions/"))
        .and(body_json(serde_json::json!({ "name": "New Chat" })))
        .respond_with(ResponseTemplate::new(201).set_body_string(
            r#"{"id":"6a0f38f2-1f4b-41f8-8a44-30d8f7f4a5b1","name":"New Chat","message_count":0,"created_at":"2026-08-05T10:00:00Z","last_updated":"2026-08-05T10:00:00Z","document_id":null}"#,
        ))
        .expect(1)
        .mount(&h.auth_server)
        .await;

    let session = h.docs.create_session("New Chat", None).await.unwrap();
    assert_eq!(session.name, "New Chat");
    assert_eq!(session.message_count, 0);
}
