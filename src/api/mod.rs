pub mod auth;
pub mod docs;

pub use auth::AuthApi;
pub use docs::DocsApi;
