use async_trait::async_trait;
use std::sync::Mutex;

use super::CredentialStore;
use crate::models::auth::Credentials;

/// Process-local credential store. The default for embedding the
/// gateway in tests or short-lived tools.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Option<Credentials>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials(credentials: Credentials) -> Self {
        Self {
            inner: Mutex::new(Some(credentials)),
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn load(&self) -> anyhow::Result<Option<Credentials>> {
        Ok(self.inner.lock().expect("credential store poisoned").clone())
    }

    async fn save(&self, credentials: &Credentials) -> anyhow::Result<()> {
        *self.inner.lock().expect("credential store poisoned") = Some(credentials.clone());
        Ok(())
    }

    async fn clear(&self) -> anyhow::Result<()> {
        *self.inner.lock().expect("credential store poisoned") = None;
        Ok(())
    }
}
