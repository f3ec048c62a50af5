pub mod file;
pub mod memory;

use async_trait::async_trait;

use crate::models::auth::Credentials;

/// Abstraction over credential persistence.
/// Implementations: MemoryStore (process-local), FileStore (JSON on
/// disk). The gateway only ever goes through this trait, so alternate
/// backends and test doubles drop in without touching gateway logic.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Read the stored credential set. `None` means no user has logged
    /// in (or the set was cleared).
    async fn load(&self) -> anyhow::Result<Option<Credentials>>;

    /// Persist the full credential set, replacing whatever was stored.
    async fn save(&self, credentials: &Credentials) -> anyhow::Result<()>;

    /// Remove every stored key. Called at logout and on irrecoverable
    /// authentication failure.
    async fn clear(&self) -> anyhow::Result<()>;
}
