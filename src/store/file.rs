use async_trait::async_trait;
use std::path::PathBuf;

use super::CredentialStore;
use crate::models::auth::Credentials;

/// Credential store backed by a single JSON file.
///
/// Reads and writes are read-modify-write without cross-process
/// locking; concurrent writers last-write-wins, same as the storage
/// contract this mirrors.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store under the platform data directory
    /// (e.g. `~/.local/share/lexia/credentials.json`).
    pub fn default_location() -> anyhow::Result<Self> {
        let base = dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("no local data directory available"))?;
        Ok(Self::new(base.join("lexia").join("credentials.json")))
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

#[async_trait]
impl CredentialStore for FileStore {
    async fn load(&self) -> anyhow::Result<Option<Credentials>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, credentials: &Credentials) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let raw = serde_json::to_string_pretty(credentials)?;
        tokio::fs::write(&self.path, raw).await?;
        Ok(())
    }

    async fn clear(&self) -> anyhow::Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
