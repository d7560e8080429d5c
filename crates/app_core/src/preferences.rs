//! Durable UI preference access behind a trait seam so the store can run
//! with or without a database.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::domain::Theme;
use storage::Storage;

#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn load_theme(&self) -> Result<Option<Theme>>;
    async fn save_theme(&self, theme: Theme) -> Result<()>;
}

/// Null object for contexts with no preference database wired; every call
/// errors and the store logs and carries on.
pub struct MissingPreferenceStore;

#[async_trait]
impl PreferenceStore for MissingPreferenceStore {
    async fn load_theme(&self) -> Result<Option<Theme>> {
        Err(anyhow!("preference storage is unavailable"))
    }

    async fn save_theme(&self, _theme: Theme) -> Result<()> {
        Err(anyhow!("preference storage is unavailable"))
    }
}

/// Sqlite-backed preference store.
pub struct DurablePreferenceStore {
    storage: Storage,
}

impl DurablePreferenceStore {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl PreferenceStore for DurablePreferenceStore {
    async fn load_theme(&self) -> Result<Option<Theme>> {
        self.storage.load_theme().await
    }

    async fn save_theme(&self, theme: Theme) -> Result<()> {
        self.storage.save_theme(theme).await
    }
}
