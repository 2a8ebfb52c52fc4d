//! Settings persistence boundary.
//!
//! Records are keyed by owning account. Reads return `None` when nothing has
//! been stored yet; writes always replace the whole record.
//!
//! Read-modify-write edits go through [`SettingsStore::update`], which holds
//! the account's record for the whole change so concurrent edits never
//! overwrite each other.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{PartialSettings, SettingsError, TemplateSettings, resolve};

/// An edit applied to the resolved settings by [`SettingsStore::update`].
pub type SettingsChange = Box<dyn FnOnce(TemplateSettings) -> Result<TemplateSettings, SettingsError> + Send>;

/// Storage for per-account template settings.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Load the stored record, if any. The record may be partial or stale.
    async fn load(&self, account: &str) -> Result<Option<PartialSettings>, SettingsError>;

    /// Upsert the complete record.
    async fn save(&self, account: &str, settings: &TemplateSettings) -> Result<(), SettingsError>;

    /// Resolve the stored record, apply `change` and save the result, with no
    /// other write to `account` in between. A failed change stores nothing.
    async fn update(&self, account: &str, change: SettingsChange) -> Result<TemplateSettings, SettingsError>;

    /// Load and resolve against the defaults.
    async fn load_resolved(&self, account: &str) -> Result<TemplateSettings, SettingsError> {
        let stored = self.load(account).await?;
        Ok(resolve(stored.as_ref()))
    }
}

/// In-process store, used by the HTTP server and tests.
#[derive(Default)]
pub struct MemorySettingsStore {
    records: RwLock<HashMap<String, PartialSettings>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw record, bypassing resolution (e.g. legacy data).
    pub async fn insert_raw(&self, account: &str, record: PartialSettings) {
        self.records.write().await.insert(account.to_string(), record);
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn load(&self, account: &str) -> Result<Option<PartialSettings>, SettingsError> {
        Ok(self.records.read().await.get(account).cloned())
    }

    async fn save(&self, account: &str, settings: &TemplateSettings) -> Result<(), SettingsError> {
        self.records
            .write()
            .await
            .insert(account.to_string(), PartialSettings::from(settings));
        Ok(())
    }

    async fn update(&self, account: &str, change: SettingsChange) -> Result<TemplateSettings, SettingsError> {
        let mut records = self.records.write().await;
        let updated = change(resolve(records.get(account)))?;
        records.insert(account.to_string(), PartialSettings::from(&updated));
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Toggle;
    use serde_json::json;

    #[tokio::test]
    async fn missing_account_loads_none_and_resolves_defaults() {
        let store = MemorySettingsStore::new();
        assert_eq!(store.load("acme").await.unwrap(), None);
        assert_eq!(
            store.load_resolved("acme").await.unwrap(),
            TemplateSettings::default()
        );
    }

    #[tokio::test]
    async fn save_replaces_whole_record() {
        let store = MemorySettingsStore::new();
        store
            .insert_raw("acme", PartialSettings::new().with("legacy", json!(1)))
            .await;

        let mut settings = TemplateSettings::default();
        settings.palette.primary_color = "#000".to_string();
        store.save("acme", &settings).await.unwrap();

        let stored = store.load("acme").await.unwrap().unwrap();
        assert!(!stored.0.contains_key("legacy"));
        assert_eq!(store.load_resolved("acme").await.unwrap(), settings);
    }

    #[tokio::test]
    async fn concurrent_updates_are_all_kept() {
        let store = std::sync::Arc::new(MemorySettingsStore::new());
        let toggles = [
            Toggle::Logo,
            Toggle::ImageColumn,
            Toggle::DiscountColumn,
            Toggle::ShippingAddress,
            Toggle::CustomerEmail,
            Toggle::CustomerPhone,
        ];

        let mut tasks = tokio::task::JoinSet::new();
        for toggle in toggles {
            let store = std::sync::Arc::clone(&store);
            tasks.spawn(async move {
                store
                    .update(
                        "acme",
                        Box::new(move |mut settings: TemplateSettings| -> Result<TemplateSettings, SettingsError> {
                            let shown = settings.visibility.get(toggle);
                            settings.visibility.set(toggle, !shown);
                            Ok(settings)
                        }),
                    )
                    .await
            });
        }
        while let Some(result) = tasks.join_next().await {
            result.unwrap().unwrap();
        }

        // every flip landed exactly once
        let settings = store.load_resolved("acme").await.unwrap();
        let defaults = TemplateSettings::default();
        for toggle in toggles {
            assert_eq!(
                settings.visibility.get(toggle),
                !defaults.visibility.get(toggle),
                "{}",
                toggle.key()
            );
        }
    }

    #[tokio::test]
    async fn failed_update_stores_nothing() {
        let store = MemorySettingsStore::new();
        let result = store
            .update(
                "acme",
                Box::new(|_: TemplateSettings| -> Result<TemplateSettings, SettingsError> {
                    Err(SettingsError::UnknownField("nope".to_string()))
                }),
            )
            .await;
        assert_eq!(result, Err(SettingsError::UnknownField("nope".to_string())));
        assert_eq!(store.load("acme").await.unwrap(), None);
    }

    #[tokio::test]
    async fn accounts_are_isolated() {
        let store = MemorySettingsStore::new();
        let mut settings = TemplateSettings::default();
        settings.visibility.show_terms = false;
        store.save("a", &settings).await.unwrap();
        assert!(store.load("b").await.unwrap().is_none());
    }
}
