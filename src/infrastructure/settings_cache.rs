use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::domain::{SettingsData, SettingsKey};

/// Last known view settings per (doctype, user). Shared by every request and
/// flushed to the database by the background sync pass.
#[derive(Debug, Clone, Default)]
pub struct SettingsCache {
    entries: Arc<RwLock<HashMap<SettingsKey, SettingsData>>>,
}

impl SettingsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &SettingsKey) -> Option<SettingsData> {
        self.entries.read().await.get(key).cloned()
    }

    pub async fn set(&self, key: SettingsKey, data: SettingsData) {
        self.entries.write().await.insert(key, data);
    }

    pub async fn remove(&self, key: &SettingsKey) {
        self.entries.write().await.remove(key);
    }

    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        if !entries.is_empty() {
            tracing::debug!(count = entries.len(), "Clearing user settings cache");
        }
        entries.clear();
    }

    pub async fn snapshot(&self) -> Vec<(SettingsKey, SettingsData)> {
        self.entries
            .read()
            .await
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn keys_with_separator_characters_stay_distinct() {
        let cache = SettingsCache::new();
        let mut a = SettingsData::new();
        a.insert("v".into(), json!(1));
        let mut b = SettingsData::new();
        b.insert("v".into(), json!(2));

        cache.set(SettingsKey::new("Sales::Invoice", "bob"), a.clone()).await;
        cache.set(SettingsKey::new("Sales", "Invoice::bob"), b.clone()).await;

        assert_eq!(cache.get(&SettingsKey::new("Sales::Invoice", "bob")).await, Some(a));
        assert_eq!(cache.get(&SettingsKey::new("Sales", "Invoice::bob")).await, Some(b));
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn clear_drops_everything() {
        let cache = SettingsCache::new();
        cache.set(SettingsKey::new("Task", "alice"), SettingsData::new()).await;
        cache.clear().await;
        assert!(cache.get(&SettingsKey::new("Task", "alice")).await.is_none());
        assert!(cache.snapshot().await.is_empty());
    }
}
