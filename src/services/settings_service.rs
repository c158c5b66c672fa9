use std::time::Duration;

use chrono::Utc;
use serde_json::Value;
use sqlx::SqlitePool;

use crate::domain::settings::{self, FilterMatch, FilterSlot};
use crate::domain::{Actor, KanbanError, SettingsData, SettingsKey};
use crate::infrastructure::SettingsCache;

/// Per-user view settings (filters, sort, last view...) backed by the
/// `user_settings` table with an in-process cache in front.
#[derive(Clone)]
pub struct SettingsService {
    pool: SqlitePool,
    cache: SettingsCache,
}

impl SettingsService {
    pub fn new(pool: SqlitePool, cache: SettingsCache) -> Self {
        Self { pool, cache }
    }

    pub async fn get(&self, actor: &Actor, doctype: &str) -> Result<SettingsData, KanbanError> {
        let key = SettingsKey::new(doctype, &actor.user);

        if let Some(cached) = self.cache.get(&key).await {
            return Ok(cached);
        }

        let stored = self.load_stored(&key).await?;
        if let Some(data) = &stored {
            self.cache.set(key, data.clone()).await;
        }

        Ok(stored.unwrap_or_default())
    }

    /// Merges `payload` over the current settings and persists the result.
    pub async fn save(
        &self,
        actor: &Actor,
        doctype: &str,
        payload: Value,
    ) -> Result<SettingsData, KanbanError> {
        let update = settings::canonicalize(payload)?;
        let key = SettingsKey::new(doctype, &actor.user);

        let mut current = match self.cache.get(&key).await {
            Some(cached) => cached,
            None => self.load_stored(&key).await?.unwrap_or_default(),
        };
        settings::merge(&mut current, update);

        self.cache.set(key.clone(), current.clone()).await;
        Self::upsert(&self.pool, &key, &current).await?;

        tracing::debug!(%key, "User settings saved");
        Ok(current)
    }

    /// Writes every cached entry to the database. Last write wins.
    pub async fn sync_all(&self) -> Result<usize, KanbanError> {
        let entries = self.cache.snapshot().await;
        let count = entries.len();

        for (key, data) in &entries {
            Self::upsert(&self.pool, key, data).await?;
        }

        if count > 0 {
            tracing::debug!(count, "User settings synced");
        }
        Ok(count)
    }

    pub async fn invalidate_all(&self) {
        self.cache.clear().await;
    }

    /// Rewrites saved filters across every user's settings, e.g. after a
    /// record or doctype rename. Returns the number of rows changed.
    pub async fn rewrite_filter_values(
        &self,
        slot: FilterSlot,
        old: &Value,
        new: &Value,
        condition: Option<&FilterMatch>,
    ) -> Result<usize, KanbanError> {
        let rows: Vec<(String, String, String)> =
            sqlx::query_as("SELECT user, doctype, data FROM user_settings")
                .fetch_all(&self.pool)
                .await?;

        let mut changed = 0;
        for (user, doctype, raw) in rows {
            let mut data = settings::parse_stored(&raw);
            if !settings::rewrite_filters(&mut data, slot, old, new, condition) {
                continue;
            }

            let key = SettingsKey::new(doctype, user);
            Self::upsert(&self.pool, &key, &data).await?;
            self.cache.remove(&key).await;
            changed += 1;
        }

        if changed > 0 {
            tracing::info!(changed, ?slot, "Saved view filters rewritten");
        }
        Ok(changed)
    }

    pub async fn run_sync_loop(self, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if let Err(e) = self.sync_all().await {
                tracing::warn!("User settings sync failed: {}", e);
            }
        }
    }

    async fn load_stored(&self, key: &SettingsKey) -> Result<Option<SettingsData>, KanbanError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT data FROM user_settings WHERE user = ? AND doctype = ?")
                .bind(&key.user)
                .bind(&key.doctype)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(raw,)| settings::parse_stored(&raw)))
    }

    async fn upsert(pool: &SqlitePool, key: &SettingsKey, data: &SettingsData) -> Result<(), KanbanError> {
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO user_settings (user, doctype, data, updated_at) VALUES (?, ?, ?, ?)
             ON CONFLICT(user, doctype) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
        )
        .bind(&key.user)
        .bind(&key.doctype)
        .bind(serde_json::to_string(data)?)
        .bind(&now)
        .execute(pool)
        .await?;

        Ok(())
    }
}
