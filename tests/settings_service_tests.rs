mod common;

use std::time::Duration;

use serde_json::json;

use kanban_views::domain::settings::{FilterMatch, FilterSlot};
use kanban_views::domain::{Actor, SettingsKey, ADMINISTRATOR};
use kanban_views::infrastructure::SettingsCache;
use kanban_views::services::SettingsService;

async fn stored(pool: &sqlx::SqlitePool, user: &str, doctype: &str) -> Option<serde_json::Value> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT data FROM user_settings WHERE user = ? AND doctype = ?")
            .bind(user)
            .bind(doctype)
            .fetch_optional(pool)
            .await
            .unwrap();
    row.map(|(raw,)| serde_json::from_str(&raw).unwrap())
}

#[tokio::test]
async fn test_sync_writes_cached_entries() {
    let (_dir, pool) = common::setup_test_db().await;
    let cache = SettingsCache::new();
    let service = SettingsService::new(pool.clone(), cache.clone());

    let data = json!({ "last_view": "Report" }).as_object().cloned().unwrap();
    cache.set(SettingsKey::new("Task", "bob"), data).await;
    assert_eq!(stored(&pool, "bob", "Task").await, None);

    assert_eq!(service.sync_all().await.unwrap(), 1);
    assert_eq!(
        stored(&pool, "bob", "Task").await,
        Some(json!({ "last_view": "Report" }))
    );
}

#[tokio::test]
async fn test_sync_loop_flushes_periodically() {
    let (_dir, pool) = common::setup_test_db().await;
    let cache = SettingsCache::new();
    let service = SettingsService::new(pool.clone(), cache.clone());

    let handle = tokio::spawn(service.run_sync_loop(Duration::from_millis(20)));
    let data = json!({ "last_view": "Kanban" }).as_object().cloned().unwrap();
    cache.set(SettingsKey::new("Task", "carol"), data).await;

    tokio::time::sleep(Duration::from_millis(200)).await;
    handle.abort();

    assert_eq!(
        stored(&pool, "carol", "Task").await,
        Some(json!({ "last_view": "Kanban" }))
    );
}

#[tokio::test]
async fn test_invalidate_falls_back_to_database() {
    let (_dir, pool) = common::setup_test_db().await;
    let cache = SettingsCache::new();
    let service = SettingsService::new(pool, cache.clone());
    let actor = Actor::new(ADMINISTRATOR);

    service
        .save(&actor, "Task", json!({ "page_length": 50 }))
        .await
        .unwrap();
    service.invalidate_all().await;
    assert_eq!(cache.len().await, 0);

    let settings = service.get(&actor, "Task").await.unwrap();
    assert_eq!(settings.get("page_length"), Some(&json!(50)));
}

#[tokio::test]
async fn test_rewrite_with_condition_only_touches_matching_doctype() {
    let (_dir, pool) = common::setup_test_db().await;
    let service = SettingsService::new(pool.clone(), SettingsCache::new());
    let actor = Actor::new("dave");

    service
        .save(
            &actor,
            "Task",
            json!({
                "Report": { "filters": [
                    ["Task", "project", "=", "OLD"],
                    ["Timesheet", "project", "=", "OLD"]
                ] }
            }),
        )
        .await
        .unwrap();

    let condition = FilterMatch {
        slot: FilterSlot::Doctype,
        value: json!("Task"),
    };
    let changed = service
        .rewrite_filter_values(FilterSlot::Value, &json!("OLD"), &json!("NEW"), Some(&condition))
        .await
        .unwrap();
    assert_eq!(changed, 1);

    let settings = stored(&pool, "dave", "Task").await.unwrap();
    assert_eq!(settings["Report"]["filters"][0][3], "NEW");
    assert_eq!(settings["Report"]["filters"][1][3], "OLD");

    let again = service
        .rewrite_filter_values(FilterSlot::Value, &json!("OLD"), &json!("NEW"), Some(&condition))
        .await
        .unwrap();
    assert_eq!(again, 0);
}
