mod common;

use std::collections::BTreeMap;

use serde_json::json;

use common::{seed_task, DOCTYPE, FIELD};
use kanban_views::api::dto::{BulkOrderRequest, CreateBoardRequest, MoveCardRequest};
use kanban_views::domain::{Actor, FilterCondition, KanbanError, SettingsKey, ADMINISTRATOR};
use kanban_views::infrastructure::SettingsCache;
use kanban_views::services::{BoardService, EntityStore};

fn board_request(name: &str, columns: &[&str], filters: Vec<FilterCondition>) -> CreateBoardRequest {
    CreateBoardRequest {
        name: name.to_string(),
        reference_doctype: DOCTYPE.to_string(),
        field_name: FIELD.to_string(),
        filters,
        private: false,
        show_labels: false,
        fields: Vec::new(),
        columns: columns.iter().map(|c| c.to_string()).collect(),
    }
}

#[tokio::test]
async fn test_initial_order_respects_board_filters() {
    let (_dir, pool) = common::setup_test_db().await;
    EntityStore::insert(&pool, DOCTYPE, "T1", &json!({ "status": "Open", "project": "P1" }))
        .await
        .unwrap();
    EntityStore::insert(&pool, DOCTYPE, "T2", &json!({ "status": "Open", "project": "P2" }))
        .await
        .unwrap();
    let service = BoardService::new(pool, SettingsCache::new());

    let board = service
        .create_board(
            &Actor::new(ADMINISTRATOR),
            board_request(
                "P1 Tasks",
                &["Open"],
                vec![FilterCondition::eq(DOCTYPE, "project", "P1")],
            ),
        )
        .await
        .unwrap();

    assert_eq!(board.column("Open").unwrap().order, vec!["T1"]);

    let reloaded = service.load_board(&board.id).await.unwrap();
    assert_eq!(reloaded.filters, board.filters);
    assert_eq!(reloaded.column("Open").unwrap().order, vec!["T1"]);
}

#[tokio::test]
async fn test_board_changes_clear_settings_cache() {
    let (_dir, pool) = common::setup_test_db().await;
    let cache = SettingsCache::new();
    cache
        .set(SettingsKey::new(DOCTYPE, ADMINISTRATOR), serde_json::Map::new())
        .await;
    let service = BoardService::new(pool, cache.clone());
    let actor = Actor::new(ADMINISTRATOR);

    let board = service
        .create_board(&actor, board_request("Tasks", &["Open"], Vec::new()))
        .await
        .unwrap();
    assert_eq!(cache.len().await, 0);

    cache
        .set(SettingsKey::new(DOCTYPE, ADMINISTRATOR), serde_json::Map::new())
        .await;
    service.add_column(&actor, &board.id, "Closed").await.unwrap();
    assert_eq!(cache.len().await, 0);
}

#[tokio::test]
async fn test_move_then_bulk_order_round() {
    let (_dir, pool) = common::setup_test_db().await;
    seed_task(&pool, "A", "Open").await;
    let service = BoardService::new(pool.clone(), SettingsCache::new());
    let actor = Actor::new(ADMINISTRATOR);

    let board = service
        .create_board(&actor, board_request("Tasks", &["Open", "Closed"], Vec::new()))
        .await
        .unwrap();

    let moved = service
        .move_card(
            &actor,
            &board.id,
            MoveCardRequest {
                item: "A".into(),
                from_column: "Open".into(),
                to_column: "Closed".into(),
                old_index: 0,
                new_index: 0,
            },
        )
        .await
        .unwrap();
    assert!(moved.outcome.is_cross_column());

    // putting the card back through a bulk order reports it as changed
    let mut order = BTreeMap::new();
    order.insert("Open".to_string(), vec!["A".to_string()]);
    order.insert("Closed".to_string(), Vec::new());
    let response = service
        .bulk_set_order(&actor, &board.id, BulkOrderRequest { order })
        .await
        .unwrap();

    assert_eq!(response.updated_cards.len(), 1);
    assert_eq!(response.updated_cards[0].column, "Open");
    assert_eq!(response.board.column("Open").unwrap().order, vec!["A"]);
    assert!(response.board.column("Closed").unwrap().order.is_empty());

    let field = EntityStore::get_field(&pool, DOCTYPE, "A", FIELD).await.unwrap();
    assert_eq!(field.as_deref(), Some("Open"));
}

#[tokio::test]
async fn test_unknown_board_is_not_found() {
    let (_dir, pool) = common::setup_test_db().await;
    let service = BoardService::new(pool, SettingsCache::new());

    let result = service.get_board(&Actor::new(ADMINISTRATOR), "nope").await;

    assert!(matches!(result, Err(KanbanError::NotFound(_))));
}

#[tokio::test]
async fn test_concurrent_creates_with_same_name_conflict() {
    let (_dir, pool) = common::setup_test_db().await;
    let first = BoardService::new(pool.clone(), SettingsCache::new());
    let second = BoardService::new(pool, SettingsCache::new());
    let actor = Actor::new(ADMINISTRATOR);

    let (a, b) = tokio::join!(
        first.create_board(&actor, board_request("Tasks", &["Open"], Vec::new())),
        second.create_board(&actor, board_request("Tasks", &["Closed"], Vec::new())),
    );

    let results = [a, b];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(KanbanError::Conflict(msg)) if msg.contains("Tasks"))));
}

#[tokio::test]
async fn test_project_board_order_follows_queue_position() {
    let (_dir, pool) = common::setup_test_db().await;
    for (name, position, date) in [
        ("P1", 1, "2024-02-01"),
        ("P2", 2, "2024-03-01"),
        ("P3", 3, "2024-01-01"),
        ("P4", 2, "2024-01-05"),
    ] {
        EntityStore::insert(
            &pool,
            "Project",
            name,
            &json!({ "status": "Open", "queue_position": position, "appointment_date": date }),
        )
        .await
        .unwrap();
    }
    let service = BoardService::new(pool, SettingsCache::new());
    let actor = Actor::new(ADMINISTRATOR);

    let mut request = board_request("Projects", &["Open"], Vec::new());
    request.reference_doctype = "Project".into();
    let board = service.create_board(&actor, request).await.unwrap();

    let mut order = BTreeMap::new();
    order.insert(
        "Open".to_string(),
        vec!["P3", "P2", "ghost", "P4", "P1"]
            .into_iter()
            .map(String::from)
            .collect(),
    );
    let response = service
        .bulk_set_order(&actor, &board.id, BulkOrderRequest { order })
        .await
        .unwrap();

    assert_eq!(
        response.board.column("Open").unwrap().order,
        vec!["ghost", "P1", "P4", "P2", "P3"]
    );
    assert!(response.updated_cards.is_empty());
}
