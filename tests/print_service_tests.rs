mod common;

use std::sync::{Arc, Mutex};

use serde_json::json;

use common::{seed_task, DOCTYPE};
use kanban_views::api::dto::{MultiPdfRequest, PdfRequest, PrintOptions};
use kanban_views::domain::{Actor, KanbanError, ADMINISTRATOR};
use kanban_views::services::{EntityStore, PrintRenderer, PrintService};

/// Renders each document as its own name and merges by concatenation.
#[derive(Clone, Default)]
struct FakeRenderer {
    fail_on: Option<String>,
    merges: Arc<Mutex<usize>>,
}

impl PrintRenderer for FakeRenderer {
    async fn render(
        &self,
        doctype: &str,
        name: &str,
        options: &PrintOptions,
    ) -> Result<Vec<u8>, KanbanError> {
        if self.fail_on.as_deref() == Some(name) {
            return Err(KanbanError::Upstream(format!("cannot render {}", name)));
        }
        let rendered = match &options.address_display {
            Some(address) => format!("[{}:{}|{}]", doctype, name, address),
            None => format!("[{}:{}]", doctype, name),
        };
        Ok(rendered.into_bytes())
    }

    async fn merge(&self, parts: Vec<Vec<u8>>) -> Result<Vec<u8>, KanbanError> {
        *self.merges.lock().unwrap() += 1;
        Ok(parts.concat())
    }
}

fn multi(body: serde_json::Value) -> MultiPdfRequest {
    serde_json::from_value(body).unwrap()
}

#[tokio::test]
async fn test_single_pdf_named_after_document() {
    let (_dir, pool) = common::setup_test_db().await;
    seed_task(&pool, "TASK 0001", "Open").await;
    let service = PrintService::new(pool, FakeRenderer::default());

    let req: PdfRequest =
        serde_json::from_value(json!({ "doctype": DOCTYPE, "name": "TASK 0001" })).unwrap();
    let pdf = service
        .download_pdf(&Actor::new(ADMINISTRATOR), req)
        .await
        .unwrap();

    assert_eq!(pdf.filename, "TASK-0001.pdf");
    assert_eq!(pdf.content, b"[Task:TASK 0001]");
}

#[tokio::test]
async fn test_single_pdf_passes_formatted_address() {
    let (_dir, pool) = common::setup_test_db().await;
    EntityStore::insert(
        &pool,
        DOCTYPE,
        "T1",
        &json!({
            "status": "Open",
            "address": { "address_line1": "Main St 5", "pincode": "69001", "city": "Lyon" }
        }),
    )
    .await
    .unwrap();
    let service = PrintService::new(pool, FakeRenderer::default());

    let req: PdfRequest =
        serde_json::from_value(json!({ "doctype": DOCTYPE, "name": "T1" })).unwrap();
    let pdf = service
        .download_pdf(&Actor::new(ADMINISTRATOR), req)
        .await
        .unwrap();

    assert_eq!(pdf.content, b"[Task:T1|Main St 5<br>69001, Lyon]");
}

#[tokio::test]
async fn test_multi_pdf_for_one_doctype_merges_in_order() {
    let (_dir, pool) = common::setup_test_db().await;
    seed_task(&pool, "A", "Open").await;
    seed_task(&pool, "B", "Open").await;
    let renderer = FakeRenderer::default();
    let merges = Arc::clone(&renderer.merges);
    let service = PrintService::new(pool, renderer);

    let pdf = service
        .download_multi_pdf(
            &Actor::new(ADMINISTRATOR),
            multi(json!({ "doctype": DOCTYPE, "names": ["B", "A"], "format": "Standard" })),
        )
        .await
        .unwrap();

    assert_eq!(pdf.filename, "Task.pdf");
    assert_eq!(pdf.content, b"[Task:B][Task:A]");
    assert_eq!(*merges.lock().unwrap(), 1);
}

#[tokio::test]
async fn test_multi_pdf_for_one_doctype_fails_on_missing_document() {
    let (_dir, pool) = common::setup_test_db().await;
    seed_task(&pool, "A", "Open").await;
    let service = PrintService::new(pool, FakeRenderer::default());

    let result = service
        .download_multi_pdf(
            &Actor::new(ADMINISTRATOR),
            multi(json!({ "doctype": DOCTYPE, "names": ["A", "missing"] })),
        )
        .await;

    assert!(matches!(result, Err(KanbanError::NotFound(_))));
}

#[tokio::test]
async fn test_grouped_multi_pdf_skips_failed_documents() {
    let (_dir, pool) = common::setup_test_db().await;
    seed_task(&pool, "A", "Open").await;
    seed_task(&pool, "B", "Open").await;
    let renderer = FakeRenderer {
        fail_on: Some("B".into()),
        ..FakeRenderer::default()
    };
    let merges = Arc::clone(&renderer.merges);
    let service = PrintService::new(pool, renderer);

    let pdf = service
        .download_multi_pdf(
            &Actor::new(ADMINISTRATOR),
            multi(json!({
                "documents": { "Task": ["A", "B", "missing"] },
                "name": "Weekly Report/Tasks"
            })),
        )
        .await
        .unwrap();

    assert_eq!(pdf.filename, "Weekly-Report-Tasks.pdf");
    assert_eq!(pdf.content, b"[Task:A]");
    assert_eq!(*merges.lock().unwrap(), 0);
}

#[tokio::test]
async fn test_grouped_multi_pdf_follows_request_order() {
    let (_dir, pool) = common::setup_test_db().await;
    seed_task(&pool, "T1", "Open").await;
    EntityStore::insert(&pool, "Note", "N1", &json!({ "status": "Draft" }))
        .await
        .unwrap();
    let service = PrintService::new(pool, FakeRenderer::default());

    // parsed from text so the doctype keys keep the order they were sent in
    let req: MultiPdfRequest =
        serde_json::from_str(r#"{"documents":{"Task":["T1"],"Note":["N1"]},"name":"Mixed"}"#)
            .unwrap();
    let pdf = service
        .download_multi_pdf(&Actor::new(ADMINISTRATOR), req)
        .await
        .unwrap();

    assert_eq!(pdf.filename, "Mixed.pdf");
    assert_eq!(pdf.content, b"[Task:T1][Note:N1]");
}

#[tokio::test]
async fn test_grouped_multi_pdf_with_nothing_printable() {
    let (_dir, pool) = common::setup_test_db().await;
    let service = PrintService::new(pool, FakeRenderer::default());

    let result = service
        .download_multi_pdf(
            &Actor::new("alice@example.com"),
            multi(json!({ "documents": { "Task": ["A"] }, "name": "Nothing" })),
        )
        .await;

    assert!(matches!(result, Err(KanbanError::NotFound(_))));
}
