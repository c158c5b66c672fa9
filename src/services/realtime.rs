use std::time::Duration;

use serde_json::json;
use tokio::sync::broadcast;

use crate::api::handlers::sse::SseEvent;
use crate::domain::KanbanError;

pub const REFRESH_ACK: &str = "called kanban_refresh";

/// Outward notifications that sit beside the board logic: the delayed
/// refresh broadcast and the queue-freeze forwarder.
pub struct RealtimeService;

impl RealtimeService {
    pub fn publish(sse_tx: &broadcast::Sender<String>, event: &SseEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            // no subscribers is fine
            let _ = sse_tx.send(payload);
        }
    }

    /// Waits `delay` so the triggering write is visible, then asks every
    /// client to reload the board and the record's list row.
    pub async fn kanban_refresh(
        sse_tx: &broadcast::Sender<String>,
        delay: Duration,
        doctype: &str,
        name: &str,
        notify_user: &str,
    ) -> &'static str {
        tokio::time::sleep(delay).await;

        Self::publish(sse_tx, &SseEvent::KanbanRefresh);
        Self::publish(
            sse_tx,
            &SseEvent::ListUpdate {
                doctype: doctype.to_string(),
                name: name.to_string(),
                user: notify_user.to_string(),
            },
        );

        tracing::debug!(doctype, name, "Kanban refresh broadcast");
        REFRESH_ACK
    }

    pub async fn freeze_queue_position(
        http_client: &reqwest::Client,
        queue_url: &str,
    ) -> Result<String, KanbanError> {
        let url = format!("{}queue/send-freeze-queue-position-message", queue_url);

        let response = http_client.post(&url).json(&json!({})).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(url = url.as_str(), %status, "Queue freeze request failed");
            return Err(KanbanError::Upstream(format!(
                "queue service returned {}: {}",
                status, body
            )));
        }

        Ok(body)
    }
}
