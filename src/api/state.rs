use std::sync::Arc;

use sqlx::SqlitePool;
use tokio::sync::broadcast;

use crate::config::Config;
use crate::domain::KanbanError;
use crate::infrastructure::SettingsCache;
use crate::services::{BoardService, HttpPrintRenderer, PrintService, SettingsService};

#[derive(Clone, Debug)]
pub struct AppState {
    pub db: Option<SqlitePool>,
    pub sse_tx: broadcast::Sender<String>,
    pub http_client: reqwest::Client,
    pub config: Arc<Config>,
    pub settings_cache: SettingsCache,
}

impl AppState {
    pub fn new(
        db: Option<SqlitePool>,
        sse_tx: broadcast::Sender<String>,
        http_client: reqwest::Client,
        config: Arc<Config>,
        settings_cache: SettingsCache,
    ) -> Self {
        Self {
            db,
            sse_tx,
            http_client,
            config,
            settings_cache,
        }
    }

    pub fn require_db(&self) -> Result<&SqlitePool, KanbanError> {
        self.db
            .as_ref()
            .ok_or_else(|| KanbanError::Internal("Database not available".into()))
    }

    pub fn board_service(&self) -> Result<BoardService, KanbanError> {
        Ok(BoardService::new(
            self.require_db()?.clone(),
            self.settings_cache.clone(),
        ))
    }

    pub fn settings_service(&self) -> Result<SettingsService, KanbanError> {
        Ok(SettingsService::new(
            self.require_db()?.clone(),
            self.settings_cache.clone(),
        ))
    }

    pub fn print_service(&self) -> Result<PrintService<HttpPrintRenderer>, KanbanError> {
        let renderer = HttpPrintRenderer::new(
            self.http_client.clone(),
            self.config.print_service_url.clone(),
        );
        Ok(PrintService::new(self.require_db()?.clone(), renderer))
    }
}
