use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub cors_origin: String,
    pub print_service_url: String,
    pub queue_service_url: String,
    pub refresh_delay_ms: u64,
    pub refresh_notify_user: String,
    pub settings_sync_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let defaults = Self::default();
        Ok(Self {
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            database_url: std::env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            cors_origin: std::env::var("CORS_ORIGIN").unwrap_or(defaults.cors_origin),
            print_service_url: std::env::var("PRINT_SERVICE_URL")
                .unwrap_or(defaults.print_service_url),
            queue_service_url: std::env::var("QUEUE_SERVICE_URL")
                .unwrap_or(defaults.queue_service_url),
            refresh_delay_ms: std::env::var("REFRESH_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.refresh_delay_ms),
            refresh_notify_user: std::env::var("REFRESH_NOTIFY_USER")
                .unwrap_or(defaults.refresh_notify_user),
            settings_sync_interval_secs: std::env::var("SETTINGS_SYNC_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.settings_sync_interval_secs),
        })
    }

    pub fn refresh_delay(&self) -> Duration {
        Duration::from_millis(self.refresh_delay_ms)
    }

    pub fn settings_sync_interval(&self) -> Duration {
        Duration::from_secs(self.settings_sync_interval_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 21547,
            database_url: "sqlite:kanban.db".into(),
            cors_origin: "http://localhost:21548,http://127.0.0.1:21548".into(),
            print_service_url: "http://localhost:3100".into(),
            queue_service_url: "http://localhost:3200/".into(),
            refresh_delay_ms: 2000,
            refresh_notify_user: "Administrator".into(),
            settings_sync_interval_secs: 60,
        }
    }
}
