use kanban_views::mcp::{KanbanMcp, DEFAULT_API_URL};
use rmcp::{ServiceExt, transport::stdio};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // stdout carries the MCP protocol, so logs go to stderr
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let api_url = std::env::var("KANBAN_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

    let service = KanbanMcp::new(api_url, None).serve(stdio()).await?;
    service.waiting().await?;
    Ok(())
}
