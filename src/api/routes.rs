use axum::http::HeaderValue;
use axum::routing::{get, patch, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::handlers;
use crate::api::state::AppState;
use crate::auth;
use crate::config::Config;

pub fn create_router(state: AppState, config: &Config) -> Router {
    let origins: Vec<HeaderValue> = config
        .cors_origin
        .split(',')
        .filter_map(|s| s.trim().parse::<HeaderValue>().ok())
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    let board_routes = Router::new()
        .route(
            "/",
            get(handlers::boards::list_boards).post(handlers::boards::create_board),
        )
        .route("/quick", post(handlers::boards::quick_board))
        .route("/{id}", get(handlers::boards::get_board))
        .route("/{id}/columns", post(handlers::boards::add_column))
        .route(
            "/{id}/columns/status",
            patch(handlers::boards::archive_restore_column),
        )
        .route(
            "/{id}/columns/indicator",
            patch(handlers::boards::set_indicator),
        )
        .route("/{id}/columns/order", put(handlers::boards::reorder_columns))
        .route("/{id}/settings", put(handlers::boards::save_settings))
        .route("/{id}/cards", post(handlers::cards::add_card))
        .route("/{id}/cards/move", patch(handlers::cards::move_card))
        .route("/{id}/order", put(handlers::cards::bulk_set_order));

    let settings_routes = Router::new()
        .route("/sync", post(handlers::settings::sync_user_settings))
        .route(
            "/rewrite-filters",
            post(handlers::settings::rewrite_filters),
        )
        .route(
            "/{doctype}",
            get(handlers::settings::get_user_settings)
                .put(handlers::settings::save_user_settings),
        );

    let print_routes = Router::new()
        .route("/pdf", post(handlers::print::download_pdf))
        .route("/multi", post(handlers::print::download_multi_pdf));

    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/health/live", get(handlers::liveness));

    let protected_routes = Router::new()
        .route("/api/events", get(handlers::sse::sse_handler))
        .route("/api/refresh", post(handlers::ops::kanban_refresh))
        .route(
            "/api/queue/freeze",
            post(handlers::ops::freeze_queue_position),
        )
        .nest("/api/boards", board_routes)
        .nest("/api/user-settings", settings_routes)
        .nest("/api/print", print_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
