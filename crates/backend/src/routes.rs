use axum::{middleware, routing::get, Router};
use std::path::Path;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::{handlers, system};

/// Конфигурация всех роутов дашборда
pub fn configure_routes(output_dir: &Path) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::dashboard::index))
        .route("/health", get(|| async { "ok" }))
        // ========================================
        // MEDAL TABLE (d410)
        // ========================================
        .route("/api/period/current", get(handlers::d410_medal_table::current_period))
        .route("/api/medals", get(handlers::d410_medal_table::medal_table))
        .route("/api/sellers", get(handlers::d410_medal_table::list_sellers))
        .route(
            "/api/sellers/:name/history",
            get(handlers::d410_medal_table::athlete_history),
        )
        .route(
            "/api/sellers/:name/weeks",
            get(handlers::d410_medal_table::weekly_tallies),
        )
        // ========================================
        // STORES (d411)
        // ========================================
        .route("/api/stores", get(handlers::d411_store_overview::list_stores))
        .route("/api/stores/compare", get(handlers::d411_store_overview::compare))
        .route(
            "/api/stores/efficiency",
            get(handlers::d411_store_overview::efficiency),
        )
        .route(
            "/api/stores/:store/overview",
            get(handlers::d411_store_overview::overview),
        )
        .route(
            "/api/stores/:store/sellers",
            get(handlers::d411_store_overview::sellers),
        )
        .route(
            "/api/stores/:store/evolution",
            get(handlers::d411_store_overview::evolution),
        )
        // ========================================
        // PIPELINE OUTPUT
        // ========================================
        .route("/api/images", get(handlers::images::list_latest))
        .route("/api/executions", get(handlers::executions::list_recent))
        .nest_service("/images", ServeDir::new(output_dir))
        .layer(middleware::from_fn(system::middleware::request_logger::request_logger))
        .layer(cors)
}
