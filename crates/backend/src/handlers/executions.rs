use axum::extract::Query;
use axum::http::StatusCode;
use axum::Json;
use contracts::system::execution_log::ExecutionLogEntry;
use serde::Deserialize;

use crate::shared::config::get_config;
use crate::system::governance::execution_log;

const DEFAULT_LIMIT: u64 = 50;
const MAX_LIMIT: u64 = 500;

#[derive(Debug, Deserialize)]
pub struct ExecutionsQuery {
    pub limit: Option<u64>,
}

/// GET /api/executions?limit=
pub async fn list_recent(
    Query(query): Query<ExecutionsQuery>,
) -> Result<Json<Vec<ExecutionLogEntry>>, StatusCode> {
    let config = get_config().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let store = match execution_log::open_store(&config.execution_log_path()).await {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("DASHBOARD | execution log unavailable: {:#}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };
    match execution_log::recent(&store, limit).await {
        Ok(rows) => Ok(Json(rows)),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}
