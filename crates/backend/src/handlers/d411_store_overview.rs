use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::Json;
use chrono::{Local, NaiveDate};
use contracts::dashboards::d411_store_overview::{
    StoreComparisonPoint, StoreEfficiencyRow, StoreEvolutionPoint, StoreOverview,
    StorePeriodRequest, StoreSellerRow,
};

use crate::dashboards::{d410_medal_table, d411_store_overview::service};
use crate::shared::config::get_config;
use crate::shared::data::db::get_connection;

fn period(request: &StorePeriodRequest) -> Result<(NaiveDate, NaiveDate), StatusCode> {
    let config = get_config().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    d410_medal_table::service::resolve_period(
        &config.commercial_month,
        request.date_from.as_deref(),
        request.date_to.as_deref(),
        Local::now().date_naive(),
    )
    .map_err(|_| StatusCode::BAD_REQUEST)
}

fn failed(what: &str, e: anyhow::Error) -> StatusCode {
    tracing::error!("DASHBOARD | {} failed: {:#}", what, e);
    StatusCode::INTERNAL_SERVER_ERROR
}

/// GET /api/stores
pub async fn list_stores() -> Result<Json<Vec<String>>, StatusCode> {
    let db = get_connection().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    service::store_names(db)
        .await
        .map(Json)
        .map_err(|e| failed("store list", e))
}

/// GET /api/stores/:store/overview
pub async fn overview(
    Path(store): Path<String>,
    Query(request): Query<StorePeriodRequest>,
) -> Result<Json<StoreOverview>, StatusCode> {
    let (from, to) = period(&request)?;
    let db = get_connection().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    service::overview(db, &store, from, to)
        .await
        .map(Json)
        .map_err(|e| failed("store overview", e))
}

/// GET /api/stores/:store/sellers
pub async fn sellers(
    Path(store): Path<String>,
    Query(request): Query<StorePeriodRequest>,
) -> Result<Json<Vec<StoreSellerRow>>, StatusCode> {
    let (from, to) = period(&request)?;
    let db = get_connection().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    service::sellers(db, &store, from, to)
        .await
        .map(Json)
        .map_err(|e| failed("store sellers", e))
}

/// GET /api/stores/:store/evolution
pub async fn evolution(
    Path(store): Path<String>,
    Query(request): Query<StorePeriodRequest>,
) -> Result<Json<Vec<StoreEvolutionPoint>>, StatusCode> {
    let (from, to) = period(&request)?;
    let db = get_connection().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    service::evolution(db, &store, from, to)
        .await
        .map(Json)
        .map_err(|e| failed("store evolution", e))
}

/// GET /api/stores/compare?stores=a,b
pub async fn compare(
    Query(request): Query<StorePeriodRequest>,
) -> Result<Json<Vec<StoreComparisonPoint>>, StatusCode> {
    let (from, to) = period(&request)?;
    let stores = service::parse_store_list(request.stores.as_deref());
    if stores.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    let db = get_connection().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    service::compare(db, &stores, from, to)
        .await
        .map(Json)
        .map_err(|e| failed("store comparison", e))
}

/// GET /api/stores/efficiency
pub async fn efficiency(
    Query(request): Query<StorePeriodRequest>,
) -> Result<Json<Vec<StoreEfficiencyRow>>, StatusCode> {
    let (from, to) = period(&request)?;
    let db = get_connection().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    service::efficiency(db, from, to)
        .await
        .map(Json)
        .map_err(|e| failed("store efficiency", e))
}
