use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::Json;
use chrono::Local;
use contracts::dashboards::d410_medal_table::{
    AthleteHistoryEntry, MedalTableRequest, MedalTableRow, WeeklyTally,
};
use contracts::shared::period::PeriodRange;

use crate::dashboards::d410_medal_table::service;
use crate::shared::config::get_config;
use crate::shared::data::db::get_connection;

/// GET /api/period/current
pub async fn current_period() -> Result<Json<PeriodRange>, StatusCode> {
    let config = get_config().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(service::current_period(
        &config.commercial_month,
        Local::now().date_naive(),
    )))
}

/// GET /api/medals?date_from&date_to
pub async fn medal_table(
    Query(request): Query<MedalTableRequest>,
) -> Result<Json<Vec<MedalTableRow>>, StatusCode> {
    let config = get_config().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    let db = get_connection().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    let today = Local::now().date_naive();
    if service::resolve_period(
        &config.commercial_month,
        request.date_from.as_deref(),
        request.date_to.as_deref(),
        today,
    )
    .is_err()
    {
        return Err(StatusCode::BAD_REQUEST);
    }
    match service::medal_table(db, config, &request, today).await {
        Ok(rows) => Ok(Json(rows)),
        Err(e) => {
            tracing::error!("DASHBOARD | medal table failed: {:#}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// GET /api/sellers
pub async fn list_sellers() -> Result<Json<Vec<String>>, StatusCode> {
    let db = get_connection().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    match service::seller_names(db).await {
        Ok(v) => Ok(Json(v)),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

/// GET /api/sellers/:name/history
pub async fn athlete_history(
    Path(name): Path<String>,
) -> Result<Json<Vec<AthleteHistoryEntry>>, StatusCode> {
    let db = get_connection().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    match service::athlete_history(db, &name).await {
        Ok(v) => Ok(Json(v)),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

/// GET /api/sellers/:name/weeks
pub async fn weekly_tallies(
    Path(name): Path<String>,
) -> Result<Json<Vec<WeeklyTally>>, StatusCode> {
    let db = get_connection().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    match service::weekly_tallies(db, &name).await {
        Ok(v) => Ok(Json(v)),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}
