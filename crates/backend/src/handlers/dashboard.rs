use axum::http::StatusCode;
use axum::response::Html;
use chrono::Local;
use serde_json::json;

use super::images::latest_images;
use crate::dashboards::{d410_medal_table, d411_store_overview};
use crate::shared::config::get_config;
use crate::shared::data::db::get_connection;
use crate::usecases::u604_rendering::TemplateRenderer;

pub const DASHBOARD_TITLE: &str = "NL CHAMPIONS LEAGUE";

/// GET /
pub async fn index() -> Result<Html<String>, StatusCode> {
    let config = get_config().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    let db = get_connection().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    let now = Local::now().naive_local();

    let sellers = d410_medal_table::service::seller_names(db)
        .await
        .unwrap_or_default();
    let stores = d411_store_overview::service::store_names(db)
        .await
        .unwrap_or_default();
    let images: Vec<_> = latest_images(config)
        .into_iter()
        .flat_map(|set| {
            let total = set.urls.len();
            set.urls.into_iter().enumerate().map(move |(idx, url)| {
                let label = if total > 1 {
                    format!("{} ({}/{})", set.title, idx + 1, total)
                } else {
                    set.title.clone()
                };
                json!({ "url": url, "label": label })
            })
        })
        .collect();

    let context = json!({
        "title": DASHBOARD_TITLE,
        "company_name": config.gamification.company_name,
        "period": d410_medal_table::service::current_period(&config.commercial_month, now.date()),
        "sellers": sellers,
        "stores": stores,
        "images": images,
        "generated_at": now.format("%d/%m/%Y %H:%M").to_string(),
    });

    let renderer = TemplateRenderer::new().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    match renderer.render("dashboard.html", &context) {
        Ok(html) => Ok(Html(html)),
        Err(e) => {
            tracing::error!("DASHBOARD | page render failed: {:#}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
