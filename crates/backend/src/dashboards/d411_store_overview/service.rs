use anyhow::Result;
use chrono::NaiveDate;
use contracts::dashboards::d411_store_overview::{
    StoreComparisonPoint, StoreEfficiencyRow, StoreEvolutionPoint, StoreOverview, StoreSellerRow,
};
use sea_orm::DatabaseConnection;

use super::repository;
use crate::domain::a101_seller;

/// Магазины активных продавцов
pub async fn store_names(db: &DatabaseConnection) -> Result<Vec<String>> {
    a101_seller::repository::distinct_stores(db).await
}

/// Магазины из строки "a,b,c" без пустых и повторов
pub fn parse_store_list(raw: Option<&str>) -> Vec<String> {
    let mut stores: Vec<String> = Vec::new();
    for store in raw.unwrap_or_default().split(',').map(str::trim) {
        if !store.is_empty() && !stores.iter().any(|s| s == store) {
            stores.push(store.to_string());
        }
    }
    stores
}

pub async fn overview(
    db: &DatabaseConnection,
    store: &str,
    date_from: NaiveDate,
    date_to: NaiveDate,
) -> Result<StoreOverview> {
    let totals = repository::store_totals(db, store, date_from, date_to).await?;
    Ok(StoreOverview {
        store: store.to_string(),
        total_points: totals.total_points,
        active_sellers: totals.active_sellers,
        gold: totals.gold,
        other_medals: totals.other_medals,
    })
}

pub async fn sellers(
    db: &DatabaseConnection,
    store: &str,
    date_from: NaiveDate,
    date_to: NaiveDate,
) -> Result<Vec<StoreSellerRow>> {
    Ok(repository::store_sellers(db, store, date_from, date_to)
        .await?
        .into_iter()
        .map(|r| StoreSellerRow {
            seller: r.seller_name,
            points: r.points,
            gold: r.gold,
            silver: r.silver,
            bronze: r.bronze,
            bonus: r.bonus,
        })
        .collect())
}

/// Очки магазина по дням с накопленной суммой
pub async fn evolution(
    db: &DatabaseConnection,
    store: &str,
    date_from: NaiveDate,
    date_to: NaiveDate,
) -> Result<Vec<StoreEvolutionPoint>> {
    let days = repository::daily_points(db, &[store.to_string()], date_from, date_to).await?;
    let mut cumulative = 0;
    Ok(days
        .into_iter()
        .map(|d| {
            cumulative += d.points_day;
            StoreEvolutionPoint {
                date: d.date,
                points_day: d.points_day,
                points_cumulative: cumulative,
            }
        })
        .collect())
}

/// Очки нескольких магазинов по дням; накопление отдельно для каждого магазина
pub async fn compare(
    db: &DatabaseConnection,
    stores: &[String],
    date_from: NaiveDate,
    date_to: NaiveDate,
) -> Result<Vec<StoreComparisonPoint>> {
    let days = repository::daily_points(db, stores, date_from, date_to).await?;
    let mut points = Vec::with_capacity(days.len());
    let mut current: Option<String> = None;
    let mut cumulative = 0;
    for day in days {
        if current.as_deref() != Some(day.store.as_str()) {
            current = Some(day.store.clone());
            cumulative = 0;
        }
        cumulative += day.points_day;
        points.push(StoreComparisonPoint {
            store: day.store,
            date: day.date,
            points_day: day.points_day,
            points_cumulative: cumulative,
        });
    }
    Ok(points)
}

/// Рейтинг магазинов по очкам на активного продавца
pub async fn efficiency(
    db: &DatabaseConnection,
    date_from: NaiveDate,
    date_to: NaiveDate,
) -> Result<Vec<StoreEfficiencyRow>> {
    let mut rows: Vec<StoreEfficiencyRow> = repository::points_by_store(db, date_from, date_to)
        .await?
        .into_iter()
        .map(|s| {
            let per_seller = if s.active_sellers > 0 {
                s.total_points as f64 / s.active_sellers as f64
            } else {
                0.0
            };
            StoreEfficiencyRow {
                position: 0,
                store: s.store,
                total_points: s.total_points,
                active_sellers: s.active_sellers,
                points_per_seller: (per_seller * 100.0).round() / 100.0,
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.points_per_seller
            .total_cmp(&a.points_per_seller)
            .then_with(|| b.total_points.cmp(&a.total_points))
            .then_with(|| a.store.cmp(&b.store))
    });
    for (idx, row) in rows.iter_mut().enumerate() {
        row.position = idx + 1;
    }
    Ok(rows)
}
