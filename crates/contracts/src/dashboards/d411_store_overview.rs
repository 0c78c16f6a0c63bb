use serde::{Deserialize, Serialize};

/// Параметры периода для запросов по магазинам
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorePeriodRequest {
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    /// Список магазинов через запятую (только для сравнения)
    pub stores: Option<String>,
}

/// Сводка по магазину
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreOverview {
    pub store: String,
    pub total_points: i64,
    pub active_sellers: i64,
    pub gold: i64,
    pub other_medals: i64,
}

/// Продавец магазина с очками за период
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSellerRow {
    pub seller: String,
    pub points: i64,
    pub gold: i64,
    pub silver: i64,
    pub bronze: i64,
    pub bonus: i64,
}

/// Очки магазина за день с накоплением
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreEvolutionPoint {
    pub date: String,
    pub points_day: i64,
    pub points_cumulative: i64,
}

/// Точка сравнения нескольких магазинов
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreComparisonPoint {
    pub store: String,
    pub date: String,
    pub points_day: i64,
    pub points_cumulative: i64,
}

/// Эффективность магазина: очки на активного продавца
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreEfficiencyRow {
    pub position: usize,
    pub store: String,
    pub total_points: i64,
    pub active_sellers: i64,
    pub points_per_seller: f64,
}
