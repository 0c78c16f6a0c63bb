use serde::{Deserialize, Serialize};

/// Визуальные поля строки рейтинга (полоса прогресса и бейдж)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowStyle {
    pub bar_width: f64,
    pub grad_start: String,
    pub grad_end: String,
    pub text_on_bar: String,
    pub badge_label: String,
    pub badge_bg: String,
    pub badge_text: String,
}

/// Строка дневного рейтинга (из выгрузки BI)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyRankingRow {
    pub rank: usize,
    pub name: String,
    pub store: String,
    pub goal: f64,
    pub sales: f64,
    pub attainment: f64,
    pub attainment_label: String,
    pub goal_label: String,
    pub sales_label: String,
    #[serde(flatten)]
    pub style: RowStyle,
}

/// Строка недельного рейтинга
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyRankingRow {
    pub rank: usize,
    pub name: String,
    pub store: String,
    pub sales: f64,
    pub goal: f64,
    pub attainment: f64,
    pub attainment_label: String,
    pub goal_label: String,
    pub sales_label: String,
    #[serde(flatten)]
    pub style: RowStyle,
    /// Статус по дням Пн..Сб: None для будущих дней
    pub week_status: Vec<Option<bool>>,
    /// Взвешенное количество дней с выполненной целью
    pub goals_hit: f64,
    pub goals_hit_label: String,
}

/// Строка месячного рейтинга (коммерческий месяц)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyRankingRow {
    pub rank: usize,
    pub name: String,
    pub store: String,
    pub sales: f64,
    pub goal: f64,
    pub attainment: f64,
    pub attainment_label: String,
    pub goal_label: String,
    pub sales_label: String,
    #[serde(flatten)]
    pub style: RowStyle,
}

/// Количество медалей по видам
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedalCounts {
    pub bronze: i64,
    pub silver: i64,
    pub gold: i64,
    pub bonus: i64,
}

/// Строка рейтинга очков с начала кампании
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointsRankingRow {
    pub rank: usize,
    pub name: String,
    pub points: i64,
    pub medals: MedalCounts,
    pub badge_icon: String,
}

/// Карточка-сводка в шапке дневного рейтинга
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeroCard {
    pub label: String,
    pub value: String,
}
