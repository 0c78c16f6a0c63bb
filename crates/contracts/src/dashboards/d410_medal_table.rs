use serde::{Deserialize, Serialize};

use crate::enums::TrophyKind;

/// Параметры запроса таблицы медалей
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MedalTableRequest {
    /// Начало периода "YYYY-MM-DD"; по умолчанию начало текущего коммерческого месяца
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

/// Строка общей таблицы медалей
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedalTableRow {
    pub position: usize,
    /// 🥇🥈🥉 для первых трёх мест, 🎖️ для остальных
    pub icon: String,
    pub seller: String,
    pub points: i64,
    pub gold: i64,
    pub silver: i64,
    pub bronze: i64,
    /// Выполнение месячной цели, используется для разрешения равенства очков
    pub monthly_attainment: f64,
}

/// Запись истории трофеев продавца
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AthleteHistoryEntry {
    pub awarded_on: String,
    pub kind: TrophyKind,
    pub points: i64,
    pub reason: Option<String>,
}

/// Итоги продавца за неделю (Пн..Сб)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyTally {
    /// Формат "2025_W03"
    pub week_id: String,
    pub week_start: String,
    pub week_end: String,
    pub points: i64,
    pub gold: i64,
    pub silver: i64,
    pub bronze: i64,
    pub bonus_1: i64,
    pub bonus_2: i64,
}
