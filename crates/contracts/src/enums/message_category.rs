use serde::{Deserialize, Serialize};

/// Категории шаблонов подписей для групповых рассылок
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageCategory {
    DailyMorning,
    DailyAfternoon,
    Weekly,
    Monthly,
    Points,
}

impl MessageCategory {
    pub fn code(&self) -> &'static str {
        match self {
            MessageCategory::DailyMorning => "DAILY_MORNING",
            MessageCategory::DailyAfternoon => "DAILY_AFTERNOON",
            MessageCategory::Weekly => "WEEKLY",
            MessageCategory::Monthly => "MONTHLY",
            MessageCategory::Points => "POINTS",
        }
    }

    pub fn all() -> Vec<MessageCategory> {
        vec![
            MessageCategory::DailyMorning,
            MessageCategory::DailyAfternoon,
            MessageCategory::Weekly,
            MessageCategory::Monthly,
            MessageCategory::Points,
        ]
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::all().into_iter().find(|c| c.code() == code.trim())
    }

    /// Категория дневной подписи: до 13 часов утренняя, затем дневная
    pub fn daily_for_hour(hour: u32) -> Self {
        if hour < 13 {
            MessageCategory::DailyMorning
        } else {
            MessageCategory::DailyAfternoon
        }
    }
}
