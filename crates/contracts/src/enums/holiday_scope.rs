use serde::{Deserialize, Serialize};

/// Область действия праздника
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HolidayScope {
    National,
    State,
    Municipal,
    /// Праздник конкретного магазина (из файла праздников по магазинам)
    Store,
}

impl HolidayScope {
    pub fn code(&self) -> &'static str {
        match self {
            HolidayScope::National => "NATIONAL",
            HolidayScope::State => "STATE",
            HolidayScope::Municipal => "MUNICIPAL",
            HolidayScope::Store => "STORE",
        }
    }

    pub fn all() -> Vec<HolidayScope> {
        vec![
            HolidayScope::National,
            HolidayScope::State,
            HolidayScope::Municipal,
            HolidayScope::Store,
        ]
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_uppercase().as_str() {
            "NATIONAL" | "NACIONAL" => Some(HolidayScope::National),
            "STATE" | "ESTADUAL" => Some(HolidayScope::State),
            "MUNICIPAL" => Some(HolidayScope::Municipal),
            "STORE" | "LOJA" => Some(HolidayScope::Store),
            _ => None,
        }
    }
}
