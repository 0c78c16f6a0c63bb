use serde::{Deserialize, Serialize};

/// Диапазон дат в формате "YYYY-MM-DD" (обе границы включительно)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodRange {
    pub date_from: String,
    pub date_to: String,
}

impl PeriodRange {
    pub fn new(date_from: impl Into<String>, date_to: impl Into<String>) -> Self {
        Self {
            date_from: date_from.into(),
            date_to: date_to.into(),
        }
    }
}
