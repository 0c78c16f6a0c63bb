use serde::{Deserialize, Serialize};

/// Шаг конвейера, фиксируемый в журнале выполнения
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStep {
    Pipeline,
    Backup,
    Ingestion,
    Processing,
    Ranking,
    Notify,
    Snapshot,
}

impl ExecutionStep {
    pub fn code(&self) -> &'static str {
        match self {
            ExecutionStep::Pipeline => "PIPELINE",
            ExecutionStep::Backup => "BACKUP",
            ExecutionStep::Ingestion => "INGESTION",
            ExecutionStep::Processing => "PROCESSING",
            ExecutionStep::Ranking => "RANKING",
            ExecutionStep::Notify => "NOTIFY",
            ExecutionStep::Snapshot => "SNAPSHOT",
        }
    }

    pub fn all() -> Vec<ExecutionStep> {
        vec![
            ExecutionStep::Pipeline,
            ExecutionStep::Backup,
            ExecutionStep::Ingestion,
            ExecutionStep::Processing,
            ExecutionStep::Ranking,
            ExecutionStep::Notify,
            ExecutionStep::Snapshot,
        ]
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::all().into_iter().find(|v| v.code() == code.trim())
    }
}

/// Статус шага
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    Started,
    Success,
    Warning,
    Fail,
    Skipped,
    Aborted,
    Critical,
}

impl ExecutionStatus {
    pub fn code(&self) -> &'static str {
        match self {
            ExecutionStatus::Started => "STARTED",
            ExecutionStatus::Success => "SUCCESS",
            ExecutionStatus::Warning => "WARNING",
            ExecutionStatus::Fail => "FAIL",
            ExecutionStatus::Skipped => "SKIPPED",
            ExecutionStatus::Aborted => "ABORTED",
            ExecutionStatus::Critical => "CRITICAL",
        }
    }

    pub fn all() -> Vec<ExecutionStatus> {
        vec![
            ExecutionStatus::Started,
            ExecutionStatus::Success,
            ExecutionStatus::Warning,
            ExecutionStatus::Fail,
            ExecutionStatus::Skipped,
            ExecutionStatus::Aborted,
            ExecutionStatus::Critical,
        ]
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::all().into_iter().find(|v| v.code() == code.trim())
    }
}

/// Способ запуска конвейера
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerType {
    Manual,
    Scheduled,
}

impl TriggerType {
    pub fn code(&self) -> &'static str {
        match self {
            TriggerType::Manual => "MANUAL",
            TriggerType::Scheduled => "SCHEDULED",
        }
    }

    pub fn all() -> Vec<TriggerType> {
        vec![
            TriggerType::Manual,
            TriggerType::Scheduled,
        ]
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::all().into_iter().find(|v| v.code() == code.trim())
    }
}

/// Запись журнала выполнения
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionLogEntry {
    pub id: i64,
    pub execution_id: String,
    pub execution_date: String,
    pub execution_time: String,
    pub environment: String,
    pub trigger_type: String,
    pub step: String,
    pub substep: Option<String>,
    pub status: String,
    pub message: Option<String>,
    pub error_stack: Option<String>,
    pub duration_ms: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_parse_back() {
        for status in ExecutionStatus::all() {
            assert_eq!(ExecutionStatus::from_code(status.code()), Some(status));
        }
        assert_eq!(ExecutionStep::from_code("RANKING"), Some(ExecutionStep::Ranking));
        assert_eq!(TriggerType::from_code("CRON"), None);
    }
}
