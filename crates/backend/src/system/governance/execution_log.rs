//! Журнал выполнения конвейера в отдельной SQLite-базе.

use chrono::Local;
use contracts::system::execution_log::{
    ExecutionLogEntry, ExecutionStatus, ExecutionStep, TriggerType,
};
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, DatabaseBackend, EntityTrait, QueryOrder, QuerySelect, Set, Statement};
use std::path::Path;
use std::time::Instant;
use uuid::Uuid;

use crate::shared::data::db;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "sys_execution_log")]
pub struct Model {
    #[sea_orm(primary_key)]
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
    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for ExecutionLogEntry {
    fn from(m: Model) -> Self {
        ExecutionLogEntry {
            id: m.id,
            execution_id: m.execution_id,
            execution_date: m.execution_date,
            execution_time: m.execution_time,
            environment: m.environment,
            trigger_type: m.trigger_type,
            step: m.step,
            substep: m.substep,
            status: m.status,
            message: m.message,
            error_stack: m.error_stack,
            duration_ms: m.duration_ms,
        }
    }
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS sys_execution_log (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        execution_id TEXT NOT NULL,
        execution_date TEXT NOT NULL,
        execution_time TEXT NOT NULL,
        environment TEXT NOT NULL,
        trigger_type TEXT NOT NULL,
        step TEXT NOT NULL,
        substep TEXT,
        status TEXT NOT NULL,
        message TEXT,
        error_stack TEXT,
        duration_ms INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_exec_date ON sys_execution_log(execution_date)",
    "CREATE INDEX IF NOT EXISTS idx_exec_id ON sys_execution_log(execution_id)",
];

/// Открывает базу журнала и создаёт таблицу
pub async fn open_store(path: &Path) -> anyhow::Result<DatabaseConnection> {
    let conn = db::open(path).await?;
    for sql in SCHEMA {
        conn.execute(Statement::from_string(DatabaseBackend::Sqlite, sql.to_string()))
            .await?;
    }
    Ok(conn)
}

/// DEV в отладочной сборке, PROD в релизной
pub fn current_environment() -> &'static str {
    if cfg!(debug_assertions) {
        "DEV"
    } else {
        "PROD"
    }
}

/// Пишет шаги одного запуска конвейера под общим execution_id
pub struct ExecutionLogger {
    conn: Option<DatabaseConnection>,
    execution_id: String,
    environment: &'static str,
    trigger: TriggerType,
    started: Instant,
}

impl ExecutionLogger {
    /// Ошибка открытия базы не прерывает запуск: записи только трассируются
    pub async fn new(path: &Path, trigger: TriggerType) -> Self {
        let conn = match open_store(path).await {
            Ok(c) => Some(c),
            Err(e) => {
                tracing::error!("EXECUTION LOG | cannot open {}: {}", path.display(), e);
                None
            }
        };
        Self::with_connection(conn, trigger)
    }

    pub fn with_connection(conn: Option<DatabaseConnection>, trigger: TriggerType) -> Self {
        Self {
            conn,
            execution_id: Uuid::new_v4().to_string(),
            environment: current_environment(),
            trigger,
            started: Instant::now(),
        }
    }

    pub fn execution_id(&self) -> &str {
        &self.execution_id
    }

    pub async fn log(
        &self,
        step: ExecutionStep,
        status: ExecutionStatus,
        substep: Option<&str>,
        message: Option<&str>,
        error: Option<&str>,
    ) {
        tracing::info!(
            "{} | {}{} {}",
            step.code(),
            status.code(),
            substep.map(|s| format!(" [{}]", s)).unwrap_or_default(),
            message.unwrap_or("")
        );
        let Some(conn) = &self.conn else {
            return;
        };

        let now = Local::now();
        let active = ActiveModel {
            id: sea_orm::ActiveValue::NotSet,
            execution_id: Set(self.execution_id.clone()),
            execution_date: Set(now.format("%Y-%m-%d").to_string()),
            execution_time: Set(now.format("%H:%M:%S").to_string()),
            environment: Set(self.environment.to_string()),
            trigger_type: Set(self.trigger.code().to_string()),
            step: Set(step.code().to_string()),
            substep: Set(substep.map(str::to_string)),
            status: Set(status.code().to_string()),
            message: Set(message.map(str::to_string)),
            error_stack: Set(error.map(str::to_string)),
            duration_ms: Set(self.started.elapsed().as_millis() as i64),
            created_at: Set(now.format("%Y-%m-%d %H:%M:%S").to_string()),
        };
        if let Err(e) = Entity::insert(active).exec(conn).await {
            tracing::error!("EXECUTION LOG | failed to write row: {}", e);
        }
    }
}

/// Последние записи журнала, новые первыми
pub async fn recent(conn: &DatabaseConnection, limit: u64) -> anyhow::Result<Vec<ExecutionLogEntry>> {
    Ok(Entity::find()
        .order_by_desc(Column::Id)
        .limit(limit)
        .all(conn)
        .await?
        .into_iter()
        .map(Into::into)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rows_share_execution_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exec.db");
        let logger = ExecutionLogger::new(&path, TriggerType::Manual).await;
        logger
            .log(ExecutionStep::Pipeline, ExecutionStatus::Started, None, None, None)
            .await;
        logger
            .log(
                ExecutionStep::Ranking,
                ExecutionStatus::Success,
                Some("ranking_vendedor"),
                Some("ok"),
                None,
            )
            .await;

        let conn = open_store(&path).await.unwrap();
        let rows = recent(&conn, 10).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].step, "RANKING");
        assert_eq!(rows[0].substep.as_deref(), Some("ranking_vendedor"));
        assert_eq!(rows[1].status, "STARTED");
        assert!(rows.iter().all(|r| r.execution_id == logger.execution_id()));
        assert_eq!(rows[0].trigger_type, "MANUAL");
        assert_eq!(recent(&conn, 1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_logging_without_store_is_silent() {
        let logger = ExecutionLogger::with_connection(None, TriggerType::Scheduled);
        logger
            .log(ExecutionStep::Backup, ExecutionStatus::Warning, None, None, None)
            .await;
    }
}
