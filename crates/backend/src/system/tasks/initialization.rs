use anyhow::Result;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use super::{
    logger::TaskLogger,
    managers::{u600_pipeline::PIPELINE_TASK, PipelineTaskManager},
    registry::TaskManagerRegistry,
    worker::{CronEntry, ScheduledTaskWorker},
};
use crate::shared::config::Config;

/// Собирает реестр задач и воркер по расписаниям из конфигурации.
pub fn initialize_scheduled_tasks(config: &Config, db: DatabaseConnection) -> Result<ScheduledTaskWorker> {
    let mut registry = TaskManagerRegistry::new();
    let logger = Arc::new(TaskLogger::new(&config.logs_dir()));

    registry.register(PipelineTaskManager::new(config.clone(), db));

    let entries = config
        .schedule
        .crons
        .iter()
        .map(|expr| CronEntry::parse(expr, PIPELINE_TASK))
        .collect::<Result<Vec<_>>>()?;
    if entries.is_empty() {
        anyhow::bail!("no schedules configured in [schedule].crons");
    }

    Ok(ScheduledTaskWorker::new(
        Arc::new(registry),
        logger,
        entries,
        config.schedule.check_interval_seconds,
    ))
}
