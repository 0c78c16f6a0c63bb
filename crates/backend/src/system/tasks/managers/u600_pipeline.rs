use anyhow::Result;
use async_trait::async_trait;
use contracts::system::execution_log::TriggerType;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::shared::config::Config;
use crate::system::tasks::logger::TaskLogger;
use crate::system::tasks::manager::TaskManager;
use crate::usecases::u600_pipeline::{run_pipeline, RunOptions};

pub const PIPELINE_TASK: &str = "u600_pipeline";

/// Менеджер плановых запусков конвейера (u600)
pub struct PipelineTaskManager {
    config: Config,
    db: DatabaseConnection,
}

impl PipelineTaskManager {
    pub fn new(config: Config, db: DatabaseConnection) -> Self {
        Self { config, db }
    }
}

#[async_trait]
impl TaskManager for PipelineTaskManager {
    fn task_type(&self) -> &'static str {
        PIPELINE_TASK
    }

    async fn run(&self, session_id: &str, logger: Arc<TaskLogger>) -> Result<()> {
        logger.write_log(session_id, "Starting scheduled pipeline run...")?;

        let options = RunOptions {
            trigger: TriggerType::Scheduled,
            ..Default::default()
        };
        let outcome = run_pipeline(&self.config, self.db.clone(), options).await?;

        logger.write_log(
            session_id,
            &format!(
                "Pipeline {} finished with {} ({} images)",
                outcome.execution_id,
                outcome.status.code(),
                outcome.images
            ),
        )?;
        Ok(())
    }
}
