use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use super::logger::TaskLogger;

/// Трейт для менеджеров запланированных задач.
/// Каждый тип задачи имеет свою реализацию.
#[async_trait]
pub trait TaskManager: Send + Sync {
    /// Тип задачи, который обрабатывает этот менеджер.
    fn task_type(&self) -> &'static str;

    /// Запускает выполнение задачи в рамках сессии `session_id`.
    async fn run(&self, session_id: &str, logger: Arc<TaskLogger>) -> Result<()>;
}
