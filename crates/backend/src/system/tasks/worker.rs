use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use cron::Schedule;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::time::{self, MissedTickBehavior};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{logger::TaskLogger, registry::TaskManagerRegistry};

/// Расписание одной задачи
pub struct CronEntry {
    pub expression: String,
    pub task_type: String,
    schedule: Schedule,
}

impl CronEntry {
    pub fn parse(expression: &str, task_type: &str) -> Result<Self> {
        let schedule = Schedule::from_str(expression)
            .with_context(|| format!("invalid cron expression '{}'", expression))?;
        Ok(Self {
            expression: expression.to_string(),
            task_type: task_type.to_string(),
            schedule,
        })
    }

    /// Есть ли срабатывание в интервале (previous_check, now]
    pub fn is_due(&self, previous_check: DateTime<Local>, now: DateTime<Local>) -> bool {
        self.schedule
            .after(&previous_check)
            .next()
            .map(|next| next <= now)
            .unwrap_or(false)
    }
}

/// Сбрасывает флаг запуска при завершении задачи, в том числе при панике
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Фоновый воркер: проверяет расписания и запускает задачи без наложения запусков.
pub struct ScheduledTaskWorker {
    registry: Arc<TaskManagerRegistry>,
    logger: Arc<TaskLogger>,
    entries: Vec<CronEntry>,
    interval_seconds: u64,
    running: Arc<AtomicBool>,
    last_check: Mutex<DateTime<Local>>,
}

impl ScheduledTaskWorker {
    pub fn new(
        registry: Arc<TaskManagerRegistry>,
        logger: Arc<TaskLogger>,
        entries: Vec<CronEntry>,
        interval_seconds: u64,
    ) -> Self {
        Self {
            registry,
            logger,
            entries,
            interval_seconds: interval_seconds.max(1),
            running: Arc::new(AtomicBool::new(false)),
            last_check: Mutex::new(Local::now()),
        }
    }

    pub fn entries(&self) -> &[CronEntry] {
        &self.entries
    }

    /// Запускает цикл проверки расписаний.
    pub async fn run_loop(&self) {
        info!(
            "SCHEDULER | worker started: {} schedule(s), check every {}s",
            self.entries.len(),
            self.interval_seconds
        );
        for entry in &self.entries {
            info!("SCHEDULER | '{}' -> {}", entry.expression, entry.task_type);
        }
        let mut interval = time::interval(time::Duration::from_secs(self.interval_seconds));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            self.process_due_tasks(Local::now());
        }
    }

    /// Типы задач, срабатывающие с прошлой проверки
    fn due_task_types(&self, now: DateTime<Local>) -> Vec<String> {
        let previous = {
            let mut last = self.last_check.lock().unwrap_or_else(|p| p.into_inner());
            std::mem::replace(&mut *last, now)
        };
        let mut due: Vec<String> = Vec::new();
        for entry in &self.entries {
            if entry.is_due(previous, now) && !due.contains(&entry.task_type) {
                due.push(entry.task_type.clone());
            }
        }
        due
    }

    fn process_due_tasks(&self, now: DateTime<Local>) {
        for task_type in self.due_task_types(now) {
            if self.running.swap(true, Ordering::SeqCst) {
                warn!("SCHEDULER | '{}' is due but a run is still in progress, skipping", task_type);
                continue;
            }
            let Some(manager) = self.registry.get(&task_type) else {
                warn!("SCHEDULER | no manager registered for '{}'", task_type);
                self.running.store(false, Ordering::SeqCst);
                continue;
            };

            let session_id = Uuid::new_v4().to_string();
            let logger = Arc::clone(&self.logger);
            let guard = RunningGuard(Arc::clone(&self.running));
            info!("SCHEDULER | '{}' is due, session {}", task_type, session_id);

            tokio::spawn(async move {
                let _guard = guard;
                match manager.run(&session_id, Arc::clone(&logger)).await {
                    Ok(()) => info!("SCHEDULER | '{}' session {} completed", task_type, session_id),
                    Err(e) => {
                        error!("SCHEDULER | '{}' session {} failed: {:#}", task_type, session_id, e);
                        if let Err(log_err) = logger.write_log(&session_id, &format!("FAILED: {:#}", e)) {
                            warn!("SCHEDULER | cannot write task log: {}", log_err);
                        }
                    }
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::tasks::manager::TaskManager;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::atomic::AtomicUsize;

    fn at(h: u32, m: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 1, 14, h, m, 0).unwrap()
    }

    struct SlowManager {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl TaskManager for SlowManager {
        fn task_type(&self) -> &'static str {
            "slow"
        }

        async fn run(&self, _session_id: &str, _logger: Arc<TaskLogger>) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            time::sleep(time::Duration::from_millis(200)).await;
            Ok(())
        }
    }

    struct PanickingManager {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl TaskManager for PanickingManager {
        fn task_type(&self) -> &'static str {
            "panicking"
        }

        async fn run(&self, _session_id: &str, _logger: Arc<TaskLogger>) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            panic!("browser crashed");
        }
    }

    #[test]
    fn test_entry_due_between_checks() {
        let entry = CronEntry::parse("0 30 10 * * Mon-Sat", "slow").unwrap();
        assert!(entry.is_due(at(10, 29), at(10, 30)));
        assert!(!entry.is_due(at(10, 30), at(10, 31)));
        assert!(!entry.is_due(at(9, 0), at(10, 0)));
    }

    #[test]
    fn test_invalid_expression_is_rejected() {
        assert!(CronEntry::parse("every morning", "slow").is_err());
    }

    #[tokio::test]
    async fn test_no_overlapping_runs() {
        let dir = tempfile::tempdir().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = TaskManagerRegistry::new();
        registry.register(SlowManager {
            calls: Arc::clone(&calls),
        });
        let entries = vec![CronEntry::parse("0 * * * * *", "slow").unwrap()];
        let worker = ScheduledTaskWorker::new(
            Arc::new(registry),
            Arc::new(TaskLogger::new(dir.path())),
            entries,
            60,
        );
        *worker.last_check.lock().unwrap() = at(10, 0);

        worker.process_due_tasks(at(10, 1));
        worker.process_due_tasks(at(10, 2));
        time::sleep(time::Duration::from_millis(400)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        worker.process_due_tasks(at(10, 3));
        time::sleep(time::Duration::from_millis(400)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_panicking_run_releases_flag() {
        let dir = tempfile::tempdir().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = TaskManagerRegistry::new();
        registry.register(PanickingManager {
            calls: Arc::clone(&calls),
        });
        let entries = vec![CronEntry::parse("0 * * * * *", "panicking").unwrap()];
        let worker = ScheduledTaskWorker::new(
            Arc::new(registry),
            Arc::new(TaskLogger::new(dir.path())),
            entries,
            60,
        );
        *worker.last_check.lock().unwrap() = at(10, 0);

        worker.process_due_tasks(at(10, 1));
        time::sleep(time::Duration::from_millis(200)).await;
        assert!(!worker.running.load(Ordering::SeqCst));

        worker.process_due_tasks(at(10, 2));
        time::sleep(time::Duration::from_millis(200)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
