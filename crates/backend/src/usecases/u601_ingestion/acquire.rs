use chrono::NaiveDate;
use contracts::system::execution_log::{ExecutionStatus, ExecutionStep};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::bi_export::{newest_xlsx, sheet_file_name, SheetExporter};
use super::spreadsheet::validate_file;
use crate::system::governance::execution_log::ExecutionLogger;

/// Параметры получения файла с целями
#[derive(Debug, Clone)]
pub struct AcquireOptions {
    /// Файл, указанный вручную (`--meta-file`)
    pub manual: Option<PathBuf>,
    pub force: bool,
    /// 0, когда выгрузка из BI отключена
    pub attempts: u32,
    pub retry_wait: Duration,
    pub data_dir: PathBuf,
}

/// Получает файл выгрузки: вручную, из BI с повторами, либо последний локальный
pub async fn acquire_goal_sheet(
    exporter: &dyn SheetExporter,
    options: &AcquireOptions,
    today: NaiveDate,
    logger: &ExecutionLogger,
) -> Option<PathBuf> {
    if let Some(manual) = &options.manual {
        let message = format!("manual file {}", manual.display());
        logger
            .log(ExecutionStep::Ingestion, ExecutionStatus::Success, Some("manual"), Some(&message), None)
            .await;
        return Some(manual.clone());
    }

    let target = options.data_dir.join(sheet_file_name(today));
    let attempts = options.attempts;
    if attempts == 0 {
        logger
            .log(ExecutionStep::Ingestion, ExecutionStatus::Skipped, Some("bi"), Some("BI export disabled"), None)
            .await;
    }
    for attempt in 1..=attempts {
        let substep = format!("attempt {}/{}", attempt, attempts);
        match exporter.export(&target, options.force).await {
            Ok(Some(path)) => match validate_file(&path) {
                Ok(()) => {
                    let message = format!("downloaded {}", path.display());
                    logger
                        .log(ExecutionStep::Ingestion, ExecutionStatus::Success, Some(&substep), Some(&message), None)
                        .await;
                    return Some(path);
                }
                Err(e) => {
                    let message = format!("invalid export {}", path.display());
                    logger
                        .log(
                            ExecutionStep::Ingestion,
                            ExecutionStatus::Warning,
                            Some(&substep),
                            Some(&message),
                            Some(&e.to_string()),
                        )
                        .await;
                    if let Err(e) = std::fs::remove_file(&path) {
                        tracing::warn!("INGESTION | cannot remove {}: {}", path.display(), e);
                    }
                }
            },
            Ok(None) => {
                logger
                    .log(
                        ExecutionStep::Ingestion,
                        ExecutionStatus::Warning,
                        Some(&substep),
                        Some("no file downloaded"),
                        None,
                    )
                    .await;
            }
            Err(e) => {
                logger
                    .log(
                        ExecutionStep::Ingestion,
                        ExecutionStatus::Warning,
                        Some(&substep),
                        Some("BI export failed"),
                        Some(&e.to_string()),
                    )
                    .await;
            }
        }
        if attempt < attempts {
            tokio::time::sleep(options.retry_wait).await;
        }
    }

    match newest_local_sheet(&options.data_dir) {
        Some(path) => {
            let message = format!("using previous sheet {}", path.display());
            logger
                .log(ExecutionStep::Ingestion, ExecutionStatus::Warning, Some("fallback"), Some(&message), None)
                .await;
            Some(path)
        }
        None => {
            logger
                .log(
                    ExecutionStep::Ingestion,
                    ExecutionStatus::Fail,
                    Some("fallback"),
                    Some("no goal sheet available"),
                    None,
                )
                .await;
            None
        }
    }
}

pub fn newest_local_sheet(data_dir: &Path) -> Option<PathBuf> {
    newest_xlsx(data_dir, Some("MetaVendedor_"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::browser::AutomationError;
    use async_trait::async_trait;
    use contracts::system::execution_log::TriggerType;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FailingExporter {
        calls: AtomicU32,
    }

    #[async_trait]
    impl SheetExporter for FailingExporter {
        async fn export(&self, _target: &Path, _force: bool) -> Result<Option<PathBuf>, AutomationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(AutomationError::Timeout("login".into()))
        }
    }

    fn options(dir: &Path) -> AcquireOptions {
        AcquireOptions {
            manual: None,
            force: true,
            attempts: 3,
            retry_wait: Duration::ZERO,
            data_dir: dir.to_path_buf(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 7).unwrap()
    }

    #[tokio::test]
    async fn test_manual_file_wins() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = FailingExporter { calls: AtomicU32::new(0) };
        let logger = ExecutionLogger::with_connection(None, TriggerType::Manual);
        let mut opts = options(dir.path());
        opts.manual = Some(dir.path().join("manual.xlsx"));
        let got = acquire_goal_sheet(&exporter, &opts, today(), &logger).await;
        assert_eq!(got, Some(dir.path().join("manual.xlsx")));
        assert_eq!(exporter.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_falls_back_to_newest_local_sheet() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("MetaVendedor_0603.xlsx"), b"x").unwrap();
        std::fs::write(dir.path().join("other.xlsx"), b"x").unwrap();
        let exporter = FailingExporter { calls: AtomicU32::new(0) };
        let logger = ExecutionLogger::with_connection(None, TriggerType::Manual);
        let got = acquire_goal_sheet(&exporter, &options(dir.path()), today(), &logger).await;
        assert_eq!(got, Some(dir.path().join("MetaVendedor_0603.xlsx")));
        assert_eq!(exporter.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_disabled_export_goes_straight_to_fallback() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("MetaVendedor_0603.xlsx"), b"x").unwrap();
        let exporter = FailingExporter { calls: AtomicU32::new(0) };
        let logger = ExecutionLogger::with_connection(None, TriggerType::Manual);
        let mut opts = options(dir.path());
        opts.attempts = 0;
        let got = acquire_goal_sheet(&exporter, &opts, today(), &logger).await;
        assert_eq!(got, Some(dir.path().join("MetaVendedor_0603.xlsx")));
        assert_eq!(exporter.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_nothing_available() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = FailingExporter { calls: AtomicU32::new(0) };
        let logger = ExecutionLogger::with_connection(None, TriggerType::Manual);
        let got = acquire_goal_sheet(&exporter, &options(dir.path()), today(), &logger).await;
        assert!(got.is_none());
    }
}
