//! Один полный запуск конвейера: бэкап, выгрузка, обработка, рейтинги, рассылка, снимки.

use anyhow::Result;
use chrono::{Local, NaiveDateTime, Timelike};
use contracts::system::execution_log::{ExecutionStatus, ExecutionStep, TriggerType};
use sea_orm::DatabaseConnection;
use std::path::PathBuf;
use std::time::Duration;

use crate::shared::config::{Config, ExecutionMode};
use crate::shared::data::db::db_file_paths;
use crate::system::governance::backup::BackupManager;
use crate::system::governance::execution_log::ExecutionLogger;
use crate::system::initialization::initialize_reference_data;
use crate::usecases::u601_ingestion::acquire::{acquire_goal_sheet, AcquireOptions};
use crate::usecases::u601_ingestion::bi_export::{BiExporter, SheetExporter};
use crate::usecases::u601_ingestion::contacts::{enrich, load_contacts, ContactBook};
use crate::usecases::u601_ingestion::spreadsheet::parse_goal_sheet;
use crate::usecases::u602_gamification::GamificationEngine;
use crate::usecases::u603_rankings::styles::expected_band;
use crate::usecases::u603_rankings::RankingService;
use crate::usecases::u604_rendering::{RankingImages, RankingRenderer, Snapshotter, WebDriverSnapshotter};
use crate::usecases::u605_notify::{DryRunSender, MessageSender, Notifier, NotifyRequest, WhatsAppWebSender};
use crate::usecases::u606_snapshots::export_snapshots;

/// Сколько датированных папок бэкапа хранить
pub const BACKUP_RETENTION: usize = 7;

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// `--meta-file`
    pub meta_file: Option<PathBuf>,
    /// false при `--no-force`
    pub force: bool,
    /// false при `--no-whatsapp`
    pub send_whatsapp: bool,
    pub trigger: TriggerType,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            meta_file: None,
            force: true,
            send_whatsapp: true,
            trigger: TriggerType::Manual,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutcome {
    pub execution_id: String,
    pub status: ExecutionStatus,
    pub images: usize,
}

/// Конвейер с подменяемыми браузерными частями
pub struct Pipeline<'a> {
    config: &'a Config,
    db: DatabaseConnection,
    exporter: &'a dyn SheetExporter,
    snapshotter: &'a dyn Snapshotter,
    sender: &'a dyn MessageSender,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: &'a Config,
        db: DatabaseConnection,
        exporter: &'a dyn SheetExporter,
        snapshotter: &'a dyn Snapshotter,
        sender: &'a dyn MessageSender,
    ) -> Self {
        Self {
            config,
            db,
            exporter,
            snapshotter,
            sender,
        }
    }

    pub async fn execute(&self, options: &RunOptions, now: NaiveDateTime) -> Result<PipelineOutcome> {
        let backups = BackupManager::new(self.config.backups_dir(), BACKUP_RETENTION);
        if !backups.perform_backup(&db_file_paths(self.config), now.date()) {
            tracing::warn!("BACKUP | nothing was copied");
        }

        let logger = ExecutionLogger::new(&self.config.execution_log_path(), options.trigger).await;
        logger
            .log(ExecutionStep::Pipeline, ExecutionStatus::Started, None, Some("pipeline started"), None)
            .await;

        match self.stages(&logger, options, now).await {
            Ok((status, images)) => Ok(PipelineOutcome {
                execution_id: logger.execution_id().to_string(),
                status,
                images,
            }),
            Err(e) => {
                let error = format!("{:#}", e);
                logger
                    .log(
                        ExecutionStep::Pipeline,
                        ExecutionStatus::Critical,
                        None,
                        Some("unexpected error"),
                        Some(&error),
                    )
                    .await;
                Err(e)
            }
        }
    }

    async fn stages(
        &self,
        logger: &ExecutionLogger,
        options: &RunOptions,
        now: NaiveDateTime,
    ) -> Result<(ExecutionStatus, usize)> {
        let today = now.date();
        let bi = &self.config.bi;
        let acquire = AcquireOptions {
            manual: options.meta_file.clone(),
            force: options.force,
            attempts: if bi.enabled { bi.download_attempts } else { 0 },
            retry_wait: Duration::from_secs(bi.retry_wait_seconds),
            data_dir: self.config.data_dir(),
        };
        let Some(sheet_path) = acquire_goal_sheet(self.exporter, &acquire, today, logger).await else {
            logger
                .log(ExecutionStep::Pipeline, ExecutionStatus::Aborted, None, Some("no goal sheet"), None)
                .await;
            return Ok((ExecutionStatus::Aborted, 0));
        };

        let mut images = 0;
        match parse_goal_sheet(&sheet_path) {
            Ok(mut rows) => {
                let contacts = match load_contacts(&self.config.contacts_file()) {
                    Ok(book) => book,
                    Err(e) => {
                        tracing::warn!("INGESTION | contacts not loaded: {:#}", e);
                        ContactBook::default()
                    }
                };
                enrich(&mut rows, &contacts);
                let message = format!("{} rows from {}", rows.len(), sheet_path.display());
                logger
                    .log(ExecutionStep::Processing, ExecutionStatus::Success, Some("parse"), Some(&message), None)
                    .await;

                initialize_reference_data(&self.db, self.config).await?;
                let engine = GamificationEngine::load(self.db.clone(), self.config).await?;
                let daily = engine.process_daily(&rows, today).await?;
                let message = format!("{} sellers, {} bronze", daily.processed, daily.bronze);
                logger
                    .log(ExecutionStep::Processing, ExecutionStatus::Success, Some("daily"), Some(&message), None)
                    .await;

                let rendered = self.rankings(&engine, &rows, now, logger).await?;
                images = rendered.total();
                self.notify(&engine, &rendered, &contacts, options, now, logger).await;
            }
            Err(e) => {
                logger
                    .log(
                        ExecutionStep::Ranking,
                        ExecutionStatus::Fail,
                        Some("parse"),
                        Some(&format!("cannot parse {}", sheet_path.display())),
                        Some(&e.to_string()),
                    )
                    .await;
            }
        }

        let written = export_snapshots(&self.db, &self.config.data_dir()).await;
        logger
            .log(
                ExecutionStep::Snapshot,
                ExecutionStatus::Success,
                None,
                Some(&format!("{} tables exported", written.len())),
                None,
            )
            .await;

        logger
            .log(ExecutionStep::Pipeline, ExecutionStatus::Success, None, Some("pipeline finished"), None)
            .await;
        Ok((ExecutionStatus::Success, images))
    }

    async fn rankings(
        &self,
        engine: &GamificationEngine,
        rows: &[crate::usecases::u601_ingestion::SheetRow],
        now: NaiveDateTime,
        logger: &ExecutionLogger,
    ) -> Result<RankingImages> {
        let band = expected_band(now.hour(), &self.config.business_hours);
        let rankings = RankingService::new(
            self.db.clone(),
            engine.calendar().clone(),
            self.config.commercial_month.clone(),
            self.config.gamification.clone(),
            band,
        );
        let renderer = RankingRenderer::new(self.config, self.snapshotter)?;
        let images = renderer.run(&rankings, engine, rows, now).await;

        match images.first_daily() {
            Some(path) => {
                let message = format!("{} images, daily {}", images.total(), path.display());
                logger
                    .log(ExecutionStep::Ranking, ExecutionStatus::Success, None, Some(&message), None)
                    .await;
            }
            None => {
                logger
                    .log(ExecutionStep::Ranking, ExecutionStatus::Skipped, None, Some("no daily image"), None)
                    .await;
            }
        }
        Ok(images)
    }

    async fn notify(
        &self,
        engine: &GamificationEngine,
        images: &RankingImages,
        contacts: &ContactBook,
        options: &RunOptions,
        now: NaiveDateTime,
        logger: &ExecutionLogger,
    ) {
        let summary = match engine.day_summary(now.date()).await {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!("NOTIFY | day summary failed: {:#}", e);
                Vec::new()
            }
        };
        let notifier = Notifier::new(self.db.clone(), self.config.whatsapp.clone(), self.sender);
        let request = NotifyRequest {
            send_whatsapp: options.send_whatsapp,
            mode: ExecutionMode::detect(now),
            now,
            images,
            summary: &summary,
            contacts,
        };
        match notifier.notify_all(&request).await {
            Ok(report) => {
                let (status, message) = match report.skipped {
                    Some(reason) => (ExecutionStatus::Skipped, reason.to_string()),
                    None => (
                        ExecutionStatus::Success,
                        format!(
                            "daily: {}, individual: {}, special: {}",
                            report.daily.map(|s| s.code()).unwrap_or("-"),
                            report.individual,
                            report.special.map(|k| k.code()).unwrap_or("-")
                        ),
                    ),
                };
                logger.log(ExecutionStep::Notify, status, None, Some(&message), None).await;
            }
            Err(e) => {
                logger
                    .log(
                        ExecutionStep::Notify,
                        ExecutionStatus::Fail,
                        None,
                        Some("notification failed"),
                        Some(&format!("{:#}", e)),
                    )
                    .await;
            }
        }
    }
}

/// Рабочая сборка конвейера: BI, headless Chrome и WhatsApp Web
pub async fn run_pipeline(config: &Config, db: DatabaseConnection, options: RunOptions) -> Result<PipelineOutcome> {
    let exporter = BiExporter::new(config.bi.clone(), config.webdriver.clone(), config.downloads_dir());
    let snapshotter = WebDriverSnapshotter::new(&config.webdriver, &config.ranking);
    let whatsapp = WhatsAppWebSender::new(
        config.whatsapp.clone(),
        config.webdriver.clone(),
        config.resolve(&config.whatsapp.profile_dir),
    );
    let sender: &dyn MessageSender = if config.whatsapp.enabled && options.send_whatsapp {
        &whatsapp
    } else {
        &DryRunSender
    };
    let pipeline = Pipeline::new(config, db, &exporter, &snapshotter, sender);
    pipeline.execute(&options, Local::now().naive_local()).await
}
