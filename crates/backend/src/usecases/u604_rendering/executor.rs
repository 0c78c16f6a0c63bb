//! Рендеринг всех рейтингов в PNG и промежуточная обработка недели и месяца.

use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use contracts::enums::RankingKind;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::PathBuf;

use super::assets::{image_to_data_uri, logo_for};
use super::paging::{image_base, page_count, page_file_names, pages, remove_stale_pages};
use super::snapshot::{Snapshotter, Viewport};
use super::templates::TemplateRenderer;
use crate::shared::calendar::{commercial_cycle, commercial_cycle_end, is_monthly_closing_day, saturday_of, week_range};
use crate::shared::config::{CommercialMonthConfig, Config, RankingConfig};
use crate::shared::format::format_percent;
use crate::usecases::u601_ingestion::SheetRow;
use crate::usecases::u602_gamification::GamificationEngine;
use crate::usecases::u603_rankings::RankingService;

/// Изображения, созданные за запуск, по видам рейтинга
#[derive(Debug, Clone, Default)]
pub struct RankingImages {
    by_kind: HashMap<RankingKind, Vec<PathBuf>>,
}

impl RankingImages {
    pub fn get(&self, kind: RankingKind) -> &[PathBuf] {
        self.by_kind.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn insert(&mut self, kind: RankingKind, images: Vec<PathBuf>) {
        self.by_kind.insert(kind, images);
    }

    pub fn first_daily(&self) -> Option<&PathBuf> {
        self.get(RankingKind::Daily).first()
    }

    pub fn total(&self) -> usize {
        self.by_kind.values().map(Vec::len).sum()
    }
}

pub struct RankingRenderer<'a> {
    templates: TemplateRenderer,
    snapshotter: &'a dyn Snapshotter,
    ranking: RankingConfig,
    month: CommercialMonthConfig,
    company_name: String,
    producer_signature: String,
    campaign_start: String,
    logo_data_uri: Option<String>,
    output_dir: PathBuf,
}

fn merge(base: &mut Value, extra: Value) {
    if let (Some(target), Value::Object(extra)) = (base.as_object_mut(), extra) {
        target.extend(extra);
    }
}

fn format_days(days: f64) -> String {
    if days.fract() == 0.0 {
        format!("{}", days as i64)
    } else {
        format!("{:.1}", days)
    }
}

impl<'a> RankingRenderer<'a> {
    pub fn new(config: &Config, snapshotter: &'a dyn Snapshotter) -> Result<Self> {
        let logo_data_uri = logo_for(config).and_then(|p| image_to_data_uri(&p));
        if logo_data_uri.is_none() {
            tracing::info!("RANKING | no company logo found, cards render without it");
        }
        Ok(Self {
            templates: TemplateRenderer::new()?,
            snapshotter,
            ranking: config.ranking.clone(),
            month: config.commercial_month.clone(),
            company_name: config.gamification.company_name.clone(),
            producer_signature: config.gamification.producer_signature.clone(),
            campaign_start: config.gamification.campaign_start.clone(),
            logo_data_uri,
            output_dir: config.output_dir(),
        })
    }

    pub fn viewport(&self, kind: RankingKind) -> Viewport {
        match kind {
            RankingKind::Daily | RankingKind::Weekly => {
                Viewport::new(self.ranking.viewport_width, self.ranking.viewport_height)
            }
            RankingKind::Monthly | RankingKind::Points => Viewport::new(self.ranking.viewport_width, 1920),
        }
    }

    fn page_size(&self, kind: RankingKind) -> usize {
        match kind {
            RankingKind::Daily => self.ranking.daily_page_size,
            RankingKind::Weekly | RankingKind::Monthly => self.ranking.periodic_page_size,
            RankingKind::Points => self.ranking.points_page_size,
        }
    }

    pub fn base_name(&self, kind: RankingKind) -> String {
        image_base(self.ranking.image_file(kind))
    }

    /// Рендерит страницы одного рейтинга; `extra` добавляется в контекст каждой страницы
    pub async fn render_kind<T: Serialize + Sync>(
        &self,
        kind: RankingKind,
        rows: &[T],
        subtitle: &str,
        extra: Value,
        now: NaiveDateTime,
    ) -> Result<Vec<PathBuf>> {
        let at_least_one = kind == RankingKind::Points;
        let page_size = self.page_size(kind);
        let base = self.base_name(kind);
        let removed = remove_stale_pages(&self.output_dir, &base);
        if removed > 0 {
            tracing::debug!("RANKING | removed {} old {} image(s)", removed, kind.code());
        }
        let total_pages = page_count(rows.len(), page_size, at_least_one);
        if total_pages == 0 {
            tracing::info!("RANKING | {} ranking has no rows, no image", kind.code());
            return Ok(Vec::new());
        }
        let chunks = pages(rows, page_size, at_least_one);
        let names = page_file_names(&base, total_pages, kind.always_paged());
        let viewport = self.viewport(kind);

        let mut images = Vec::with_capacity(total_pages);
        for (idx, (chunk, name)) in chunks.into_iter().zip(names).enumerate() {
            let mut context = json!({
                "title": kind.title(),
                "subtitle": subtitle,
                "ranking": chunk,
                "page": idx + 1,
                "total_pages": total_pages,
                "show_paging": total_pages > 1,
                "viewport_width": viewport.width,
                "viewport_height": viewport.height,
                "company_name": self.company_name,
                "producer_signature": self.producer_signature,
                "logo_data_uri": self.logo_data_uri,
                "generated_at": now.format("%d/%m/%Y %H:%M").to_string(),
            });
            merge(&mut context, extra.clone());
            let html = self.templates.render(kind.template_name(), &context)?;
            let target = self.output_dir.join(&name);
            images.push(self.snapshotter.snapshot(&html, &target, viewport).await?);
        }
        Ok(images)
    }

    async fn render_points(&self, rankings: &RankingService, now: NaiveDateTime) -> Result<Vec<PathBuf>> {
        let rows = rankings.points(now.date()).await?;
        let since = NaiveDate::parse_from_str(&self.campaign_start, "%Y-%m-%d")
            .map(|d| d.format("%d/%m/%Y").to_string())
            .unwrap_or_else(|_| self.campaign_start.clone());
        let subtitle = format!("Pontuação acumulada desde {}", since);
        self.render_kind(RankingKind::Points, &rows, &subtitle, json!({}), now)
            .await
    }

    async fn render_daily(
        &self,
        rankings: &RankingService,
        sheet: &[SheetRow],
        now: NaiveDateTime,
    ) -> Result<Vec<PathBuf>> {
        let rows = rankings.daily(sheet);
        let subtitle = format!(
            "Performance Individual | {} às {}h",
            now.format("%d/%m/%Y"),
            now.format("%H:%M")
        );
        let extra = json!({
            "hero_cards": RankingService::hero_cards(&rows),
            "expected_band": format_percent(rankings.band()),
        });
        self.render_kind(RankingKind::Daily, &rows, &subtitle, extra, now)
            .await
    }

    async fn render_weekly(&self, rankings: &RankingService, now: NaiveDateTime) -> Result<Vec<PathBuf>> {
        let date = now.date();
        let weekly = rankings.weekly(date).await?;
        let (monday, _) = week_range(date);
        let subtitle = format!(
            "Semana {} a {} | atualizado às {}h",
            monday.format("%d/%m"),
            saturday_of(date).format("%d/%m"),
            now.format("%H:%M")
        );
        let extra = json!({
            "business_days": format_days(weekly.business_days),
            "participants": weekly.rows.len(),
        });
        self.render_kind(RankingKind::Weekly, &weekly.rows, &subtitle, extra, now)
            .await
    }

    async fn render_monthly(&self, rankings: &RankingService, now: NaiveDateTime) -> Result<Vec<PathBuf>> {
        let date = now.date();
        let rows = rankings.monthly(date).await?;
        let (start, _) = commercial_cycle(date, &self.month);
        let end = commercial_cycle_end(date, &self.month);
        let cycle_label = format!("{} a {}", start.format("%d/%m"), end.format("%d/%m"));
        let subtitle = format!(
            "Ciclo {} a {} | atualizado às {}h",
            start.format("%d/%m/%Y"),
            end.format("%d/%m/%Y"),
            now.format("%H:%M")
        );
        let extra = json!({
            "cycle_label": cycle_label,
            "participants": rows.len(),
        });
        self.render_kind(RankingKind::Monthly, &rows, &subtitle, extra, now)
            .await
    }

    fn keep(kind: RankingKind, outcome: Result<Vec<PathBuf>>) -> Vec<PathBuf> {
        match outcome {
            Ok(images) => {
                tracing::info!("RANKING | {} ranking: {} image(s)", kind.code(), images.len());
                images
            }
            Err(e) => {
                tracing::error!("RANKING | {} ranking failed: {:#}", kind.code(), e);
                Vec::new()
            }
        }
    }

    async fn weekly_processing(engine: &GamificationEngine, date: NaiveDate) {
        match engine.process_weekly(date).await {
            Ok(outcome) => tracing::info!(
                "GAMIFICATION | weekly processing: {} results, {} silver",
                outcome.results,
                outcome.silver
            ),
            Err(e) => tracing::error!("GAMIFICATION | weekly processing failed: {:#}", e),
        }
    }

    /// Рендерит рейтинги и по ходу закрывает неделю и коммерческий месяц.
    /// Ошибка одного рейтинга не останавливает остальные.
    pub async fn run(
        &self,
        rankings: &RankingService,
        engine: &GamificationEngine,
        sheet: &[SheetRow],
        now: NaiveDateTime,
    ) -> RankingImages {
        let date = now.date();
        let mut images = RankingImages::default();

        let points = Self::keep(RankingKind::Points, self.render_points(rankings, now).await);
        images.insert(RankingKind::Points, points);

        let daily = Self::keep(RankingKind::Daily, self.render_daily(rankings, sheet, now).await);
        images.insert(RankingKind::Daily, daily);

        let weekly = Self::keep(RankingKind::Weekly, self.render_weekly(rankings, now).await);
        images.insert(RankingKind::Weekly, weekly);

        Self::weekly_processing(engine, date).await;

        let monthly = Self::keep(RankingKind::Monthly, self.render_monthly(rankings, now).await);
        images.insert(RankingKind::Monthly, monthly);

        Self::weekly_processing(engine, date).await;
        if is_monthly_closing_day(date, &self.month) {
            match engine.process_monthly(date).await {
                Ok(awarded) => tracing::info!("GAMIFICATION | monthly processing: {} trophies", awarded),
                Err(e) => tracing::error!("GAMIFICATION | monthly processing failed: {:#}", e),
            }
        }

        images
    }
}
