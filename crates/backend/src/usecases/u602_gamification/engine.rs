use anyhow::Result;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use contracts::enums::TrophyKind;
use contracts::usecases::u603_rankings::MedalCounts;
use sea_orm::DatabaseConnection;

use crate::domain::{a101_seller, a102_daily_result, a103_trophy, a104_weekly_goal, a105_weekly_result, a106_holiday};
use crate::shared::calendar::{
    self, commercial_cycle, commercial_cycle_end, is_monthly_closing_day, HolidayCalendar,
};
use crate::shared::config::{CommercialMonthConfig, Config};
use crate::shared::text::title_case;
use crate::usecases::u601_ingestion::SheetRow;

/// Итог дня по продавцу для индивидуальных поздравлений
#[derive(Debug, Clone, PartialEq)]
pub struct SellerDaySummary {
    pub name: String,
    pub day_sales: f64,
    pub day_attainment: f64,
    pub trophies: Vec<TrophyKind>,
    pub points_gained: i64,
    /// С 1-го числа календарного месяца
    pub points_month: i64,
    pub medals_month: MedalCounts,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DailyOutcome {
    pub processed: usize,
    pub bronze: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeeklyOutcome {
    pub results: usize,
    pub silver: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecalcSummary {
    pub days: usize,
    pub trophies_deleted: u64,
    pub weekly_results_deleted: u64,
    pub bronze: usize,
    pub silver: usize,
    pub monthly: usize,
}

/// Движок начисления трофеев лиги
pub struct GamificationEngine {
    db: DatabaseConnection,
    calendar: HolidayCalendar,
    month: CommercialMonthConfig,
}

fn store_opt(store: Option<&str>) -> Option<&str> {
    store.map(str::trim).filter(|s| !s.is_empty())
}

impl GamificationEngine {
    pub fn new(db: DatabaseConnection, calendar: HolidayCalendar, month: CommercialMonthConfig) -> Self {
        Self { db, calendar, month }
    }

    /// Календарь из таблицы праздников и `custom_holidays`
    pub async fn load(db: DatabaseConnection, config: &Config) -> Result<Self> {
        let calendar =
            a106_holiday::service::load_calendar(&db, &config.gamification.custom_holiday_dates())
                .await?;
        Ok(Self::new(db, calendar, config.commercial_month.clone()))
    }

    pub fn calendar(&self) -> &HolidayCalendar {
        &self.calendar
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub async fn process_daily(&self, rows: &[SheetRow], date: NaiveDate) -> Result<DailyOutcome> {
        tracing::info!("GAMIFICATION | daily processing for {} ({} rows)", date, rows.len());
        let mut outcome = DailyOutcome::default();
        for row in rows {
            let name = title_case(row.name.trim());
            if name.is_empty() {
                continue;
            }
            let attainment = if row.goal > 0.0 {
                row.sales / row.goal * 100.0
            } else {
                0.0
            };
            let store = store_opt(row.store.as_deref());

            a101_seller::repository::upsert(&self.db, &name, store, row.role).await?;
            a102_daily_result::repository::record(&self.db, &name, date, row.goal, row.sales, attainment)
                .await?;
            self.ensure_weekly_goal(&name, store, row.goal, date).await?;

            if attainment >= TrophyKind::Bronze.threshold_pct() {
                let reason = format!("Meta Diária Batida: {:.1}%", attainment);
                a103_trophy::repository::award(&self.db, &name, date, TrophyKind::Bronze, &reason).await?;
                outcome.bronze += 1;
            }
            outcome.processed += 1;
        }
        Ok(outcome)
    }

    /// Цель недели фиксируется при первом появлении продавца на неделе.
    /// Возвращает true, если цель записана сейчас.
    pub async fn ensure_weekly_goal(
        &self,
        name: &str,
        store: Option<&str>,
        daily_goal: f64,
        date: NaiveDate,
    ) -> Result<bool> {
        let monday = calendar::monday_of(date);
        let saturday = calendar::saturday_of(date);
        let week_id = calendar::week_id(date);
        if a104_weekly_goal::repository::get(&self.db, name, &week_id).await?.is_some() {
            return Ok(false);
        }
        let business_days = self.calendar.business_days(monday, saturday, store);
        let goal = daily_goal * business_days;
        let inserted = a104_weekly_goal::repository::record_if_absent(
            &self.db, name, &week_id, monday, saturday, goal,
        )
        .await?;
        if inserted {
            tracing::info!(
                "GAMIFICATION | weekly goal for {} in {}: {:.2} ({} business days)",
                name,
                week_id,
                goal,
                business_days
            );
        }
        Ok(inserted)
    }

    pub async fn process_weekly(&self, date: NaiveDate) -> Result<WeeklyOutcome> {
        let (monday, _) = calendar::week_range(date);
        let saturday = calendar::saturday_of(date);
        let week_id = calendar::week_id(date);
        let is_friday = date.weekday() == Weekday::Fri;
        let mut outcome = WeeklyOutcome::default();

        for seller in a101_seller::repository::list_active(&self.db).await? {
            let Some(sales) =
                a102_daily_result::repository::sales_sum(&self.db, &seller.name, monday, date).await?
            else {
                continue;
            };
            let goal = a104_weekly_goal::repository::get(&self.db, &seller.name, &week_id)
                .await?
                .map(|g| g.goal_value)
                .filter(|g| *g > 0.0);
            let Some(goal) = goal else {
                tracing::warn!("GAMIFICATION | no weekly goal for {} in {}", seller.name, week_id);
                continue;
            };

            let attainment = sales / goal * 100.0;
            if is_friday && attainment >= TrophyKind::Silver.threshold_pct() {
                let reason = format!("Meta Semanal Batida: {:.1}%", attainment);
                a103_trophy::repository::award(&self.db, &seller.name, date, TrophyKind::Silver, &reason)
                    .await?;
                outcome.silver += 1;
            }
            a105_weekly_result::repository::record(
                &self.db,
                &seller.name,
                &week_id,
                sales,
                goal,
                attainment,
                saturday,
            )
            .await?;
            outcome.results += 1;
        }
        tracing::info!(
            "GAMIFICATION | weekly processing {}: {} results, {} silver",
            date,
            outcome.results,
            outcome.silver
        );
        Ok(outcome)
    }

    /// Месячные трофеи только в день закрытия коммерческого месяца.
    /// Возвращает количество выданных трофеев.
    pub async fn process_monthly(&self, date: NaiveDate) -> Result<usize> {
        if !is_monthly_closing_day(date, &self.month) {
            tracing::warn!("GAMIFICATION | {} is not a monthly closing day, skipping", date);
            return Ok(0);
        }
        let (start, _) = commercial_cycle(date, &self.month);
        let end = commercial_cycle_end(date, &self.month);
        let mut awarded = 0;

        for seller in a101_seller::repository::list_active(&self.db).await? {
            let sales = a102_daily_result::repository::sales_sum(&self.db, &seller.name, start, date)
                .await?
                .unwrap_or(0.0);
            let max_goal = a102_daily_result::repository::max_goal(&self.db, &seller.name, start, date)
                .await?
                .unwrap_or(0.0);
            if sales <= 0.0 || max_goal <= 0.0 {
                continue;
            }
            let store = store_opt(seller.store.as_deref());
            let total = max_goal * self.calendar.business_days(start, end, store);
            let proportional = self.calendar.proportional_goal(total, start, date, end, store);
            if proportional <= 0.0 {
                continue;
            }
            let attainment = sales / proportional * 100.0;

            for kind in TrophyKind::monthly() {
                if attainment < kind.threshold_pct() {
                    continue;
                }
                let reason = match kind {
                    TrophyKind::Gold => format!("Meta Mensal Batida: {:.1}%", attainment),
                    TrophyKind::Bonus1 => format!("Superação Mensal 105%: {:.1}%", attainment),
                    _ => format!("Superação Mensal 110%: {:.1}%", attainment),
                };
                a103_trophy::repository::award(&self.db, &seller.name, date, kind, &reason).await?;
                awarded += 1;
            }
        }
        tracing::info!("GAMIFICATION | monthly processing {}: {} trophies", date, awarded);
        Ok(awarded)
    }

    /// Кто что получил за день
    pub async fn day_summary(&self, date: NaiveDate) -> Result<Vec<SellerDaySummary>> {
        let month_start = date.with_day(1).unwrap_or(date);
        let mut out = Vec::new();
        for result in a102_daily_result::repository::results_on(&self.db, date).await? {
            let trophies = a103_trophy::repository::on_date(&self.db, &result.seller_name, date).await?;
            if trophies.is_empty() {
                continue;
            }
            let points_gained = trophies.iter().map(|k| k.points() as i64).sum();
            let points_month = a103_trophy::repository::points_between(
                &self.db,
                &result.seller_name,
                month_start,
                date,
            )
            .await?;
            let medals_month = a103_trophy::repository::counts_between(
                &self.db,
                &result.seller_name,
                month_start,
                date,
            )
            .await?
            .medals();
            out.push(SellerDaySummary {
                name: result.seller_name,
                day_sales: result.sales,
                day_attainment: result.attainment,
                trophies,
                points_gained,
                points_month,
                medals_month,
            });
        }
        Ok(out)
    }

    /// Удаляет трофеи и недельные итоги с даты `from` и заново проигрывает начисление
    pub async fn recalc(&self, from: NaiveDate, to: NaiveDate) -> Result<RecalcSummary> {
        let mut summary = RecalcSummary {
            trophies_deleted: a103_trophy::repository::delete_from(&self.db, from).await?,
            weekly_results_deleted: a105_weekly_result::repository::delete_from(&self.db, from).await?,
            ..Default::default()
        };
        tracing::info!(
            "RECALC | removed {} trophies and {} weekly results since {}",
            summary.trophies_deleted,
            summary.weekly_results_deleted,
            from
        );

        let mut date = from;
        while date <= to {
            for result in a102_daily_result::repository::results_on(&self.db, date).await? {
                if result.attainment >= TrophyKind::Bronze.threshold_pct() {
                    let reason = format!("Meta Diária Batida (Recalc): {:.1}%", result.attainment);
                    a103_trophy::repository::award(
                        &self.db,
                        &result.seller_name,
                        date,
                        TrophyKind::Bronze,
                        &reason,
                    )
                    .await?;
                    summary.bronze += 1;
                }
                let store = a101_seller::repository::find(&self.db, &result.seller_name)
                    .await?
                    .and_then(|s| s.store);
                self.ensure_weekly_goal(&result.seller_name, store_opt(store.as_deref()), result.goal, date)
                    .await?;
            }
            summary.silver += self.process_weekly(date).await?.silver;
            if is_monthly_closing_day(date, &self.month) {
                summary.monthly += self.process_monthly(date).await?;
            }
            summary.days += 1;
            date += Duration::days(1);
        }
        tracing::info!("RECALC | finished: {:?}", summary);
        Ok(summary)
    }

    pub async fn dedupe(&self) -> Result<u64> {
        let removed = a103_trophy::repository::dedupe_periodic(&self.db).await?;
        tracing::info!("DEDUPE | removed {} duplicate periodic trophies", removed);
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::test_connection;
    use contracts::enums::SellerRole;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn row(name: &str, goal: f64, sales: f64) -> SheetRow {
        SheetRow {
            name: name.into(),
            goal,
            sales,
            attainment: sales / goal * 100.0,
            store: Some("7".into()),
            role: SellerRole::Seller,
        }
    }

    fn engine(db: DatabaseConnection) -> GamificationEngine {
        GamificationEngine::new(db, HolidayCalendar::default(), CommercialMonthConfig::default())
    }

    #[tokio::test]
    async fn test_daily_awards_bronze_once() {
        let (_dir, db) = test_connection().await;
        let engine = engine(db.clone());
        let rows = vec![row("  ana souza ", 100.0, 120.0), row("Bruno", 100.0, 80.0)];
        let first = engine.process_daily(&rows, d(2025, 1, 13)).await.unwrap();
        engine.process_daily(&rows, d(2025, 1, 13)).await.unwrap();
        assert_eq!(first, DailyOutcome { processed: 2, bronze: 1 });

        let trophies = a103_trophy::repository::list_all(&db).await.unwrap();
        assert_eq!(trophies.len(), 1);
        assert_eq!(trophies[0].seller_name, "Ana Souza");
        assert_eq!(trophies[0].reason.as_deref(), Some("Meta Diária Batida: 120.0%"));

        let goal = a104_weekly_goal::repository::get(&db, "Ana Souza", "2025_W3")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(goal.goal_value, 550.0);
        assert_eq!(goal.date_to, "2025-01-18");
    }

    #[tokio::test]
    async fn test_weekly_goal_is_not_overwritten() {
        let (_dir, db) = test_connection().await;
        let engine = engine(db.clone());
        engine.process_daily(&[row("Ana", 100.0, 10.0)], d(2025, 1, 13)).await.unwrap();
        engine.process_daily(&[row("Ana", 300.0, 10.0)], d(2025, 1, 14)).await.unwrap();
        let goal = a104_weekly_goal::repository::get(&db, "Ana", "2025_W3")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(goal.goal_value, 550.0);
    }

    #[tokio::test]
    async fn test_friday_silver_is_idempotent() {
        let (_dir, db) = test_connection().await;
        let engine = engine(db.clone());
        for day in 13..=17 {
            engine.process_daily(&[row("Ana", 100.0, 120.0)], d(2025, 1, day)).await.unwrap();
        }
        // в четверг записывается текущий итог без серебра
        let thursday = engine.process_weekly(d(2025, 1, 16)).await.unwrap();
        assert_eq!(thursday.silver, 0);
        for _ in 0..3 {
            engine.process_weekly(d(2025, 1, 17)).await.unwrap();
        }
        let silvers: Vec<_> = a103_trophy::repository::list_all(&db)
            .await
            .unwrap()
            .into_iter()
            .filter(|t| t.kind() == Some(TrophyKind::Silver))
            .collect();
        assert_eq!(silvers.len(), 1);

        let result = a105_weekly_result::repository::get(&db, "Ana", "2025_W3")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(result.sales_total, 600.0);
        assert_eq!(result.closing_date, "2025-01-18");
    }

    #[tokio::test]
    async fn test_monthly_tiers_on_closing_day() {
        let (_dir, db) = test_connection().await;
        let engine = engine(db.clone());
        a101_seller::repository::upsert(&db, "Ana", None, SellerRole::Seller).await.unwrap();
        // в цикле 2025-02-26..2025-03-25 22 рабочих дня, общая цель 2200
        a102_daily_result::repository::record(&db, "Ana", d(2025, 3, 25), 100.0, 2320.0, 2320.0)
            .await
            .unwrap();

        assert_eq!(engine.process_monthly(d(2025, 3, 24)).await.unwrap(), 0);
        assert_eq!(engine.process_monthly(d(2025, 3, 25)).await.unwrap(), 2);
        assert_eq!(engine.process_monthly(d(2025, 3, 25)).await.unwrap(), 2);

        let kinds = a103_trophy::repository::on_date(&db, "Ana", d(2025, 3, 25)).await.unwrap();
        assert_eq!(kinds, vec![TrophyKind::Gold, TrophyKind::Bonus1]);
    }

    #[tokio::test]
    async fn test_day_summary() {
        let (_dir, db) = test_connection().await;
        let engine = engine(db.clone());
        // в неделе 2024-12-30..2025-01-04 5 рабочих дней (31 декабря считается за половину)
        engine.process_daily(&[row("Ana", 100.0, 300.0)], d(2025, 1, 2)).await.unwrap();
        engine
            .process_daily(&[row("Ana", 100.0, 250.0), row("Bruno", 100.0, 50.0)], d(2025, 1, 3))
            .await
            .unwrap();
        engine.process_weekly(d(2025, 1, 3)).await.unwrap();

        let summary = engine.day_summary(d(2025, 1, 3)).await.unwrap();
        assert_eq!(summary.len(), 1);
        let ana = &summary[0];
        assert_eq!(ana.name, "Ana");
        assert_eq!(ana.trophies, vec![TrophyKind::Bronze, TrophyKind::Silver]);
        assert_eq!(ana.points_gained, 4);
        assert_eq!(ana.points_month, 5);
        assert_eq!(ana.medals_month.bronze, 2);
        assert_eq!(ana.day_sales, 250.0);
    }

    #[tokio::test]
    async fn test_recalc_replays_from_stored_results() {
        let (_dir, db) = test_connection().await;
        let engine = engine(db.clone());
        for day in 13..=17 {
            engine.process_daily(&[row("Ana", 100.0, 120.0)], d(2025, 1, day)).await.unwrap();
        }
        engine.process_weekly(d(2025, 1, 17)).await.unwrap();

        let summary = engine.recalc(d(2025, 1, 15), d(2025, 1, 17)).await.unwrap();
        assert_eq!(summary.days, 3);
        assert_eq!(summary.trophies_deleted, 4);
        assert_eq!(summary.bronze, 3);
        assert_eq!(summary.silver, 1);

        let trophies = a103_trophy::repository::list_all(&db).await.unwrap();
        assert_eq!(trophies.len(), 6);
        assert!(trophies
            .iter()
            .filter(|t| t.awarded_on.as_str() >= "2025-01-15" && t.kind() == Some(TrophyKind::Bronze))
            .all(|t| t.reason.as_deref().unwrap_or("").contains("(Recalc)")));
    }
}
