use anyhow::Result;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use contracts::enums::SellerRole;
use contracts::usecases::u603_rankings::{
    DailyRankingRow, HeroCard, MedalCounts, MonthlyRankingRow, PointsRankingRow, WeeklyRankingRow,
};
use sea_orm::DatabaseConnection;
use std::collections::HashMap;

use super::styles::row_style;
use crate::domain::{a101_seller, a102_daily_result, a103_trophy, a104_weekly_goal, a105_weekly_result, a109_ranking_badge};
use crate::shared::calendar::{self, commercial_cycle, commercial_cycle_end, HolidayCalendar};
use crate::shared::config::{CommercialMonthConfig, GamificationConfig};
use crate::shared::format::{format_currency, format_percent};
use crate::usecases::u601_ingestion::SheetRow;

/// Недельный рейтинг и число рабочих дней недели для шапки
#[derive(Debug, Clone)]
pub struct WeeklyRanking {
    pub rows: Vec<WeeklyRankingRow>,
    pub business_days: f64,
}

/// Строит строки рейтингов из выгрузки и из базы лиги
pub struct RankingService {
    db: DatabaseConnection,
    calendar: HolidayCalendar,
    month: CommercialMonthConfig,
    gamification: GamificationConfig,
    /// Ожидаемое выполнение к текущему часу
    band: f64,
}

fn attainment_of(sales: f64, goal: f64) -> f64 {
    if goal > 0.0 {
        sales / goal * 100.0
    } else {
        0.0
    }
}

impl RankingService {
    pub fn new(
        db: DatabaseConnection,
        calendar: HolidayCalendar,
        month: CommercialMonthConfig,
        gamification: GamificationConfig,
        band: f64,
    ) -> Self {
        Self {
            db,
            calendar,
            month,
            gamification,
            band,
        }
    }

    pub fn band(&self) -> f64 {
        self.band
    }

    fn visible(&self, store: Option<&str>) -> bool {
        !store.map(|s| self.gamification.is_ignored_store(s)).unwrap_or(false)
    }

    /// Дневной рейтинг: без менеджеров и игнорируемых магазинов
    pub fn daily(&self, rows: &[SheetRow]) -> Vec<DailyRankingRow> {
        rows.iter()
            .filter(|r| r.role != SellerRole::Manager && self.visible(r.store.as_deref()))
            .enumerate()
            .map(|(idx, r)| DailyRankingRow {
                rank: idx + 1,
                name: r.name.clone(),
                store: r.store.clone().unwrap_or_default(),
                goal: r.goal,
                sales: r.sales,
                attainment: r.attainment,
                attainment_label: format_percent(r.attainment),
                goal_label: format_currency(r.goal),
                sales_label: format_currency(r.sales),
                style: row_style(r.attainment, self.band),
            })
            .collect()
    }

    pub fn hero_cards(rows: &[DailyRankingRow]) -> Vec<HeroCard> {
        let total_sales: f64 = rows.iter().map(|r| r.sales).sum();
        let total_goal: f64 = rows.iter().map(|r| r.goal).sum();
        vec![
            HeroCard {
                label: "Qtd. Vendedores".into(),
                value: rows.len().to_string(),
            },
            HeroCard {
                label: "Venda Total".into(),
                value: format_currency(total_sales),
            },
            HeroCard {
                label: "Alcance Médio".into(),
                value: format_percent(attainment_of(total_sales, total_goal)),
            },
        ]
    }

    pub async fn weekly(&self, date: NaiveDate) -> Result<WeeklyRanking> {
        let (monday, _) = calendar::week_range(date);
        let saturday = calendar::saturday_of(date);
        let week_id = calendar::week_id(date);
        let is_saturday = date.weekday() == Weekday::Sat;
        let days: Vec<NaiveDate> = (0..6).map(|i| monday + Duration::days(i)).collect();

        let mut rows = Vec::new();
        for agg in a102_daily_result::repository::aggregate_between(&self.db, monday, date).await? {
            if !self.visible(agg.store.as_deref()) {
                continue;
            }
            let store = agg.store.as_deref().filter(|s| !s.trim().is_empty());

            let closed = if is_saturday {
                a105_weekly_result::repository::get(&self.db, &agg.seller_name, &week_id).await?
            } else {
                None
            };
            let (sales, goal, attainment) = match closed {
                Some(r) => (r.sales_total, r.goal_total, r.attainment),
                None => {
                    let goal = match a104_weekly_goal::repository::get(&self.db, &agg.seller_name, &week_id)
                        .await?
                    {
                        Some(g) => g.goal_value,
                        None if agg.max_goal > 0.0 => {
                            agg.max_goal * self.calendar.business_days(monday, saturday, store)
                        }
                        None => 0.0,
                    };
                    (agg.sales, goal, attainment_of(agg.sales, goal))
                }
            };

            let daily: HashMap<String, f64> =
                a102_daily_result::repository::results_between(&self.db, &agg.seller_name, monday, date)
                    .await?
                    .into_iter()
                    .map(|r| (r.date, r.attainment))
                    .collect();
            let mut goals_hit = 0.0;
            let week_status: Vec<Option<bool>> = days
                .iter()
                .map(|d| {
                    if *d > date {
                        return None;
                    }
                    let hit = daily
                        .get(&d.to_string())
                        .map(|a| *a >= 100.0)
                        .unwrap_or(false);
                    if hit {
                        goals_hit += if d.weekday() == Weekday::Sat {
                            0.5
                        } else {
                            self.calendar.day_weight(*d, None)
                        };
                    }
                    Some(hit)
                })
                .collect();

            rows.push(WeeklyRankingRow {
                rank: 0,
                name: agg.seller_name.clone(),
                store: agg.store.clone().unwrap_or_default(),
                sales,
                goal,
                attainment,
                attainment_label: format_percent(attainment),
                goal_label: format_currency(goal),
                sales_label: format_currency(sales),
                style: row_style(attainment, self.band),
                week_status,
                goals_hit,
                goals_hit_label: format!("{:.1}", goals_hit),
            });
        }

        rows.sort_by(|a, b| {
            b.goals_hit
                .total_cmp(&a.goals_hit)
                .then(b.attainment.total_cmp(&a.attainment))
        });
        for (idx, row) in rows.iter_mut().enumerate() {
            row.rank = idx + 1;
        }
        tracing::info!("RANKING | weekly ranking for {}: {} rows", week_id, rows.len());

        Ok(WeeklyRanking {
            rows,
            business_days: self.calendar.business_days(monday, saturday, None),
        })
    }

    /// Рейтинг коммерческого месяца относительно полной цели цикла
    pub async fn monthly(&self, date: NaiveDate) -> Result<Vec<MonthlyRankingRow>> {
        let (start, _) = commercial_cycle(date, &self.month);
        let end = commercial_cycle_end(date, &self.month);

        let mut rows: Vec<MonthlyRankingRow> =
            a102_daily_result::repository::aggregate_between(&self.db, start, date)
                .await?
                .into_iter()
                .filter(|agg| self.visible(agg.store.as_deref()))
                .map(|agg| {
                    let store = agg.store.as_deref().filter(|s| !s.trim().is_empty());
                    let goal = agg.max_goal * self.calendar.business_days(start, end, store);
                    let attainment = attainment_of(agg.sales, goal);
                    MonthlyRankingRow {
                        rank: 0,
                        name: agg.seller_name.clone(),
                        store: agg.store.clone().unwrap_or_default(),
                        sales: agg.sales,
                        goal,
                        attainment,
                        attainment_label: format_percent(attainment),
                        goal_label: format_currency(goal),
                        sales_label: format_currency(agg.sales),
                        style: row_style(attainment, self.band),
                    }
                })
                .collect();

        rows.sort_by(|a, b| b.attainment.total_cmp(&a.attainment));
        for (idx, row) in rows.iter_mut().enumerate() {
            row.rank = idx + 1;
        }
        Ok(rows)
    }

    /// Очки с начала кампании
    pub async fn points(&self, date: NaiveDate) -> Result<Vec<PointsRankingRow>> {
        let campaign_start = self.gamification.campaign_start_date()?;
        let stores: HashMap<String, Option<String>> = a101_seller::repository::list_all(&self.db)
            .await?
            .into_iter()
            .map(|s| (s.name, s.store))
            .collect();
        let rules = a109_ranking_badge::repository::active_rules(&self.db).await?;

        let rows = a103_trophy::repository::points_leaderboard(&self.db, campaign_start, date)
            .await?
            .into_iter()
            .filter(|r| {
                self.visible(stores.get(&r.seller_name).and_then(|s| s.as_deref()))
            })
            .enumerate()
            .map(|(idx, r)| PointsRankingRow {
                rank: idx + 1,
                badge_icon: a109_ranking_badge::repository::badge_for(&rules, idx + 1),
                name: r.seller_name,
                points: r.points,
                medals: MedalCounts {
                    bronze: r.bronze,
                    silver: r.silver,
                    gold: r.gold,
                    bonus: r.bonus_1 + r.bonus_2,
                },
            })
            .collect();
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::test_connection;
    use crate::usecases::u602_gamification::GamificationEngine;
    use contracts::enums::TrophyKind;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn sheet(name: &str, goal: f64, sales: f64, store: &str, role: SellerRole) -> SheetRow {
        SheetRow {
            name: name.into(),
            goal,
            sales,
            attainment: sales / goal * 100.0,
            store: Some(store.into()),
            role,
        }
    }

    fn service(db: DatabaseConnection) -> RankingService {
        RankingService::new(
            db,
            HolidayCalendar::default(),
            CommercialMonthConfig::default(),
            GamificationConfig::default(),
            50.0,
        )
    }

    #[tokio::test]
    async fn test_daily_skips_managers_and_ignored_stores() {
        let (_dir, db) = test_connection().await;
        let svc = service(db);
        let rows = vec![
            sheet("Ana", 100.0, 150.0, "1", SellerRole::Seller),
            sheet("Gerente", 100.0, 140.0, "1", SellerRole::Manager),
            sheet("Bruno", 100.0, 120.0, "18", SellerRole::Seller),
            sheet("Carla", 200.0, 100.0, "2", SellerRole::Seller),
        ];
        let ranked = svc.daily(&rows);
        let names: Vec<(usize, &str)> = ranked.iter().map(|r| (r.rank, r.name.as_str())).collect();
        assert_eq!(names, vec![(1, "Ana"), (2, "Carla")]);
        assert_eq!(ranked[0].style.badge_label, "META BATIDA!");
        assert_eq!(ranked[1].style.badge_label, "DE ACORDO");

        let cards = RankingService::hero_cards(&ranked);
        assert_eq!(cards[0].value, "2");
        assert_eq!(cards[1].value, "R$ 250");
        assert_eq!(cards[2].value, "83.3%");
    }

    #[tokio::test]
    async fn test_weekly_ranking_orders_by_goals_hit() {
        let (_dir, db) = test_connection().await;
        let engine = GamificationEngine::new(
            db.clone(),
            HolidayCalendar::default(),
            CommercialMonthConfig::default(),
        );
        // Ana выполняет только понедельник, но продаёт много; Bruno выполняет понедельник и вторник
        engine
            .process_daily(
                &[
                    sheet("Ana", 100.0, 400.0, "1", SellerRole::Seller),
                    sheet("Bruno", 100.0, 100.0, "1", SellerRole::Seller),
                ],
                d(2025, 1, 13),
            )
            .await
            .unwrap();
        engine
            .process_daily(
                &[
                    sheet("Ana", 100.0, 50.0, "1", SellerRole::Seller),
                    sheet("Bruno", 100.0, 100.0, "1", SellerRole::Seller),
                ],
                d(2025, 1, 14),
            )
            .await
            .unwrap();

        let ranking = service(db).weekly(d(2025, 1, 14)).await.unwrap();
        assert_eq!(ranking.business_days, 5.5);
        let bruno = &ranking.rows[0];
        assert_eq!(bruno.name, "Bruno");
        assert_eq!(bruno.goals_hit, 2.0);
        assert_eq!(bruno.goal, 550.0);
        assert_eq!(
            bruno.week_status,
            vec![Some(true), Some(true), None, None, None, None]
        );
        assert_eq!(ranking.rows[1].week_status[1], Some(false));
        assert_eq!(ranking.rows[1].rank, 2);
    }

    #[tokio::test]
    async fn test_monthly_uses_full_cycle_goal() {
        let (_dir, db) = test_connection().await;
        a102_daily_result::repository::record(&db, "Ana", d(2025, 3, 3), 100.0, 1100.0, 1100.0)
            .await
            .unwrap();
        let rows = service(db).monthly(d(2025, 3, 3)).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].goal, 2200.0);
        assert!((rows[0].attainment - 50.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_points_ranking_with_badges() {
        let (_dir, db) = test_connection().await;
        a109_ranking_badge::repository::seed_defaults(&db).await.unwrap();
        a103_trophy::repository::award(&db, "Ana", d(2025, 1, 10), TrophyKind::Gold, "x")
            .await
            .unwrap();
        a103_trophy::repository::award(&db, "Bruno", d(2025, 1, 10), TrophyKind::Bronze, "x")
            .await
            .unwrap();
        // до старта кампании
        a103_trophy::repository::award(&db, "Bruno", d(2024, 12, 1), TrophyKind::Gold, "x")
            .await
            .unwrap();

        let rows = service(db).points(d(2025, 1, 31)).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!((rows[0].name.as_str(), rows[0].points), ("Ana", 10));
        assert_eq!(rows[0].badge_icon, "🥇");
        assert_eq!(rows[1].badge_icon, "🥈");
        assert_eq!(rows[1].medals.bronze, 1);
    }
}
