use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use contracts::dashboards::d410_medal_table::{
    AthleteHistoryEntry, MedalTableRequest, MedalTableRow, WeeklyTally,
};
use contracts::enums::TrophyKind;
use contracts::shared::period::PeriodRange;
use sea_orm::DatabaseConnection;
use std::collections::{BTreeMap, HashMap};

use super::repository;
use crate::domain::{a101_seller, a103_trophy, a106_holiday};
use crate::shared::calendar::{commercial_cycle, monday_of, padded_week_id};
use crate::shared::config::{CommercialMonthConfig, Config};
use crate::usecases::u603_rankings::RankingService;

/// Текущий коммерческий цикл: от дня начала до сегодняшней даты
pub fn current_period(month: &CommercialMonthConfig, today: NaiveDate) -> PeriodRange {
    let (start, end) = commercial_cycle(today, month);
    PeriodRange::new(start.to_string(), end.to_string())
}

/// Границы периода из запроса; пустые значения берутся из текущего цикла
pub fn resolve_period(
    month: &CommercialMonthConfig,
    date_from: Option<&str>,
    date_to: Option<&str>,
    today: NaiveDate,
) -> Result<(NaiveDate, NaiveDate)> {
    let (cycle_start, _) = commercial_cycle(today, month);
    let parse = |value: Option<&str>, fallback: NaiveDate| -> Result<NaiveDate> {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(v) => NaiveDate::parse_from_str(v, "%Y-%m-%d")
                .with_context(|| format!("invalid date '{}'", v)),
            None => Ok(fallback),
        }
    };
    Ok((parse(date_from, cycle_start)?, parse(date_to, today)?))
}

pub fn medal_icon(position: usize) -> &'static str {
    match position {
        1 => "🥇",
        2 => "🥈",
        3 => "🥉",
        _ => "🎖️",
    }
}

/// Выполнение месячной цели на дату; при ошибке расчёта таблица сортируется без него
async fn monthly_attainment(
    db: &DatabaseConnection,
    config: &Config,
    date: NaiveDate,
) -> HashMap<String, f64> {
    let calendar = match a106_holiday::service::load_calendar(
        db,
        &config.gamification.custom_holiday_dates(),
    )
    .await
    {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("DASHBOARD | holiday calendar unavailable: {:#}", e);
            return HashMap::new();
        }
    };
    let rankings = RankingService::new(
        db.clone(),
        calendar,
        config.commercial_month.clone(),
        config.gamification.clone(),
        0.0,
    );
    match rankings.monthly(date).await {
        Ok(rows) => rows.into_iter().map(|r| (r.name, r.attainment)).collect(),
        Err(e) => {
            tracing::warn!("DASHBOARD | monthly attainment unavailable: {:#}", e);
            HashMap::new()
        }
    }
}

/// Общая таблица медалей: очки, затем месячное выполнение, затем золото, серебро и бронза
pub async fn medal_table(
    db: &DatabaseConnection,
    config: &Config,
    request: &MedalTableRequest,
    today: NaiveDate,
) -> Result<Vec<MedalTableRow>> {
    let (date_from, date_to) = resolve_period(
        &config.commercial_month,
        request.date_from.as_deref(),
        request.date_to.as_deref(),
        today,
    )?;
    let totals = repository::medal_totals(db, date_from, date_to).await?;
    if totals.is_empty() {
        return Ok(Vec::new());
    }
    let attainment = monthly_attainment(db, config, date_to).await;

    let mut rows: Vec<MedalTableRow> = totals
        .into_iter()
        .map(|t| MedalTableRow {
            position: 0,
            icon: String::new(),
            monthly_attainment: attainment.get(&t.seller_name).copied().unwrap_or(0.0),
            seller: t.seller_name,
            points: t.points,
            gold: t.gold,
            silver: t.silver,
            bronze: t.bronze,
        })
        .collect();

    rows.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then_with(|| b.monthly_attainment.total_cmp(&a.monthly_attainment))
            .then_with(|| b.gold.cmp(&a.gold))
            .then_with(|| b.silver.cmp(&a.silver))
            .then_with(|| b.bronze.cmp(&a.bronze))
    });
    for (idx, row) in rows.iter_mut().enumerate() {
        row.position = idx + 1;
        row.icon = medal_icon(idx + 1).to_string();
    }
    Ok(rows)
}

/// Активные продавцы без менеджеров
pub async fn seller_names(db: &DatabaseConnection) -> Result<Vec<String>> {
    Ok(a101_seller::repository::list_rankable(db)
        .await?
        .into_iter()
        .map(|s| s.name)
        .collect())
}

/// Трофеи продавца, новые первыми
pub async fn athlete_history(
    db: &DatabaseConnection,
    seller_name: &str,
) -> Result<Vec<AthleteHistoryEntry>> {
    Ok(a103_trophy::repository::history(db, seller_name)
        .await?
        .into_iter()
        .filter_map(|t| {
            let kind = t.kind()?;
            Some(AthleteHistoryEntry {
                awarded_on: t.awarded_on,
                kind,
                points: i64::from(t.points),
                reason: t.reason,
            })
        })
        .collect())
}

/// Итоги по неделям Пн..Сб, последние первыми
pub async fn weekly_tallies(db: &DatabaseConnection, seller_name: &str) -> Result<Vec<WeeklyTally>> {
    let mut weeks: BTreeMap<NaiveDate, WeeklyTally> = BTreeMap::new();
    for trophy in a103_trophy::repository::history(db, seller_name).await? {
        let (Some(date), Some(kind)) = (trophy.awarded_on(), trophy.kind()) else {
            continue;
        };
        let monday = monday_of(date);
        let tally = weeks.entry(monday).or_insert_with(|| WeeklyTally {
            week_id: padded_week_id(monday),
            week_start: monday.to_string(),
            week_end: (monday + Duration::days(5)).to_string(),
            points: 0,
            gold: 0,
            silver: 0,
            bronze: 0,
            bonus_1: 0,
            bonus_2: 0,
        });
        tally.points += i64::from(trophy.points);
        match kind {
            TrophyKind::Gold => tally.gold += 1,
            TrophyKind::Silver => tally.silver += 1,
            TrophyKind::Bronze => tally.bronze += 1,
            TrophyKind::Bonus1 => tally.bonus_1 += 1,
            TrophyKind::Bonus2 => tally.bonus_2 += 1,
        }
    }
    Ok(weeks.into_values().rev().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::test_connection;
    use contracts::enums::SellerRole;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, day).unwrap()
    }

    async fn seed(db: &DatabaseConnection) {
        for name in ["Ana", "Bruno", "Carla", "Davi"] {
            a101_seller::repository::upsert(db, name, Some("01"), SellerRole::Seller)
                .await
                .unwrap();
        }
        a101_seller::repository::upsert_manager(db, "Gil", Some("G1"), Some("01"))
            .await
            .unwrap();

        let award = |name: &'static str, date: NaiveDate, kind: TrophyKind| async move {
            a103_trophy::repository::award(db, name, date, kind, "test")
                .await
                .unwrap();
        };
        award("Ana", d(1, 13), TrophyKind::Silver).await;
        award("Bruno", d(1, 14), TrophyKind::Bronze).await;
        award("Bruno", d(1, 15), TrophyKind::Bronze).await;
        award("Bruno", d(1, 16), TrophyKind::Bronze).await;
        award("Carla", d(1, 14), TrophyKind::Bronze).await;
        award("Gil", d(1, 14), TrophyKind::Gold).await;
        award("Davi", d(1, 2), TrophyKind::Silver).await;
    }

    #[test]
    fn test_current_period_starts_at_cycle() {
        let month = CommercialMonthConfig::default();
        let period = current_period(&month, d(1, 15));
        assert_eq!(period.date_from, "2024-12-26");
        assert_eq!(period.date_to, "2025-01-15");
    }

    #[test]
    fn test_resolve_period_rejects_bad_dates() {
        let month = CommercialMonthConfig::default();
        assert!(resolve_period(&month, Some("15/01/2025"), None, d(1, 15)).is_err());
        let (from, to) = resolve_period(&month, Some("2025-01-10"), Some(""), d(1, 15)).unwrap();
        assert_eq!(from, d(1, 10));
        assert_eq!(to, d(1, 15));
    }

    #[tokio::test]
    async fn test_medal_table_order_and_icons() {
        let (dir, db) = test_connection().await;
        seed(&db).await;
        let mut config = Config::default();
        config.base_dir = dir.path().to_path_buf();
        let request = MedalTableRequest {
            date_from: Some("2025-01-06".into()),
            date_to: Some("2025-01-18".into()),
        };

        let rows = medal_table(&db, &config, &request, d(1, 18)).await.unwrap();
        let names: Vec<&str> = rows.iter().map(|r| r.seller.as_str()).collect();
        // Ana и Bruno по 3 очка; серебро выше бронзы при равном выполнении
        assert_eq!(names, vec!["Ana", "Bruno", "Carla", "Davi"]);
        assert_eq!(rows[0].icon, "🥇");
        assert_eq!(rows[2].icon, "🥉");
        assert_eq!(rows[3].icon, "🎖️");
        assert_eq!(rows[1].bronze, 3);
        assert_eq!(rows[3].points, 0);
    }

    #[tokio::test]
    async fn test_weekly_tallies_newest_first() {
        let (_dir, db) = test_connection().await;
        seed(&db).await;
        a103_trophy::repository::award(&db, "Bruno", d(1, 20), TrophyKind::Bronze, "test")
            .await
            .unwrap();

        let weeks = weekly_tallies(&db, "Bruno").await.unwrap();
        assert_eq!(weeks.len(), 2);
        assert_eq!(weeks[0].week_id, "2025_W04");
        assert_eq!(weeks[1].week_id, "2025_W03");
        assert_eq!(weeks[1].week_start, "2025-01-13");
        assert_eq!(weeks[1].week_end, "2025-01-18");
        assert_eq!(weeks[1].bronze, 3);
        assert_eq!(weeks[1].points, 3);

        let history = athlete_history(&db, "Bruno").await.unwrap();
        assert_eq!(history.len(), 4);
        assert_eq!(history[0].awarded_on, "2025-01-20");
    }

    #[tokio::test]
    async fn test_seller_names_skip_managers() {
        let (_dir, db) = test_connection().await;
        seed(&db).await;
        let names = seller_names(&db).await.unwrap();
        assert_eq!(names, vec!["Ana", "Bruno", "Carla", "Davi"]);
    }
}
