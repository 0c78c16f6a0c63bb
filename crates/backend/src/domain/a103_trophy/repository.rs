use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use contracts::enums::TrophyKind;
use contracts::usecases::u603_rankings::MedalCounts;
use sea_orm::entity::prelude::*;
use sea_orm::{
    ConnectionTrait, DatabaseBackend, EntityTrait, FromQueryResult, QueryFilter, QueryOrder,
    Statement,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a103_trophy")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub seller_name: String,
    pub awarded_on: String,
    pub kind: String,
    pub points: i32,
    pub reason: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn kind(&self) -> Option<TrophyKind> {
        TrophyKind::from_code(&self.kind)
    }

    pub fn awarded_on(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.awarded_on, "%Y-%m-%d").ok()
    }
}

/// Количество трофеев по видам
#[derive(Debug, Clone, Default, PartialEq, Eq, FromQueryResult)]
pub struct TrophyCounts {
    pub bronze: i64,
    pub silver: i64,
    pub gold: i64,
    pub bonus_1: i64,
    pub bonus_2: i64,
}

impl TrophyCounts {
    pub fn medals(&self) -> MedalCounts {
        MedalCounts {
            bronze: self.bronze,
            silver: self.silver,
            gold: self.gold,
            bonus: self.bonus_1 + self.bonus_2,
        }
    }
}

/// Строка таблицы очков
#[derive(Debug, Clone, FromQueryResult)]
pub struct LeaderboardRow {
    pub seller_name: String,
    pub points: i64,
    pub bronze: i64,
    pub silver: i64,
    pub gold: i64,
    pub bonus_1: i64,
    pub bonus_2: i64,
}

const COUNT_COLUMNS: &str = r#"
    COALESCE(SUM(CASE WHEN t.kind = 'BRONZE' THEN 1 ELSE 0 END), 0) AS bronze,
    COALESCE(SUM(CASE WHEN t.kind = 'SILVER' THEN 1 ELSE 0 END), 0) AS silver,
    COALESCE(SUM(CASE WHEN t.kind = 'GOLD' THEN 1 ELSE 0 END), 0) AS gold,
    COALESCE(SUM(CASE WHEN t.kind = 'BONUS_1' THEN 1 ELSE 0 END), 0) AS bonus_1,
    COALESCE(SUM(CASE WHEN t.kind = 'BONUS_2' THEN 1 ELSE 0 END), 0) AS bonus_2
"#;

/// Выдаёт трофей. Повторная выдача в тот же день обновляет очки и причину.
/// Возвращает true, если запись новая.
pub async fn award(
    db: &DatabaseConnection,
    seller_name: &str,
    date: NaiveDate,
    kind: TrophyKind,
    reason: &str,
) -> Result<bool> {
    let existing = Entity::find()
        .filter(Column::SellerName.eq(seller_name))
        .filter(Column::AwardedOn.eq(date.to_string()))
        .filter(Column::Kind.eq(kind.code()))
        .one(db)
        .await?;

    let sql = r#"
        INSERT INTO a103_trophy (seller_name, awarded_on, kind, points, reason)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(seller_name, awarded_on, kind) DO UPDATE SET
            points = excluded.points,
            reason = excluded.reason
    "#;
    db.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        sql,
        [
            seller_name.into(),
            date.to_string().into(),
            kind.code().into(),
            kind.points().into(),
            reason.into(),
        ],
    ))
    .await?;

    Ok(existing.is_none())
}

/// Виды трофеев продавца за день
pub async fn on_date(
    db: &DatabaseConnection,
    seller_name: &str,
    date: NaiveDate,
) -> Result<Vec<TrophyKind>> {
    let rows = Entity::find()
        .filter(Column::SellerName.eq(seller_name))
        .filter(Column::AwardedOn.eq(date.to_string()))
        .order_by_asc(Column::Id)
        .all(db)
        .await?;
    Ok(rows.iter().filter_map(Model::kind).collect())
}

#[derive(Debug, FromQueryResult)]
struct PointsRow {
    points: i64,
}

pub async fn points_between(
    db: &DatabaseConnection,
    seller_name: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<i64> {
    let sql = r#"
        SELECT COALESCE(SUM(points), 0) AS points FROM a103_trophy
        WHERE seller_name = ? AND awarded_on BETWEEN ? AND ?
    "#;
    let row = PointsRow::find_by_statement(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        sql,
        [
            seller_name.into(),
            from.to_string().into(),
            to.to_string().into(),
        ],
    ))
    .one(db)
    .await?;
    Ok(row.map(|r| r.points).unwrap_or(0))
}

pub async fn counts_between(
    db: &DatabaseConnection,
    seller_name: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<TrophyCounts> {
    let sql = format!(
        "SELECT {} FROM a103_trophy t WHERE t.seller_name = ? AND t.awarded_on BETWEEN ? AND ?",
        COUNT_COLUMNS
    );
    let row = TrophyCounts::find_by_statement(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        sql,
        [
            seller_name.into(),
            from.to_string().into(),
            to.to_string().into(),
        ],
    ))
    .one(db)
    .await?;
    Ok(row.unwrap_or_default())
}

/// История трофеев, новые первыми
pub async fn history(db: &DatabaseConnection, seller_name: &str) -> Result<Vec<Model>> {
    Ok(Entity::find()
        .filter(Column::SellerName.eq(seller_name))
        .order_by_desc(Column::AwardedOn)
        .order_by_desc(Column::Id)
        .all(db)
        .await?)
}

/// Очки и медали за период без менеджеров и неактивных, по убыванию очков
pub async fn points_leaderboard(
    db: &DatabaseConnection,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<LeaderboardRow>> {
    let sql = format!(
        r#"
        SELECT t.seller_name AS seller_name,
               COALESCE(SUM(t.points), 0) AS points,
               {}
        FROM a103_trophy t
        LEFT JOIN a101_seller s ON s.name = t.seller_name
        WHERE t.awarded_on BETWEEN ? AND ?
          AND (s.id IS NULL OR (s.is_active = 1 AND s.role <> 'MANAGER'))
        GROUP BY t.seller_name
        ORDER BY points DESC, t.seller_name ASC
        "#,
        COUNT_COLUMNS
    );
    Ok(LeaderboardRow::find_by_statement(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        sql,
        [from.to_string().into(), to.to_string().into()],
    ))
    .all(db)
    .await?)
}

/// Удаляет трофеи начиная с даты (для пересчёта)
pub async fn delete_from(db: &DatabaseConnection, date: NaiveDate) -> Result<u64> {
    let result = Entity::delete_many()
        .filter(Column::AwardedOn.gte(date.to_string()))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Удаляет повторы периодических трофеев: серебро одно на ISO-неделю,
/// золото и бонусы одни на календарный месяц. Остаётся запись с меньшим id.
pub async fn dedupe_periodic(db: &DatabaseConnection) -> Result<u64> {
    let rows = Entity::find()
        .filter(Column::Kind.is_in([
            TrophyKind::Silver.code(),
            TrophyKind::Gold.code(),
            TrophyKind::Bonus1.code(),
            TrophyKind::Bonus2.code(),
        ]))
        .order_by_asc(Column::Id)
        .all(db)
        .await?;

    let mut seen: HashSet<(String, String, String)> = HashSet::new();
    let mut duplicates: Vec<i32> = Vec::new();
    for row in &rows {
        let Some(date) = row.awarded_on() else {
            continue;
        };
        let period = if row.kind() == Some(TrophyKind::Silver) {
            let iso = date.iso_week();
            format!("{}-W{}", iso.year(), iso.week())
        } else {
            format!("{}-{:02}", date.year(), date.month())
        };
        let key = (row.seller_name.clone(), row.kind.clone(), period);
        if !seen.insert(key) {
            duplicates.push(row.id);
        }
    }

    if duplicates.is_empty() {
        return Ok(0);
    }
    let result = Entity::delete_many()
        .filter(Column::Id.is_in(duplicates))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

pub async fn list_all(db: &DatabaseConnection) -> Result<Vec<Model>> {
    Ok(Entity::find().order_by_asc(Column::Id).all(db).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::test_connection;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, day).unwrap()
    }

    #[tokio::test]
    async fn test_award_is_idempotent_last_reason_wins() {
        let (_dir, db) = test_connection().await;
        assert!(award(&db, "Ana", d(1, 13), TrophyKind::Bronze, "a").await.unwrap());
        assert!(!award(&db, "Ana", d(1, 13), TrophyKind::Bronze, "b").await.unwrap());

        let all = list_all(&db).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].reason.as_deref(), Some("b"));
        assert_eq!(all[0].points, 1);
        assert_eq!(on_date(&db, "Ana", d(1, 13)).await.unwrap(), vec![TrophyKind::Bronze]);
    }

    #[tokio::test]
    async fn test_points_and_counts() {
        let (_dir, db) = test_connection().await;
        award(&db, "Ana", d(1, 13), TrophyKind::Bronze, "").await.unwrap();
        award(&db, "Ana", d(1, 17), TrophyKind::Silver, "").await.unwrap();
        award(&db, "Ana", d(1, 25), TrophyKind::Gold, "").await.unwrap();
        award(&db, "Ana", d(1, 25), TrophyKind::Bonus2, "").await.unwrap();
        award(&db, "Bia", d(1, 13), TrophyKind::Bronze, "").await.unwrap();

        assert_eq!(points_between(&db, "Ana", d(1, 1), d(1, 31)).await.unwrap(), 19);
        assert_eq!(points_between(&db, "Ana", d(1, 14), d(1, 20)).await.unwrap(), 3);
        let counts = counts_between(&db, "Ana", d(1, 1), d(1, 31)).await.unwrap();
        assert_eq!(counts.gold, 1);
        assert_eq!(counts.medals().bonus, 1);

        let board = points_leaderboard(&db, d(1, 1), d(1, 31)).await.unwrap();
        assert_eq!(board[0].seller_name, "Ana");
        assert_eq!(board[0].points, 19);
        assert_eq!(board[1].bronze, 1);

        let hist = history(&db, "Ana").await.unwrap();
        assert_eq!(hist[0].awarded_on, "2025-01-25");

        assert_eq!(delete_from(&db, d(1, 17)).await.unwrap(), 3);
        assert_eq!(list_all(&db).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_dedupe_periodic_keeps_first() {
        let (_dir, db) = test_connection().await;
        // Wed and Fri of the same ISO week
        award(&db, "Ana", d(1, 15), TrophyKind::Silver, "").await.unwrap();
        award(&db, "Ana", d(1, 17), TrophyKind::Silver, "").await.unwrap();
        award(&db, "Ana", d(1, 24), TrophyKind::Silver, "").await.unwrap();
        award(&db, "Ana", d(1, 24), TrophyKind::Gold, "").await.unwrap();
        award(&db, "Ana", d(1, 25), TrophyKind::Gold, "").await.unwrap();
        award(&db, "Ana", d(1, 13), TrophyKind::Bronze, "").await.unwrap();
        award(&db, "Ana", d(1, 14), TrophyKind::Bronze, "").await.unwrap();

        assert_eq!(dedupe_periodic(&db).await.unwrap(), 2);
        let left: Vec<_> = list_all(&db)
            .await
            .unwrap()
            .into_iter()
            .map(|m| (m.awarded_on, m.kind))
            .collect();
        assert!(left.contains(&("2025-01-15".to_string(), "SILVER".to_string())));
        assert!(!left.contains(&("2025-01-17".to_string(), "SILVER".to_string())));
        assert!(left.contains(&("2025-01-24".to_string(), "GOLD".to_string())));
        assert_eq!(left.len(), 5);
        assert_eq!(dedupe_periodic(&db).await.unwrap(), 0);
    }
}
