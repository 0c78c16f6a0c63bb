use anyhow::Result;
use chrono::NaiveDate;
use sea_orm::{DatabaseBackend, DatabaseConnection, FromQueryResult, Statement, Value};

#[derive(Debug, Clone, FromQueryResult)]
pub struct StoreTotals {
    pub total_points: i64,
    pub active_sellers: i64,
    pub gold: i64,
    pub other_medals: i64,
}

#[derive(Debug, Clone, FromQueryResult)]
pub struct StoreSellerAggregate {
    pub seller_name: String,
    pub points: i64,
    pub gold: i64,
    pub silver: i64,
    pub bronze: i64,
    pub bonus: i64,
}

#[derive(Debug, Clone, FromQueryResult)]
pub struct DailyPoints {
    pub store: String,
    pub date: String,
    pub points_day: i64,
}

#[derive(Debug, Clone, FromQueryResult)]
pub struct StorePoints {
    pub store: String,
    pub total_points: i64,
    pub active_sellers: i64,
}

/// Параметры в порядке плейсхолдеров: период в JOIN, затем магазин в WHERE
fn period_values(store: &str, date_from: NaiveDate, date_to: NaiveDate) -> [Value; 3] {
    [
        date_from.to_string().into(),
        date_to.to_string().into(),
        store.into(),
    ]
}

pub async fn store_totals(
    db: &DatabaseConnection,
    store: &str,
    date_from: NaiveDate,
    date_to: NaiveDate,
) -> Result<StoreTotals> {
    let sql = r#"
        SELECT
            COALESCE(SUM(t.points), 0) AS total_points,
            COUNT(DISTINCT s.name) AS active_sellers,
            COALESCE(SUM(CASE WHEN t.kind = 'GOLD' THEN 1 ELSE 0 END), 0) AS gold,
            COALESCE(SUM(CASE WHEN t.kind IS NOT NULL AND t.kind <> 'GOLD' THEN 1 ELSE 0 END), 0) AS other_medals
        FROM a101_seller s
        LEFT JOIN a103_trophy t
            ON t.seller_name = s.name
            AND t.awarded_on BETWEEN ? AND ?
        WHERE s.store = ? AND s.is_active = 1 AND s.role <> 'MANAGER'
    "#;
    let stmt = Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        sql,
        period_values(store, date_from, date_to),
    );
    Ok(StoreTotals::find_by_statement(stmt)
        .one(db)
        .await?
        .unwrap_or(StoreTotals {
            total_points: 0,
            active_sellers: 0,
            gold: 0,
            other_medals: 0,
        }))
}

pub async fn store_sellers(
    db: &DatabaseConnection,
    store: &str,
    date_from: NaiveDate,
    date_to: NaiveDate,
) -> Result<Vec<StoreSellerAggregate>> {
    let sql = r#"
        SELECT
            s.name AS seller_name,
            COALESCE(SUM(t.points), 0) AS points,
            COALESCE(SUM(CASE WHEN t.kind = 'GOLD' THEN 1 ELSE 0 END), 0) AS gold,
            COALESCE(SUM(CASE WHEN t.kind = 'SILVER' THEN 1 ELSE 0 END), 0) AS silver,
            COALESCE(SUM(CASE WHEN t.kind = 'BRONZE' THEN 1 ELSE 0 END), 0) AS bronze,
            COALESCE(SUM(CASE WHEN t.kind IN ('BONUS_1', 'BONUS_2') THEN 1 ELSE 0 END), 0) AS bonus
        FROM a101_seller s
        LEFT JOIN a103_trophy t
            ON t.seller_name = s.name
            AND t.awarded_on BETWEEN ? AND ?
        WHERE s.store = ? AND s.is_active = 1 AND s.role <> 'MANAGER'
        GROUP BY s.name
        ORDER BY points DESC, gold DESC, silver DESC, bronze DESC, s.name ASC
    "#;
    let stmt = Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        sql,
        period_values(store, date_from, date_to),
    );
    Ok(StoreSellerAggregate::find_by_statement(stmt).all(db).await?)
}

/// Очки по дням для набора магазинов, по магазину и дате
pub async fn daily_points(
    db: &DatabaseConnection,
    stores: &[String],
    date_from: NaiveDate,
    date_to: NaiveDate,
) -> Result<Vec<DailyPoints>> {
    if stores.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders = vec!["?"; stores.len()].join(", ");
    let sql = format!(
        r#"
        SELECT s.store AS store, t.awarded_on AS date, SUM(t.points) AS points_day
        FROM a103_trophy t
        JOIN a101_seller s ON s.name = t.seller_name
        WHERE t.awarded_on BETWEEN ? AND ?
          AND s.role <> 'MANAGER'
          AND s.store IN ({})
        GROUP BY s.store, t.awarded_on
        ORDER BY s.store, t.awarded_on
        "#,
        placeholders
    );
    let mut values: Vec<Value> = vec![date_from.to_string().into(), date_to.to_string().into()];
    values.extend(stores.iter().map(|s| Value::from(s.clone())));
    let stmt = Statement::from_sql_and_values(DatabaseBackend::Sqlite, sql, values);
    Ok(DailyPoints::find_by_statement(stmt).all(db).await?)
}

/// Очки и число активных продавцов по всем магазинам
pub async fn points_by_store(
    db: &DatabaseConnection,
    date_from: NaiveDate,
    date_to: NaiveDate,
) -> Result<Vec<StorePoints>> {
    let sql = r#"
        SELECT
            s.store AS store,
            COALESCE(SUM(t.points), 0) AS total_points,
            COUNT(DISTINCT s.name) AS active_sellers
        FROM a101_seller s
        LEFT JOIN a103_trophy t
            ON t.seller_name = s.name
            AND t.awarded_on BETWEEN ? AND ?
        WHERE s.is_active = 1 AND s.role <> 'MANAGER'
          AND s.store IS NOT NULL AND s.store <> ''
        GROUP BY s.store
    "#;
    let stmt = Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        sql,
        [date_from.to_string().into(), date_to.to_string().into()],
    );
    Ok(StorePoints::find_by_statement(stmt).all(db).await?)
}
