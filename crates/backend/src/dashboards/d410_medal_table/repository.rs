use anyhow::Result;
use chrono::NaiveDate;
use sea_orm::{DatabaseBackend, DatabaseConnection, FromQueryResult, Statement};
use serde::Serialize;

/// Очки и медали продавца за период
#[derive(Debug, Clone, Serialize, FromQueryResult)]
pub struct MedalAggregate {
    pub seller_name: String,
    pub points: i64,
    pub gold: i64,
    pub silver: i64,
    pub bronze: i64,
}

/// Все активные продавцы без менеджеров, включая тех, у кого нет трофеев за период
pub async fn medal_totals(
    db: &DatabaseConnection,
    date_from: NaiveDate,
    date_to: NaiveDate,
) -> Result<Vec<MedalAggregate>> {
    let sql = r#"
        SELECT
            s.name AS seller_name,
            COALESCE(SUM(t.points), 0) AS points,
            COALESCE(SUM(CASE WHEN t.kind = 'GOLD' THEN 1 ELSE 0 END), 0) AS gold,
            COALESCE(SUM(CASE WHEN t.kind = 'SILVER' THEN 1 ELSE 0 END), 0) AS silver,
            COALESCE(SUM(CASE WHEN t.kind = 'BRONZE' THEN 1 ELSE 0 END), 0) AS bronze
        FROM a101_seller s
        LEFT JOIN a103_trophy t
            ON t.seller_name = s.name
            AND t.awarded_on BETWEEN ? AND ?
        WHERE s.is_active = 1 AND s.role <> 'MANAGER'
        GROUP BY s.name
        ORDER BY points DESC, gold DESC, silver DESC, bronze DESC, s.name ASC
    "#;

    let stmt = Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        sql,
        [date_from.to_string().into(), date_to.to_string().into()],
    );
    Ok(MedalAggregate::find_by_statement(stmt).all(db).await?)
}
