use anyhow::Result;
use chrono::NaiveDate;
use sea_orm::entity::prelude::*;
use sea_orm::{
    ConnectionTrait, DatabaseBackend, EntityTrait, FromQueryResult, QueryFilter, QueryOrder,
    Statement,
};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a102_daily_result")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub seller_name: String,
    pub date: String,
    pub goal: f64,
    pub sales: f64,
    pub attainment: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").ok()
    }
}

/// Итог продавца за период (продажи и максимальная дневная цель)
#[derive(Debug, Clone, FromQueryResult)]
pub struct SellerAggregate {
    pub seller_name: String,
    pub store: Option<String>,
    pub sales: f64,
    pub max_goal: f64,
}

/// Сохраняет результат дня; повторный запуск перезаписывает
pub async fn record(
    db: &DatabaseConnection,
    seller_name: &str,
    date: NaiveDate,
    goal: f64,
    sales: f64,
    attainment: f64,
) -> Result<()> {
    let sql = r#"
        INSERT INTO a102_daily_result (seller_name, date, goal, sales, attainment)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(seller_name, date) DO UPDATE SET
            goal = excluded.goal,
            sales = excluded.sales,
            attainment = excluded.attainment
    "#;
    db.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        sql,
        [
            seller_name.into(),
            date.to_string().into(),
            goal.into(),
            sales.into(),
            attainment.into(),
        ],
    ))
    .await?;
    Ok(())
}

pub async fn results_between(
    db: &DatabaseConnection,
    seller_name: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<Model>> {
    Ok(Entity::find()
        .filter(Column::SellerName.eq(seller_name))
        .filter(Column::Date.gte(from.to_string()))
        .filter(Column::Date.lte(to.to_string()))
        .order_by_asc(Column::Date)
        .all(db)
        .await?)
}

pub async fn results_on(db: &DatabaseConnection, date: NaiveDate) -> Result<Vec<Model>> {
    Ok(Entity::find()
        .filter(Column::Date.eq(date.to_string()))
        .order_by_asc(Column::SellerName)
        .all(db)
        .await?)
}

pub async fn list_all(db: &DatabaseConnection) -> Result<Vec<Model>> {
    Ok(Entity::find()
        .order_by_asc(Column::Date)
        .order_by_asc(Column::SellerName)
        .all(db)
        .await?)
}

#[derive(Debug, FromQueryResult)]
struct ScalarRow {
    value: Option<f64>,
}

async fn scalar(
    db: &DatabaseConnection,
    expr: &str,
    seller_name: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Option<f64>> {
    let sql = format!(
        "SELECT {} AS value FROM a102_daily_result WHERE seller_name = ? AND date BETWEEN ? AND ?",
        expr
    );
    let row = ScalarRow::find_by_statement(Statement::from_sql_and_values(
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
    Ok(row.and_then(|r| r.value))
}

/// Сумма продаж за период; None если результатов нет
pub async fn sales_sum(
    db: &DatabaseConnection,
    seller_name: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Option<f64>> {
    scalar(db, "SUM(sales)", seller_name, from, to).await
}

/// Максимальная дневная цель за период
pub async fn max_goal(
    db: &DatabaseConnection,
    seller_name: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Option<f64>> {
    scalar(db, "MAX(goal)", seller_name, from, to).await
}

/// Агрегат по продавцам: неактивные и менеджеры исключаются,
/// продавцы без записи в a101 остаются
pub async fn aggregate_between(
    db: &DatabaseConnection,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<SellerAggregate>> {
    let sql = r#"
        SELECT
            r.seller_name AS seller_name,
            s.store AS store,
            COALESCE(SUM(r.sales), 0.0) AS sales,
            COALESCE(MAX(r.goal), 0.0) AS max_goal
        FROM a102_daily_result r
        LEFT JOIN a101_seller s ON s.name = r.seller_name
        WHERE r.date BETWEEN ? AND ?
          AND (s.id IS NULL OR (s.is_active = 1 AND s.role <> 'MANAGER'))
        GROUP BY r.seller_name, s.store
        ORDER BY r.seller_name
    "#;
    Ok(SellerAggregate::find_by_statement(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        sql,
        [from.to_string().into(), to.to_string().into()],
    ))
    .all(db)
    .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::a101_seller;
    use crate::shared::data::db::test_connection;
    use contracts::enums::SellerRole;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    #[tokio::test]
    async fn test_record_overwrites_same_day() {
        let (_dir, db) = test_connection().await;
        record(&db, "Ana", d(13), 100.0, 50.0, 50.0).await.unwrap();
        record(&db, "Ana", d(13), 100.0, 120.0, 120.0).await.unwrap();
        let rows = results_on(&db, d(13)).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].sales, 120.0);
        assert_eq!(rows[0].date(), Some(d(13)));
    }

    #[tokio::test]
    async fn test_sums_and_max_goal() {
        let (_dir, db) = test_connection().await;
        record(&db, "Ana", d(13), 100.0, 80.0, 80.0).await.unwrap();
        record(&db, "Ana", d(14), 150.0, 200.0, 133.3).await.unwrap();
        record(&db, "Ana", d(20), 500.0, 10.0, 2.0).await.unwrap();

        assert_eq!(sales_sum(&db, "Ana", d(13), d(18)).await.unwrap(), Some(280.0));
        assert_eq!(max_goal(&db, "Ana", d(13), d(18)).await.unwrap(), Some(150.0));
        assert_eq!(sales_sum(&db, "Bia", d(13), d(18)).await.unwrap(), None);
        assert_eq!(results_between(&db, "Ana", d(14), d(20)).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_aggregate_excludes_managers_keeps_unknown() {
        let (_dir, db) = test_connection().await;
        a101_seller::repository::upsert(&db, "Ana", Some("7"), SellerRole::Seller)
            .await
            .unwrap();
        a101_seller::repository::upsert(&db, "Gil", Some("7"), SellerRole::Manager)
            .await
            .unwrap();
        record(&db, "Ana", d(13), 100.0, 80.0, 80.0).await.unwrap();
        record(&db, "Gil", d(13), 100.0, 80.0, 80.0).await.unwrap();
        record(&db, "Zeca", d(13), 90.0, 30.0, 33.3).await.unwrap();

        let agg = aggregate_between(&db, d(13), d(18)).await.unwrap();
        let names: Vec<_> = agg.iter().map(|a| a.seller_name.as_str()).collect();
        assert_eq!(names, vec!["Ana", "Zeca"]);
        assert_eq!(agg[0].store.as_deref(), Some("7"));
        assert_eq!(agg[1].max_goal, 90.0);
    }
}
