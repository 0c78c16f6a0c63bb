use anyhow::Result;
use chrono::NaiveDate;
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, DatabaseBackend, EntityTrait, QueryFilter, QueryOrder, Statement};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a105_weekly_result")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub seller_name: String,
    pub week_id: String,
    pub sales_total: f64,
    pub goal_total: f64,
    pub attainment: f64,
    /// Суббота недели
    pub closing_date: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Накопленный итог недели, обновляется каждый день
pub async fn record(
    db: &DatabaseConnection,
    seller_name: &str,
    week_id: &str,
    sales_total: f64,
    goal_total: f64,
    attainment: f64,
    closing_date: NaiveDate,
) -> Result<()> {
    let sql = r#"
        INSERT INTO a105_weekly_result
            (seller_name, week_id, sales_total, goal_total, attainment, closing_date)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(seller_name, week_id) DO UPDATE SET
            sales_total = excluded.sales_total,
            goal_total = excluded.goal_total,
            attainment = excluded.attainment,
            closing_date = excluded.closing_date
    "#;
    db.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        sql,
        [
            seller_name.into(),
            week_id.into(),
            sales_total.into(),
            goal_total.into(),
            attainment.into(),
            closing_date.to_string().into(),
        ],
    ))
    .await?;
    Ok(())
}

pub async fn get(db: &DatabaseConnection, seller_name: &str, week_id: &str) -> Result<Option<Model>> {
    Ok(Entity::find()
        .filter(Column::SellerName.eq(seller_name))
        .filter(Column::WeekId.eq(week_id))
        .one(db)
        .await?)
}

/// Удаляет итоги недель, закрывающихся в дату или позже
pub async fn delete_from(db: &DatabaseConnection, date: NaiveDate) -> Result<u64> {
    let result = Entity::delete_many()
        .filter(Column::ClosingDate.gte(date.to_string()))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

pub async fn list_all(db: &DatabaseConnection) -> Result<Vec<Model>> {
    Ok(Entity::find().order_by_asc(Column::Id).all(db).await?)
}
