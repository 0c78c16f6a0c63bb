use anyhow::Result;
use chrono::NaiveDate;
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, DatabaseBackend, EntityTrait, QueryFilter, QueryOrder, Statement};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a104_weekly_goal")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub seller_name: String,
    pub week_id: String,
    pub date_from: String,
    pub date_to: String,
    pub goal_value: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Фиксирует цель недели при первом появлении; существующую не трогает.
/// Возвращает true, если цель записана сейчас.
pub async fn record_if_absent(
    db: &DatabaseConnection,
    seller_name: &str,
    week_id: &str,
    date_from: NaiveDate,
    date_to: NaiveDate,
    goal_value: f64,
) -> Result<bool> {
    let sql = r#"
        INSERT OR IGNORE INTO a104_weekly_goal (seller_name, week_id, date_from, date_to, goal_value)
        VALUES (?, ?, ?, ?, ?)
    "#;
    let result = db
        .execute(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            sql,
            [
                seller_name.into(),
                week_id.into(),
                date_from.to_string().into(),
                date_to.to_string().into(),
                goal_value.into(),
            ],
        ))
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn get(db: &DatabaseConnection, seller_name: &str, week_id: &str) -> Result<Option<Model>> {
    Ok(Entity::find()
        .filter(Column::SellerName.eq(seller_name))
        .filter(Column::WeekId.eq(week_id))
        .one(db)
        .await?)
}

pub async fn list_all(db: &DatabaseConnection) -> Result<Vec<Model>> {
    Ok(Entity::find().order_by_asc(Column::Id).all(db).await?)
}
