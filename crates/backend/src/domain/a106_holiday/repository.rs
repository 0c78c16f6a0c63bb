use anyhow::Result;
use chrono::NaiveDate;
use contracts::enums::HolidayScope;
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, DatabaseBackend, EntityTrait, QueryFilter, QueryOrder, Statement};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a106_holiday")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub date: String,
    pub description: String,
    pub scope: String,
    pub state: Option<String>,
    pub city: Option<String>,
    /// Пустая строка для праздников без привязки к магазину
    pub store: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").ok()
    }

    pub fn scope(&self) -> Option<HolidayScope> {
        HolidayScope::from_code(&self.scope)
    }
}

#[derive(Debug, Clone)]
pub struct NewHoliday {
    pub date: NaiveDate,
    pub description: String,
    pub scope: HolidayScope,
    pub state: Option<String>,
    pub city: Option<String>,
    pub store: Option<String>,
}

/// Вставка без перезаписи; возвращает true для новой записи
pub async fn insert_or_ignore(db: &DatabaseConnection, holiday: &NewHoliday) -> Result<bool> {
    let sql = r#"
        INSERT OR IGNORE INTO a106_holiday (date, description, scope, state, city, store)
        VALUES (?, ?, ?, ?, ?, ?)
    "#;
    let result = db
        .execute(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            sql,
            [
                holiday.date.to_string().into(),
                holiday.description.clone().into(),
                holiday.scope.code().into(),
                holiday.state.clone().into(),
                holiday.city.clone().into(),
                holiday.store.clone().unwrap_or_default().into(),
            ],
        ))
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn on_date(db: &DatabaseConnection, date: NaiveDate) -> Result<Vec<Model>> {
    Ok(Entity::find()
        .filter(Column::Date.eq(date.to_string()))
        .all(db)
        .await?)
}

pub async fn list_all(db: &DatabaseConnection) -> Result<Vec<Model>> {
    Ok(Entity::find().order_by_asc(Column::Date).all(db).await?)
}
