use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, DatabaseBackend, EntityTrait, QueryFilter, Statement};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a108_notification_sent")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub channel: String,
    /// Ключ группы или продавца
    pub subject: String,
    /// Смена, ISO-неделя или дата
    pub reference: String,
    pub sent_on: String,
    pub sent_at: String,
    pub payload: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Group,
    Individual,
}

impl Channel {
    pub fn code(&self) -> &'static str {
        match self {
            Channel::Group => "GROUP",
            Channel::Individual => "INDIVIDUAL",
        }
    }
}

async fn find(
    db: &DatabaseConnection,
    channel: Channel,
    subject: &str,
    reference: &str,
) -> Result<Option<Model>> {
    Ok(Entity::find()
        .filter(Column::Channel.eq(channel.code()))
        .filter(Column::Subject.eq(subject))
        .filter(Column::Reference.eq(reference))
        .one(db)
        .await?)
}

pub async fn was_sent(
    db: &DatabaseConnection,
    channel: Channel,
    subject: &str,
    reference: &str,
) -> Result<bool> {
    Ok(find(db, channel, subject, reference).await?.is_some())
}

/// Отмечает отправку; повторная отметка заменяет payload
pub async fn mark_sent(
    db: &DatabaseConnection,
    channel: Channel,
    subject: &str,
    reference: &str,
    now: NaiveDateTime,
    payload: Option<&str>,
) -> Result<()> {
    let sql = r#"
        INSERT INTO a108_notification_sent (channel, subject, reference, sent_on, sent_at, payload)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(channel, subject, reference) DO UPDATE SET
            sent_on = excluded.sent_on,
            sent_at = excluded.sent_at,
            payload = excluded.payload
    "#;
    let sent_on: NaiveDate = now.date();
    db.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        sql,
        [
            channel.code().into(),
            subject.into(),
            reference.into(),
            sent_on.to_string().into(),
            now.format("%Y-%m-%d %H:%M:%S").to_string().into(),
            payload.map(str::to_string).into(),
        ],
    ))
    .await?;
    Ok(())
}

pub async fn payload(
    db: &DatabaseConnection,
    channel: Channel,
    subject: &str,
    reference: &str,
) -> Result<Option<String>> {
    Ok(find(db, channel, subject, reference)
        .await?
        .and_then(|m| m.payload))
}
