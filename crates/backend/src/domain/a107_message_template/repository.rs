use anyhow::Result;
use contracts::enums::MessageCategory;
use rand::seq::SliceRandom;
use sea_orm::entity::prelude::*;
use sea_orm::{
    ActiveModelTrait, DatabaseBackend, EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter,
    Set, Statement,
};

pub mod template {
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "a107_message_template")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        pub category: String,
        pub text: String,
        pub is_active: bool,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod message_log {
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "a107_message_log")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        pub category: String,
        pub template_id: i32,
        pub sent_at: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

/// Заполняет таблицу шаблонов, только если она пуста.
/// Возвращает количество вставленных шаблонов.
pub async fn seed(db: &DatabaseConnection, templates: &[(MessageCategory, String)]) -> Result<usize> {
    let existing = template::Entity::find().count(db).await?;
    if existing > 0 {
        tracing::debug!("MESSAGES | template table already populated ({})", existing);
        return Ok(0);
    }

    for (category, text) in templates {
        template::ActiveModel {
            category: Set(category.code().to_string()),
            text: Set(text.clone()),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }
    tracing::info!("MESSAGES | seeded {} templates", templates.len());
    Ok(templates.len())
}

#[derive(Debug, Clone, FromQueryResult)]
pub struct TemplateChoice {
    pub id: i32,
    pub text: String,
}

/// Случайный активный шаблон категории, не входящий в последние `avoid_last` отправленных
pub async fn pick_random(
    db: &DatabaseConnection,
    category: MessageCategory,
    avoid_last: u64,
) -> Result<Option<TemplateChoice>> {
    let sql = r#"
        SELECT id, text
        FROM a107_message_template
        WHERE category = ?
          AND is_active = 1
          AND id NOT IN (
              SELECT template_id FROM a107_message_log
              WHERE category = ?
              ORDER BY id DESC
              LIMIT ?
          )
        ORDER BY id
    "#;
    let candidates = TemplateChoice::find_by_statement(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        sql,
        [
            category.code().into(),
            category.code().into(),
            (avoid_last as i64).into(),
        ],
    ))
    .all(db)
    .await?;

    Ok(candidates.choose(&mut rand::thread_rng()).cloned())
}

pub async fn log_use(db: &DatabaseConnection, category: MessageCategory, template_id: i32) -> Result<()> {
    message_log::ActiveModel {
        category: Set(category.code().to_string()),
        template_id: Set(template_id),
        sent_at: Set(chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(())
}

pub async fn count_active(db: &DatabaseConnection, category: MessageCategory) -> Result<u64> {
    Ok(template::Entity::find()
        .filter(template::Column::Category.eq(category.code()))
        .filter(template::Column::IsActive.eq(true))
        .count(db)
        .await?)
}
