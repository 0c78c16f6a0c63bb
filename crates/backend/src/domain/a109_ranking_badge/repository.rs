use anyhow::Result;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a109_ranking_badge")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub icon: String,
    pub min_position: i32,
    pub max_position: i32,
    pub is_active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

const DEFAULT_BADGES: &[(&str, &str, i32, i32)] = &[
    ("Ouro", "🥇", 1, 1),
    ("Prata", "🥈", 2, 2),
    ("Bronze", "🥉", 3, 3),
];

/// Заполняет правила по умолчанию, если таблица пуста
pub async fn seed_defaults(db: &DatabaseConnection) -> Result<usize> {
    if Entity::find().count(db).await? > 0 {
        return Ok(0);
    }
    for (name, icon, min, max) in DEFAULT_BADGES {
        ActiveModel {
            name: Set(name.to_string()),
            icon: Set(icon.to_string()),
            min_position: Set(*min),
            max_position: Set(*max),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }
    Ok(DEFAULT_BADGES.len())
}

pub async fn active_rules(db: &DatabaseConnection) -> Result<Vec<Model>> {
    Ok(Entity::find()
        .filter(Column::IsActive.eq(true))
        .order_by_asc(Column::MinPosition)
        .all(db)
        .await?)
}

/// Иконка первого правила, диапазон которого содержит позицию
pub fn badge_for(rules: &[Model], rank: usize) -> String {
    let rank = rank as i32;
    rules
        .iter()
        .find(|r| r.min_position <= rank && rank <= r.max_position)
        .map(|r| r.icon.clone())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::test_connection;

    #[tokio::test]
    async fn test_seed_and_lookup() {
        let (_dir, db) = test_connection().await;
        assert_eq!(seed_defaults(&db).await.unwrap(), 3);
        assert_eq!(seed_defaults(&db).await.unwrap(), 0);

        let rules = active_rules(&db).await.unwrap();
        assert_eq!(badge_for(&rules, 1), "🥇");
        assert_eq!(badge_for(&rules, 3), "🥉");
        assert_eq!(badge_for(&rules, 4), "");
    }
}
