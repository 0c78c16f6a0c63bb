use anyhow::Result;
use contracts::enums::MessageCategory;
use sea_orm::DatabaseConnection;
use std::collections::BTreeMap;

use super::repository;

/// Сколько последних отправленных шаблонов не повторять
pub const AVOID_LAST: u64 = 5;

const DEFAULT_TEMPLATES: &str = include_str!("../../../assets/message_templates.toml");

/// Разбирает набор шаблонов `CATEGORY = ["...", ...]`
pub fn parse_templates(source: &str) -> Result<Vec<(MessageCategory, String)>> {
    let table: BTreeMap<String, Vec<String>> = toml::from_str(source)?;
    let mut out = Vec::new();
    for category in MessageCategory::all() {
        if let Some(texts) = table.get(category.code()) {
            out.extend(texts.iter().map(|t| (category, t.clone())));
        }
    }
    for key in table.keys() {
        if MessageCategory::from_code(key).is_none() {
            tracing::warn!("MESSAGES | unknown template category '{}'", key);
        }
    }
    Ok(out)
}

pub async fn seed_defaults(db: &DatabaseConnection) -> Result<usize> {
    let templates = parse_templates(DEFAULT_TEMPLATES)?;
    repository::seed(db, &templates).await
}

/// Выбирает подпись категории и фиксирует её использование
pub async fn next_caption(db: &DatabaseConnection, category: MessageCategory) -> Result<Option<String>> {
    match repository::pick_random(db, category, AVOID_LAST).await? {
        Some(choice) => {
            repository::log_use(db, category, choice.id).await?;
            tracing::info!("MESSAGES | picked template {} for {}", choice.id, category.code());
            Ok(Some(choice.text))
        }
        None => {
            tracing::warn!("MESSAGES | no template available for {}", category.code());
            Ok(None)
        }
    }
}
