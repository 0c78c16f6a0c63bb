use anyhow::{Context, Result};
use sea_orm::DatabaseConnection;

use crate::domain::{a106_holiday, a107_message_template, a109_ranking_badge};
use crate::shared::config::Config;

/// Справочные данные, нужные до первого расчёта: праздники, значки рейтинга, шаблоны подписей.
/// Повторный вызов ничего не дублирует.
pub async fn initialize_reference_data(db: &DatabaseConnection, config: &Config) -> Result<()> {
    let national = a106_holiday::service::seed_national(db)
        .await
        .context("national holidays")?;
    let store = a106_holiday::service::import_store_csv(db, &config.holidays_file())
        .await
        .context("store holidays")?;
    let badges = a109_ranking_badge::repository::seed_defaults(db)
        .await
        .context("ranking badges")?;
    let templates = a107_message_template::service::seed_defaults(db)
        .await
        .context("message templates")?;

    if national + store + badges + templates > 0 {
        tracing::info!(
            "Reference data: {} national holidays, {} store holidays, {} badges, {} templates added",
            national,
            store,
            badges,
            templates
        );
    }
    Ok(())
}
