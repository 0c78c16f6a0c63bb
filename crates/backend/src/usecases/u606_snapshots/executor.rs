//! CSV-снимки таблиц лиги в data_dir после каждого запуска.

use anyhow::{Context, Result};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::domain::{a101_seller, a102_daily_result, a103_trophy, a104_weekly_goal, a105_weekly_result};

fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("cannot create {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

async fn export_table(db: &DatabaseConnection, table: &str, path: &Path) -> Result<usize> {
    match table {
        "a101_seller" => {
            let rows = a101_seller::repository::list_all(db).await?;
            write_csv(path, &rows)?;
            Ok(rows.len())
        }
        "a102_daily_result" => {
            let rows = a102_daily_result::repository::list_all(db).await?;
            write_csv(path, &rows)?;
            Ok(rows.len())
        }
        "a103_trophy" => {
            let rows = a103_trophy::repository::list_all(db).await?;
            write_csv(path, &rows)?;
            Ok(rows.len())
        }
        "a105_weekly_result" => {
            let rows = a105_weekly_result::repository::list_all(db).await?;
            write_csv(path, &rows)?;
            Ok(rows.len())
        }
        "a104_weekly_goal" => {
            let rows = a104_weekly_goal::repository::list_all(db).await?;
            write_csv(path, &rows)?;
            Ok(rows.len())
        }
        other => anyhow::bail!("unknown snapshot table {}", other),
    }
}

pub const SNAPSHOT_TABLES: [&str; 5] = [
    "a101_seller",
    "a102_daily_result",
    "a103_trophy",
    "a105_weekly_result",
    "a104_weekly_goal",
];

/// Пишет `{table}.csv` по каждой таблице; ошибка одной таблицы только логируется.
/// Возвращает пути записанных файлов.
pub async fn export_snapshots(db: &DatabaseConnection, data_dir: &Path) -> Vec<PathBuf> {
    if let Err(e) = std::fs::create_dir_all(data_dir) {
        tracing::error!("SNAPSHOT | cannot create {}: {}", data_dir.display(), e);
        return Vec::new();
    }
    let mut written = Vec::new();
    for table in SNAPSHOT_TABLES {
        let path = data_dir.join(format!("{}.csv", table));
        match export_table(db, table, &path).await {
            Ok(rows) => {
                tracing::info!("SNAPSHOT | {} rows -> {}", rows, path.display());
                written.push(path);
            }
            Err(e) => tracing::error!("SNAPSHOT | {} failed: {:#}", table, e),
        }
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::test_connection;
    use chrono::NaiveDate;
    use contracts::enums::TrophyKind;

    #[tokio::test]
    async fn test_exports_every_table() {
        let (dir, db) = test_connection().await;
        let day = NaiveDate::from_ymd_opt(2025, 1, 13).unwrap();
        a102_daily_result::repository::record(&db, "Ana", day, 100.0, 120.0, 120.0)
            .await
            .unwrap();
        a103_trophy::repository::award(&db, "Ana", day, TrophyKind::Bronze, "Meta diária")
            .await
            .unwrap();

        let out = dir.path().join("snapshots");
        let written = export_snapshots(&db, &out).await;
        assert_eq!(written.len(), 5);

        let trophies = std::fs::read_to_string(out.join("a103_trophy.csv")).unwrap();
        let mut lines = trophies.lines();
        assert!(lines.next().unwrap().contains("seller_name"));
        assert!(lines.next().unwrap().contains("BRONZE"));

        // нет строк, нет заголовка
        let goals = std::fs::read_to_string(out.join("a104_weekly_goal.csv")).unwrap();
        assert!(goals.is_empty());
    }
}
