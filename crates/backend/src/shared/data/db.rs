use once_cell::sync::OnceCell;
use sea_orm::{Database, DatabaseConnection};
use std::path::{Path, PathBuf};

static DB_CONN: OnceCell<DatabaseConnection> = OnceCell::new();

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// sqlite URL для пути к файлу; к Windows-путям добавляется ведущий слэш
pub fn build_sqlite_url(path: &Path) -> anyhow::Result<String> {
    let absolute_path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    let normalized = absolute_path.to_string_lossy().replace('\\', "/");
    let needs_leading_slash = !normalized.starts_with('/') && normalized.contains(':');
    let prefix = if needs_leading_slash { "/" } else { "" };
    Ok(format!("sqlite://{}{}?mode=rwc", prefix, normalized))
}

/// Открывает файл SQLite, при необходимости создавая родительские каталоги
pub async fn open(path: &Path) -> anyhow::Result<DatabaseConnection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let db_url = build_sqlite_url(path)?;
    Ok(Database::connect(&db_url).await?)
}

/// Открывает БД лиги и проверяет, что все таблицы созданы
pub async fn connect(path: &Path) -> anyhow::Result<DatabaseConnection> {
    let conn = open(path).await?;
    bootstrap_schema(&conn).await?;
    Ok(conn)
}

/// Создаёт все таблицы и индексы лиги (идемпотентно)
pub async fn bootstrap_schema(conn: &DatabaseConnection) -> anyhow::Result<()> {
    MIGRATOR.run(conn.get_sqlite_connection_pool()).await?;
    tracing::debug!("League schema is up to date");
    Ok(())
}

pub async fn initialize_database(db_path: &Path) -> anyhow::Result<()> {
    let conn = connect(db_path).await?;
    tracing::info!("Database ready: {}", db_path.display());
    DB_CONN
        .set(conn)
        .map_err(|_| anyhow::anyhow!("Database connection already initialized"))?;
    Ok(())
}

pub fn get_connection() -> anyhow::Result<&'static DatabaseConnection> {
    DB_CONN
        .get()
        .ok_or_else(|| anyhow::anyhow!("Database connection has not been initialized"))
}

pub fn db_file_paths(config: &crate::shared::config::Config) -> Vec<PathBuf> {
    vec![
        crate::shared::config::get_database_path(config),
        config.execution_log_path(),
    ]
}

#[cfg(test)]
pub async fn test_connection() -> (tempfile::TempDir, DatabaseConnection) {
    let dir = tempfile::tempdir().unwrap();
    let conn = connect(&dir.path().join("league.db")).await.unwrap();
    (dir, conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{ConnectionTrait, DatabaseBackend, Statement};

    #[test]
    fn test_build_sqlite_url() {
        let url = build_sqlite_url(Path::new("/tmp/x/league.db")).unwrap();
        assert_eq!(url, "sqlite:///tmp/x/league.db?mode=rwc");
    }

    #[tokio::test]
    async fn test_bootstrap_is_idempotent() {
        let (dir, conn) = test_connection().await;
        bootstrap_schema(&conn).await.unwrap();
        let again = connect(&dir.path().join("league.db")).await.unwrap();
        let rows = again
            .query_all(Statement::from_string(
                DatabaseBackend::Sqlite,
                "SELECT name FROM sqlite_master WHERE type='table' AND name LIKE 'a1%'".to_string(),
            ))
            .await
            .unwrap();
        assert_eq!(rows.len(), 10);
    }
}
