use anyhow::{Context, Result};
use sea_orm::DatabaseConnection;
use std::path::Path;

use crate::domain::a101_seller;
use crate::shared::text::title_case;

/// Менеджер из кадрового файла `nome;codigo;loja`
#[derive(Debug, Clone, PartialEq)]
pub struct ManagerEntry {
    pub name: String,
    pub code: Option<String>,
    pub store: Option<String>,
}

pub fn parse_managers(content: &str) -> Result<Vec<ManagerEntry>> {
    let first_line = content.lines().next().unwrap_or("");
    let delimiter = if first_line.contains(';') { b';' } else { b',' };
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();
    let column = |name: &str, fallback: usize| {
        headers.iter().position(|h| h == name).unwrap_or(fallback)
    };
    let (name_col, code_col, store_col) = (column("nome", 0), column("codigo", 1), column("loja", 2));

    let mut out = Vec::new();
    for record in reader.records() {
        let record = record?;
        let field = |idx: usize| {
            record
                .get(idx)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let Some(name) = field(name_col) else {
            continue;
        };
        out.push(ManagerEntry {
            name: title_case(&name),
            code: field(code_col),
            store: field(store_col),
        });
    }
    Ok(out)
}

/// Регистрирует менеджеров с ролью MANAGER; возвращает количество записей
pub async fn register_managers(db: &DatabaseConnection, path: &Path) -> Result<usize> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read managers file {}", path.display()))?;
    let managers = parse_managers(&content)?;
    for manager in &managers {
        a101_seller::repository::upsert_manager(
            db,
            &manager.name,
            manager.code.as_deref(),
            manager.store.as_deref(),
        )
        .await?;
    }
    tracing::info!("MANAGERS | {} managers registered from {}", managers.len(), path.display());
    Ok(managers.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::test_connection;
    use contracts::enums::SellerRole;

    #[test]
    fn test_parse_semicolon_and_comma() {
        let a = parse_managers("nome;codigo;loja\nNATALIA FERNANDES SOARES;C01;1\n").unwrap();
        let b = parse_managers("nome,codigo,loja\nnatalia fernandes soares, C01 ,1\n").unwrap();
        assert_eq!(a, b);
        assert_eq!(a[0].name, "Natalia Fernandes Soares");
        assert_eq!(a[0].code.as_deref(), Some("C01"));
    }

    #[tokio::test]
    async fn test_register_turns_seller_into_manager() {
        let (dir, db) = test_connection().await;
        a101_seller::repository::upsert(&db, "Jorge Marcelino Filho", Some("36"), SellerRole::Seller)
            .await
            .unwrap();
        let path = dir.path().join("gerentes.csv");
        std::fs::write(&path, "nome;codigo;loja\nJORGE MARCELINO FILHO;G64;36\n").unwrap();

        assert_eq!(register_managers(&db, &path).await.unwrap(), 1);
        let seller = a101_seller::repository::find(&db, "Jorge Marcelino Filho")
            .await
            .unwrap()
            .unwrap();
        assert!(seller.is_manager());
        assert_eq!(seller.code.as_deref(), Some("G64"));
        assert!(a101_seller::repository::list_rankable(&db).await.unwrap().is_empty());
    }
}
