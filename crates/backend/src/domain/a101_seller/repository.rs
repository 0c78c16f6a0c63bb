use anyhow::Result;
use contracts::enums::SellerRole;
use sea_orm::entity::prelude::*;
use sea_orm::{
    ConnectionTrait, DatabaseBackend, EntityTrait, FromQueryResult, QueryFilter, QueryOrder,
    Statement,
};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a101_seller")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub code: Option<String>,
    pub store: Option<String>,
    pub role: String,
    pub is_active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn role(&self) -> SellerRole {
        SellerRole::parse_or_default(&self.role)
    }

    pub fn is_manager(&self) -> bool {
        self.role() == SellerRole::Manager
    }
}

/// Регистрирует продавца; при конфликте имени обновляет магазин и роль и активирует
pub async fn upsert(
    db: &DatabaseConnection,
    name: &str,
    store: Option<&str>,
    role: SellerRole,
) -> Result<()> {
    let sql = r#"
        INSERT INTO a101_seller (name, store, role, is_active)
        VALUES (?, ?, ?, 1)
        ON CONFLICT(name) DO UPDATE SET
            store = COALESCE(excluded.store, a101_seller.store),
            role = excluded.role,
            is_active = 1
    "#;
    db.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        sql,
        [
            name.into(),
            store.map(str::to_string).into(),
            role.code().into(),
        ],
    ))
    .await?;
    Ok(())
}

/// Регистрирует менеджера с кодом
pub async fn upsert_manager(
    db: &DatabaseConnection,
    name: &str,
    code: Option<&str>,
    store: Option<&str>,
) -> Result<()> {
    let sql = r#"
        INSERT INTO a101_seller (name, code, store, role, is_active)
        VALUES (?, ?, ?, 'MANAGER', 1)
        ON CONFLICT(name) DO UPDATE SET
            code = COALESCE(excluded.code, a101_seller.code),
            store = COALESCE(excluded.store, a101_seller.store),
            role = 'MANAGER',
            is_active = 1
    "#;
    db.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        sql,
        [
            name.into(),
            code.map(str::to_string).into(),
            store.map(str::to_string).into(),
        ],
    ))
    .await?;
    Ok(())
}

pub async fn find(db: &DatabaseConnection, name: &str) -> Result<Option<Model>> {
    Ok(Entity::find()
        .filter(Column::Name.eq(name))
        .one(db)
        .await?)
}

/// Все активные, включая менеджеров
pub async fn list_active(db: &DatabaseConnection) -> Result<Vec<Model>> {
    Ok(Entity::find()
        .filter(Column::IsActive.eq(true))
        .order_by_asc(Column::Name)
        .all(db)
        .await?)
}

/// Активные продавцы без менеджеров
pub async fn list_rankable(db: &DatabaseConnection) -> Result<Vec<Model>> {
    Ok(Entity::find()
        .filter(Column::IsActive.eq(true))
        .filter(Column::Role.ne(SellerRole::Manager.code()))
        .order_by_asc(Column::Name)
        .all(db)
        .await?)
}

pub async fn list_all(db: &DatabaseConnection) -> Result<Vec<Model>> {
    Ok(Entity::find().order_by_asc(Column::Id).all(db).await?)
}

#[derive(Debug, FromQueryResult)]
struct StoreRow {
    store: String,
}

/// Магазины активных продавцов
pub async fn distinct_stores(db: &DatabaseConnection) -> Result<Vec<String>> {
    let sql = r#"
        SELECT DISTINCT store FROM a101_seller
        WHERE is_active = 1 AND store IS NOT NULL AND store <> ''
        ORDER BY store
    "#;
    let rows = StoreRow::find_by_statement(Statement::from_string(
        DatabaseBackend::Sqlite,
        sql.to_string(),
    ))
    .all(db)
    .await?;
    Ok(rows.into_iter().map(|r| r.store).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::test_connection;

    #[tokio::test]
    async fn test_upsert_updates_store_and_reactivates() {
        let (_dir, db) = test_connection().await;
        upsert(&db, "Ana", Some("7"), SellerRole::Seller).await.unwrap();
        db.execute(Statement::from_string(
            DatabaseBackend::Sqlite,
            "UPDATE a101_seller SET is_active = 0".to_string(),
        ))
        .await
        .unwrap();
        upsert(&db, "Ana", Some("9"), SellerRole::Seller).await.unwrap();

        let ana = find(&db, "Ana").await.unwrap().unwrap();
        assert_eq!(ana.store.as_deref(), Some("9"));
        assert!(ana.is_active);
        assert_eq!(list_all(&db).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rankable_excludes_managers() {
        let (_dir, db) = test_connection().await;
        upsert(&db, "Ana", Some("7"), SellerRole::Seller).await.unwrap();
        upsert(&db, "Bruno", Some("7"), SellerRole::Seller).await.unwrap();
        upsert_manager(&db, "Bruno", Some("G1"), None).await.unwrap();

        let rankable = list_rankable(&db).await.unwrap();
        assert_eq!(rankable.len(), 1);
        assert_eq!(rankable[0].name, "Ana");
        assert_eq!(list_active(&db).await.unwrap().len(), 2);

        let bruno = find(&db, "Bruno").await.unwrap().unwrap();
        assert!(bruno.is_manager());
        assert_eq!(bruno.code.as_deref(), Some("G1"));
        assert_eq!(bruno.store.as_deref(), Some("7"));
        assert_eq!(distinct_stores(&db).await.unwrap(), vec!["7".to_string()]);
    }
}
