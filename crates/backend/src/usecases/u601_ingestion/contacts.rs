use anyhow::Result;
use contracts::enums::SellerRole;
use std::collections::HashMap;
use std::path::Path;

use super::spreadsheet::SheetRow;
use crate::shared::text::{contact_key, normalize_phone};

/// Контакт продавца из vendedores_contato.csv
#[derive(Debug, Clone, PartialEq)]
pub struct Contact {
    pub name: String,
    pub phone: Option<String>,
    pub store: Option<String>,
    pub role: SellerRole,
}

/// Контакты по ключу `lower(trim(name))`
#[derive(Debug, Clone, Default)]
pub struct ContactBook {
    by_key: HashMap<String, Contact>,
}

impl ContactBook {
    pub fn get(&self, name: &str) -> Option<&Contact> {
        self.by_key.get(&contact_key(name))
    }

    pub fn phone_for(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|c| c.phone.as_deref())
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    pub fn contacts(&self) -> impl Iterator<Item = &Contact> {
        self.by_key.values()
    }
}

/// UTF-8, при ошибке Latin-1 (каждый байт как символ)
fn decode(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.trim_start_matches('\u{feff}').to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

fn find_column(headers: &[String], needles: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| needles.iter().any(|n| h.contains(n)))
}

pub fn parse_contacts(content: &str) -> Result<ContactBook> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();

    let (Some(name_col), Some(phone_col)) = (
        find_column(&headers, &["nome", "vendedor"]),
        find_column(&headers, &["telefone", "whatsapp"]),
    ) else {
        tracing::warn!("INGESTION | contacts file has no name/phone columns: {:?}", headers);
        return Ok(ContactBook::default());
    };
    let store_col = find_column(&headers, &["loja"]);
    let role_col = find_column(&headers, &["tipo", "cargo"]);

    let mut book = ContactBook::default();
    for record in reader.records() {
        let record = record?;
        let field = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let Some(name) = field(Some(name_col)) else {
            continue;
        };
        let contact = Contact {
            phone: field(Some(phone_col)).and_then(|p| normalize_phone(&p)),
            store: field(store_col),
            role: field(role_col)
                .map(|r| SellerRole::parse_or_default(&r))
                .unwrap_or_default(),
            name: name.clone(),
        };
        book.by_key.insert(contact_key(&name), contact);
    }
    Ok(book)
}

/// Отсутствующий файл даёт пустую книгу
pub fn load_contacts(path: &Path) -> Result<ContactBook> {
    if !path.exists() {
        tracing::warn!("INGESTION | contacts file not found: {}", path.display());
        return Ok(ContactBook::default());
    }
    let bytes = std::fs::read(path)?;
    let book = parse_contacts(&decode(&bytes))?;
    tracing::info!("INGESTION | {} contacts loaded", book.len());
    Ok(book)
}

/// Проставляет магазин и роль из контактов
pub fn enrich(rows: &mut [SheetRow], book: &ContactBook) {
    for row in rows.iter_mut() {
        if let Some(contact) = book.get(&row.name) {
            row.store = contact.store.clone();
            row.role = contact.role;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Nome Vendedor;Telefone WhatsApp;Loja;Cargo\n\
                          Ana Souza;(11) 98765-4321;7;Vendedor\n\
                          Marcos;11 3333-4444;7;GERENTE\n\
                          ;123;1;\n";

    #[test]
    fn test_parse_contacts() {
        let book = parse_contacts(SAMPLE).unwrap();
        assert_eq!(book.len(), 2);
        let ana = book.get("  ANA SOUZA ").unwrap();
        assert_eq!(ana.phone.as_deref(), Some("+5511987654321"));
        assert_eq!(ana.store.as_deref(), Some("7"));
        assert_eq!(ana.role, SellerRole::Seller);
        assert_eq!(book.get("marcos").unwrap().role, SellerRole::Manager);
    }

    #[test]
    fn test_missing_phone_column_gives_empty_book() {
        let book = parse_contacts("nome;loja\nAna;7\n").unwrap();
        assert!(book.is_empty());
    }

    #[test]
    fn test_latin1_fallback() {
        let bytes = b"nome;telefone\nJo\xe3o;11987654321\n";
        let book = parse_contacts(&decode(bytes)).unwrap();
        assert!(book.get("joão").is_some());
    }

    #[test]
    fn test_enrich_sets_store_and_role() {
        let book = parse_contacts(SAMPLE).unwrap();
        let mut rows = vec![SheetRow {
            name: "Marcos".into(),
            goal: 100.0,
            sales: 50.0,
            attainment: 50.0,
            store: None,
            role: SellerRole::Seller,
        }];
        enrich(&mut rows, &book);
        assert_eq!(rows[0].store.as_deref(), Some("7"));
        assert_eq!(rows[0].role, SellerRole::Manager);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let book = load_contacts(Path::new("/nonexistent/contacts.csv")).unwrap();
        assert!(book.is_empty());
    }
}
