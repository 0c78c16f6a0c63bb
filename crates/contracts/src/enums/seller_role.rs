use serde::{Deserialize, Serialize};

/// Роль сотрудника магазина
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SellerRole {
    #[default]
    Seller,
    /// Менеджеры не участвуют в рейтингах
    Manager,
}

impl SellerRole {
    pub fn code(&self) -> &'static str {
        match self {
            SellerRole::Seller => "SELLER",
            SellerRole::Manager => "MANAGER",
        }
    }

    pub fn all() -> Vec<SellerRole> {
        vec![SellerRole::Seller, SellerRole::Manager]
    }

    /// Парсинг из строки (принимает и португальские названия из кадровых файлов)
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_uppercase().as_str() {
            "SELLER" | "VENDEDOR" => Some(SellerRole::Seller),
            "MANAGER" | "GERENTE" => Some(SellerRole::Manager),
            _ => None,
        }
    }

    /// Как `from_code`, но пустое или неизвестное значение даёт продавца
    pub fn parse_or_default(code: &str) -> Self {
        Self::from_code(code).unwrap_or_default()
    }
}

impl std::fmt::Display for SellerRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}
