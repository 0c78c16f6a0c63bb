use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static LOJA_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^loja\s*[:.\-]?\s*").expect("valid regex"));

/// Убирает диакритику (NFKD), приводит к верхнему регистру и обрезает пробелы
pub fn normalize_header(s: &str) -> String {
    s.nfkd()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
        .collect::<String>()
        .to_uppercase()
        .trim()
        .to_string()
}

/// Первая буква каждого слова заглавная, остальные строчные
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_is_letter = false;
    for ch in s.chars() {
        if ch.is_alphabetic() {
            if prev_is_letter {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(ch);
            prev_is_letter = false;
        }
    }
    out
}

/// Имя продавца из таблицы: без префикса "Loja:", в Title Case
pub fn clean_seller_name(raw: &str) -> String {
    let trimmed = raw.trim();
    let stripped = LOJA_PREFIX.replace(trimmed, "");
    title_case(stripped.trim())
}

/// Число в бразильском формате: "R$ 1.234,56" -> 1234.56
pub fn parse_br_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .replace("R$", "")
        .replace('%', "")
        .replace('\u{a0}', "")
        .replace('.', "")
        .replace(',', ".")
        .split_whitespace()
        .collect();
    match cleaned.to_lowercase().as_str() {
        "" | "none" | "nan" => None,
        s => s.parse::<f64>().ok().filter(|v| v.is_finite()),
    }
}

/// Телефон в формате E.164: только цифры, +55 если код страны отсутствует
pub fn normalize_phone(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    if (digits.len() == 10 || digits.len() == 11) && !digits.starts_with("55") {
        Some(format!("+55{}", digits))
    } else {
        Some(format!("+{}", digits))
    }
}

/// Ключ продавца в истории уведомлений
pub fn person_key(name: &str) -> String {
    name.trim().to_uppercase()
}

/// Ключ в файле контактов
pub fn contact_key(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header(" Meta Diária "), "META DIARIA");
        assert_eq!(normalize_header("Funcionário"), "FUNCIONARIO");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("joão DA silva"), "João Da Silva");
        assert_eq!(title_case("ana-maria"), "Ana-Maria");
    }

    #[test]
    fn test_clean_seller_name() {
        assert_eq!(clean_seller_name("  LOJA: maria souza "), "Maria Souza");
        assert_eq!(clean_seller_name("loja-12"), "12");
        assert_eq!(clean_seller_name("carlos"), "Carlos");
    }

    #[test]
    fn test_parse_br_number() {
        assert_eq!(parse_br_number("R$ 1.234,56"), Some(1234.56));
        assert_eq!(parse_br_number("87,5%"), Some(87.5));
        assert_eq!(parse_br_number("1\u{a0}000"), Some(1000.0));
        assert_eq!(parse_br_number("nan"), None);
        assert_eq!(parse_br_number(""), None);
        assert_eq!(parse_br_number("abc"), None);
    }

    #[test]
    fn test_normalize_phone() {
        assert_eq!(normalize_phone("(11) 98765-4321").as_deref(), Some("+5511987654321"));
        assert_eq!(normalize_phone("5511987654321").as_deref(), Some("+5511987654321"));
        assert_eq!(normalize_phone("1133334444").as_deref(), Some("+551133334444"));
        assert_eq!(normalize_phone("-"), None);
    }
}
