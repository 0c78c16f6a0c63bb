/// Форматирует число с разделителями тысяч (точками): 1234567 -> "1.234.567"
pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push('.');
        }
        result.push(ch);
    }
    result.chars().rev().collect()
}

/// Денежная сумма в реалах без копеек: `R$ 1.234`
pub fn format_currency(value: f64) -> String {
    if !value.is_finite() {
        return "R$ 0".to_string();
    }
    let rounded = value.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("R$ {}{}", sign, format_number(rounded.abs() as usize))
}

/// Процент с одним знаком после запятой: `87.5%`
pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(42), "42");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1.000");
        assert_eq!(format_number(1234567), "1.234.567");
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(1234.4), "R$ 1.234");
        assert_eq!(format_currency(1234.6), "R$ 1.235");
        assert_eq!(format_currency(0.0), "R$ 0");
        assert_eq!(format_currency(-1500.0), "R$ -1.500");
        assert_eq!(format_currency(f64::NAN), "R$ 0");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(87.54), "87.5%");
        assert_eq!(format_percent(100.0), "100.0%");
    }
}
