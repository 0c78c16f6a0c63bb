//! Цвета полосы прогресса и бейджа строки рейтинга.

use contracts::usecases::u603_rankings::RowStyle;

use crate::shared::config::BusinessHoursConfig;

pub fn gradient(attainment: f64) -> (&'static str, &'static str) {
    if attainment >= 120.0 {
        ("#5eead4", "#0ea5e9")
    } else if attainment >= 100.0 {
        ("#4ade80", "#16a34a")
    } else if attainment >= 80.0 {
        ("#facc15", "#f97316")
    } else {
        ("#f87171", "#ef4444")
    }
}

/// Бейдж относительно ожидаемого к этому часу выполнения: (label, bg, text)
pub fn badge(attainment: f64, band: f64) -> (&'static str, &'static str, &'static str) {
    if attainment > 100.0 {
        ("META BATIDA!", "#22c55e", "#052e16")
    } else if attainment >= band {
        ("DE ACORDO", "#0ea5e9", "#02182a")
    } else if attainment >= band * 0.8 {
        ("ATENÇÃO", "#facc15", "#341b00")
    } else {
        ("ABAIXO", "#f87171", "#2a0704")
    }
}

/// Ожидаемый процент выполнения к текущему часу рабочего дня
pub fn expected_band(hour: u32, hours: &BusinessHoursConfig) -> f64 {
    if hour < hours.start_hour {
        return 0.0;
    }
    if hour >= hours.end_hour {
        return 100.0;
    }
    let elapsed = (hour - hours.start_hour + 1) * hours.increment_per_hour;
    (elapsed as f64).min(100.0)
}

pub fn row_style(attainment: f64, band: f64) -> RowStyle {
    let (grad_start, grad_end) = gradient(attainment);
    let (badge_label, badge_bg, badge_text) = badge(attainment, band);
    RowStyle {
        bar_width: attainment.min(100.0),
        grad_start: grad_start.to_string(),
        grad_end: grad_end.to_string(),
        text_on_bar: if attainment >= 30.0 { "#03131f" } else { "#0f172a" }.to_string(),
        badge_label: badge_label.to_string(),
        badge_bg: badge_bg.to_string(),
        badge_text: badge_text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gradient_thresholds() {
        assert_eq!(gradient(120.0).0, "#5eead4");
        assert_eq!(gradient(100.0).0, "#4ade80");
        assert_eq!(gradient(80.0).0, "#facc15");
        assert_eq!(gradient(79.9).0, "#f87171");
    }

    #[test]
    fn test_badge_against_band() {
        assert_eq!(badge(100.5, 50.0).0, "META BATIDA!");
        assert_eq!(badge(100.0, 100.0).0, "DE ACORDO");
        assert_eq!(badge(40.0, 50.0).0, "ATENÇÃO");
        assert_eq!(badge(39.0, 50.0).0, "ABAIXO");
    }

    #[test]
    fn test_expected_band() {
        let hours = BusinessHoursConfig::default();
        assert_eq!(expected_band(7, &hours), 0.0);
        assert_eq!(expected_band(8, &hours), 10.0);
        assert_eq!(expected_band(12, &hours), 50.0);
        assert_eq!(expected_band(18, &hours), 100.0);
    }

    #[test]
    fn test_row_style_caps_bar() {
        let style = row_style(135.0, 100.0);
        assert_eq!(style.bar_width, 100.0);
        assert_eq!(style.text_on_bar, "#03131f");
        assert_eq!(row_style(10.0, 100.0).text_on_bar, "#0f172a");
    }
}
