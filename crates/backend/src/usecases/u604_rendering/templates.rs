//! HTML-шаблоны карточек рейтинга и страницы дашборда, встроенные в бинарник.

use anyhow::{Context, Result};
use minijinja::{AutoEscape, Environment};
use serde::Serialize;

const TEMPLATES: &[(&str, &str)] = &[
    ("_card_base.html", include_str!("../../../templates/_card_base.html")),
    ("ranking_diario.html", include_str!("../../../templates/ranking_diario.html")),
    ("ranking_semanal.html", include_str!("../../../templates/ranking_semanal.html")),
    ("ranking_mensal.html", include_str!("../../../templates/ranking_mensal.html")),
    ("ranking_pontos.html", include_str!("../../../templates/ranking_pontos.html")),
    ("dashboard.html", include_str!("../../../templates/dashboard.html")),
];

pub struct TemplateRenderer {
    env: Environment<'static>,
}

impl TemplateRenderer {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|name| {
            if name.ends_with(".html") {
                AutoEscape::Html
            } else {
                AutoEscape::None
            }
        });
        for (name, source) in TEMPLATES {
            env.add_template(name, source)
                .with_context(|| format!("invalid template {}", name))?;
        }
        Ok(Self { env })
    }

    pub fn render<S: Serialize>(&self, name: &str, context: S) -> Result<String> {
        let template = self
            .env
            .get_template(name)
            .with_context(|| format!("unknown template {}", name))?;
        template
            .render(context)
            .with_context(|| format!("cannot render {}", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base() -> serde_json::Value {
        json!({
            "title": "Ranking",
            "subtitle": "hoje",
            "viewport_width": 1080,
            "viewport_height": 1080,
            "show_paging": true,
            "page": 2,
            "total_pages": 3,
            "company_name": "Loja <Centro>",
            "producer_signature": "sig",
            "generated_at": "07/03/2025 10:30",
        })
    }

    #[test]
    fn test_all_templates_compile() {
        let renderer = TemplateRenderer::new().unwrap();
        for (name, _) in TEMPLATES {
            assert!(renderer.env.get_template(name).is_ok(), "{}", name);
        }
    }

    #[test]
    fn test_daily_card_escapes_and_pages() {
        let renderer = TemplateRenderer::new().unwrap();
        let mut ctx = base();
        ctx["hero_cards"] = json!([{ "label": "Qtd. Vendedores", "value": "2" }]);
        ctx["expected_band"] = json!("30.0%");
        ctx["ranking"] = json!([{
            "rank": 1, "name": "Ana <b>", "store": "7",
            "bar_width": 100.0, "grad_start": "#4ade80", "grad_end": "#16a34a", "text_on_bar": "#03131f",
            "attainment_label": "120.0%", "goal_label": "R$ 100", "sales_label": "R$ 120",
            "badge_label": "META BATIDA!", "badge_bg": "#22c55e", "badge_text": "#052e16"
        }]);
        let html = renderer.render("ranking_diario.html", &ctx).unwrap();
        assert!(html.contains("Ana &lt;b&gt;"));
        assert!(html.contains("Loja &lt;Centro&gt;"));
        assert!(html.contains("Página 2 de 3"));
        assert!(html.contains("META BATIDA!"));
    }

    #[test]
    fn test_weekly_status_dots() {
        let renderer = TemplateRenderer::new().unwrap();
        let mut ctx = base();
        ctx["business_days"] = json!("5.5");
        ctx["participants"] = json!(1);
        ctx["ranking"] = json!([{
            "rank": 1, "name": "Bruno", "store": "",
            "bar_width": 50.0, "grad_start": "a", "grad_end": "b", "text_on_bar": "c",
            "attainment_label": "50.0%", "goal_label": "R$ 550", "sales_label": "R$ 275",
            "week_status": [true, false, null, null, null, null],
            "goals_hit_label": "1.0"
        }]);
        let html = renderer.render("ranking_semanal.html", &ctx).unwrap();
        assert_eq!(html.matches("day hit").count(), 1);
        assert_eq!(html.matches("day miss").count(), 1);
        assert_eq!(html.matches("day future").count(), 4);
    }

    #[test]
    fn test_empty_points_page_has_placeholder() {
        let renderer = TemplateRenderer::new().unwrap();
        let mut ctx = base();
        ctx["ranking"] = json!([]);
        let html = renderer.render("ranking_pontos.html", &ctx).unwrap();
        assert!(html.contains("Nenhuma medalha"));
    }

    #[test]
    fn test_dashboard_page() {
        let renderer = TemplateRenderer::new().unwrap();
        let ctx = json!({
            "title": "NL CHAMPIONS LEAGUE",
            "company_name": "Nossa Loja",
            "period": { "date_from": "2025-02-26", "date_to": "2025-03-07" },
            "sellers": ["Ana", "Bruno"],
            "stores": ["01"],
            "images": [{ "url": "/images/ranking_vendedor.png", "label": "Diário" }],
            "generated_at": "07/03/2025 10:30",
        });
        let html = renderer.render("dashboard.html", &ctx).unwrap();
        assert!(html.contains("<title>NL CHAMPIONS LEAGUE</title>"));
        assert!(html.contains("value=\"2025-02-26\""));
        assert!(html.contains("<option value=\"Bruno\">"));
        assert!(html.contains("alt=\"Diário\""));
        assert!(html.contains("${v ?? \"\"}"));
        assert!(!html.contains("Nenhuma imagem"));
    }
}
