use serde::{Deserialize, Serialize};

/// Виды рейтингов, которые рендерятся в изображения
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankingKind {
    Daily,
    Weekly,
    Monthly,
    Points,
}

impl RankingKind {
    pub fn code(&self) -> &'static str {
        match self {
            RankingKind::Daily => "daily",
            RankingKind::Weekly => "weekly",
            RankingKind::Monthly => "monthly",
            RankingKind::Points => "points",
        }
    }

    /// Порядок рендеринга изображений
    pub fn all() -> Vec<RankingKind> {
        vec![
            RankingKind::Points,
            RankingKind::Daily,
            RankingKind::Weekly,
            RankingKind::Monthly,
        ]
    }

    /// Имя HTML-шаблона карточки
    pub fn template_name(&self) -> &'static str {
        match self {
            RankingKind::Daily => "ranking_diario.html",
            RankingKind::Weekly => "ranking_semanal.html",
            RankingKind::Monthly => "ranking_mensal.html",
            RankingKind::Points => "ranking_pontos.html",
        }
    }

    /// Заголовок карточки
    pub fn title(&self) -> &'static str {
        match self {
            RankingKind::Daily => "Ranking Vendedores • Diário",
            RankingKind::Weekly => "🏆 RANKING SEMANAL",
            RankingKind::Monthly => "📅 RANKING MENSAL",
            RankingKind::Points => "🏆 QUADRO DE MEDALHAS",
        }
    }

    /// Страницы недельного и месячного рейтинга всегда получают суффикс `_pN`
    pub fn always_paged(&self) -> bool {
        matches!(self, RankingKind::Weekly | RankingKind::Monthly)
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().as_str() {
            "daily" => Some(RankingKind::Daily),
            "weekly" => Some(RankingKind::Weekly),
            "monthly" => Some(RankingKind::Monthly),
            "points" => Some(RankingKind::Points),
            _ => None,
        }
    }
}
