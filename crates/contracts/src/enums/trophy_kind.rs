use serde::{Deserialize, Serialize};

/// Виды трофеев (медалей) лиги продаж
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrophyKind {
    /// Дневная цель выполнена
    Bronze,
    /// Недельная цель выполнена (выдаётся в пятницу)
    Silver,
    /// Месячная цель выполнена
    Gold,
    /// Месячная цель выполнена на 105%
    #[serde(rename = "BONUS_1")]
    Bonus1,
    /// Месячная цель выполнена на 110%
    #[serde(rename = "BONUS_2")]
    Bonus2,
}

impl TrophyKind {
    pub fn code(&self) -> &'static str {
        match self {
            TrophyKind::Bronze => "BRONZE",
            TrophyKind::Silver => "SILVER",
            TrophyKind::Gold => "GOLD",
            TrophyKind::Bonus1 => "BONUS_1",
            TrophyKind::Bonus2 => "BONUS_2",
        }
    }

    /// Подпись для сообщений и карточек
    pub fn display_name(&self) -> &'static str {
        match self {
            TrophyKind::Bronze => "Bronze",
            TrophyKind::Silver => "Prata",
            TrophyKind::Gold => "Ouro",
            TrophyKind::Bonus1 => "Bônus 105%",
            TrophyKind::Bonus2 => "Bônus 110%",
        }
    }

    pub fn points(&self) -> i32 {
        match self {
            TrophyKind::Bronze => 1,
            TrophyKind::Silver => 3,
            TrophyKind::Gold => 10,
            TrophyKind::Bonus1 => 3,
            TrophyKind::Bonus2 => 5,
        }
    }

    /// Порог выполнения цели в процентах
    pub fn threshold_pct(&self) -> f64 {
        match self {
            TrophyKind::Bronze | TrophyKind::Silver | TrophyKind::Gold => 100.0,
            TrophyKind::Bonus1 => 105.0,
            TrophyKind::Bonus2 => 110.0,
        }
    }

    pub fn is_bonus(&self) -> bool {
        matches!(self, TrophyKind::Bonus1 | TrophyKind::Bonus2)
    }

    pub fn all() -> Vec<TrophyKind> {
        vec![
            TrophyKind::Bronze,
            TrophyKind::Silver,
            TrophyKind::Gold,
            TrophyKind::Bonus1,
            TrophyKind::Bonus2,
        ]
    }

    /// Месячные трофеи в порядке проверки порогов
    pub fn monthly() -> [TrophyKind; 3] {
        [TrophyKind::Gold, TrophyKind::Bonus1, TrophyKind::Bonus2]
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_uppercase().as_str() {
            "BRONZE" => Some(TrophyKind::Bronze),
            "SILVER" | "PRATA" => Some(TrophyKind::Silver),
            "GOLD" | "OURO" => Some(TrophyKind::Gold),
            "BONUS_1" => Some(TrophyKind::Bonus1),
            "BONUS_2" => Some(TrophyKind::Bonus2),
            _ => None,
        }
    }
}

impl std::fmt::Display for TrophyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_roundtrip_and_legacy_names() {
        for kind in TrophyKind::all() {
            assert_eq!(TrophyKind::from_code(kind.code()), Some(kind));
        }
        assert_eq!(TrophyKind::from_code("prata"), Some(TrophyKind::Silver));
        assert_eq!(TrophyKind::from_code("OURO"), Some(TrophyKind::Gold));
        assert_eq!(TrophyKind::from_code("PLATINA"), None);
    }

    #[test]
    fn test_serde_uses_codes() {
        let json = serde_json::to_string(&TrophyKind::Bonus1).unwrap();
        assert_eq!(json, "\"BONUS_1\"");
        let kind: TrophyKind = serde_json::from_str("\"SILVER\"").unwrap();
        assert_eq!(kind, TrophyKind::Silver);
    }
}
