//! Когда и что отправлять: окна смен, особые рейтинги дня, поздравления.
//! Отметки об отправке хранятся в a108, поэтому повторный запуск ничего не дублирует.

use anyhow::Result;
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike, Weekday};
use contracts::enums::{MessageCategory, RankingKind, TrophyKind};
use rand::seq::SliceRandom;
use sea_orm::DatabaseConnection;
use std::collections::BTreeSet;

use crate::domain::a108_notification::repository::{self as sent, Channel};
use crate::shared::calendar::iso_week_key;
use crate::shared::text::person_key;

const DAILY_SUBJECT: &str = "daily";

/// Смена групповой рассылки: утро (10-12) или вечер (16-19)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shift {
    Morning,
    Afternoon,
}

impl Shift {
    pub fn code(&self) -> &'static str {
        match self {
            Shift::Morning => "M",
            Shift::Afternoon => "T",
        }
    }

    pub fn for_hour(hour: u32) -> Option<Self> {
        match hour {
            10..=11 => Some(Shift::Morning),
            16..=18 => Some(Shift::Afternoon),
            _ => None,
        }
    }
}

/// Особый рейтинг дня: очки в понедельник, месяц в среду, неделя в пятницу
pub fn special_of_day(date: NaiveDate) -> Option<RankingKind> {
    match date.weekday() {
        Weekday::Mon => Some(RankingKind::Points),
        Weekday::Wed => Some(RankingKind::Monthly),
        Weekday::Fri => Some(RankingKind::Weekly),
        _ => None,
    }
}

pub fn category_for(kind: RankingKind, hour: u32) -> MessageCategory {
    match kind {
        RankingKind::Daily => MessageCategory::daily_for_hour(hour),
        RankingKind::Weekly => MessageCategory::Weekly,
        RankingKind::Monthly => MessageCategory::Monthly,
        RankingKind::Points => MessageCategory::Points,
    }
}

pub fn active_categories(date: NaiveDate, hour: u32) -> Vec<MessageCategory> {
    let mut categories = vec![MessageCategory::daily_for_hour(hour)];
    if let Some(kind) = special_of_day(date) {
        categories.push(category_for(kind, hour));
    }
    categories
}

/// Подпись по часу, когда в базе нет шаблонов
pub fn dynamic_caption(now: NaiveDateTime) -> String {
    let options: &[&str] = match now.hour() {
        9..=10 => &["*Bom dia, Time!* Largada dada!", "*Start do Dia:* Quem saiu na frente?"],
        11..=12 => &["*Giro do Meio-Dia:* Confira a parcial!", "*Resumo da Manhã:* Líderes do turno!"],
        14..=15 => &["*Modo Turbo:* Reta final do dia!", "*Sprint de Vendas:* Acelera!"],
        18..=19 => &["*Fechamento:* Veja os números finais.", "*Fim de Expediente:* Missão cumprida!"],
        _ => &[],
    };
    match options.choose(&mut rand::thread_rng()) {
        Some(text) => text.to_string(),
        None => format!("📊 *Ranking Atualizado* ({})", now.format("%H:%M")),
    }
}

pub fn congratulation(seller: &str, trophies: &[TrophyKind], points: i64) -> String {
    let mut labels: Vec<&str> = trophies.iter().map(|t| t.display_name()).collect();
    labels.sort_unstable();
    labels.dedup();
    format!(
        "🌟 *PARABÉNS, {}!* 🌟\n\n\
         Você conquistou o troféu de *{}* hoje!\n\
         Sua pontuação acumulada nas Olimpíadas é de *{} pontos*.\n\n\
         Continue acelerando! 🚀",
        seller.trim().to_uppercase(),
        labels.join(" e "),
        points
    )
}

fn trophy_set(trophies: &[TrophyKind]) -> BTreeSet<&'static str> {
    trophies.iter().map(|t| t.code()).collect()
}

pub struct NotificationPolicy {
    db: DatabaseConnection,
}

impl NotificationPolicy {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn daily_reference(date: NaiveDate, shift: Shift) -> String {
        format!("{}_{}", date, shift.code())
    }

    /// Смена для групповой рассылки, если она ещё не отправлена сегодня
    pub async fn daily_shift(&self, now: NaiveDateTime) -> Result<Option<Shift>> {
        let Some(shift) = Shift::for_hour(now.hour()) else {
            return Ok(None);
        };
        let reference = Self::daily_reference(now.date(), shift);
        if sent::was_sent(&self.db, Channel::Group, DAILY_SUBJECT, &reference).await? {
            return Ok(None);
        }
        Ok(Some(shift))
    }

    pub async fn mark_daily(&self, now: NaiveDateTime, shift: Shift) -> Result<()> {
        let reference = Self::daily_reference(now.date(), shift);
        sent::mark_sent(&self.db, Channel::Group, DAILY_SUBJECT, &reference, now, None).await
    }

    /// Особый рейтинг ещё не отправлялся на этой ISO-неделе
    pub async fn weekly_pending(&self, kind: RankingKind, now: NaiveDateTime) -> Result<bool> {
        let week = iso_week_key(now.date());
        Ok(!sent::was_sent(&self.db, Channel::Group, kind.code(), &week).await?)
    }

    pub async fn mark_weekly(&self, kind: RankingKind, now: NaiveDateTime) -> Result<()> {
        let week = iso_week_key(now.date());
        sent::mark_sent(&self.db, Channel::Group, kind.code(), &week, now, None).await
    }

    /// Есть трофей, о котором продавцу сегодня ещё не сообщали
    pub async fn individual_due(&self, seller: &str, now: NaiveDateTime, trophies: &[TrophyKind]) -> Result<bool> {
        if trophies.is_empty() {
            return Ok(false);
        }
        let previous = sent::payload(
            &self.db,
            Channel::Individual,
            &person_key(seller),
            &now.date().to_string(),
        )
        .await?
        .unwrap_or_default();
        let notified: BTreeSet<&str> = previous.split(',').filter(|s| !s.is_empty()).collect();
        let fresh: Vec<&str> = trophy_set(trophies)
            .into_iter()
            .filter(|code| !notified.contains(code))
            .collect();
        if !fresh.is_empty() {
            tracing::info!("NOTIFY | individual message due for {}: {:?}", person_key(seller), fresh);
        }
        Ok(!fresh.is_empty())
    }

    pub async fn mark_individual(&self, seller: &str, now: NaiveDateTime, trophies: &[TrophyKind]) -> Result<()> {
        let payload = trophy_set(trophies).into_iter().collect::<Vec<_>>().join(",");
        sent::mark_sent(
            &self.db,
            Channel::Individual,
            &person_key(seller),
            &now.date().to_string(),
            now,
            Some(&payload),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::test_connection;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 15, 0)
            .unwrap()
    }

    #[test]
    fn test_shift_windows() {
        assert_eq!(Shift::for_hour(9), None);
        assert_eq!(Shift::for_hour(10), Some(Shift::Morning));
        assert_eq!(Shift::for_hour(11), Some(Shift::Morning));
        assert_eq!(Shift::for_hour(12), None);
        assert_eq!(Shift::for_hour(16), Some(Shift::Afternoon));
        assert_eq!(Shift::for_hour(18), Some(Shift::Afternoon));
        assert_eq!(Shift::for_hour(19), None);
    }

    #[test]
    fn test_special_and_categories() {
        // 2025-01-13 is a Monday
        assert_eq!(special_of_day(at(2025, 1, 13, 10).date()), Some(RankingKind::Points));
        assert_eq!(special_of_day(at(2025, 1, 14, 10).date()), None);
        assert_eq!(special_of_day(at(2025, 1, 15, 10).date()), Some(RankingKind::Monthly));
        assert_eq!(special_of_day(at(2025, 1, 17, 10).date()), Some(RankingKind::Weekly));
        assert_eq!(
            active_categories(at(2025, 1, 17, 17).date(), 17),
            vec![MessageCategory::DailyAfternoon, MessageCategory::Weekly]
        );
        assert_eq!(
            active_categories(at(2025, 1, 14, 10).date(), 10),
            vec![MessageCategory::DailyMorning]
        );
    }

    #[test]
    fn test_dynamic_caption_fallback() {
        assert_eq!(dynamic_caption(at(2025, 1, 13, 13)), "📊 *Ranking Atualizado* (13:15)");
        assert!(dynamic_caption(at(2025, 1, 13, 9)).starts_with('*'));
    }

    #[test]
    fn test_congratulation_text() {
        let text = congratulation(" ana ", &[TrophyKind::Silver, TrophyKind::Bronze], 14);
        assert_eq!(
            text,
            "🌟 *PARABÉNS, ANA!* 🌟\n\nVocê conquistou o troféu de *Bronze e Prata* hoje!\n\
             Sua pontuação acumulada nas Olimpíadas é de *14 pontos*.\n\nContinue acelerando! 🚀"
        );
    }

    #[tokio::test]
    async fn test_daily_shift_sent_once() {
        let (_dir, db) = test_connection().await;
        let policy = NotificationPolicy::new(db);
        let now = at(2025, 1, 14, 10);
        assert_eq!(policy.daily_shift(now).await.unwrap(), Some(Shift::Morning));
        policy.mark_daily(now, Shift::Morning).await.unwrap();
        assert_eq!(policy.daily_shift(now).await.unwrap(), None);
        assert_eq!(policy.daily_shift(at(2025, 1, 14, 17)).await.unwrap(), Some(Shift::Afternoon));
        assert_eq!(policy.daily_shift(at(2025, 1, 14, 14)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_weekly_pending_per_iso_week() {
        let (_dir, db) = test_connection().await;
        let policy = NotificationPolicy::new(db);
        let friday = at(2025, 1, 17, 17);
        assert!(policy.weekly_pending(RankingKind::Weekly, friday).await.unwrap());
        policy.mark_weekly(RankingKind::Weekly, friday).await.unwrap();
        assert!(!policy.weekly_pending(RankingKind::Weekly, at(2025, 1, 18, 10)).await.unwrap());
        assert!(policy.weekly_pending(RankingKind::Points, friday).await.unwrap());
        assert!(policy.weekly_pending(RankingKind::Weekly, at(2025, 1, 24, 17)).await.unwrap());
    }

    #[tokio::test]
    async fn test_individual_only_for_new_trophies() {
        let (_dir, db) = test_connection().await;
        let policy = NotificationPolicy::new(db);
        let now = at(2025, 1, 17, 17);
        assert!(!policy.individual_due("Ana", now, &[]).await.unwrap());
        assert!(policy.individual_due("Ana", now, &[TrophyKind::Bronze]).await.unwrap());
        policy.mark_individual("Ana", now, &[TrophyKind::Bronze]).await.unwrap();
        assert!(!policy.individual_due(" ana ", now, &[TrophyKind::Bronze]).await.unwrap());
        assert!(policy
            .individual_due("ANA", now, &[TrophyKind::Silver, TrophyKind::Bronze])
            .await
            .unwrap());
        assert!(policy
            .individual_due("Ana", at(2025, 1, 18, 10), &[TrophyKind::Bronze])
            .await
            .unwrap());
    }
}
