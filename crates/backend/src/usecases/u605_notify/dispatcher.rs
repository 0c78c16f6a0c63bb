use anyhow::Result;
use chrono::{NaiveDateTime, Timelike};
use contracts::enums::RankingKind;
use sea_orm::DatabaseConnection;
use std::path::PathBuf;

use super::policy::{self, category_for, congratulation, dynamic_caption, NotificationPolicy, Shift};
use super::sender::MessageSender;
use crate::domain::{a106_holiday, a107_message_template};
use crate::shared::config::{ExecutionMode, WhatsAppConfig};
use crate::usecases::u601_ingestion::contacts::ContactBook;
use crate::usecases::u602_gamification::engine::SellerDaySummary;
use crate::usecases::u604_rendering::RankingImages;

/// Что нужно для одной рассылки
pub struct NotifyRequest<'a> {
    /// false при `--no-whatsapp`
    pub send_whatsapp: bool,
    pub mode: ExecutionMode,
    pub now: NaiveDateTime,
    pub images: &'a RankingImages,
    pub summary: &'a [SellerDaySummary],
    pub contacts: &'a ContactBook,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotifyReport {
    /// Причина, по которой ничего не отправлялось
    pub skipped: Option<&'static str>,
    pub daily: Option<Shift>,
    pub individual: usize,
    pub special: Option<RankingKind>,
}

pub struct Notifier<'a> {
    db: DatabaseConnection,
    config: WhatsAppConfig,
    sender: &'a dyn MessageSender,
    policy: NotificationPolicy,
}

fn existing(paths: &[PathBuf]) -> Vec<PathBuf> {
    paths.iter().filter(|p| p.is_file()).cloned().collect()
}

impl<'a> Notifier<'a> {
    pub fn new(db: DatabaseConnection, config: WhatsAppConfig, sender: &'a dyn MessageSender) -> Self {
        Self {
            policy: NotificationPolicy::new(db.clone()),
            db,
            config,
            sender,
        }
    }

    async fn caption(&self, kind: RankingKind, now: NaiveDateTime) -> String {
        let category = category_for(kind, now.hour());
        match a107_message_template::service::next_caption(&self.db, category).await {
            Ok(Some(text)) => text,
            Ok(None) => dynamic_caption(now),
            Err(e) => {
                tracing::warn!("NOTIFY | caption lookup failed: {:#}", e);
                dynamic_caption(now)
            }
        }
    }

    /// Причина не отправлять ничего сегодня
    async fn blocked(&self, request: &NotifyRequest<'_>) -> Result<Option<&'static str>> {
        if !request.send_whatsapp {
            return Ok(Some("disabled by --no-whatsapp"));
        }
        if !self.config.enabled {
            return Ok(Some("whatsapp disabled in config"));
        }
        if request.mode == ExecutionMode::Batch {
            return Ok(Some("batch mode"));
        }
        if a106_holiday::service::is_notification_holiday(&self.db, request.now.date(), None, None).await? {
            return Ok(Some("holiday"));
        }
        Ok(None)
    }

    async fn send_daily(&self, request: &NotifyRequest<'_>, special: Option<RankingKind>) -> Result<Option<Shift>> {
        let now = request.now;
        let images = existing(request.images.get(RankingKind::Daily));
        if !self.config.send_daily_ranking || images.is_empty() {
            tracing::info!("NOTIFY | daily ranking: nothing to send");
            return Ok(None);
        }
        let Some(shift) = self.policy.daily_shift(now).await? else {
            tracing::info!("NOTIFY | daily ranking: outside the window or already sent");
            return Ok(None);
        };
        if shift == Shift::Afternoon && special.is_some() {
            tracing::info!("NOTIFY | daily ranking: skipped, afternoon belongs to the special ranking");
            return Ok(None);
        }
        let caption = self.caption(RankingKind::Daily, now).await;
        if self.sender.send_images(&self.config.groups, &images, &caption).await {
            self.policy.mark_daily(now, shift).await?;
            tracing::info!("NOTIFY | daily ranking sent for shift {}", shift.code());
            return Ok(Some(shift));
        }
        tracing::warn!("NOTIFY | daily ranking was not delivered");
        Ok(None)
    }

    async fn send_individual(&self, request: &NotifyRequest<'_>) -> Result<usize> {
        if !self.config.send_individual || request.contacts.is_empty() {
            return Ok(0);
        }
        let now = request.now;
        let mut sent = 0;
        for entry in request.summary {
            if !self.policy.individual_due(&entry.name, now, &entry.trophies).await? {
                continue;
            }
            let Some(phone) = request.contacts.phone_for(&entry.name) else {
                tracing::debug!("NOTIFY | no phone for {}", entry.name);
                continue;
            };
            let text = congratulation(&entry.name, &entry.trophies, entry.points_month);
            if self.sender.send_text(phone, &text).await {
                self.policy.mark_individual(&entry.name, now, &entry.trophies).await?;
                sent += 1;
            }
        }
        Ok(sent)
    }

    async fn send_special(&self, request: &NotifyRequest<'_>, kind: RankingKind) -> Result<bool> {
        let now = request.now;
        if kind == RankingKind::Points && !self.config.send_seller_rankings {
            return Ok(false);
        }
        let images = existing(request.images.get(kind));
        if images.is_empty() {
            tracing::info!("NOTIFY | special {} ranking: no images", kind.code());
            return Ok(false);
        }
        if !self.policy.weekly_pending(kind, now).await? {
            tracing::info!("NOTIFY | special {} ranking already sent this week", kind.code());
            return Ok(false);
        }
        let caption = self.caption(kind, now).await;
        tracing::info!("NOTIFY | sending special {} ranking", kind.code());
        if self.sender.send_images(&self.config.groups, &images, &caption).await {
            self.policy.mark_weekly(kind, now).await?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Групповой дневной рейтинг, личные поздравления и особый рейтинг дня
    pub async fn notify_all(&self, request: &NotifyRequest<'_>) -> Result<NotifyReport> {
        if let Some(reason) = self.blocked(request).await? {
            tracing::info!("NOTIFY | notifications skipped: {}", reason);
            return Ok(NotifyReport {
                skipped: Some(reason),
                ..Default::default()
            });
        }

        a107_message_template::service::seed_defaults(&self.db).await?;
        let now = request.now;
        let special = policy::special_of_day(now.date());
        let categories: Vec<&str> = policy::active_categories(now.date(), now.hour())
            .iter()
            .map(|c| c.code())
            .collect();
        tracing::info!("NOTIFY | active categories: {}", categories.join(", "));

        // смена читается до того, как дневная отправка её отметит
        let shift = Shift::for_hour(now.hour());
        let mut report = NotifyReport {
            daily: self.send_daily(request, special).await?,
            ..Default::default()
        };
        report.individual = self.send_individual(request).await?;

        if let (Some(Shift::Afternoon), Some(kind)) = (shift, special) {
            if self.send_special(request, kind).await? {
                report.special = Some(kind);
            }
        }
        Ok(report)
    }
}
