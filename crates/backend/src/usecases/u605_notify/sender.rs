use async_trait::async_trait;
use std::path::PathBuf;

/// Канал доставки рейтингов и личных сообщений
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// true, если хотя бы одно изображение дошло хотя бы до одной группы
    async fn send_images(&self, groups: &[String], images: &[PathBuf], caption: &str) -> bool;

    async fn send_text(&self, phone: &str, text: &str) -> bool;
}

/// Только пишет в лог, что было бы отправлено
pub struct DryRunSender;

#[async_trait]
impl MessageSender for DryRunSender {
    async fn send_images(&self, groups: &[String], images: &[PathBuf], caption: &str) -> bool {
        for group in groups {
            tracing::info!(
                "NOTIFY | [dry-run] {} image(s) to '{}' with caption: {}",
                images.len(),
                group,
                caption
            );
        }
        true
    }

    async fn send_text(&self, phone: &str, text: &str) -> bool {
        tracing::info!("NOTIFY | [dry-run] message to {}: {}", phone, text.replace('\n', " "));
        true
    }
}
