//! Отправка через WhatsApp Web в браузере с постоянным профилем.

use async_trait::async_trait;
use fantoccini::error::CmdError;
use fantoccini::{elements::Element, Client, Locator};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::sender::MessageSender;
use crate::shared::browser::{self, AutomationError, BrowserOptions};
use crate::shared::config::{WebDriverConfig, WhatsAppConfig};
use crate::shared::text::normalize_phone;

const WHATSAPP_URL: &str = "https://web.whatsapp.com";
const SEARCH_BOX: &str = r#"div[contenteditable="true"][data-tab="3"]"#;
const MESSAGE_BOX: &str = r#"div[contenteditable="true"][data-tab="10"]"#;
const ATTACH_BUTTONS: [&str; 3] = [
    r#"span[data-icon="plus"]"#,
    r#"span[data-icon="attach-menu-plus"]"#,
    r#"div[title="Anexar"]"#,
];
const FILE_INPUT: &str = r#"input[type="file"][accept*="image"]"#;
const SEND_BUTTONS: [&str; 4] = [
    r#"span[data-icon="send"]"#,
    r#"button[aria-label="Enviar"]"#,
    r#"button[aria-label="Send"]"#,
    r#"span[data-testid="send"]"#,
];

pub struct WhatsAppWebSender {
    config: WhatsAppConfig,
    webdriver: WebDriverConfig,
    profile_dir: PathBuf,
}

async fn find_within(client: &Client, css: &str, secs: u64) -> Option<Element> {
    client
        .wait()
        .at_most(Duration::from_secs(secs))
        .for_element(Locator::Css(css))
        .await
        .ok()
}

impl WhatsAppWebSender {
    pub fn new(config: WhatsAppConfig, webdriver: WebDriverConfig, profile_dir: PathBuf) -> Self {
        Self {
            config,
            webdriver,
            profile_dir,
        }
    }

    async fn open_session(&self) -> Result<Client, AutomationError> {
        std::fs::create_dir_all(&self.profile_dir)?;
        let options = BrowserOptions {
            headless: self.webdriver.headless,
            window: Some((1366, 900)),
            user_data_dir: Some(self.profile_dir.clone()),
            ..Default::default()
        };
        browser::connect(&self.webdriver.url, &options).await
    }

    async fn wait_for_login(&self, client: &Client) -> Result<(), AutomationError> {
        client.goto(WHATSAPP_URL).await?;
        client
            .wait()
            .at_most(Duration::from_secs(self.config.login_timeout_seconds))
            .for_element(Locator::Css(SEARCH_BOX))
            .await
            .map_err(|e| match e {
                CmdError::WaitTimeout => AutomationError::Timeout("WhatsApp Web login".into()),
                other => other.into(),
            })?;
        tracing::info!("NOTIFY | WhatsApp Web is logged in");
        Ok(())
    }

    async fn open_group(&self, client: &Client, group: &str) -> Result<(), AutomationError> {
        let search = client.find(Locator::Css(SEARCH_BOX)).await?;
        search.click().await?;
        search.clear().await?;
        search.send_keys(group).await?;
        tokio::time::sleep(Duration::from_secs(2)).await;
        search.send_keys(&browser::enter_key()).await?;
        tokio::time::sleep(Duration::from_secs(2)).await;
        Ok(())
    }

    async fn send_caption(&self, client: &Client, caption: &str) -> Result<(), AutomationError> {
        let message_box = find_within(client, MESSAGE_BOX, 10)
            .await
            .ok_or_else(|| AutomationError::Timeout("message box".into()))?;
        message_box
            .send_keys(&format!("{}{}", caption, browser::enter_key()))
            .await?;
        tokio::time::sleep(Duration::from_secs(2)).await;
        Ok(())
    }

    /// Первая найденная кнопка отправки, иначе Enter в активный элемент
    async fn press_send(&self, client: &Client) -> Result<(), AutomationError> {
        for css in SEND_BUTTONS {
            if let Some(button) = find_within(client, css, 5).await {
                button.click().await?;
                return Ok(());
            }
        }
        tracing::warn!("NOTIFY | send button not found, pressing Enter");
        client
            .active_element()
            .await?
            .send_keys(&browser::enter_key())
            .await?;
        Ok(())
    }

    async fn send_image(&self, client: &Client, image: &Path) -> Result<(), AutomationError> {
        let absolute = std::fs::canonicalize(image)?;
        for css in ATTACH_BUTTONS {
            if let Ok(button) = client.find(Locator::Css(css)).await {
                button.click().await?;
                break;
            }
        }
        let input = find_within(client, FILE_INPUT, 5)
            .await
            .ok_or_else(|| AutomationError::Timeout("attachment input".into()))?;
        input.send_keys(&absolute.to_string_lossy()).await?;
        tokio::time::sleep(Duration::from_secs(3)).await;
        self.press_send(client).await
    }

    async fn deliver(&self, client: &Client, groups: &[String], images: &[PathBuf], caption: &str) -> Result<bool, AutomationError> {
        self.wait_for_login(client).await?;
        let mut any_sent = false;
        for group in groups {
            tracing::info!("NOTIFY | sending to group '{}'", group);
            if let Err(e) = self.open_group(client, group).await {
                tracing::error!("NOTIFY | group '{}' not found: {}", group, e);
                continue;
            }
            if !caption.is_empty() {
                if let Err(e) = self.send_caption(client, caption).await {
                    tracing::warn!("NOTIFY | caption failed for '{}': {}", group, e);
                }
            }

            let mut sent = 0;
            for (idx, image) in images.iter().enumerate() {
                if !image.is_file() {
                    continue;
                }
                tracing::info!(
                    "NOTIFY | [{}/{}] {} -> {}",
                    idx + 1,
                    images.len(),
                    image.display(),
                    group
                );
                match self.send_image(client, image).await {
                    Ok(()) => {
                        sent += 1;
                        tokio::time::sleep(Duration::from_secs(self.config.pause_between_images_seconds)).await;
                    }
                    Err(e) => tracing::error!("NOTIFY | image {} failed: {}", image.display(), e),
                }
            }
            tracing::info!("NOTIFY | group '{}': {}/{} images sent", group, sent, images.len());
            any_sent |= sent > 0;
            tokio::time::sleep(Duration::from_secs(self.config.pause_between_groups_seconds)).await;
        }
        Ok(any_sent)
    }

    async fn deliver_text(&self, client: &Client, phone: &str, text: &str) -> Result<(), AutomationError> {
        let digits = phone.trim_start_matches('+');
        let url = format!(
            "{}/send?phone={}&text={}",
            WHATSAPP_URL,
            digits,
            urlencoding::encode(text)
        );
        client.goto(&url).await?;
        client
            .wait()
            .at_most(Duration::from_secs(self.config.login_timeout_seconds))
            .for_element(Locator::Css(MESSAGE_BOX))
            .await
            .map_err(|e| match e {
                CmdError::WaitTimeout => AutomationError::Timeout("chat with contact".into()),
                other => other.into(),
            })?;
        tokio::time::sleep(Duration::from_secs(2)).await;
        self.press_send(client).await?;
        tokio::time::sleep(Duration::from_secs(2)).await;
        Ok(())
    }
}

#[async_trait]
impl MessageSender for WhatsAppWebSender {
    async fn send_images(&self, groups: &[String], images: &[PathBuf], caption: &str) -> bool {
        let client = match self.open_session().await {
            Ok(c) => c,
            Err(e) => {
                tracing::error!("NOTIFY | cannot start browser: {}", e);
                return false;
            }
        };
        let outcome = self.deliver(&client, groups, images, caption).await;
        if let Err(e) = client.close().await {
            tracing::debug!("NOTIFY | browser close failed: {}", e);
        }
        match outcome {
            Ok(any) => any,
            Err(e) => {
                tracing::error!("NOTIFY | WhatsApp delivery failed: {}", e);
                false
            }
        }
    }

    async fn send_text(&self, phone: &str, text: &str) -> bool {
        let Some(phone) = normalize_phone(phone) else {
            tracing::warn!("NOTIFY | invalid phone '{}'", phone);
            return false;
        };
        let client = match self.open_session().await {
            Ok(c) => c,
            Err(e) => {
                tracing::error!("NOTIFY | cannot start browser: {}", e);
                return false;
            }
        };
        let outcome = self.deliver_text(&client, &phone, text).await;
        if let Err(e) = client.close().await {
            tracing::debug!("NOTIFY | browser close failed: {}", e);
        }
        match outcome {
            Ok(()) => {
                tracing::info!("NOTIFY | message sent to {}", phone);
                true
            }
            Err(e) => {
                tracing::error!("NOTIFY | message to {} failed: {}", phone, e);
                false
            }
        }
    }
}
