//! Подключение к WebDriver (chromedriver) для выгрузки BI, снимков карточек и WhatsApp Web.

use fantoccini::{Client, ClientBuilder};
use serde_json::{json, Map, Value};
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum AutomationError {
    #[error("webdriver session failed: {0}")]
    Session(#[from] fantoccini::error::NewSessionError),
    #[error("webdriver command failed: {0}")]
    Command(#[from] fantoccini::error::CmdError),
    #[error("timed out waiting for {0}")]
    Timeout(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Other(String),
}

/// Параметры запуска Chrome
#[derive(Debug, Clone, Default)]
pub struct BrowserOptions {
    pub headless: bool,
    pub window: Option<(u32, u32)>,
    pub device_scale: Option<u32>,
    /// Постоянный профиль (сессия WhatsApp Web)
    pub user_data_dir: Option<PathBuf>,
    pub download_dir: Option<PathBuf>,
}

impl BrowserOptions {
    pub fn capabilities(&self) -> Map<String, Value> {
        let mut args: Vec<String> = vec![
            "--no-sandbox".into(),
            "--disable-dev-shm-usage".into(),
            "--hide-scrollbars".into(),
        ];
        if self.headless {
            args.push("--headless=new".into());
        }
        if let Some((w, h)) = self.window {
            args.push(format!("--window-size={},{}", w, h));
        }
        if let Some(scale) = self.device_scale {
            args.push(format!("--force-device-scale-factor={}", scale));
        }
        if let Some(dir) = &self.user_data_dir {
            args.push(format!("--user-data-dir={}", dir.display()));
        }

        let mut chrome = Map::new();
        chrome.insert("args".into(), json!(args));
        if let Some(dir) = &self.download_dir {
            chrome.insert(
                "prefs".into(),
                json!({
                    "download.default_directory": dir.display().to_string(),
                    "download.prompt_for_download": false,
                    "safebrowsing.enabled": true,
                }),
            );
        }

        let mut caps = Map::new();
        caps.insert("browserName".into(), json!("chrome"));
        caps.insert("goog:chromeOptions".into(), Value::Object(chrome));
        caps
    }
}

pub async fn connect(webdriver_url: &str, options: &BrowserOptions) -> Result<Client, AutomationError> {
    tracing::debug!("BROWSER | connecting to {}", webdriver_url);
    let client = ClientBuilder::native()
        .capabilities(options.capabilities())
        .connect(webdriver_url)
        .await?;
    Ok(client)
}

/// Символ клавиши Enter для send_keys
pub fn enter_key() -> String {
    let enter: char = fantoccini::key::Key::Enter.into();
    enter.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities_carry_chrome_args() {
        let opts = BrowserOptions {
            headless: true,
            window: Some((1080, 1920)),
            device_scale: Some(2),
            user_data_dir: None,
            download_dir: Some(PathBuf::from("/tmp/dl")),
        };
        let caps = opts.capabilities();
        let chrome = &caps["goog:chromeOptions"];
        let args: Vec<String> = serde_json::from_value(chrome["args"].clone()).unwrap();
        assert!(args.contains(&"--headless=new".to_string()));
        assert!(args.contains(&"--window-size=1080,1920".to_string()));
        assert!(args.contains(&"--force-device-scale-factor=2".to_string()));
        assert_eq!(chrome["prefs"]["download.default_directory"], "/tmp/dl");
    }
}
