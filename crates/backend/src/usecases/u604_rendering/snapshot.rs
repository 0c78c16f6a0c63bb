//! Снимок HTML-карточки в PNG через headless Chrome.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::shared::browser::{self, AutomationError, BrowserOptions};
use crate::shared::config::{RankingConfig, WebDriverConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

#[async_trait]
pub trait Snapshotter: Send + Sync {
    /// Рендерит HTML в PNG по пути `target` и возвращает этот путь
    async fn snapshot(&self, html: &str, target: &Path, viewport: Viewport) -> Result<PathBuf, AutomationError>;
}

/// file:// URL для локального пути; путям Windows нужен ведущий слэш
pub fn file_url(path: &Path) -> std::io::Result<String> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    let normalized = absolute.to_string_lossy().replace('\\', "/");
    let prefix = if normalized.starts_with('/') { "" } else { "/" };
    Ok(format!("file://{}{}", prefix, normalized))
}

pub struct WebDriverSnapshotter {
    webdriver_url: String,
    device_scale: u32,
    settle: Duration,
}

impl WebDriverSnapshotter {
    pub fn new(webdriver: &WebDriverConfig, ranking: &RankingConfig) -> Self {
        Self {
            webdriver_url: webdriver.url.clone(),
            device_scale: ranking.device_scale.max(1),
            settle: Duration::from_millis(ranking.settle_ms),
        }
    }

    async fn capture(&self, page: &Path, target: &Path, viewport: Viewport) -> Result<(), AutomationError> {
        let options = BrowserOptions {
            headless: true,
            window: Some((viewport.width, viewport.height)),
            device_scale: Some(self.device_scale),
            ..Default::default()
        };
        let client = browser::connect(&self.webdriver_url, &options).await?;
        let outcome = async {
            client.set_window_size(viewport.width, viewport.height).await?;
            client.goto(&file_url(page)?).await?;
            tokio::time::sleep(self.settle).await;
            let png = client.screenshot().await?;
            std::fs::write(target, png)?;
            Ok::<(), AutomationError>(())
        }
        .await;
        if let Err(e) = client.close().await {
            tracing::debug!("RANKING | browser close failed: {}", e);
        }
        outcome
    }
}

#[async_trait]
impl Snapshotter for WebDriverSnapshotter {
    async fn snapshot(&self, html: &str, target: &Path, viewport: Viewport) -> Result<PathBuf, AutomationError> {
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let page = target.with_extension("html");
        std::fs::write(&page, html)?;
        let outcome = self.capture(&page, target, viewport).await;
        if let Err(e) = std::fs::remove_file(&page) {
            tracing::debug!("RANKING | cannot remove {}: {}", page.display(), e);
        }
        outcome?;
        tracing::info!(
            "RANKING | image saved {} ({}x{})",
            target.display(),
            viewport.width,
            viewport.height
        );
        Ok(target.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_url() {
        assert_eq!(
            file_url(Path::new("/tmp/out/ranking.html")).unwrap(),
            "file:///tmp/out/ranking.html"
        );
    }
}
