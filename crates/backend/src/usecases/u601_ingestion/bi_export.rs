//! Выгрузка таблицы "Meta por vendedor" из BI через WebDriver.

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use fantoccini::error::CmdError;
use fantoccini::{elements::Element, Client, Locator};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::shared::browser::{self, AutomationError, BrowserOptions};
use crate::shared::config::{BiConfig, WebDriverConfig};

/// Сколько раз проверять папку загрузок и с каким интервалом
const DOWNLOAD_POLLS: u32 = 30;
const DOWNLOAD_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Источник файла с целями продавцов
#[async_trait]
pub trait SheetExporter: Send + Sync {
    /// Возвращает путь к скачанному файлу или None, если файл не появился
    async fn export(&self, target: &Path, force: bool) -> Result<Option<PathBuf>, AutomationError>;
}

/// Имя файла выгрузки за день: `MetaVendedor_{ddmm}.xlsx`
pub fn sheet_file_name(date: NaiveDate) -> String {
    format!("MetaVendedor_{}.xlsx", date.format("%d%m"))
}

pub struct BiExporter {
    bi: BiConfig,
    webdriver: WebDriverConfig,
    downloads_dir: PathBuf,
}

impl BiExporter {
    pub fn new(bi: BiConfig, webdriver: WebDriverConfig, downloads_dir: PathBuf) -> Self {
        Self {
            bi,
            webdriver,
            downloads_dir,
        }
    }

    fn wait(&self) -> Duration {
        Duration::from_secs(self.bi.default_wait_seconds)
    }

    async fn wait_for(
        &self,
        client: &Client,
        locator: Locator<'_>,
        what: &str,
    ) -> Result<Element, AutomationError> {
        client
            .wait()
            .at_most(self.wait())
            .for_element(locator)
            .await
            .map_err(|e| match e {
                CmdError::WaitTimeout => AutomationError::Timeout(what.to_string()),
                other => other.into(),
            })
    }

    /// Элемент, который может и не появиться
    async fn optional(client: &Client, locator: Locator<'_>, secs: u64) -> Option<Element> {
        client
            .wait()
            .at_most(Duration::from_secs(secs))
            .for_element(locator)
            .await
            .ok()
    }

    async fn login(&self, client: &Client) -> Result<(), AutomationError> {
        let password = self.bi.password().ok_or_else(|| {
            AutomationError::Other(format!(
                "BI password env var {} is not set",
                self.bi.password_env
            ))
        })?;

        client.goto(&self.bi.url).await?;
        let email = self.wait_for(client, Locator::Css("input[name='email']"), "email input").await?;
        email.send_keys(&self.bi.email).await?;
        let pass = self
            .wait_for(client, Locator::Css("input[name='password']"), "password input")
            .await?;
        pass.send_keys(&password).await?;

        match client.find(Locator::Id("logonButton")).await {
            Ok(button) => button.click().await?,
            Err(_) => pass.send_keys(&browser::enter_key()).await?,
        }
        tokio::time::sleep(Duration::from_secs(5)).await;

        if client.find(Locator::Css("[name='LogonForm']")).await.is_ok() {
            tracing::warn!("INGESTION | still on the BI login form, submitting via script");
            client.execute("on_submit('logon');", vec![]).await?;
            tokio::time::sleep(Duration::from_secs(5)).await;
        }

        let remote = Locator::XPath(
            "//a[contains(@href, \"on_submit('confirm')\") or contains(normalize-space(), 'Remover sessões remotas')]",
        );
        if let Some(link) = Self::optional(client, remote, 5).await {
            tracing::info!("INGESTION | confirming removal of remote BI sessions");
            link.click().await?;
            tokio::time::sleep(Duration::from_secs(self.bi.retry_wait_seconds)).await;
        }
        Ok(())
    }

    async fn export_widget(&self, client: &Client) -> Result<(), AutomationError> {
        let header_xpath = format!(
            "//div[contains(@class,'portlet-header') and contains(normalize-space(), '{}')]",
            self.bi.widget_title
        );
        let header = self
            .wait_for(client, Locator::XPath(&header_xpath), &self.bi.widget_title)
            .await?;
        let portlet = header
            .find(Locator::XPath("./ancestor::div[contains(@class,'portlet')][1]"))
            .await
            .unwrap_or(header);
        let handle =
            serde_json::to_value(&portlet).map_err(|e| AutomationError::Other(e.to_string()))?;
        client
            .execute("arguments[0].scrollIntoView({block: 'center'});", vec![handle])
            .await?;

        let more = portlet.find(Locator::XPath(".//div[@title='Mais']")).await?;
        more.click().await?;
        self.wait_for(
            client,
            Locator::XPath("//div[@class='yfDropMenuTitle' and normalize-space()='Exportar']"),
            "Exportar menu",
        )
        .await?
        .click()
        .await?;
        self.wait_for(
            client,
            Locator::XPath("//div[@class='yfDropMenuTitle' and normalize-space()='XLSX']"),
            "XLSX menu",
        )
        .await?
        .click()
        .await?;

        let confirm = Locator::XPath(
            "//span[contains(@class, 'submitMidHighlightText') and normalize-space()='Exportar']",
        );
        if let Some(button) = Self::optional(client, confirm, 5).await {
            button.click().await?;
        }
        Ok(())
    }
}

#[async_trait]
impl SheetExporter for BiExporter {
    async fn export(&self, target: &Path, force: bool) -> Result<Option<PathBuf>, AutomationError> {
        std::fs::create_dir_all(&self.downloads_dir)?;
        let options = BrowserOptions {
            headless: self.webdriver.headless,
            window: Some((1920, 1080)),
            download_dir: Some(self.downloads_dir.clone()),
            ..Default::default()
        };
        let client = browser::connect(&self.webdriver.url, &options).await?;

        let outcome = async {
            self.login(&client).await?;
            tracing::info!("INGESTION | logged in to BI, exporting '{}'", self.bi.widget_title);
            self.export_widget(&client).await
        }
        .await;
        if outcome.is_ok() {
            tokio::time::sleep(Duration::from_secs(self.bi.post_download_wait_seconds)).await;
        }
        if let Err(e) = client.close().await {
            tracing::debug!("INGESTION | browser close failed: {}", e);
        }
        outcome?;

        Ok(move_latest_download(
            &self.downloads_dir,
            target,
            force,
            DOWNLOAD_POLLS,
            DOWNLOAD_POLL_INTERVAL,
        )
        .await?)
    }
}

/// Самый свежий .xlsx в папке, кроме временных файлов Excel (`~$`)
pub fn newest_xlsx(dir: &Path, prefix: Option<&str>) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;
    entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            let name = p.file_name().and_then(|n| n.to_str()).unwrap_or("");
            p.is_file()
                && !name.starts_with("~$")
                && name.to_lowercase().ends_with(".xlsx")
                && prefix.map(|pre| name.starts_with(pre)).unwrap_or(true)
        })
        .max_by_key(|p| {
            std::fs::metadata(p)
                .and_then(|m| m.modified())
                .unwrap_or(std::time::SystemTime::UNIX_EPOCH)
        })
}

/// Куда положить файл: с force старый уходит в `.bak`, без force новый получает суффикс `_HHMMSS`
fn prepare_target(target: &Path, force: bool) -> std::io::Result<PathBuf> {
    if !target.exists() {
        return Ok(target.to_path_buf());
    }
    if force {
        let backup = target.with_extension("xlsx.bak");
        std::fs::rename(target, &backup)?;
        tracing::info!("INGESTION | previous sheet kept as {}", backup.display());
        Ok(target.to_path_buf())
    } else {
        let stem = target
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("MetaVendedor");
        let renamed = target.with_file_name(format!(
            "{}_{}.xlsx",
            stem,
            Local::now().format("%H%M%S")
        ));
        Ok(renamed)
    }
}

/// Ждёт появления скачанного файла и переносит его в папку данных
pub async fn move_latest_download(
    downloads: &Path,
    target: &Path,
    force: bool,
    polls: u32,
    interval: Duration,
) -> std::io::Result<Option<PathBuf>> {
    for attempt in 1..=polls {
        if let Some(source) = newest_xlsx(downloads, None) {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let destination = prepare_target(target, force)?;
            if std::fs::rename(&source, &destination).is_err() {
                std::fs::copy(&source, &destination)?;
                std::fs::remove_file(&source)?;
            }
            tracing::info!(
                "INGESTION | downloaded {} -> {}",
                source.display(),
                destination.display()
            );
            return Ok(Some(destination));
        }
        tracing::debug!("INGESTION | waiting for download ({}/{})", attempt, polls);
        if attempt < polls {
            tokio::time::sleep(interval).await;
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sheet_file_name() {
        let d = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        assert_eq!(sheet_file_name(d), "MetaVendedor_0703.xlsx");
    }

    #[tokio::test]
    async fn test_move_with_force_keeps_backup() {
        let dir = tempfile::tempdir().unwrap();
        let downloads = dir.path().join("downloads");
        let data = dir.path().join("data");
        std::fs::create_dir_all(&downloads).unwrap();
        std::fs::create_dir_all(&data).unwrap();
        std::fs::write(downloads.join("~$lock.xlsx"), b"tmp").unwrap();
        std::fs::write(downloads.join("export.xlsx"), b"new").unwrap();
        let target = data.join("MetaVendedor_0703.xlsx");
        std::fs::write(&target, b"old").unwrap();

        let moved = move_latest_download(&downloads, &target, true, 1, Duration::ZERO)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(moved, target);
        assert_eq!(std::fs::read(&target).unwrap(), b"new");
        assert_eq!(std::fs::read(data.join("MetaVendedor_0703.xlsx.bak")).unwrap(), b"old");
        assert!(downloads.join("~$lock.xlsx").exists());
    }

    #[tokio::test]
    async fn test_move_without_force_adds_suffix() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("export.xlsx"), b"new").unwrap();
        let target = dir.path().join("data").join("MetaVendedor_0703.xlsx");
        std::fs::create_dir_all(target.parent().unwrap()).unwrap();
        std::fs::write(&target, b"old").unwrap();

        let moved = move_latest_download(dir.path(), &target, false, 1, Duration::ZERO)
            .await
            .unwrap()
            .unwrap();
        assert_ne!(moved, target);
        assert!(moved
            .file_name()
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("MetaVendedor_0703_"));
        assert_eq!(std::fs::read(&target).unwrap(), b"old");
    }

    #[tokio::test]
    async fn test_nothing_downloaded() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("MetaVendedor_0703.xlsx");
        let moved = move_latest_download(dir.path(), &target, true, 2, Duration::ZERO)
            .await
            .unwrap();
        assert!(moved.is_none());
    }
}
