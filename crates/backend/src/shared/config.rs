use chrono::{NaiveDate, Timelike};
use contracts::enums::RankingKind;
use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub paths: PathsConfig,
    pub webdriver: WebDriverConfig,
    pub bi: BiConfig,
    pub commercial_month: CommercialMonthConfig,
    pub gamification: GamificationConfig,
    pub business_hours: BusinessHoursConfig,
    pub ranking: RankingConfig,
    pub whatsapp: WhatsAppConfig,
    pub schedule: ScheduleConfig,
    pub server: ServerConfig,
    /// Каталог, относительно которого разрешаются пути
    #[serde(skip)]
    pub base_dir: PathBuf,
    /// Откуда взята конфигурация; логируется после инициализации tracing
    #[serde(skip)]
    pub source: ConfigSource,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConfigSource {
    Explicit(PathBuf),
    NextToExecutable(PathBuf),
    CurrentDir(PathBuf),
    #[default]
    Embedded,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Explicit(p) => write!(f, "{} (--config)", p.display()),
            ConfigSource::NextToExecutable(p) => write!(f, "{} (next to executable)", p.display()),
            ConfigSource::CurrentDir(p) => write!(f, "{} (current directory)", p.display()),
            ConfigSource::Embedded => write!(f, "embedded default configuration"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    pub execution_log_path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "data/league.db".into(),
            execution_log_path: "data/execution_log.db".into(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PathsConfig {
    pub data_dir: String,
    pub downloads_dir: String,
    pub output_dir: String,
    pub backups_dir: String,
    pub logs_dir: String,
    pub contacts_file: String,
    pub holidays_file: String,
    pub logo_candidates: Vec<String>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".into(),
            downloads_dir: "downloads".into(),
            output_dir: "data".into(),
            backups_dir: "backups".into(),
            logs_dir: "logs".into(),
            contacts_file: "vendedores_contato.csv".into(),
            holidays_file: "data/feriados.csv".into(),
            logo_candidates: vec![
                "logo_empresa.png".into(),
                "logo_empresa.jpg".into(),
                "logo_empresa.jpeg".into(),
            ],
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct WebDriverConfig {
    pub url: String,
    pub headless: bool,
}

impl Default for WebDriverConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9515".into(),
            headless: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BiConfig {
    pub url: String,
    pub email: String,
    /// Имя переменной окружения с паролем BI
    pub password_env: String,
    pub enabled: bool,
    pub default_wait_seconds: u64,
    pub post_download_wait_seconds: u64,
    pub download_attempts: u32,
    pub retry_wait_seconds: u64,
    pub widget_title: String,
}

impl Default for BiConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            email: String::new(),
            password_env: "LEAGUE_BI_PASSWORD".into(),
            enabled: true,
            default_wait_seconds: 15,
            post_download_wait_seconds: 30,
            download_attempts: 3,
            retry_wait_seconds: 40,
            widget_title: "Meta por vendedor".into(),
        }
    }
}

impl BiConfig {
    pub fn password(&self) -> Option<String> {
        std::env::var(&self.password_env)
            .ok()
            .filter(|p| !p.is_empty())
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CommercialMonthConfig {
    pub start_day: u32,
    pub end_day: u32,
}

impl Default for CommercialMonthConfig {
    fn default() -> Self {
        Self {
            start_day: 26,
            end_day: 25,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GamificationConfig {
    pub campaign_start: String,
    pub ignored_stores: Vec<String>,
    pub company_name: String,
    pub producer_signature: String,
    /// Дополнительные национальные праздники, "dd/mm/YYYY"
    pub custom_holidays: Vec<String>,
}

impl Default for GamificationConfig {
    fn default() -> Self {
        Self {
            campaign_start: "2024-12-29".into(),
            ignored_stores: vec!["18".into(), "30".into()],
            company_name: "Nossa Loja".into(),
            producer_signature: "Produzido por Sales League".into(),
            custom_holidays: Vec::new(),
        }
    }
}

impl GamificationConfig {
    pub fn campaign_start_date(&self) -> anyhow::Result<NaiveDate> {
        NaiveDate::parse_from_str(self.campaign_start.trim(), "%Y-%m-%d").map_err(|e| {
            anyhow::anyhow!("invalid campaign_start '{}': {}", self.campaign_start, e)
        })
    }

    /// Нераспознанные даты пропускаются с предупреждением
    pub fn custom_holiday_dates(&self) -> Vec<NaiveDate> {
        self.custom_holidays
            .iter()
            .filter_map(|s| match NaiveDate::parse_from_str(s.trim(), "%d/%m/%Y") {
                Ok(d) => Some(d),
                Err(_) => {
                    tracing::warn!("Ignoring invalid custom holiday: {}", s);
                    None
                }
            })
            .collect()
    }

    pub fn is_ignored_store(&self, store: &str) -> bool {
        let store = store.trim();
        !store.is_empty() && self.ignored_stores.iter().any(|s| s.trim() == store)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BusinessHoursConfig {
    pub start_hour: u32,
    pub end_hour: u32,
    pub increment_per_hour: u32,
}

impl Default for BusinessHoursConfig {
    fn default() -> Self {
        Self {
            start_hour: 8,
            end_hour: 18,
            increment_per_hour: 10,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RankingConfig {
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub daily_image: String,
    pub weekly_image: String,
    pub monthly_image: String,
    pub points_image: String,
    pub daily_page_size: usize,
    pub periodic_page_size: usize,
    pub points_page_size: usize,
    pub device_scale: u32,
    pub settle_ms: u64,
}

impl RankingConfig {
    /// Имя файла изображения для вида рейтинга
    pub fn image_file(&self, kind: RankingKind) -> &str {
        match kind {
            RankingKind::Daily => &self.daily_image,
            RankingKind::Weekly => &self.weekly_image,
            RankingKind::Monthly => &self.monthly_image,
            RankingKind::Points => &self.points_image,
        }
    }
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            viewport_width: 1080,
            viewport_height: 1080,
            daily_image: "ranking_vendedor.png".into(),
            weekly_image: "ranking_semanal.png".into(),
            monthly_image: "ranking_mensal.png".into(),
            points_image: "ranking_pontos.png".into(),
            daily_page_size: 14,
            periodic_page_size: 12,
            points_page_size: 12,
            device_scale: 2,
            settle_ms: 600,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct WhatsAppConfig {
    pub enabled: bool,
    pub groups: Vec<String>,
    pub profile_dir: String,
    pub login_timeout_seconds: u64,
    pub pause_between_images_seconds: u64,
    pub pause_between_groups_seconds: u64,
    pub send_daily_ranking: bool,
    pub send_seller_rankings: bool,
    pub send_individual: bool,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            groups: vec!["Informações Comercial NL".into()],
            profile_dir: "whatsapp_session".into(),
            login_timeout_seconds: 60,
            pause_between_images_seconds: 5,
            pause_between_groups_seconds: 5,
            send_daily_ranking: true,
            send_seller_rankings: true,
            send_individual: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ScheduleConfig {
    pub crons: Vec<String>,
    pub check_interval_seconds: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            crons: vec!["0 30 10 * * Mon-Sat".into(), "0 30 16 * * Mon-Sat".into()],
            check_interval_seconds: 60,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".into(),
        }
    }
}

/// Конфигурация по умолчанию, встроенная в бинарник
const DEFAULT_CONFIG: &str = r#"
[database]
path = "data/league.db"
execution_log_path = "data/execution_log.db"

[paths]
data_dir = "data"
output_dir = "data"

[gamification]
campaign_start = "2024-12-29"
ignored_stores = ["18", "30"]

[whatsapp]
enabled = false
"#;

/// Загрузка конфигурации из config.toml
///
/// Порядок поиска:
/// 1. Явный путь (`--config`)
/// 2. Рядом с исполняемым файлом (production)
/// 3. Текущий каталог
/// 4. Встроенная конфигурация по умолчанию
///
/// Вызывается до инициализации tracing, поэтому ничего не логирует:
/// источник сохраняется в `Config::source`.
pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<Config> {
    if let Some(path) = explicit {
        return load_from_file(path, ConfigSource::Explicit(path.to_path_buf()));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let config_path = exe_dir.join("config.toml");
            if config_path.exists() {
                return load_from_file(&config_path, ConfigSource::NextToExecutable(config_path.clone()));
            }
        }
    }

    let cwd_config = std::env::current_dir()?.join("config.toml");
    if cwd_config.exists() {
        return load_from_file(&cwd_config, ConfigSource::CurrentDir(cwd_config.clone()));
    }

    let mut config: Config = toml::from_str(DEFAULT_CONFIG)?;
    config.base_dir = std::env::current_dir()?;
    config.source = ConfigSource::Embedded;
    Ok(config)
}

fn load_from_file(path: &Path, source: ConfigSource) -> anyhow::Result<Config> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("cannot read {}: {}", path.display(), e))?;
    let mut config: Config = toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("invalid config {}: {}", path.display(), e))?;
    let base = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or(std::env::current_dir()?);
    config.base_dir = base;
    config.source = source;
    Ok(config)
}

impl Config {
    /// Разрешает путь из конфигурации относительно каталога конфигурации
    pub fn resolve(&self, path: &str) -> PathBuf {
        let p = Path::new(path);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.base_dir.join(p)
        }
    }

    pub fn data_dir(&self) -> PathBuf {
        self.resolve(&self.paths.data_dir)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.resolve(&self.paths.output_dir)
    }

    pub fn downloads_dir(&self) -> PathBuf {
        self.resolve(&self.paths.downloads_dir)
    }

    pub fn backups_dir(&self) -> PathBuf {
        self.resolve(&self.paths.backups_dir)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.resolve(&self.paths.logs_dir)
    }

    pub fn contacts_file(&self) -> PathBuf {
        self.resolve(&self.paths.contacts_file)
    }

    pub fn holidays_file(&self) -> PathBuf {
        self.resolve(&self.paths.holidays_file)
    }

    pub fn execution_log_path(&self) -> PathBuf {
        self.resolve(&self.database.execution_log_path)
    }
}

static CONFIG: OnceCell<Config> = OnceCell::new();

/// Сохраняет загруженную конфигурацию для HTTP-обработчиков
pub fn init_config(config: Config) -> anyhow::Result<()> {
    CONFIG
        .set(config)
        .map_err(|_| anyhow::anyhow!("Configuration already initialized"))
}

pub fn get_config() -> anyhow::Result<&'static Config> {
    CONFIG
        .get()
        .ok_or_else(|| anyhow::anyhow!("Configuration has not been initialized"))
}

/// Путь к файлу БД из конфигурации
pub fn get_database_path(config: &Config) -> PathBuf {
    config.resolve(&config.database.path)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Ночные запуски: ничего не отправляется
    Batch,
    Interactive,
}

impl ExecutionMode {
    pub fn detect(now: chrono::NaiveDateTime) -> Self {
        Self::resolve(std::env::var("EXECUTION_MODE").ok().as_deref(), now.hour())
    }

    fn resolve(env_value: Option<&str>, hour: u32) -> Self {
        if let Some(value) = env_value {
            match value.trim().to_uppercase().as_str() {
                "" | "NONE" | "FALSE" | "0" => {}
                "BATCH" => return ExecutionMode::Batch,
                _ => return ExecutionMode::Interactive,
            }
        }
        if hour >= 20 || hour < 6 {
            ExecutionMode::Batch
        } else {
            ExecutionMode::Interactive
        }
    }
}
