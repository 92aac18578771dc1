use crate::workflows::crawl::{Locator, LocatorParseError, WaitPolicy};
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_LOGIN_URL: &str = "https://login.microsoftonline.com/78aac226-2f03-4b4d-9037-b46d56c55210/oauth2/v2.0/authorize?response_type=code&client_id=c728a481-39c5-4916-86a8-0c8bc65d42b6&state=NX5VeTNTSFhPZENoeTduQ1FYY3pITmxKN1ZvVDJYeHJmLXZmQ2FpYllNY1hi%3B%252Fresults%252Fpeople&redirect_uri=https%3A%2F%2Fauthdirectory.utoronto.ca%2Findex.html&scope=openid%20profile%20email%20offline_access&code_challenge=6zw-jjMe-HaB-zhQsM0mEqWnVKv1AWxp2wp982T_cTE&code_challenge_method=S256&nonce=NX5VeTNTSFhPZENoeTduQ1FYY3pITmxKN1ZvVDJYeHJmLXZmQ2FpYllNY1hi&sso_reload=true";
const DEFAULT_SEARCH_URL: &str = "https://authdirectory.utoronto.ca/results/people";
const DEFAULT_DEPARTMENT_FIELD: &str = "name=department";
const DEFAULT_EXPORT_BUTTON: &str = "xpath=//button[contains(text(), 'Export Results as CSV')]";
const DEFAULT_DOWNLOAD_NAME: &str = "People_Results.csv";

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration shared by the trigger service and the crawler process.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub crawler: CrawlerConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(&env_or("APP_ENV", "development"));

        let host = env_or("APP_HOST", "127.0.0.1");
        let port = env_or("APP_PORT", "5000")
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env_or("APP_LOG_LEVEL", "info");

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            crawler: CrawlerConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Everything the crawler process needs: where the browser lives, where files go,
/// what the portal looks like, and how long to wait for it.
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    pub webdriver_url: String,
    pub workspace: WorkspaceConfig,
    pub portal: PortalConfig,
    pub waits: WaitConfig,
}

impl CrawlerConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = WaitConfig::default();

        Ok(Self {
            webdriver_url: env_or("DIRECTORY_WEBDRIVER_URL", "http://localhost:9515"),
            workspace: WorkspaceConfig {
                download_dir: PathBuf::from(env_or("DIRECTORY_DOWNLOAD_DIR", "downloads")),
                log_file: PathBuf::from(env_or("DIRECTORY_LOG_FILE", "script_output.log")),
                report_name: env_or("DIRECTORY_REPORT_NAME", "UofT_Staff_Report.xlsx"),
            },
            portal: PortalConfig {
                login_url: env_or("DIRECTORY_LOGIN_URL", DEFAULT_LOGIN_URL),
                search_url: env_or("DIRECTORY_SEARCH_URL", DEFAULT_SEARCH_URL),
                department_field: env_locator(
                    "DIRECTORY_DEPARTMENT_FIELD",
                    DEFAULT_DEPARTMENT_FIELD,
                )?,
                export_button: env_locator("DIRECTORY_EXPORT_BUTTON", DEFAULT_EXPORT_BUTTON)?,
                default_download: env_or("DIRECTORY_DEFAULT_DOWNLOAD", DEFAULT_DOWNLOAD_NAME),
            },
            waits: WaitConfig {
                login_timeout: env_duration(
                    "DIRECTORY_LOGIN_TIMEOUT_SECS",
                    defaults.login_timeout,
                    Duration::from_secs,
                )?,
                element_timeout: env_duration(
                    "DIRECTORY_ELEMENT_TIMEOUT_SECS",
                    defaults.element_timeout,
                    Duration::from_secs,
                )?,
                download_timeout: env_duration(
                    "DIRECTORY_DOWNLOAD_TIMEOUT_SECS",
                    defaults.download_timeout,
                    Duration::from_secs,
                )?,
                poll_interval: env_duration(
                    "DIRECTORY_POLL_INTERVAL_MS",
                    defaults.poll_interval,
                    Duration::from_millis,
                )?,
                typing_pause: env_duration(
                    "DIRECTORY_TYPING_PAUSE_MS",
                    defaults.typing_pause,
                    Duration::from_millis,
                )?,
            },
        })
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".to_string(),
            workspace: WorkspaceConfig::default(),
            portal: PortalConfig::default(),
            waits: WaitConfig::default(),
        }
    }
}

/// Filesystem layout of a run.
#[derive(Debug, Clone)]
pub struct WorkspaceConfig {
    pub download_dir: PathBuf,
    pub log_file: PathBuf,
    pub report_name: String,
}

impl WorkspaceConfig {
    pub fn report_path(&self) -> PathBuf {
        self.download_dir.join(&self.report_name)
    }
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from("downloads"),
            log_file: PathBuf::from("script_output.log"),
            report_name: "UofT_Staff_Report.xlsx".to_string(),
        }
    }
}

/// The portal's markup contract. Any of these can change under us, so none are
/// compiled in beyond their defaults.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    pub login_url: String,
    pub search_url: String,
    pub department_field: Locator,
    pub export_button: Locator,
    /// Name the browser gives every export before we rename it.
    pub default_download: String,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            login_url: DEFAULT_LOGIN_URL.to_string(),
            search_url: DEFAULT_SEARCH_URL.to_string(),
            department_field: Locator::Name("department".to_string()),
            export_button: Locator::XPath(
                "//button[contains(text(), 'Export Results as CSV')]".to_string(),
            ),
            default_download: DEFAULT_DOWNLOAD_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig {
    pub login_timeout: Duration,
    pub element_timeout: Duration,
    pub download_timeout: Duration,
    pub poll_interval: Duration,
    /// Pause between typing the department and pressing Enter.
    pub typing_pause: Duration,
}

impl WaitConfig {
    pub fn login(&self) -> WaitPolicy {
        WaitPolicy::new(self.login_timeout, self.poll_interval)
    }

    pub fn element(&self) -> WaitPolicy {
        WaitPolicy::new(self.element_timeout, self.poll_interval)
    }

    pub fn download(&self) -> WaitPolicy {
        WaitPolicy::new(self.download_timeout, self.poll_interval)
    }
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            login_timeout: Duration::from_secs(300),
            element_timeout: Duration::from_secs(10),
            download_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(500),
            typing_pause: Duration::from_millis(500),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_duration(
    key: &'static str,
    default: Duration,
    unit: fn(u64) -> Duration,
) -> Result<Duration, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(unit)
            .map_err(|_| ConfigError::InvalidDuration { key, value: raw }),
        Err(_) => Ok(default),
    }
}

fn env_locator(key: &'static str, default: &str) -> Result<Locator, ConfigError> {
    env_or(key, default)
        .parse()
        .map_err(|source| ConfigError::InvalidSelector { key, source })
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost {
        source: std::net::AddrParseError,
    },
    InvalidDuration {
        key: &'static str,
        value: String,
    },
    InvalidSelector {
        key: &'static str,
        source: LocatorParseError,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidDuration { key, value } => {
                write!(f, "{key} must be a whole number, got '{value}'")
            }
            ConfigError::InvalidSelector { key, source } => write!(f, "{key}: {source}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidDuration { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidSelector { source, .. } => Some(source),
        }
    }
}
