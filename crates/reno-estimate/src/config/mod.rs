use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub supabase: Option<SupabaseConfig>,
    pub vision: VisionConfig,
    pub labor: LaborIndexConfig,
    pub dashboard: DashboardConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::parse(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let session_idle_minutes = env::var("APP_SESSION_IDLE_MINUTES")
            .unwrap_or_else(|_| "120".to_string())
            .parse::<u64>()
            .ok()
            .filter(|minutes| *minutes > 0)
            .ok_or(ConfigError::InvalidSessionIdle)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_format = LogFormat::parse(
            &env::var("APP_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string()),
        );

        let supabase = match (configured("SUPABASE_URL"), configured("SUPABASE_ANON_KEY")) {
            (Some(url), Some(anon_key)) => Some(SupabaseConfig {
                url: url.trim_end_matches('/').to_string(),
                anon_key,
                photo_bucket: env::var("SUPABASE_PHOTO_BUCKET")
                    .unwrap_or_else(|_| "site-photos".to_string()),
                projects_table: env::var("SUPABASE_PROJECTS_TABLE")
                    .unwrap_or_else(|_| "projects".to_string()),
            }),
            _ => None,
        };

        let vision = VisionConfig {
            api_key: configured("GEMINI_API_KEY"),
            api_base: env::var("GEMINI_API_BASE")
                .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string())
                .trim_end_matches('/')
                .to_string(),
            model: env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-1.5-flash".to_string()),
        };

        let labor = LaborIndexConfig {
            api_key: configured("KOSIS_API_KEY"),
        };

        let pin = env::var("DASHBOARD_PIN").unwrap_or_else(|_| "1234".to_string());
        if pin.len() != 4 || !pin.chars().all(|c| c.is_ascii_digit()) {
            return Err(ConfigError::InvalidDashboardPin);
        }

        Ok(Self {
            environment,
            server: ServerConfig {
                host,
                port,
                session_idle: Duration::from_secs(session_idle_minutes.saturating_mul(60)),
            },
            telemetry: TelemetryConfig {
                log_level,
                format: log_format,
            },
            supabase,
            vision,
            labor,
            dashboard: DashboardConfig { pin },
        })
    }
}

/// Reads an optional credential, treating blanks and build-time placeholders as unset.
fn configured(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty() && !value.contains("placeholder"))
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Editing sessions untouched for this long are closed.
    pub session_idle: Duration,
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

/// Tracing output controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Compact,
        }
    }
}

/// Hosted row store and object store credentials.
#[derive(Clone)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
    pub photo_bucket: String,
    pub projects_table: String,
}

impl fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url)
            .field("photo_bucket", &self.photo_bucket)
            .field("projects_table", &self.projects_table)
            .finish_non_exhaustive()
    }
}

/// Site photo analysis endpoint settings.
#[derive(Clone)]
pub struct VisionConfig {
    pub api_key: Option<String>,
    pub api_base: String,
    pub model: String,
}

impl fmt::Debug for VisionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisionConfig")
            .field("api_key_set", &self.api_key.is_some())
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

#[derive(Clone)]
pub struct LaborIndexConfig {
    pub api_key: Option<String>,
}

impl fmt::Debug for LaborIndexConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LaborIndexConfig")
            .field("api_key_set", &self.api_key.is_some())
            .finish()
    }
}

/// Four digit PIN guarding the saved-project dashboard.
#[derive(Clone)]
pub struct DashboardConfig {
    pub pin: String,
}

impl fmt::Debug for DashboardConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DashboardConfig { pin: \"****\" }")
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidDashboardPin,
    InvalidSessionIdle,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidDashboardPin => {
                write!(f, "DASHBOARD_PIN must be exactly four digits")
            }
            ConfigError::InvalidSessionIdle => {
                write!(f, "APP_SESSION_IDLE_MINUTES must be a positive whole number")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort
            | ConfigError::InvalidDashboardPin
            | ConfigError::InvalidSessionIdle => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "APP_LOG_FORMAT",
            "SUPABASE_URL",
            "SUPABASE_ANON_KEY",
            "SUPABASE_PHOTO_BUCKET",
            "SUPABASE_PROJECTS_TABLE",
            "GEMINI_API_KEY",
            "GEMINI_API_BASE",
            "GEMINI_MODEL",
            "KOSIS_API_KEY",
            "DASHBOARD_PIN",
            "APP_SESSION_IDLE_MINUTES",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.telemetry.format, LogFormat::Compact);
        assert!(config.supabase.is_none());
        assert!(config.vision.api_key.is_none());
        assert_eq!(config.vision.model, "gemini-1.5-flash");
        assert_eq!(config.dashboard.pin, "1234");
        assert_eq!(config.server.session_idle, Duration::from_secs(120 * 60));
    }

    #[test]
    fn rejects_zero_session_idle() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_SESSION_IDLE_MINUTES", "0");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidSessionIdle)
        ));
        env::remove_var("APP_SESSION_IDLE_MINUTES");
    }

    #[test]
    fn environment_and_log_format_parse_leniently() {
        assert_eq!(AppEnvironment::parse(" PROD "), AppEnvironment::Production);
        assert_eq!(AppEnvironment::parse("ci"), AppEnvironment::Test);
        assert_eq!(AppEnvironment::parse("staging"), AppEnvironment::Development);
        assert_eq!(LogFormat::parse("JSON"), LogFormat::Json);
        assert_eq!(LogFormat::parse("pretty"), LogFormat::Compact);
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
    }

    #[test]
    fn placeholder_credentials_count_as_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("SUPABASE_URL", "https://placeholder.supabase.co");
        env::set_var("SUPABASE_ANON_KEY", "placeholder-key");
        env::set_var("KOSIS_API_KEY", "placeholder");
        let config = AppConfig::load().expect("config loads");
        assert!(config.supabase.is_none());
        assert!(config.labor.api_key.is_none());
    }

    #[test]
    fn supabase_settings_trim_trailing_slash() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("SUPABASE_URL", "https://demo.supabase.co/");
        env::set_var("SUPABASE_ANON_KEY", "anon");
        let config = AppConfig::load().expect("config loads");
        let supabase = config.supabase.expect("supabase configured");
        assert_eq!(supabase.url, "https://demo.supabase.co");
        assert_eq!(supabase.photo_bucket, "site-photos");
        assert_eq!(supabase.projects_table, "projects");
    }

    #[test]
    fn rejects_non_numeric_dashboard_pin() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("DASHBOARD_PIN", "12a4");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidDashboardPin)
        ));
        env::remove_var("DASHBOARD_PIN");
    }
}
