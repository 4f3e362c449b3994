use std::env;

use chrono::Duration;
use cpg_common::Secret;
use log::*;

const DEFAULT_CPG_HOST: &str = "127.0.0.1";
const DEFAULT_CPG_PORT: u16 = 8480;
const DEFAULT_FCM_ENDPOINT: &str = "https://fcm.googleapis.com/fcm/send";
const DEFAULT_CANCEL_SWEEP_INTERVAL_SECS: u64 = 60;
const DEFAULT_ARCHIVE_SWEEP_INTERVAL_SECS: u64 = 6 * 60 * 60;
const DEFAULT_ORDER_RETENTION_DAYS: i64 = 90;
const DEFAULT_ARCHIVE_PAGE_SIZE: u32 = 500;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    pub fcm: FcmConfig,
    pub sweeps: SweepConfig,
}

/// The static API keys the server accepts. Both are required in production; an empty key disables that role
/// entirely rather than allowing anonymous access.
#[derive(Clone, Debug, Default)]
pub struct AuthConfig {
    pub admin_api_key: Secret<String>,
    pub service_api_key: Secret<String>,
}

#[derive(Clone, Debug, Default)]
pub struct FcmConfig {
    pub endpoint: String,
    pub server_key: Secret<String>,
}

#[derive(Clone, Debug)]
pub struct SweepConfig {
    /// How often the cancellation-window opener runs.
    pub cancellation_interval: std::time::Duration,
    /// How often the archival sweep runs.
    pub archive_interval: std::time::Duration,
    /// Terminal orders untouched for this long are eligible for archival.
    pub retention: Duration,
    /// The maximum number of orders moved per archival run.
    pub archive_page_size: u32,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            cancellation_interval: std::time::Duration::from_secs(DEFAULT_CANCEL_SWEEP_INTERVAL_SECS),
            archive_interval: std::time::Duration::from_secs(DEFAULT_ARCHIVE_SWEEP_INTERVAL_SECS),
            retention: Duration::days(DEFAULT_ORDER_RETENTION_DAYS),
            archive_page_size: DEFAULT_ARCHIVE_PAGE_SIZE,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_CPG_HOST.to_string(),
            port: DEFAULT_CPG_PORT,
            database_url: String::default(),
            auth: AuthConfig::default(),
            fcm: FcmConfig { endpoint: DEFAULT_FCM_ENDPOINT.to_string(), server_key: Secret::default() },
            sweeps: SweepConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("CPG_HOST").ok().unwrap_or_else(|| DEFAULT_CPG_HOST.into());
        let port = env::var("CPG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for CPG_PORT. {e} Using the default, {DEFAULT_CPG_PORT}, instead."
                    );
                    DEFAULT_CPG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_CPG_PORT);
        let database_url = env::var("CPG_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ CPG_DATABASE_URL is not set. Using the default, which is almost certainly not what you want.");
            String::default()
        });
        let auth = AuthConfig::from_env_or_default();
        let fcm = FcmConfig::from_env_or_default();
        let sweeps = SweepConfig::from_env_or_default();
        Self { host, port, database_url, auth, fcm, sweeps }
    }
}

impl AuthConfig {
    pub fn from_env_or_default() -> Self {
        let admin_api_key = env::var("CPG_ADMIN_API_KEY").map(Secret::new).unwrap_or_else(|_| {
            warn!("🪛️ CPG_ADMIN_API_KEY is not set. The manual ledger endpoints will reject every request.");
            Secret::default()
        });
        let service_api_key = env::var("CPG_SERVICE_API_KEY").map(Secret::new).unwrap_or_else(|_| {
            warn!("🪛️ CPG_SERVICE_API_KEY is not set. The trigger endpoints will reject every request.");
            Secret::default()
        });
        Self { admin_api_key, service_api_key }
    }
}

impl FcmConfig {
    pub fn from_env_or_default() -> Self {
        let endpoint = env::var("CPG_FCM_ENDPOINT").ok().unwrap_or_else(|| DEFAULT_FCM_ENDPOINT.into());
        let server_key = env::var("CPG_FCM_SERVER_KEY").map(Secret::new).unwrap_or_else(|_| {
            warn!("🪛️ CPG_FCM_SERVER_KEY is not set. Push notifications will not be delivered.");
            Secret::default()
        });
        Self { endpoint, server_key }
    }
}

impl SweepConfig {
    pub fn from_env_or_default() -> Self {
        let defaults = SweepConfig::default();
        let cancellation_interval = parse_secs("CPG_CANCEL_SWEEP_INTERVAL_SECS", defaults.cancellation_interval);
        let archive_interval = parse_secs("CPG_ARCHIVE_SWEEP_INTERVAL_SECS", defaults.archive_interval);
        let retention = env::var("CPG_ORDER_RETENTION_DAYS")
            .ok()
            .and_then(|s| {
                s.parse::<i64>()
                    .map_err(|e| error!("🪛️ {s} is not a valid value for CPG_ORDER_RETENTION_DAYS. {e}"))
                    .ok()
            })
            .map(Duration::days)
            .unwrap_or(defaults.retention);
        let archive_page_size = env::var("CPG_ARCHIVE_PAGE_SIZE")
            .ok()
            .and_then(|s| {
                s.parse::<u32>().map_err(|e| error!("🪛️ {s} is not a valid value for CPG_ARCHIVE_PAGE_SIZE. {e}")).ok()
            })
            .unwrap_or(defaults.archive_page_size);
        Self { cancellation_interval, archive_interval, retention, archive_page_size }
    }
}

fn parse_secs(var: &str, default: std::time::Duration) -> std::time::Duration {
    env::var(var)
        .ok()
        .and_then(|s| {
            s.parse::<u64>().map_err(|e| error!("🪛️ {s} is not a valid value for {var}. {e}")).ok()
        })
        .map(std::time::Duration::from_secs)
        .unwrap_or(default)
}
