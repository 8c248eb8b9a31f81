use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Delimited file of `name,latitude,longitude` rows for serviceability checks.
    pub locations_path: PathBuf,
    /// Delimited file of `store_id,latitude,longitude[,name]` rows.
    pub stores_path: PathBuf,
    /// Delimited file of `item_id[,item_name]` rows.
    pub items_path: PathBuf,
    pub api_base_url: String,
    pub api_user_agent: String,
    pub api_timeout_ms: u64,
    pub batch_size: usize,
    pub cooldown_ms: u64,
    pub schedule_cron: String,
    pub scheduler_enabled: bool,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    /// Bearer tokens accepted by the HTTP API. Empty disables auth in development.
    pub api_keys: Vec<String>,
    /// On-demand triggers allowed per check kind per minute.
    pub trigger_limit_per_minute: u32,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("locations_path", &self.locations_path)
            .field("stores_path", &self.stores_path)
            .field("items_path", &self.items_path)
            .field("api_base_url", &self.api_base_url)
            .field("api_user_agent", &self.api_user_agent)
            .field("api_timeout_ms", &self.api_timeout_ms)
            .field("batch_size", &self.batch_size)
            .field("cooldown_ms", &self.cooldown_ms)
            .field("schedule_cron", &self.schedule_cron)
            .field("scheduler_enabled", &self.scheduler_enabled)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("api_keys", &format_args!("[{} redacted]", self.api_keys.len()))
            .field("trigger_limit_per_minute", &self.trigger_limit_per_minute)
            .finish()
    }
}
