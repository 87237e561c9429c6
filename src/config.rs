use anyhow::{anyhow, Result};
use config::Config;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Runtime configuration for sqlscribe
#[derive(Debug, Clone)]
pub struct SqlscribeConfig {
    /// Path to the directory holding sqlscribe's data
    pub data_dir: String,

    /// Path to the user database file
    pub database_path: String,

    /// Directory holding `config.json`, `tokenizer.json` and `model.safetensors`
    pub model_dir: String,

    /// Maximum number of tokens the model may generate per prompt
    pub max_output_tokens: usize,

    /// Deadline for a single inference call in seconds
    pub inference_timeout_secs: u64,

    /// Deadline for a single read query in seconds
    pub query_timeout_secs: u64,

    /// Upper bound on pooled read connections
    pub max_readers: usize,

    /// Administrator user name
    pub admin_user: String,

    /// bcrypt hash of the administrator password; admin login is disabled when unset
    pub admin_password_hash: Option<String>,

    /// Address the WebSocket server binds to
    pub server_address: String,

    /// Port the WebSocket server listens on
    pub server_port: u16,
}

const EMPTY_CONFIG: &str = r#"### sqlscribe configuration file

### directory for the user database and model artifacts
# data_dir = "~/.sqlscribe"

### SQLite database holding user-created tables
# database_path = "~/.sqlscribe/user_db.sqlite3"

### pre-trained T5 model directory (config.json, tokenizer.json, model.safetensors)
# model_dir = "~/.sqlscribe/nl_to_sql_model"

### generation and query limits
# max_output_tokens = 64
# inference_timeout_secs = 30
# query_timeout_secs = 30
# max_readers = 4

### administrator credential (generate the hash with `sqlscribe hash-password`)
# admin_user = "admin"
# admin_password_hash = "$2b$12$..."

### WebSocket server
# server_address = "127.0.0.1"
# server_port = 8080
"#;

const DEFAULT_MAX_OUTPUT_TOKENS: usize = 64;
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_READERS: usize = 4;
const DEFAULT_ADMIN_USER: &str = "admin";
const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1";
const DEFAULT_SERVER_PORT: u16 = 8080;

impl Default for SqlscribeConfig {
    fn default() -> Self {
        let home_dir = dirs::home_dir()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|| ".".to_string());
        let data_dir = format!("{}/.sqlscribe", home_dir);

        Self {
            database_path: format!("{}/user_db.sqlite3", data_dir),
            model_dir: format!("{}/nl_to_sql_model", data_dir),
            data_dir,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            inference_timeout_secs: DEFAULT_TIMEOUT_SECS,
            query_timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_readers: DEFAULT_MAX_READERS,
            admin_user: DEFAULT_ADMIN_USER.to_string(),
            admin_password_hash: None,
            server_address: DEFAULT_SERVER_ADDRESS.to_string(),
            server_port: DEFAULT_SERVER_PORT,
        }
    }
}

impl SqlscribeConfig {
    /// Function to create and initialize a new configuration
    pub fn new(path: &Option<String>) -> Result<SqlscribeConfig> {
        // A .env file next to the binary may carry SQLSCRIBE_* overrides
        let _ = dotenvy::dotenv();

        let mut builder = Config::builder();

        let home_dir = dirs::home_dir()
            .ok_or_else(|| anyhow!("Could not find home directory"))?
            .to_str()
            .ok_or_else(|| anyhow!("Could not convert home directory path to string"))?
            .to_owned();

        let sqlscribe_dir = format!("{}/.sqlscribe", home_dir.as_str());

        // Add in toml configuration file
        match path {
            Some(p) => {
                let path = Path::new(p.as_str());
                if path.exists() {
                    let path_str = path
                        .to_str()
                        .ok_or_else(|| anyhow!("Could not convert path to string"))?;
                    builder = builder.add_source(config::File::with_name(path_str));
                } else {
                    std::fs::write(p.as_str(), EMPTY_CONFIG)
                        .map_err(|e| anyhow!("Unable to create config file: {}", e))?;
                }
            }
            None => {
                std::fs::create_dir_all(sqlscribe_dir.as_str())
                    .map_err(|e| anyhow!("Unable to create sqlscribe directory: {}", e))?;
                let p = format!("{}/sqlscribe.toml", sqlscribe_dir.as_str());
                if Path::new(p.as_str()).exists() {
                    builder = builder.add_source(config::File::with_name(p.as_str()));
                } else {
                    std::fs::write(p.as_str(), EMPTY_CONFIG).map_err(|e| {
                        anyhow!("Unable to create config file {}: {}", p.as_str(), e)
                    })?;
                }
            }
        }

        // E.g., `SQLSCRIBE_MODEL_DIR=/models/t5 sqlscribe generate ...`
        builder = builder.add_source(config::Environment::with_prefix("SQLSCRIBE"));

        let settings = builder
            .build()
            .map_err(|e| anyhow!("Failed to build configuration: {}", e))?;

        let map = settings
            .try_deserialize::<HashMap<String, String>>()
            .map_err(|e| anyhow!("Failed to deserialize configuration: {}", e))?;

        let config = Self::from_map(&map, &sqlscribe_dir)?;
        std::fs::create_dir_all(config.data_dir.as_str())
            .map_err(|e| anyhow!("Unable to create data directory: {}", e))?;
        Ok(config)
    }

    /// Build a configuration from flat key/value settings
    ///
    /// Paths starting with `~` are expanded against the home directory. Keys that
    /// are absent fall back to defaults rooted at `default_data_dir`.
    pub fn from_map(map: &HashMap<String, String>, default_data_dir: &str) -> Result<Self> {
        let data_dir = map
            .get("data_dir")
            .map(|p| expand_home(p))
            .unwrap_or_else(|| default_data_dir.to_string());
        let data_dir = data_dir.trim_end_matches('/').to_string();

        let database_path = map
            .get("database_path")
            .map(|p| expand_home(p))
            .unwrap_or_else(|| format!("{}/user_db.sqlite3", data_dir));

        let model_dir = map
            .get("model_dir")
            .map(|p| expand_home(p))
            .unwrap_or_else(|| format!("{}/nl_to_sql_model", data_dir));

        let max_output_tokens = parse_or(map, "max_output_tokens", DEFAULT_MAX_OUTPUT_TOKENS)?;
        if max_output_tokens == 0 {
            return Err(anyhow!("max_output_tokens must be at least 1"));
        }

        let admin_password_hash = map
            .get("admin_password_hash")
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty());

        Ok(SqlscribeConfig {
            data_dir,
            database_path,
            model_dir,
            max_output_tokens,
            inference_timeout_secs: parse_or(map, "inference_timeout_secs", DEFAULT_TIMEOUT_SECS)?,
            query_timeout_secs: parse_or(map, "query_timeout_secs", DEFAULT_TIMEOUT_SECS)?,
            max_readers: parse_or(map, "max_readers", DEFAULT_MAX_READERS)?.max(1),
            admin_user: map
                .get("admin_user")
                .cloned()
                .unwrap_or_else(|| DEFAULT_ADMIN_USER.to_string()),
            admin_password_hash,
            server_address: map
                .get("server_address")
                .cloned()
                .unwrap_or_else(|| DEFAULT_SERVER_ADDRESS.to_string()),
            server_port: parse_or(map, "server_port", DEFAULT_SERVER_PORT)?,
        })
    }

    /// Inference deadline as Duration
    pub fn inference_timeout(&self) -> Duration {
        Duration::from_secs(self.inference_timeout_secs)
    }

    /// Query deadline as Duration
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }

    /// Whether an administrator password hash is configured
    pub fn admin_enabled(&self) -> bool {
        self.admin_password_hash.is_some()
    }

    /// Display configuration summary
    pub fn summary(&self) -> String {
        let lines = [
            format!("Data Directory:     {}", self.data_dir),
            format!("Database Path:      {}", self.database_path),
            format!("Model Directory:    {}", self.model_dir),
            format!("Max Output Tokens:  {}", self.max_output_tokens),
            format!("Inference Timeout:  {} seconds", self.inference_timeout_secs),
            format!("Query Timeout:      {} seconds", self.query_timeout_secs),
            format!("Read Connections:   {}", self.max_readers),
            format!("Admin User:         {}", self.admin_user),
            format!(
                "Admin Login:        {}",
                if self.admin_enabled() {
                    "enabled"
                } else {
                    "disabled (no admin_password_hash)"
                }
            ),
            format!(
                "Server Address:     {}:{}",
                self.server_address, self.server_port
            ),
        ];
        lines.join("\n")
    }

    /// Get the config file path
    pub fn config_file_path() -> String {
        let home_dir = dirs::home_dir()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|| "~".to_string());
        format!("{}/.sqlscribe/sqlscribe.toml", home_dir)
    }
}

fn parse_or<T: std::str::FromStr>(map: &HashMap<String, String>, key: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match map.get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("Invalid value '{}' for {}: {}", raw, key, e)),
        None => Ok(default),
    }
}

fn expand_home(path: &str) -> String {
    match (path.strip_prefix('~'), dirs::home_dir()) {
        (Some(rest), Some(home)) => format!("{}{}", home.to_string_lossy(), rest),
        _ => path.to_string(),
    }
}
