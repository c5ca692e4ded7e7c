use std::{env, path::PathBuf};

use serde::Deserialize;
use tracing_subscriber::{EnvFilter, fmt};

use crate::storage;

const DEFAULT_PORT: &str = "3000";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub server: ServerConfig,
    pub audit: AuditConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct TrackerFile {
    #[serde(default)]
    audit: AuditConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    #[serde(default = "default_audit_enabled")]
    pub enabled: bool,
    #[serde(default = "default_audit_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_audit_enabled(),
            channel_capacity: default_audit_channel_capacity(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let root = match env::var("EXERCISE_APP_ROOT") {
            Ok(path) => PathBuf::from(path),
            Err(_) => env::current_dir()?,
        };
        let data_dir = root.join("data");
        let tracker: TrackerFile = {
            let path = root.join("config").join("tracker.yml");
            if path.exists() {
                storage::load_yaml(path)?
            } else {
                TrackerFile::default()
            }
        };

        storage::ensure_data_layout(&data_dir)?;

        Ok(Self {
            data_dir,
            audit: tracker.audit,
            server: ServerConfig {
                bind_addr: resolve_bind_addr(),
            },
        })
    }
}

fn resolve_bind_addr() -> String {
    if let Ok(addr) = env::var("EXERCISE_SERVER_BIND") {
        return addr;
    }
    let port = env::var("PORT").unwrap_or_else(|_| DEFAULT_PORT.to_string());
    format!("0.0.0.0:{port}")
}

impl ServerConfig {
    pub fn addr(&self) -> &str {
        &self.bind_addr
    }
}

fn default_audit_enabled() -> bool {
    true
}

fn default_audit_channel_capacity() -> usize {
    256
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}
