//! Server configuration from environment variables

use crate::broadcast::DEFAULT_OUTBOUND_BUFFER;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_BIND: &str = "0.0.0.0:8001";
pub const SNAPSHOT_FILE: &str = "state.json";

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the HTTP/WebSocket server listens on
    pub bind: SocketAddr,
    /// Directory for the state snapshot (None = in-memory only)
    pub data_dir: Option<PathBuf>,
    /// Award catalog JSON file
    pub catalog_path: PathBuf,
    /// Static assets served under /home/
    pub static_dir: PathBuf,
    /// Per-connection outbound queue length before a client counts as stalled
    pub outbound_buffer: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8001)),
            data_dir: None,
            catalog_path: PathBuf::from("data/awards.json"),
            static_dir: PathBuf::from("static"),
            outbound_buffer: DEFAULT_OUTBOUND_BUFFER,
        }
    }
}

impl AppConfig {
    /// Load config from AWARDNIGHT_* environment variables.
    /// Unparseable values fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let bind = match env_value("AWARDNIGHT_BIND") {
            Some(raw) => raw.parse::<SocketAddr>().unwrap_or_else(|_| {
                tracing::warn!("Invalid AWARDNIGHT_BIND '{}', using {}", raw, DEFAULT_BIND);
                defaults.bind
            }),
            None => defaults.bind,
        };

        let outbound_buffer = match env_value("AWARDNIGHT_OUTBOUND_BUFFER") {
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    tracing::warn!(
                        "Invalid AWARDNIGHT_OUTBOUND_BUFFER '{}', using {}",
                        raw,
                        DEFAULT_OUTBOUND_BUFFER
                    );
                    DEFAULT_OUTBOUND_BUFFER
                }
            },
            None => defaults.outbound_buffer,
        };

        let data_dir = env_value("AWARDNIGHT_DATA_DIR").map(PathBuf::from);
        if data_dir.is_none() {
            tracing::warn!("AWARDNIGHT_DATA_DIR not set - state will not survive a restart");
        }

        Self {
            bind,
            data_dir,
            catalog_path: env_value("AWARDNIGHT_CATALOG")
                .map(PathBuf::from)
                .unwrap_or(defaults.catalog_path),
            static_dir: env_value("AWARDNIGHT_STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
            outbound_buffer,
        }
    }

    pub fn snapshot_path(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| dir.join(SNAPSHOT_FILE))
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
