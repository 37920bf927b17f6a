//! Simple config loader using TOML and serde.
//! The config struct is intentionally small and typed for the core services.

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::Result;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Address of the satellite (e.g., "127.0.0.1:7778").
    pub satellite_addr: Option<String>,

    /// Bind address for a storage node's piece RPC.
    pub node_addr: Option<String>,

    /// Starting bandwidth message size for piece transfers, in bytes.
    pub message_size: Option<u64>,

    /// Maximum bandwidth message size for piece transfers, in bytes.
    pub max_message_size: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            satellite_addr: Some("127.0.0.1:7778".to_string()),
            node_addr: Some("127.0.0.1:7777".to_string()),
            message_size: None,
            max_message_size: None,
        }
    }
}

/// Load config from a TOML file path.
/// If the file is missing or fails to parse, an error is returned.
pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
    let p = path.as_ref();
    let s = fs::read_to_string(p)?;
    let cfg: Config = toml::from_str(&s)?;
    Ok(cfg)
}
