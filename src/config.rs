//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::DEFAULT_TTL_SECS;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// TTL in seconds applied to every cached collection
    pub cache_ttl: u64,
    /// Directory holding the local GeoPackage files
    pub data_dir: PathBuf,
    /// File name of the departments dataset inside `data_dir`
    pub departments_file: String,
    /// Object-storage URL with a `{code}` placeholder; None disables remote fallback
    pub remote_url_template: Option<String>,
    /// Upper bound in seconds for a remote download
    pub remote_timeout: u64,
    /// Directory for downloaded temp files; None uses the OS temp dir
    pub temp_dir: Option<PathBuf>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CACHE_TTL` - Cache TTL in seconds (default: 300)
    /// - `DATA_DIR` - Local dataset directory (default: ./data)
    /// - `DEPARTMENTS_FILE` - Departments dataset file name (default: departments.gpkg)
    /// - `REMOTE_URL_TEMPLATE` - Remote object URL with `{code}` (default: unset)
    /// - `REMOTE_TIMEOUT` - Remote download timeout in seconds (default: 30)
    /// - `TEMP_DIR` - Directory for downloaded temp files (default: OS temp dir)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            cache_ttl: parse_var("CACHE_TTL").unwrap_or(defaults.cache_ttl),
            data_dir: non_empty_var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            departments_file: non_empty_var("DEPARTMENTS_FILE")
                .unwrap_or(defaults.departments_file),
            remote_url_template: non_empty_var("REMOTE_URL_TEMPLATE"),
            remote_timeout: parse_var("REMOTE_TIMEOUT").unwrap_or(defaults.remote_timeout),
            temp_dir: non_empty_var("TEMP_DIR").map(PathBuf::from),
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_secs(self.remote_timeout)
    }

    pub fn departments_path(&self) -> PathBuf {
        self.data_dir.join(&self.departments_file)
    }

    /// Local dataset path for a department's municipalities.
    pub fn municipality_path(&self, code: &str) -> PathBuf {
        self.data_dir.join(format!("DPTO_CCDGO_{code}.gpkg"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            cache_ttl: DEFAULT_TTL_SECS,
            data_dir: PathBuf::from("./data"),
            departments_file: "departments.gpkg".to_string(),
            remote_url_template: None,
            remote_timeout: 30,
            temp_dir: None,
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
