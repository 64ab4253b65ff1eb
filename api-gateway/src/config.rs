//! Gateway configuration

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Fallback used when neither an explicit path nor `HOME` is available
const ROOT_CREDENTIALS_FILE: &str = "/root/.aws/credentials";

/// Gateway service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Listen host
    pub host: String,
    /// Listen port
    pub port: u16,
    /// Shared credentials file; each profile is one account
    pub credentials_file: PathBuf,
    /// Region override for Cost Explorer clients
    pub region: Option<String>,
    /// Upper bound on one `/billing` request, upstream calls included
    pub request_timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 80,
            credentials_file: PathBuf::from(ROOT_CREDENTIALS_FILE),
            region: None,
            request_timeout_secs: 60,
        }
    }
}

impl GatewayConfig {
    /// Load configuration from `.env` and the process environment
    pub fn load() -> Self {
        // Try to load .env file
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any variable source
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(home) = lookup("HOME") {
            cfg.credentials_file = PathBuf::from(home).join(".aws").join("credentials");
        }
        if let Some(path) = lookup("AWS_SHARED_CREDENTIALS_FILE") {
            cfg.credentials_file = PathBuf::from(path);
        }

        // Platform PORT first, CLOUDBILL_ prefixed variables override it
        if let Some(port) = lookup("PORT") {
            set_parsed(&mut cfg.port, "PORT", &port);
        }
        if let Some(host) = lookup("CLOUDBILL_HOST") {
            cfg.host = host;
        }
        if let Some(port) = lookup("CLOUDBILL_PORT") {
            set_parsed(&mut cfg.port, "CLOUDBILL_PORT", &port);
        }
        if let Some(path) = lookup("CLOUDBILL_CREDENTIALS_FILE") {
            cfg.credentials_file = PathBuf::from(path);
        }
        if let Some(region) = lookup("CLOUDBILL_REGION") {
            if !region.trim().is_empty() {
                cfg.region = Some(region.trim().to_string());
            }
        }
        if let Some(secs) = lookup("CLOUDBILL_REQUEST_TIMEOUT_SECS") {
            set_parsed(&mut cfg.request_timeout_secs, "CLOUDBILL_REQUEST_TIMEOUT_SECS", &secs);
        }

        cfg
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn set_parsed<T: std::str::FromStr>(target: &mut T, key: &str, raw: &str) {
    match raw.trim().parse() {
        Ok(value) => *target = value,
        Err(_) => warn!(key, value = raw, "Ignoring unparseable configuration value"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> GatewayConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        GatewayConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[]);
        assert_eq!(cfg.port, 80);
        assert_eq!(cfg.credentials_file, PathBuf::from("/root/.aws/credentials"));
        assert_eq!(cfg.region, None);
        assert_eq!(cfg.request_timeout(), Duration::from_secs(60));
        assert_eq!(cfg.addr().unwrap().to_string(), "0.0.0.0:80");
    }

    #[test]
    fn test_credentials_file_precedence() {
        let cfg = config(&[("HOME", "/home/ops")]);
        assert_eq!(cfg.credentials_file, PathBuf::from("/home/ops/.aws/credentials"));

        let cfg = config(&[
            ("HOME", "/home/ops"),
            ("AWS_SHARED_CREDENTIALS_FILE", "/etc/aws/credentials"),
        ]);
        assert_eq!(cfg.credentials_file, PathBuf::from("/etc/aws/credentials"));

        let cfg = config(&[
            ("AWS_SHARED_CREDENTIALS_FILE", "/etc/aws/credentials"),
            ("CLOUDBILL_CREDENTIALS_FILE", "/srv/cloudbill/credentials"),
        ]);
        assert_eq!(cfg.credentials_file, PathBuf::from("/srv/cloudbill/credentials"));
    }

    #[test]
    fn test_port_precedence_and_bad_values() {
        assert_eq!(config(&[("PORT", "8080")]).port, 8080);
        assert_eq!(config(&[("PORT", "8080"), ("CLOUDBILL_PORT", "9090")]).port, 9090);
        assert_eq!(config(&[("PORT", "not-a-port")]).port, 80);
        assert_eq!(config(&[("CLOUDBILL_REQUEST_TIMEOUT_SECS", "5")]).request_timeout_secs, 5);
    }

    #[test]
    fn test_region_override() {
        assert_eq!(config(&[("CLOUDBILL_REGION", " us-west-2 ")]).region.as_deref(), Some("us-west-2"));
        assert_eq!(config(&[("CLOUDBILL_REGION", "")]).region, None);
    }
}
