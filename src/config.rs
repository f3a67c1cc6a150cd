use serde::Deserialize;
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: IpAddr,
    pub port: u16,
    pub artifact_dir: PathBuf,
    pub log_predictions: bool,
    /// Seconds a session may sit unused before it is evicted.
    pub session_idle_secs: u64,
    pub max_sessions: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::from([0, 0, 0, 0]),
            port: 8080,
            artifact_dir: PathBuf::from("artifacts"),
            log_predictions: false,
            session_idle_secs: 30 * 60,
            max_sessions: 10_000,
        }
    }
}

impl ServerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// `RECOMMENDER_CONFIG` file (if set), then `BIND_ADDR`, `PORT`, `ARTIFACT_DIR`, `LOG_PRED`,
    /// `SESSION_IDLE_SECS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut cfg = match var("RECOMMENDER_CONFIG") {
            Some(p) => Self::load(Path::new(&p))?,
            None => Self::default(),
        };
        if let Some(v) = var("BIND_ADDR") {
            cfg.bind_addr = v.parse().map_err(|_| ConfigError::InvalidEnv {
                var: "BIND_ADDR",
                value: v.clone(),
            })?;
        }
        if let Some(v) = var("PORT") {
            cfg.port = v.parse().map_err(|_| ConfigError::InvalidEnv {
                var: "PORT",
                value: v.clone(),
            })?;
        }
        if let Some(v) = var("ARTIFACT_DIR") {
            cfg.artifact_dir = PathBuf::from(v);
        }
        if let Some(v) = var("LOG_PRED") {
            cfg.log_predictions = v == "1";
        }
        if let Some(v) = var("SESSION_IDLE_SECS") {
            cfg.session_idle_secs = v.parse().map_err(|_| ConfigError::InvalidEnv {
                var: "SESSION_IDLE_SECS",
                value: v.clone(),
            })?;
        }
        Ok(cfg)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }

    pub fn session_idle(&self) -> Duration {
        Duration::from_secs(self.session_idle_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k: &str| map.get(k).cloned()
    }

    #[test]
    fn defaults_without_env() {
        let cfg = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg, ServerConfig::default());
        assert_eq!(cfg.socket_addr().to_string(), "0.0.0.0:8080");
    }

    #[test]
    fn env_overrides() {
        let cfg = ServerConfig::from_lookup(lookup(&[
            ("PORT", "9000"),
            ("BIND_ADDR", "127.0.0.1"),
            ("ARTIFACT_DIR", "/srv/models"),
            ("LOG_PRED", "1"),
            ("SESSION_IDLE_SECS", "90"),
        ]))
        .unwrap();
        assert_eq!(cfg.socket_addr().to_string(), "127.0.0.1:9000");
        assert_eq!(cfg.artifact_dir, PathBuf::from("/srv/models"));
        assert!(cfg.log_predictions);
        assert_eq!(cfg.session_idle(), Duration::from_secs(90));
    }

    #[test]
    fn bad_port_is_an_error() {
        let err = ServerConfig::from_lookup(lookup(&[("PORT", "http")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { var: "PORT", .. }));
    }

    #[test]
    fn file_values_apply_before_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recommender.json");
        fs::write(&path, r#"{"port": 7000, "artifact_dir": "models", "max_sessions": 64}"#).unwrap();
        let p = path.to_string_lossy().to_string();

        let cfg = ServerConfig::from_lookup(lookup(&[("RECOMMENDER_CONFIG", p.as_str())])).unwrap();
        assert_eq!(cfg.port, 7000);
        assert_eq!(cfg.artifact_dir, PathBuf::from("models"));
        assert_eq!(cfg.max_sessions, 64);
        assert_eq!(cfg.session_idle_secs, 30 * 60);

        let cfg = ServerConfig::from_lookup(lookup(&[
            ("RECOMMENDER_CONFIG", p.as_str()),
            ("PORT", "7001"),
        ]))
        .unwrap();
        assert_eq!(cfg.port, 7001);
    }
}
