//! Node configuration with TOML file support.

use crate::NodeError;
use peershare_types::PeerInfo;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for a peershare node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Unique node identifier, also the voting identity.
    #[serde(default = "default_node_id")]
    pub node_id: String,

    /// Host this node binds and advertises.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on for peer connections.
    #[serde(default = "default_port")]
    pub port: u16,

    /// First port probed by discovery.
    #[serde(default = "default_scan_start")]
    pub scan_port_start: u16,

    /// Last port probed by discovery (inclusive).
    #[serde(default = "default_scan_end")]
    pub scan_port_end: u16,

    /// Seconds between driver cycles. Cycles run on multiples of this
    /// interval, so nodes started at different times still tick together.
    #[serde(default = "default_tick_secs")]
    pub tick_secs: u64,

    /// Milliseconds the vote box stays open after broadcasting our ballot.
    #[serde(default = "default_vote_wait_ms")]
    pub vote_wait_ms: u64,

    /// Connect timeout for outbound connections, in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Efficiency score advertised during discovery. When unset the daemon
    /// seeds a random value.
    #[serde(default)]
    pub efficiency_score: Option<f64>,

    /// Reputation score advertised during discovery. When unset the daemon
    /// seeds a random value.
    #[serde(default)]
    pub reputation_score: Option<f64>,

    /// Directory for encrypted file staging.
    #[serde(default = "default_files_dir")]
    pub files_dir: PathBuf,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_node_id() -> String {
    "peershare-node".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_scan_start() -> u16 {
    8000
}

fn default_scan_end() -> u16 {
    8999
}

fn default_tick_secs() -> u64 {
    120
}

fn default_vote_wait_ms() -> u64 {
    2_000
}

fn default_connect_timeout_ms() -> u64 {
    300
}

fn default_files_dir() -> PathBuf {
    PathBuf::from("./peershare_files")
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).expect("NodeConfig is always serializable to TOML")
    }

    /// The advertised `host:port` address.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The port range discovery probes.
    pub fn scan_ports(&self) -> RangeInclusive<u16> {
        self.scan_port_start..=self.scan_port_end
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_secs)
    }

    pub fn vote_wait(&self) -> Duration {
        Duration::from_millis(self.vote_wait_ms)
    }

    /// This node as its peers see it. Unset scores fall back to 0.5.
    pub fn self_peer(&self) -> PeerInfo {
        PeerInfo::new(
            self.node_id.clone(),
            self.addr(),
            self.efficiency_score.unwrap_or(0.5),
            self.reputation_score.unwrap_or(0.5),
        )
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            node_id: default_node_id(),
            host: default_host(),
            port: default_port(),
            scan_port_start: default_scan_start(),
            scan_port_end: default_scan_end(),
            tick_secs: default_tick_secs(),
            vote_wait_ms: default_vote_wait_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            efficiency_score: None,
            reputation_score: None,
            files_dir: default_files_dir(),
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = NodeConfig::default();
        let toml_str = config.to_toml_string();
        let parsed = NodeConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed.port, config.port);
        assert_eq!(parsed.tick_secs, config.tick_secs);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = NodeConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.port, 8000);
        assert_eq!(config.scan_port_end, 8999);
        assert_eq!(config.tick_secs, 120);
        assert_eq!(config.log_format, "human");
        assert!(config.efficiency_score.is_none());
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            node_id = "alice"
            port = 8100
            efficiency_score = 0.9
        "#;
        let config = NodeConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.node_id, "alice");
        assert_eq!(config.port, 8100);
        assert_eq!(config.efficiency_score, Some(0.9));
        assert_eq!(config.log_level, "info"); // default
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = NodeConfig::from_toml_file("/nonexistent/peershare.toml");
        assert!(matches!(result, Err(NodeError::Config(_))));
    }

    #[test]
    fn config_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("node.toml");
        let mut config = NodeConfig::default();
        config.node_id = "bob".into();
        std::fs::write(&path, config.to_toml_string()).unwrap();

        let loaded = NodeConfig::from_toml_file(path.to_str().unwrap()).unwrap();
        assert_eq!(loaded.node_id, "bob");
    }

    #[test]
    fn self_peer_uses_configured_scores() {
        let mut config = NodeConfig::default();
        config.node_id = "alice".into();
        config.efficiency_score = Some(0.9);
        config.reputation_score = Some(0.1);
        let peer = config.self_peer();
        assert_eq!(peer.id, "alice");
        assert_eq!(peer.addr, "127.0.0.1:8000");
        assert_eq!(peer.efficiency_score, 0.9);
    }
}
