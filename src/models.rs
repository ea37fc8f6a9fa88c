use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default name reserved for pushback alerts
pub const DEFAULT_ALERT_NAME: &str = "/pushback/alerts";

/// Detection and mitigation configuration
///
/// Every node on a path must agree on `alert_name` and `scale`; neither is
/// negotiated on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StrategyConfig {
    /// Whether pushback alerts are exchanged with neighbours
    pub distributed: bool,
    /// Factor applied to both thresholds when a pushback is accepted
    pub scale: f64,
    /// Initial satisfaction (forwarded/replied) threshold
    pub omega: f64,
    /// Initial occupancy threshold as a fraction of the table size
    pub rho: f64,
    /// Name recognised as a pushback alert
    pub alert_name: String,
    /// Statistics window in milliseconds
    pub window_ms: u64,
    /// Minimum gap between two alerts on the same face, in milliseconds
    pub wait_time_ms: u64,
}

impl StrategyConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    pub fn wait_time(&self) -> Duration {
        Duration::from_millis(self.wait_time_ms)
    }

    /// Check value ranges, returning a description of the first offending field
    pub fn validate(&self) -> Result<(), String> {
        if !(self.scale > 0.0 && self.scale < 1.0) {
            return Err(format!("scale must lie in (0, 1), got {}", self.scale));
        }
        if !(self.omega > 0.0) || !self.omega.is_finite() {
            return Err(format!("omega must be positive, got {}", self.omega));
        }
        if !(self.rho > 0.0 && self.rho < 1.0) {
            return Err(format!("rho must lie in (0, 1), got {}", self.rho));
        }
        if !self.alert_name.starts_with('/') || self.alert_name.trim_matches('/').is_empty() {
            return Err(format!("alert name {:?} is not a non-empty name", self.alert_name));
        }
        if self.window_ms == 0 {
            return Err("window must be longer than zero".to_string());
        }
        Ok(())
    }
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            distributed: false,
            scale: 0.5,
            omega: 3.0,
            rho: 0.125,
            alert_name: DEFAULT_ALERT_NAME.to_string(),
            window_ms: 10_000,
            wait_time_ms: 60,
        }
    }
}

/// Admin server configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Admin server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Detection and mitigation configuration
    #[serde(default)]
    pub strategy: StrategyConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = StrategyConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.window(), Duration::from_secs(10));
        assert_eq!(config.wait_time(), Duration::from_millis(60));
    }

    #[test]
    fn rejects_out_of_range_values() {
        let bad_scale = StrategyConfig { scale: 1.0, ..Default::default() };
        assert!(bad_scale.validate().unwrap_err().contains("scale"));

        let bad_rho = StrategyConfig { rho: 0.0, ..Default::default() };
        assert!(bad_rho.validate().unwrap_err().contains("rho"));

        let bad_omega = StrategyConfig { omega: -1.0, ..Default::default() };
        assert!(bad_omega.validate().unwrap_err().contains("omega"));

        let bad_name = StrategyConfig { alert_name: "/".to_string(), ..Default::default() };
        assert!(bad_name.validate().is_err());

        let bad_window = StrategyConfig { window_ms: 0, ..Default::default() };
        assert!(bad_window.validate().is_err());
    }
}
