// Dashboard Configuration
// TOML file with server, display, and logging sections; environment overrides on top.

use crate::charts::ChartLayout;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub server: ServerConfig,
    pub dashboard: DisplayConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
    pub enable_cors: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub default_kpi_count: usize,
    pub display_precision: usize,
    pub trend_width: u32,
    pub trend_height: u32,
    pub bar_width: u32,
    pub bar_height: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level for perfdash's own events when neither a flag nor `RUST_LOG` is given
    pub level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8501,
            max_upload_bytes: 10 * 1024 * 1024,
            enable_cors: true,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        let layout = ChartLayout::default();
        Self {
            default_kpi_count: crate::metadata::DEFAULT_SELECTED_KPIS,
            display_precision: layout.precision,
            trend_width: layout.trend_width,
            trend_height: layout.trend_height,
            bar_width: layout.bar_width,
            bar_height: layout.bar_height,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl DisplayConfig {
    pub fn chart_layout(&self) -> ChartLayout {
        ChartLayout {
            precision: self.display_precision,
            trend_width: self.trend_width,
            trend_height: self.trend_height,
            bar_width: self.bar_width,
            bar_height: self.bar_height,
        }
    }
}

impl DashboardConfig {
    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: DashboardConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Defaults with environment variable overrides
    pub fn load() -> anyhow::Result<Self> {
        Self::default().with_env_overrides()
    }

    pub fn with_env_overrides(mut self) -> anyhow::Result<Self> {
        if let Ok(host) = std::env::var("PERFDASH_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("PERFDASH_PORT") {
            self.server.port = port.parse()?;
        }
        if let Ok(limit) = std::env::var("PERFDASH_MAX_UPLOAD_BYTES") {
            self.server.max_upload_bytes = limit.parse()?;
        }
        Ok(self)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
