use serde::Deserialize;
use std::path::Path;

pub const CONFIG_FILE: &str = "rss-proxy.toml";

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory the viewer's HTML/CSS/JS is served from. The assets are
    /// not part of this crate; the directory is supplied at deploy time and
    /// every non-API path 404s until it exists.
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

fn default_port() -> u16 {
    3000
}

fn default_static_dir() -> String {
    "static".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            static_dir: default_static_dir(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Parse config from a TOML string (useful for testing)
    pub fn from_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Reads `path` if it exists, falls back to defaults otherwise, then
    /// applies the `PORT` environment variable.
    pub fn from_env<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let config = if path.as_ref().exists() {
            Self::load(path)?
        } else {
            Self::default()
        };

        config.with_port_override(std::env::var("PORT").ok().as_deref())
    }

    pub fn with_port_override(mut self, port: Option<&str>) -> anyhow::Result<Self> {
        if let Some(port) = port {
            self.port = port
                .trim()
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid PORT '{}': {}", port, e))?;
        }
        Ok(self)
    }
}
