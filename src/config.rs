use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Top-level config loaded from `kairos-datasource.toml`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct DatasourceConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub kairosdb: KairosConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct KairosConfig {
    #[serde(default = "default_kairos_url")]
    pub url: String,
    #[serde(default = "default_query_path")]
    pub query_path: String,
    /// Per-request HTTP timeout. 0 = no timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for KairosConfig {
    fn default() -> Self {
        Self {
            url: default_kairos_url(),
            query_path: default_query_path(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_kairos_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_query_path() -> String {
    "/api/v1/datapoints/query".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl KairosConfig {
    pub fn query_endpoint(&self) -> String {
        format!(
            "{}/{}",
            self.url.trim_end_matches('/'),
            self.query_path.trim_start_matches('/')
        )
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct DispatchConfig {
    /// Whole-batch deadline. 0 = none.
    #[serde(default)]
    pub deadline_secs: u64,
}

impl DispatchConfig {
    pub fn deadline(&self) -> Option<Duration> {
        (self.deadline_secs > 0).then(|| Duration::from_secs(self.deadline_secs))
    }
}

impl DatasourceConfig {
    /// Load config from a TOML file. Returns defaults if the file doesn't exist.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!("config file not found at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        let config = Self::parse(&contents)?;
        tracing::info!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn parse(contents: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Environment variables take precedence over the file.
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("KAIROSDB_URL") {
            self.kairosdb.url = url;
        }
        if let Ok(addr) = std::env::var("KAIROS_DATASOURCE_LISTEN") {
            self.server.listen_addr = addr;
        }
    }
}
