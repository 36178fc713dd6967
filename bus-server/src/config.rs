//! Server configuration from environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Errors reading configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} is not valid: {value:?}")]
    Invalid { name: &'static str, value: String },

    #[error("BUS_STORE_URL must be set unless BUS_MOCK_DATA is")]
    MissingStoreUrl,
}

/// Where bus and booking data comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreSource {
    /// The hosted data API.
    Remote { url: String, key: String },
    /// JSON fixtures in a directory.
    Mock { data_dir: PathBuf },
}

/// Configuration for the server binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub store: StoreSource,
    pub bind_addr: SocketAddr,
    pub static_dir: PathBuf,
    pub station_refresh: Duration,
}

impl ServerConfig {
    /// Default listen address.
    pub const DEFAULT_BIND_ADDR: ([u8; 4], u16) = ([127, 0, 0, 1], 3000);

    /// Default interval between station list refreshes (24 hours).
    pub const DEFAULT_STATION_REFRESH: Duration = Duration::from_secs(24 * 60 * 60);

    pub fn new(store: StoreSource) -> Self {
        Self {
            store,
            bind_addr: SocketAddr::from(Self::DEFAULT_BIND_ADDR),
            static_dir: PathBuf::from("static"),
            station_refresh: Self::DEFAULT_STATION_REFRESH,
        }
    }

    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    pub fn with_static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = dir.into();
        self
    }

    pub fn with_station_refresh(mut self, interval: Duration) -> Self {
        self.station_refresh = interval;
        self
    }

    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let store = match (get("BUS_MOCK_DATA"), get("BUS_STORE_URL")) {
            (Some(dir), _) => StoreSource::Mock {
                data_dir: PathBuf::from(dir),
            },
            (None, Some(url)) => StoreSource::Remote {
                url,
                key: get("BUS_STORE_KEY").unwrap_or_default(),
            },
            (None, None) => return Err(ConfigError::MissingStoreUrl),
        };

        let mut config = Self::new(store);

        if let Some(addr) = get("BUS_BIND_ADDR") {
            let parsed = addr.parse().map_err(|_| ConfigError::Invalid {
                name: "BUS_BIND_ADDR",
                value: addr.clone(),
            })?;
            config = config.with_bind_addr(parsed);
        }

        if let Some(dir) = get("BUS_STATIC_DIR") {
            config = config.with_static_dir(dir);
        }

        if let Some(secs) = get("BUS_STATION_REFRESH_SECS") {
            let secs: u64 = secs
                .parse()
                .ok()
                .filter(|s| *s > 0)
                .ok_or_else(|| ConfigError::Invalid {
                    name: "BUS_STATION_REFRESH_SECS",
                    value: secs.clone(),
                })?;
            config = config.with_station_refresh(Duration::from_secs(secs));
        }

        Ok(config)
    }
}
