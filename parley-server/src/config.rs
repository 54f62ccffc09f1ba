use anyhow::{Context, Result, bail};
use parley_core::utils::DEFAULT_WS_PATH;
use std::env;
use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub bind_addr: SocketAddr,
    /// Route the WebSocket endpoint is mounted on. Must start with `/`.
    pub ws_path: String,
    /// CORS allow-origin; `*` allows any origin, `None` adds no CORS layer.
    pub allow_origin: Option<String>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            ws_path: DEFAULT_WS_PATH.to_string(),
            allow_origin: None,
        }
    }
}

impl RelayConfig {
    /// Reads `PARLEY_BIND`, `PARLEY_WS_PATH` and `PARLEY_ALLOW_ORIGIN`,
    /// falling back to the defaults for anything unset.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(bind) = env::var("PARLEY_BIND") {
            config.bind_addr = bind
                .parse()
                .with_context(|| format!("PARLEY_BIND is not a socket address: {bind}"))?;
        }
        if let Ok(path) = env::var("PARLEY_WS_PATH") {
            config.ws_path = path;
        }
        config.allow_origin = env::var("PARLEY_ALLOW_ORIGIN").ok();

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.ws_path.starts_with('/') {
            bail!("WebSocket path must start with '/': {}", self.ws_path);
        }
        Ok(())
    }
}
