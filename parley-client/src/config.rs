use crate::media::MediaConstraints;
use parley_core::IceServerConfig;
use parley_core::utils::{DEFAULT_STUN_ADDR, DEFAULT_STUN_ADDR_2};
use std::env;
use std::time::Duration;

pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    pub ice_servers: Vec<IceServerConfig>,
    pub media: MediaConstraints,
    /// Deadline for reaching `Connected` once an offer is sent or received.
    /// `None` waits forever.
    pub handshake_timeout: Option<Duration>,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec![IceServerConfig {
                urls: vec![DEFAULT_STUN_ADDR.to_owned(), DEFAULT_STUN_ADDR_2.to_owned()],
                username: None,
                credential: None,
            }],
            media: MediaConstraints::default(),
            handshake_timeout: Some(DEFAULT_HANDSHAKE_TIMEOUT),
        }
    }
}

impl CoordinatorConfig {
    /// Default STUN servers plus a TURN relay when `TURN_URL` is set.
    /// `TURN_USERNAME` and `TURN_CREDENTIAL` are passed through as-is.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = env::var("TURN_URL") {
            config.ice_servers.push(IceServerConfig {
                urls: vec![url],
                username: env::var("TURN_USERNAME").ok(),
                credential: env::var("TURN_CREDENTIAL").ok(),
            });
        }
        config
    }

    pub fn with_stun(mut self, urls: Vec<String>) -> Self {
        if !urls.is_empty() {
            self.ice_servers.retain(|s| s.username.is_some());
            self.ice_servers.insert(
                0,
                IceServerConfig {
                    urls,
                    username: None,
                    credential: None,
                },
            );
        }
        self
    }
}

/// Retry schedule for reaching the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(5),
        }
    }
}

impl ReconnectPolicy {
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}
