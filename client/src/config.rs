//! Client Configuration
//!
//! Built in code with [`ClientConfig::new`] and the `with_*` setters, or
//! loaded from environment variables.

use std::env;
use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use url::Url;

use crate::cache::DEFAULT_SWEEP_INTERVAL;

/// Default REST API base.
pub const DEFAULT_API_BASE_URL: &str = "https://discord.com/api/v10";

/// Default age after which a cached message is swept (15 min).
pub const DEFAULT_MESSAGE_RETENTION: Duration = Duration::from_secs(900);

/// Client configuration.
#[derive(Clone)]
pub struct ClientConfig {
    /// Bot token sent as `Authorization: Bot <token>`
    pub token: String,

    /// REST API base URL (e.g., `https://discord.com/api/v10`)
    pub api_base_url: Url,

    /// `User-Agent` header value
    pub user_agent: String,

    /// Cached messages older than this are swept (default: 900 = 15 min)
    pub message_retention: Duration,

    /// Time between message sweep passes (default: 300 = 5 min)
    pub message_sweep_interval: Duration,
}

impl ClientConfig {
    /// Configuration with default settings for `token`.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            api_base_url: default_api_base_url(),
            user_agent: default_user_agent(),
            message_retention: DEFAULT_MESSAGE_RETENTION,
            message_sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }

    #[must_use]
    pub fn with_api_base_url(mut self, url: Url) -> Self {
        self.api_base_url = url;
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    #[must_use]
    pub const fn with_message_retention(mut self, retention: Duration) -> Self {
        self.message_retention = retention;
        self
    }

    /// A zero interval turns message sweeping off.
    #[must_use]
    pub const fn with_message_sweep_interval(mut self, interval: Duration) -> Self {
        self.message_sweep_interval = interval;
        self
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let api_base_url = match env::var("TESSERA_API_URL") {
            Ok(raw) => Url::parse(&raw).context("TESSERA_API_URL must be a valid URL")?,
            Err(_) => default_api_base_url(),
        };

        Ok(Self {
            token: env::var("TESSERA_TOKEN").context("TESSERA_TOKEN must be set")?,
            api_base_url,
            user_agent: env::var("TESSERA_USER_AGENT").unwrap_or_else(|_| default_user_agent()),
            message_retention: duration_secs("TESSERA_MESSAGE_RETENTION_SECS")?
                .unwrap_or(DEFAULT_MESSAGE_RETENTION),
            message_sweep_interval: duration_secs("TESSERA_MESSAGE_SWEEP_SECS")?
                .unwrap_or(DEFAULT_SWEEP_INTERVAL),
        })
    }

    /// Create a default configuration for testing.
    ///
    /// Points at a local address nothing listens on; tests pair it with a
    /// mock transport.
    #[must_use]
    pub fn default_for_test() -> Self {
        Self {
            token: "test-token".into(),
            api_base_url: Url::parse("http://127.0.0.1:9/api").unwrap_or_else(|_| default_api_base_url()),
            user_agent: "tessera-client-test".into(),
            message_retention: DEFAULT_MESSAGE_RETENTION,
            message_sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("token", &"<redacted>")
            .field("api_base_url", &self.api_base_url.as_str())
            .field("user_agent", &self.user_agent)
            .field("message_retention", &self.message_retention)
            .field("message_sweep_interval", &self.message_sweep_interval)
            .finish()
    }
}

fn default_api_base_url() -> Url {
    // Constant input; parse cannot fail.
    Url::parse(DEFAULT_API_BASE_URL).unwrap_or_else(|_| unreachable!())
}

fn default_user_agent() -> String {
    format!("tessera-client/{}", env!("CARGO_PKG_VERSION"))
}

/// Read an optional whole-second duration. Zero is rejected.
fn duration_secs(key: &str) -> Result<Option<Duration>> {
    let Ok(raw) = env::var(key) else {
        return Ok(None);
    };
    let secs: u64 = raw
        .trim()
        .parse()
        .with_context(|| format!("{key} must be a whole number of seconds"))?;
    anyhow::ensure!(secs > 0, "{key} must be greater than zero");
    Ok(Some(Duration::from_secs(secs)))
}
