use krist_http_client::DEFAULT_USER_AGENT;
use krist_realtime::constants::{
    DEFAULT_BASE_URL, DEFAULT_KEEPALIVE_INTERVAL_MS, DEFAULT_NAME_SUFFIX,
    DEFAULT_RECONNECT_DELAY_MS,
};
use secrecy::SecretString;
use std::fmt;
use std::time::Duration;

/// Settings for a [`crate::KristClient`].
#[derive(Clone)]
pub struct ClientConfig {
    /// HTTP root of the node. The WebSocket URL is obtained from it.
    pub base_url: String,
    /// Authenticates the session at handshake time. `None` connects as a guest.
    pub private_key: Option<SecretString>,
    /// Reopen the session after the transport closes unexpectedly.
    pub auto_reconnect: bool,
    /// Fixed pause before each reconnection attempt.
    pub reconnect_delay: Duration,
    /// How long the session may go without a keepalive before
    /// [`krist_realtime::dispatch::Notification::TimedOut`] is raised.
    pub keepalive_interval: Duration,
    /// Suffix used for metadata parsing until the node announces its own.
    pub name_suffix: String,
    pub user_agent: String,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("private_key", &self.private_key.as_ref().map(|_| "[REDACTED]"))
            .field("auto_reconnect", &self.auto_reconnect)
            .field("reconnect_delay", &self.reconnect_delay)
            .field("keepalive_interval", &self.keepalive_interval)
            .field("name_suffix", &self.name_suffix)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            base_url: DEFAULT_BASE_URL.to_owned(),
            private_key: None,
            auto_reconnect: true,
            reconnect_delay: Duration::from_millis(DEFAULT_RECONNECT_DELAY_MS),
            keepalive_interval: Duration::from_millis(DEFAULT_KEEPALIVE_INTERVAL_MS),
            name_suffix: DEFAULT_NAME_SUFFIX.to_owned(),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        ClientConfig {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_private_key(mut self, private_key: SecretString) -> Self {
        self.private_key = Some(private_key);
        self
    }

    pub fn with_auto_reconnect(mut self, auto_reconnect: bool) -> Self {
        self.auto_reconnect = auto_reconnect;
        self
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub fn with_keepalive_interval(mut self, interval: Duration) -> Self {
        self.keepalive_interval = interval;
        self
    }

    pub fn with_name_suffix(mut self, name_suffix: impl Into<String>) -> Self {
        self.name_suffix = name_suffix.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}
