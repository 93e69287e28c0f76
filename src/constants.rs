/// Public node used when no base URL is configured.
pub const DEFAULT_BASE_URL: &str = "https://krist.ceriat.net";

/// Name suffix assumed until the node's `hello` frame announces its own.
pub const DEFAULT_NAME_SUFFIX: &str = "kst";

/// Longest name suffix embedded into the addressing pattern. Longer suffixes
/// are truncated before being escaped.
pub const MAX_NAME_SUFFIX_LENGTH: usize = 6;

/// Longest metaname accepted in front of the `@`.
pub const MAX_METANAME_LENGTH: usize = 32;

/// Longest name accepted before the suffix.
pub const MAX_NAME_LENGTH: usize = 64;

pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 1_000;
pub const DEFAULT_KEEPALIVE_INTERVAL_MS: u64 = 15_000;

/// Path of the bootstrap call that hands out a one-time WebSocket URL.
pub const WS_START_PATH: &str = "/ws/start";

/// Subscription levels understood by the node.
pub mod subscriptions {
    pub const BLOCKS: &str = "blocks";
    pub const OWN_BLOCKS: &str = "ownBlocks";
    pub const TRANSACTIONS: &str = "transactions";
    pub const OWN_TRANSACTIONS: &str = "ownTransactions";
    pub const NAMES: &str = "names";
    pub const OWN_NAMES: &str = "ownNames";
    pub const MOTD: &str = "motd";
    pub const OWN_STAKE: &str = "ownStake";
    pub const STAKES: &str = "stakes";
    pub const VALIDATORS: &str = "validators";

    /// Levels the node attaches to every new session. They are dropped during
    /// bootstrap so callers opt in explicitly.
    pub const SESSION_DEFAULTS: [&str; 3] = [OWN_TRANSACTIONS, BLOCKS, OWN_STAKE];
}
