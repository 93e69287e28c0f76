use serde_json::Value;
use thiserror::Error;

/// Errors surfaced to callers of the Krist client crates.
///
/// Malformed metadata and unrecognized frames are deliberately absent: the
/// parser degrades to an empty record and unknown frames become
/// [`crate::dispatch::Notification::Unknown`].
#[derive(Debug, Error)]
pub enum KristError {
    /// The bootstrap call or the WebSocket upgrade failed.
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// The node answered with `ok: false`. The payload is kept verbatim.
    #[error("request rejected by node: {0}")]
    Rejected(Value),

    /// The session was torn down while the request was outstanding.
    #[error("request cancelled by session teardown")]
    Cancelled,

    #[error("no open transport")]
    NotConnected,

    #[error("session is already running")]
    AlreadyConnected,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("http error: {0}")]
    Http(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The call defaults to the session's own address, but the session is a guest.
    #[error("session has no authenticated address")]
    MissingIdentity,

    /// The call signs with the private key, but none is held.
    #[error("no private key configured")]
    MissingPrivateKey,
}

impl KristError {
    /// The server payload attached to a rejection, if any.
    pub fn rejection_payload(&self) -> Option<&Value> {
        match self {
            KristError::Rejected(payload) => Some(payload),
            _ => None,
        }
    }
}
