use crate::records::{Block, Hello, Name, Stake, Transaction};
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Everything the realtime session reports to its observers.
///
/// Frame-derived variants come from [`super::EventDispatcher`]; the lifecycle
/// variants (`Disconnected`, `Reconnecting`, `Ready`, `TimedOut`) are raised
/// by the transport crate.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Hello(Hello),
    Keepalive {
        /// `None` when the node's timestamp could not be parsed.
        server_time: Option<DateTime<Utc>>,
    },
    Block(Block),
    Transaction(Transaction),
    NamePurchase(Name),
    NameTransfer(Name),
    NameRecordChange(Name),
    /// Address of the new validator.
    Validator(String),
    Stake(Stake),
    /// A frame that matched no known shape, verbatim.
    Unknown(Value),
    Disconnected,
    Reconnecting,
    Ready,
    /// No keepalive arrived within the configured interval. Informational:
    /// the session is not closed because of it.
    TimedOut,
}

impl Notification {
    /// Stable event name, matching the node's vocabulary.
    pub fn name(&self) -> &'static str {
        match self {
            Notification::Hello(_) => "hello",
            Notification::Keepalive { .. } => "keepalive",
            Notification::Block(_) => "block",
            Notification::Transaction(_) => "transaction",
            Notification::NamePurchase(_) => "namePurchase",
            Notification::NameTransfer(_) => "nameTransfer",
            Notification::NameRecordChange(_) => "nameRecordChange",
            Notification::Validator(_) => "validator",
            Notification::Stake(_) => "stake",
            Notification::Unknown(_) => "unknown",
            Notification::Disconnected => "disconnected",
            Notification::Reconnecting => "reconnecting",
            Notification::Ready => "ready",
            Notification::TimedOut => "timedOut",
        }
    }
}

/// Receiver of dispatch output.
///
/// `raw` sees every decoded frame before it is classified; `notify` sees the
/// classified result. Both are called synchronously, in frame order.
pub trait NotificationSink {
    fn raw(&self, frame: &Value);

    fn notify(&self, notification: Notification);
}
