use super::{FrameCorrelator, LivenessWatchdog, Notification, NotificationSink};
use crate::KristError;
use crate::constants::DEFAULT_KEEPALIVE_INTERVAL_MS;
use crate::frame::{EventKind, FrameKind, RequestId};
use crate::records::{Block, Hello, Identity, Name, Stake, Transaction, TransactionType};
use crate::session::SessionState;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Classifies inbound frames and turns them into notifications.
///
/// The dispatcher owns the [`SessionState`] record. Frames are handled one at
/// a time, in the order they are passed in, and every frame is mirrored to
/// [`NotificationSink::raw`] before it is classified.
pub struct EventDispatcher {
    state: SessionState,
    correlator: Arc<FrameCorrelator>,
    watchdog: Option<Arc<dyn LivenessWatchdog>>,
    keepalive_interval: Duration,
}

impl EventDispatcher {
    pub fn new(correlator: Arc<FrameCorrelator>, name_suffix: impl Into<String>) -> Self {
        EventDispatcher {
            state: SessionState::new(name_suffix),
            correlator,
            watchdog: None,
            keepalive_interval: Duration::from_millis(DEFAULT_KEEPALIVE_INTERVAL_MS),
        }
    }

    /// Keepalive frames re-arm `watchdog` with `interval`.
    pub fn with_watchdog(
        mut self,
        watchdog: Arc<dyn LivenessWatchdog>,
        interval: Duration,
    ) -> Self {
        self.watchdog = Some(watchdog);
        self.keepalive_interval = interval;
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn correlator(&self) -> &Arc<FrameCorrelator> {
        &self.correlator
    }

    /// Decodes one text frame and dispatches it.
    ///
    /// Text that is not JSON is reported as an error and otherwise ignored;
    /// it never reaches the sink.
    pub fn read_text<S>(&mut self, text: &str, sink: &S) -> Result<FrameKind, KristError>
    where
        S: NotificationSink + ?Sized,
    {
        let frame: Value = serde_json::from_str(text).inspect_err(|err| {
            tracing::warn!("Dropping inbound frame that is not JSON: {}", err);
        })?;

        Ok(self.dispatch(frame, sink))
    }

    /// Dispatches one decoded frame and returns how it was classified.
    pub fn dispatch<S>(&mut self, frame: Value, sink: &S) -> FrameKind
    where
        S: NotificationSink + ?Sized,
    {
        sink.raw(&frame);

        let kind = FrameKind::classify(&frame);

        match kind {
            FrameKind::Response { id } => self.on_response(id, frame, sink),
            FrameKind::Hello => self.on_hello(&frame, sink),
            FrameKind::Keepalive => self.on_keepalive(&frame, sink),
            FrameKind::Event(event) => self.on_event(event, frame, sink),
            FrameKind::Unknown => {
                tracing::debug!("Unrecognized frame: {}", frame);
                sink.notify(Notification::Unknown(frame));
            }
        }

        kind
    }

    fn on_response<S>(&mut self, id: Option<RequestId>, frame: Value, sink: &S)
    where
        S: NotificationSink + ?Sized,
    {
        if let Some(levels) = frame.get("subscription_level").and_then(Value::as_array) {
            self.state.subscription_level = levels
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect();
        }

        let Some(id) = id else {
            // No request id can ever match this frame.
            tracing::debug!("Response with unusable id: {}", frame["id"]);
            sink.notify(Notification::Unknown(frame));
            return;
        };

        if !self.correlator.resolve(id, frame) {
            tracing::debug!("Response {} has no pending request", id);
        }
    }

    fn on_hello<S>(&mut self, frame: &Value, sink: &S)
    where
        S: NotificationSink + ?Sized,
    {
        let hello = Hello::from_frame(frame);

        self.state.current_block = hello.last_block.clone();
        self.state.current_work = hello.work;
        if let Some(suffix) = hello.name_suffix() {
            self.state.name_suffix = suffix.to_owned();
        }
        self.state.hello = Some(hello.clone());

        sink.notify(Notification::Hello(hello));
    }

    fn on_keepalive<S>(&mut self, frame: &Value, sink: &S)
    where
        S: NotificationSink + ?Sized,
    {
        if let Some(watchdog) = &self.watchdog {
            watchdog.arm(self.keepalive_interval);
        }

        let server_time = frame
            .get("server_time")
            .and_then(Value::as_str)
            .and_then(|time| DateTime::parse_from_rfc3339(time).ok())
            .map(|time| time.with_timezone(&Utc));

        sink.notify(Notification::Keepalive { server_time });
    }

    fn on_event<S>(&mut self, event: EventKind, frame: Value, sink: &S)
    where
        S: NotificationSink + ?Sized,
    {
        let notifications = match event {
            EventKind::Block => self.on_block(&frame),
            EventKind::Transaction => self.on_transaction(&frame),
            EventKind::Validator => self.on_validator(&frame),
            EventKind::Stake => self.on_stake(&frame),
            EventKind::Unknown => None,
        };

        match notifications {
            Some(notifications) => {
                for notification in notifications {
                    sink.notify(notification);
                }
            }
            None => sink.notify(Notification::Unknown(frame)),
        }
    }

    fn on_block(&mut self, frame: &Value) -> Option<Vec<Notification>> {
        let block: Block = field(frame, "block")?;

        if let Some(work) = frame.get("new_work").and_then(Value::as_u64) {
            self.state.current_work = Some(work);
        }
        self.state.current_block = Some(block.clone());

        Some(vec![Notification::Block(block)])
    }

    fn on_transaction(&mut self, frame: &Value) -> Option<Vec<Notification>> {
        let transaction: Transaction = field(frame, "transaction")?;
        let transaction = transaction.enrich_metadata(&self.state.name_suffix);

        let derived = derive_name_notification(&transaction);

        let mut notifications = vec![Notification::Transaction(transaction)];
        notifications.extend(derived);
        Some(notifications)
    }

    fn on_validator(&mut self, frame: &Value) -> Option<Vec<Notification>> {
        let validator = frame.get("validator")?.as_str()?.to_owned();
        self.state.current_validator = Some(validator.clone());
        Some(vec![Notification::Validator(validator)])
    }

    fn on_stake(&mut self, frame: &Value) -> Option<Vec<Notification>> {
        let stake: Stake = field(frame, "stake")?;
        self.record_stake(&stake);
        Some(vec![Notification::Stake(stake)])
    }

    /// Stores `stake` as the current stake when it belongs to the session's
    /// own address.
    pub fn record_stake(&mut self, stake: &Stake) {
        if self.state.owns(&stake.owner) {
            self.state.current_stake = Some(stake.clone());
        }
    }

    /// Records who the session is authenticated as. `None` forgets the
    /// identity along with the stake that belonged to it.
    pub fn set_identity(&mut self, identity: Option<Identity>) {
        let keeps_address = match (&identity, self.state.address()) {
            (Some(identity), Some(current)) => identity.address_str() == Some(current),
            _ => false,
        };

        if !keeps_address {
            self.state.current_stake = None;
        }
        self.state.identity = identity;
    }

    /// Clears the per-connection snapshot ahead of a new transport. The
    /// identity and name suffix survive.
    pub fn reset_connection(&mut self) {
        self.state.hello = None;
        self.state.current_block = None;
        self.state.current_work = None;
        self.state.current_validator = None;
        self.state.subscription_level.clear();
    }
}

/// Deserializes `frame[key]`, logging and returning `None` on mismatch.
fn field<T: DeserializeOwned>(frame: &Value, key: &str) -> Option<T> {
    let value = frame.get(key)?.clone();
    serde_json::from_value(value)
        .inspect_err(|err| tracing::warn!("Malformed `{}` in event frame: {}", key, err))
        .ok()
}

/// Name notifications implied by a transaction's type.
fn derive_name_notification(transaction: &Transaction) -> Option<Notification> {
    let name = transaction.name.clone().unwrap_or_default();
    let sender = transaction.from.clone();

    match transaction.kind {
        TransactionType::NamePurchase => Some(Notification::NamePurchase(Name {
            name,
            owner: sender.clone(),
            original_owner: sender,
            ..Default::default()
        })),
        TransactionType::NameTransfer => Some(Notification::NameTransfer(Name {
            name,
            owner: transaction.to.clone(),
            previous_owner: sender,
            ..Default::default()
        })),
        TransactionType::NameARecord => Some(Notification::NameRecordChange(Name {
            name,
            owner: sender,
            a_record: transaction.metadata.clone(),
            ..Default::default()
        })),
        _ => None,
    }
}
