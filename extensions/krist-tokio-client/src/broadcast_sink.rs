use krist_realtime::dispatch::{Notification, NotificationSink};
use serde_json::Value;
use tokio::sync::broadcast;

/// Forwards dispatcher output to the client's broadcast channels.
///
/// A send with no live receivers is not an error; notifications are simply
/// dropped until someone subscribes.
pub(crate) struct BroadcastSink<'a> {
    pub notifications: &'a broadcast::Sender<Notification>,
    pub raw: &'a broadcast::Sender<Value>,
}

impl NotificationSink for BroadcastSink<'_> {
    fn raw(&self, frame: &Value) {
        if self.raw.receiver_count() > 0 {
            let _ = self.raw.send(frame.clone());
        }
    }

    fn notify(&self, notification: Notification) {
        tracing::trace!("Notification: {}", notification.name());
        let _ = self.notifications.send(notification);
    }
}
