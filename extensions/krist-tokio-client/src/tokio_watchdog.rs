use krist_realtime::dispatch::{LivenessWatchdog, Notification};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Keepalive watchdog backed by a single tokio timer task.
///
/// Arming replaces any running timer. When a timer runs out it publishes
/// [`Notification::TimedOut`] and nothing else.
pub struct TokioWatchdog {
    notifications: broadcast::Sender<Notification>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl TokioWatchdog {
    pub fn new(notifications: broadcast::Sender<Notification>) -> Self {
        TokioWatchdog {
            notifications,
            timer: Mutex::new(None),
        }
    }

    pub fn is_armed(&self) -> bool {
        self.slot()
            .as_ref()
            .is_some_and(|timer| !timer.is_finished())
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.timer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl LivenessWatchdog for TokioWatchdog {
    fn arm(&self, interval: Duration) {
        let notifications = self.notifications.clone();

        let timer = tokio::spawn(async move {
            tokio::time::sleep(interval).await;
            tracing::warn!("No keepalive received within {:?}", interval);
            let _ = notifications.send(Notification::TimedOut);
        });

        if let Some(previous) = self.slot().replace(timer) {
            previous.abort();
        }
    }

    fn disarm(&self) {
        if let Some(timer) = self.slot().take() {
            timer.abort();
        }
    }
}

impl Drop for TokioWatchdog {
    fn drop(&mut self) {
        self.disarm();
    }
}
