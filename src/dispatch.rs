mod event_dispatcher;
mod frame_correlator;
mod liveness_watchdog;
mod notification;

pub use event_dispatcher::EventDispatcher;
pub use frame_correlator::{FrameCorrelator, Registration};
pub use liveness_watchdog::LivenessWatchdog;
pub use notification::{Notification, NotificationSink};
