use std::time::Duration;

/// Single-shot liveness timer driven by keepalive frames.
///
/// Implemented by the transport crate on top of its runtime's timers. `arm`
/// must replace any running timer, and a timer cancelled by `disarm` must
/// never fire.
pub trait LivenessWatchdog: Send + Sync {
    fn arm(&self, interval: Duration);

    fn disarm(&self);
}
