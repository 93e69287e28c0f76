//! Runtime-agnostic core of the Krist realtime client.
//!
//! Nothing in this crate owns a socket or a timer. It turns inbound JSON
//! frames into typed [`dispatch::Notification`]s, correlates command frames
//! with their responses, and parses the metadata mini-language carried in
//! transactions. Transport crates (see `krist-tokio-client`) feed it frames
//! and supply the watchdog timer.

pub mod constants;
pub mod dispatch;
mod error;
pub mod frame;
pub mod metadata;
pub mod records;
pub mod session;
pub mod utils;

pub use error::KristError;
