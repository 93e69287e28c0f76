//! Tokio transport for the Krist realtime API.
//!
//! [`KristClient`] drives the session lifecycle on top of the runtime-agnostic
//! dispatch core in `krist-realtime`: it performs the `/ws/start` handshake,
//! feeds every inbound frame to the dispatcher, keeps the keepalive
//! [`TokioWatchdog`] armed and reconnects after unexpected closes.

mod broadcast_sink;
mod client_config;
mod commands;
mod krist_client;
mod tokio_watchdog;

pub use client_config::ClientConfig;
pub use krist_client::KristClient;
pub use tokio_watchdog::TokioWatchdog;

pub use krist_http_client::{KristHttpClient, PagedList};
pub use krist_realtime::dispatch::Notification;
pub use krist_realtime::session::{ConnectionState, SessionState};
