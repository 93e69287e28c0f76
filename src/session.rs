mod connection_state;
mod session_state;

pub use connection_state::ConnectionState;
pub use session_state::SessionState;
