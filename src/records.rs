//! Typed views over the JSON records the node sends.
//!
//! Fields the node may omit are optional so that a partially populated
//! record still deserializes.

mod address;
mod block;
mod hello;
mod name;
mod stake;
mod transaction;

pub use address::{Address, Identity};
pub use block::Block;
pub use hello::{Currency, Hello};
pub use name::Name;
pub use stake::Stake;
pub use transaction::{Transaction, TransactionType};
