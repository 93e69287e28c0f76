use crate::records::{Block, Hello, Identity, Stake};

/// Cross-cutting session fields.
///
/// Owned by [`crate::dispatch::EventDispatcher`] and only mutated on its
/// dispatch path; everyone else reads snapshots.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub hello: Option<Hello>,
    pub current_block: Option<Block>,
    pub current_work: Option<u64>,
    /// Address of the current validator.
    pub current_validator: Option<String>,
    /// Stake of the authenticated address, when known.
    pub current_stake: Option<Stake>,
    /// Last subscription level reported by the node.
    pub subscription_level: Vec<String>,
    pub identity: Option<Identity>,
    /// Suffix used to recognize names in transaction metadata.
    pub name_suffix: String,
}

impl SessionState {
    pub fn new(name_suffix: impl Into<String>) -> Self {
        SessionState {
            name_suffix: name_suffix.into(),
            ..Default::default()
        }
    }

    /// The authenticated address, `None` for guests or before `me` resolves.
    pub fn address(&self) -> Option<&str> {
        self.identity.as_ref().and_then(Identity::address_str)
    }

    pub fn is_guest(&self) -> bool {
        self.identity.as_ref().is_none_or(|identity| identity.is_guest)
    }

    pub fn owns(&self, address: &str) -> bool {
        self.address() == Some(address)
    }
}
