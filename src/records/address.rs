use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub address: String,
    #[serde(default)]
    pub balance: Option<u64>,
    #[serde(default)]
    pub totalin: Option<u64>,
    #[serde(default)]
    pub totalout: Option<u64>,
    #[serde(default)]
    pub firstseen: Option<DateTime<Utc>>,
}

impl Address {
    /// An address known only by its string, as referenced from other records.
    pub fn bare(address: impl Into<String>) -> Self {
        Address {
            address: address.into(),
            balance: None,
            totalin: None,
            totalout: None,
            firstseen: None,
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address)
    }
}

/// Who the session is authenticated as.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    /// Absent for guest sessions.
    pub address: Option<Address>,
    pub is_guest: bool,
}

impl Identity {
    pub fn guest() -> Self {
        Identity {
            address: None,
            is_guest: true,
        }
    }

    pub fn address_str(&self) -> Option<&str> {
        self.address.as_ref().map(|a| a.address.as_str())
    }
}
