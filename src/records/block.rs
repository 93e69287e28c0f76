use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub height: u64,
    /// Address of the miner.
    #[serde(rename = "address", default)]
    pub miner: Option<String>,
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub short_hash: Option<String>,
    #[serde(default)]
    pub value: u64,
    #[serde(default)]
    pub time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub difficulty: Option<u64>,
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.short_hash {
            Some(short_hash) => f.write_str(short_hash),
            None => write!(f, "#{}", self.height),
        }
    }
}
