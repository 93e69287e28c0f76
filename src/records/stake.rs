use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stake {
    pub owner: String,
    #[serde(rename = "stake", default)]
    pub amount: u64,
    #[serde(default)]
    pub active: bool,
}
