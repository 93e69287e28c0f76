use crate::metadata::{MetadataRecord, parse_metadata};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Transfer,
    Mined,
    NamePurchase,
    NameARecord,
    NameTransfer,
    Staking,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: u64,
    /// Absent for mined transactions.
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub value: u64,
    #[serde(default)]
    pub time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub name: Option<String>,
    /// Raw metadata string as sent by the node.
    #[serde(default)]
    pub metadata: Option<String>,
    #[serde(rename = "type")]
    pub kind: TransactionType,

    /// Parsed form of `metadata`, filled in when the transaction arrives as a
    /// realtime event.
    #[serde(skip)]
    pub metadata_record: Option<MetadataRecord>,
}

impl Transaction {
    /// Parses the raw metadata against `name_suffix` and stores the result.
    pub fn enrich_metadata(mut self, name_suffix: &str) -> Self {
        self.metadata_record = Some(self.parse_metadata(name_suffix));
        self
    }

    /// Parses the raw metadata on demand; missing metadata gives an empty record.
    pub fn parse_metadata(&self, name_suffix: &str) -> MetadataRecord {
        self.metadata
            .as_deref()
            .map(|raw| parse_metadata(raw, name_suffix))
            .unwrap_or_default()
    }
}
