use serde::Serialize;
use std::collections::BTreeMap;

/// Structured view of a transaction's metadata string.
///
/// Produced by [`super::parse_metadata`]. Every field is optional; input that
/// does not parse yields `MetadataRecord::default()`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetadataRecord {
    /// Part before the `@` in `metaname@name.kst`.
    pub metaname: Option<String>,

    /// Addressed name including its suffix, e.g. `name.kst`.
    pub name: Option<String>,

    /// `metaname@name.kst` when a metaname is present, otherwise `name.kst`.
    pub recipient: Option<String>,

    /// Remaining `key=value` segments. Segments without `=` are keyed by
    /// their zero-based position.
    pub custom: BTreeMap<String, String>,

    pub return_metaname: Option<String>,
    pub return_name: Option<String>,
    pub return_recipient: Option<String>,
}

impl MetadataRecord {
    pub fn is_empty(&self) -> bool {
        self == &MetadataRecord::default()
    }

    /// Raw value of the `return` custom field, before it was parsed.
    pub fn return_field(&self) -> Option<&str> {
        self.custom.get("return").map(String::as_str)
    }
}
