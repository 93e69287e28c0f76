use krist_realtime::KristError;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// One page of a listing endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct PagedList<T> {
    /// Items on this page.
    pub count: u64,
    /// Items across all pages.
    pub total: u64,
    pub items: Vec<T>,
}

impl<T: DeserializeOwned> PagedList<T> {
    /// Reads `count`, `total` and the array stored under `items_key`.
    pub fn from_response(mut response: Value, items_key: &str) -> Result<Self, KristError> {
        let items = response
            .get_mut(items_key)
            .map(Value::take)
            .unwrap_or_else(|| Value::Array(Vec::new()));
        let items: Vec<T> = serde_json::from_value(items)?;

        let count = response
            .get("count")
            .and_then(Value::as_u64)
            .unwrap_or(items.len() as u64);
        let total = response
            .get("total")
            .and_then(Value::as_u64)
            .unwrap_or(count);

        Ok(PagedList {
            count,
            total,
            items,
        })
    }
}
