use super::Block;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Session bootstrap snapshot sent by the node right after the socket opens.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hello {
    #[serde(default)]
    pub server_time: Option<String>,
    #[serde(default)]
    pub motd: Option<String>,
    #[serde(default)]
    pub motd_set: Option<String>,
    #[serde(default)]
    pub public_url: Option<String>,
    #[serde(default)]
    pub last_block: Option<Block>,
    /// Current work target.
    #[serde(default)]
    pub work: Option<u64>,
    #[serde(default)]
    pub currency: Option<Currency>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Currency {
    #[serde(default)]
    pub address_prefix: Option<String>,
    #[serde(default)]
    pub name_suffix: Option<String>,
    #[serde(default)]
    pub currency_name: Option<String>,
    #[serde(default)]
    pub currency_symbol: Option<String>,
}

impl Hello {
    /// Reads a `hello` frame one field at a time. A field that is missing or
    /// does not decode is left as `None`; the rest of the frame still counts.
    pub fn from_frame(frame: &Value) -> Hello {
        Hello {
            server_time: lenient(frame, "server_time"),
            motd: lenient(frame, "motd"),
            motd_set: lenient(frame, "motd_set"),
            public_url: lenient(frame, "public_url"),
            last_block: lenient(frame, "last_block"),
            work: lenient(frame, "work"),
            currency: lenient(frame, "currency"),
        }
    }

    pub fn name_suffix(&self) -> Option<&str> {
        self.currency
            .as_ref()
            .and_then(|currency| currency.name_suffix.as_deref())
    }
}

fn lenient<T: DeserializeOwned>(frame: &Value, key: &str) -> Option<T> {
    let value = frame.get(key).filter(|value| !value.is_null())?;
    serde_json::from_value(value.clone())
        .inspect_err(|err| tracing::warn!("Ignoring malformed `{}` in hello: {}", key, err))
        .ok()
}
