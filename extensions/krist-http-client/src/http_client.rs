use crate::PagedList;
use krist_realtime::KristError;
use krist_realtime::constants::WS_START_PATH;
use krist_realtime::records::{Address, Name, Stake, Transaction};
use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use std::fmt;

pub const DEFAULT_USER_AGENT: &str = concat!("krist-realtime/", env!("CARGO_PKG_VERSION"));

/// Client for the request/reply half of the Krist API.
///
/// Every endpoint answers `{ok: bool, ...}`; `ok: false` is returned as
/// [`KristError::Rejected`] with the body untouched.
#[derive(Clone)]
pub struct KristHttpClient {
    client: Client,
    base_url: String,
    private_key: Option<SecretString>,
}

impl fmt::Debug for KristHttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KristHttpClient")
            .field("base_url", &self.base_url)
            .field("private_key", &self.private_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl KristHttpClient {
    /// Client for `base_url` (usually [`krist_realtime::constants::DEFAULT_BASE_URL`]).
    pub fn new(base_url: impl Into<String>) -> Result<Self, KristError> {
        Self::with_user_agent(base_url, DEFAULT_USER_AGENT)
    }

    /// Fails with [`KristError::Http`] when the TLS backend cannot be set up.
    pub fn with_user_agent(
        base_url: impl Into<String>,
        user_agent: &str,
    ) -> Result<Self, KristError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|err| KristError::Http(format!("failed to build HTTP client: {err}")))?;

        Ok(Self::with_client(client, base_url))
    }

    /// Uses a preconfigured `reqwest` client (proxies, timeouts, user agent).
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        KristHttpClient {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            private_key: None,
        }
    }

    pub fn with_private_key(mut self, private_key: SecretString) -> Self {
        self.private_key = Some(private_key);
        self
    }

    pub fn set_private_key(&mut self, private_key: Option<SecretString>) {
        self.private_key = private_key;
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn signing_key(&self) -> Result<&str, KristError> {
        self.private_key
            .as_ref()
            .map(|key| key.expose_secret())
            .ok_or(KristError::MissingPrivateKey)
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Value, KristError> {
        let body = self.read_body(request).await?;

        if body.get("ok").and_then(Value::as_bool) == Some(true) {
            Ok(body)
        } else {
            tracing::debug!("Node rejected request: {}", body);
            Err(KristError::Rejected(body))
        }
    }

    /// Sends `request` and decodes its JSON body without judging `ok`.
    async fn read_body(&self, request: RequestBuilder) -> Result<Value, KristError> {
        let response = request
            .send()
            .await
            .map_err(|err| KristError::Http(err.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| KristError::Http(err.to_string()))?;

        match serde_json::from_slice(&body) {
            Ok(body) => Ok(body),
            Err(_) if !status.is_success() => Err(KristError::Http(format!("HTTP {status}"))),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn get_json(&self, path: &str) -> Result<Value, KristError> {
        tracing::debug!("GET {}", path);
        self.execute(self.client.get(self.url(path))).await
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> Result<Value, KristError> {
        tracing::debug!("POST {}", path);
        self.execute(self.client.post(self.url(path)).json(body)).await
    }

    /// Requests a one-time WebSocket URL. With a key the session starts
    /// authenticated, otherwise as a guest.
    ///
    /// Only an explicit `ok: false` is a rejection; a reply carrying just
    /// `url` is accepted.
    pub async fn start_session(
        &self,
        private_key: Option<&SecretString>,
    ) -> Result<String, KristError> {
        let request = self.client.post(self.url(WS_START_PATH));
        let request = match private_key {
            Some(key) => request.json(&json!({ "privatekey": key.expose_secret() })),
            None => request,
        };

        tracing::debug!("POST {}", WS_START_PATH);
        let response = self.read_body(request).await?;
        if response.get("ok").and_then(Value::as_bool) == Some(false) {
            return Err(KristError::Rejected(response));
        }

        response
            .get("url")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| KristError::Handshake(format!("no url in {WS_START_PATH} response")))
    }

    /// Richest addresses, `limit` entries (the original default is 50).
    pub async fn get_richest(&self, limit: u32) -> Result<Vec<Address>, KristError> {
        let response = self
            .get_json(&format!("/addresses/rich?limit={limit}"))
            .await?;
        take_field(response, "addresses")
    }

    pub async fn get_address(&self, address: &str) -> Result<Address, KristError> {
        let response = self.get_json(&format!("/addresses/{address}")).await?;
        take_field(response, "address")
    }

    /// Non-mining transactions involving `address`, newest first.
    pub async fn get_transactions(
        &self,
        address: &str,
        limit: Option<u32>,
    ) -> Result<PagedList<Transaction>, KristError> {
        let mut path = format!("/addresses/{address}/transactions?excludeMined=true");
        if let Some(limit) = limit {
            path.push_str(&format!("&limit={limit}"));
        }

        let response = self.get_json(&path).await?;
        PagedList::from_response(response, "transactions")
    }

    pub async fn get_name(&self, name: &str) -> Result<Name, KristError> {
        let response = self.get_json(&format!("/names/{name}")).await?;
        take_field(response, "name")
    }

    pub async fn get_names(
        &self,
        address: &str,
        limit: Option<u32>,
    ) -> Result<PagedList<Name>, KristError> {
        let path = with_limit(format!("/addresses/{address}/names"), limit);
        let response = self.get_json(&path).await?;
        PagedList::from_response(response, "names")
    }

    pub async fn get_stakes(&self, limit: Option<u32>) -> Result<PagedList<Stake>, KristError> {
        let path = with_limit("/staking".to_owned(), limit);
        let response = self.get_json(&path).await?;
        PagedList::from_response(response, "stakes")
    }

    /// Full work statistics, returned as sent by the node.
    pub async fn get_detailed_work(&self) -> Result<Value, KristError> {
        self.get_json("/work/detailed").await
    }

    /// Work target for each minute of the last 24 hours.
    pub async fn get_day_work(&self) -> Result<Vec<u64>, KristError> {
        let response = self.get_json("/work/day").await?;
        take_field(response, "work")
    }

    pub async fn register_name(&self, name: &str) -> Result<Value, KristError> {
        let body = self.signed(Map::new())?;
        self.post_json(&format!("/names/{name}"), &body).await
    }

    pub async fn transfer_name(&self, name: &str, recipient: &str) -> Result<Name, KristError> {
        let mut fields = Map::new();
        fields.insert("address".into(), Value::from(recipient));
        let body = self.signed(fields)?;

        let response = self
            .post_json(&format!("/names/{name}/transfer"), &body)
            .await?;
        take_field(response, "name")
    }

    /// Replaces the name's A record; `None` clears it.
    pub async fn update_name(&self, name: &str, record: Option<&str>) -> Result<Name, KristError> {
        let mut fields = Map::new();
        fields.insert("a".into(), record.map(Value::from).unwrap_or(Value::Null));
        let body = self.signed(fields)?;

        let response = self
            .post_json(&format!("/names/{name}/update"), &body)
            .await?;
        take_field(response, "name")
    }

    pub async fn deposit_stake(&self, amount: u64) -> Result<Stake, KristError> {
        let mut fields = Map::new();
        fields.insert("amount".into(), Value::from(amount));
        let body = self.signed(fields)?;

        let response = self.post_json("/staking", &body).await?;
        take_field(response, "stake")
    }

    pub async fn withdraw_stake(&self, amount: u64) -> Result<Stake, KristError> {
        let mut fields = Map::new();
        fields.insert("amount".into(), Value::from(amount));
        let body = self.signed(fields)?;

        let response = self.post_json("/staking/withdraw", &body).await?;
        take_field(response, "stake")
    }

    fn signed(&self, mut fields: Map<String, Value>) -> Result<Value, KristError> {
        fields.insert("privatekey".into(), Value::from(self.signing_key()?));
        Ok(Value::Object(fields))
    }
}

fn with_limit(mut path: String, limit: Option<u32>) -> String {
    if let Some(limit) = limit {
        path.push_str(&format!("?limit={limit}"));
    }
    path
}

/// Deserializes `response[key]`; a missing key deserializes from `null`.
pub fn take_field<T: DeserializeOwned>(mut response: Value, key: &str) -> Result<T, KristError> {
    let value = response
        .get_mut(key)
        .map(Value::take)
        .unwrap_or(Value::Null);
    Ok(serde_json::from_value(value)?)
}
