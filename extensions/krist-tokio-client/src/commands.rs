use crate::KristClient;
use crate::krist_client::{ClientInner, lock};
use krist_http_client::{KristHttpClient, PagedList, take_field};
use krist_realtime::KristError;
use krist_realtime::frame::CommandFrame;
use krist_realtime::records::{Address, Identity, Name, Stake, Transaction};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tokio_tungstenite::tungstenite::protocol::Message as WsMessage;

impl ClientInner {
    /// Sends one correlated frame and waits for its response.
    pub(crate) async fn send_command(&self, command: CommandFrame) -> Result<Value, KristError> {
        let tx = self.sender()?;
        tracing::debug!("Sending `{}` command", command.command_type().as_str());

        self.correlator()
            .send(command, |frame| {
                tx.send(WsMessage::Text(frame.into()))
                    .map_err(|err| KristError::Transport(err.to_string()))
            })
            .await
    }

    pub(crate) async fn me(&self) -> Result<Identity, KristError> {
        let response = self.send_command(CommandFrame::me()).await?;
        let identity = identity_from(&response)?;
        lock(&self.dispatcher).set_identity(Some(identity.clone()));
        Ok(identity)
    }

    pub(crate) async fn get_stake(&self, address: &str) -> Result<Stake, KristError> {
        let response = self.send_command(CommandFrame::stake(address)).await?;
        let stake: Stake = take_field(response, "stake")?;
        lock(&self.dispatcher).record_stake(&stake);
        Ok(stake)
    }

    pub(crate) async fn unsubscribe(&self, level: &str) -> Result<Vec<String>, KristError> {
        let response = self
            .send_command(CommandFrame::unsubscribe(level))
            .await
            .map_err(|err| with_level(err, level))?;
        Ok(subscription_level(&response))
    }

    fn own_address(&self) -> Result<String, KristError> {
        lock(&self.dispatcher)
            .state()
            .address()
            .map(str::to_owned)
            .ok_or(KristError::MissingIdentity)
    }

    fn resolve_address(&self, address: Option<&str>) -> Result<String, KristError> {
        match address {
            Some(address) => Ok(address.to_owned()),
            None => self.own_address(),
        }
    }
}

/// Socket commands. Each sends one correlated frame and needs an open
/// transport; otherwise it fails with [`KristError::NotConnected`].
impl KristClient {
    /// Queries who the session is authenticated as and records it.
    pub async fn me(&self) -> Result<Identity, KristError> {
        self.inner.me().await
    }

    /// Authenticates the running session. On success the key is held for
    /// signing and for re-authenticating after reconnects.
    pub async fn login(&self, private_key: SecretString) -> Result<Identity, KristError> {
        let response = self
            .inner
            .send_command(CommandFrame::login(private_key.expose_secret()))
            .await?;
        let identity = identity_from(&response)?;

        *self
            .inner
            .private_key
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(private_key);
        lock(&self.inner.dispatcher).set_identity(Some(identity.clone()));

        tracing::info!(
            "Logged in as {}",
            identity.address_str().unwrap_or("guest")
        );
        Ok(identity)
    }

    /// Drops back to a guest session and forgets the held key.
    pub async fn logout(&self) -> Result<Identity, KristError> {
        let response = self.inner.send_command(CommandFrame::logout()).await?;

        *self
            .inner
            .private_key
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;

        let identity = Identity {
            address: None,
            is_guest: response
                .get("isGuest")
                .and_then(Value::as_bool)
                .unwrap_or(true),
        };
        lock(&self.inner.dispatcher).set_identity(Some(identity.clone()));
        Ok(identity)
    }

    /// Looks up `address`, or the session's own address when `None`.
    pub async fn get_address(&self, address: Option<&str>) -> Result<Address, KristError> {
        let address = self.inner.resolve_address(address)?;
        let response = self
            .inner
            .send_command(CommandFrame::address(&address))
            .await?;
        take_field(response, "address")
    }

    /// Stake of `address`, or of the session's own address when `None`.
    /// A self-owned result also updates the session's current stake.
    pub async fn get_stake(&self, address: Option<&str>) -> Result<Stake, KristError> {
        let address = self.inner.resolve_address(address)?;
        self.inner.get_stake(&address).await
    }

    /// Adds `level` to the session's subscriptions and returns the new set.
    pub async fn subscribe(&self, level: &str) -> Result<Vec<String>, KristError> {
        let response = self
            .inner
            .send_command(CommandFrame::subscribe(level))
            .await
            .map_err(|err| with_level(err, level))?;
        Ok(subscription_level(&response))
    }

    pub async fn unsubscribe(&self, level: &str) -> Result<Vec<String>, KristError> {
        self.inner.unsubscribe(level).await
    }

    /// Sends `amount` to `to`, signed with the held private key.
    pub async fn make_transaction(
        &self,
        to: &str,
        amount: u64,
        metadata: Option<&str>,
    ) -> Result<Transaction, KristError> {
        let private_key = self
            .inner
            .held_private_key()
            .ok_or(KristError::MissingPrivateKey)?;

        let command =
            CommandFrame::make_transaction(private_key.expose_secret(), to, amount, metadata);
        let response = self.inner.send_command(command).await?;

        let transaction: Transaction = take_field(response, "transaction")?;
        let name_suffix = lock(&self.inner.dispatcher).state().name_suffix.clone();
        Ok(transaction.enrich_metadata(&name_suffix))
    }

    /// Submits a mining solution. Besides `ok: false`, an answer with
    /// `success: false` is also a rejection.
    pub async fn submit_block(
        &self,
        nonce: &str,
        address: Option<&str>,
    ) -> Result<Value, KristError> {
        let address = self.inner.resolve_address(address)?;
        let response = self
            .inner
            .send_command(CommandFrame::submit_block(nonce, &address))
            .await?;

        if response.get("success").and_then(Value::as_bool) == Some(true) {
            Ok(response)
        } else {
            Err(KristError::Rejected(response))
        }
    }
}

/// HTTP calls that default to the session's own address.
impl KristClient {
    /// HTTP client for the same node, signing with the currently held key.
    pub fn http(&self) -> KristHttpClient {
        let mut http = self.inner.http.clone();
        http.set_private_key(self.inner.held_private_key());
        http
    }

    pub async fn get_transactions(
        &self,
        address: Option<&str>,
        limit: Option<u32>,
    ) -> Result<PagedList<Transaction>, KristError> {
        let address = self.inner.resolve_address(address)?;
        self.http().get_transactions(&address, limit).await
    }

    pub async fn get_names(
        &self,
        address: Option<&str>,
        limit: Option<u32>,
    ) -> Result<PagedList<Name>, KristError> {
        let address = self.inner.resolve_address(address)?;
        self.http().get_names(&address, limit).await
    }
}

fn identity_from(response: &Value) -> Result<Identity, KristError> {
    let address: Option<Address> = match response.get("address") {
        Some(address) if !address.is_null() => Some(serde_json::from_value(address.clone())?),
        _ => None,
    };

    let is_guest = response
        .get("isGuest")
        .and_then(Value::as_bool)
        .unwrap_or(address.is_none());

    Ok(Identity { address, is_guest })
}

fn subscription_level(response: &Value) -> Vec<String> {
    response
        .get("subscription_level")
        .and_then(Value::as_array)
        .map(|levels| {
            levels
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

/// Tags a rejected (un)subscribe with the level it was about.
fn with_level(err: KristError, level: &str) -> KristError {
    match err {
        KristError::Rejected(mut payload) => {
            if let Some(fields) = payload.as_object_mut() {
                fields
                    .entry("event")
                    .or_insert_with(|| Value::from(level));
            }
            KristError::Rejected(payload)
        }
        other => other,
    }
}
