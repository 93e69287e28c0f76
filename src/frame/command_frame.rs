use serde_json::{Map, Value};

/// Command `type` values the node accepts over the socket.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CommandType {
    Me,
    Login,
    Logout,
    Address,
    Stake,
    Subscribe,
    Unsubscribe,
    MakeTransaction,
    SubmitBlock,
}

impl CommandType {
    pub fn as_str(self) -> &'static str {
        match self {
            CommandType::Me => "me",
            CommandType::Login => "login",
            CommandType::Logout => "logout",
            CommandType::Address => "address",
            CommandType::Stake => "stake",
            CommandType::Subscribe => "subscribe",
            CommandType::Unsubscribe => "unsubscribe",
            CommandType::MakeTransaction => "make_transaction",
            CommandType::SubmitBlock => "submit_block",
        }
    }
}

/// An outbound command frame without its correlation id.
///
/// The id is stamped by [`crate::dispatch::FrameCorrelator`] when the frame
/// is sent.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandFrame {
    command_type: CommandType,
    fields: Map<String, Value>,
}

impl CommandFrame {
    pub fn new(command_type: CommandType) -> Self {
        let mut fields = Map::new();
        fields.insert("type".into(), Value::from(command_type.as_str()));
        CommandFrame {
            command_type,
            fields,
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_owned(), value.into());
        self
    }

    pub fn command_type(&self) -> CommandType {
        self.command_type
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }

    pub fn me() -> Self {
        Self::new(CommandType::Me)
    }

    pub fn login(private_key: &str) -> Self {
        Self::new(CommandType::Login).with("privatekey", private_key)
    }

    pub fn logout() -> Self {
        Self::new(CommandType::Logout)
    }

    pub fn address(address: &str) -> Self {
        Self::new(CommandType::Address).with("address", address)
    }

    pub fn stake(address: &str) -> Self {
        Self::new(CommandType::Stake).with("address", address)
    }

    pub fn subscribe(level: &str) -> Self {
        Self::new(CommandType::Subscribe).with("event", level)
    }

    pub fn unsubscribe(level: &str) -> Self {
        Self::new(CommandType::Unsubscribe).with("event", level)
    }

    pub fn make_transaction(
        private_key: &str,
        to: &str,
        amount: u64,
        metadata: Option<&str>,
    ) -> Self {
        let frame = Self::new(CommandType::MakeTransaction)
            .with("privatekey", private_key)
            .with("to", to)
            .with("amount", amount);

        match metadata {
            Some(metadata) => frame.with("metadata", metadata),
            None => frame,
        }
    }

    pub fn submit_block(nonce: &str, address: &str) -> Self {
        Self::new(CommandType::SubmitBlock)
            .with("nonce", nonce)
            .with("address", address)
    }
}
