use krist_realtime::constants::subscriptions::{BLOCKS, TRANSACTIONS};
use krist_realtime::records::{Transaction, TransactionType};
use krist_tokio_client::{ClientConfig, KristClient, Notification};
use secrecy::SecretString;
use tokio::sync::broadcast::error::RecvError;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Both are optional: the public node, as a guest.
    let mut config = ClientConfig::default();
    if let Ok(url) = std::env::var("KRIST_URL") {
        config.base_url = url;
    }
    if let Ok(private_key) = std::env::var("KRIST_PRIVATE_KEY") {
        config = config.with_private_key(SecretString::from(private_key));
    }

    let client = match KristClient::new(config) {
        Ok(client) => client,
        Err(err) => {
            tracing::error!("Could not create client: {}", err);
            return;
        }
    };
    let mut notifications = client.subscribe_notifications();

    if let Err(err) = client.connect().await {
        tracing::error!("Could not connect: {}", err);
        return;
    }

    match client.session().address() {
        Some(address) => tracing::info!("Logged in as {}", address),
        None => tracing::info!("Logged in as a guest"),
    }

    for level in [BLOCKS, TRANSACTIONS] {
        if let Err(err) = client.subscribe(level).await {
            tracing::warn!("Could not subscribe to {}: {}", level, err);
        }
    }

    loop {
        let notification = tokio::select! {
            notification = notifications.recv() => notification,
            _ = tokio::signal::ctrl_c() => break,
        };

        match notification {
            Ok(Notification::Block(block)) => {
                let work = client.session().current_work.unwrap_or_default();
                tracing::info!(
                    "BK: {}; {}KST => {}; Work {} => {}",
                    block.height,
                    block.value,
                    block.miner.as_deref().unwrap_or("?"),
                    block.difficulty.unwrap_or_default(),
                    work
                );
            }
            Ok(Notification::Transaction(transaction)) if transaction.kind != TransactionType::Mined => {
                tracing::info!("{}", describe(&transaction));
            }
            Ok(Notification::Disconnected) => tracing::warn!("Disconnected, waiting to reconnect"),
            Ok(Notification::TimedOut) => tracing::warn!("Node stopped sending keepalives"),
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => tracing::warn!("Skipped {} notifications", skipped),
            Err(RecvError::Closed) => break,
        }
    }

    client.disconnect().await;
}

fn describe(transaction: &Transaction) -> String {
    let metadata = transaction.metadata_record.clone().unwrap_or_default();
    let from = transaction.from.as_deref().unwrap_or("?");
    let to = transaction.to.as_deref().unwrap_or("?");

    let sender = match &metadata.return_recipient {
        Some(recipient) => format!("{recipient} ({from})"),
        None => from.to_owned(),
    };
    let receiver = match &metadata.recipient {
        Some(recipient) => format!("{recipient} ({to})"),
        None => to.to_owned(),
    };

    format!(
        "TX: {}; {} => {}KST => {}; {}",
        transaction.id,
        sender,
        transaction.value,
        receiver,
        transaction.metadata.as_deref().unwrap_or("")
    )
}
