use crate::ClientConfig;
use crate::TokioWatchdog;
use crate::broadcast_sink::BroadcastSink;
use futures_util::future::BoxFuture;
use futures_util::{FutureExt, SinkExt, StreamExt};
use krist_http_client::KristHttpClient;
use krist_realtime::KristError;
use krist_realtime::constants::subscriptions::SESSION_DEFAULTS;
use krist_realtime::dispatch::{EventDispatcher, FrameCorrelator, LivenessWatchdog, Notification};
use krist_realtime::records::Hello;
use krist_realtime::session::{ConnectionState, SessionState};
use secrecy::SecretString;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message as WsMessage};

const CHANNEL_CAPACITY: usize = 1024;

/// How long a closing transport may take to flush its close frame.
const CLOSE_GRACE: Duration = Duration::from_secs(1);

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Realtime connection to a Krist node.
///
/// Owns the WebSocket session: the bootstrap handshake, the keepalive
/// watchdog, reconnection, and the socket commands. Observers follow the
/// session through [`KristClient::subscribe_notifications`].
///
/// Dropping the client stops every background task it started.
pub struct KristClient {
    pub(crate) inner: Arc<ClientInner>,
}

pub(crate) struct ClientInner {
    pub(crate) config: ClientConfig,
    pub(crate) http: KristHttpClient,
    correlator: Arc<FrameCorrelator>,
    pub(crate) dispatcher: Mutex<EventDispatcher>,
    notifications: broadcast::Sender<Notification>,
    raw: broadcast::Sender<Value>,
    watchdog: Arc<TokioWatchdog>,
    state: Mutex<ConnectionState>,
    running: AtomicBool,
    /// Bumped for every transport; close handlers of older ones are ignored.
    epoch: AtomicU64,
    transport: Mutex<Option<Transport>>,
    reconnect_task: Mutex<Option<JoinHandle<()>>>,
    ready_tx: Mutex<Option<oneshot::Sender<Hello>>>,
    pub(crate) private_key: RwLock<Option<SecretString>>,
}

/// One open socket and the tasks serving it.
struct Transport {
    epoch: u64,
    tx: mpsc::UnboundedSender<WsMessage>,
    send_task: JoinHandle<()>,
    tasks: Vec<JoinHandle<()>>,
}

impl Transport {
    /// Stops reading, then lets the send loop flush and close the socket.
    async fn close(self) {
        let Transport {
            tx,
            mut send_task,
            tasks,
            ..
        } = self;

        for task in tasks {
            task.abort();
        }

        drop(tx);
        if tokio::time::timeout(CLOSE_GRACE, &mut send_task)
            .await
            .is_err()
        {
            send_task.abort();
        }
    }

    fn abort(self) {
        self.send_task.abort();
        for task in self.tasks {
            task.abort();
        }
    }
}

impl KristClient {
    /// Fails only when the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, KristError> {
        let (notifications, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (raw, _) = broadcast::channel(CHANNEL_CAPACITY);

        let correlator = Arc::new(FrameCorrelator::new());
        let watchdog = Arc::new(TokioWatchdog::new(notifications.clone()));
        let dispatcher = EventDispatcher::new(correlator.clone(), config.name_suffix.clone())
            .with_watchdog(watchdog.clone(), config.keepalive_interval);

        let http = KristHttpClient::with_user_agent(&config.base_url, &config.user_agent)?;
        let private_key = config.private_key.clone();

        Ok(KristClient {
            inner: Arc::new(ClientInner {
                config,
                http,
                correlator,
                dispatcher: Mutex::new(dispatcher),
                notifications,
                raw,
                watchdog,
                state: Mutex::new(ConnectionState::Idle),
                running: AtomicBool::new(false),
                epoch: AtomicU64::new(0),
                transport: Mutex::new(None),
                reconnect_task: Mutex::new(None),
                ready_tx: Mutex::new(None),
                private_key: RwLock::new(private_key),
            }),
        })
    }

    /// Opens the session and waits until it is ready.
    ///
    /// Resolves with the node's `hello` snapshot the first time the session
    /// becomes ready. A failing bootstrap HTTP call is returned as an error.
    /// A failing WebSocket upgrade enters the reconnect cycle when
    /// `auto_reconnect` is set, and is returned otherwise. Later reconnects
    /// only surface as notifications.
    pub async fn connect(&self) -> Result<Hello, KristError> {
        let inner = &self.inner;

        if inner.running.swap(true, Ordering::SeqCst) {
            return Err(KristError::AlreadyConnected);
        }

        let (ready_tx, ready_rx) = oneshot::channel();
        *lock(&inner.ready_tx) = Some(ready_tx);

        if let Err(err) = inner.first_session().await {
            inner.running.store(false, Ordering::SeqCst);
            lock(&inner.ready_tx).take();
            inner.set_state(ConnectionState::Idle);
            return Err(err);
        }

        // Dropped by `disconnect()` before the session became ready.
        ready_rx.await.map_err(|_| KristError::Cancelled)
    }

    /// Tears the session down and stops reconnecting.
    ///
    /// Outstanding socket commands fail with [`KristError::Cancelled`].
    pub async fn disconnect(&self) {
        let inner = &self.inner;
        let was_running = inner.running.swap(false, Ordering::SeqCst);

        if let Some(task) = lock(&inner.reconnect_task).take() {
            task.abort();
        }
        inner.watchdog.disarm();

        inner.epoch.fetch_add(1, Ordering::SeqCst);
        let transport = lock(&inner.transport).take();
        if let Some(transport) = transport {
            transport.close().await;
        }

        let cancelled = inner.correlator.cancel_all();
        lock(&inner.ready_tx).take();
        inner.set_state(ConnectionState::Idle);

        if was_running {
            tracing::info!(
                "Realtime session stopped ({} pending requests cancelled)",
                cancelled
            );
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn state(&self) -> ConnectionState {
        *lock(&self.inner.state)
    }

    /// True between `connect()` and `disconnect()`, including while
    /// reconnecting.
    pub fn is_running(&self) -> bool {
        self.inner.is_running()
    }

    /// Snapshot of the session-state record.
    pub fn session(&self) -> SessionState {
        lock(&self.inner.dispatcher).state().clone()
    }

    pub fn subscribe_notifications(&self) -> broadcast::Receiver<Notification> {
        self.inner.notifications.subscribe()
    }

    /// Every decoded inbound frame, verbatim, before classification.
    pub fn subscribe_raw(&self) -> broadcast::Receiver<Value> {
        self.inner.raw.subscribe()
    }

    /// Socket commands still waiting for their response.
    pub fn pending_requests(&self) -> usize {
        self.inner.correlator.pending_count()
    }
}

impl Drop for KristClient {
    fn drop(&mut self) {
        let inner = &self.inner;
        inner.running.store(false, Ordering::SeqCst);

        if let Some(task) = lock(&inner.reconnect_task).take() {
            task.abort();
        }
        inner.watchdog.disarm();

        if let Some(transport) = lock(&inner.transport).take() {
            transport.abort();
        }
        inner.correlator.cancel_all();
    }
}

impl ClientInner {
    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn set_state(&self, state: ConnectionState) {
        *lock(&self.state) = state;
        tracing::debug!("Session state: {}", state);
    }

    pub(crate) fn held_private_key(&self) -> Option<SecretString> {
        self.private_key
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub(crate) fn sender(&self) -> Result<mpsc::UnboundedSender<WsMessage>, KristError> {
        lock(&self.transport)
            .as_ref()
            .map(|transport| transport.tx.clone())
            .ok_or(KristError::NotConnected)
    }

    pub(crate) fn correlator(&self) -> &FrameCorrelator {
        &self.correlator
    }

    async fn first_session(self: &Arc<Self>) -> Result<(), KristError> {
        let url = self.start_session().await?;

        match self.open_transport(&url).await {
            Ok(()) => Ok(()),
            Err(err) if self.config.auto_reconnect && self.is_running() => {
                tracing::warn!("Initial connection failed, retrying: {}", err);
                self.set_state(ConnectionState::Closed);
                self.schedule_reconnect();
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Asks the node for a one-time socket URL.
    async fn start_session(&self) -> Result<String, KristError> {
        self.set_state(ConnectionState::Handshaking);
        tracing::info!("Starting realtime session at {}", self.config.base_url);

        let private_key = self.held_private_key();
        self.http
            .start_session(private_key.as_ref())
            .await
            .map_err(|err| {
                tracing::error!("Session bootstrap failed: {}", err);
                match err {
                    KristError::Http(message) => KristError::Handshake(message),
                    other => other,
                }
            })
    }

    async fn open_transport(self: &Arc<Self>, url: &str) -> Result<(), KristError> {
        let (ws_stream, _) = connect_async(url).await.map_err(|err| {
            tracing::error!("WebSocket upgrade failed: {}", err);
            KristError::Handshake(err.to_string())
        })?;

        if !self.is_running() {
            return Err(KristError::Cancelled);
        }

        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        lock(&self.dispatcher).reset_connection();

        let (mut ws_sink, mut ws_stream) = ws_stream.split();
        let (tx, mut rx) = mpsc::unbounded_channel::<WsMessage>();

        // Send loop
        let send_task = tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                if let Err(err) = ws_sink.send(message).await {
                    tracing::debug!("Socket send failed: {}", err);
                    break;
                }
            }
            let _ = ws_sink.close().await;
        });

        // Subscribed before the first frame is read so the hello cannot be missed.
        let bootstrap_task = tokio::spawn(
            self.clone()
                .bootstrap(self.notifications.subscribe(), epoch),
        );

        let previous = lock(&self.transport).replace(Transport {
            epoch,
            tx,
            send_task,
            tasks: vec![bootstrap_task],
        });
        if let Some(previous) = previous {
            previous.abort();
        }

        self.set_state(ConnectionState::Open);
        self.watchdog.arm(self.config.keepalive_interval);
        tracing::info!("Realtime socket open");

        // Receive loop
        let recv_inner = self.clone();
        let recv_task = tokio::spawn(async move {
            while let Some(message) = ws_stream.next().await {
                match message {
                    Ok(WsMessage::Text(text)) => recv_inner.read_frame(text.as_str()),
                    Ok(WsMessage::Close(frame)) => {
                        tracing::info!("Node closed the socket: {:?}", frame);
                        break;
                    }
                    Ok(_) => {}
                    Err(err) => {
                        tracing::warn!("Socket read failed: {}", err);
                        break;
                    }
                }
            }

            // Detached, since closing the transport aborts this task.
            tokio::spawn(recv_inner.on_transport_closed(epoch));
        });

        match lock(&self.transport).as_mut() {
            Some(transport) if transport.epoch == epoch => transport.tasks.push(recv_task),
            _ => recv_task.abort(),
        }

        if !self.is_running() {
            if let Some(transport) = self.take_transport(epoch) {
                transport.close().await;
            }
            return Err(KristError::Cancelled);
        }

        Ok(())
    }

    fn take_transport(&self, epoch: u64) -> Option<Transport> {
        let mut slot = lock(&self.transport);
        if slot.as_ref().is_some_and(|transport| transport.epoch == epoch) {
            slot.take()
        } else {
            None
        }
    }

    fn read_frame(&self, text: &str) {
        let sink = BroadcastSink {
            notifications: &self.notifications,
            raw: &self.raw,
        };

        // Not-JSON frames are logged by the dispatcher and skipped.
        let _ = lock(&self.dispatcher).read_text(text, &sink);
    }

    /// Waits for the `hello` frame, then reconciles identity, stake and the
    /// node's default subscriptions. The session is ready once every step has
    /// settled, whether or not it succeeded.
    async fn bootstrap(
        self: Arc<Self>,
        mut notifications: broadcast::Receiver<Notification>,
        epoch: u64,
    ) {
        let hello = loop {
            match notifications.recv().await {
                Ok(Notification::Hello(hello)) => break hello,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return,
            }
        };
        drop(notifications);

        match self.me().await {
            Ok(identity) => {
                if let Some(address) = identity.address_str() {
                    if let Err(err) = self.get_stake(address).await {
                        tracing::warn!("Could not fetch stake during bootstrap: {}", err);
                    }
                }
            }
            Err(err) => tracing::warn!("Identity query failed during bootstrap: {}", err),
        }

        for level in SESSION_DEFAULTS {
            if let Err(err) = self.unsubscribe(level).await {
                // Guests have no `ownStake` subscription to drop.
                tracing::debug!("Could not drop default subscription {}: {}", level, err);
            }
        }

        if self.epoch.load(Ordering::SeqCst) != epoch || !self.is_running() {
            return;
        }

        self.set_state(ConnectionState::Ready);
        tracing::info!("Realtime session ready");
        let _ = self.notifications.send(Notification::Ready);

        if let Some(ready_tx) = lock(&self.ready_tx).take() {
            let _ = ready_tx.send(hello);
        }
    }

    async fn on_transport_closed(self: Arc<Self>, epoch: u64) {
        let Some(transport) = self.take_transport(epoch) else {
            return;
        };

        self.watchdog.disarm();
        transport.close().await;

        let cancelled = self.correlator.cancel_all();
        self.set_state(ConnectionState::Closed);
        tracing::info!(
            "Realtime socket closed ({} pending requests cancelled)",
            cancelled
        );

        if !self.is_running() {
            return;
        }

        let _ = self.notifications.send(Notification::Disconnected);

        if self.config.auto_reconnect {
            self.schedule_reconnect();
        } else {
            self.running.store(false, Ordering::SeqCst);
            lock(&self.ready_tx).take();
        }
    }

    fn schedule_reconnect(self: &Arc<Self>) {
        let task = tokio::spawn(self.clone().reconnect_loop());
        if let Some(previous) = lock(&self.reconnect_task).replace(task) {
            previous.abort();
        }
    }

    /// Retries the full handshake after a fixed delay until one succeeds or
    /// the session stops running.
    ///
    /// Boxed because it reaches `open_transport`, which spawns the close
    /// handler that schedules this loop again.
    fn reconnect_loop(self: Arc<Self>) -> BoxFuture<'static, ()> {
        async move {
            loop {
                tracing::info!("Reconnecting in {:?}", self.config.reconnect_delay);
                tokio::time::sleep(self.config.reconnect_delay).await;

                if !self.is_running() {
                    return;
                }
                let _ = self.notifications.send(Notification::Reconnecting);

                let attempt = match self.start_session().await {
                    Ok(url) => self.open_transport(&url).await,
                    Err(err) => Err(err),
                };

                match attempt {
                    Ok(()) => return,
                    Err(err) => {
                        tracing::warn!("Reconnect attempt failed: {}", err);
                        if !self.is_running() {
                            return;
                        }
                        self.set_state(ConnectionState::Closed);
                        let _ = self.notifications.send(Notification::Disconnected);
                    }
                }
            }
        }
        .boxed()
    }
}
