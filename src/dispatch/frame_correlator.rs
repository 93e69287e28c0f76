use crate::KristError;
use crate::frame::{CommandFrame, RequestId};
use crate::utils::generate_u16_id;
use futures::channel::oneshot;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

type Completion = oneshot::Sender<Result<Value, KristError>>;

/// Id, serialized frame and completion receiver of a registered command.
pub type Registration = (
    RequestId,
    String,
    oneshot::Receiver<Result<Value, KristError>>,
);

/// Table of commands sent over the socket that still await a response.
///
/// Each entry is resolved exactly once: by the first frame carrying its id,
/// or with [`KristError::Cancelled`] by [`FrameCorrelator::cancel_all`].
///
/// Ids are drawn at random from the full `u16` range without checking the
/// table. If a fresh id collides with an outstanding one, the older entry is
/// displaced and its caller receives `Cancelled`.
pub struct FrameCorrelator {
    pending: Mutex<HashMap<RequestId, Completion>>,
}

impl Default for FrameCorrelator {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameCorrelator {
    pub fn new() -> Self {
        FrameCorrelator {
            pending: Mutex::new(HashMap::new()),
        }
    }

    fn table(&self) -> std::sync::MutexGuard<'_, HashMap<RequestId, Completion>> {
        // Entries are plain channel senders, so a poisoned table is still consistent.
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Stamps a fresh id onto `command` and records a pending entry for it.
    ///
    /// Returns the id, the serialized frame and the receiving half of the
    /// completion slot.
    pub fn register(&self, command: CommandFrame) -> Result<Registration, KristError> {
        self.register_with_id(generate_u16_id(), command)
    }

    /// Like [`FrameCorrelator::register`], with a caller-chosen id.
    pub fn register_with_id(
        &self,
        id: RequestId,
        command: CommandFrame,
    ) -> Result<Registration, KristError> {
        let mut fields = command.into_fields();
        fields.insert("id".into(), Value::from(id));
        let frame = serde_json::to_string(&fields)?;

        let (tx, rx) = oneshot::channel();
        if let Some(displaced) = self.table().insert(id, tx) {
            tracing::warn!("Correlation id {} reused while still pending", id);
            let _ = displaced.send(Err(KristError::Cancelled));
        }

        Ok((id, frame, rx))
    }

    /// Sends `command` through `on_emit` and waits for the matching response.
    ///
    /// Resolves with the whole response frame when it reports `ok: true`,
    /// otherwise with [`KristError::Rejected`] carrying it.
    pub async fn send<E>(&self, command: CommandFrame, on_emit: E) -> Result<Value, KristError>
    where
        E: FnOnce(String) -> Result<(), KristError>,
    {
        let (id, frame, rx) = self.register(command)?;

        if let Err(err) = on_emit(frame) {
            self.table().remove(&id);
            return Err(err);
        }

        match rx.await {
            Ok(result) => result,
            // Sender dropped without an answer.
            Err(oneshot::Canceled) => Err(KristError::Cancelled),
        }
    }

    /// Completes the pending entry for `id` with `frame`.
    ///
    /// Returns `false` when no entry was waiting for that id.
    pub fn resolve(&self, id: RequestId, frame: Value) -> bool {
        let Some(completion) = self.table().remove(&id) else {
            return false;
        };

        let ok = frame.get("ok").and_then(Value::as_bool).unwrap_or(false);
        let result = if ok {
            Ok(frame)
        } else {
            Err(KristError::Rejected(frame))
        };

        // The caller may have stopped waiting; that is not an error here.
        let _ = completion.send(result);
        true
    }

    /// Fails every outstanding entry with [`KristError::Cancelled`] and
    /// empties the table. Returns how many entries were failed.
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<Completion> = self.table().drain().map(|(_, tx)| tx).collect();
        let count = drained.len();

        for completion in drained {
            let _ = completion.send(Err(KristError::Cancelled));
        }

        count
    }

    pub fn pending_count(&self) -> usize {
        self.table().len()
    }

    pub fn is_pending(&self, id: RequestId) -> bool {
        self.table().contains_key(&id)
    }
}
