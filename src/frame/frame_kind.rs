use serde_json::Value;

/// Correlation id carried by command frames and their responses.
pub type RequestId = u16;

/// Sub-classification of `{"type": "event"}` frames.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum EventKind {
    Block,
    Transaction,
    Validator,
    Stake,
    Unknown,
}

/// Classification of one inbound frame.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FrameKind {
    /// The frame carries an `id` field. `id` is `None` when the field is not
    /// a `u16`, in which case it can never match a pending request.
    Response { id: Option<RequestId> },
    Hello,
    Keepalive,
    Event(EventKind),
    Unknown,
}

impl FrameKind {
    /// Classifies a decoded frame without looking past its top-level fields.
    pub fn classify(frame: &Value) -> FrameKind {
        let Some(object) = frame.as_object() else {
            return FrameKind::Unknown;
        };

        if let Some(id) = object.get("id") {
            let id = id.as_u64().and_then(|id| RequestId::try_from(id).ok());
            return FrameKind::Response { id };
        }

        match object.get("type").and_then(Value::as_str) {
            Some("hello") => FrameKind::Hello,
            Some("keepalive") => FrameKind::Keepalive,
            Some("event") => {
                let kind = match object.get("event").and_then(Value::as_str) {
                    Some("block") => EventKind::Block,
                    Some("transaction") => EventKind::Transaction,
                    Some("validator") => EventKind::Validator,
                    Some("stake") => EventKind::Stake,
                    _ => EventKind::Unknown,
                };
                FrameKind::Event(kind)
            }
            _ => FrameKind::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn id_wins_over_type() {
        let frame = json!({"id": 7, "ok": true, "type": "hello"});
        assert_eq!(
            FrameKind::classify(&frame),
            FrameKind::Response { id: Some(7) }
        );
    }

    #[test]
    fn out_of_range_id_is_still_a_response() {
        let frame = json!({"id": 70000, "ok": true});
        assert_eq!(
            FrameKind::classify(&frame),
            FrameKind::Response { id: None }
        );
    }

    #[test]
    fn event_sub_kinds() {
        for (event, kind) in [
            ("block", EventKind::Block),
            ("transaction", EventKind::Transaction),
            ("validator", EventKind::Validator),
            ("stake", EventKind::Stake),
            ("name", EventKind::Unknown),
        ] {
            let frame = json!({"type": "event", "event": event});
            assert_eq!(FrameKind::classify(&frame), FrameKind::Event(kind));
        }
    }

    #[test]
    fn non_objects_are_unknown() {
        assert_eq!(FrameKind::classify(&json!([1, 2])), FrameKind::Unknown);
        assert_eq!(FrameKind::classify(&json!({"type": "motd"})), FrameKind::Unknown);
    }
}
