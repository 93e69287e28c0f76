use futures::executor::block_on;
use krist_realtime::KristError;
use krist_realtime::dispatch::FrameCorrelator;
use krist_realtime::frame::CommandFrame;
use serde_json::{Value, json};
use std::cell::RefCell;

#[test]
fn responses_only_reach_their_own_request() {
    let correlator = FrameCorrelator::new();

    let (id_a, _, mut rx_a) = correlator.register_with_id(1, CommandFrame::me()).unwrap();
    let (id_b, _, mut rx_b) = correlator.register_with_id(2, CommandFrame::logout()).unwrap();

    assert!(correlator.resolve(id_b, json!({"id": id_b, "ok": true, "who": "b"})));

    let b = rx_b.try_recv().unwrap().expect("b resolved").unwrap();
    assert_eq!(b["who"], "b");
    assert!(rx_a.try_recv().unwrap().is_none(), "a must still be pending");

    assert!(correlator.resolve(id_a, json!({"id": id_a, "ok": true, "who": "a"})));
    let a = rx_a.try_recv().unwrap().expect("a resolved").unwrap();
    assert_eq!(a["who"], "a");
}

#[test]
fn only_first_matching_frame_resolves() {
    let correlator = FrameCorrelator::new();
    let (id, _, mut rx) = correlator.register_with_id(5, CommandFrame::me()).unwrap();

    assert!(correlator.resolve(id, json!({"id": id, "ok": true, "n": 1})));
    assert!(!correlator.resolve(id, json!({"id": id, "ok": true, "n": 2})));

    let first = rx.try_recv().unwrap().unwrap().unwrap();
    assert_eq!(first["n"], 1);
    assert_eq!(correlator.pending_count(), 0);
}

#[test]
fn ok_false_is_a_rejection_with_payload() {
    let correlator = FrameCorrelator::new();
    let (id, _, mut rx) = correlator
        .register_with_id(8, CommandFrame::subscribe("nonsense"))
        .unwrap();

    let payload = json!({"id": id, "ok": false, "error": "invalid_parameter"});
    correlator.resolve(id, payload.clone());

    match rx.try_recv().unwrap().unwrap() {
        Err(KristError::Rejected(got)) => assert_eq!(got, payload),
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[test]
fn cancel_all_fails_every_outstanding_request() {
    let correlator = FrameCorrelator::new();
    let mut receivers = Vec::new();
    for id in 0..5 {
        let (_, _, rx) = correlator.register_with_id(id, CommandFrame::me()).unwrap();
        receivers.push(rx);
    }

    assert_eq!(correlator.cancel_all(), 5);
    assert_eq!(correlator.pending_count(), 0);

    for mut rx in receivers {
        assert!(matches!(
            rx.try_recv().unwrap().unwrap(),
            Err(KristError::Cancelled)
        ));
    }

    // The table is reusable afterwards.
    let (id, _, _rx) = correlator.register(CommandFrame::me()).unwrap();
    assert!(correlator.is_pending(id));
    assert_eq!(correlator.pending_count(), 1);
}

#[test]
fn colliding_id_displaces_older_request() {
    let correlator = FrameCorrelator::new();
    let (_, _, mut older) = correlator.register_with_id(77, CommandFrame::me()).unwrap();
    let (_, _, mut newer) = correlator.register_with_id(77, CommandFrame::me()).unwrap();

    assert!(matches!(
        older.try_recv().unwrap().unwrap(),
        Err(KristError::Cancelled)
    ));
    correlator.resolve(77, json!({"id": 77, "ok": true}));
    assert!(newer.try_recv().unwrap().unwrap().is_ok());
}

#[test]
fn send_stamps_id_and_awaits_response() {
    let correlator = FrameCorrelator::new();
    let emitted: RefCell<Option<String>> = RefCell::new(None);

    let (result, ()) = block_on(async {
        futures::join!(
            correlator.send(CommandFrame::address("kabc000000"), |frame| {
                *emitted.borrow_mut() = Some(frame);
                Ok(())
            }),
            async {
                let frame: Value =
                    serde_json::from_str(emitted.borrow().as_deref().unwrap()).unwrap();
                assert_eq!(frame["type"], "address");
                assert_eq!(frame["address"], "kabc000000");
                let id = frame["id"].as_u64().unwrap() as u16;
                correlator.resolve(id, json!({"id": id, "ok": true, "address": {"address": "kabc000000"}}));
            }
        )
    });

    assert_eq!(result.unwrap()["address"]["address"], "kabc000000");
}

#[test]
fn failed_emit_leaves_no_pending_entry() {
    let correlator = FrameCorrelator::new();

    let result = block_on(correlator.send(CommandFrame::me(), |_| Err(KristError::NotConnected)));

    assert!(matches!(result, Err(KristError::NotConnected)));
    assert_eq!(correlator.pending_count(), 0);
}
