//! OSC gateway integration tests
//!
//! An endpoint socket plays the tracking peer; separate endpoints receive the
//! control and data output.

use handgate_bridge::GatewayEvent;
use handgate_core::{ControlResponse, GateMode, Route, SchemaEntry, SchemaRegistry, Side};
use handgate_test_utils::{
    wait_for, OscEndpoint, TestGateway, DEFAULT_CHECK_INTERVAL, DEFAULT_TIMEOUT, QUIET_PERIOD,
};
use rosc::{OscBundle, OscMessage, OscPacket, OscTime, OscType};

const POSITION: &str = r#"{"pos": {"i": 1, "x": 0.1, "y": 0.2, "z": 0.3}}"#;

struct Harness {
    peer: OscEndpoint,
    control: OscEndpoint,
    data: OscEndpoint,
    gateway: TestGateway,
}

async fn harness() -> Harness {
    harness_with(SchemaRegistry::default(), GateMode::Shared).await
}

async fn harness_with(registry: SchemaRegistry, gate: GateMode) -> Harness {
    let peer = OscEndpoint::bind().await;
    let control = OscEndpoint::bind().await;
    let data = OscEndpoint::bind().await;
    let gateway =
        TestGateway::start_with(control.local_addr(), Some(data.local_addr()), registry, gate)
            .await;
    Harness {
        peer,
        control,
        data,
        gateway,
    }
}

async fn control_response(endpoint: &OscEndpoint) -> (String, ControlResponse) {
    let (addr, json) = endpoint
        .recv_json(DEFAULT_TIMEOUT)
        .await
        .expect("expected a control message");
    (addr, ControlResponse::decode(&json).expect("valid control JSON"))
}

#[tokio::test]
async fn test_connect_handshake() {
    let h = harness().await;

    h.peer
        .send_json(h.gateway.addr(), "/connect", r#"{"connected": false}"#)
        .await;

    let (addr, response) = control_response(&h.control).await;
    assert_eq!(addr, "/connect");
    assert_eq!(response, ControlResponse::Connected { connected: true });
    assert!(h.data.recv(QUIET_PERIOD).await.is_none());
}

#[tokio::test]
async fn test_unrecognized_address_reported() {
    let h = harness().await;

    h.peer
        .send_json(h.gateway.addr(), "/elbow", r#"{"connected": true}"#)
        .await;

    let (addr, response) = control_response(&h.control).await;
    assert_eq!(addr, "/elbow");
    assert_eq!(
        response,
        ControlResponse::Errors {
            errors: "unrecognized address pattern".to_string()
        }
    );
    assert!(h.data.recv(QUIET_PERIOD).await.is_none());
}

#[tokio::test]
async fn test_non_string_argument_reported() {
    let h = harness().await;

    h.peer
        .send(h.gateway.addr(), "/connect", vec![OscType::Int(1)])
        .await;

    let (_, response) = control_response(&h.control).await;
    assert_eq!(
        response,
        ControlResponse::Errors {
            errors: "argument must be of type string, argument must be valid JSON".to_string()
        }
    );
}

#[tokio::test]
async fn test_positions_gated_until_visible() {
    let mut h = harness().await;

    h.peer
        .send_json(h.gateway.addr(), "/left_hand", POSITION)
        .await;
    assert!(h.data.recv(QUIET_PERIOD).await.is_none());

    h.peer
        .send_json(h.gateway.addr(), "/right_hand", r#"{"visible": true}"#)
        .await;

    let gateway = &h.gateway;
    let visible = wait_for(
        || async move { gateway.gateway().latch().is_visible(Side::Right) },
        DEFAULT_CHECK_INTERVAL,
        DEFAULT_TIMEOUT,
    )
    .await;
    assert!(visible, "latch should record the right hand");

    h.peer
        .send_json(h.gateway.addr(), "/left_hand", POSITION)
        .await;

    let msg = h
        .data
        .recv(DEFAULT_TIMEOUT)
        .await
        .expect("expected a data sample");
    assert_eq!(msg.addr, "/left_hand");
    assert_eq!(msg.args[0], OscType::String("pos".to_string()));
    match &msg.args[1..] {
        [OscType::Double(i), OscType::Double(x), OscType::Double(y), OscType::Double(z)] => {
            assert_eq!((*i, *x, *y, *z), (1.0, 0.1, 0.2, 0.3));
        }
        other => panic!("unexpected sample args: {:?}", other),
    }

    // nothing tracking-related lands on the control channel
    assert!(h.control.recv(QUIET_PERIOD).await.is_none());

    h.gateway.stop().await;
}

#[tokio::test]
async fn test_per_hand_gate() {
    let h = harness_with(SchemaRegistry::default(), GateMode::PerHand).await;

    h.peer
        .send_json(h.gateway.addr(), "/right_hand", r#"{"visible": true}"#)
        .await;
    h.peer
        .send_json(h.gateway.addr(), "/left_hand", POSITION)
        .await;
    h.peer
        .send_json(h.gateway.addr(), "/right_hand", POSITION)
        .await;

    let msg = h
        .data
        .recv(DEFAULT_TIMEOUT)
        .await
        .expect("expected the right hand sample");
    assert_eq!(msg.addr, "/right_hand");
    assert!(h.data.recv(QUIET_PERIOD).await.is_none());
}

#[tokio::test]
async fn test_bundle_messages_routed_in_order() {
    let mut h = harness().await;

    let json = |addr: &str, body: &str| {
        OscPacket::Message(OscMessage {
            addr: addr.to_string(),
            args: vec![OscType::String(body.to_string())],
        })
    };
    let bundle = OscPacket::Bundle(OscBundle {
        timetag: OscTime {
            seconds: 0,
            fractional: 1,
        },
        content: vec![
            json("/left_hand", r#"{"visible": true}"#),
            json("/left_hand", POSITION),
            json("/connect", r#"{"connected": true}"#),
        ],
    });
    h.peer.send_packet(h.gateway.addr(), &bundle).await;

    let mut routes = Vec::new();
    while routes.len() < 3 {
        match h.gateway.next_event(DEFAULT_TIMEOUT).await {
            Some(GatewayEvent::Routed { route, .. }) => routes.push(route),
            Some(_) => {}
            None => panic!("missing routed events, got {:?}", routes),
        }
    }

    assert!(matches!(
        routes[0],
        Route::LatchUpdated {
            side: Side::Left,
            visible: true
        }
    ));
    assert!(matches!(routes[1], Route::Data(_)));
    assert!(matches!(routes[2], Route::Control(_)));
}

#[tokio::test]
async fn test_garbage_datagram_ignored() {
    let h = harness().await;

    h.peer.send_raw(h.gateway.addr(), b"not osc at all").await;
    h.peer
        .send_json(h.gateway.addr(), "/connect", r#"{"connected": true}"#)
        .await;

    let (addr, _) = control_response(&h.control).await;
    assert_eq!(addr, "/connect");
}

#[tokio::test]
async fn test_routing_continues_when_events_not_drained() {
    // more messages than the event channel holds, with nobody reading events
    let h = harness().await;

    for n in 0..300 {
        h.peer
            .send_json(h.gateway.addr(), "/connect", r#"{"connected": true}"#)
            .await;
        let reply = h.control.recv(DEFAULT_TIMEOUT).await;
        assert!(reply.is_some(), "no control reply for message #{}", n);
    }
}

#[tokio::test]
async fn test_registered_entity() {
    let registry = SchemaRegistry::default().with(SchemaEntry::tracked("left_foot"));
    let h = harness_with(registry, GateMode::Shared).await;

    h.peer
        .send_json(h.gateway.addr(), "/left_foot", r#"{"visible": "yes"}"#)
        .await;

    let (addr, response) = control_response(&h.control).await;
    assert_eq!(addr, "/left_foot");
    assert_eq!(
        response,
        ControlResponse::Errors {
            errors: "parsed value must be of type boolean".to_string()
        }
    );
}

#[tokio::test]
async fn test_stop_reports_stopped() {
    let mut h = harness().await;
    assert!(h.gateway.gateway().is_running());

    h.gateway.stop().await;

    let mut stopped = false;
    while let Some(event) = h.gateway.next_event(QUIET_PERIOD).await {
        if matches!(event, GatewayEvent::Stopped) {
            stopped = true;
        }
    }
    assert!(stopped);
}
