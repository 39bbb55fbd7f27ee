//! Common test helpers for handgate tests
//!
//! - Port allocation
//! - Condition-based waiting (no hardcoded sleeps)
//! - An OSC endpoint socket standing in for the tracking peer
//! - A gateway wrapper that cleans up on drop

use handgate_bridge::{GatewayConfig, GatewayEvent, OscGateway};
use handgate_core::{GateMode, SchemaRegistry};
use rosc::{OscMessage, OscPacket, OscType};
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::time::timeout;

/// Default test timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default condition check interval
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_millis(10);

/// How long to listen before concluding nothing was sent
pub const QUIET_PERIOD: Duration = Duration::from_millis(200);

// ============================================================================
// Port Allocation
// ============================================================================

/// Find an available UDP port for testing
pub fn find_available_udp_port() -> u16 {
    let socket = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
    socket.local_addr().unwrap().port()
}

// ============================================================================
// Condition-Based Waiting
// ============================================================================

/// Wait for a condition with timeout
pub async fn wait_for<F, Fut>(check: F, interval: Duration, max_wait: Duration) -> bool
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let start = Instant::now();
    while start.elapsed() < max_wait {
        if check().await {
            return true;
        }
        tokio::time::sleep(interval).await;
    }
    false
}

// ============================================================================
// OSC Endpoint
// ============================================================================

/// A UDP socket that speaks OSC, playing the peer's side
pub struct OscEndpoint {
    socket: UdpSocket,
}

impl OscEndpoint {
    /// Bind to an ephemeral loopback port
    pub async fn bind() -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        Self { socket }
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.socket.local_addr().unwrap()
    }

    /// Send one OSC message
    pub async fn send(&self, target: SocketAddr, addr: &str, args: Vec<OscType>) {
        let packet = OscPacket::Message(OscMessage {
            addr: addr.to_string(),
            args,
        });
        self.send_packet(target, &packet).await;
    }

    /// Send a message with a single JSON string argument
    pub async fn send_json(&self, target: SocketAddr, addr: &str, json: &str) {
        self.send(target, addr, vec![OscType::String(json.to_string())])
            .await;
    }

    pub async fn send_packet(&self, target: SocketAddr, packet: &OscPacket) {
        let bytes = rosc::encoder::encode(packet).unwrap();
        self.send_raw(target, &bytes).await;
    }

    pub async fn send_raw(&self, target: SocketAddr, bytes: &[u8]) {
        self.socket.send_to(bytes, target).await.unwrap();
    }

    /// Receive the next OSC message, if one arrives in time
    pub async fn recv(&self, max_wait: Duration) -> Option<OscMessage> {
        let mut buf = vec![0u8; 65536];
        let (len, _) = timeout(max_wait, self.socket.recv_from(&mut buf))
            .await
            .ok()?
            .ok()?;
        match rosc::decoder::decode_udp(&buf[..len]).ok()?.1 {
            OscPacket::Message(msg) => Some(msg),
            OscPacket::Bundle(_) => None,
        }
    }

    /// Receive a message whose single argument is a JSON string
    pub async fn recv_json(&self, max_wait: Duration) -> Option<(String, String)> {
        let msg = self.recv(max_wait).await?;
        match msg.args.as_slice() {
            [OscType::String(json)] => Some((msg.addr, json.clone())),
            _ => None,
        }
    }
}

// ============================================================================
// Test Gateway - RAII wrapper with proper cleanup
// ============================================================================

/// A running gateway wired to endpoint sockets
pub struct TestGateway {
    gateway: OscGateway,
    events: mpsc::Receiver<GatewayEvent>,
    addr: SocketAddr,
}

impl TestGateway {
    /// Start a gateway with the default registry
    pub async fn start(control: SocketAddr, data: Option<SocketAddr>) -> Self {
        Self::start_with(control, data, SchemaRegistry::default(), GateMode::Shared).await
    }

    pub async fn start_with(
        control: SocketAddr,
        data: Option<SocketAddr>,
        registry: SchemaRegistry,
        gate: GateMode,
    ) -> Self {
        let config = GatewayConfig {
            bind_addr: "127.0.0.1:0".to_string(),
            control_addr: control.to_string(),
            data_addr: data.map(|d| d.to_string()),
            gate,
        };

        let mut gateway = OscGateway::new(config, registry);
        let mut events = gateway.start().await.unwrap();

        let addr = match timeout(DEFAULT_TIMEOUT, events.recv()).await {
            Ok(Some(GatewayEvent::Started { local_addr })) => local_addr,
            other => panic!("gateway did not start: {:?}", other),
        };

        Self {
            gateway,
            events,
            addr,
        }
    }

    /// Address the gateway receives on
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn gateway(&self) -> &OscGateway {
        &self.gateway
    }

    /// Next event, if one arrives in time
    pub async fn next_event(&mut self, max_wait: Duration) -> Option<GatewayEvent> {
        timeout(max_wait, self.events.recv()).await.ok().flatten()
    }

    /// Stop the gateway explicitly (also happens on drop)
    pub async fn stop(&mut self) {
        self.gateway.stop().await.unwrap();
    }
}
