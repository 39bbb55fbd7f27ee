//! OSC gateway
//!
//! Receives OSC over UDP, runs each message through the [`Router`] and
//! sends the result back out as OSC: control responses to the control
//! target, tracking samples to the data target.

use handgate_core::{
    Arg, ControlMessage, DataSample, GateMode, HandLatch, IncomingMessage, Route, Router,
    RouterConfig, SchemaRegistry, DEFAULT_LISTEN_PORT, DEFAULT_OUTPUT_PORT,
};
use parking_lot::Mutex;
use rosc::{OscMessage, OscPacket, OscType};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::{GatewayError, GatewayEvent, Result};

/// Gateway configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Local address to receive peer messages on
    pub bind_addr: String,
    /// Where control responses are sent
    pub control_addr: String,
    /// Where tracking samples are sent (defaults to `control_addr`)
    pub data_addr: Option<String>,
    /// How hand visibility gates positional samples
    pub gate: GateMode,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_addr: format!("0.0.0.0:{}", DEFAULT_LISTEN_PORT),
            control_addr: format!("127.0.0.1:{}", DEFAULT_OUTPUT_PORT),
            data_addr: None,
            gate: GateMode::default(),
        }
    }
}

impl GatewayConfig {
    fn targets(&self) -> Result<Targets> {
        let control = parse_addr(&self.control_addr)?;
        let data = match &self.data_addr {
            Some(addr) => parse_addr(addr)?,
            None => control,
        };
        Ok(Targets { control, data })
    }
}

#[derive(Debug, Clone, Copy)]
struct Targets {
    control: SocketAddr,
    data: SocketAddr,
}

fn parse_addr(addr: &str) -> Result<SocketAddr> {
    addr.parse()
        .map_err(|e| GatewayError::InvalidAddress(format!("{}: {}", addr, e)))
}

/// OSC/UDP front end for a [`Router`]
pub struct OscGateway {
    config: GatewayConfig,
    router: Arc<Mutex<Router>>,
    socket: Option<Arc<UdpSocket>>,
    task: Option<JoinHandle<()>>,
    events: Option<mpsc::Sender<GatewayEvent>>,
}

impl OscGateway {
    pub fn new(config: GatewayConfig, registry: SchemaRegistry) -> Self {
        let router = Router::new(RouterConfig {
            registry,
            gate: config.gate,
        });

        Self {
            config,
            router: Arc::new(Mutex::new(router)),
            socket: None,
            task: None,
            events: None,
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Current visibility flags
    pub fn latch(&self) -> HandLatch {
        self.router.lock().latch().snapshot()
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Bound local address, once started
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|s| s.local_addr().ok())
    }

    /// Bind the socket and start routing
    pub async fn start(&mut self) -> Result<mpsc::Receiver<GatewayEvent>> {
        if self.is_running() {
            return Err(GatewayError::Other("gateway already running".to_string()));
        }

        let targets = self.config.targets()?;
        let socket = UdpSocket::bind(&self.config.bind_addr)
            .await
            .map_err(|e| GatewayError::Bind(format!("{}: {}", self.config.bind_addr, e)))?;
        let local_addr = socket.local_addr()?;

        info!(
            "OSC gateway listening on {} (control -> {}, data -> {})",
            local_addr, targets.control, targets.data
        );

        let socket = Arc::new(socket);
        self.socket = Some(Arc::clone(&socket));

        let (tx, rx) = mpsc::channel(256);
        let _ = tx.send(GatewayEvent::Started { local_addr }).await;

        let router = Arc::clone(&self.router);
        let events = tx.clone();
        self.events = Some(tx);

        self.task = Some(tokio::spawn(async move {
            receive_loop(socket, router, targets, events).await;
        }));

        Ok(rx)
    }

    /// Stop routing and release the socket
    pub async fn stop(&mut self) -> Result<()> {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.socket = None;
        if let Some(events) = self.events.take() {
            emit(&events, GatewayEvent::Stopped);
        }
        info!("OSC gateway stopped");
        Ok(())
    }
}

impl Drop for OscGateway {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn receive_loop(
    socket: Arc<UdpSocket>,
    router: Arc<Mutex<Router>>,
    targets: Targets,
    events: mpsc::Sender<GatewayEvent>,
) {
    let mut buf = vec![0u8; 65536];

    loop {
        let (len, peer) = match socket.recv_from(&mut buf).await {
            Ok(received) => received,
            Err(e) => {
                error!("OSC receive error: {}", e);
                emit(&events, GatewayEvent::Error(e.to_string()));
                continue;
            }
        };
        debug!("OSC received {} bytes from {}", len, peer);

        let packet = match rosc::decoder::decode_udp(&buf[..len]) {
            Ok((_, packet)) => packet,
            Err(e) => {
                debug!("OSC decode error from {}: {:?}", peer, e);
                continue;
            }
        };

        for msg in flatten_packet(packet) {
            let incoming = osc_to_incoming(msg);
            // one message is fully routed before the next is looked at
            let route = router.lock().route(&incoming);

            match route {
                Ok(route) => {
                    if let Err(e) = send_route(&socket, targets, &route).await {
                        error!("OSC send error: {}", e);
                        emit(&events, GatewayEvent::Error(e.to_string()));
                    }
                    emit(&events, GatewayEvent::Routed { peer, route });
                }
                Err(e) => {
                    error!("Routing error for {}: {}", incoming.address, e);
                    emit(&events, GatewayEvent::Error(e.to_string()));
                }
            }
        }
    }
}

/// Report an event without waiting on the receiver; routing never blocks on it
fn emit(events: &mpsc::Sender<GatewayEvent>, event: GatewayEvent) {
    match events.try_send(event) {
        Ok(()) => {}
        Err(TrySendError::Full(event)) => debug!("Event channel full, dropping {:?}", event),
        Err(TrySendError::Closed(_)) => debug!("Event channel closed"),
    }
}

async fn send_route(socket: &UdpSocket, targets: Targets, route: &Route) -> Result<()> {
    let (packet, target) = match route {
        Route::Control(msg) => (control_to_osc(msg), targets.control),
        Route::Data(sample) => (sample_to_osc(sample), targets.data),
        Route::LatchUpdated { .. } | Route::Dropped { .. } => return Ok(()),
    };

    let bytes = rosc::encoder::encode(&packet)
        .map_err(|e| GatewayError::Protocol(format!("OSC encode error: {:?}", e)))?;

    socket
        .send_to(&bytes, target)
        .await
        .map_err(|e| GatewayError::Send(e.to_string()))?;

    debug!("Sent OSC message to {}", target);
    Ok(())
}

/// Messages of a packet in wire order, bundles flattened
pub fn flatten_packet(packet: OscPacket) -> Vec<OscMessage> {
    match packet {
        OscPacket::Message(msg) => vec![msg],
        OscPacket::Bundle(bundle) => bundle
            .content
            .into_iter()
            .flat_map(flatten_packet)
            .collect(),
    }
}

/// Convert a decoded OSC message to the core message model
pub fn osc_to_incoming(msg: OscMessage) -> IncomingMessage {
    IncomingMessage::new(msg.addr, msg.args.into_iter().map(osc_arg_to_arg).collect())
}

fn osc_arg_to_arg(arg: OscType) -> Arg {
    match arg {
        OscType::Int(i) => Arg::Int(i),
        OscType::Float(f) => Arg::Float(f),
        OscType::String(s) => Arg::String(s),
        OscType::Blob(b) => Arg::Blob(b),
        OscType::Long(l) => Arg::Long(l),
        OscType::Double(d) => Arg::Double(d),
        OscType::Bool(b) => Arg::Bool(b),
        OscType::Nil => Arg::Nil,
        OscType::Inf => Arg::Other('I'),
        OscType::Char(_) => Arg::Other('c'),
        OscType::Time(_) => Arg::Other('t'),
        _ => Arg::Other('?'),
    }
}

/// `(address, [json])`
pub fn control_to_osc(msg: &ControlMessage) -> OscPacket {
    OscPacket::Message(OscMessage {
        addr: msg.address.clone(),
        args: vec![OscType::String(msg.payload.clone())],
    })
}

/// `(address, [key, i, x, y, z])`, coordinates as 64-bit doubles
pub fn sample_to_osc(sample: &DataSample) -> OscPacket {
    OscPacket::Message(OscMessage {
        addr: sample.address.clone(),
        args: vec![
            OscType::String(sample.key.clone()),
            OscType::Double(sample.i),
            OscType::Double(sample.x),
            OscType::Double(sample.y),
            OscType::Double(sample.z),
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rosc::{OscBundle, OscTime};

    #[test]
    fn test_osc_arg_conversion() {
        assert_eq!(osc_arg_to_arg(OscType::Int(42)), Arg::Int(42));
        assert_eq!(
            osc_arg_to_arg(OscType::String("{}".to_string())),
            Arg::String("{}".to_string())
        );
        assert_eq!(osc_arg_to_arg(OscType::Inf), Arg::Other('I'));
    }

    #[test]
    fn test_flatten_bundle_keeps_order() {
        let msg = |addr: &str| {
            OscPacket::Message(OscMessage {
                addr: addr.to_string(),
                args: vec![],
            })
        };
        let packet = OscPacket::Bundle(OscBundle {
            timetag: OscTime {
                seconds: 0,
                fractional: 1,
            },
            content: vec![
                msg("/connect"),
                OscPacket::Bundle(OscBundle {
                    timetag: OscTime {
                        seconds: 0,
                        fractional: 1,
                    },
                    content: vec![msg("/left_hand")],
                }),
                msg("/right_hand"),
            ],
        });

        let addrs: Vec<String> = flatten_packet(packet).into_iter().map(|m| m.addr).collect();
        assert_eq!(addrs, vec!["/connect", "/left_hand", "/right_hand"]);
    }

    #[test]
    fn test_sample_to_osc() {
        let sample = DataSample {
            address: "/left_hand".to_string(),
            key: "pos".to_string(),
            i: 1.0,
            x: 0.1,
            y: 0.2,
            z: 0.3,
        };
        match sample_to_osc(&sample) {
            OscPacket::Message(m) => {
                assert_eq!(m.addr, "/left_hand");
                assert_eq!(m.args.len(), 5);
                assert_eq!(m.args[0], OscType::String("pos".to_string()));
                assert_eq!(m.args[2], OscType::Double(0.1));
            }
            _ => panic!("Expected message"),
        }
    }

    #[test]
    fn test_config_targets_default_data_to_control() {
        let config = GatewayConfig::default();
        let targets = config.targets().unwrap();
        assert_eq!(targets.control, targets.data);

        let bad = GatewayConfig {
            control_addr: "not an address".to_string(),
            ..Default::default()
        };
        assert!(bad.targets().is_err());
    }
}
