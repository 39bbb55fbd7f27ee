//! Peer-side connection check
//!
//! Plays the tracking peer's part of the handshake: sends `/connect` with
//! `{"connected": false}` and waits for the gateway's control response.

use handgate_core::{ControlResponse, DEFAULT_LISTEN_PORT, DEFAULT_OUTPUT_PORT};
use rosc::{OscMessage, OscPacket, OscType};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::{debug, info, warn};

use crate::osc::flatten_packet;
use crate::{GatewayError, Result};

/// Connection check configuration
#[derive(Debug, Clone)]
pub struct CheckConfig {
    /// Local address the response is expected on
    pub bind_addr: String,
    /// Gateway address to send the handshake to
    pub target: String,
    /// Handshake address pattern
    pub address: String,
    /// How long to wait for the response
    pub timeout: Duration,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            bind_addr: format!("0.0.0.0:{}", DEFAULT_OUTPUT_PORT),
            target: format!("127.0.0.1:{}", DEFAULT_LISTEN_PORT),
            address: handgate_core::CONNECT_ADDRESS.to_string(),
            timeout: Duration::from_secs(5),
        }
    }
}

/// Result of a connection check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Gateway answered `{"connected": true}`
    Connected,
    /// Gateway answered `{"connected": false}`
    Disconnected,
    /// Gateway reported validation errors
    Rejected(Vec<String>),
}

/// Send the handshake and wait for the response
pub async fn check_connection(config: &CheckConfig) -> Result<CheckOutcome> {
    let target: SocketAddr = config
        .target
        .parse()
        .map_err(|e| GatewayError::InvalidAddress(format!("{}: {}", config.target, e)))?;

    let socket = UdpSocket::bind(&config.bind_addr)
        .await
        .map_err(|e| GatewayError::Bind(format!("{}: {}", config.bind_addr, e)))?;

    let packet = OscPacket::Message(OscMessage {
        addr: config.address.clone(),
        args: vec![OscType::String(r#"{"connected": false}"#.to_string())],
    });
    let bytes = rosc::encoder::encode(&packet)
        .map_err(|e| GatewayError::Protocol(format!("OSC encode error: {:?}", e)))?;
    socket
        .send_to(&bytes, target)
        .await
        .map_err(|e| GatewayError::Send(e.to_string()))?;
    debug!("Sent handshake to {}", target);

    let response = tokio::time::timeout(
        config.timeout,
        wait_for_response(&socket, &config.address),
    )
    .await
    .map_err(|_| GatewayError::Timeout(format!("{} response", config.address)))??;

    let outcome = match &response {
        ControlResponse::Connected { connected: true } => {
            info!("Successfully communicating with gateway at {}", target);
            CheckOutcome::Connected
        }
        ControlResponse::Connected { connected: false } => {
            warn!("Gateway at {} reported not connected", target);
            CheckOutcome::Disconnected
        }
        ControlResponse::Errors { .. } => {
            let list: Vec<String> = response
                .error_list()
                .into_iter()
                .map(String::from)
                .collect();
            for error in &list {
                warn!("Gateway error: {}", error);
            }
            CheckOutcome::Rejected(list)
        }
    };

    Ok(outcome)
}

async fn wait_for_response(socket: &UdpSocket, address: &str) -> Result<ControlResponse> {
    let mut buf = vec![0u8; 65536];

    loop {
        let (len, from) = socket.recv_from(&mut buf).await?;
        let packet = match rosc::decoder::decode_udp(&buf[..len]) {
            Ok((_, packet)) => packet,
            Err(e) => {
                debug!("Ignoring undecodable packet from {}: {:?}", from, e);
                continue;
            }
        };

        for msg in flatten_packet(packet) {
            if msg.addr != address {
                continue;
            }
            if let Some(OscType::String(json)) = msg.args.first() {
                return Ok(ControlResponse::decode(json)?);
            }
            return Err(GatewayError::Protocol(format!(
                "{} response must carry a JSON string",
                address
            )));
        }
    }
}
