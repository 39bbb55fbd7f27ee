//! handgate OSC gateway
//!
//! Connects the core validation pipeline to the network:
//! - [`OscGateway`] receives OSC over UDP and sends routed output as OSC
//! - [`check_connection`] performs the peer side of the `/connect` handshake

pub mod check;
pub mod error;
pub mod event;
pub mod osc;

pub use check::{check_connection, CheckConfig, CheckOutcome};
pub use error::{GatewayError, Result};
pub use event::GatewayEvent;
pub use osc::{GatewayConfig, OscGateway};
