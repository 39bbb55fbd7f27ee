//! handgate core
//!
//! Validation and routing for JSON-in-OSC messages from a hand-tracking peer.
//!
//! This crate provides:
//! - The inbound message model ([`IncomingMessage`], [`Arg`])
//! - The address-pattern table ([`SchemaRegistry`])
//! - Two-phase validation ([`Validator`])
//! - The hand-presence latch ([`HandLatch`], [`GateMode`])
//! - Control/data routing ([`Router`], [`Route`])
//!
//! No I/O happens here; transports live in `handgate-bridge`.

pub mod error;
pub mod latch;
pub mod message;
pub mod output;
pub mod router;
pub mod schema;
pub mod validator;

pub use error::{Error, ErrorKind, Result, SchemaViolation, ValidationError};
pub use latch::{GateMode, HandLatch};
pub use message::{Arg, IncomingMessage};
pub use output::{ControlMessage, ControlResponse, DataSample};
pub use router::{Route, Router, RouterConfig};
pub use schema::{EntryKind, SchemaEntry, SchemaRegistry, Side};
pub use validator::{HandSample, Position, Validated, ValidationResult, Validator};

/// Address of the connection handshake
pub const CONNECT_ADDRESS: &str = "/connect";

/// Default UDP port the gateway listens on
pub const DEFAULT_LISTEN_PORT: u16 = 7400;

/// Default UDP port control and data output is sent to
pub const DEFAULT_OUTPUT_PORT: u16 = 7401;
