//! Gateway events

use handgate_core::Route;
use std::net::SocketAddr;

/// Events reported by a running gateway
#[derive(Debug, Clone)]
pub enum GatewayEvent {
    /// Socket bound and receive task running
    Started { local_addr: SocketAddr },
    /// One inbound message was routed
    Routed { peer: SocketAddr, route: Route },
    /// Transport-level error; processing continues
    Error(String),
    /// Gateway stopped
    Stopped,
}
