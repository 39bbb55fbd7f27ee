//! Dual-destination router
//!
//! Takes one inbound message at a time through the [`Validator`] and
//! decides where it goes: the control channel, the data channel, into the
//! presence latch, or nowhere (gated samples).

use tracing::{debug, warn};

use crate::error::{join_errors, Result, SchemaViolation, ValidationError};
use crate::latch::{GateMode, HandLatch};
use crate::message::IncomingMessage;
use crate::output::{ControlMessage, ControlResponse, DataSample};
use crate::schema::{SchemaRegistry, Side};
use crate::validator::{HandSample, Position, Validated, Validator};

/// Where a message ended up
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    /// Handshake response or error report
    Control(ControlMessage),
    /// Forwarded tracking sample
    Data(DataSample),
    /// Visibility flag stored, nothing emitted
    LatchUpdated { side: Side, visible: bool },
    /// Positional sample dropped because the gate was closed
    Dropped { side: Side },
}

/// Router configuration
#[derive(Debug, Clone, Default)]
pub struct RouterConfig {
    pub registry: SchemaRegistry,
    pub gate: GateMode,
}

/// Validates and routes messages, owning the presence latch
#[derive(Debug, Clone)]
pub struct Router {
    validator: Validator,
    latch: HandLatch,
    gate: GateMode,
}

impl Router {
    pub fn new(config: RouterConfig) -> Self {
        Self {
            validator: Validator::new(config.registry),
            latch: HandLatch::new(),
            gate: config.gate,
        }
    }

    pub fn latch(&self) -> &HandLatch {
        &self.latch
    }

    pub fn gate(&self) -> GateMode {
        self.gate
    }

    pub fn registry(&self) -> &SchemaRegistry {
        self.validator.registry()
    }

    /// Validate and route one message
    pub fn route(&mut self, msg: &IncomingMessage) -> Result<Route> {
        match self.validator.validate(msg) {
            Ok(validated) => self.dispatch(&msg.address, validated),
            Err(errors) => report_errors(&msg.address, &errors),
        }
    }

    fn dispatch(&mut self, address: &str, validated: Validated) -> Result<Route> {
        match validated {
            Validated::Connect { connected } => {
                let response = ControlResponse::Connected {
                    connected: normalize_connected(connected),
                };
                Ok(Route::Control(ControlMessage {
                    address: address.to_string(),
                    payload: response.encode()?,
                }))
            }
            Validated::Tracked {
                side,
                sample: HandSample::Visibility(visible),
                ..
            } => {
                self.latch.update(side, visible);
                debug!(%side, visible, "hand visibility updated");
                Ok(Route::LatchUpdated { side, visible })
            }
            Validated::Tracked {
                side,
                key,
                sample: HandSample::Positional(value),
            } => {
                if !self.latch.allows(side, self.gate) {
                    return Ok(Route::Dropped { side });
                }
                let Some(pos) = Position::from_json(&value) else {
                    let violation =
                        ValidationError::SchemaViolation(SchemaViolation::MalformedPosition);
                    return report_errors(address, &[violation]);
                };
                Ok(Route::Data(DataSample {
                    address: address.to_string(),
                    key,
                    i: pos.i,
                    x: pos.x,
                    y: pos.y,
                    z: pos.z,
                }))
            }
        }
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new(RouterConfig::default())
    }
}

/// A falsy `connected` is reported back as `true`; `true` passes through.
fn normalize_connected(reported: bool) -> bool {
    if reported {
        reported
    } else {
        true
    }
}

fn report_errors(address: &str, errors: &[ValidationError]) -> Result<Route> {
    for error in errors {
        warn!(address, "Error: {}", error);
    }
    let response = ControlResponse::Errors {
        errors: join_errors(errors),
    };
    Ok(Route::Control(ControlMessage {
        address: address.to_string(),
        payload: response.encode()?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_connected() {
        assert!(normalize_connected(false));
        assert!(normalize_connected(true));
    }

    #[test]
    fn test_visibility_message_updates_latch() {
        let mut router = Router::default();
        let route = router
            .route(&IncomingMessage::with_json("/right_hand", r#"{"visible": true}"#))
            .unwrap();
        assert_eq!(
            route,
            Route::LatchUpdated {
                side: Side::Right,
                visible: true
            }
        );
        assert!(router.latch().is_visible(Side::Right));
        assert!(!router.latch().is_visible(Side::Left));
    }

    #[test]
    fn test_gated_sample_shape_not_checked() {
        let mut router = Router::default();
        let route = router
            .route(&IncomingMessage::with_json("/left_hand", r#"{"wrist": 5}"#))
            .unwrap();
        assert_eq!(route, Route::Dropped { side: Side::Left });
    }
}
