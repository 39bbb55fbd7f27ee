//! Outbound message types
//!
//! Control responses travel as JSON strings; data samples are unpacked
//! into positional fields by the transport.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// JSON body sent on the control channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ControlResponse {
    Connected { connected: bool },
    Errors { errors: String },
}

impl ControlResponse {
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a response as the peer receives it
    pub fn decode(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Individual error strings, if this is an error response
    pub fn error_list(&self) -> Vec<&str> {
        match self {
            ControlResponse::Errors { errors } => errors.split(", ").collect(),
            ControlResponse::Connected { .. } => Vec::new(),
        }
    }
}

/// Address-tagged control output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlMessage {
    /// Original inbound address
    pub address: String,
    /// Encoded [`ControlResponse`]
    pub payload: String,
}

impl ControlMessage {
    pub fn response(&self) -> Result<ControlResponse> {
        ControlResponse::decode(&self.payload)
    }
}

/// High-frequency tracking output
#[derive(Debug, Clone, PartialEq)]
pub struct DataSample {
    pub address: String,
    pub key: String,
    pub i: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}
