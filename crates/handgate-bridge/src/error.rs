//! Gateway error types

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GatewayError>;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("bind failed: {0}")]
    Bind(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("send error: {0}")]
    Send(String),

    #[error("timed out waiting for {0}")]
    Timeout(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] handgate_core::Error),

    #[error("gateway error: {0}")]
    Other(String),
}
