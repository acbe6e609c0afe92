//! Network transport layer
//!
//! This module provides the receive pipeline for a line-oriented text
//! protocol: address resolution with bounded retry, ordered connect
//! attempts across the resolved candidates, socket option
//! configuration, and line framing over the connected stream.
//!
//! Data flows resolver -> connector -> framer; the [`Connection`] type
//! ties the stages to one owned socket.

pub mod addr;
pub mod config;
pub mod conn;
pub mod framer;
pub mod resolver;
pub mod tcp;

pub use addr::{AddrFamily, ResolvedAddr};
pub use config::{Framing, TransportConfig};
pub use conn::Connection;
pub use framer::{Disconnect, LineFramer, RecvEvent};
pub use resolver::AddressResolver;
pub use tcp::{Connector, SocketOptions};

/// Result type for transport operations
pub type Result<T> = std::result::Result<T, Error>;

/// Transport layer errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Address resolution failed: {0}")]
    ResolutionFailed(String),

    #[error("Resolution aborted by operator")]
    Aborted,

    #[error("No candidate address accepted the connection")]
    ConnectFailed,

    #[error("Not connected")]
    NotConnected,
}
