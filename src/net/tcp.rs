//! Socket setup and ordered connect attempts
//!
//! The connector walks the resolved candidate list in order, creating
//! a fresh socket of the matching domain for each attempt, applying
//! the configured options, and stopping at the first success.
//! Candidates in a family the configuration excludes are skipped with
//! a log line rather than attempted and failed.

use std::io;
use std::net::TcpStream;
use std::time::Duration;

use socket2::{Domain, Protocol, SockAddr as Socket2Addr, Socket, Type};

use super::{AddrFamily, Error, ResolvedAddr, Result, TransportConfig};

/// Buffer sizes and timeouts applied to every freshly created socket.
///
/// Applying these to a new socket is expected to succeed; a failure is
/// propagated unchanged, there is nothing to recover locally.
#[derive(Debug, Clone)]
pub struct SocketOptions {
    pub recv_buffer_size: usize,
    pub send_buffer_size: usize,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
}

impl SocketOptions {
    pub fn from_config(config: &TransportConfig) -> Self {
        SocketOptions {
            recv_buffer_size: config.recv_buffer_size,
            send_buffer_size: config.send_buffer_size,
            read_timeout: config.read_timeout,
            write_timeout: config.write_timeout,
        }
    }

    pub fn apply(&self, socket: &Socket) -> Result<()> {
        socket.set_recv_buffer_size(self.recv_buffer_size)?;
        socket.set_send_buffer_size(self.send_buffer_size)?;
        socket.set_read_timeout(Some(self.read_timeout))?;
        socket.set_write_timeout(Some(self.write_timeout))?;
        Ok(())
    }
}

/// Connects against an ordered candidate list, first success wins.
pub struct Connector {
    options: SocketOptions,
    family: Option<AddrFamily>,
    retry: Duration,
}

impl Connector {
    pub fn new(options: SocketOptions, family: Option<AddrFamily>, retry: Duration) -> Self {
        Connector {
            options,
            family,
            retry,
        }
    }

    pub fn from_config(config: &TransportConfig) -> Self {
        Self::new(
            SocketOptions::from_config(config),
            config.family,
            config.connect_retry,
        )
    }

    /// Attempt each candidate in resolution order and return the first
    /// stream that connects.
    ///
    /// Calling this with an empty candidate list is a contract
    /// violation by the caller and panics.
    ///
    /// Recoverable socket errors (refused, reset, unreachable, timed
    /// out) move on to the next candidate after the retry interval;
    /// anything else propagates immediately.
    pub fn connect(&self, candidates: &[ResolvedAddr]) -> Result<TcpStream> {
        assert!(
            !candidates.is_empty(),
            "connect called with no candidate addresses"
        );

        for (i, candidate) in candidates.iter().enumerate() {
            if let Some(family) = self.family {
                if candidate.family() != family {
                    log::info!(
                        "skipping {} candidate {} ({} socket configured)",
                        candidate.family(),
                        candidate,
                        family
                    );
                    continue;
                }
            }

            match self.connect_one(candidate) {
                Ok(stream) => {
                    log::info!(
                        "connected to {} port {}",
                        candidate.addr_string(),
                        candidate.port()
                    );
                    return Ok(stream);
                }
                Err(Error::Io(e)) if is_recoverable_connect_error(&e) => {
                    log::warn!("connect to {} failed: {}", candidate, e);
                    if i + 1 < candidates.len() {
                        std::thread::sleep(self.retry);
                    }
                }
                Err(e) => return Err(e),
            }
        }

        Err(Error::ConnectFailed)
    }

    fn connect_one(&self, addr: &ResolvedAddr) -> Result<TcpStream> {
        let domain = match addr.family() {
            AddrFamily::V4 => Domain::IPV4,
            AddrFamily::V6 => Domain::IPV6,
        };

        let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
        self.options.apply(&socket)?;
        // Interactive line traffic, Nagle off.
        socket.set_nodelay(true)?;

        socket.connect(&Socket2Addr::from(addr.socket_addr()))?;
        Ok(socket.into())
    }
}

/// Connect errors worth trying the next candidate for.
///
/// Anything outside this set means something other than the remote
/// endpoint being unavailable and is surfaced to the caller unchanged.
pub fn is_recoverable_connect_error(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::TimedOut
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::AddrNotAvailable
    ) || matches!(
        err.raw_os_error(),
        Some(libc::ECONNREFUSED)
            | Some(libc::ECONNRESET)
            | Some(libc::ECONNABORTED)
            | Some(libc::ETIMEDOUT)
            | Some(libc::EAGAIN)
            | Some(libc::ENETDOWN)
            | Some(libc::ENETUNREACH)
            | Some(libc::ENETRESET)
            | Some(libc::EHOSTUNREACH)
            | Some(libc::EHOSTDOWN)
    )
}
