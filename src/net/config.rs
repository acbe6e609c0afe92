//! Transport configuration constants
//!
//! Every tunable the transport consumes is collected here and fixed at
//! construction; nothing in this struct is mutated at runtime.

use std::time::Duration;

use super::AddrFamily;

/// How a completed line is sliced out of the receive buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// Strip only the terminating `\n`.
    NewlineOnly,
    /// Strip the terminating `\n` and one `\r` immediately before it,
    /// if present. IRC frames messages with CRLF, so this is the
    /// default.
    CrLf,
}

/// Fixed transport tunables, applied at construction time.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// SO_RCVBUF for the connected socket.
    pub recv_buffer_size: usize,
    /// SO_SNDBUF for the connected socket.
    pub send_buffer_size: usize,
    /// Receive timeout on the blocking socket. This is what lets the
    /// framer distinguish "no data yet" from "nothing will ever
    /// arrive" without an I/O multiplexer.
    pub read_timeout: Duration,
    /// Send timeout on the blocking socket.
    pub write_timeout: Duration,
    /// Maximum resolution attempts before giving up.
    pub resolve_attempts: u32,
    /// Wait between resolution attempts. Interruptible by the abort
    /// flag.
    pub resolve_retry: Duration,
    /// Wait between failed connect attempts when more candidates
    /// remain.
    pub connect_retry: Duration,
    /// If reads keep failing and no byte has arrived for this long,
    /// the connection is declared silently dead.
    pub keepalive: Duration,
    /// Initial capacity of the framer's reassembly buffer.
    pub read_buffer_size: usize,
    /// Growth factor applied when a single unterminated fragment fills
    /// the whole reassembly buffer.
    pub growth_factor: f64,
    /// Line slicing rule.
    pub framing: Framing,
    /// Restrict connect attempts to one address family. `None` tries
    /// every resolved candidate.
    pub family: Option<AddrFamily>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig {
            recv_buffer_size: 64 * 1024,
            send_buffer_size: 16 * 1024,
            read_timeout: Duration::from_secs(1),
            write_timeout: Duration::from_secs(15),
            resolve_attempts: 5,
            resolve_retry: Duration::from_secs(2),
            connect_retry: Duration::from_secs(2),
            keepalive: Duration::from_secs(240),
            read_buffer_size: 4 * 1024,
            growth_factor: 1.5,
            framing: Framing::CrLf,
            family: None,
        }
    }
}
