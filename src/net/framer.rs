//! Line framing over a blocking byte stream
//!
//! The framer owns the connected stream and a growable reassembly
//! buffer. Each call to [`LineFramer::next_event`] performs at most
//! one blocking read and yields exactly one of: a complete line, an
//! [`RecvEvent::Empty`] marker (keep polling), or a terminal
//! [`RecvEvent::Closed`] after which the connection is dead.
//!
//! The blocking read is bounded by the socket's receive timeout (set
//! by [`super::SocketOptions`]), which is how "no data yet" is told
//! apart from "nothing will ever arrive" without an I/O multiplexer.
//! A read failure is never fatal on its own: it is first checked
//! against the keepalive watchdog, then classified. Unrecognized
//! platform errors are logged and treated as transient, because an
//! unknown code must not silently kill a possibly-healthy connection.
//!
//! Lines are yielded in strict receive order and never duplicated,
//! including across a buffer shift or growth event. The stream and
//! buffer are exclusively owned by one framer; if senders ever share
//! the underlying socket, their writes must be serialized so a line
//! and its terminator are never interleaved.

use std::collections::VecDeque;
use std::io::{self, Read};
use std::time::{Duration, Instant};

use super::{Framing, TransportConfig};

/// Outcome of one framer resumption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecvEvent {
    /// One complete line, terminator stripped per the framing rule.
    /// Owned bytes, independent of later buffer mutation.
    Line(Vec<u8>),
    /// No complete line available right now; poll again.
    Empty,
    /// The connection is dead. Repeated polls return this again.
    Closed(Disconnect),
}

/// Why the framer declared the connection dead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disconnect {
    /// Orderly close, the peer shut the stream down.
    Eof,
    /// No byte arrived within the keepalive window while reads kept
    /// failing; the connection is silently dead.
    KeepaliveExpired,
    /// The platform reported the peer gone (reset, aborted, broken
    /// pipe). Carries the raw error text for diagnosis.
    ConnectionLost(String),
}

impl std::fmt::Display for Disconnect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Disconnect::Eof => write!(f, "connection closed by peer"),
            Disconnect::KeepaliveExpired => write!(f, "keepalive expired, connection dead"),
            Disconnect::ConnectionLost(e) => write!(f, "connection lost: {}", e),
        }
    }
}

/// Read error classification. Unknown stays separate so the caller can
/// log it before falling back to transient handling.
enum ReadClass {
    Transient,
    Fatal,
    Unknown,
}

fn classify_read_error(err: &io::Error) -> ReadClass {
    if matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
    ) || matches!(
        err.raw_os_error(),
        Some(libc::EAGAIN) | Some(libc::EINTR) | Some(libc::ETIMEDOUT)
    ) {
        return ReadClass::Transient;
    }

    if matches!(
        err.kind(),
        io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::NotConnected
            | io::ErrorKind::UnexpectedEof
    ) || matches!(
        err.raw_os_error(),
        Some(libc::ECONNRESET)
            | Some(libc::ECONNABORTED)
            | Some(libc::EPIPE)
            | Some(libc::ENOTCONN)
            | Some(libc::ENETRESET)
            | Some(libc::ESHUTDOWN)
    ) {
        return ReadClass::Fatal;
    }

    ReadClass::Unknown
}

/// Reassembly buffer with a carryover offset.
///
/// Bytes in `[0, start)` are a verified partial line fragment carried
/// over from the previous read (no newline in them); the next read
/// fills from `start`. Grown in place when a single fragment fills the
/// whole buffer, never shrunk.
struct ReadBuffer {
    buf: Vec<u8>,
    start: usize,
    growth: f64,
}

impl ReadBuffer {
    fn new(capacity: usize, growth: f64) -> Self {
        assert!(capacity > 0, "read buffer capacity must be non-zero");
        assert!(growth > 1.0, "growth factor must exceed 1.0");
        ReadBuffer {
            buf: vec![0; capacity],
            start: 0,
            growth,
        }
    }

    fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// The writable region for the next read.
    fn writable(&mut self) -> &mut [u8] {
        let start = self.start;
        &mut self.buf[start..]
    }

    fn grow(&mut self) {
        let old = self.buf.len();
        let new = ((old as f64 * self.growth).ceil() as usize).max(old + 1);
        self.buf.resize(new, 0);
        log::warn!(
            "receive buffer full with no line terminator, growing {} -> {} bytes; \
             an oversized line may arrive truncated",
            old,
            new
        );
    }
}

/// Blocking line framer bound to one connected stream.
pub struct LineFramer<R: Read> {
    reader: R,
    buffer: ReadBuffer,
    framing: Framing,
    keepalive: Duration,
    last_rx: Instant,
    queued: VecDeque<Vec<u8>>,
    drained_marker: bool,
    closed: Option<Disconnect>,
}

impl<R: Read> LineFramer<R> {
    pub fn new(reader: R, config: &TransportConfig) -> Self {
        LineFramer {
            reader,
            buffer: ReadBuffer::new(config.read_buffer_size, config.growth_factor),
            framing: config.framing,
            keepalive: config.keepalive,
            last_rx: Instant::now(),
            queued: VecDeque::new(),
            drained_marker: false,
            closed: None,
        }
    }

    /// Current reassembly buffer capacity.
    pub fn buffer_capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Give the underlying stream back, e.g. to close it after a
    /// terminal event.
    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Produce the next event: a line, an empty marker, or the
    /// terminal close.
    ///
    /// Lines already decoded from the last read are handed out first,
    /// one per call, followed by a single [`RecvEvent::Empty`] marking
    /// the read fully drained. Only then does the next call issue
    /// another blocking read.
    pub fn next_event(&mut self) -> RecvEvent {
        if let Some(line) = self.queued.pop_front() {
            return RecvEvent::Line(line);
        }
        if self.drained_marker {
            self.drained_marker = false;
            return RecvEvent::Empty;
        }
        if let Some(why) = &self.closed {
            return RecvEvent::Closed(why.clone());
        }
        self.fill()
    }

    /// One blocking read plus outcome classification.
    fn fill(&mut self) -> RecvEvent {
        let received = match self.reader.read(self.buffer.writable()) {
            Ok(0) => {
                log::info!("connection closed by peer");
                return self.close(Disconnect::Eof);
            }
            Ok(n) => n,
            Err(e) => {
                let starved = self.last_rx.elapsed();
                if starved > self.keepalive {
                    log::warn!(
                        "no data received for {:.1}s (keepalive {:.1}s), declaring connection dead",
                        starved.as_secs_f64(),
                        self.keepalive.as_secs_f64()
                    );
                    return self.close(Disconnect::KeepaliveExpired);
                }
                return match classify_read_error(&e) {
                    ReadClass::Transient => RecvEvent::Empty,
                    ReadClass::Fatal => {
                        log::warn!("read failed: {}", e);
                        self.close(Disconnect::ConnectionLost(e.to_string()))
                    }
                    ReadClass::Unknown => {
                        log::warn!(
                            "unclassified read error, treating as transient: {} (kind {:?}, os {:?})",
                            e,
                            e.kind(),
                            e.raw_os_error()
                        );
                        RecvEvent::Empty
                    }
                };
            }
        };

        self.last_rx = Instant::now();
        self.split_lines(received);

        if let Some(line) = self.queued.pop_front() {
            self.drained_marker = true;
            RecvEvent::Line(line)
        } else {
            // Data arrived but no line completed; the marker for this
            // read is consumed right here.
            RecvEvent::Empty
        }
    }

    fn close(&mut self, why: Disconnect) -> RecvEvent {
        self.closed = Some(why.clone());
        RecvEvent::Closed(why)
    }

    /// Scan the filled region for newlines, queue the completed lines,
    /// and carry the unterminated remainder to the buffer front.
    fn split_lines(&mut self, received: usize) {
        let end = self.buffer.start + received;
        let buf = &mut self.buffer.buf;

        let mut line_start = 0;
        // The carryover region [0, start) is already known to hold no
        // newline, scanning begins at the freshly filled bytes.
        for pos in self.buffer.start..end {
            if buf[pos] != b'\n' {
                continue;
            }
            let mut line_end = pos;
            if self.framing == Framing::CrLf && line_end > line_start && buf[line_end - 1] == b'\r'
            {
                line_end -= 1;
            }
            self.queued.push_back(buf[line_start..line_end].to_vec());
            line_start = pos + 1;
        }

        let remainder = end - line_start;
        if remainder == 0 {
            self.buffer.start = 0;
        } else if line_start == 0 {
            // Fragment is already at the front; grow first if it fills
            // the whole buffer.
            if end == buf.len() {
                self.buffer.grow();
            }
            self.buffer.start = end;
        } else {
            buf.copy_within(line_start..end, 0);
            self.buffer.start = remainder;
        }
    }
}
