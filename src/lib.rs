//! ircwire - line-oriented TCP transport core
//!
//! This crate turns a raw, possibly flaky TCP socket into a dependable
//! stream of complete protocol lines for line-oriented text protocols
//! such as IRC. It owns three problems:
//!
//! - resolving a hostname into candidate addresses with bounded retry
//!   and an operator-settable abort flag,
//! - connecting against the candidates in order with between-attempt
//!   backoff,
//! - reassembling arbitrary byte chunks from the socket into discrete
//!   newline-delimited lines, classifying read failures as transient or
//!   fatal, and detecting silently-dead connections with an
//!   elapsed-time watchdog.
//!
//! It deliberately does *not* understand IRC commands, implement TLS,
//! or multiplex more than one socket; one [`net::Connection`] manages
//! exactly one session.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::sync::atomic::AtomicBool;
//! use ircwire::net::{Connection, RecvEvent, TransportConfig};
//!
//! let abort = Arc::new(AtomicBool::new(false));
//! let mut conn = Connection::new(TransportConfig::default());
//! conn.resolve("irc.example.net", 6667, &abort)?;
//! conn.connect()?;
//!
//! let mut framer = conn.framer()?;
//! loop {
//!     match framer.next_event() {
//!         RecvEvent::Line(line) => println!("{}", String::from_utf8_lossy(&line)),
//!         RecvEvent::Empty => continue,
//!         RecvEvent::Closed(why) => {
//!             eprintln!("disconnected: {}", why);
//!             break;
//!         }
//!     }
//! }
//! # Ok::<(), ircwire::net::Error>(())
//! ```

pub mod net;

pub use net::{Connection, LineFramer, RecvEvent, TransportConfig};
