//! One logical session: resolve, connect, frame
//!
//! A [`Connection`] owns the socket for exactly one session attempt.
//! `resolve` populates the candidate list (repeatable, replacing prior
//! results), `connect` consumes it to produce a live stream, and
//! `framer` binds a [`LineFramer`] to the stream. After a terminal
//! framer event the caller resets and decides whether to run the
//! pipeline again from resolution.

use std::io::Write;
use std::net::{Shutdown, TcpStream};
use std::sync::atomic::AtomicBool;

use super::{
    AddressResolver, Connector, Error, LineFramer, ResolvedAddr, Result, TransportConfig,
};

pub struct Connection {
    config: TransportConfig,
    candidates: Vec<ResolvedAddr>,
    stream: Option<TcpStream>,
    connected: bool,
}

impl Connection {
    pub fn new(config: TransportConfig) -> Self {
        Connection {
            config,
            candidates: Vec::new(),
            stream: None,
            connected: false,
        }
    }

    /// Resolve `host:port` into the candidate list, replacing any
    /// previous resolution result.
    pub fn resolve(&mut self, host: &str, port: u16, abort: &AtomicBool) -> Result<()> {
        let resolver = AddressResolver::from_config(&self.config);
        self.candidates = resolver.resolve(host, port, abort)?;
        Ok(())
    }

    /// Connect against the resolved candidates, first success wins.
    ///
    /// Consumes the candidate list. Calling this without a successful
    /// resolve first is a contract violation and panics.
    pub fn connect(&mut self) -> Result<()> {
        assert!(
            !self.candidates.is_empty(),
            "connect called before a successful resolve"
        );

        let candidates = std::mem::take(&mut self.candidates);
        let connector = Connector::from_config(&self.config);
        let stream = connector.connect(&candidates)?;

        self.stream = Some(stream);
        self.connected = true;
        Ok(())
    }

    /// True after a successful connect. Says nothing about whether the
    /// peer is still alive now; liveness is re-derived continuously by
    /// the framer.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn peer_addr(&self) -> Result<ResolvedAddr> {
        let stream = self.stream.as_ref().ok_or(Error::NotConnected)?;
        Ok(stream.peer_addr()?.into())
    }

    /// Bind a line framer to the connected stream.
    ///
    /// The framer reads through its own handle; the handle kept here
    /// remains available for sends and for closing the socket
    /// out-of-band, which is how a stuck framer is cancelled from
    /// outside.
    pub fn framer(&self) -> Result<LineFramer<TcpStream>> {
        let stream = self.stream.as_ref().ok_or(Error::NotConnected)?;
        Ok(LineFramer::new(stream.try_clone()?, &self.config))
    }

    /// Send one protocol line.
    ///
    /// The payload and the CRLF terminator go out in a single write so
    /// a line is never interleaved with another writer's bytes. If the
    /// socket is ever shared between senders, they must take turns on
    /// this method; a torn line corrupts the protocol stream.
    pub fn send_line(&mut self, payload: &[u8]) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;

        let mut wire = Vec::with_capacity(payload.len() + 2);
        wire.extend_from_slice(payload);
        wire.extend_from_slice(b"\r\n");
        stream.write_all(&wire)?;
        Ok(())
    }

    /// Tear the session down: shut the socket, drop the stream, clear
    /// the connected flag and any leftover candidates.
    pub fn reset(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(Shutdown::Both);
        }
        self.connected = false;
        self.candidates.clear();
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.reset();
    }
}
