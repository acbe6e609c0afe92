//! Hostname resolution with bounded retry
//!
//! Resolution is the first stage of the pipeline and the only one with
//! an operator-visible wait, so every sleep here is interruptible
//! through the shared abort flag: setting it wakes the resolver
//! immediately and the attempt is reported as aborted, not retried.
//!
//! Resolver failures are classified by their platform error text. A
//! "temporary failure in name resolution" or an unknown-name answer is
//! transient (the nameserver may simply not be reachable yet during
//! startup or a network blip) and worth retrying; anything else fails
//! the resolve immediately.

use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use super::{Error, ResolvedAddr, Result, TransportConfig};

/// Granularity of the abort-flag poll during retry waits.
const WAIT_SLICE: Duration = Duration::from_millis(25);

/// Resolves a hostname/port pair into an ordered candidate list.
pub struct AddressResolver {
    attempts: u32,
    retry: Duration,
}

impl AddressResolver {
    pub fn new(attempts: u32, retry: Duration) -> Self {
        AddressResolver { attempts, retry }
    }

    pub fn from_config(config: &TransportConfig) -> Self {
        Self::new(config.resolve_attempts, config.resolve_retry)
    }

    /// Resolve `host:port` into candidate addresses, in resolution
    /// order.
    ///
    /// Makes up to the configured number of attempts, sleeping the
    /// retry interval between transient failures. The abort flag is
    /// checked before every attempt and continuously during the retry
    /// sleep; once set, the resolve returns [`Error::Aborted`] without
    /// further attempts.
    pub fn resolve(
        &self,
        host: &str,
        port: u16,
        abort: &AtomicBool,
    ) -> Result<Vec<ResolvedAddr>> {
        self.resolve_with(host, port, abort, lookup)
    }

    /// Retry loop, generic over the lookup primitive so tests can
    /// script resolver outcomes.
    fn resolve_with<F>(
        &self,
        host: &str,
        port: u16,
        abort: &AtomicBool,
        mut lookup: F,
    ) -> Result<Vec<ResolvedAddr>>
    where
        F: FnMut(&str, u16) -> io::Result<Vec<SocketAddr>>,
    {
        for attempt in 1..=self.attempts {
            if abort.load(Ordering::SeqCst) {
                log::info!("resolution of {} aborted before attempt {}", host, attempt);
                return Err(Error::Aborted);
            }

            match lookup(host, port) {
                Ok(addrs) => {
                    log::info!("resolved {} to {} address(es)", host, addrs.len());
                    return Ok(addrs.into_iter().map(ResolvedAddr::new).collect());
                }
                Err(e) if is_transient_resolve_error(&e) => {
                    log::warn!(
                        "transient resolution failure for {} (attempt {}/{}): {}",
                        host,
                        attempt,
                        self.attempts,
                        e
                    );
                    if attempt < self.attempts && !wait_interruptible(self.retry, abort) {
                        log::info!("resolution of {} aborted during retry wait", host);
                        return Err(Error::Aborted);
                    }
                }
                Err(e) => {
                    log::error!("resolution of {} failed: {}", host, e);
                    return Err(Error::ResolutionFailed(e.to_string()));
                }
            }
        }

        log::error!(
            "failed to resolve {} after {} attempt(s)",
            host,
            self.attempts
        );
        Err(Error::ResolutionFailed(format!(
            "no answer for {} after {} attempts",
            host, self.attempts
        )))
    }
}

/// System lookup via getaddrinfo. An empty answer is folded into an
/// error so the retry loop sees a single failure shape.
fn lookup(host: &str, port: u16) -> io::Result<Vec<SocketAddr>> {
    let addrs: Vec<SocketAddr> = (host, port).to_socket_addrs()?.collect();
    if addrs.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("name resolution returned no addresses for {}", host),
        ));
    }
    Ok(addrs)
}

/// Classify a resolver error by its platform text.
///
/// getaddrinfo failures surface through std as uncategorized I/O
/// errors, so the text is all there is to go on. The strings cover
/// glibc, BSD/macOS and musl phrasings of EAI_AGAIN and EAI_NONAME.
fn is_transient_resolve_error(e: &io::Error) -> bool {
    let text = e.to_string().to_ascii_lowercase();
    text.contains("temporary failure")
        || text.contains("name or service not known")
        || text.contains("nodename nor servname")
        || text.contains("unknown node or service")
        || text.contains("no addresses")
}

/// Sleep for `dur`, polling the abort flag. Returns false if the wait
/// was cut short by an abort.
fn wait_interruptible(dur: Duration, abort: &AtomicBool) -> bool {
    let deadline = Instant::now() + dur;
    loop {
        if abort.load(Ordering::SeqCst) {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        std::thread::sleep(WAIT_SLICE.min(deadline - now));
    }
}
