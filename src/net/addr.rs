//! Resolved candidate addresses
//!
//! A [`ResolvedAddr`] is one endpoint among possibly several returned
//! by the resolver for a hostname. The connector consumes them
//! read-only, in resolution order.

use std::fmt;
use std::net::{IpAddr, SocketAddr};

/// Address family tag, used by the connector to skip candidates the
/// configured socket cannot use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddrFamily {
    V4,
    V6,
}

impl fmt::Display for AddrFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddrFamily::V4 => write!(f, "IPv4"),
            AddrFamily::V6 => write!(f, "IPv6"),
        }
    }
}

/// One resolved network endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedAddr {
    addr: SocketAddr,
}

impl ResolvedAddr {
    pub fn new(addr: SocketAddr) -> Self {
        ResolvedAddr { addr }
    }

    pub fn family(&self) -> AddrFamily {
        match self.addr {
            SocketAddr::V4(_) => AddrFamily::V4,
            SocketAddr::V6(_) => AddrFamily::V6,
        }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn ip(&self) -> IpAddr {
        self.addr.ip()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Format the address without the port, unmapping v4-mapped IPv6
    /// addresses (::ffff:x.x.x.x) to their IPv4 form.
    pub fn addr_string(&self) -> String {
        match self.addr.ip() {
            IpAddr::V4(ip) => ip.to_string(),
            IpAddr::V6(ip) => {
                if let Some(v4) = ip.to_ipv4_mapped() {
                    v4.to_string()
                } else {
                    ip.to_string()
                }
            }
        }
    }
}

impl fmt::Display for ResolvedAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.addr)
    }
}

impl From<SocketAddr> for ResolvedAddr {
    fn from(addr: SocketAddr) -> Self {
        ResolvedAddr::new(addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr, SocketAddrV4, SocketAddrV6};

    #[test]
    fn test_family_tags() {
        let v4 = ResolvedAddr::new(SocketAddr::V4(SocketAddrV4::new(
            Ipv4Addr::new(127, 0, 0, 1),
            6667,
        )));
        assert_eq!(v4.family(), AddrFamily::V4);
        assert_eq!(v4.port(), 6667);

        let v6 = ResolvedAddr::new(SocketAddr::V6(SocketAddrV6::new(
            Ipv6Addr::LOCALHOST,
            6667,
            0,
            0,
        )));
        assert_eq!(v6.family(), AddrFamily::V6);
    }

    #[test]
    fn test_v4_mapped_formatting() {
        // ::ffff:127.0.0.1
        let mapped = Ipv6Addr::new(0, 0, 0, 0, 0, 0xffff, 0x7f00, 0x0001);
        let addr = ResolvedAddr::new(SocketAddr::V6(SocketAddrV6::new(mapped, 6667, 0, 0)));
        assert_eq!(addr.addr_string(), "127.0.0.1");
    }

    #[test]
    fn test_display() {
        let addr: ResolvedAddr = "192.168.1.1:6697".parse::<SocketAddr>().unwrap().into();
        assert_eq!(addr.to_string(), "192.168.1.1:6697");
        assert_eq!(addr.addr_string(), "192.168.1.1");
    }
}
