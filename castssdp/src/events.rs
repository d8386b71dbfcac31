//! Événements émis par le peer SSDP
//!
//! All notifications flow through a single unbounded channel handed out by
//! [`crate::SsdpPeer::with_source`]; collaborators own the receiving end
//! before calling `start()`.

use crate::errors::SsdpError;
use crate::message::SsdpHeaders;
use std::fmt;
use std::net::{Ipv4Addr, SocketAddr};

/// Which socket of an interface pair an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketKind {
    Multicast,
    Unicast,
}

impl fmt::Display for SocketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SocketKind::Multicast => write!(f, "multicast"),
            SocketKind::Unicast => write!(f, "unicast"),
        }
    }
}

#[derive(Debug)]
pub enum SsdpEvent {
    /// First socket bound; fires exactly once per up transition.
    Ready,

    /// One socket bound and receiving.
    Listening {
        kind: SocketKind,
        address: Ipv4Addr,
        port: u16,
    },

    /// Last socket closed; fires exactly once per down transition.
    Close,

    /// Reply to one of our M-SEARCH requests.
    Found {
        headers: SsdpHeaders,
        from: SocketAddr,
    },

    /// NOTIFY announcement from another device.
    Notify {
        headers: SsdpHeaders,
        from: SocketAddr,
    },

    /// M-SEARCH request; collaborators answer with
    /// [`crate::SsdpPeer::reply`].
    Search {
        headers: SsdpHeaders,
        from: SocketAddr,
    },

    /// Non-fatal socket error (bind, join, send or receive).
    Error(SsdpError),
}
