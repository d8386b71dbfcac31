//! # castssdp - SSDP peer engine
//!
//! This crate implements the SSDP (Simple Service Discovery Protocol) side of
//! a network-discoverable cast receiver: it announces services and answers
//! discovery searches over UDP multicast and unicast, on every active IPv4
//! interface of the host.
//!
//! ## Fonctionnalités
//!
//! - ✅ NOTIFY alive/byebye/update en multicast
//! - ✅ M-SEARCH en unicast, réponses HTTP/200 aux recherches
//! - ✅ One multicast + one unicast socket per network interface
//! - ✅ Periodic interface rescan with socket reconciliation
//! - ✅ Typed event stream (ready, listening, found, notify, search, ...)
//!
//! ## Architecture
//!
//! - [`SsdpPeer`] : public facade, protocol operations and lifecycle
//! - [`message`] : wire codec (serialize / deserialize)
//! - [`sockets`] : per-interface socket pairs and readiness bookkeeping
//! - [`scanner`] : interface enumeration and reconciliation
//!
//! ## Constants SSDP
//!
//! - **Multicast Address**: 239.255.255.250:1900
//! - **Max-Age**: 1800 seconds
//! - **Rescan period**: 15 seconds

pub mod config;
pub mod errors;
pub mod events;
pub mod message;
pub mod peer;
pub mod scanner;
pub mod sockets;

pub use config::SsdpConfig;
pub use errors::SsdpError;
pub use events::{SocketKind, SsdpEvent};
pub use message::{MessageKind, SsdpHeaders, SsdpMessage};
pub use peer::SsdpPeer;
pub use scanner::{InterfaceSource, SystemInterfaces};

use std::net::Ipv4Addr;

/// Adresse multicast SSDP
pub const SSDP_GROUP: Ipv4Addr = Ipv4Addr::new(239, 255, 255, 250);

/// Port SSDP
pub const SSDP_PORT: u16 = 1900;

/// Default HOST header value
pub const SSDP_HOST: &str = "239.255.255.250:1900";

/// Durée de validité des annonces (en secondes)
pub const MAX_AGE: u32 = 1800;

/// Multicast TTL applied to both sockets of an interface pair
pub const TTL: u32 = 128;

/// Default MX value for M-SEARCH requests
pub const MX: u32 = 2;

/// Literal token substituted with the sending interface address in
/// outgoing header values.
pub const INTERFACE_PLACEHOLDER: &str = "{{networkInterfaceAddress}}";
