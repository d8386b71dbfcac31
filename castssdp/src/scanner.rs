//! Énumération des interfaces réseau et réconciliation des sockets
//!
//! Hosts change IP configuration while the process runs (DHCP renewal,
//! interface up/down). Rescanning on a fixed period keeps the socket set
//! consistent without OS-level network-change notifications, at the cost of
//! up to one scan interval of discovery latency after a topology change.

use crate::sockets::SocketTable;
use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use tracing::warn;

/// Supplies the IPv4 addresses eligible for SSDP binding.
///
/// The production implementation is [`SystemInterfaces`]; tests inject their
/// own address lists.
pub trait InterfaceSource: Send + Sync {
    fn addresses(&self) -> Vec<Ipv4Addr>;
}

/// Enumerates the host interfaces, keeping IPv4 non-loopback entries.
pub struct SystemInterfaces;

impl InterfaceSource for SystemInterfaces {
    fn addresses(&self) -> Vec<Ipv4Addr> {
        let mut out = Vec::new();
        match get_if_addrs::get_if_addrs() {
            Ok(interfaces) => {
                for iface in interfaces {
                    if let IpAddr::V4(ipv4) = iface.ip() {
                        if !ipv4.is_loopback() {
                            out.push(ipv4);
                        }
                    }
                }
            }
            Err(e) => warn!("❌ Failed to enumerate network interfaces: {}", e),
        }
        out
    }
}

/// Reconciles the binding table against the current interface set.
pub(crate) struct InterfaceScanner {
    source: Arc<dyn InterfaceSource>,
}

impl InterfaceScanner {
    pub(crate) fn new(source: Arc<dyn InterfaceSource>) -> Self {
        Self { source }
    }

    /// Opens sockets for newly appeared interfaces and closes those whose
    /// interface vanished. Address comparison is string based; after the
    /// call, the bound set equals the qualifying set.
    pub(crate) async fn scan(&self, table: &SocketTable) {
        let current = self.source.addresses();
        let mut qualifying = HashSet::with_capacity(current.len());

        for address in current {
            let key = address.to_string();
            if !table.is_bound(&key) {
                table.open_interface(address).await;
            }
            qualifying.insert(key);
        }

        for bound in table.bound_addresses() {
            if !qualifying.contains(&bound) {
                table.close_interface(&bound);
            }
        }
    }
}
