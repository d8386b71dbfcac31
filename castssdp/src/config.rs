//! Configuration du moteur SSDP

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Tunables of the SSDP peer. The defaults reproduce the well-known SSDP
/// behavior; tests typically set `multicast_port` to 0 to avoid clashing on
/// port 1900.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SsdpConfig {
    /// Port the multicast socket binds to on each interface. This is a
    /// bind-only knob: outgoing traffic always targets the well-known group
    /// 239.255.255.250:1900. Non-default values (typically 0) exist for
    /// tests that must stay off the real SSDP port.
    pub multicast_port: u16,

    /// Range the unicast socket draws its ephemeral port from.
    pub unicast_port_range: Range<u16>,

    /// Seconds between two interface rescans.
    pub scan_interval_secs: u64,

    /// Multicast TTL, applied to both sockets of the pair.
    pub multicast_ttl: u32,

    /// CACHE-CONTROL max-age advertised in notifications and replies.
    pub max_age: u32,
}

impl Default for SsdpConfig {
    fn default() -> Self {
        Self {
            multicast_port: crate::SSDP_PORT,
            unicast_port_range: 50000..51000,
            scan_interval_secs: 15,
            multicast_ttl: crate::TTL,
            max_age: crate::MAX_AGE,
        }
    }
}
