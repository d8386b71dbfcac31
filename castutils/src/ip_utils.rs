use get_if_addrs::get_if_addrs;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LocalAddrError {
    #[error("Cannot enumerate network interfaces: {0}")]
    Enumerate(#[from] std::io::Error),

    #[error("Cannot find local ipv4 address")]
    NotFound,
}

/// Adresse IPv4 locale de la machine.
///
/// Parcourt les interfaces réseau et retourne la première adresse IPv4
/// non-loopback. Used to build LOCATION header values when answering
/// discovery searches.
///
/// # Returns
///
/// The address, or [`LocalAddrError::NotFound`] when the host has no
/// qualifying interface. There is deliberately no loopback fallback: a
/// LOCATION pointing at 127.0.0.1 would be useless to the peer that asked.
pub fn local_ipv4() -> Result<Ipv4Addr, LocalAddrError> {
    for iface in get_if_addrs()? {
        if let IpAddr::V4(ipv4) = iface.ip() {
            if !ipv4.is_loopback() {
                return Ok(ipv4);
            }
        }
    }
    Err(LocalAddrError::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_ipv4_never_loopback() {
        match local_ipv4() {
            Ok(ip) => assert!(!ip.is_loopback(), "loopback must be filtered out"),
            // Host without any network interface: acceptable, just typed.
            Err(LocalAddrError::NotFound) => {}
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    #[test]
    fn test_error_message_matches_contract() {
        assert_eq!(
            LocalAddrError::NotFound.to_string(),
            "Cannot find local ipv4 address"
        );
    }
}
