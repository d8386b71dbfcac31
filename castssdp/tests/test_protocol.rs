//! Protocol operations: injected defaults and send fan-out semantics.

use castssdp::message::{self, NOTIFY_START};
use castssdp::{InterfaceSource, SsdpConfig, SsdpHeaders, SsdpPeer};
use std::net::Ipv4Addr;
use std::sync::Arc;

/// Source with no qualifying interfaces at all.
struct NoInterfaces;

impl InterfaceSource for NoInterfaces {
    fn addresses(&self) -> Vec<Ipv4Addr> {
        Vec::new()
    }
}

fn unbound_peer() -> (SsdpPeer, tokio::sync::mpsc::UnboundedReceiver<castssdp::SsdpEvent>) {
    SsdpPeer::with_source(SsdpConfig::default(), Arc::new(NoInterfaces))
}

#[tokio::test]
async fn test_search_without_interfaces_sends_nothing() {
    let (peer, mut rx) = unbound_peer();
    peer.scan_now().await;

    let mut headers: SsdpHeaders = [("ST", "foo")].into_iter().collect();
    let outcomes = peer.search(&mut headers).await;

    assert!(outcomes.is_empty(), "no interface, no send, no outcome");
    assert!(rx.try_recv().is_err(), "no event either");
}

#[tokio::test]
async fn test_search_injects_discovery_defaults() {
    let (peer, _rx) = unbound_peer();

    let mut headers: SsdpHeaders = [("ST", "upnp:rootdevice")].into_iter().collect();
    peer.search(&mut headers).await;

    assert_eq!(headers.get("HOST"), Some("239.255.255.250:1900"));
    assert_eq!(headers.get("MAN"), Some("\"ssdp:discover\""));
    assert_eq!(headers.get("MX"), Some("2"));
    assert_eq!(headers.get("ST"), Some("upnp:rootdevice"));
}

#[tokio::test]
async fn test_notify_defaults_do_not_overwrite_caller_values() {
    let (peer, _rx) = unbound_peer();

    let mut headers: SsdpHeaders = [
        ("CACHE-CONTROL", "max-age=60"),
        ("DATE", "Thu, 01 Jan 1970 00:00:00 GMT"),
    ]
    .into_iter()
    .collect();
    peer.notify(&mut headers).await;

    assert_eq!(headers.get("CACHE-CONTROL"), Some("max-age=60"));
    assert_eq!(headers.get("DATE"), Some("Thu, 01 Jan 1970 00:00:00 GMT"));
    assert_eq!(headers.get("HOST"), Some("239.255.255.250:1900"));
    assert_eq!(headers.get("EXT"), Some(""));
}

#[tokio::test]
async fn test_alive_and_byebye_differ_only_in_nts() {
    let (peer, _rx) = unbound_peer();

    let mut alive = SsdpHeaders::new();
    let mut byebye = SsdpHeaders::new();
    peer.alive(&mut alive).await;
    peer.byebye(&mut byebye).await;

    assert_eq!(alive.get("NTS"), Some("ssdp:alive"));
    assert_eq!(byebye.get("NTS"), Some("ssdp:byebye"));

    // Same wire text once the NTS and DATE lines are set aside (the two
    // DATE values may straddle a second boundary).
    let strip = |text: String| -> Vec<String> {
        text.lines()
            .filter(|l| !l.starts_with("NTS:") && !l.starts_with("DATE:"))
            .map(str::to_string)
            .collect()
    };
    let alive_text = strip(message::serialize(NOTIFY_START, &alive, ""));
    let byebye_text = strip(message::serialize(NOTIFY_START, &byebye, ""));
    assert_eq!(alive_text, byebye_text);
}

#[tokio::test]
async fn test_update_sets_nts() {
    let (peer, _rx) = unbound_peer();

    let mut headers = SsdpHeaders::new();
    peer.update(&mut headers).await;
    assert_eq!(headers.get("NTS"), Some("ssdp:update"));
}

#[tokio::test]
async fn test_caller_supplied_nts_wins() {
    let (peer, _rx) = unbound_peer();

    let mut headers: SsdpHeaders = [("NTS", "ssdp:byebye")].into_iter().collect();
    peer.alive(&mut headers).await;
    assert_eq!(headers.get("NTS"), Some("ssdp:byebye"));
}

#[tokio::test]
async fn test_reply_without_interfaces_sends_nothing() {
    let (peer, _rx) = unbound_peer();

    let mut headers: SsdpHeaders = [("ST", "urn:dial-multiscreen-org:service:dial:1")]
        .into_iter()
        .collect();
    let outcomes = peer
        .reply(&mut headers, "192.168.1.50:50123".parse().unwrap())
        .await;
    assert!(outcomes.is_empty());
    // Reply still fills the response defaults.
    assert_eq!(headers.get("HOST"), Some("239.255.255.250:1900"));
    assert_eq!(headers.get("CACHE-CONTROL"), Some("max-age=1800"));
    assert!(headers.get("DATE").is_some());
}
