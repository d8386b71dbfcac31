//! Codec SSDP : sérialisation et désérialisation des datagrammes
//!
//! SSDP frames are HTTP-over-UDP: a start line, CRLF-separated headers and a
//! terminating blank line. Parsing is deliberately forgiving, a malformed
//! header line is skipped without failing the whole datagram.

use tracing::trace;

/// Start line of an outgoing NOTIFY
pub const NOTIFY_START: &str = "NOTIFY * HTTP/1.1";

/// Start line of an outgoing M-SEARCH
pub const SEARCH_START: &str = "M-SEARCH * HTTP/1.1";

/// Start line of a search reply
pub const OK_START: &str = "HTTP/1.1 200 OK";

/// Classification of a received datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// HTTP status line: a reply to one of our searches
    Found,
    /// M-SEARCH request from a control point
    Search,
    /// NOTIFY announcement from another device
    Notify,
    /// Anything else; callers must drop these silently
    Unrecognized,
}

/// A parsed SSDP datagram.
#[derive(Debug, Clone)]
pub struct SsdpMessage {
    pub kind: MessageKind,
    pub headers: SsdpHeaders,
}

/// Header mapping preserving insertion order.
///
/// Serialization must emit headers in the order the caller supplied them, so
/// this is a thin wrapper over a `Vec` rather than a `HashMap`. Lookups are
/// exact-match; parsed header names are upper-cased before insertion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SsdpHeaders {
    entries: Vec<(String, String)>,
}

impl SsdpHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a header, keeping its original position on
    /// replacement.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Inserts a header only when the caller did not already supply it.
    pub fn set_default(&mut self, name: &str, value: impl Into<String>) {
        if !self.contains(name) {
            self.entries.push((name.to_string(), value.into()));
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for SsdpHeaders {
    fn from_iter<T: IntoIterator<Item = (N, V)>>(iter: T) -> Self {
        let mut headers = SsdpHeaders::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

/// Builds the wire text for one outgoing message.
///
/// Headers are emitted in insertion order. Any occurrence of
/// [`crate::INTERFACE_PLACEHOLDER`] in a header value is substituted with
/// `interface_addr`, so LOCATION-style headers can be made interface-specific.
pub fn serialize(start_line: &str, headers: &SsdpHeaders, interface_addr: &str) -> String {
    let mut out = String::with_capacity(64 + headers.len() * 32);
    out.push_str(start_line);
    out.push_str("\r\n");
    for (name, value) in headers.iter() {
        out.push_str(name);
        out.push_str(": ");
        out.push_str(value);
        out.push_str("\r\n");
    }
    out.push_str("\r\n");
    if !interface_addr.is_empty() && out.contains(crate::INTERFACE_PLACEHOLDER) {
        out = out.replace(crate::INTERFACE_PLACEHOLDER, interface_addr);
    }
    out
}

/// Parses one received datagram.
///
/// The first line decides the [`MessageKind`]; the remaining non-empty lines
/// are split on their first colon, names upper-cased and trimmed. Lines
/// without a colon are skipped.
pub fn deserialize(datagram: &[u8]) -> SsdpMessage {
    let text = String::from_utf8_lossy(datagram);
    let mut lines = text.split("\r\n");
    let kind = classify(lines.next().unwrap_or(""));

    let mut headers = SsdpHeaders::new();
    for line in lines {
        if line.is_empty() {
            continue;
        }
        let Some(colon) = line.find(':') else {
            trace!("Skipping line without colon: '{}'", line);
            continue;
        };
        let (name, value) = line.split_at(colon);
        let name = name.trim().to_ascii_uppercase();
        if name.is_empty() {
            trace!("Skipping malformed header: '{}'", line);
            continue;
        }
        headers.insert(name, value[1..].trim());
    }

    SsdpMessage { kind, headers }
}

fn classify(start_line: &str) -> MessageKind {
    if is_status_line(start_line) {
        return MessageKind::Found;
    }
    match start_line.split(' ').next() {
        Some("M-SEARCH") => MessageKind::Search,
        Some("NOTIFY") => MessageKind::Notify,
        _ => MessageKind::Unrecognized,
    }
}

/// Matches `HTTP/<major>.<minor> <status> <reason>`.
fn is_status_line(line: &str) -> bool {
    let mut parts = line.splitn(3, ' ');
    let (Some(proto), Some(status), Some(_reason)) = (parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    let Some(version) = proto.strip_prefix("HTTP/") else {
        return false;
    };
    let mut digits = version.splitn(2, '.');
    let (Some(major), Some(minor)) = (digits.next(), digits.next()) else {
        return false;
    };
    major.len() == 1
        && minor.len() == 1
        && major.bytes().all(|b| b.is_ascii_digit())
        && minor.bytes().all(|b| b.is_ascii_digit())
        && !status.is_empty()
        && status.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_basic_framing() {
        let headers: SsdpHeaders = [("HOST", "239.255.255.250:1900"), ("NT", "upnp:rootdevice")]
            .into_iter()
            .collect();
        let text = serialize(NOTIFY_START, &headers, "10.0.0.5");
        assert_eq!(
            text,
            "NOTIFY * HTTP/1.1\r\nHOST: 239.255.255.250:1900\r\nNT: upnp:rootdevice\r\n\r\n"
        );
    }

    #[test]
    fn test_serialize_preserves_insertion_order() {
        let headers: SsdpHeaders = [("Z", "1"), ("A", "2"), ("M", "3")].into_iter().collect();
        let text = serialize(OK_START, &headers, "");
        let z = text.find("Z: 1").unwrap();
        let a = text.find("A: 2").unwrap();
        let m = text.find("M: 3").unwrap();
        assert!(z < a && a < m);
    }

    #[test]
    fn test_serialize_substitutes_interface_placeholder() {
        let headers: SsdpHeaders = [(
            "LOCATION",
            "http://{{networkInterfaceAddress}}:8008/desc.xml",
        )]
        .into_iter()
        .collect();
        let text = serialize(OK_START, &headers, "192.168.1.10");
        assert!(text.contains("LOCATION: http://192.168.1.10:8008/desc.xml"));
        assert!(!text.contains("{{networkInterfaceAddress}}"));
    }

    #[test]
    fn test_deserialize_msearch_without_headers() {
        let msg = deserialize(b"M-SEARCH * HTTP/1.1\r\n\r\n");
        assert_eq!(msg.kind, MessageKind::Search);
        assert!(msg.headers.is_empty());
    }

    #[test]
    fn test_deserialize_status_line_is_found() {
        let msg = deserialize(b"HTTP/1.1 200 OK\r\n\r\n");
        assert_eq!(msg.kind, MessageKind::Found);
        assert!(msg.headers.is_empty());
    }

    #[test]
    fn test_deserialize_garbage_is_unrecognized() {
        assert_eq!(deserialize(b"GARBAGE\r\n\r\n").kind, MessageKind::Unrecognized);
        assert_eq!(deserialize(b"").kind, MessageKind::Unrecognized);
        assert_eq!(deserialize(b"\r\n\r\n").kind, MessageKind::Unrecognized);
        // A status line needs a numeric status and a reason
        assert_eq!(
            deserialize(b"HTTP/1.1 abc OK\r\n\r\n").kind,
            MessageKind::Unrecognized
        );
    }

    #[test]
    fn test_deserialize_notify() {
        let msg = deserialize(b"NOTIFY * HTTP/1.1\r\nNTS: ssdp:alive\r\n\r\n");
        assert_eq!(msg.kind, MessageKind::Notify);
        assert_eq!(msg.headers.get("NTS"), Some("ssdp:alive"));
    }

    #[test]
    fn test_deserialize_uppercases_header_names() {
        let msg = deserialize(b"NOTIFY * HTTP/1.1\r\nnts: ssdp:alive\r\nCache-Control: max-age=1800\r\n\r\n");
        assert_eq!(msg.headers.get("NTS"), Some("ssdp:alive"));
        assert_eq!(msg.headers.get("CACHE-CONTROL"), Some("max-age=1800"));
    }

    #[test]
    fn test_deserialize_skips_lines_without_colon() {
        let msg = deserialize(b"NOTIFY * HTTP/1.1\r\nNOCOLON\r\nNT: upnp:rootdevice\r\n\r\n");
        assert_eq!(msg.headers.len(), 1);
        assert_eq!(msg.headers.get("NT"), Some("upnp:rootdevice"));
    }

    #[test]
    fn test_deserialize_keeps_colons_in_values() {
        let msg = deserialize(b"HTTP/1.1 200 OK\r\nLOCATION: http://10.0.0.5:8008/x\r\n\r\n");
        assert_eq!(msg.headers.get("LOCATION"), Some("http://10.0.0.5:8008/x"));
    }

    #[test]
    fn test_deserialize_keeps_empty_values() {
        let msg = deserialize(b"HTTP/1.1 200 OK\r\nEXT:\r\n\r\n");
        assert_eq!(msg.headers.get("EXT"), Some(""));
    }

    #[test]
    fn test_roundtrip_recovers_headers() {
        let headers: SsdpHeaders = [
            ("HOST", "239.255.255.250:1900"),
            ("CACHE-CONTROL", "max-age=1800"),
            ("EXT", ""),
            ("USN", "uuid:1234::upnp:rootdevice"),
        ]
        .into_iter()
        .collect();
        let text = serialize(NOTIFY_START, &headers, "");
        let msg = deserialize(text.as_bytes());
        assert_eq!(msg.kind, MessageKind::Notify);
        assert_eq!(msg.headers, headers);
    }

    #[test]
    fn test_headers_set_default_never_overwrites() {
        let mut headers = SsdpHeaders::new();
        headers.insert("MX", "5");
        headers.set_default("MX", "2");
        headers.set_default("MAN", "\"ssdp:discover\"");
        assert_eq!(headers.get("MX"), Some("5"));
        assert_eq!(headers.get("MAN"), Some("\"ssdp:discover\""));
    }

    #[test]
    fn test_headers_insert_replaces_in_place() {
        let mut headers: SsdpHeaders = [("A", "1"), ("B", "2")].into_iter().collect();
        headers.insert("A", "3");
        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("A"), Some("3"));
        assert_eq!(headers.iter().next(), Some(("A", "3")));
    }
}
