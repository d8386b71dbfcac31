//! Façade publique du peer SSDP

use crate::config::SsdpConfig;
use crate::events::{SocketKind, SsdpEvent};
use crate::message::{self, SsdpHeaders};
use crate::scanner::{InterfaceScanner, InterfaceSource, SystemInterfaces};
use crate::sockets::SocketTable;
use crate::{SSDP_GROUP, SSDP_HOST, SSDP_PORT};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Per-interface send outcome: interface address and bytes sent or the send
/// error. One entry per interface the message actually went out on; empty
/// when no interface is bound.
pub type SendOutcomes = Vec<(String, std::io::Result<usize>)>;

/// SSDP peer: announces services, searches for them and answers discovery
/// requests on every active IPv4 interface.
///
/// Construction hands out the event stream; subscribe (keep the receiver)
/// before calling [`start`](Self::start).
///
/// ```no_run
/// use castssdp::{SsdpPeer, SsdpEvent, SsdpHeaders};
///
/// # async fn demo() {
/// let (peer, mut events) = SsdpPeer::new();
/// peer.start();
/// while let Some(event) = events.recv().await {
///     if let SsdpEvent::Search { headers, from } = event {
///         let mut reply = SsdpHeaders::new();
///         reply.insert("ST", headers.get("ST").unwrap_or_default());
///         peer.reply(&mut reply, from).await;
///     }
/// }
/// # }
/// ```
pub struct SsdpPeer {
    config: SsdpConfig,
    table: Arc<SocketTable>,
    scanner: Arc<InterfaceScanner>,
    scan_task: Mutex<Option<JoinHandle<()>>>,
}

impl SsdpPeer {
    /// Peer over the system network interfaces, default configuration.
    pub fn new() -> (Self, UnboundedReceiver<SsdpEvent>) {
        Self::with_source(SsdpConfig::default(), Arc::new(SystemInterfaces))
    }

    /// Peer with an explicit configuration and interface source.
    pub fn with_source(
        config: SsdpConfig,
        source: Arc<dyn InterfaceSource>,
    ) -> (Self, UnboundedReceiver<SsdpEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let table = Arc::new(SocketTable::new(config.clone(), tx));
        let scanner = Arc::new(InterfaceScanner::new(source));
        let peer = Self {
            config,
            table,
            scanner,
            scan_task: Mutex::new(None),
        };
        (peer, rx)
    }

    /// Starts the periodic interface scan: one pass immediately, then one
    /// per scan interval. Calling `start` while running restarts the timer.
    pub fn start(&self) {
        self.stop_scan();
        let table = Arc::clone(&self.table);
        let scanner = Arc::clone(&self.scanner);
        let period = Duration::from_secs(self.config.scan_interval_secs.max(1));
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                // First tick completes immediately.
                ticker.tick().await;
                scanner.scan(&table).await;
            }
        });
        *self.scan_task.lock().unwrap() = Some(handle);
        info!("✅ SSDP peer started (rescan every {:?})", period);
    }

    /// Cancels the periodic scan. Open sockets are left untouched; use
    /// [`close`](Self::close) to tear them down.
    pub fn stop_scan(&self) {
        if let Some(task) = self.scan_task.lock().unwrap().take() {
            task.abort();
        }
    }

    /// Runs one reconciliation pass outside the timer.
    pub async fn scan_now(&self) {
        self.scanner.scan(&self.table).await;
    }

    /// Stops scanning and closes every socket.
    pub fn close(&self) {
        self.stop_scan();
        self.table.close_all();
    }

    /// Addresses currently holding a socket pair.
    pub fn bound_interfaces(&self) -> Vec<String> {
        self.table.bound_addresses()
    }

    /// Multicasts a NOTIFY to the SSDP group. Caller-supplied headers win
    /// over the injected defaults (HOST, CACHE-CONTROL, EXT, DATE).
    pub async fn notify(&self, headers: &mut SsdpHeaders) -> SendOutcomes {
        self.fill_notify_defaults(headers);
        let headers = &*headers;
        let sent = self
            .table
            .send_on_all(SocketKind::Multicast, group_dest(), |iface| {
                message::serialize(message::NOTIFY_START, headers, iface)
            })
            .await;
        debug!("📤 SSDP NOTIFY sent on {} interface(s)", sent.len());
        sent
    }

    /// NOTIFY with NTS `ssdp:alive`.
    pub async fn alive(&self, headers: &mut SsdpHeaders) -> SendOutcomes {
        headers.set_default("NTS", "ssdp:alive");
        self.notify(headers).await
    }

    /// NOTIFY with NTS `ssdp:byebye`.
    pub async fn byebye(&self, headers: &mut SsdpHeaders) -> SendOutcomes {
        headers.set_default("NTS", "ssdp:byebye");
        self.notify(headers).await
    }

    /// NOTIFY with NTS `ssdp:update`.
    pub async fn update(&self, headers: &mut SsdpHeaders) -> SendOutcomes {
        headers.set_default("NTS", "ssdp:update");
        self.notify(headers).await
    }

    /// Sends an M-SEARCH to the SSDP group from each unicast socket, so
    /// replies come back unicast. Injects HOST, MAN and MX defaults.
    pub async fn search(&self, headers: &mut SsdpHeaders) -> SendOutcomes {
        headers.set_default("HOST", SSDP_HOST);
        headers.set_default("MAN", "\"ssdp:discover\"");
        headers.set_default("MX", crate::MX.to_string());
        let headers = &*headers;
        let sent = self
            .table
            .send_on_all(SocketKind::Unicast, group_dest(), |iface| {
                message::serialize(message::SEARCH_START, headers, iface)
            })
            .await;
        debug!("📤 SSDP M-SEARCH sent on {} interface(s)", sent.len());
        sent
    }

    /// Answers a discovery search with an HTTP/200, unicast to `reply_to`.
    pub async fn reply(&self, headers: &mut SsdpHeaders, reply_to: SocketAddr) -> SendOutcomes {
        self.fill_notify_defaults(headers);
        let headers = &*headers;
        let sent = self
            .table
            .send_on_all(SocketKind::Unicast, reply_to, |iface| {
                message::serialize(message::OK_START, headers, iface)
            })
            .await;
        debug!("📤 SSDP reply sent to {}", reply_to);
        sent
    }

    fn fill_notify_defaults(&self, headers: &mut SsdpHeaders) {
        headers.set_default("HOST", SSDP_HOST);
        headers.set_default("CACHE-CONTROL", format!("max-age={}", self.config.max_age));
        headers.set_default("EXT", "");
        headers.set_default("DATE", rfc1123_now());
    }
}

impl Drop for SsdpPeer {
    fn drop(&mut self) {
        self.close();
    }
}

fn group_dest() -> SocketAddr {
    SocketAddr::from((SSDP_GROUP, SSDP_PORT))
}

fn rfc1123_now() -> String {
    chrono::Utc::now()
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}
