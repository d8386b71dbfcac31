//! Gestion des sockets par interface réseau
//!
//! Each bound interface owns a socket pair: a multicast socket on the SSDP
//! port joined to 239.255.255.250, and a unicast socket on an ephemeral port
//! in the 50000–50999 range. The table also keeps the readiness counter:
//! `Ready` fires when the first socket binds, `Close` when the last one goes
//! away.

use crate::config::SsdpConfig;
use crate::errors::SsdpError;
use crate::events::{SocketKind, SsdpEvent};
use crate::message::{self, MessageKind};
use crate::SSDP_GROUP;
use rand::Rng;
use socket2::{Domain, Protocol, Socket, Type};
use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use tokio::net::UdpSocket;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

/// One bound socket together with its receive task.
struct SocketHandle {
    socket: Arc<UdpSocket>,
    port: u16,
    receiver: JoinHandle<()>,
}

/// Socket pair of one network interface. Either socket may be absent when
/// its bind failed; sends over an absent socket are silently skipped.
struct InterfaceBinding {
    address: Ipv4Addr,
    multicast: Option<SocketHandle>,
    unicast: Option<SocketHandle>,
}

impl InterfaceBinding {
    fn socket(&self, kind: SocketKind) -> Option<Arc<UdpSocket>> {
        let handle = match kind {
            SocketKind::Multicast => self.multicast.as_ref(),
            SocketKind::Unicast => self.unicast.as_ref(),
        };
        handle.map(|h| Arc::clone(&h.socket))
    }
}

/// Binding table, keyed by interface address string.
pub(crate) struct SocketTable {
    config: SsdpConfig,
    bindings: Mutex<HashMap<String, InterfaceBinding>>,
    ready: Mutex<i32>,
    events: UnboundedSender<SsdpEvent>,
}

impl SocketTable {
    pub(crate) fn new(config: SsdpConfig, events: UnboundedSender<SsdpEvent>) -> Self {
        Self {
            config,
            bindings: Mutex::new(HashMap::new()),
            ready: Mutex::new(0),
            events,
        }
    }

    pub(crate) fn is_bound(&self, address: &str) -> bool {
        self.bindings.lock().unwrap().contains_key(address)
    }

    pub(crate) fn bound_addresses(&self) -> Vec<String> {
        self.bindings.lock().unwrap().keys().cloned().collect()
    }

    /// Opens the socket pair for `address` and records the binding.
    ///
    /// Bind failures are reported through the `Error` event and leave the
    /// corresponding slot empty; they never abort the caller.
    pub(crate) async fn open_interface(&self, address: Ipv4Addr) {
        let key = address.to_string();
        if self.is_bound(&key) {
            return;
        }

        let mut binding = InterfaceBinding {
            address,
            multicast: None,
            unicast: None,
        };

        match self.open_multicast(address) {
            Ok(socket) => {
                binding.multicast = Some(self.watch(socket, SocketKind::Multicast, address));
            }
            Err(e) => {
                warn!("❌ Failed to open multicast socket on {}: {}", key, e);
                let _ = self.events.send(SsdpEvent::Error(e));
            }
        }

        match self.open_unicast(address) {
            Ok(socket) => {
                binding.unicast = Some(self.watch(socket, SocketKind::Unicast, address));
            }
            Err(e) => {
                warn!("❌ Failed to open unicast socket on {}: {}", key, e);
                let _ = self.events.send(SsdpEvent::Error(e));
            }
        }

        self.bindings.lock().unwrap().insert(key, binding);
    }

    /// Closes the socket pair for `address`, if bound. A no-op otherwise.
    pub(crate) fn close_interface(&self, address: &str) {
        let binding = self.bindings.lock().unwrap().remove(address);
        let Some(binding) = binding else {
            return;
        };
        if let Some(handle) = binding.multicast {
            self.release(handle, SocketKind::Multicast, binding.address);
        }
        if let Some(handle) = binding.unicast {
            self.release(handle, SocketKind::Unicast, binding.address);
        }
    }

    /// Closes every binding; used on shutdown.
    pub(crate) fn close_all(&self) {
        for address in self.bound_addresses() {
            self.close_interface(&address);
        }
    }

    /// Sends one message per binding over the socket of the requested kind.
    ///
    /// The payload is built per interface so placeholder substitution stays
    /// interface-specific. The table is snapshotted at call time; bindings
    /// added while sending are not included. Returns the per-interface
    /// outcomes, empty when nothing is bound.
    pub(crate) async fn send_on_all<F>(
        &self,
        kind: SocketKind,
        dest: SocketAddr,
        build: F,
    ) -> Vec<(String, std::io::Result<usize>)>
    where
        F: Fn(&str) -> String,
    {
        let targets: Vec<(String, Arc<UdpSocket>)> = {
            let bindings = self.bindings.lock().unwrap();
            bindings
                .iter()
                .filter_map(|(addr, binding)| {
                    binding.socket(kind).map(|socket| (addr.clone(), socket))
                })
                .collect()
        };

        let mut outcomes = Vec::with_capacity(targets.len());
        for (address, socket) in targets {
            let payload = build(&address);
            let result = socket.send_to(payload.as_bytes(), dest).await;
            if let Err(e) = &result {
                warn!("❌ SSDP send to {} failed on {}: {}", dest, address, e);
                let _ = self.events.send(SsdpEvent::Error(SsdpError::Send {
                    address: address.clone(),
                    source: std::io::Error::new(e.kind(), e.to_string()),
                }));
            }
            outcomes.push((address, result));
        }
        outcomes
    }

    /// Builds the multicast socket: SSDP port, group membership, loopback
    /// delivery and broadcast enabled, TTL 128.
    fn open_multicast(&self, address: Ipv4Addr) -> Result<UdpSocket, SsdpError> {
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
        socket.set_reuse_address(true)?;

        let bind_addr = SocketAddr::from((address, self.config.multicast_port));
        socket
            .bind(&bind_addr.into())
            .map_err(|e| SsdpError::Bind {
                address: bind_addr.to_string(),
                source: e,
            })?;

        // Group membership can fail on interfaces without multicast support;
        // the socket stays usable for unicast delivery.
        if let Err(e) = socket.join_multicast_v4(&SSDP_GROUP, &address) {
            warn!("SSDP: failed to join {} on {}: {}", SSDP_GROUP, address, e);
            let _ = self.events.send(SsdpEvent::Error(SsdpError::MulticastJoin {
                address: address.to_string(),
                source: e,
            }));
        } else {
            debug!("SSDP: joined {} on {}", SSDP_GROUP, address);
        }

        socket.set_multicast_loop_v4(true)?;
        socket.set_broadcast(true)?;
        socket.set_multicast_ttl_v4(self.config.multicast_ttl)?;

        self.into_tokio(socket)
    }

    /// Builds the unicast socket on a random port of the configured range.
    /// The multicast TTL is set here as well; it governs multicast-addressed
    /// M-SEARCH traffic sent from this socket.
    fn open_unicast(&self, address: Ipv4Addr) -> Result<UdpSocket, SsdpError> {
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
        socket.set_reuse_address(true)?;

        let port = rand::rng().random_range(self.config.unicast_port_range.clone());
        let bind_addr = SocketAddr::from((address, port));
        socket
            .bind(&bind_addr.into())
            .map_err(|e| SsdpError::Bind {
                address: bind_addr.to_string(),
                source: e,
            })?;

        socket.set_multicast_ttl_v4(self.config.multicast_ttl)?;

        self.into_tokio(socket)
    }

    fn into_tokio(&self, socket: Socket) -> Result<UdpSocket, SsdpError> {
        socket.set_nonblocking(true)?;
        let socket: std::net::UdpSocket = socket.into();
        Ok(UdpSocket::from_std(socket)?)
    }

    /// Registers a freshly bound socket: spawns its receive task, bumps the
    /// readiness counter and emits `Listening` (plus `Ready` on the first
    /// bind).
    fn watch(&self, socket: UdpSocket, kind: SocketKind, address: Ipv4Addr) -> SocketHandle {
        let port = socket
            .local_addr()
            .map(|a| a.port())
            .unwrap_or(self.config.multicast_port);
        let socket = Arc::new(socket);
        let receiver = spawn_receiver(Arc::clone(&socket), self.events.clone());

        info!("✅ SSDP {} socket listening on {}:{}", kind, address, port);
        let _ = self.events.send(SsdpEvent::Listening {
            kind,
            address,
            port,
        });

        let first = {
            let mut ready = self.ready.lock().unwrap();
            *ready += 1;
            *ready == 1
        };
        if first {
            let _ = self.events.send(SsdpEvent::Ready);
        }

        SocketHandle {
            socket,
            port,
            receiver,
        }
    }

    /// Tears one socket down and emits `Close` when the bound count returns
    /// to zero.
    fn release(&self, handle: SocketHandle, kind: SocketKind, address: Ipv4Addr) {
        handle.receiver.abort();
        debug!(
            "SSDP: closed {} socket on {}:{}",
            kind, address, handle.port
        );
        drop(handle.socket);

        let last = {
            let mut ready = self.ready.lock().unwrap();
            *ready -= 1;
            if *ready <= 0 {
                *ready = 0;
                true
            } else {
                false
            }
        };
        if last {
            let _ = self.events.send(SsdpEvent::Close);
        }
    }
}

/// Receive loop of one socket: parse, classify, dispatch. Unrecognized
/// datagrams are dropped without an event. Read errors are reported and the
/// socket keeps receiving; only an explicit close (or the event stream going
/// away) ends the loop.
fn spawn_receiver(socket: Arc<UdpSocket>, events: UnboundedSender<SsdpEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut buf = [0u8; 8192];
        loop {
            let received = socket.recv_from(&mut buf).await;
            if !dispatch_datagram(received, &buf, &events) {
                // Receiver dropped, nobody is listening anymore.
                break;
            }
        }
    })
}

/// Handles one receive outcome. Returns whether the loop should keep
/// running; `false` only when the event channel is closed.
fn dispatch_datagram(
    received: std::io::Result<(usize, SocketAddr)>,
    buf: &[u8],
    events: &UnboundedSender<SsdpEvent>,
) -> bool {
    match received {
        Ok((n, from)) => {
            let msg = message::deserialize(&buf[..n]);
            let event = match msg.kind {
                MessageKind::Found => SsdpEvent::Found {
                    headers: msg.headers,
                    from,
                },
                MessageKind::Search => SsdpEvent::Search {
                    headers: msg.headers,
                    from,
                },
                MessageKind::Notify => SsdpEvent::Notify {
                    headers: msg.headers,
                    from,
                },
                MessageKind::Unrecognized => {
                    trace!("Unrecognized SSDP datagram from {}", from);
                    return true;
                }
            };
            events.send(event).is_ok()
        }
        Err(e) => {
            warn!("❌ SSDP read error: {}", e);
            events.send(SsdpEvent::Error(SsdpError::Socket(e))).is_ok()
        }
    }
}
