//! Démon de découverte : annonce un récepteur de cast sur le réseau local.
//!
//! Wires the SSDP peer the way a DIAL-capable receiver does: listen for
//! discovery searches and point the searcher at the device description URL.

use castssdp::{SsdpEvent, SsdpHeaders, SsdpPeer};
use tracing::{debug, error, info};
use uuid::Uuid;

/// Token a DIAL-capable sender searches for.
const DIAL_SERVICE: &str = "dial-multiscreen-org:service:dial:1";

/// Full URN advertised back in replies.
const DIAL_SERVICE_URN: &str = "urn:dial-multiscreen-org:service:dial:1";

/// Port of the (external) HTTP device-description collaborator.
const DEVICE_DESC_PORT: u16 = 8008;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let device_uuid = Uuid::new_v4();
    info!("📡 Starting SSDP peer (uuid: {})", device_uuid);

    let (peer, mut events) = SsdpPeer::new();
    peer.start();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("👋 Shutting down");
                break;
            }
            event = events.recv() => {
                let Some(event) = event else { break };
                handle_event(&peer, device_uuid, event).await;
            }
        }
    }

    peer.close();
    Ok(())
}

async fn handle_event(peer: &SsdpPeer, device_uuid: Uuid, event: SsdpEvent) {
    match event {
        SsdpEvent::Ready => info!("✅ SSDP ready"),
        SsdpEvent::Listening {
            kind,
            address,
            port,
        } => info!("✅ SSDP listening [{}, {}, {}]", kind, address, port),
        SsdpEvent::Close => info!("SSDP sockets closed"),
        SsdpEvent::Search { headers, from } => {
            let wants_dial = headers
                .get("ST")
                .is_some_and(|st| st.contains(DIAL_SERVICE));
            if !wants_dial {
                debug!("Ignoring M-SEARCH from {} (ST={:?})", from, headers.get("ST"));
                return;
            }

            let local = match castutils::local_ipv4() {
                Ok(ip) => ip,
                Err(e) => {
                    error!("❌ Cannot answer DIAL search: {}", e);
                    return;
                }
            };

            let mut reply = SsdpHeaders::new();
            reply.insert(
                "LOCATION",
                format!("http://{}:{}/ssdp/device-desc.xml", local, DEVICE_DESC_PORT),
            );
            reply.insert("ST", DIAL_SERVICE_URN);
            reply.insert("CONFIGID.UPNP.ORG", "7337");
            reply.insert("BOOTID.UPNP.ORG", "7337");
            reply.insert("USN", format!("uuid:{}", device_uuid));

            for (iface, result) in peer.reply(&mut reply, from).await {
                match result {
                    Ok(bytes) => info!("📤 DIAL reply to {} via {} ({} bytes)", from, iface, bytes),
                    Err(e) => error!("❌ DIAL reply to {} via {} failed: {}", from, iface, e),
                }
            }
        }
        SsdpEvent::Notify { headers, from } => {
            debug!("NOTIFY from {} (NT={:?})", from, headers.get("NT"));
        }
        SsdpEvent::Found { headers, from } => {
            debug!("Search reply from {} (ST={:?})", from, headers.get("ST"));
        }
        SsdpEvent::Error(e) => error!("❌ SSDP error: {}", e),
    }
}
