// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! WS-Discovery probe over UDP multicast.
//!
//! One probe is one socket: join the discovery group on the resolved
//! interface, send a single Probe envelope, then collect every datagram
//! that arrives inside the reply window. An empty collection is normal
//! completion, not an error.
//!
//! Interface resolution order: the `ONVIF_MULTICAST_IF` environment
//! variable (IPv4 literal), then the caller-named OS interface, then
//! the default-route interface, then `0.0.0.0`.

use std::fmt;
use std::net::{Ipv4Addr, SocketAddrV4, UdpSocket};
use std::time::{Duration, Instant};

use log::{debug, warn};
use socket2::{Domain, Protocol, Socket, Type};
use uuid::Uuid;

use crate::config;

#[derive(Debug)]
pub enum DiscoveryError {
    /// Socket setup or probe send failed.
    Io(std::io::Error),
}

impl fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoveryError::Io(e) => write!(f, "discovery socket: {}", e),
        }
    }
}

impl std::error::Error for DiscoveryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DiscoveryError::Io(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for DiscoveryError {
    fn from(e: std::io::Error) -> Self {
        DiscoveryError::Io(e)
    }
}

/// Knobs for one probe round.
#[derive(Debug, Clone)]
pub struct ProbeOptions {
    /// OS interface name to multicast from. `None` uses the default route.
    pub interface: Option<String>,
    /// Probe `Types`. Empty means `dn:NetworkVideoTransmitter`.
    pub types: Vec<String>,
    /// Probe `Scopes`. Empty omits the element.
    pub scopes: Vec<String>,
    /// Reply-collection window.
    pub window: Duration,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        ProbeOptions {
            interface: None,
            types: Vec::new(),
            scopes: Vec::new(),
            window: config::WS_DISCOVERY_WINDOW,
        }
    }
}

/// Build the Probe envelope for one message id.
pub fn build_probe_message(message_id: &str, scopes: &[String], types: &[String]) -> String {
    let types_text = if types.is_empty() {
        "dn:NetworkVideoTransmitter".to_string()
    } else {
        types.join(" ")
    };
    let scopes_element = if scopes.is_empty() {
        String::new()
    } else {
        format!("<d:Scopes>{}</d:Scopes>", scopes.join(" "))
    };

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <e:Envelope xmlns:e=\"{env}\" \
         xmlns:w=\"http://schemas.xmlsoap.org/ws/2004/08/addressing\" \
         xmlns:d=\"http://schemas.xmlsoap.org/ws/2005/04/discovery\" \
         xmlns:dn=\"http://www.onvif.org/ver10/network/wsdl\">\
         <e:Header>\
         <w:MessageID>uuid:{id}</w:MessageID>\
         <w:ReplyTo><w:Address>{anon}</w:Address></w:ReplyTo>\
         <w:To e:mustUnderstand=\"true\">{to}</w:To>\
         <w:Action e:mustUnderstand=\"true\">{action}</w:Action>\
         </e:Header>\
         <e:Body>\
         <d:Probe><d:Types>{types}</d:Types>{scopes}</d:Probe>\
         </e:Body>\
         </e:Envelope>",
        env = config::SOAP_ENVELOPE_NS,
        id = message_id,
        anon = config::WS_DISCOVERY_ANONYMOUS,
        to = config::WS_DISCOVERY_TO,
        action = config::WS_DISCOVERY_ACTION,
        types = types_text,
        scopes = scopes_element,
    )
}

/// Pick the IPv4 address to multicast from.
fn resolve_interface(named: Option<&str>) -> Ipv4Addr {
    if let Ok(value) = std::env::var(config::ENV_MULTICAST_IF) {
        match value.parse::<Ipv4Addr>() {
            Ok(addr) => {
                debug!("[DISC] interface from {}: {}", config::ENV_MULTICAST_IF, addr);
                return addr;
            }
            Err(_) => {
                warn!("[DISC] ignoring unparseable {}={}", config::ENV_MULTICAST_IF, value)
            }
        }
    }

    if let Some(name) = named {
        if let Ok(interfaces) = local_ip_address::list_afinet_netifas() {
            for (ifname, addr) in interfaces {
                if ifname == name {
                    if let std::net::IpAddr::V4(v4) = addr {
                        debug!("[DISC] interface {}: {}", name, v4);
                        return v4;
                    }
                }
            }
        }
        warn!("[DISC] interface {} not found, falling back to default route", name);
    }

    if let Some(addr) = default_route_address() {
        debug!("[DISC] default-route interface: {}", addr);
        return addr;
    }
    Ipv4Addr::UNSPECIFIED
}

/// Ask the kernel which local address routes outward. Sends nothing.
fn default_route_address() -> Option<Ipv4Addr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).ok()?;
    socket.connect(config::DEFAULT_ROUTE_PROBE_ADDR).ok()?;
    match socket.local_addr().ok()? {
        std::net::SocketAddr::V4(addr) => Some(*addr.ip()),
        std::net::SocketAddr::V6(_) => None,
    }
}

/// Send one probe and collect raw reply envelopes for the window.
pub fn probe(options: &ProbeOptions) -> Result<Vec<String>, DiscoveryError> {
    let iface = resolve_interface(options.interface.as_deref());

    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    socket.bind(&SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0).into())?;
    socket.join_multicast_v4(&config::WS_DISCOVERY_GROUP, &iface)?;
    socket.set_multicast_if_v4(&iface)?;
    socket.set_multicast_ttl_v4(config::WS_DISCOVERY_TTL)?;
    let socket: UdpSocket = socket.into();

    let message = build_probe_message(
        &Uuid::new_v4().to_string(),
        &options.scopes,
        &options.types,
    );
    let group = SocketAddrV4::new(config::WS_DISCOVERY_GROUP, config::WS_DISCOVERY_PORT);
    socket.send_to(message.as_bytes(), group)?;
    debug!("[DISC] probe sent to {} via {}", group, iface);

    let deadline = Instant::now() + options.window;
    let mut buf = [0u8; config::WS_DISCOVERY_BUF_SIZE];
    let mut replies = Vec::new();

    loop {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        socket.set_read_timeout(Some(deadline - now))?;
        match socket.recv_from(&mut buf) {
            Ok((n, peer)) => {
                debug!("[DISC] {} bytes from {}", n, peer);
                replies.push(String::from_utf8_lossy(&buf[..n]).into_owned());
            }
            Err(e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                break;
            }
            Err(e) => return Err(DiscoveryError::Io(e)),
        }
    }

    debug!("[DISC] window closed, {} replies", replies.len());
    Ok(replies)
}

/// Pull the advertised service addresses out of one ProbeMatch reply.
///
/// `XAddrs` is a space-separated list; malformed replies yield nothing.
pub fn device_addresses(reply: &str) -> Vec<String> {
    let doc = match roxmltree::Document::parse(reply) {
        Ok(doc) => doc,
        Err(_) => return Vec::new(),
    };
    doc.descendants()
        .filter(|n| n.tag_name().name() == "XAddrs")
        .filter_map(|n| n.text())
        .flat_map(|t| t.split_whitespace())
        .map(str::to_string)
        .collect()
}
