// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wire constants and runtime overrides - single source of truth.
//!
//! Every protocol constant used by the crate lives here. **NEVER hardcode
//! elsewhere!**
//!
//! - **Level 1 (Static)**: compile-time constants (multicast group, ports,
//!   timeouts, the ONVIF namespace table)
//! - **Level 2 (Dynamic)**: environment overrides, resolved at call time

use std::net::Ipv4Addr;
use std::time::Duration;

// =======================================================================
// WS-Discovery (OASIS WS-Discovery 1.0, ONVIF Core Spec Sec.7)
// =======================================================================

/// WS-Discovery IPv4 multicast group.
pub const WS_DISCOVERY_GROUP: Ipv4Addr = Ipv4Addr::new(239, 255, 255, 250);

/// WS-Discovery UDP port.
pub const WS_DISCOVERY_PORT: u16 = 3702;

/// Outgoing multicast TTL for probe datagrams.
///
/// 2 hops: enough to cross one router on a segmented LAN, small enough to
/// keep probes off the wider network.
pub const WS_DISCOVERY_TTL: u32 = 2;

/// Upper bound on a single inbound probe-match datagram.
pub const WS_DISCOVERY_BUF_SIZE: usize = 8192;

/// Default reply-collection window after a probe is sent.
///
/// A window that elapses with zero replies is normal completion, never an
/// error.
pub const WS_DISCOVERY_WINDOW: Duration = Duration::from_secs(2);

/// Action URI carried in the probe header.
pub const WS_DISCOVERY_ACTION: &str =
    "http://schemas.xmlsoap.org/ws/2005/04/discovery/Probe";

/// Fixed `To` endpoint URI of the discovery multicast group.
pub const WS_DISCOVERY_TO: &str = "urn:schemas-xmlsoap-org:ws:2005:04:discovery";

/// Anonymous reply-to role URI.
pub const WS_DISCOVERY_ANONYMOUS: &str =
    "http://schemas.xmlsoap.org/ws/2004/08/addressing/role/anonymous";

/// Force the outgoing multicast interface (IPv4 address literal).
///
/// Checked before the caller-named interface and the default-route probe.
pub const ENV_MULTICAST_IF: &str = "ONVIF_MULTICAST_IF";

/// External address used to discover the default-route interface.
///
/// No traffic is exchanged: a connected UDP socket only asks the kernel
/// which local address it would route from.
pub const DEFAULT_ROUTE_PROBE_ADDR: &str = "1.1.1.1:80";

// =======================================================================
// SOAP command dispatch
// =======================================================================

/// Per-call timeout for one command POST.
pub const SOAP_TIMEOUT: Duration = Duration::from_secs(3);

/// Content type of every command POST.
pub const SOAP_CONTENT_TYPE: &str = "application/soap+xml; charset=utf-8";

/// Neutral wrapper element recognized on caller-supplied fragments.
///
/// A fragment of the form `<onvif>...</onvif>` bypasses the codec: the
/// inner content is wrapped verbatim in the method's own root element.
pub const FRAGMENT_WRAPPER: &str = "onvif";

/// Namespace declarations attached to the root of every command envelope.
///
/// This is the ONVIF prefix table the declarative schemas in
/// [`crate::schema::catalog`] resolve against.
pub const ONVIF_NAMESPACES: &[(&str, &str)] = &[
    ("xmlns:onvif", "http://www.onvif.org/ver10/schema"),
    ("xmlns:tds", "http://www.onvif.org/ver10/device/wsdl"),
    ("xmlns:trt", "http://www.onvif.org/ver10/media/wsdl"),
    ("xmlns:tt", "http://www.onvif.org/ver10/schema"),
    ("xmlns:timg", "http://www.onvif.org/ver20/imaging/wsdl"),
    ("xmlns:tptz", "http://www.onvif.org/ver20/ptz/wsdl"),
    ("xmlns:tev", "http://www.onvif.org/ver10/events/wsdl"),
    ("xmlns:ter", "http://www.onvif.org/ver10/error"),
    ("xmlns:dn", "http://www.onvif.org/ver10/network/wsdl"),
    ("xmlns:wsnt", "http://docs.oasis-open.org/wsn/b-2"),
];

/// SOAP 1.2 envelope namespace.
pub const SOAP_ENVELOPE_NS: &str = "http://www.w3.org/2003/05/soap-envelope";

/// WS-Security extension namespace (UsernameToken header).
pub const WSSE_NS: &str = "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd";

/// WS-Security utility namespace (Created timestamp).
pub const WSU_NS: &str = "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-utility-1.0.xsd";

/// Password digest type URI (UsernameToken profile).
pub const PASSWORD_DIGEST_TYPE: &str = "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-username-token-profile-1.0#PasswordDigest";

/// Nonce encoding type URI (Base64Binary).
pub const NONCE_ENCODING_TYPE: &str = "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-soap-message-security-1.0#Base64Binary";
