// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # onvif-client - ONVIF camera control
//!
//! A pure Rust client for ONVIF IP cameras: WS-Discovery probing over
//! UDP multicast plus generic SOAP command dispatch against the device,
//! media, imaging, and PTZ services.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use onvif_client::{Client, Credentials, Reply};
//!
//! fn main() -> onvif_client::Result<()> {
//!     let auth = Credentials::new("admin", "secret");
//!     let client = Client::connect("192.168.1.10", Some(auth))?;
//!
//!     match client.call("device", "GetSystemDateAndTime", "")? {
//!         Reply::Decoded(node) => println!("{:?}", node),
//!         Reply::Raw(body) => println!("{}", body),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +--------------------------------------------------------------+
//! |                        Client::call                          |
//! |  registry lookup -> body codec -> endpoint -> POST -> reply  |
//! +--------------------------------------------------------------+
//! |  schema::catalog  |  codec  |  device  |  soap  |  transport |
//! +--------------------------------------------------------------+
//! |          discovery (WS-Discovery, UDP multicast)             |
//! +--------------------------------------------------------------+
//! ```
//!
//! ## Modules Overview
//!
//! - [`client`] - Command dispatcher (start here)
//! - [`discovery`] - WS-Discovery probe over multicast
//! - [`schema`] - Declarative operation descriptors
//! - [`codec`] - Caller-fragment to wire-body encoding

/// Command dispatcher (lookup, encode, send, decode).
pub mod client;
/// Request-body codec: partial fragment to namespaced command body.
pub mod codec;
/// Wire constants and runtime overrides (single source of truth).
pub mod config;
/// Per-camera addressing and the cached service endpoint table.
pub mod device;
/// WS-Discovery probe over UDP multicast.
pub mod discovery;
/// Declarative command descriptors and the service/operation registry.
pub mod schema;
/// SOAP 1.2 envelope construction with WS-Security.
pub mod soap;
/// Blocking HTTP transport behind the `SoapTransport` seam.
pub mod transport;

pub use client::{Client, Error, Reply, ResponseNode, Result};
pub use device::Device;
pub use discovery::{device_addresses, probe, ProbeOptions};
pub use schema::catalog::Service;
pub use soap::Credentials;
pub use transport::{HttpTransport, SoapTransport};

/// Crate version, as published.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
