// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! One addressed camera: its device-service address plus the cached
//! per-service endpoint table learned from `GetCapabilities`.
//!
//! The cache is keyed by lowercase service name and seeded with the
//! `device` entry, so device-management commands work before any
//! capability exchange has happened.

use std::collections::HashMap;

use log::debug;
use parking_lot::Mutex;
use url::Url;

/// Path every ONVIF device answers its management service on.
const DEVICE_SERVICE_PATH: &str = "/onvif/device_service";

#[derive(Debug)]
pub struct Device {
    xaddr: Url,
    endpoints: Mutex<HashMap<String, String>>,
}

impl Device {
    /// Address a camera by service URL, `host:port`, or bare IP.
    ///
    /// A value without a scheme is taken as a host and expanded to
    /// `http://<host>/onvif/device_service`.
    pub fn new(xaddr: &str) -> Result<Device, url::ParseError> {
        let normalized = if xaddr.contains("://") {
            xaddr.to_string()
        } else {
            format!("http://{}{}", xaddr, DEVICE_SERVICE_PATH)
        };
        let xaddr = Url::parse(&normalized)?;

        let mut endpoints = HashMap::new();
        endpoints.insert("device".to_string(), xaddr.to_string());
        Ok(Device { xaddr, endpoints: Mutex::new(endpoints) })
    }

    /// The device-management service URL.
    pub fn xaddr(&self) -> &Url {
        &self.xaddr
    }

    /// Cached endpoint for a service, if known. Case-insensitive.
    pub fn endpoint(&self, service: &str) -> Option<String> {
        self.endpoints.lock().get(&service.to_ascii_lowercase()).cloned()
    }

    /// Pin a service endpoint directly.
    pub fn set_endpoint(&self, service: &str, endpoint: &str) {
        self.endpoints
            .lock()
            .insert(service.to_ascii_lowercase(), endpoint.to_string());
    }

    /// Mine a `GetCapabilitiesResponse` document for service addresses.
    ///
    /// Every `XAddr` element found is recorded under its parent's local
    /// name (`Media`, `PTZ`, `Imaging`, ...) lowercased. Returns how
    /// many endpoints were absorbed.
    pub fn absorb_capabilities(&self, xml: &str) -> Result<usize, roxmltree::Error> {
        let doc = roxmltree::Document::parse(xml)?;
        let mut absorbed = 0;

        let mut endpoints = self.endpoints.lock();
        for node in doc.descendants().filter(|n| n.tag_name().name() == "XAddr") {
            let parent = match node.parent() {
                Some(p) if p.is_element() => p,
                _ => continue,
            };
            let addr = match node.text() {
                Some(t) if !t.trim().is_empty() => t.trim(),
                _ => continue,
            };
            let service = parent.tag_name().name().to_ascii_lowercase();
            debug!("[DEV] endpoint {} -> {}", service, addr);
            endpoints.insert(service, addr.to_string());
            absorbed += 1;
        }
        Ok(absorbed)
    }
}
