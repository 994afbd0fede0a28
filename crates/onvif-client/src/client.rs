// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Command dispatcher.
//!
//! [`Client::call`] takes a service name, a method name, and a partial
//! body fragment, and runs the whole exchange: registry lookup, body
//! encoding, endpoint resolution, envelope wrapping, the POST, and
//! reply decoding. Registry misses fail before any network traffic.
//!
//! Reply handling degrades instead of failing: if the reply cannot be
//! parsed, or the operation's response payload is not found in it, the
//! raw body is handed back untouched.

use std::fmt;

use log::debug;

use crate::codec::{self, CodecError};
use crate::config;
use crate::device::Device;
use crate::discovery::DiscoveryError;
use crate::schema::{self, catalog};
use crate::schema::catalog::{Operation, Service};
use crate::soap::{self, Credentials};
use crate::transport::{HttpTransport, SoapTransport, TransportError};

// =======================================================================
// Errors
// =======================================================================

#[derive(Debug)]
pub enum Error {
    // ---- registry ------------------------------------------------------
    UnknownService(String),
    UnknownMethod { service: String, method: String },

    // ---- addressing ----------------------------------------------------
    Address(url::ParseError),
    EndpointNotFound(String),

    // ---- encoding ------------------------------------------------------
    Codec(CodecError),

    // ---- network -------------------------------------------------------
    Transport(TransportError),
    Discovery(DiscoveryError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnknownService(s) => write!(f, "no such service: {}", s),
            Error::UnknownMethod { service, method } => {
                write!(f, "no method {} in the {} service", method, service)
            }
            Error::Address(e) => write!(f, "bad device address: {}", e),
            Error::EndpointNotFound(s) => write!(f, "no endpoint for service {}", s),
            Error::Codec(e) => write!(f, "{}", e),
            Error::Transport(e) => write!(f, "{}", e),
            Error::Discovery(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Address(e) => Some(e),
            Error::Codec(e) => Some(e),
            Error::Transport(e) => Some(e),
            Error::Discovery(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CodecError> for Error {
    fn from(e: CodecError) -> Self {
        Error::Codec(e)
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Error::Transport(e)
    }
}

impl From<DiscoveryError> for Error {
    fn from(e: DiscoveryError) -> Self {
        Error::Discovery(e)
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Error::Address(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

// =======================================================================
// Replies
// =======================================================================

/// An owned element subtree lifted out of a reply document.
///
/// Names are local names; namespace prefixes vary per vendor and are
/// stripped on extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseNode {
    pub name: String,
    pub text: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<ResponseNode>,
}

impl ResponseNode {
    fn from_xml(node: roxmltree::Node<'_, '_>) -> ResponseNode {
        ResponseNode {
            name: node.tag_name().name().to_string(),
            text: node.text().unwrap_or("").trim().to_string(),
            attrs: node
                .attributes()
                .map(|a| (a.name().to_string(), a.value().to_string()))
                .collect(),
            children: node
                .children()
                .filter(|c| c.is_element())
                .map(ResponseNode::from_xml)
                .collect(),
        }
    }

    /// First node with this local name, depth-first, self included.
    pub fn find(&self, name: &str) -> Option<&ResponseNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }

    /// Non-empty text of every node with this local name, in document
    /// order. Handy for mining token or Uri lists out of replies.
    pub fn texts<'a>(&'a self, name: &str) -> Vec<&'a str> {
        let mut out = Vec::new();
        self.collect_texts(name, &mut out);
        out
    }

    fn collect_texts<'a>(&'a self, name: &str, out: &mut Vec<&'a str>) {
        if self.name == name && !self.text.is_empty() {
            out.push(self.text.as_str());
        }
        for child in &self.children {
            child.collect_texts(name, out);
        }
    }

    /// Attribute value by local name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }
}

/// Outcome of one dispatched command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// The operation's response payload, extracted from the envelope.
    Decoded(ResponseNode),
    /// The raw reply body: fault, unparseable, or an operation with no
    /// declared response payload.
    Raw(String),
}

// =======================================================================
// Client
// =======================================================================

pub struct Client<T: SoapTransport = HttpTransport> {
    device: Device,
    transport: T,
    auth: Option<Credentials>,
}

impl Client<HttpTransport> {
    /// Address a camera over plain HTTP.
    pub fn connect(xaddr: &str, auth: Option<Credentials>) -> Result<Self> {
        Ok(Client {
            device: Device::new(xaddr)?,
            transport: HttpTransport::new()?,
            auth,
        })
    }
}

impl<T: SoapTransport> Client<T> {
    /// Build a client over a custom transport.
    pub fn with_transport(device: Device, transport: T, auth: Option<Credentials>) -> Self {
        Client { device, transport, auth }
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Dispatch one command.
    ///
    /// `fragment` is a partial body whose tags are the operation's field
    /// names; empty stands for an argument-free call, and an
    /// `<onvif>...</onvif>` wrapper sends the inner content verbatim
    /// under the operation's root element.
    pub fn call(&self, service: &str, method: &str, fragment: &str) -> Result<Reply> {
        let svc = Service::parse(service)
            .ok_or_else(|| Error::UnknownService(service.to_string()))?;
        let op = catalog::lookup(svc, method).ok_or_else(|| Error::UnknownMethod {
            service: svc.as_str().to_string(),
            method: method.to_string(),
        })?;

        let body = self.encode_body(op, fragment)?;
        let endpoint = self.resolve_endpoint(svc)?;
        let envelope = soap::envelope(&body, self.auth.as_ref());

        debug!("[ONVIF] {}/{} -> {}", svc.as_str(), method, endpoint);
        let response = self.transport.send(&endpoint, &envelope, config::SOAP_TIMEOUT)?;
        Ok(decode_reply(op, response))
    }

    fn encode_body(&self, op: &'static Operation, fragment: &str) -> Result<String> {
        let fragment = fragment.trim();
        if fragment.is_empty() {
            let placeholder =
                format!("<{w}></{w}>", w = config::FRAGMENT_WRAPPER);
            return Ok(codec::encode_request(op.request, &placeholder)?);
        }

        let open = format!("<{}>", config::FRAGMENT_WRAPPER);
        let close = format!("</{}>", config::FRAGMENT_WRAPPER);
        if let Some(inner) = fragment
            .strip_prefix(open.as_str())
            .and_then(|rest| rest.strip_suffix(close.as_str()))
        {
            if !inner.is_empty() {
                let flat = schema::flatten(op.request).map_err(CodecError::from)?;
                let root = flat.first().ok_or(CodecError::UndeclaredField {
                    index: 0,
                    tag: config::FRAGMENT_WRAPPER.to_string(),
                })?;
                return Ok(format!(
                    "<{root}>{inner}</{root}>",
                    root = root.meta.name,
                    inner = inner
                ));
            }
        }
        Ok(codec::encode_request(op.request, fragment)?)
    }

    fn resolve_endpoint(&self, svc: Service) -> Result<String> {
        let name = svc.as_str();
        if let Some(endpoint) = self.device.endpoint(name) {
            return Ok(endpoint);
        }
        self.refresh_endpoints()?;
        self.device
            .endpoint(name)
            .ok_or_else(|| Error::EndpointNotFound(name.to_string()))
    }

    /// Learn the endpoint table with one `GetCapabilities` round trip.
    fn refresh_endpoints(&self) -> Result<()> {
        let op = catalog::lookup(Service::Device, "GetCapabilities")
            .ok_or_else(|| Error::UnknownMethod {
                service: "device".to_string(),
                method: "GetCapabilities".to_string(),
            })?;
        let placeholder = format!("<{w}></{w}>", w = config::FRAGMENT_WRAPPER);
        let body = codec::encode_request(op.request, &placeholder)?;
        let endpoint = self
            .device
            .endpoint("device")
            .ok_or_else(|| Error::EndpointNotFound("device".to_string()))?;
        let envelope = soap::envelope(&body, self.auth.as_ref());
        let response = self.transport.send(&endpoint, &envelope, config::SOAP_TIMEOUT)?;
        if let Err(e) = self.device.absorb_capabilities(&response) {
            debug!("[ONVIF] capability reply unparseable: {}", e);
        }
        Ok(())
    }
}

fn decode_reply(op: &Operation, body: String) -> Reply {
    let root = match op.response_root {
        Some(root) => root,
        None => return Reply::Raw(body),
    };
    let doc = match roxmltree::Document::parse(&body) {
        Ok(doc) => doc,
        Err(_) => return Reply::Raw(body),
    };
    match doc.descendants().find(|n| n.tag_name().name() == root) {
        Some(node) => Reply::Decoded(ResponseNode::from_xml(node)),
        None => Reply::Raw(body),
    }
}
