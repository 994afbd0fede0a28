// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! HTTP transport for SOAP command traffic.
//!
//! [`SoapTransport`] is the seam the dispatcher talks through; tests
//! substitute a capturing fake, production uses [`HttpTransport`] over
//! a blocking reqwest client.

use std::fmt;
use std::time::Duration;

use log::debug;

use crate::config;

#[derive(Debug)]
pub enum TransportError {
    /// The HTTP client itself could not be constructed.
    Build(reqwest::Error),
    /// The POST failed or timed out.
    Send { endpoint: String, source: reqwest::Error },
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Build(e) => write!(f, "http client build failed: {}", e),
            TransportError::Send { endpoint, source } => {
                write!(f, "soap post to {} failed: {}", endpoint, source)
            }
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransportError::Build(e) => Some(e),
            TransportError::Send { source, .. } => Some(source),
        }
    }
}

/// One-shot SOAP exchange: POST the envelope, return the raw reply body.
///
/// Implementations must return the body for *any* HTTP status. SOAP
/// faults arrive as 4xx/5xx with an XML body the caller still wants.
pub trait SoapTransport {
    fn send(
        &self,
        endpoint: &str,
        envelope: &str,
        timeout: Duration,
    ) -> Result<String, TransportError>;
}

/// Blocking HTTP transport.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .map_err(TransportError::Build)?;
        Ok(HttpTransport { client })
    }
}

impl SoapTransport for HttpTransport {
    fn send(
        &self,
        endpoint: &str,
        envelope: &str,
        timeout: Duration,
    ) -> Result<String, TransportError> {
        debug!("[SOAP] POST {} ({} bytes)", endpoint, envelope.len());
        let response = self
            .client
            .post(endpoint)
            .header(reqwest::header::CONTENT_TYPE, config::SOAP_CONTENT_TYPE)
            .timeout(timeout)
            .body(envelope.to_string())
            .send()
            .map_err(|e| TransportError::Send { endpoint: endpoint.to_string(), source: e })?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| TransportError::Send { endpoint: endpoint.to_string(), source: e })?;
        debug!("[SOAP] {} <- {} ({} bytes)", status, endpoint, body.len());
        Ok(body)
    }
}
