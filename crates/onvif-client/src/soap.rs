// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! SOAP 1.2 envelope construction.
//!
//! Every command body travels in the same envelope shape: the ONVIF
//! prefix table on the root element, an optional WS-Security
//! UsernameToken header, and the encoded body verbatim inside
//! `<soap-env:Body>`. The digest follows the UsernameToken profile:
//! `Base64(SHA1(nonce || created || password))`.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{SecondsFormat, Utc};
use quick_xml::escape::escape;
use sha1::{Digest, Sha1};
use uuid::Uuid;

use crate::config;

/// Authentication material for the WS-Security header.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials { username: username.into(), password: password.into() }
    }
}

/// UsernameToken password digest.
pub fn password_digest(nonce: &[u8], created: &str, password: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(nonce);
    hasher.update(created.as_bytes());
    hasher.update(password.as_bytes());
    BASE64.encode(hasher.finalize())
}

/// Build the `<wsse:Security>` header for one request.
///
/// Split out from [`envelope`] so the digest math is testable with a
/// fixed nonce and timestamp.
fn security_header(auth: &Credentials, nonce: &[u8], created: &str) -> String {
    let digest = password_digest(nonce, created, &auth.password);
    format!(
        "<wsse:Security soap-env:mustUnderstand=\"1\" xmlns:wsse=\"{wsse}\" xmlns:wsu=\"{wsu}\">\
         <wsse:UsernameToken>\
         <wsse:Username>{user}</wsse:Username>\
         <wsse:Password Type=\"{ptype}\">{digest}</wsse:Password>\
         <wsse:Nonce EncodingType=\"{ntype}\">{nonce}</wsse:Nonce>\
         <wsu:Created>{created}</wsu:Created>\
         </wsse:UsernameToken>\
         </wsse:Security>",
        wsse = config::WSSE_NS,
        wsu = config::WSU_NS,
        user = escape(auth.username.as_str()),
        ptype = config::PASSWORD_DIGEST_TYPE,
        digest = digest,
        ntype = config::NONCE_ENCODING_TYPE,
        nonce = BASE64.encode(nonce),
        created = created,
    )
}

/// Wrap an encoded command body in a complete SOAP 1.2 envelope.
///
/// With credentials present a fresh nonce and `Created` timestamp are
/// drawn for the security header; without them the header is empty.
pub fn envelope(body: &str, auth: Option<&Credentials>) -> String {
    let header = match auth {
        Some(auth) => {
            let nonce = Uuid::new_v4();
            let created = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
            security_header(auth, nonce.as_bytes(), &created)
        }
        None => String::new(),
    };

    let mut namespaces = String::new();
    for (prefix, uri) in config::ONVIF_NAMESPACES {
        namespaces.push_str(&format!(" {}=\"{}\"", prefix, uri));
    }

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <soap-env:Envelope xmlns:soap-env=\"{env}\"{ns}>\
         <soap-env:Header>{header}</soap-env:Header>\
         <soap-env:Body>{body}</soap-env:Body>\
         </soap-env:Envelope>",
        env = config::SOAP_ENVELOPE_NS,
        ns = namespaces,
        header = header,
        body = body,
    )
}
