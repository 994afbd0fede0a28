// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test/bench code readability over pedantic
#![allow(clippy::missing_panics_doc)] // Tests/examples panic on failure
#![allow(clippy::items_after_statements)] // Test helpers

//! End-to-end command dispatch over a capturing transport.
//!
//! Drives `Client::call` through registry lookup, body encoding,
//! endpoint resolution, and reply decoding without touching the
//! network.

use std::time::Duration;

use parking_lot::Mutex;

use onvif_client::transport::{SoapTransport, TransportError};
use onvif_client::{Client, Credentials, Device, Error, Reply};

const DEVICE_XADDR: &str = "http://192.168.1.10/onvif/device_service";
const MEDIA_XADDR: &str = "http://192.168.1.10/onvif/media_service";

/// Records every POST and plays back a queue of canned reply bodies.
struct MockTransport {
    requests: Mutex<Vec<(String, String)>>,
    replies: Mutex<Vec<String>>,
}

impl MockTransport {
    fn new(replies: Vec<&str>) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        MockTransport {
            requests: Mutex::new(Vec::new()),
            replies: Mutex::new(replies.into_iter().map(str::to_string).collect()),
        }
    }

    fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().clone()
    }
}

impl SoapTransport for MockTransport {
    fn send(
        &self,
        endpoint: &str,
        envelope: &str,
        timeout: Duration,
    ) -> Result<String, TransportError> {
        assert_eq!(timeout, Duration::from_secs(3), "per-call timeout is fixed");
        self.requests
            .lock()
            .push((endpoint.to_string(), envelope.to_string()));
        let mut replies = self.replies.lock();
        if replies.is_empty() {
            Ok(String::new())
        } else {
            Ok(replies.remove(0))
        }
    }
}

fn capabilities_reply() -> String {
    format!(
        r#"<e:Envelope xmlns:e="http://www.w3.org/2003/05/soap-envelope"
            xmlns:tds="http://www.onvif.org/ver10/device/wsdl"
            xmlns:tt="http://www.onvif.org/ver10/schema">
            <e:Body><tds:GetCapabilitiesResponse><tds:Capabilities>
            <tt:Media><tt:XAddr>{}</tt:XAddr></tt:Media>
            </tds:Capabilities></tds:GetCapabilitiesResponse></e:Body></e:Envelope>"#,
        MEDIA_XADDR
    )
}

fn client(replies: Vec<&str>) -> Client<MockTransport> {
    let device = Device::new("192.168.1.10").expect("valid address");
    Client::with_transport(device, MockTransport::new(replies), None)
}

#[test]
fn test_registry_miss_sends_nothing() {
    let client = client(vec![]);
    assert!(matches!(
        client.call("doorbell", "Ring", ""),
        Err(Error::UnknownService(_))
    ));
    assert!(matches!(
        client.call("device", "NoSuchMethod", ""),
        Err(Error::UnknownMethod { .. })
    ));
    assert!(client.transport().requests().is_empty());
}

#[test]
fn test_bare_command_wire_body() {
    let client = client(vec![]);
    client
        .call("device", "GetSystemDateAndTime", "")
        .expect("dispatches");

    let requests = client.transport().requests();
    assert_eq!(requests.len(), 1);
    let (endpoint, envelope) = &requests[0];
    assert_eq!(endpoint, DEVICE_XADDR);
    assert!(envelope.contains(
        "<soap-env:Body><GetSystemDateAndTime></GetSystemDateAndTime></soap-env:Body>"
    ));
}

#[test]
fn test_anonymous_envelope_has_no_security_header() {
    let client = client(vec![]);
    client.call("device", "GetScopes", "").expect("dispatches");
    let requests = client.transport().requests();
    assert!(!requests[0].1.contains("wsse:Security"));
}

#[test]
fn test_credentials_produce_a_username_token() {
    let device = Device::new("192.168.1.10").expect("valid address");
    let auth = Credentials::new("admin", "secret");
    let client = Client::with_transport(device, MockTransport::new(vec![]), Some(auth));

    client.call("device", "GetScopes", "").expect("dispatches");
    let envelope = &client.transport().requests()[0].1;
    assert!(envelope.contains("<wsse:Username>admin</wsse:Username>"));
    assert!(envelope.contains("<wsse:Nonce"));
    assert!(envelope.contains("<wsu:Created>"));
    assert!(!envelope.contains("secret"), "password travels only as digest");
}

#[test]
fn test_unknown_endpoint_triggers_capability_refresh() {
    let client = client(vec![&capabilities_reply(), ""]);
    client
        .call("media", "GetProfiles", "")
        .expect("dispatches after refresh");

    let requests = client.transport().requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].0, DEVICE_XADDR);
    assert!(requests[0].1.contains("<GetCapabilities></GetCapabilities>"));
    assert_eq!(requests[1].0, MEDIA_XADDR);
    assert!(requests[1].1.contains("<trt:GetProfiles></trt:GetProfiles>"));
}

#[test]
fn test_known_endpoint_skips_the_refresh() {
    let client = client(vec![]);
    client.device().set_endpoint("media", MEDIA_XADDR);
    client.call("media", "GetProfiles", "").expect("dispatches");

    let requests = client.transport().requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].0, MEDIA_XADDR);
}

#[test]
fn test_unresolvable_service_is_an_endpoint_error() {
    // The capability reply advertises no PTZ service.
    let client = client(vec![&capabilities_reply()]);
    assert!(matches!(
        client.call("ptz", "GetConfigurations", ""),
        Err(Error::EndpointNotFound(_))
    ));
}

#[test]
fn test_wrapper_fragment_travels_verbatim() {
    let client = client(vec![]);
    client.device().set_endpoint("media", MEDIA_XADDR);
    client
        .call(
            "media",
            "GetStreamUri",
            "<onvif><trt:ProfileToken>000</trt:ProfileToken></onvif>",
        )
        .expect("dispatches");

    let envelope = &client.transport().requests()[0].1;
    assert!(envelope.contains(
        "<trt:GetStreamUri><trt:ProfileToken>000</trt:ProfileToken></trt:GetStreamUri>"
    ));
}

#[test]
fn test_declared_fragment_is_renamed_by_the_codec() {
    let client = client(vec![]);
    client.device().set_endpoint("media", MEDIA_XADDR);
    client
        .call(
            "media",
            "GetSnapshotUri",
            "<GetSnapshotUri><ProfileToken>000</ProfileToken></GetSnapshotUri>",
        )
        .expect("dispatches");

    let envelope = &client.transport().requests()[0].1;
    assert!(envelope
        .contains("<trt:GetSnapshotUri><trt:ProfileToken>000</trt:ProfileToken></trt:GetSnapshotUri>"));
}

#[test]
fn test_decoded_reply_exposes_the_payload() {
    let reply = r#"<e:Envelope xmlns:e="http://www.w3.org/2003/05/soap-envelope"
        xmlns:tds="http://www.onvif.org/ver10/device/wsdl"
        xmlns:tt="http://www.onvif.org/ver10/schema">
        <e:Body><tds:GetSystemDateAndTimeResponse><tds:SystemDateAndTime>
        <tt:UTCDateTime><tt:Time><tt:Hour>13</tt:Hour></tt:Time></tt:UTCDateTime>
        </tds:SystemDateAndTime></tds:GetSystemDateAndTimeResponse></e:Body></e:Envelope>"#;

    let client = client(vec![reply]);
    match client
        .call("device", "GetSystemDateAndTime", "")
        .expect("dispatches")
    {
        Reply::Decoded(node) => {
            assert_eq!(node.name, "GetSystemDateAndTimeResponse");
            assert_eq!(node.texts("Hour"), vec!["13"]);
        }
        Reply::Raw(body) => panic!("expected decoded payload, got raw: {}", body),
    }
}

#[test]
fn test_undecodable_reply_degrades_to_raw() {
    let client = client(vec!["plain text, not soap"]);
    match client
        .call("device", "GetSystemDateAndTime", "")
        .expect("dispatches")
    {
        Reply::Raw(body) => assert_eq!(body, "plain text, not soap"),
        Reply::Decoded(_) => panic!("nothing to decode here"),
    }
}

#[test]
fn test_fire_and_forget_operation_returns_raw() {
    let client = client(vec![]);
    client.device().set_endpoint("ptz", "http://192.168.1.10/onvif/ptz_service");
    let fragment = "<ContinuousMove>\
        <ProfileToken>000</ProfileToken>\
        <Velocity><PanTilt x=\"0.5\" y=\"0\"></PanTilt></Velocity>\
        </ContinuousMove>";
    match client.call("ptz", "ContinuousMove", fragment).expect("dispatches") {
        Reply::Raw(_) => {}
        Reply::Decoded(_) => panic!("ContinuousMove declares no response payload"),
    }
    let envelope = &client.transport().requests()[0].1;
    assert!(envelope.contains("<tt:PanTilt x=\"0.5\" y=\"0\"></tt:PanTilt>"));
}
