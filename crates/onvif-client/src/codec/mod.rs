// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Request-body codec: caller fragment in, namespaced command body out.
//!
//! A caller supplies a partial XML fragment whose element tags are the
//! *field names* of the target operation's descriptor. The codec parses
//! the fragment into a flat node list plus a shape-token stream, then
//! re-emits it with every element renamed to the descriptor's declared
//! wire name. Attributes and text pass through verbatim.
//!
//! Shape tokens are pre-order: `Push` opens a branch element, `PushPop`
//! is a complete leaf, `Pop` closes the innermost open branch. The
//! assembler walks tokens and nodes with two cursors; a `Pop` advances
//! only the token cursor. The walk ends as soon as either cursor is
//! exhausted, and still-open elements are closed in reverse order.
//!
//! Index 0 is special: the fragment's outermost element is renamed to
//! the descriptor's own root name whatever its tag says. That is what
//! lets the neutral `<onvif></onvif>` placeholder stand in for an
//! argument-free command.

use std::fmt;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::schema::{self, FlatField, MetaError, Schema};

// =======================================================================
// Errors
// =======================================================================

#[derive(Debug)]
pub enum CodecError {
    /// The caller fragment is not well-formed XML.
    Malformed(String),
    /// The fragment closed more elements than it opened, or left some open.
    Unbalanced,
    /// An element tag has no descriptor field at its position.
    UndeclaredField { index: usize, tag: String },
    /// A descriptor field carries unusable metadata.
    Meta(MetaError),
    /// Serializing the renamed body failed.
    Write(String),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::Malformed(e) => write!(f, "malformed fragment: {}", e),
            CodecError::Unbalanced => write!(f, "unbalanced fragment"),
            CodecError::UndeclaredField { index, tag } => {
                write!(f, "element <{}> at position {} is not declared", tag, index)
            }
            CodecError::Meta(e) => write!(f, "descriptor metadata: {}", e),
            CodecError::Write(e) => write!(f, "body serialization: {}", e),
        }
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CodecError::Meta(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MetaError> for CodecError {
    fn from(e: MetaError) -> Self {
        CodecError::Meta(e)
    }
}

// =======================================================================
// Fragment model
// =======================================================================

/// One element of a parsed caller fragment. `tag` is the local name
/// (any namespace prefix stripped), `text` the element's own character
/// data with whitespace-only runs dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlNode {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub text: String,
}

/// Pre-order shape token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Push,
    PushPop,
    Pop,
}

/// A caller fragment, decomposed for the assembler: element nodes in
/// document order plus the token stream describing their nesting.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Fragment {
    pub nodes: Vec<XmlNode>,
    pub tokens: Vec<Token>,
}

struct Element {
    tag: String,
    attrs: Vec<(String, String)>,
    text: String,
    children: Vec<Element>,
}

fn read_element(start: &BytesStart<'_>) -> Result<Element, CodecError> {
    let tag = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
    let mut attrs = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| CodecError::Malformed(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| CodecError::Malformed(e.to_string()))?
            .into_owned();
        attrs.push((key, value));
    }
    Ok(Element { tag, attrs, text: String::new(), children: Vec::new() })
}

/// Parse a caller fragment into nodes and shape tokens.
pub fn parse_fragment(fragment: &str) -> Result<Fragment, CodecError> {
    let mut reader = Reader::from_str(fragment);
    let mut stack: Vec<Element> = Vec::new();
    let mut roots: Vec<Element> = Vec::new();

    loop {
        match reader.read_event().map_err(|e| CodecError::Malformed(e.to_string()))? {
            Event::Start(start) => stack.push(read_element(&start)?),
            Event::Empty(start) => {
                let element = read_element(&start)?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => roots.push(element),
                }
            }
            Event::End(_) => {
                let element = stack.pop().ok_or(CodecError::Unbalanced)?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => roots.push(element),
                }
            }
            Event::Text(text) => {
                let text =
                    text.unescape().map_err(|e| CodecError::Malformed(e.to_string()))?;
                if let Some(top) = stack.last_mut() {
                    if !text.trim().is_empty() {
                        top.text.push_str(&text);
                    }
                }
            }
            Event::CData(data) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    if !stack.is_empty() {
        return Err(CodecError::Unbalanced);
    }

    let mut frag = Fragment::default();
    for root in &roots {
        decompose(root, &mut frag);
    }
    Ok(frag)
}

fn decompose(element: &Element, frag: &mut Fragment) {
    frag.nodes.push(XmlNode {
        tag: element.tag.clone(),
        attrs: element.attrs.clone(),
        text: element.text.clone(),
    });
    if element.children.is_empty() {
        frag.tokens.push(Token::PushPop);
        return;
    }
    frag.tokens.push(Token::Push);
    for child in &element.children {
        decompose(child, frag);
    }
    frag.tokens.push(Token::Pop);
}

// =======================================================================
// Assembler
// =======================================================================

fn resolve<'a>(
    flat: &'a [FlatField],
    node: &XmlNode,
    index: usize,
) -> Result<&'a str, CodecError> {
    let entry = flat.get(index).ok_or_else(|| CodecError::UndeclaredField {
        index,
        tag: node.tag.clone(),
    })?;
    // Position 0 always takes the descriptor root's declared name.
    if index == 0 {
        return Ok(entry.meta.name.as_str());
    }
    if entry.field == node.tag {
        Ok(entry.meta.name.as_str())
    } else {
        Err(CodecError::UndeclaredField { index, tag: node.tag.clone() })
    }
}

fn write_open(
    writer: &mut Writer<Vec<u8>>,
    name: &str,
    node: &XmlNode,
) -> Result<(), CodecError> {
    let mut start = BytesStart::new(name);
    for (key, value) in &node.attrs {
        start.push_attribute((key.as_str(), value.as_str()));
    }
    writer
        .write_event(Event::Start(start))
        .map_err(|e| CodecError::Write(e.to_string()))?;
    if !node.text.is_empty() {
        writer
            .write_event(Event::Text(BytesText::new(&node.text)))
            .map_err(|e| CodecError::Write(e.to_string()))?;
    }
    Ok(())
}

fn write_close(writer: &mut Writer<Vec<u8>>, name: &str) -> Result<(), CodecError> {
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(|e| CodecError::Write(e.to_string()))
}

/// Re-emit a decomposed fragment with descriptor wire names.
///
/// Elements are always written as a start/end pair, never self-closing.
/// Some devices reject `<Method/>` where `<Method></Method>` passes.
pub fn assemble(flat: &[FlatField], frag: &Fragment) -> Result<String, CodecError> {
    let mut writer = Writer::new(Vec::new());
    let mut open: Vec<String> = Vec::new();
    let mut node_idx = 0;
    let mut tok_idx = 0;

    while node_idx < frag.nodes.len() && tok_idx < frag.tokens.len() {
        match frag.tokens[tok_idx] {
            Token::Push => {
                let node = &frag.nodes[node_idx];
                let name = resolve(flat, node, node_idx)?.to_string();
                write_open(&mut writer, &name, node)?;
                open.push(name);
                node_idx += 1;
            }
            Token::PushPop => {
                let node = &frag.nodes[node_idx];
                let name = resolve(flat, node, node_idx)?;
                write_open(&mut writer, name, node)?;
                write_close(&mut writer, name)?;
                node_idx += 1;
            }
            Token::Pop => {
                if let Some(name) = open.pop() {
                    write_close(&mut writer, &name)?;
                }
            }
        }
        tok_idx += 1;
    }

    while let Some(name) = open.pop() {
        write_close(&mut writer, &name)?;
    }

    String::from_utf8(writer.into_inner()).map_err(|e| CodecError::Write(e.to_string()))
}

/// Encode a caller fragment against an operation descriptor.
pub fn encode_request(schema: &'static Schema, fragment: &str) -> Result<String, CodecError> {
    let flat = schema::flatten(schema)?;
    let frag = parse_fragment(fragment)?;
    assemble(&flat, &frag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::catalog::{lookup, Service};

    fn descriptor(service: Service, method: &str) -> &'static Schema {
        lookup(service, method).expect("registered").request
    }

    #[test]
    fn test_parse_leaf_only_fragment() {
        let frag = parse_fragment("<GetScopes></GetScopes>").expect("parses");
        assert_eq!(frag.tokens, vec![Token::PushPop]);
        assert_eq!(frag.nodes[0].tag, "GetScopes");
    }

    #[test]
    fn test_parse_branch_emits_push_pushpop_pop() {
        let frag = parse_fragment("<A><B>1</B></A>").expect("parses");
        assert_eq!(frag.tokens, vec![Token::Push, Token::PushPop, Token::Pop]);
        assert_eq!(frag.nodes[1].text, "1");
    }

    #[test]
    fn test_parse_self_closing_is_a_leaf() {
        let frag = parse_fragment("<A><B/></A>").expect("parses");
        assert_eq!(frag.tokens, vec![Token::Push, Token::PushPop, Token::Pop]);
    }

    #[test]
    fn test_parse_strips_namespace_prefixes() {
        let frag = parse_fragment("<A><trt:B>x</trt:B></A>").expect("parses");
        assert_eq!(frag.nodes[1].tag, "B");
    }

    #[test]
    fn test_parse_unclosed_fragment_is_error() {
        assert!(parse_fragment("<GetScopes>").is_err());
    }

    #[test]
    fn test_placeholder_takes_descriptor_root_name() {
        let schema = descriptor(Service::Device, "GetSystemDateAndTime");
        let body = encode_request(schema, "<onvif></onvif>").expect("encodes");
        assert_eq!(body, "<GetSystemDateAndTime></GetSystemDateAndTime>");
    }

    #[test]
    fn test_leaf_is_never_self_closing() {
        let schema = descriptor(Service::Device, "GetDeviceInformation");
        let body = encode_request(schema, "<onvif></onvif>").expect("encodes");
        assert!(!body.contains("/>"));
    }

    #[test]
    fn test_nested_fragment_is_renamed_throughout() {
        let schema = descriptor(Service::Media, "GetStreamUri");
        let fragment = "<GetStreamUri>\
            <StreamSetup>\
            <Stream>RTP-Unicast</Stream>\
            <Transport><Protocol>RTSP</Protocol></Transport>\
            </StreamSetup>\
            <ProfileToken>000</ProfileToken>\
            </GetStreamUri>";
        let body = encode_request(schema, fragment).expect("encodes");
        assert_eq!(
            body,
            "<trt:GetStreamUri>\
             <trt:StreamSetup>\
             <tt:Stream>RTP-Unicast</tt:Stream>\
             <tt:Transport><tt:Protocol>RTSP</tt:Protocol></tt:Transport>\
             </trt:StreamSetup>\
             <trt:ProfileToken>000</trt:ProfileToken>\
             </trt:GetStreamUri>"
        );
    }

    #[test]
    fn test_attributes_pass_through_verbatim() {
        let schema = descriptor(Service::Ptz, "ContinuousMove");
        let fragment = "<ContinuousMove>\
            <ProfileToken>000</ProfileToken>\
            <Velocity>\
            <PanTilt x=\"0.5\" y=\"0\"></PanTilt>\
            <Zoom x=\"0\"></Zoom>\
            </Velocity>\
            </ContinuousMove>";
        let body = encode_request(schema, fragment).expect("encodes");
        assert_eq!(
            body,
            "<tptz:ContinuousMove>\
             <tptz:ProfileToken>000</tptz:ProfileToken>\
             <tptz:Velocity>\
             <tt:PanTilt x=\"0.5\" y=\"0\"></tt:PanTilt>\
             <tt:Zoom x=\"0\"></tt:Zoom>\
             </tptz:Velocity>\
             </tptz:ContinuousMove>"
        );
    }

    #[test]
    fn test_assemble_stops_cleanly_when_tokens_run_out() {
        // More nodes than tokens: the walk must end at the shorter
        // cursor, close the open root, and never touch the stray node.
        let schema = descriptor(Service::Media, "GetSnapshotUri");
        let flat = crate::schema::flatten(schema).expect("flattens");
        let frag = Fragment {
            nodes: vec![
                XmlNode {
                    tag: "GetSnapshotUri".to_string(),
                    attrs: vec![],
                    text: String::new(),
                },
                XmlNode {
                    tag: "ProfileToken".to_string(),
                    attrs: vec![],
                    text: "000".to_string(),
                },
                XmlNode { tag: "Stray".to_string(), attrs: vec![], text: String::new() },
            ],
            tokens: vec![Token::Push, Token::PushPop, Token::Pop],
        };
        let body = assemble(&flat, &frag).expect("terminates cleanly");
        assert_eq!(
            body,
            "<trt:GetSnapshotUri>\
             <trt:ProfileToken>000</trt:ProfileToken>\
             </trt:GetSnapshotUri>"
        );
    }

    #[test]
    fn test_undeclared_element_is_rejected() {
        let schema = descriptor(Service::Device, "GetSystemDateAndTime");
        let err = encode_request(
            schema,
            "<GetSystemDateAndTime><Bogus>1</Bogus></GetSystemDateAndTime>",
        )
        .expect_err("must fail");
        assert!(matches!(err, CodecError::UndeclaredField { index: 1, .. }));
    }

    #[test]
    fn test_mismatched_tag_is_rejected() {
        let schema = descriptor(Service::Media, "GetSnapshotUri");
        let err = encode_request(
            schema,
            "<GetSnapshotUri><WrongName>000</WrongName></GetSnapshotUri>",
        )
        .expect_err("must fail");
        assert!(matches!(err, CodecError::UndeclaredField { .. }));
    }

    #[test]
    fn test_omitted_optional_fields_are_simply_absent() {
        let schema = descriptor(Service::Device, "GetCapabilities");
        let body = encode_request(schema, "<onvif></onvif>").expect("encodes");
        assert_eq!(body, "<GetCapabilities></GetCapabilities>");
    }

    #[test]
    fn test_text_is_escaped_on_output() {
        let schema = descriptor(Service::Media, "GetSnapshotUri");
        let body = encode_request(
            schema,
            "<GetSnapshotUri><ProfileToken>a&amp;b</ProfileToken></GetSnapshotUri>",
        )
        .expect("encodes");
        assert!(body.contains("<trt:ProfileToken>a&amp;b</trt:ProfileToken>"));
    }
}
