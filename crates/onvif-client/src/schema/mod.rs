// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Declarative command descriptors and their field metadata.
//!
//! A descriptor models one operation's request (or response) shape as a
//! static tree of [`FieldSpec`] entries. Each field carries a raw tag-like
//! metadata string of the shape `xml:"Name[,attr][,omitempty]"`; the
//! element name the protocol expects is recovered from the quoted payload
//! at runtime by [`parse_field_meta`]. There is no reflection: every
//! descriptor is a compile-time table in [`catalog`].

pub mod catalog;

use std::fmt;

/// Errors raised while interpreting field metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaError {
    /// The raw metadata string carries no quoted payload.
    NoQuotedPayload { field: String, meta: String },
}

impl fmt::Display for MetaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaError::NoQuotedPayload { field, meta } => {
                write!(f, "field {}: no quoted payload in metadata {:?}", field, meta)
            }
        }
    }
}

impl std::error::Error for MetaError {}

/// One field of a descriptor.
///
/// `field` is the lookup key callers use as an element tag in partial
/// fragments; `meta` holds the declared wire name plus modifiers. The
/// first field of a command schema is the descriptor's own root element
/// (`XMLName` convention).
#[derive(Debug)]
pub struct FieldSpec {
    pub field: &'static str,
    pub meta: &'static str,
    pub children: Option<&'static Schema>,
}

/// An ordered, possibly nested, set of fields describing one request or
/// response shape.
#[derive(Debug)]
pub struct Schema {
    pub fields: &'static [FieldSpec],
}

/// Parsed form of one field's metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMeta {
    /// Declared output element (or attribute) name, modifiers stripped.
    pub name: String,
    pub is_attribute: bool,
    pub omit_empty: bool,
}

/// One entry of a flattened descriptor: the field name paired with its
/// parsed metadata, in depth-first order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatField {
    pub field: &'static str,
    pub meta: FieldMeta,
}

/// Extract the quoted payload of a raw metadata string.
fn quoted_payload(meta: &str) -> Option<&str> {
    let start = meta.find('"')?;
    let rest = &meta[start + 1..];
    let end = rest.find('"')?;
    Some(&rest[..end])
}

/// Parse one field's raw metadata string into a [`FieldMeta`].
///
/// The quoted payload is stripped of trailing modifiers with a fixed
/// precedence: the combined markers `,attr,omitempty` and
/// `,omitempty,attr` are checked before the single markers `,attr` and
/// `,omitempty`. This ordering is documented protocol behavior, not an
/// optimization; keep it.
///
/// # Errors
///
/// Returns [`MetaError::NoQuotedPayload`] if the string has no quoted
/// payload at all.
pub fn parse_field_meta(field: &str, meta: &str) -> Result<FieldMeta, MetaError> {
    let payload = quoted_payload(meta).ok_or_else(|| MetaError::NoQuotedPayload {
        field: field.to_string(),
        meta: meta.to_string(),
    })?;

    let attr = payload.find(",attr");
    let omit = payload.find(",omitempty");
    let attr_omit = payload.find(",attr,omitempty");
    let omit_attr = payload.find(",omitempty,attr");

    let meta = match (attr, omit, attr_omit, omit_attr) {
        (Some(a), _, None, None) => FieldMeta {
            name: payload[..a].to_string(),
            is_attribute: true,
            omit_empty: false,
        },
        (_, Some(o), None, None) => FieldMeta {
            name: payload[..o].to_string(),
            is_attribute: false,
            omit_empty: true,
        },
        (None, None, _, _) => FieldMeta {
            name: payload.to_string(),
            is_attribute: false,
            omit_empty: false,
        },
        (_, _, Some(ao), _) => FieldMeta {
            name: payload[..ao].to_string(),
            is_attribute: true,
            omit_empty: true,
        },
        (_, _, None, Some(oa)) => FieldMeta {
            name: payload[..oa].to_string(),
            is_attribute: true,
            omit_empty: true,
        },
    };
    Ok(meta)
}

/// Flatten a descriptor into its depth-first field sequence.
///
/// For each field the raw `(field, meta)` pair is recorded, then the
/// field's own nested schema (if any) is walked. A post-filter removes
/// entries whose metadata is empty and entries marked `,attr`:
/// attributes are captured directly from parsed XML nodes rather than
/// tracked by name in this sequence.
///
/// The surviving entries are index-aligned with the element nodes of a
/// well-formed caller fragment for the same descriptor.
///
/// # Errors
///
/// Returns [`MetaError`] if a surviving entry's metadata has no quoted
/// payload.
pub fn flatten(schema: &'static Schema) -> Result<Vec<FlatField>, MetaError> {
    let mut raw: Vec<(&'static str, &'static str)> = Vec::new();
    collect(schema, &mut raw);

    let mut flat = Vec::with_capacity(raw.len());
    for (field, meta) in raw {
        if meta.is_empty() || meta.contains(",attr") {
            continue;
        }
        flat.push(FlatField {
            field,
            meta: parse_field_meta(field, meta)?,
        });
    }
    Ok(flat)
}

fn collect(schema: &'static Schema, out: &mut Vec<(&'static str, &'static str)>) {
    for spec in schema.fields {
        out.push((spec.field, spec.meta));
        if let Some(children) = spec.children {
            collect(children, out);
        }
    }
}
