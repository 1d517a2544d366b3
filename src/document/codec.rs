//! Conversion between serialized property lists and [`Document`] trees.
//!
//! Decoding accepts every format the `plist` crate understands (XML, binary
//! and OpenStep ASCII). Encoding writes XML unless binary is requested.

use crate::document::errors::CodecError;
use crate::document::{Document, Node};
use std::collections::BTreeMap;
use std::io::Cursor;

/// Serialization format for [`encode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Xml,
    Binary,
}

/// Parse a serialized property list.
pub fn decode(bytes: &[u8]) -> Result<Document, CodecError> {
    let value = plist::Value::from_reader(Cursor::new(bytes)).map_err(CodecError::decode)?;
    from_value(value)
}

/// Serialize `document` in the requested format.
///
/// Fails if the tree holds a leaf the format cannot carry or if the writer
/// produced nothing.
pub fn encode(document: &Document, format: Format) -> Result<Vec<u8>, CodecError> {
    if format == Format::Xml && contains_uid(document) {
        return Err(CodecError::Encode {
            message: "uid values cannot be represented in XML property lists".to_string(),
        });
    }

    let value = to_value(document);
    let mut out = Vec::new();
    match format {
        Format::Xml => value.to_writer_xml(&mut out),
        Format::Binary => value.to_writer_binary(&mut out),
    }
    .map_err(CodecError::encode)?;

    if out.is_empty() {
        return Err(CodecError::Encode {
            message: "serializer produced no output".to_string(),
        });
    }
    Ok(out)
}

fn from_value(value: plist::Value) -> Result<Document, CodecError> {
    Ok(match value {
        plist::Value::Dictionary(dict) => {
            let mut entries = BTreeMap::new();
            for (key, value) in dict {
                entries.insert(key, from_value(value)?);
            }
            Node::Dictionary(entries)
        }
        plist::Value::Array(items) => Node::Array(
            items
                .into_iter()
                .map(from_value)
                .collect::<Result<_, _>>()?,
        ),
        plist::Value::String(text) => Node::Text(text),
        plist::Value::Data(bytes) => Node::Data(bytes),
        plist::Value::Integer(n) => Node::Integer(n),
        plist::Value::Real(r) => Node::Real(r),
        plist::Value::Boolean(b) => Node::Boolean(b),
        plist::Value::Date(d) => Node::Date(d),
        plist::Value::Uid(u) => Node::Uid(u),
        #[allow(unreachable_patterns)]
        other => {
            return Err(CodecError::Decode {
                message: format!("unsupported property list value: {other:?}"),
            })
        }
    })
}

fn to_value(node: &Document) -> plist::Value {
    match node {
        Node::Dictionary(entries) => plist::Value::Dictionary(
            entries
                .iter()
                .map(|(key, value)| (key.clone(), to_value(value)))
                .collect(),
        ),
        Node::Array(items) => plist::Value::Array(items.iter().map(to_value).collect()),
        Node::Text(text) => plist::Value::String(text.clone()),
        Node::Data(bytes) => plist::Value::Data(bytes.clone()),
        Node::Integer(n) => plist::Value::Integer(*n),
        Node::Real(r) => plist::Value::Real(*r),
        Node::Boolean(b) => plist::Value::Boolean(*b),
        Node::Date(d) => plist::Value::Date(*d),
        Node::Uid(u) => plist::Value::Uid(*u),
    }
}

fn contains_uid(node: &Document) -> bool {
    match node {
        Node::Uid(_) => true,
        Node::Dictionary(entries) => entries.values().any(contains_uid),
        Node::Array(items) => items.iter().any(contains_uid),
        _ => false,
    }
}
