//! Property list documents and the encoding boundary around them.
//!
//! A document is decoded into a [`Node`] tree whose text leaves are `String`s
//! ([`Document`]). Transforms never see that form directly: the patch engine
//! hands them a [`NativeNode`], where every text leaf and dictionary key has
//! been converted to the platform's native string type. Both directions go
//! through the same recursive visitor, [`Node::try_map_text`].

pub mod codec;
pub mod errors;
pub mod transcode;

pub use codec::{decode, encode, Format};
pub use errors::CodecError;
pub use transcode::{from_native, to_native};

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::ffi::OsString;

/// A property list value, generic over the representation of its text.
///
/// Dictionaries are ordered by key so serialization is stable across runs.
#[derive(Debug, Clone, PartialEq)]
pub enum Node<T: Ord> {
    Dictionary(BTreeMap<T, Node<T>>),
    Array(Vec<Node<T>>),
    Text(T),
    Data(Vec<u8>),
    Integer(plist::Integer),
    Real(f64),
    Boolean(bool),
    Date(plist::Date),
    Uid(plist::Uid),
}

/// Tree as produced by the codec: UTF-8 text.
pub type Document = Node<String>;

/// Tree as seen by transforms: native-encoding text.
pub type NativeNode = Node<OsString>;

impl<T: Ord> Node<T> {
    /// Rebuild the tree with every text leaf and dictionary key passed
    /// through `leaf`. Non-text leaves are moved over untouched.
    ///
    /// Stops at the first leaf that fails.
    pub fn try_map_text<U, E, F>(self, leaf: &mut F) -> Result<Node<U>, E>
    where
        U: Ord,
        F: FnMut(T) -> Result<U, E>,
    {
        Ok(match self {
            Node::Dictionary(entries) => {
                let mut mapped = BTreeMap::new();
                for (key, value) in entries {
                    mapped.insert(leaf(key)?, value.try_map_text(leaf)?);
                }
                Node::Dictionary(mapped)
            }
            Node::Array(items) => Node::Array(
                items
                    .into_iter()
                    .map(|item| item.try_map_text(leaf))
                    .collect::<Result<_, _>>()?,
            ),
            Node::Text(text) => Node::Text(leaf(text)?),
            Node::Data(bytes) => Node::Data(bytes),
            Node::Integer(n) => Node::Integer(n),
            Node::Real(r) => Node::Real(r),
            Node::Boolean(b) => Node::Boolean(b),
            Node::Date(d) => Node::Date(d),
            Node::Uid(u) => Node::Uid(u),
        })
    }

    /// Infallible variant of [`Node::try_map_text`].
    pub fn map_text<U, F>(self, mut leaf: F) -> Node<U>
    where
        U: Ord,
        F: FnMut(T) -> U,
    {
        self.try_map_text(&mut |text| Ok::<U, Infallible>(leaf(text)))
            .unwrap_or_else(|never| match never {})
    }

    /// Short name of the node kind, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Dictionary(_) => "dictionary",
            Node::Array(_) => "array",
            Node::Text(_) => "text",
            Node::Data(_) => "data",
            Node::Integer(_) => "integer",
            Node::Real(_) => "real",
            Node::Boolean(_) => "boolean",
            Node::Date(_) => "date",
            Node::Uid(_) => "uid",
        }
    }

    pub fn as_dictionary_mut(&mut self) -> Option<&mut BTreeMap<T, Node<T>>> {
        match self {
            Node::Dictionary(entries) => Some(entries),
            _ => None,
        }
    }
}

impl<T: Ord> From<bool> for Node<T> {
    fn from(value: bool) -> Self {
        Node::Boolean(value)
    }
}

impl<T: Ord> From<i64> for Node<T> {
    fn from(value: i64) -> Self {
        Node::Integer(value.into())
    }
}
