//! Deep text transcoding across the codec boundary.

use crate::document::errors::CodecError;
use crate::document::{Document, NativeNode};
use std::ffi::OsString;

/// Convert every text leaf and key into the native string representation.
pub fn to_native(document: Document) -> NativeNode {
    document.map_text(OsString::from)
}

/// Convert a native tree back into codec text.
///
/// Fails on the first string that is not valid UTF-8.
pub fn from_native(node: NativeNode) -> Result<Document, CodecError> {
    node.try_map_text(&mut |text: OsString| {
        text.into_string().map_err(|raw| CodecError::NonUnicodeText {
            lossy: raw.to_string_lossy().into_owned(),
        })
    })
}
