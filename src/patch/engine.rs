//! Applies ordered key edits to a decoded document.

use crate::document::{self, Document, Format};
use crate::patch::edit::{Edit, Outcome, Transform};
use crate::patch::errors::PatchError;
use std::fs;
use std::path::Path;
use tracing::{debug, trace};

/// Apply `edits` to the top-level dictionary of `doc`, in order.
///
/// Each transform sees the value left by the edits before it; an absent key
/// is passed as `None`. The first failing transform aborts the remaining
/// edits and leaves earlier ones in place.
pub fn apply_edits<X: Transform>(doc: &mut Document, edits: &[Edit<X>]) -> Result<(), PatchError> {
    if edits.is_empty() {
        return Ok(());
    }

    let kind = doc.kind();
    let entries = doc
        .as_dictionary_mut()
        .ok_or(PatchError::RootNotDictionary { kind })?;

    for edit in edits {
        let current = entries.get(&edit.key).cloned().map(document::to_native);
        trace!(key = %edit.key, present = current.is_some(), "evaluating edit");

        let outcome = edit
            .transform
            .apply(current)
            .map_err(|source| PatchError::Evaluation {
                key: edit.key.clone(),
                source,
            })?;

        match outcome {
            Outcome::Delete => {
                let removed = entries.remove(&edit.key).is_some();
                debug!(key = %edit.key, removed, "deleted key");
            }
            Outcome::Keep(value) => {
                let value = document::from_native(value)?;
                debug!(key = %edit.key, kind = value.kind(), "stored key");
                entries.insert(edit.key.clone(), value);
            }
        }
    }

    Ok(())
}

/// Read the property list at `path`, apply `edits` and return the
/// re-serialized document. The file itself is left untouched.
pub fn patch_file<X: Transform>(
    path: impl AsRef<Path>,
    edits: &[Edit<X>],
    format: Format,
) -> Result<Vec<u8>, PatchError> {
    let mut doc = read_document(path)?;
    apply_edits(&mut doc, edits)?;
    Ok(document::encode(&doc, format)?)
}

/// Read and decode the property list at `path`.
pub fn read_document(path: impl AsRef<Path>) -> Result<Document, PatchError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| PatchError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(document::decode(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{NativeNode, Node};
    use crate::patch::edit::transform_fn;
    use crate::patch::errors::EvalError;
    use std::collections::BTreeMap;
    use std::ffi::OsString;

    fn doc(entries: &[(&str, Document)]) -> Document {
        Node::Dictionary(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect::<BTreeMap<_, _>>(),
        )
    }

    fn text(s: &str) -> Document {
        Node::Text(s.to_string())
    }

    fn edits(pairs: &[&str]) -> Vec<Edit> {
        Edit::from_pairs(pairs.iter().copied()).unwrap()
    }

    #[test]
    fn empty_edit_list_is_identity() {
        let original = doc(&[("A", text("1"))]);
        let mut patched = original.clone();
        apply_edits::<crate::patch::Expression>(&mut patched, &[]).unwrap();
        assert_eq!(patched, original);
    }

    #[test]
    fn empty_edit_list_accepts_any_root() {
        let mut array = Node::Array(vec![text("x")]);
        apply_edits::<crate::patch::Expression>(&mut array, &[]).unwrap();
        assert_eq!(array, Node::Array(vec![text("x")]));
    }

    #[test]
    fn creates_and_overwrites_keys() {
        let mut document = doc(&[("A", text("old"))]);
        apply_edits(&mut document, &edits(&["A", "'new'", "B", "true"])).unwrap();
        assert_eq!(
            document,
            doc(&[("A", text("new")), ("B", Node::Boolean(true))])
        );
    }

    #[test]
    fn deleting_absent_key_is_noop() {
        let original = doc(&[("A", text("1"))]);
        let mut document = original.clone();
        apply_edits(&mut document, &edits(&["Missing", "delete"])).unwrap();
        assert_eq!(document, original);
    }

    #[test]
    fn delete_is_idempotent() {
        let mut document = doc(&[("A", text("1")), ("B", text("2"))]);
        let delete_a = edits(&["A"]);
        apply_edits(&mut document, &delete_a).unwrap();
        let once = document.clone();
        apply_edits(&mut document, &delete_a).unwrap();
        assert_eq!(document, once);
        assert_eq!(document, doc(&[("B", text("2"))]));
    }

    #[test]
    fn edits_on_same_key_compose() {
        type Step = fn(Option<NativeNode>) -> Result<Outcome, EvalError>;

        let first: Step = |current| {
            assert_eq!(current, None);
            Ok(Outcome::Keep(Node::from(1)))
        };
        let second: Step = |current| match current {
            Some(Node::Integer(n)) => {
                let n = n.as_signed().unwrap_or_default();
                Ok(Outcome::Keep(Node::from(n + 1)))
            }
            other => panic!("unexpected intermediate value: {other:?}"),
        };

        let mut document = doc(&[]);
        let steps = [Edit::new("N", first), Edit::new("N", second)];
        apply_edits(&mut document, &steps).unwrap();
        assert_eq!(document, doc(&[("N", Node::from(2))]));
    }

    #[test]
    fn transform_sees_native_text() {
        let mut document = doc(&[("Name", text("tool"))]);
        let upper = [Edit::new(
            "Name",
            transform_fn(|current| match current {
                Some(Node::Text(name)) => {
                    let mut shout = OsString::from("x-");
                    shout.push(&name);
                    Ok(Outcome::Keep(Node::Text(shout)))
                }
                _ => Ok(Outcome::Delete),
            }),
        )];
        apply_edits(&mut document, &upper).unwrap();
        assert_eq!(document, doc(&[("Name", text("x-tool"))]));
    }

    #[test]
    fn failure_keeps_earlier_edits() {
        let mut document = doc(&[("A", text("1"))]);
        let result = apply_edits(
            &mut document,
            &edits(&["B", "'set'", "C", "bool('maybe')", "D", "'never'"]),
        );

        match result {
            Err(PatchError::Evaluation { key, source }) => {
                assert_eq!(key, "C");
                assert!(matches!(source, EvalError::InvalidBoolean(_)));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(document, doc(&[("A", text("1")), ("B", text("set"))]));
    }

    #[test]
    fn non_dictionary_root_is_rejected() {
        let mut document = Node::Array(vec![]);
        let err = apply_edits(&mut document, &edits(&["A", "1"])).unwrap_err();
        assert!(matches!(err, PatchError::RootNotDictionary { kind: "array" }));
    }

    #[test]
    fn patch_file_reads_and_encodes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Info.plist");
        let mut original = doc(&[("Keep", text("me")), ("Drop", text("me"))]);
        fs::write(&path, document::encode(&original, Format::Xml).unwrap()).unwrap();

        let changes = edits(&["Drop", "delete", "Add", "list('a, b')"]);
        let bytes = patch_file(&path, &changes, Format::Xml).unwrap();

        let patched = document::decode(&bytes).unwrap();
        if let Some(entries) = original.as_dictionary_mut() {
            entries.remove("Drop");
            entries.insert("Add".to_string(), Node::Array(vec![text("a"), text("b")]));
        }
        assert_eq!(patched, original);

        let on_disk = read_document(&path).unwrap();
        assert!(matches!(&on_disk, Node::Dictionary(e) if e.contains_key("Drop")));
    }

    #[test]
    fn patch_file_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = patch_file(dir.path().join("nope.plist"), &edits(&[]), Format::Xml).unwrap_err();
        assert!(matches!(err, PatchError::Io { .. }));
    }

    #[test]
    fn patch_file_corrupt_document_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.plist");
        fs::write(&path, b"<plist><dict><key>x</key></plist>").unwrap();
        let err = patch_file(&path, &edits(&[]), Format::Xml).unwrap_err();
        assert!(matches!(
            err,
            PatchError::Codec(crate::document::CodecError::Decode { .. })
        ));
    }
}
