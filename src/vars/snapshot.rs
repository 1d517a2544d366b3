use crate::vars::filter::{is_excluded, requests_dry_run, FLAGS_VARIABLE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use tracing::trace;

/// Build-relevant variables at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(BTreeMap<String, String>);

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Names whose presence or value differs between `self` and `other`.
    pub fn changed_names<'a>(&'a self, other: &'a Snapshot) -> Vec<&'a str> {
        let mut names: Vec<&str> = self
            .0
            .iter()
            .filter(|(k, v)| other.0.get(*k) != Some(*v))
            .map(|(k, _)| k.as_str())
            .chain(
                other
                    .0
                    .keys()
                    .filter(|k| !self.0.contains_key(*k))
                    .map(String::as_str),
            )
            .collect();
        names.sort_unstable();
        names
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// The variables of the current build plus the dry-run flag found among them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurrentVariables {
    pub snapshot: Snapshot,
    /// Make was run with `-n`; nothing may be written.
    pub noop: bool,
}

/// Build the current snapshot from interleaved `name, value, ...` arguments.
///
/// A trailing name without a value gets `""`. Excluded names never make it
/// into the snapshot, nor does any variable whose value equals what
/// `environment` reports for it.
pub fn compute_snapshot<I, S, E>(raw: I, environment: E) -> CurrentVariables
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
    E: Fn(&OsStr) -> Option<OsString>,
{
    let mut current = CurrentVariables::default();
    let mut raw = raw.into_iter().map(Into::into);

    while let Some(name) = raw.next() {
        let value = raw.next().unwrap_or_default();
        let name_text = name.to_string_lossy();

        if is_excluded(&name_text) {
            continue;
        }
        if name_text == FLAGS_VARIABLE {
            if requests_dry_run(&value.to_string_lossy()) {
                trace!("dry run requested through {FLAGS_VARIABLE}");
                current.noop = true;
            }
            continue;
        }
        if environment(&name).as_deref() == Some(value.as_os_str()) {
            trace!(name = %name_text, "same as environment, skipped");
            continue;
        }

        current
            .snapshot
            .insert(name_text.into_owned(), value.to_string_lossy().into_owned());
    }

    current
}

/// Environment lookup backed by the running process.
pub fn process_environment(name: &OsStr) -> Option<OsString> {
    if name.is_empty() {
        return None;
    }
    std::env::var_os(name)
}
