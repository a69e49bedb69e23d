//! Metadata keys: the annotation names consulted when a token is matched
//! against struct fields.
//!
//! A field is annotated with an arbitrary facet attribute of the form
//! `#[facet(<key> = "<value>")]`. With the default key list, a field marked
//! `#[facet(json = "age")]` is reachable through the token `age`.

use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use facet_core::{Field, FieldAttribute};

/// The metadata keys every process starts with.
pub const BUILTIN_METADATA_KEYS: [&str; 5] = ["json", "xml", "param", "query", "header"];

static DEFAULT_METADATA_KEYS: LazyLock<RwLock<Vec<String>>> =
    LazyLock::new(|| RwLock::new(builtin_metadata_keys()));

fn builtin_metadata_keys() -> Vec<String> {
    BUILTIN_METADATA_KEYS.iter().map(|k| k.to_string()).collect()
}

/// Returns a copy of the process-wide default metadata keys.
pub fn default_metadata_keys() -> Vec<String> {
    DEFAULT_METADATA_KEYS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Replaces the process-wide default metadata keys.
///
/// Queries that already started keep the list they were created with.
pub fn set_default_metadata_keys<I, S>(keys: I)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
    log::debug!("default metadata keys set to {keys:?}");
    *DEFAULT_METADATA_KEYS
        .write()
        .unwrap_or_else(PoisonError::into_inner) = keys;
}

/// Restores [`BUILTIN_METADATA_KEYS`] as the process-wide default.
pub fn reset_default_metadata_keys() {
    set_default_metadata_keys(BUILTIN_METADATA_KEYS);
}

/// Snapshot taken once per root node.
pub(crate) fn snapshot_default_metadata_keys() -> Arc<[String]> {
    DEFAULT_METADATA_KEYS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .as_slice()
        .into()
}

/// Value of the `key` annotation on `field`, if any.
pub(crate) fn field_annotation<'a>(field: &'a Field, key: &str) -> Option<&'a str> {
    field.attributes.iter().find_map(|attr| match attr {
        FieldAttribute::Arbitrary(raw) => annotation_value(raw, key),
        _ => None,
    })
}

/// Parses `key = "value"` and returns `value` when the key matches.
fn annotation_value<'a>(raw: &'a str, key: &str) -> Option<&'a str> {
    let (name, value) = raw.split_once('=')?;
    if name.trim() != key {
        return None;
    }
    let value = value.trim();
    Some(
        value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap_or(value),
    )
}
