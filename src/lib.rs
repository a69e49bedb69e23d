#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

use std::sync::Arc;

use facet_core::Facet;

mod coerce;
mod error;
mod metadata;
mod node;
mod resolve;

pub use error::{Container, Operation, QueryError, QueryErrorKind};
pub use metadata::{
    BUILTIN_METADATA_KEYS, default_metadata_keys, reset_default_metadata_keys,
    set_default_metadata_keys,
};
pub use node::Node;

// Re-export the reflection handle returned by `Node::raw_value`.
pub use facet_reflect::Peek;

/// Resolves `tokens` against `value` using the default metadata keys.
///
/// The default keys are copied when the query starts; changing them later
/// does not affect the returned node.
///
/// # Example
/// ```
/// # use facet::Facet;
/// # use facet_query::query;
/// #[derive(Facet)]
/// struct Player {
///     #[facet(json = "name")]
///     name: String,
///     scores: Vec<u32>,
/// }
///
/// let player = Player { name: "ada".into(), scores: vec![3, 9, 4] };
///
/// assert_eq!(query(&player, ["name"]).as_string(), "ada");
/// assert_eq!(query(&player, ["Scores", "last"]).as_int(), 4);
/// ```
pub fn query<'mem, 'facet, T, I, S>(value: &'mem T, tokens: I) -> Node<'mem, 'facet>
where
    T: Facet<'facet>,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    root(value, metadata::snapshot_default_metadata_keys()).query(tokens)
}

/// Like [`query`], with an explicit list of metadata keys.
pub fn query_with_metadata_keys<'mem, 'facet, T, K, I, S>(
    value: &'mem T,
    metadata_keys: K,
    tokens: I,
) -> Node<'mem, 'facet>
where
    T: Facet<'facet>,
    K: IntoIterator,
    K::Item: Into<String>,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let keys: Arc<[String]> = metadata_keys.into_iter().map(Into::into).collect();
    root(value, keys).query(tokens)
}

fn root<'mem, 'facet, T: Facet<'facet>>(
    value: &'mem T,
    metadata_keys: Arc<[String]>,
) -> Node<'mem, 'facet> {
    Node::new(Some(Peek::new(value)), metadata_keys)
}
