use std::{fmt, sync::Arc};

use chrono::{DateTime, FixedOffset};
use facet_reflect::Peek;
use log::trace;

use crate::{QueryError, QueryErrorKind, coerce, resolve::resolve};

/// One step of a query: a borrowed value, the outcome of the last operation
/// performed on it, and the metadata keys used to match struct fields.
///
/// The `as_*` accessors never fail. They return a zero value and record the
/// failure in [`Node::last_error`], overwriting whatever was there. The
/// `try_*` accessors return a `Result` instead and leave the node untouched.
#[derive(Clone)]
pub struct Node<'mem, 'facet> {
    value: Option<Peek<'mem, 'facet>>,
    last_error: Option<QueryError>,
    metadata_keys: Arc<[String]>,
}

impl<'mem, 'facet> Node<'mem, 'facet> {
    pub(crate) fn new(value: Option<Peek<'mem, 'facet>>, metadata_keys: Arc<[String]>) -> Self {
        Node {
            value,
            last_error: None,
            metadata_keys,
        }
    }

    fn failed(error: QueryError, metadata_keys: Arc<[String]>) -> Self {
        Node {
            value: None,
            last_error: Some(error),
            metadata_keys,
        }
    }

    /// Resolves `tokens` starting from this node.
    ///
    /// With no tokens, the result is a copy of this node. Otherwise the
    /// result is a fresh node holding either the value found or the first
    /// error met on the way; resolution stops at that error.
    pub fn query<I, S>(&self, tokens: I) -> Node<'mem, 'facet>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tokens: Vec<S> = tokens.into_iter().collect();
        if tokens.is_empty() {
            return self.clone();
        }
        let keys = Arc::clone(&self.metadata_keys);
        let Some(peek) = self.value else {
            return Node::failed(QueryErrorKind::NilValue.into(), keys);
        };
        match resolve(peek, &tokens, &keys) {
            Ok(value) => Node::new(value, keys),
            Err(error) => {
                trace!("query stopped: {error}");
                Node::failed(error, keys)
            }
        }
    }

    /// The reflected value, or `None` when absent.
    pub fn raw_value(&self) -> Option<Peek<'mem, 'facet>> {
        self.value
    }

    /// Outcome of the most recent operation on this node.
    pub fn last_error(&self) -> Option<&QueryError> {
        self.last_error.as_ref()
    }

    /// Metadata keys consulted when a token is matched against struct fields.
    pub fn metadata_keys(&self) -> &[String] {
        &self.metadata_keys
    }

    /// Replaces the metadata keys used by this node and the nodes it produces.
    pub fn set_metadata_keys<I, S>(&mut self, keys: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metadata_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// The value as a string: verbatim for strings, its `Display` rendering
    /// otherwise.
    pub fn try_string(&self) -> Result<String, QueryError> {
        coerce::to_string(self.value)
    }

    /// The value as an integer. Floats are truncated toward zero.
    ///
    /// Non-numeric values yield `Ok(0)`, not an error.
    pub fn try_int(&self) -> Result<i64, QueryError> {
        coerce::to_int(self.value)
    }

    /// The value as a float. Non-numeric values yield `Ok(0.0)`, not an error.
    pub fn try_float(&self) -> Result<f64, QueryError> {
        coerce::to_float(self.value)
    }

    /// The value as a timestamp.
    ///
    /// Accepts chrono timestamps, RFC 3339 strings (with or without fractional
    /// seconds), `YYYY-MM-DD HH:MM:SS` strings read as UTC, and Unix epoch
    /// numbers: seconds, or milliseconds when the magnitude exceeds
    /// 9,999,999,999.
    pub fn try_timestamp(&self) -> Result<DateTime<FixedOffset>, QueryError> {
        coerce::to_timestamp(self.value)
    }

    /// See [`Node::try_string`]. Returns `""` on error.
    pub fn as_string(&mut self) -> String {
        let result = self.try_string();
        self.record(result)
    }

    /// See [`Node::try_int`]. Returns `0` on error.
    pub fn as_int(&mut self) -> i64 {
        let result = self.try_int();
        self.record(result)
    }

    /// See [`Node::try_float`]. Returns `0.0` on error.
    pub fn as_float(&mut self) -> f64 {
        let result = self.try_float();
        self.record(result)
    }

    /// Alias of [`Node::as_float`].
    pub fn as_f64(&mut self) -> f64 {
        self.as_float()
    }

    /// See [`Node::try_timestamp`]. Returns the Unix epoch on error.
    pub fn as_timestamp(&mut self) -> DateTime<FixedOffset> {
        let result = self.try_timestamp();
        self.record(result)
    }

    fn record<T: Default>(&mut self, result: Result<T, QueryError>) -> T {
        match result {
            Ok(value) => {
                self.last_error = None;
                value
            }
            Err(error) => {
                self.last_error = Some(error);
                T::default()
            }
        }
    }
}

impl fmt::Debug for Node<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("shape", &self.value.map(|peek| peek.shape().to_string()))
            .field("last_error", &self.last_error)
            .field("metadata_keys", &self.metadata_keys)
            .finish()
    }
}
