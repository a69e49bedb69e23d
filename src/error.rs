use std::{
    error::Error,
    fmt::{self, Display},
};

/// Error produced by a query step or a coercion accessor.
///
/// Errors are sticky per [`Node`](crate::Node): each operation overwrites the
/// previous one, nothing is accumulated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryError {
    operation: Operation,
    kind: QueryErrorKind,
}

impl QueryError {
    /// Creates an error raised by `operation`.
    pub fn new(operation: Operation, kind: QueryErrorKind) -> Self {
        QueryError { operation, kind }
    }

    /// Returns a reference to the error kind for detailed error inspection.
    pub fn kind(&self) -> &QueryErrorKind {
        &self.kind
    }

    /// The operation that raised this error.
    pub fn operation(&self) -> Operation {
        self.operation
    }
}

impl Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let operation = self.operation;
        let kind = &self.kind;
        write!(f, "{operation}(): {kind}")
    }
}
impl Error for QueryError {}

impl<K: Into<QueryErrorKind>> From<K> for QueryError {
    fn from(value: K) -> Self {
        QueryError::new(Operation::Query, value.into())
    }
}

/// The operation during which an error was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Path resolution.
    Query,
    /// [`Node::as_string`](crate::Node::as_string).
    String,
    /// [`Node::as_int`](crate::Node::as_int).
    Int,
    /// [`Node::as_float`](crate::Node::as_float).
    Float,
    /// [`Node::as_timestamp`](crate::Node::as_timestamp).
    Timestamp,
}

impl Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Query => "query",
            Operation::String => "string",
            Operation::Int => "int",
            Operation::Float => "float",
            Operation::Timestamp => "timestamp",
        };
        f.write_str(name)
    }
}

/// Kind of container a query step was applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    /// A list, array or slice.
    Sequence,
    /// A map with textual or integral keys.
    Map,
    /// A struct.
    Record,
}

impl Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Container::Sequence => f.write_str("sequence"),
            Container::Map => f.write_str("map"),
            Container::Record => f.write_str("struct"),
        }
    }
}

/// Detailed classification of query errors.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QueryErrorKind {
    /// The value is absent: a `None` root, a dereferenced `None`, or a map miss
    /// read by a coercion accessor.
    NilValue,
    /// The sequence, map or struct has no elements or fields.
    EmptyContainer(Container),
    /// A sequence was indexed with something other than an integer, `last`,
    /// `random` or `rand`.
    NonIntegerIndex(String),
    /// A sequence index fell outside `[0, len)`.
    IndexOutOfBounds {
        /// The parsed index.
        index: i64,
        /// Length of the sequence.
        len: usize,
    },
    /// The token cannot be turned into a key of the map's key type.
    InvalidKeyType {
        /// The offending token.
        token: String,
        /// Type of the map's keys.
        key_type: String,
    },
    /// No struct field matches the token by name or annotation.
    FieldNotFound(String),
    /// The value has a shape a query cannot descend into.
    UnsupportedType(String),
    /// The value cannot be represented as the requested type.
    IncompatibleType {
        /// The requested type.
        target: &'static str,
        /// Type of the value.
        actual: String,
    },
}

impl Display for QueryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryErrorKind::NilValue => write!(f, "value is nil"),
            QueryErrorKind::EmptyContainer(container) => {
                write!(f, "value is nil (empty {container})")
            }
            QueryErrorKind::NonIntegerIndex(token) => write!(
                f,
                "index '{token}' must be an integer (or last, random, rand) while querying a sequence"
            ),
            QueryErrorKind::IndexOutOfBounds { index, len } => write!(
                f,
                "index {index} is out of bounds while querying a sequence of length {len}"
            ),
            QueryErrorKind::InvalidKeyType { token, key_type } => {
                write!(f, "invalid key '{token}' for map with {key_type} keys")
            }
            QueryErrorKind::FieldNotFound(token) => {
                write!(f, "value is nil (struct field '{token}' not found)")
            }
            QueryErrorKind::UnsupportedType(shape) => {
                write!(f, "unsupported type for query: {shape}")
            }
            QueryErrorKind::IncompatibleType { target, actual } => {
                write!(f, "value of type {actual} cannot be casted to {target}")
            }
        }
    }
}
