//! Recursive descent through sequences, maps and structs.

use facet_core::{Def, Shape};
use facet_reflect::{HasFields, Peek, PeekListLike, PeekMap, PeekStruct};
use log::trace;
use rand::Rng;

use crate::{Container, QueryError, QueryErrorKind, metadata::field_annotation};

/// Follows `Option`, smart pointers and transparent wrappers down to the
/// pointee. `None` means the value is nil.
pub(crate) fn deref<'mem, 'facet>(peek: Peek<'mem, 'facet>) -> Option<Peek<'mem, 'facet>> {
    if let Ok(option) = peek.into_option() {
        return deref(option.value()?);
    }
    if let Ok(pointer) = peek.into_pointer() {
        return deref(pointer.borrow_inner()?);
    }
    if peek.shape().inner.is_some() && unwraps_without_option(peek.shape()) {
        let inner = peek.innermost_peek();
        if inner.shape() != peek.shape() {
            return deref(inner);
        }
    }
    Some(peek)
}

/// `innermost_peek` borrows through every `inner` shape and panics on a
/// `None` it meets on the way, so options are only ever opened by `deref`.
fn unwraps_without_option(shape: &'static Shape) -> bool {
    let mut shape = shape;
    while let Some(inner) = shape.inner {
        shape = inner();
        if matches!(shape.def, Def::Option(_)) {
            return false;
        }
    }
    true
}

/// Resolves `tokens` against `peek`, one token per step.
///
/// `Ok(None)` is an absent value: a map lookup missed on the last token.
pub(crate) fn resolve<'mem, 'facet, S: AsRef<str>>(
    peek: Peek<'mem, 'facet>,
    tokens: &[S],
    metadata_keys: &[String],
) -> Result<Option<Peek<'mem, 'facet>>, QueryError> {
    let Some((token, rest)) = tokens.split_first() else {
        return Ok(Some(peek));
    };
    let token = token.as_ref();

    // Indirection is transparent to path tokens.
    let peek = deref(peek).ok_or(QueryErrorKind::NilValue)?;

    trace!("resolving {token:?} against {}", peek.shape());

    let child = if let Ok(list) = peek.into_list_like() {
        Some(select_element(list, token)?)
    } else if let Ok(map) = peek.into_map() {
        lookup_key(map, token)?
    } else if let Ok(record) = peek.into_struct() {
        Some(select_field(record, token, metadata_keys)?)
    } else {
        return Err(QueryErrorKind::UnsupportedType(peek.shape().to_string()).into());
    };

    match child {
        Some(child) if rest.is_empty() => Ok(Some(child)),
        Some(child) => resolve(child, rest, metadata_keys),
        None if rest.is_empty() => Ok(None),
        // A map miss cannot be descended into.
        None => Err(QueryErrorKind::NilValue.into()),
    }
}

fn select_element<'mem, 'facet>(
    list: PeekListLike<'mem, 'facet>,
    token: &str,
) -> Result<Peek<'mem, 'facet>, QueryError> {
    let len = list.len();
    if len == 0 {
        return Err(QueryErrorKind::EmptyContainer(Container::Sequence).into());
    }

    let index: i64 = match token {
        "last" => len as i64 - 1,
        // Not deterministic: each call draws from the thread-local generator.
        "random" | "rand" => rand::rng().random_range(0..len) as i64,
        _ => token
            .parse()
            .map_err(|_| QueryErrorKind::NonIntegerIndex(token.to_owned()))?,
    };

    trace!("selecting element {index} of {len}");
    usize::try_from(index)
        .ok()
        .and_then(|i| list.get(i))
        .ok_or_else(|| QueryErrorKind::IndexOutOfBounds { index, len }.into())
}

/// How a token is compared against map keys.
enum KeyKind {
    Textual,
    Integral,
}

impl KeyKind {
    fn of(key: Peek<'_, '_>) -> Option<Self> {
        if key.as_str().is_some() {
            Some(KeyKind::Textual)
        } else if integer_key_matches(key, 0).is_some() {
            Some(KeyKind::Integral)
        } else {
            None
        }
    }
}

/// Compares an integral key with `wanted` converted to the key's own type.
/// `None` when the key is not an integer.
fn integer_key_matches(key: Peek<'_, '_>, wanted: i64) -> Option<bool> {
    macro_rules! try_widths {
        ($($ty:ty),+) => {
            $(
                if let Ok(k) = key.get::<$ty>() {
                    return Some(*k == wanted as $ty);
                }
            )+
        };
    }
    try_widths!(i64, i32, i16, i8, isize, u64, u32, u16, u8, usize);
    None
}

fn lookup_key<'mem, 'facet>(
    map: PeekMap<'mem, 'facet>,
    token: &str,
) -> Result<Option<Peek<'mem, 'facet>>, QueryError> {
    let mut entries = map.iter();
    let Some((first_key, first_value)) = entries.next() else {
        return Err(QueryErrorKind::EmptyContainer(Container::Map).into());
    };
    let key_shape = first_key.shape();
    let invalid_key = || QueryErrorKind::InvalidKeyType {
        token: token.to_owned(),
        key_type: key_shape.to_string(),
    };

    // The first key decides how every key is compared.
    let wanted = match KeyKind::of(first_key).ok_or_else(invalid_key)? {
        KeyKind::Textual => None,
        KeyKind::Integral => Some(token.parse::<i64>().map_err(|_| invalid_key())?),
    };
    let found = std::iter::once((first_key, first_value))
        .chain(entries)
        .find(|&(key, _)| match wanted {
            None => key.as_str() == Some(token),
            Some(wanted) => integer_key_matches(key, wanted) == Some(true),
        })
        .map(|(_, value)| value);

    if found.is_none() {
        trace!("map has no key {token:?}");
    }
    Ok(found)
}

/// Upper-case tokens try field names first. Every token then tries the
/// annotations under `metadata_keys`; a field without one never matches, so
/// an empty token finds nothing rather than the first unannotated field.
fn select_field<'mem, 'facet>(
    record: PeekStruct<'mem, 'facet>,
    token: &str,
    metadata_keys: &[String],
) -> Result<Peek<'mem, 'facet>, QueryError> {
    let fields: Vec<_> = record.fields().collect();
    if fields.is_empty() {
        return Err(QueryErrorKind::EmptyContainer(Container::Record).into());
    }

    if token.chars().next().is_some_and(char::is_uppercase) {
        if let Some((field, value)) = fields
            .iter()
            .find(|(field, _)| field.name == token || exported_name(field.name) == token)
        {
            trace!("field {} matched by name", field.name);
            return Ok(*value);
        }
    }

    // Field order outranks key order.
    for (field, value) in &fields {
        for key in metadata_keys {
            if field_annotation(field, key) == Some(token) {
                trace!("field {} matched by {key} annotation", field.name);
                return Ok(*value);
            }
        }
    }

    Err(QueryErrorKind::FieldNotFound(token.to_owned()).into())
}

/// `map_items` -> `MapItems`.
fn exported_name(name: &str) -> String {
    name.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().chain(chars).collect(),
            }
        })
        .collect()
}
