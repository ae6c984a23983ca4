//! Declarative field-to-source mapping.
//!
//! Every value arriving from the path, query string, headers, cookies or a
//! form body is a string. A record describes which of its fields read which
//! key from which source; conversion goes through [`FromWire`].

use std::fmt;

/// Part of the request a field is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    Path,
    Query,
    Header,
    Cookie,
    Form,
}

/// One entry of a record's field table.
pub struct Field<T> {
    source: Source,
    key: &'static str,
    assign: fn(&mut T, &str),
}

impl<T> Field<T> {
    /// Create a field entry. `assign` stores the converted wire value.
    pub fn new(source: Source, key: &'static str, assign: fn(&mut T, &str)) -> Self {
        Self { source, key, assign }
    }

    pub fn source(&self) -> Source {
        self.source
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    /// Write `raw` into the field on `target`.
    pub fn assign(&self, target: &mut T, raw: &str) {
        (self.assign)(target, raw)
    }
}

impl<T> fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("source", &self.source)
            .field("key", &self.key)
            .finish()
    }
}

/// A record whose fields can be populated by the binder.
///
/// Usually implemented with [`bind_fields!`](crate::bind_fields).
pub trait BindTarget: Sized {
    fn fields() -> Vec<Field<Self>>;
}

/// Conversion from a raw wire string.
///
/// Returns `None` when the value cannot be represented. Generated field
/// setters then leave the field untouched.
pub trait FromWire: Sized {
    fn from_wire(raw: &str) -> Option<Self>;
}

/// Convert `raw`, falling back to `T::default()` on failure.
pub fn parse_or_default<T: FromWire + Default>(raw: &str) -> T {
    T::from_wire(raw).unwrap_or_default()
}

macro_rules! from_wire_via_parse {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromWire for $ty {
                fn from_wire(raw: &str) -> Option<Self> {
                    raw.parse().ok()
                }
            }
        )*
    };
}

from_wire_via_parse!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, char,
);

impl FromWire for String {
    fn from_wire(raw: &str) -> Option<Self> {
        Some(raw.to_owned())
    }
}

impl FromWire for bool {
    fn from_wire(raw: &str) -> Option<Self> {
        match raw {
            "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
            "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
            _ => None,
        }
    }
}

impl<T: FromWire> FromWire for Option<T> {
    fn from_wire(raw: &str) -> Option<Self> {
        T::from_wire(raw).map(Some)
    }
}
