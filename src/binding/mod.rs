//! Input binding subsystem.
//!
//! # Data Flow
//! ```text
//! wire request (path params, query, headers, cookies, body)
//!     → binder.rs (request-scoped Binder, body buffered once)
//!     → directive chain: from_path / from_query / from_json / ...
//!     → fields.rs (declarative field → source table, FromWire parsing)
//!     → mutated input record + first BindError (surfaced later)
//! ```
//!
//! # Design Decisions
//! - Binding is structural only; validation belongs to the handler
//! - Unparsable wire values leave the field as it was
//! - Body errors are captured, never raised while binding, and only
//!   surface through the body directives
//! - Later directives overwrite fields set by earlier ones

pub mod binder;
pub mod fields;

pub use binder::{BindError, Binder, RawBody, DEFAULT_BODY_LIMIT};
pub use fields::{parse_or_default, BindTarget, Field, FromWire, Source};

/// Implements [`BindTarget`] for a record from a `field: Source("key")` table.
///
/// ```ignore
/// bind_fields!(ProductInput {
///     id: Path("id"),
///     page: Query("page"),
///     session: Cookie("session"),
/// });
/// ```
///
/// A field may appear more than once with different sources.
#[macro_export]
macro_rules! bind_fields {
    ($target:ty { $($field:ident : $source:ident ( $key:literal )),* $(,)? }) => {
        impl $crate::binding::BindTarget for $target {
            fn fields() -> ::std::vec::Vec<$crate::binding::Field<Self>> {
                ::std::vec![$(
                    $crate::binding::Field::new(
                        $crate::binding::Source::$source,
                        $key,
                        |target: &mut Self, raw: &str| {
                            if let ::std::option::Option::Some(value) =
                                $crate::binding::FromWire::from_wire(raw)
                            {
                                target.$field = value;
                            }
                        },
                    )
                ),*]
            }
        }
    };
}
