// Procedural macros for tsense record types

use proc_macro::TokenStream;

mod describe;

/// Implements `tsense::Describe` for a struct with named fields.
///
/// Field keys, given as `#[tsense(...)]`:
/// - `rename = "name"`: storage name (defaults to `#[serde(rename)]`, then the field name)
/// - `sort`, `index`, `required`, `facet`, `default_sort`: presence flags
/// - `type_override = "int32"`: remote type used verbatim
/// - `flatten`: embed another `Describe` type's fields in place
/// - `skip`: leave the field out of the schema (also implied by `#[serde(skip)]`)
///
/// Date-time fields are stored as epoch seconds. Declare them as
/// `tsense::Timestamp`, or keep a chrono type and serialize it with
/// `#[serde(with = "chrono::serde::ts_seconds")]`. A bare `DateTime` is
/// reported as an unsupported field type.
#[proc_macro_derive(Describe, attributes(tsense))]
pub fn describe_derive(input: TokenStream) -> TokenStream {
    describe::describe_derive_impl(input)
}
