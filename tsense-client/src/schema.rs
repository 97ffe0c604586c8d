//! Record type introspection.
//!
//! A record type describes itself through [`Describe`], normally generated by
//! `#[derive(Describe)]`. [`introspect`] validates that description and hands
//! back the flattened field list the schema mapper works from.

use crate::error::{Result, TsenseError};
use crate::naming;

/// Language-level kind of a record field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclaredKind {
    /// `bool`
    Bool,
    /// `String` or `&str`
    Text,
    /// `Vec<String>`
    TextArray,
    /// `i64`
    Int64,
    /// `i32`
    Int32,
    /// `i16`
    Int16,
    /// `i8`
    Int8,
    /// `f32`
    Float32,
    /// `f64`
    Float64,
    /// A point in time serialized as epoch seconds: [`Timestamp`](crate::Timestamp),
    /// or a chrono field with `#[serde(with = "chrono::serde::ts_seconds")]`.
    ///
    /// A bare `DateTime` is not classified here since serde writes it as an
    /// RFC 3339 string.
    DateTime,
    /// Any other type, kept verbatim for error reporting.
    Unsupported(String),
}

impl DeclaredKind {
    /// Classify a Rust type as written in source, e.g. `Option<Vec<String>>`.
    ///
    /// Whitespace and leading module paths are ignored and `Option<T>` is
    /// classified as `T`.
    pub fn from_rust_type(ty: &str) -> Self {
        let compact: String = strip_lifetimes(ty)
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        let mut ty = compact.as_str();
        while let Some(inner) = unwrap_generic(ty, "Option") {
            ty = inner;
        }

        if let Some(inner) = unwrap_generic(ty, "Vec") {
            return match Self::from_rust_type(inner) {
                DeclaredKind::Text => DeclaredKind::TextArray,
                _ => DeclaredKind::Unsupported(compact),
            };
        }

        let base = ty.split('<').next().unwrap_or(ty);
        match last_segment(base).trim_start_matches('&') {
            "bool" => DeclaredKind::Bool,
            "String" | "str" => DeclaredKind::Text,
            "i64" | "isize" => DeclaredKind::Int64,
            "i32" => DeclaredKind::Int32,
            "i16" => DeclaredKind::Int16,
            "i8" => DeclaredKind::Int8,
            "f32" => DeclaredKind::Float32,
            "f64" => DeclaredKind::Float64,
            "Timestamp" => DeclaredKind::DateTime,
            _ => DeclaredKind::Unsupported(compact),
        }
    }

    /// Whether the schema mapper has a remote type for this kind.
    pub fn is_supported(&self) -> bool {
        !matches!(self, DeclaredKind::Unsupported(_))
    }

    /// Human-readable name used in error messages.
    pub fn name(&self) -> &str {
        match self {
            DeclaredKind::Bool => "bool",
            DeclaredKind::Text => "String",
            DeclaredKind::TextArray => "Vec<String>",
            DeclaredKind::Int64 => "i64",
            DeclaredKind::Int32 => "i32",
            DeclaredKind::Int16 => "i16",
            DeclaredKind::Int8 => "i8",
            DeclaredKind::Float32 => "f32",
            DeclaredKind::Float64 => "f64",
            DeclaredKind::DateTime => "DateTime",
            DeclaredKind::Unsupported(ty) => ty,
        }
    }
}

// Drop lifetime tokens such as `'a` or `'static` from a type as written.
fn strip_lifetimes(ty: &str) -> String {
    let mut out = String::with_capacity(ty.len());
    let mut chars = ty.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\'' {
            while chars.next_if(|n| n.is_alphanumeric() || *n == '_').is_some() {}
            continue;
        }
        out.push(c);
    }
    out
}

fn unwrap_generic<'a>(ty: &'a str, wrapper: &str) -> Option<&'a str> {
    let open = ty.find('<')?;
    if last_segment(&ty[..open]) != wrapper || !ty.ends_with('>') {
        return None;
    }
    Some(&ty[open + 1..ty.len() - 1])
}

fn last_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}

/// Recognized directives attached to one field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotations {
    /// Eligible for ad-hoc sort.
    pub sort: bool,
    /// Indexed.
    pub index: bool,
    /// Mandatory; absence means optional.
    pub required: bool,
    /// Facet-enabled.
    pub facet: bool,
    /// Remote type forced verbatim, bypassing inference.
    pub type_override: Option<String>,
    /// The collection's default sort field.
    pub default_sort: bool,
}

/// One field of a record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Storage name: the rename override, else the declared field name.
    pub name: String,
    /// Declared kind.
    pub declared: DeclaredKind,
    /// Recognized directives.
    pub annotations: Annotations,
}

impl FieldDescriptor {
    /// Create a descriptor with no directives.
    pub fn new(name: impl Into<String>, declared: DeclaredKind) -> Self {
        Self {
            name: name.into(),
            declared,
            annotations: Annotations::default(),
        }
    }

    /// Mark the field sortable.
    pub fn sort(mut self) -> Self {
        self.annotations.sort = true;
        self
    }

    /// Mark the field indexed.
    pub fn index(mut self) -> Self {
        self.annotations.index = true;
        self
    }

    /// Mark the field required.
    pub fn required(mut self) -> Self {
        self.annotations.required = true;
        self
    }

    /// Mark the field facet-enabled.
    pub fn facet(mut self) -> Self {
        self.annotations.facet = true;
        self
    }

    /// Force the remote type.
    pub fn type_override(mut self, remote_type: impl Into<String>) -> Self {
        self.annotations.type_override = Some(remote_type.into());
        self
    }

    /// Mark the field as the default sort field.
    pub fn default_sort(mut self) -> Self {
        self.annotations.default_sort = true;
        self
    }
}

/// Capability of a record type to describe its fields.
///
/// Usually derived:
///
/// ```rust,ignore
/// #[derive(Describe)]
/// struct Order {
///     id: String,
///     #[tsense(default_sort)]
///     total: f64,
///     #[tsense(required)]
///     paid: bool,
/// }
/// ```
///
/// Hand-written implementations are equally valid:
///
/// ```rust
/// use tsense_client::{DeclaredKind, Describe, FieldDescriptor};
///
/// struct Order;
///
/// impl Describe for Order {
///     fn type_name() -> &'static str {
///         "Order"
///     }
///
///     fn fields() -> Vec<FieldDescriptor> {
///         vec![
///             FieldDescriptor::new("id", DeclaredKind::Text),
///             FieldDescriptor::new("total", DeclaredKind::Float64).default_sort(),
///         ]
///     }
/// }
///
/// assert_eq!(Order::collection_name(), "order");
/// ```
pub trait Describe {
    /// Name of the record type as declared.
    fn type_name() -> &'static str;

    /// Every stored field in declaration order, embedded types flattened in place.
    fn fields() -> Vec<FieldDescriptor>;

    /// Default logical collection name: the type name in lowercase underscore form.
    fn collection_name() -> String {
        naming::underscore(Self::type_name())
    }
}

/// Produce the validated field list of `T`.
///
/// Fails on the first field whose declared kind has no remote mapping and no
/// type override; no partial list is returned.
pub fn introspect<T: Describe>() -> Result<Vec<FieldDescriptor>> {
    let fields = T::fields();
    validate(&fields)?;
    Ok(fields)
}

/// Check a field list for kinds the schema mapper cannot handle.
pub fn validate(fields: &[FieldDescriptor]) -> Result<()> {
    for field in fields {
        if field.annotations.type_override.is_none() && !field.declared.is_supported() {
            return Err(TsenseError::UnsupportedFieldType {
                field: field.name.clone(),
                declared: field.declared.name().to_string(),
            });
        }
    }
    Ok(())
}
