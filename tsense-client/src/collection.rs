//! Collection schemas and the schema mapper.

use crate::error::{Result, TsenseError};
use crate::schema::{self, DeclaredKind, Describe, FieldDescriptor};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Remote storage type of a collection field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    /// `string`
    String,
    /// `string[]`
    StringArray,
    /// `int32`
    Int32,
    /// `int32[]`
    Int32Array,
    /// `int64`
    Int64,
    /// `int64[]`
    Int64Array,
    /// `float`
    Float,
    /// `float[]`
    FloatArray,
    /// `bool`
    Bool,
    /// `bool[]`
    BoolArray,
    /// `geopoint`
    Geopoint,
    /// `object`
    Object,
    /// `auto`
    Auto,
    /// Any other remote type, kept verbatim.
    Other(String),
}

impl FieldType {
    /// Wire name of the type.
    pub fn as_str(&self) -> &str {
        match self {
            FieldType::String => "string",
            FieldType::StringArray => "string[]",
            FieldType::Int32 => "int32",
            FieldType::Int32Array => "int32[]",
            FieldType::Int64 => "int64",
            FieldType::Int64Array => "int64[]",
            FieldType::Float => "float",
            FieldType::FloatArray => "float[]",
            FieldType::Bool => "bool",
            FieldType::BoolArray => "bool[]",
            FieldType::Geopoint => "geopoint",
            FieldType::Object => "object",
            FieldType::Auto => "auto",
            FieldType::Other(other) => other,
        }
    }

    /// Remote type inferred for a declared kind, if there is one.
    pub fn for_declared(kind: &DeclaredKind) -> Option<Self> {
        let ty = match kind {
            DeclaredKind::Bool => FieldType::Bool,
            DeclaredKind::Text => FieldType::String,
            DeclaredKind::TextArray => FieldType::StringArray,
            DeclaredKind::Int64
            | DeclaredKind::Int32
            | DeclaredKind::Int16
            | DeclaredKind::Int8
            | DeclaredKind::DateTime => FieldType::Int64,
            DeclaredKind::Float32 | DeclaredKind::Float64 => FieldType::Float,
            DeclaredKind::Unsupported(_) => return None,
        };
        Some(ty)
    }
}

impl From<&str> for FieldType {
    fn from(value: &str) -> Self {
        match value {
            "string" => FieldType::String,
            "string[]" => FieldType::StringArray,
            "int32" => FieldType::Int32,
            "int32[]" => FieldType::Int32Array,
            "int64" => FieldType::Int64,
            "int64[]" => FieldType::Int64Array,
            "float" => FieldType::Float,
            "float[]" => FieldType::FloatArray,
            "bool" => FieldType::Bool,
            "bool[]" => FieldType::BoolArray,
            "geopoint" => FieldType::Geopoint,
            "object" => FieldType::Object,
            "auto" => FieldType::Auto,
            other => FieldType::Other(other.to_string()),
        }
    }
}

impl From<String> for FieldType {
    fn from(value: String) -> Self {
        FieldType::from(value.as_str())
    }
}

impl From<FieldType> for String {
    fn from(value: FieldType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One field of a collection schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionField {
    /// Field name.
    pub name: String,
    /// Storage type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Facet-enabled.
    #[serde(default)]
    pub facet: bool,
    /// Indexed.
    #[serde(default)]
    pub index: bool,
    /// May be absent from documents.
    #[serde(default)]
    pub optional: bool,
    /// Eligible for ad-hoc sort.
    #[serde(default)]
    pub sort: bool,
}

impl CollectionField {
    /// Create an indexed, required field with no other flags.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            facet: false,
            index: true,
            optional: false,
            sort: false,
        }
    }

    /// Set the facet flag.
    pub fn facet(mut self, facet: bool) -> Self {
        self.facet = facet;
        self
    }

    /// Set the index flag.
    pub fn index(mut self, index: bool) -> Self {
        self.index = index;
        self
    }

    /// Set the optional flag.
    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    /// Set the sort flag.
    pub fn sort(mut self, sort: bool) -> Self {
        self.sort = sort;
        self
    }
}

/// A collection schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    /// Collection name, logical or versioned physical.
    pub name: String,
    /// Field definitions.
    #[serde(default)]
    pub fields: Vec<CollectionField>,
    /// Name of the default sort field, empty when there is none.
    #[serde(default)]
    pub default_sorting_field: String,
}

impl Collection {
    /// Create an empty schema.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            default_sorting_field: String::new(),
        }
    }

    /// Add a field.
    pub fn field(mut self, field: CollectionField) -> Self {
        self.fields.push(field);
        self
    }

    /// Set the default sort field.
    pub fn default_sorting_field(mut self, name: impl Into<String>) -> Self {
        self.default_sorting_field = name.into();
        self
    }

    /// Look up a field by name.
    pub fn get_field(&self, name: &str) -> Option<&CollectionField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Sort fields on case-insensitive name.
    pub fn sort_fields(&mut self) {
        self.fields.sort_by_cached_key(|f| f.name.to_lowercase());
    }

    /// Copy of this schema with fields in canonical order.
    pub fn canonical(&self) -> Self {
        let mut copy = self.clone();
        copy.sort_fields();
        copy
    }

    /// Structural equality after both field lists are canonicalized.
    pub fn same_schema(&self, other: &Collection) -> bool {
        self.canonical() == other.canonical()
    }

    /// Field-level differences going from `remote` to `self`.
    pub fn diff(&self, remote: &Collection) -> SchemaDiff {
        let mut diff = SchemaDiff::default();

        for field in &self.fields {
            match remote.get_field(&field.name) {
                None => diff.added.push(field.name.clone()),
                Some(existing) if existing != field => diff.changed.push(field.name.clone()),
                Some(_) => {}
            }
        }
        for field in &remote.fields {
            if self.get_field(&field.name).is_none() {
                diff.removed.push(field.name.clone());
            }
        }
        if self.default_sorting_field != remote.default_sorting_field {
            diff.default_sorting_field = Some((
                remote.default_sorting_field.clone(),
                self.default_sorting_field.clone(),
            ));
        }

        diff.added.sort_by_cached_key(|n| n.to_lowercase());
        diff.removed.sort_by_cached_key(|n| n.to_lowercase());
        diff.changed.sort_by_cached_key(|n| n.to_lowercase());
        diff
    }
}

/// What differs between a desired schema and the one already stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaDiff {
    /// Fields only in the desired schema.
    pub added: Vec<String>,
    /// Fields only in the stored schema.
    pub removed: Vec<String>,
    /// Fields in both with different type or flags.
    pub changed: Vec<String>,
    /// Stored and desired default sort field, when they differ.
    pub default_sorting_field: Option<(String, String)>,
}

impl SchemaDiff {
    /// True when the schemas have the same fields and default sort field.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.changed.is_empty()
            && self.default_sorting_field.is_none()
    }
}

impl fmt::Display for SchemaDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("no field differences");
        }

        let mut parts = Vec::new();
        if !self.added.is_empty() {
            parts.push(format!("added [{}]", self.added.join(", ")));
        }
        if !self.removed.is_empty() {
            parts.push(format!("removed [{}]", self.removed.join(", ")));
        }
        if !self.changed.is_empty() {
            parts.push(format!("changed [{}]", self.changed.join(", ")));
        }
        if let Some((stored, desired)) = &self.default_sorting_field {
            parts.push(format!("default sort field '{stored}' -> '{desired}'"));
        }
        f.write_str(&parts.join("; "))
    }
}

/// Schema change applied to an existing collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionUpdate {
    /// Field additions and drops.
    pub fields: Vec<CollectionFieldUpdate>,
}

impl CollectionUpdate {
    /// Create an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field.
    pub fn add(mut self, field: CollectionField) -> Self {
        self.fields.push(CollectionFieldUpdate::Add(field));
        self
    }

    /// Drop a field by name.
    pub fn drop_field(mut self, name: impl Into<String>) -> Self {
        self.fields.push(CollectionFieldUpdate::Drop {
            name: name.into(),
            drop: true,
        });
        self
    }
}

/// One entry of a [`CollectionUpdate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CollectionFieldUpdate {
    /// Remove the named field.
    Drop {
        /// Field name.
        name: String,
        /// Always true.
        drop: bool,
    },
    /// Add a field.
    Add(CollectionField),
}

/// Derive the collection schema of a describable type.
///
/// The collection is named after the type (see [`Describe::collection_name`]).
pub fn derive_schema<T: Describe>() -> Result<Collection> {
    let fields = schema::introspect::<T>()?;
    schema_from_descriptors(T::collection_name(), &fields)
}

/// Map field descriptors onto a collection schema named `name`.
pub fn schema_from_descriptors(
    name: impl Into<String>,
    descriptors: &[FieldDescriptor],
) -> Result<Collection> {
    schema::validate(descriptors)?;

    let mut collection = Collection::new(name);
    let mut default_sort: Option<&str> = None;

    for descriptor in descriptors {
        let annotations = &descriptor.annotations;

        if annotations.default_sort {
            if let Some(first) = default_sort {
                return Err(TsenseError::MultipleDefaultSortFields {
                    first: first.to_string(),
                    second: descriptor.name.clone(),
                });
            }
            default_sort = Some(&descriptor.name);
        }

        let field_type = match &annotations.type_override {
            Some(remote) => FieldType::from(remote.as_str()),
            None => FieldType::for_declared(&descriptor.declared).ok_or_else(|| {
                TsenseError::UnsupportedFieldType {
                    field: descriptor.name.clone(),
                    declared: descriptor.declared.name().to_string(),
                }
            })?,
        };

        let forced = annotations.default_sort;
        collection.fields.push(CollectionField {
            name: descriptor.name.clone(),
            field_type,
            facet: annotations.facet,
            index: annotations.index || forced,
            optional: !(annotations.required || forced),
            sort: annotations.sort || forced,
        });
    }

    collection.default_sorting_field = default_sort.unwrap_or_default().to_string();
    Ok(collection)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order_fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::new("id", DeclaredKind::Text),
            FieldDescriptor::new("total", DeclaredKind::Float64).default_sort(),
            FieldDescriptor::new("paid", DeclaredKind::Bool).required(),
        ]
    }

    #[test]
    fn test_field_type_wire_names() {
        assert_eq!(
            serde_json::to_string(&FieldType::StringArray).unwrap(),
            "\"string[]\""
        );
        let parsed: FieldType = serde_json::from_str("\"int32\"").unwrap();
        assert_eq!(parsed, FieldType::Int32);
        let other: FieldType = serde_json::from_str("\"float[]\"").unwrap();
        assert_eq!(other, FieldType::FloatArray);
        let custom: FieldType = serde_json::from_str("\"string*\"").unwrap();
        assert_eq!(custom, FieldType::Other("string*".to_string()));
    }

    #[test]
    fn test_mapping_table() {
        let cases = [
            (DeclaredKind::Bool, FieldType::Bool),
            (DeclaredKind::Text, FieldType::String),
            (DeclaredKind::TextArray, FieldType::StringArray),
            (DeclaredKind::Int64, FieldType::Int64),
            (DeclaredKind::Int32, FieldType::Int64),
            (DeclaredKind::Int16, FieldType::Int64),
            (DeclaredKind::Int8, FieldType::Int64),
            (DeclaredKind::Float32, FieldType::Float),
            (DeclaredKind::Float64, FieldType::Float),
            (DeclaredKind::DateTime, FieldType::Int64),
        ];
        for (kind, expected) in cases {
            assert_eq!(FieldType::for_declared(&kind), Some(expected));
        }
        assert_eq!(
            FieldType::for_declared(&DeclaredKind::Unsupported("u64".into())),
            None
        );
    }

    #[test]
    fn test_order_schema() {
        let collection = schema_from_descriptors("order", &order_fields()).unwrap();

        assert_eq!(collection.name, "order");
        assert_eq!(collection.fields.len(), 3);
        assert_eq!(collection.default_sorting_field, "total");

        let id = collection.get_field("id").unwrap();
        assert_eq!(id.field_type, FieldType::String);
        assert!(id.optional);
        assert!(!id.index);

        let total = collection.get_field("total").unwrap();
        assert_eq!(total.field_type, FieldType::Float);
        assert!(total.sort);
        assert!(total.index);
        assert!(!total.optional);

        let paid = collection.get_field("paid").unwrap();
        assert_eq!(paid.field_type, FieldType::Bool);
        assert!(!paid.optional);
    }

    #[test]
    fn test_second_default_sort_field_is_rejected() {
        let mut fields = order_fields();
        fields.push(FieldDescriptor::new("placed_at", DeclaredKind::DateTime).default_sort());

        let err = schema_from_descriptors("order", &fields).unwrap_err();
        assert!(err.to_string().contains("more than one default sort field"));
        match err {
            TsenseError::MultipleDefaultSortFields { first, second } => {
                assert_eq!(first, "total");
                assert_eq!(second, "placed_at");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_type_override_is_trusted() {
        let fields = vec![
            FieldDescriptor::new("count", DeclaredKind::Int32).type_override("int32"),
            FieldDescriptor::new("location", DeclaredKind::Unsupported("(f64, f64)".into()))
                .type_override("geopoint"),
        ];
        let collection = schema_from_descriptors("shop", &fields).unwrap();
        assert_eq!(collection.fields[0].field_type, FieldType::Int32);
        assert_eq!(collection.fields[1].field_type, FieldType::Geopoint);
    }

    #[test]
    fn test_unsupported_field_fails_whole_schema() {
        let fields = vec![
            FieldDescriptor::new("id", DeclaredKind::Text),
            FieldDescriptor::new("blob", DeclaredKind::Unsupported("Vec<u8>".into())),
        ];
        let err = schema_from_descriptors("file", &fields).unwrap_err();
        assert!(err.to_string().contains("blob"));
        assert!(err.to_string().contains("Vec<u8>"));
    }

    #[test]
    fn test_same_schema_ignores_field_order_and_case() {
        let a = Collection::new("order")
            .field(CollectionField::new("Total", FieldType::Float))
            .field(CollectionField::new("id", FieldType::String));
        let b = Collection::new("order")
            .field(CollectionField::new("id", FieldType::String))
            .field(CollectionField::new("Total", FieldType::Float));
        assert!(a.same_schema(&b));

        let c = b.clone().field(CollectionField::new("paid", FieldType::Bool));
        assert!(!a.same_schema(&c));
    }

    #[test]
    fn test_diff_reports_each_kind_of_change() {
        let stored = Collection::new("order_2024-01-02_x")
            .field(CollectionField::new("id", FieldType::String))
            .field(CollectionField::new("note", FieldType::String))
            .field(CollectionField::new("total", FieldType::Int64))
            .default_sorting_field("total");
        let desired = Collection::new("order_2024-01-02_x")
            .field(CollectionField::new("id", FieldType::String))
            .field(CollectionField::new("total", FieldType::Float))
            .field(CollectionField::new("paid", FieldType::Bool));

        let diff = desired.diff(&stored);
        assert_eq!(diff.added, vec!["paid"]);
        assert_eq!(diff.removed, vec!["note"]);
        assert_eq!(diff.changed, vec!["total"]);
        assert_eq!(
            diff.default_sorting_field,
            Some(("total".to_string(), String::new()))
        );
        assert_eq!(
            diff.to_string(),
            "added [paid]; removed [note]; changed [total]; default sort field 'total' -> ''"
        );
    }

    #[test]
    fn test_collection_deserializes_remote_response() {
        let json = serde_json::json!({
            "name": "order_2024-01-02_abc",
            "num_documents": 12,
            "created_at": 1704153600,
            "fields": [
                { "name": "id", "type": "string", "facet": false, "index": true, "optional": true },
                { "name": "total", "type": "float", "sort": true, "index": true }
            ],
            "default_sorting_field": "total"
        });
        let collection: Collection = serde_json::from_value(json).unwrap();
        assert_eq!(collection.fields.len(), 2);
        assert!(!collection.fields[0].sort);
        assert!(!collection.fields[1].optional);
    }

    #[test]
    fn test_collection_update_wire_format() {
        let update = CollectionUpdate::new()
            .drop_field("note")
            .add(CollectionField::new("paid", FieldType::Bool));
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["fields"][0], serde_json::json!({ "name": "note", "drop": true }));
        assert_eq!(json["fields"][1]["type"], "bool");
    }
}
