//! Schema graph types: collections, fields and relations.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::sql::DateKind;

/// Declared type of a field.
///
/// Geometry subtypes (`geometry.Point`, `geometry.Polygon`, ...) all map to
/// [`FieldType::Geometry`]; unrecognised names become [`FieldType::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    Alias,
    BigInteger,
    Binary,
    Boolean,
    Csv,
    Date,
    DateTime,
    Decimal,
    Float,
    Geometry,
    Hash,
    Integer,
    Json,
    String,
    Text,
    Time,
    Timestamp,
    Uuid,
    Unknown,
}

impl FieldType {
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::Alias => "alias",
            FieldType::BigInteger => "bigInteger",
            FieldType::Binary => "binary",
            FieldType::Boolean => "boolean",
            FieldType::Csv => "csv",
            FieldType::Date => "date",
            FieldType::DateTime => "dateTime",
            FieldType::Decimal => "decimal",
            FieldType::Float => "float",
            FieldType::Geometry => "geometry",
            FieldType::Hash => "hash",
            FieldType::Integer => "integer",
            FieldType::Json => "json",
            FieldType::String => "string",
            FieldType::Text => "text",
            FieldType::Time => "time",
            FieldType::Timestamp => "timestamp",
            FieldType::Uuid => "uuid",
            FieldType::Unknown => "unknown",
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, FieldType::String | FieldType::Text)
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, FieldType::Integer | FieldType::BigInteger)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            FieldType::Integer | FieldType::BigInteger | FieldType::Decimal | FieldType::Float
        )
    }

    /// The date parser family for date/time types.
    pub fn date_kind(&self) -> Option<DateKind> {
        match self {
            FieldType::Date => Some(DateKind::Date),
            FieldType::Time => Some(DateKind::Time),
            FieldType::DateTime => Some(DateKind::DateTime),
            FieldType::Timestamp => Some(DateKind::Timestamp),
            _ => None,
        }
    }
}

impl From<&str> for FieldType {
    fn from(name: &str) -> Self {
        match name {
            "alias" => FieldType::Alias,
            "bigInteger" => FieldType::BigInteger,
            "binary" => FieldType::Binary,
            "boolean" => FieldType::Boolean,
            "csv" => FieldType::Csv,
            "date" => FieldType::Date,
            "dateTime" => FieldType::DateTime,
            "decimal" => FieldType::Decimal,
            "float" => FieldType::Float,
            "hash" => FieldType::Hash,
            "integer" => FieldType::Integer,
            "json" => FieldType::Json,
            "string" => FieldType::String,
            "text" => FieldType::Text,
            "time" => FieldType::Time,
            "timestamp" => FieldType::Timestamp,
            "uuid" => FieldType::Uuid,
            other if other == "geometry" || other.starts_with("geometry.") => {
                FieldType::Geometry
            }
            _ => FieldType::Unknown,
        }
    }
}

impl From<String> for FieldType {
    fn from(name: String) -> Self {
        FieldType::from(name.as_str())
    }
}

impl From<FieldType> for String {
    fn from(field_type: FieldType) -> Self {
        field_type.name().to_string()
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A field of a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldInfo {
    pub field: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Flags such as `conceal`, `o2m`, `m2a`, `cast-json`.
    #[serde(default)]
    pub special: Vec<String>,
    #[serde(default)]
    pub default_value: Option<Value>,
}

impl FieldInfo {
    pub fn new(field: &str, field_type: FieldType) -> Self {
        Self {
            field: field.into(),
            field_type,
            special: vec![],
            default_value: None,
        }
    }

    pub fn with_special(mut self, flag: &str) -> Self {
        self.special.push(flag.into());
        self
    }

    /// Alias fields have no column of their own (relational virtual fields).
    pub fn is_alias(&self) -> bool {
        self.field_type == FieldType::Alias || self.has_special("alias") || self.has_special("no-data")
    }

    pub fn is_concealed(&self) -> bool {
        self.has_special("conceal")
    }

    pub fn has_special(&self, flag: &str) -> bool {
        self.special.iter().any(|s| s == flag)
    }
}

/// Collection-level facts the compiler needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub collection: String,
    /// Primary key field name.
    pub primary: String,
    /// Activity tracking mode (`all`, `activity`, or none).
    #[serde(default)]
    pub accountability: Option<String>,
}

/// Relation metadata, mirroring the inverse side of a foreign key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationMeta {
    /// Alias field on the "one" side listing the related rows.
    #[serde(default)]
    pub one_field: Option<String>,
    /// Discriminator column holding the target collection of a polymorphic key.
    #[serde(default)]
    pub one_collection_field: Option<String>,
    #[serde(default)]
    pub one_allowed_collections: Vec<String>,
    #[serde(default)]
    pub junction_field: Option<String>,
}

/// A foreign key from `collection.field` to `related_collection`.
///
/// `related_collection` is `None` for polymorphic (many-to-any) keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub collection: String,
    pub field: String,
    #[serde(default)]
    pub related_collection: Option<String>,
    #[serde(default)]
    pub meta: RelationMeta,
}

impl Relation {
    pub fn many_to_one(collection: &str, field: &str, related: &str) -> Self {
        Self {
            collection: collection.into(),
            field: field.into(),
            related_collection: Some(related.into()),
            meta: RelationMeta::default(),
        }
    }

    pub fn with_one_field(mut self, one_field: &str) -> Self {
        self.meta.one_field = Some(one_field.into());
        self
    }

    pub fn many_to_any(
        collection: &str,
        field: &str,
        collection_field: &str,
        allowed: &[&str],
    ) -> Self {
        Self {
            collection: collection.into(),
            field: field.into(),
            related_collection: None,
            meta: RelationMeta {
                one_collection_field: Some(collection_field.into()),
                one_allowed_collections: allowed.iter().map(|c| c.to_string()).collect(),
                ..RelationMeta::default()
            },
        }
    }
}
