//! Schema graph collaborator.
//!
//! The compiler reads collections, fields and relations through the
//! [`SchemaProvider`] trait, one lookup at a time as it walks a path.
//! [`SchemaOverview`] is the in-memory implementation used by the CLI and
//! tests.
//!
//! # Example
//!
//! ```ignore
//! use relq::schema::{SchemaOverview, SchemaProvider};
//!
//! let schema = SchemaOverview::load("schema.json")?;
//! let articles = schema.collection("articles").await?;
//! let relations = schema.relations().await?;
//! ```

mod overview;
mod relation;
mod types;

use async_trait::async_trait;

pub use overview::{CollectionSchema, SchemaOverview, SchemaSummary};
pub use relation::{relation_info, split_scope, RelationInfo};
pub use types::{CollectionInfo, FieldInfo, FieldType, Relation, RelationMeta};

/// Error type for schema loading and lookups.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Failed to read schema file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse schema: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Invalid schema: {0}")]
    Invalid(String),

    #[error("Schema provider failed: {0}")]
    Provider(String),
}

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Read-only access to the schema graph.
#[async_trait]
pub trait SchemaProvider: Send + Sync {
    /// Collection facts (primary key, accountability), `None` if unknown.
    async fn collection(&self, name: &str) -> SchemaResult<Option<CollectionInfo>>;

    /// All fields of a collection, in declaration order.
    async fn fields(&self, collection: &str) -> SchemaResult<Vec<FieldInfo>>;

    /// A single field, `None` if the collection has no such field.
    async fn field(&self, collection: &str, name: &str) -> SchemaResult<Option<FieldInfo>>;

    /// Every relation in the schema.
    async fn relations(&self) -> SchemaResult<Vec<Relation>>;
}
