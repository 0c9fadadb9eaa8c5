//! In-memory schema snapshot.
//!
//! Loaded from JSON of the form:
//!
//! ```json
//! {
//!   "collections": [
//!     {
//!       "collection": "articles",
//!       "primary": "id",
//!       "fields": [
//!         { "field": "id", "type": "integer" },
//!         { "field": "author", "type": "integer" },
//!         { "field": "comments", "type": "alias", "special": ["o2m"] }
//!       ]
//!     }
//!   ],
//!   "relations": [
//!     { "collection": "articles", "field": "author", "related_collection": "authors" }
//!   ]
//! }
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::types::{CollectionInfo, FieldInfo, Relation};
use super::{SchemaError, SchemaProvider, SchemaResult};

/// A collection with its fields, in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSchema {
    #[serde(flatten)]
    pub info: CollectionInfo,
    #[serde(default)]
    pub fields: Vec<FieldInfo>,
}

impl CollectionSchema {
    pub fn new(collection: &str, primary: &str) -> Self {
        Self {
            info: CollectionInfo {
                collection: collection.into(),
                primary: primary.into(),
                accountability: None,
            },
            fields: vec![],
        }
    }

    pub fn with_field(mut self, field: FieldInfo) -> Self {
        self.fields.push(field);
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.field == name)
    }
}

/// Summary counts reported by [`SchemaOverview::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaSummary {
    pub collections: usize,
    pub fields: usize,
    pub relations: usize,
}

/// Schema graph held entirely in memory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaOverview {
    #[serde(default)]
    pub collections: Vec<CollectionSchema>,
    #[serde(default)]
    pub relations: Vec<Relation>,
}

impl SchemaOverview {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collection(mut self, collection: CollectionSchema) -> Self {
        self.collections.push(collection);
        self
    }

    pub fn with_relation(mut self, relation: Relation) -> Self {
        self.relations.push(relation);
        self
    }

    /// Parse and validate a schema from a JSON string.
    pub fn from_json(json: &str) -> SchemaResult<Self> {
        let overview: SchemaOverview = serde_json::from_str(json)?;
        overview.validate()?;
        Ok(overview)
    }

    /// Load and validate a schema from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> SchemaResult<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    pub fn collection_schema(&self, name: &str) -> Option<&CollectionSchema> {
        self.collections.iter().find(|c| c.info.collection == name)
    }

    /// Check that primary keys and relation endpoints exist.
    pub fn validate(&self) -> SchemaResult<SchemaSummary> {
        let mut seen = HashSet::new();
        for collection in &self.collections {
            let name = &collection.info.collection;
            if !seen.insert(name.as_str()) {
                return Err(SchemaError::Invalid(format!(
                    "collection \"{}\" is declared twice",
                    name
                )));
            }
            if collection.field(&collection.info.primary).is_none() {
                return Err(SchemaError::Invalid(format!(
                    "primary key \"{}\" is not a field of \"{}\"",
                    collection.info.primary, name
                )));
            }
        }

        for relation in &self.relations {
            let many = self.collection_schema(&relation.collection).ok_or_else(|| {
                SchemaError::Invalid(format!(
                    "relation on unknown collection \"{}\"",
                    relation.collection
                ))
            })?;
            if many.field(&relation.field).is_none() {
                return Err(SchemaError::Invalid(format!(
                    "relation field \"{}.{}\" does not exist",
                    relation.collection, relation.field
                )));
            }

            let targets: Vec<&String> = match &relation.related_collection {
                Some(related) => vec![related],
                None => relation.meta.one_allowed_collections.iter().collect(),
            };
            if targets.is_empty() {
                return Err(SchemaError::Invalid(format!(
                    "relation \"{}.{}\" has no related collection",
                    relation.collection, relation.field
                )));
            }
            for target in targets {
                if self.collection_schema(target).is_none() {
                    return Err(SchemaError::Invalid(format!(
                        "relation \"{}.{}\" points to unknown collection \"{}\"",
                        relation.collection, relation.field, target
                    )));
                }
            }
        }

        Ok(SchemaSummary {
            collections: self.collections.len(),
            fields: self.collections.iter().map(|c| c.fields.len()).sum(),
            relations: self.relations.len(),
        })
    }
}

#[async_trait]
impl SchemaProvider for SchemaOverview {
    async fn collection(&self, name: &str) -> SchemaResult<Option<CollectionInfo>> {
        Ok(self.collection_schema(name).map(|c| c.info.clone()))
    }

    async fn fields(&self, collection: &str) -> SchemaResult<Vec<FieldInfo>> {
        Ok(self
            .collection_schema(collection)
            .map(|c| c.fields.clone())
            .unwrap_or_default())
    }

    async fn field(&self, collection: &str, name: &str) -> SchemaResult<Option<FieldInfo>> {
        Ok(self
            .collection_schema(collection)
            .and_then(|c| c.field(name))
            .cloned())
    }

    async fn relations(&self) -> SchemaResult<Vec<Relation>> {
        Ok(self.relations.clone())
    }
}
