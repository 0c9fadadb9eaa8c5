//! Shared fixtures for the compiler integration tests.
#![allow(dead_code)]

use relq::compiler::{AliasStyle, Compiler, CompilerOptions};
use relq::error::QueryResult;
use relq::query::QuerySpec;
use relq::schema::SchemaOverview;
use relq::sql::test_utils::validate_sql;
use relq::sql::{Dialect, Query};
use serde_json::Value;

/// Blog plus a page builder with polymorphic blocks.
pub const SCHEMA_JSON: &str = r#"{
  "collections": [
    {
      "collection": "articles",
      "primary": "id",
      "fields": [
        { "field": "id", "type": "integer" },
        { "field": "title", "type": "string" },
        { "field": "views", "type": "integer" },
        { "field": "rating", "type": "float" },
        { "field": "published_on", "type": "date" },
        { "field": "author", "type": "integer" },
        { "field": "tags", "type": "json" },
        { "field": "comments", "type": "alias", "special": ["o2m"] }
      ]
    },
    {
      "collection": "authors",
      "primary": "id",
      "fields": [
        { "field": "id", "type": "integer" },
        { "field": "name", "type": "string" },
        { "field": "password", "type": "hash", "special": ["conceal"] },
        { "field": "articles", "type": "alias", "special": ["o2m"] }
      ]
    },
    {
      "collection": "comments",
      "primary": "id",
      "fields": [
        { "field": "id", "type": "integer" },
        { "field": "article", "type": "integer" },
        { "field": "body", "type": "text" },
        { "field": "approved", "type": "boolean" }
      ]
    },
    {
      "collection": "pages",
      "primary": "id",
      "fields": [
        { "field": "id", "type": "integer" },
        { "field": "title", "type": "string" },
        { "field": "blocks", "type": "alias", "special": ["o2m"] }
      ]
    },
    {
      "collection": "blocks",
      "primary": "id",
      "fields": [
        { "field": "id", "type": "integer" },
        { "field": "page", "type": "integer" },
        { "field": "item", "type": "string" },
        { "field": "collection", "type": "string" }
      ]
    },
    {
      "collection": "headings",
      "primary": "id",
      "fields": [
        { "field": "id", "type": "uuid" },
        { "field": "text", "type": "string" },
        { "field": "usages", "type": "alias", "special": ["o2a"] }
      ]
    }
  ],
  "relations": [
    {
      "collection": "articles",
      "field": "author",
      "related_collection": "authors",
      "meta": { "one_field": "articles" }
    },
    {
      "collection": "comments",
      "field": "article",
      "related_collection": "articles",
      "meta": { "one_field": "comments" }
    },
    {
      "collection": "blocks",
      "field": "page",
      "related_collection": "pages",
      "meta": { "one_field": "blocks" }
    },
    {
      "collection": "blocks",
      "field": "item",
      "meta": {
        "one_field": "usages",
        "one_collection_field": "collection",
        "one_allowed_collections": ["headings"]
      }
    }
  ]
}"#;

pub fn schema() -> SchemaOverview {
    SchemaOverview::from_json(SCHEMA_JSON).expect("fixture schema is valid")
}

/// Sequential aliases keep generated SQL stable across runs.
pub fn options(dialect: Dialect) -> CompilerOptions {
    CompilerOptions::default()
        .with_dialect(dialect)
        .with_alias_style(AliasStyle::Sequential)
}

pub async fn try_compile(collection: &str, query: Value, dialect: Dialect) -> QueryResult<Query> {
    let schema = schema();
    let spec = QuerySpec::try_from(query)?;
    Compiler::new(&schema)
        .with_options(options(dialect))
        .compile_query(collection, &spec)
        .await
}

/// Compile for `dialect` and check the output parses.
pub async fn compile_sql(collection: &str, query: Value, dialect: Dialect) -> String {
    let compiled = try_compile(collection, query, dialect)
        .await
        .unwrap_or_else(|e| panic!("compilation failed: {}", e));
    let sql = compiled.to_sql(dialect);
    validate_sql(&sql, dialect).unwrap();
    sql
}

pub async fn postgres(collection: &str, query: Value) -> String {
    compile_sql(collection, query, Dialect::Postgres).await
}
