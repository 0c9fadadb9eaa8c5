//! Integration tests for filter compilation: relational joins, existential
//! subqueries and operator validation.

mod common;

use common::{postgres, schema, try_compile};
use relq::compiler::Compiler;
use relq::error::QueryError;
use relq::query::QuerySpec;
use relq::sql::{Dialect, Query, TableRef};
use serde_json::json;

fn where_sql(query: &Query) -> Option<String> {
    query
        .where_clause
        .as_ref()
        .map(|w| w.to_sql(Dialect::Postgres))
}

// ============================================================================
// Relational Paths
// ============================================================================

#[tokio::test]
async fn test_many_to_one_filter_joins_once() {
    let sql = postgres(
        "articles",
        json!({ "filter": { "author": { "name": { "_eq": "Ada" } } } }),
    )
    .await;

    insta::assert_snapshot!(sql, @r#"
    SELECT
      "articles".*
    FROM "articles"
    LEFT JOIN "authors" AS "j1" ON "articles"."author" = "j1"."id"
    WHERE "j1"."name" = 'Ada'
    LIMIT 100
    "#);
}

#[tokio::test]
async fn test_shared_prefix_reuses_join() {
    let query = try_compile(
        "articles",
        json!({
            "filter": { "author": { "name": { "_starts_with": "A" } } },
            "sort": ["author.name"]
        }),
        Dialect::Postgres,
    )
    .await
    .unwrap();

    assert_eq!(query.joins.len(), 1);
}

#[tokio::test]
async fn test_many_to_any_filter_needs_scope() {
    let err = try_compile(
        "blocks",
        json!({ "filter": { "item": { "text": { "_eq": "Intro" } } } }),
        Dialect::Postgres,
    )
    .await
    .unwrap_err();

    assert!(
        matches!(err, QueryError::MissingPolymorphicScope { ref collection, ref field }
            if collection == "blocks" && field == "item"),
        "unexpected error: {:?}",
        err
    );
}

#[tokio::test]
async fn test_many_to_any_filter_with_scope() {
    let sql = postgres(
        "blocks",
        json!({ "filter": { "item:headings": { "text": { "_eq": "Intro" } } } }),
    )
    .await;

    insta::assert_snapshot!(sql, @r#"
    SELECT
      "blocks".*
    FROM "blocks"
    LEFT JOIN "headings" AS "j1" ON "blocks"."collection" = 'headings' AND "blocks"."item" = CAST("j1"."id" AS TEXT)
    WHERE "j1"."text" = 'Intro'
    LIMIT 100
    "#);
}

// ============================================================================
// Existential Subqueries
// ============================================================================

#[tokio::test]
async fn test_some_becomes_in_subquery() {
    let sql = postgres(
        "articles",
        json!({ "filter": { "comments": { "_some": { "approved": { "_eq": true } } } } }),
    )
    .await;

    insta::assert_snapshot!(sql, @r#"
    SELECT
      "articles".*
    FROM "articles"
    WHERE "articles"."id" IN (SELECT
      "comments"."article"
    FROM "comments"
    WHERE "comments"."article" IS NOT NULL AND "comments"."approved" = true)
    LIMIT 100
    "#);
}

#[tokio::test]
async fn test_none_becomes_not_in_subquery() {
    let sql = postgres(
        "articles",
        json!({ "filter": { "comments": { "_none": { "body": { "_icontains": "spam" } } } } }),
    )
    .await;

    assert!(sql.contains("\"articles\".\"id\" NOT IN (SELECT"));
    assert!(sql.contains("LOWER(\"comments\".\"body\") LIKE '%spam%'"));
    assert!(!sql.contains("JOIN"));
}

#[tokio::test]
async fn test_bare_nested_to_many_filter_means_some() {
    let implicit = postgres(
        "articles",
        json!({ "filter": { "comments": { "approved": { "_eq": true } } } }),
    )
    .await;
    let explicit = postgres(
        "articles",
        json!({ "filter": { "comments": { "_some": { "approved": { "_eq": true } } } } }),
    )
    .await;

    assert_eq!(implicit, explicit);
}

#[tokio::test]
async fn test_quantifier_below_many_to_one_uses_parent_alias() {
    let sql = postgres(
        "comments",
        json!({ "filter": { "article": { "comments": { "_none": { "approved": { "_eq": false } } } } } }),
    )
    .await;

    assert!(sql.contains("LEFT JOIN \"articles\" AS \"j1\""));
    assert!(sql.contains("\"j1\".\"id\" NOT IN (SELECT"));
}

#[tokio::test]
async fn test_one_to_any_subquery_checks_discriminator() {
    let sql = postgres(
        "headings",
        json!({ "filter": { "usages": { "_some": { "page": { "_eq": 3 } } } } }),
    )
    .await;

    assert!(sql.contains("CAST(\"headings\".\"id\" AS TEXT) IN (SELECT"));
    assert!(sql.contains(
        "WHERE \"blocks\".\"item\" IS NOT NULL AND \"blocks\".\"collection\" = 'headings' \
         AND \"blocks\".\"page\" = 3"
    ));
}

#[tokio::test]
async fn test_relational_filter_inside_subquery_joins() {
    let sql = postgres(
        "authors",
        json!({ "filter": { "articles": { "_some": { "comments": { "_some": { "approved": { "_eq": true } } } } } } }),
    )
    .await;

    // Outer subquery on articles, inner one on comments.
    assert_eq!(sql.matches("IN (SELECT").count(), 2);
}

#[tokio::test]
async fn test_multi_relational_flag() {
    let schema = schema();
    let compiler = Compiler::new(&schema).with_options(common::options(Dialect::Postgres));

    let nested = QuerySpec::try_from(json!({
        "filter": { "article": { "author": { "name": { "_eq": "Ada" } } } }
    }))
    .unwrap();
    let applied = compiler
        .apply_query("comments", Query::new().from(TableRef::new("comments")), &nested, false)
        .await
        .unwrap();
    assert!(applied.has_joins);
    assert!(!applied.has_multi_relational_filter);

    let to_many = QuerySpec::try_from(json!({
        "filter": { "author": { "articles": { "title": { "_eq": "Intro" } } } }
    }))
    .unwrap();
    let applied = compiler
        .apply_query("articles", Query::new().from(TableRef::new("articles")), &to_many, false)
        .await
        .unwrap();
    assert!(applied.has_multi_relational_filter);
}

// ============================================================================
// Logical Groups
// ============================================================================

#[tokio::test]
async fn test_or_group_is_parenthesized() {
    let query = try_compile(
        "articles",
        json!({
            "filter": {
                "_or": [
                    { "title": { "_icontains": "Rust" } },
                    { "views": { "_gte": 100 } }
                ],
                "published_on": { "_nnull": true }
            }
        }),
        Dialect::Postgres,
    )
    .await
    .unwrap();

    assert_eq!(
        where_sql(&query).unwrap(),
        "((LOWER(\"articles\".\"title\") LIKE '%rust%') OR (\"articles\".\"views\" >= 100)) \
         AND \"articles\".\"published_on\" IS NOT NULL"
    );
}

#[tokio::test]
async fn test_or_with_empty_branch_matches_everything() {
    let query = try_compile(
        "articles",
        json!({ "filter": { "_or": [{}, { "views": { "_eq": 1 } }] } }),
        Dialect::Postgres,
    )
    .await
    .unwrap();

    assert!(query.where_clause.is_none());
}

#[tokio::test]
async fn test_null_value_drops_clause() {
    let query = try_compile(
        "articles",
        json!({ "filter": { "title": { "_eq": null }, "views": { "_gt": 5 } } }),
        Dialect::Postgres,
    )
    .await
    .unwrap();

    assert_eq!(where_sql(&query).unwrap(), "\"articles\".\"views\" > 5");
}

// ============================================================================
// Operators and Values
// ============================================================================

#[tokio::test]
async fn test_list_operators_accept_comma_strings() {
    let from_string = try_compile(
        "articles",
        json!({ "filter": { "views": { "_in": "1,2,3" } } }),
        Dialect::Postgres,
    )
    .await
    .unwrap();
    let from_array = try_compile(
        "articles",
        json!({ "filter": { "views": { "_in": [1, 2, 3] } } }),
        Dialect::Postgres,
    )
    .await
    .unwrap();

    assert_eq!(where_sql(&from_string), where_sql(&from_array));
    assert_eq!(
        where_sql(&from_string).unwrap(),
        "\"articles\".\"views\" IN (1, 2, 3)"
    );
}

#[tokio::test]
async fn test_between_and_empty_in() {
    let between = postgres(
        "articles",
        json!({ "filter": { "views": { "_between": "10,20" } } }),
    )
    .await;
    assert!(between.contains("\"articles\".\"views\" BETWEEN 10 AND 20"));

    let empty = postgres("articles", json!({ "filter": { "views": { "_in": [] } } })).await;
    assert!(empty.contains("WHERE 1 = 0"));
}

#[tokio::test]
async fn test_null_operator_negation() {
    let sql = postgres("articles", json!({ "filter": { "title": { "_null": false } } })).await;
    assert!(sql.contains("\"articles\".\"title\" IS NOT NULL"));
}

#[tokio::test]
async fn test_date_function_filter() {
    let sql = postgres(
        "articles",
        json!({ "filter": { "year(published_on)": { "_eq": "2024" } } }),
    )
    .await;
    assert!(sql.contains("DATE_PART('year', \"articles\".\"published_on\") = 2024"));
}

#[tokio::test]
async fn test_operator_not_allowed_for_type() {
    let err = try_compile(
        "articles",
        json!({ "filter": { "views": { "_contains": "1" } } }),
        Dialect::Postgres,
    )
    .await
    .unwrap_err();

    assert!(
        matches!(err, QueryError::OperatorNotAllowedForType { ref field, ref operator, .. }
            if field == "views" && operator == "_contains"),
        "unexpected error: {:?}",
        err
    );
}

#[tokio::test]
async fn test_concealed_field_only_allows_presence_checks() {
    let err = try_compile(
        "articles",
        json!({ "filter": { "author": { "password": { "_eq": "hunter2" } } } }),
        Dialect::Postgres,
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err,
        QueryError::OperatorNotAllowedForConcealedField { .. }
    ));

    let sql = postgres(
        "articles",
        json!({ "filter": { "author": { "password": { "_nnull": true } } } }),
    )
    .await;
    assert!(sql.contains("\"j1\".\"password\" IS NOT NULL"));
}

#[tokio::test]
async fn test_unknown_names_are_rejected() {
    let err = try_compile(
        "articles",
        json!({ "filter": { "subtitle": { "_eq": "x" } } }),
        Dialect::Postgres,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, QueryError::UnknownField { .. }));

    let err = try_compile(
        "articles",
        json!({ "filter": { "title": { "_regex": "^a" } } }),
        Dialect::Postgres,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, QueryError::UnknownOperator(_)));

    let err = try_compile("drafts", json!({}), Dialect::Postgres)
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::UnknownCollection(ref c) if c == "drafts"));
}
