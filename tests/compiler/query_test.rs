//! Integration tests for sorting, grouping, aggregation, search and
//! pagination.

mod common;

use common::{postgres, schema, try_compile};
use relq::compiler::Compiler;
use relq::error::QueryError;
use relq::query::QuerySpec;
use relq::sql::Dialect;
use serde_json::json;

// ============================================================================
// Sort and Pagination
// ============================================================================

#[tokio::test]
async fn test_sort_with_page() {
    let sql = postgres(
        "articles",
        json!({ "sort": "-views,title", "limit": 10, "page": 3 }),
    )
    .await;

    insta::assert_snapshot!(sql, @r#"
    SELECT
      "articles".*
    FROM "articles"
    ORDER BY "articles"."views" DESC, "articles"."title" ASC
    LIMIT 10 OFFSET 20
    "#);
}

#[tokio::test]
async fn test_sort_by_related_field() {
    let sql = postgres("comments", json!({ "sort": ["-article.author.name"] })).await;

    assert!(sql.contains("LEFT JOIN \"articles\" AS \"j1\" ON \"comments\".\"article\" = \"j1\".\"id\""));
    assert!(sql.contains("LEFT JOIN \"authors\" AS \"j2\" ON \"j1\".\"author\" = \"j2\".\"id\""));
    assert!(sql.contains("ORDER BY \"j2\".\"name\" DESC"));
}

#[tokio::test]
async fn test_pagination_defaults_and_caps() {
    let unlimited = postgres("articles", json!({ "limit": -1 })).await;
    assert!(!unlimited.contains("LIMIT"));

    let offset = postgres("articles", json!({ "offset": "5" })).await;
    assert!(offset.ends_with("LIMIT 100 OFFSET 5"));

    let schema = schema();
    let capped = Compiler::new(&schema)
        .with_options(common::options(Dialect::Postgres).with_max_limit(50))
        .compile_query("articles", &QuerySpec::new().with_limit(500))
        .await
        .unwrap();
    assert!(capped.to_sql(Dialect::Postgres).ends_with("LIMIT 50"));
}

#[tokio::test]
async fn test_negative_offset_is_rejected() {
    let err = try_compile("articles", json!({ "offset": -1 }), Dialect::Postgres)
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::InvalidQuery(_)));
}

// ============================================================================
// Aggregate and Group
// ============================================================================

#[tokio::test]
async fn test_grouped_aggregate_over_join() {
    let sql = postgres(
        "articles",
        json!({
            "aggregate": { "count": "*", "sum": "views" },
            "groupBy": ["author.name"]
        }),
    )
    .await;

    insta::assert_snapshot!(sql, @r#"
    SELECT
      "j1"."name" AS "author.name",
      COUNT(DISTINCT "articles"."id") AS "count",
      SUM("articles"."views") AS "sum->.views"
    FROM "articles"
    LEFT JOIN "authors" AS "j1" ON "articles"."author" = "j1"."id"
    GROUP BY "j1"."name"
    LIMIT 100
    "#);
}

#[tokio::test]
async fn test_aggregate_without_joins() {
    let sql = postgres(
        "articles",
        json!({ "aggregate": { "count": "*", "countAll": "*", "avgDistinct": ["rating"], "min": "published_on" } }),
    )
    .await;

    assert!(sql.contains("COUNT(*) AS \"count\""));
    assert!(sql.contains("COUNT(*) AS \"countAll\""));
    assert!(sql.contains("AVG(DISTINCT \"articles\".\"rating\") AS \"avgDistinct->.rating\""));
    assert!(sql.contains("MIN(\"articles\".\"published_on\") AS \"min->.published_on\""));
    assert!(!sql.contains("\"articles\".*"));
}

#[tokio::test]
async fn test_unknown_aggregate_function() {
    let err = try_compile(
        "articles",
        json!({ "aggregate": { "median": "views" } }),
        Dialect::Postgres,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, QueryError::InvalidQuery(_)));
}

// ============================================================================
// Function Columns
// ============================================================================

#[tokio::test]
async fn test_count_of_json_array() {
    let sql = postgres("articles", json!({ "filter": { "count(tags)": { "_gt": 2 } } })).await;
    assert!(sql.contains("JSON_ARRAY_LENGTH(\"articles\".\"tags\") > 2"));

    let err = try_compile(
        "articles",
        json!({ "filter": { "count(tags)": { "_gt": 2 } } }),
        Dialect::TSql,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, QueryError::UnsupportedByDialect { .. }));
}

#[tokio::test]
async fn test_count_of_related_rows() {
    let sql = postgres("articles", json!({ "sort": ["-count(comments)"] })).await;
    assert!(sql.contains("COUNT(*)"));
    assert!(sql.contains("DESC"));
}

#[tokio::test]
async fn test_invalid_function_for_type() {
    let err = try_compile(
        "articles",
        json!({ "filter": { "hour(published_on)": { "_eq": 3 } } }),
        Dialect::Postgres,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, QueryError::InvalidFunction { .. }));
}

// ============================================================================
// Search
// ============================================================================

#[tokio::test]
async fn test_search_skips_concealed_and_alias_fields() {
    let sql = postgres("authors", json!({ "search": "Ada" })).await;

    assert!(sql.contains("WHERE LOWER(\"authors\".\"name\") LIKE '%ada%'"));
    assert!(!sql.contains("password"));
    assert!(!sql.contains("\"authors\".\"id\" ="));
}

#[tokio::test]
async fn test_search_combines_with_filter() {
    let sql = postgres(
        "articles",
        json!({ "search": "7", "filter": { "author": { "name": { "_eq": "Ada" } } } }),
    )
    .await;

    assert!(sql.contains(
        "WHERE (\"articles\".\"id\" = 7 OR LOWER(\"articles\".\"title\") LIKE '%7%' \
         OR \"articles\".\"views\" = 7 OR \"articles\".\"rating\" = 7.0 \
         OR \"articles\".\"author\" = 7) AND \"j1\".\"name\" = 'Ada'"
    ));
}
