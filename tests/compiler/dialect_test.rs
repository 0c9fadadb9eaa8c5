//! Integration tests for dialect-specific rendering.
//!
//! Every query is compiled for each dialect and parsed back with sqlparser.

mod common;

use common::compile_sql;
use relq::sql::Dialect;
use serde_json::{json, Value};

const ALL_DIALECTS: [Dialect; 5] = [
    Dialect::Postgres,
    Dialect::MySql,
    Dialect::TSql,
    Dialect::Sqlite,
    Dialect::DuckDb,
];

fn corpus() -> Vec<(&'static str, Value)> {
    vec![
        (
            "articles",
            json!({ "filter": { "author": { "name": { "_eq": "Ada" } } }, "sort": "-views" }),
        ),
        (
            "articles",
            json!({ "filter": { "comments": { "_some": { "approved": { "_eq": true } } } } }),
        ),
        (
            "articles",
            json!({ "filter": { "published_on": { "_between": ["2024-01-01", "2024-12-31"] } } }),
        ),
        (
            "articles",
            json!({ "filter": { "month(published_on)": { "_in": "1,2,3" } }, "offset": 20 }),
        ),
        (
            "articles",
            json!({ "aggregate": { "count": "*", "max": "views" }, "group": "author.name" }),
        ),
        (
            "blocks",
            json!({ "filter": { "item:headings": { "text": { "_icontains": "intro" } } } }),
        ),
        ("headings", json!({ "filter": { "usages": { "_none": { "page": { "_eq": 1 } } } } })),
        ("authors", json!({ "search": "Ada", "limit": -1 })),
    ]
}

#[tokio::test]
async fn test_corpus_parses_in_every_dialect() {
    for dialect in ALL_DIALECTS {
        for (collection, query) in corpus() {
            // compile_sql validates the rendered SQL.
            compile_sql(collection, query, dialect).await;
        }
    }
}

#[tokio::test]
async fn test_tsql_pagination_and_quoting() {
    let sql = compile_sql(
        "articles",
        json!({ "filter": { "author": { "name": { "_eq": "Ada" } } } }),
        Dialect::TSql,
    )
    .await;

    insta::assert_snapshot!(sql, @r#"
    SELECT
      [articles].*
    FROM [articles]
    LEFT JOIN [authors] AS [j1] ON [articles].[author] = [j1].[id]
    WHERE [j1].[name] = 'Ada'
    ORDER BY (SELECT NULL)
    OFFSET 0 ROWS FETCH NEXT 100 ROWS ONLY
    "#);
}

#[tokio::test]
async fn test_mysql_quoting() {
    let sql = compile_sql(
        "articles",
        json!({ "filter": { "author": { "name": { "_eq": "Ada" } } } }),
        Dialect::MySql,
    )
    .await;

    insta::assert_snapshot!(sql, @r#"
    SELECT
      `articles`.*
    FROM `articles`
    LEFT JOIN `authors` AS `j1` ON `articles`.`author` = `j1`.`id`
    WHERE `j1`.`name` = 'Ada'
    LIMIT 100
    "#);
}

#[tokio::test]
async fn test_booleans_per_dialect() {
    let query = json!({ "filter": { "comments": { "_some": { "approved": { "_eq": "true" } } } } });

    let postgres = compile_sql("articles", query.clone(), Dialect::Postgres).await;
    assert!(postgres.contains("\"comments\".\"approved\" = true"));

    let tsql = compile_sql("articles", query, Dialect::TSql).await;
    assert!(tsql.contains("[comments].[approved] = 1"));
}

#[tokio::test]
async fn test_date_parts_per_dialect() {
    let query = json!({ "filter": { "year(published_on)": { "_eq": 2024 } } });

    let mysql = compile_sql("articles", query.clone(), Dialect::MySql).await;
    assert!(mysql.contains("YEAR(`articles`.`published_on`) = 2024"));

    let sqlite = compile_sql("articles", query.clone(), Dialect::Sqlite).await;
    assert!(sqlite.contains("CAST(STRFTIME('%Y', \"articles\".\"published_on\") AS INTEGER) = 2024"));

    let tsql = compile_sql("articles", query, Dialect::TSql).await;
    assert!(tsql.contains("DATEPART(year, [articles].[published_on]) = 2024"));
}

#[tokio::test]
async fn test_polymorphic_cast_per_dialect() {
    let query = json!({ "filter": { "item:headings": { "text": { "_eq": "Intro" } } } });

    let duckdb = compile_sql("blocks", query.clone(), Dialect::DuckDb).await;
    assert!(duckdb.contains("CAST(\"j1\".\"id\" AS VARCHAR)"));

    let tsql = compile_sql("blocks", query, Dialect::TSql).await;
    assert!(tsql.contains("CAST([j1].[id] AS NVARCHAR(255))"));
}
