//! Per-backend rendering rules.
//!
//! [`SqlDialect`] collects every point where the five supported backends
//! disagree. [`Dialect`] is the serializable selector used in options and
//! config files; it forwards to the unit struct for each backend.
//!
//! | Capability | Postgres | MySQL | SQL Server | SQLite | DuckDB |
//! |------------|----------|-------|------------|--------|--------|
//! | `_intersects` family | PostGIS | yes | no | no | spatial ext. |
//! | `count(<json field>)` | yes | yes | no | JSON1 | yes |
//!
//! Filters that need a missing capability fail with
//! `QueryError::UnsupportedByDialect`.

mod duckdb;
pub mod helpers;
mod mysql;
mod postgres;
mod sqlite;
mod tsql;

use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use duckdb::DuckDb;
pub use mysql::MySql;
pub use postgres::Postgres;
pub use sqlite::Sqlite;
pub use tsql::TSql;

use super::expr::{Expr, Literal};
use super::token::TokenStream;

/// Column families that go through the dialect's date parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateKind {
    Date,
    Time,
    DateTime,
    Timestamp,
}

/// Parts a date/time function column can extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePart {
    Year,
    Month,
    Week,
    Day,
    Weekday,
    Hour,
    Minute,
    Second,
}

pub trait SqlDialect: std::fmt::Debug {
    fn name(&self) -> &'static str;

    fn quote_identifier(&self, ident: &str) -> String;

    fn quote_string(&self, s: &str) -> String {
        helpers::quote_string_single(s)
    }

    fn format_bool(&self, b: bool) -> &'static str;

    /// Render the row window. Defaults to `LIMIT n OFFSET m`.
    fn emit_limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> TokenStream {
        helpers::emit_limit_offset_standard(limit, offset)
    }

    /// Whether a row window is only legal after an ORDER BY.
    fn requires_order_by_for_offset(&self) -> bool {
        false
    }

    /// Type both sides of a polymorphic key comparison are cast to.
    fn text_cast_type(&self) -> &'static str {
        "TEXT"
    }

    fn integer_cast_type(&self) -> &'static str {
        "INTEGER"
    }

    /// Turn a request date value into a literal this backend compares correctly.
    fn parse_date(&self, value: &str, kind: DateKind) -> Literal {
        helpers::format_date_value(value, kind, "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.3fZ")
    }

    /// Extract `part` from a date/time column as a number.
    fn date_part(&self, part: DatePart, expr: Expr, _kind: DateKind) -> Expr {
        helpers::date_part_function(part, expr)
    }

    /// Length of the JSON array stored in `expr`, if the backend can compute it.
    fn json_array_length(&self, _expr: Expr) -> Option<Expr> {
        None
    }

    /// Intersection between a geometry column and a GeoJSON literal; `bbox`
    /// compares bounding boxes only. `None` when the backend has no spatial
    /// support.
    fn spatial_intersects(&self, _column: Expr, _geojson: &str, _bbox: bool) -> Option<Expr> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Postgres,
    MySql,
    #[serde(alias = "mssql")]
    TSql,
    Sqlite,
    DuckDb,
}

impl Dialect {
    pub fn dialect(&self) -> &'static dyn SqlDialect {
        match self {
            Dialect::Postgres => &Postgres,
            Dialect::MySql => &MySql,
            Dialect::TSql => &TSql,
            Dialect::Sqlite => &Sqlite,
            Dialect::DuckDb => &DuckDb,
        }
    }
}

impl SqlDialect for Dialect {
    fn name(&self) -> &'static str {
        self.dialect().name()
    }

    fn quote_identifier(&self, ident: &str) -> String {
        self.dialect().quote_identifier(ident)
    }

    fn quote_string(&self, s: &str) -> String {
        self.dialect().quote_string(s)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        self.dialect().format_bool(b)
    }

    fn emit_limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> TokenStream {
        self.dialect().emit_limit_offset(limit, offset)
    }

    fn requires_order_by_for_offset(&self) -> bool {
        self.dialect().requires_order_by_for_offset()
    }

    fn text_cast_type(&self) -> &'static str {
        self.dialect().text_cast_type()
    }

    fn integer_cast_type(&self) -> &'static str {
        self.dialect().integer_cast_type()
    }

    fn parse_date(&self, value: &str, kind: DateKind) -> Literal {
        self.dialect().parse_date(value, kind)
    }

    fn date_part(&self, part: DatePart, expr: Expr, kind: DateKind) -> Expr {
        self.dialect().date_part(part, expr, kind)
    }

    fn json_array_length(&self, expr: Expr) -> Option<Expr> {
        self.dialect().json_array_length(expr)
    }

    fn spatial_intersects(&self, column: Expr, geojson: &str, bbox: bool) -> Option<Expr> {
        self.dialect().spatial_intersects(column, geojson, bbox)
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.dialect().name())
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Dialect::Postgres),
            "mysql" | "mariadb" => Ok(Dialect::MySql),
            "tsql" | "mssql" | "sqlserver" => Ok(Dialect::TSql),
            "sqlite" | "sqlite3" => Ok(Dialect::Sqlite),
            "duckdb" => Ok(Dialect::DuckDb),
            other => Err(format!("unknown SQL dialect '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::expr::table_col;

    #[test]
    fn test_dialect_display() {
        assert_eq!(Dialect::DuckDb.to_string(), "duckdb");
        assert_eq!(Dialect::Postgres.to_string(), "postgres");
        assert_eq!(Dialect::TSql.to_string(), "tsql");
        assert_eq!(Dialect::MySql.to_string(), "mysql");
        assert_eq!(Dialect::Sqlite.to_string(), "sqlite");
    }

    #[test]
    fn test_dialect_from_str() {
        assert_eq!("PostgreSQL".parse::<Dialect>(), Ok(Dialect::Postgres));
        assert_eq!("mssql".parse::<Dialect>(), Ok(Dialect::TSql));
        assert_eq!("sqlite3".parse::<Dialect>(), Ok(Dialect::Sqlite));
        assert!("oracle".parse::<Dialect>().is_err());
    }

    #[test]
    fn test_quote_identifier_escaping() {
        assert_eq!(
            Dialect::Sqlite.quote_identifier("weird\"name"),
            "\"weird\"\"name\""
        );
        assert_eq!(
            Dialect::TSql.quote_identifier("weird]name"),
            "[weird]]name]"
        );
        assert_eq!(
            Dialect::MySql.quote_identifier("weird`name"),
            "`weird``name`"
        );
    }

    #[test]
    fn test_format_bool() {
        assert_eq!(Dialect::DuckDb.format_bool(true), "true");
        assert_eq!(Dialect::Postgres.format_bool(false), "false");
        assert_eq!(Dialect::TSql.format_bool(true), "1");
        assert_eq!(Dialect::MySql.format_bool(false), "0");
        assert_eq!(Dialect::Sqlite.format_bool(true), "1");
    }

    #[test]
    fn test_text_cast_type() {
        assert_eq!(Dialect::Postgres.text_cast_type(), "TEXT");
        assert_eq!(Dialect::MySql.text_cast_type(), "CHAR(255)");
        assert_eq!(Dialect::TSql.text_cast_type(), "NVARCHAR(255)");
        assert_eq!(Dialect::Sqlite.text_cast_type(), "TEXT");
        assert_eq!(Dialect::DuckDb.text_cast_type(), "VARCHAR");
    }

    #[test]
    fn test_parse_date_per_dialect() {
        let value = "2024-03-09T14:30:00Z";
        assert_eq!(
            Dialect::Postgres.parse_date(value, DateKind::Timestamp),
            Literal::String("2024-03-09T14:30:00.000Z".into())
        );
        assert_eq!(
            Dialect::MySql.parse_date(value, DateKind::Timestamp),
            Literal::String("2024-03-09 14:30:00".into())
        );
        assert_eq!(
            Dialect::Sqlite.parse_date(value, DateKind::Timestamp),
            Literal::Int(1_709_994_600_000)
        );
        assert_eq!(
            Dialect::Sqlite.parse_date(value, DateKind::DateTime),
            Literal::String("2024-03-09 14:30:00".into())
        );
    }

    #[test]
    fn test_date_part_per_dialect() {
        let column = || table_col("articles", "published_on");
        assert_eq!(
            Dialect::Postgres
                .date_part(DatePart::Year, column(), DateKind::Date)
                .to_sql(Dialect::Postgres),
            "DATE_PART('year', \"articles\".\"published_on\")"
        );
        assert_eq!(
            Dialect::MySql
                .date_part(DatePart::Weekday, column(), DateKind::Date)
                .to_sql(Dialect::MySql),
            "DAYOFWEEK(`articles`.`published_on`)"
        );
        assert_eq!(
            Dialect::TSql
                .date_part(DatePart::Month, column(), DateKind::Date)
                .to_sql(Dialect::TSql),
            "DATEPART(month, [articles].[published_on])"
        );
        assert_eq!(
            Dialect::Sqlite
                .date_part(DatePart::Year, column(), DateKind::Date)
                .to_sql(Dialect::Sqlite),
            "CAST(STRFTIME('%Y', \"articles\".\"published_on\") AS INTEGER)"
        );
    }

    #[test]
    fn test_spatial_support() {
        let geojson = r#"{"type":"Point","coordinates":[1,2]}"#;
        let column = || table_col("places", "location");
        assert!(Dialect::Postgres
            .spatial_intersects(column(), geojson, false)
            .is_some());
        assert!(Dialect::MySql
            .spatial_intersects(column(), geojson, true)
            .is_some());
        assert!(Dialect::Sqlite
            .spatial_intersects(column(), geojson, false)
            .is_none());
        assert!(Dialect::TSql
            .spatial_intersects(column(), geojson, false)
            .is_none());
    }
}
