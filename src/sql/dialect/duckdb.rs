//! DuckDB SQL dialect.
//!
//! DuckDB is PostgreSQL-compatible with extensions:
//! - ANSI identifier quoting (`"`)
//! - `VARCHAR` as the text cast target
//! - `spatial` extension for geometry predicates

use super::helpers;
use super::SqlDialect;
use crate::sql::expr::{func, Expr};

/// DuckDB SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct DuckDb;

impl SqlDialect for DuckDb {
    fn name(&self) -> &'static str {
        "duckdb"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_literal(b)
    }

    fn text_cast_type(&self) -> &'static str {
        "VARCHAR"
    }

    fn json_array_length(&self, expr: Expr) -> Option<Expr> {
        Some(func("JSON_ARRAY_LENGTH", vec![expr]))
    }

    fn spatial_intersects(&self, column: Expr, geojson: &str, bbox: bool) -> Option<Expr> {
        Some(helpers::st_intersects(column, geojson, bbox))
    }
}
