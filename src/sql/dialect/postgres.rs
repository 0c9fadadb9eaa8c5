//! PostgreSQL SQL dialect.
//!
//! PostgreSQL features:
//! - ANSI identifier quoting (`"`)
//! - Native boolean type (true/false)
//! - `DATE_PART` for date extraction
//! - PostGIS for spatial predicates

use super::helpers;
use super::SqlDialect;
use crate::sql::expr::{func, Expr};

/// PostgreSQL SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Postgres;

impl SqlDialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_literal(b)
    }

    // Uses default emit_limit_offset (LIMIT ... OFFSET ...)
    // Uses default date parsing and DATE_PART extraction

    fn json_array_length(&self, expr: Expr) -> Option<Expr> {
        Some(func("JSON_ARRAY_LENGTH", vec![expr]))
    }

    fn spatial_intersects(&self, column: Expr, geojson: &str, bbox: bool) -> Option<Expr> {
        Some(helpers::st_intersects(column, geojson, bbox))
    }
}
