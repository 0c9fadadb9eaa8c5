//! MySQL SQL dialect.
//!
//! MySQL differences from ANSI:
//! - Backtick identifier quoting (`` `name` ``)
//! - Boolean is TINYINT(1), returns 1/0
//! - Backslash is an escape character inside string literals
//! - `OFFSET` is only valid after `LIMIT`
//! - `CAST(.. AS TEXT)` is not allowed, `CHAR(n)` is
//! - Date parts through dedicated functions (`YEAR()`, `DAYOFWEEK()`, ...)

use super::helpers;
use super::{DateKind, DatePart, SqlDialect};
use crate::sql::expr::{func, Expr, Literal};
use crate::sql::token::TokenStream;

/// MySQL SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct MySql;

impl SqlDialect for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_backtick(ident)
    }

    fn quote_string(&self, s: &str) -> String {
        helpers::quote_string_backslash(s)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_numeric(b)
    }

    fn emit_limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> TokenStream {
        helpers::emit_limit_offset_mysql(limit, offset)
    }

    fn text_cast_type(&self) -> &'static str {
        "CHAR(255)"
    }

    fn integer_cast_type(&self) -> &'static str {
        "SIGNED"
    }

    fn parse_date(&self, value: &str, kind: DateKind) -> Literal {
        helpers::format_date_value(value, kind, "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M:%S")
    }

    fn date_part(&self, part: DatePart, expr: Expr, _kind: DateKind) -> Expr {
        let name = match part {
            DatePart::Year => "YEAR",
            DatePart::Month => "MONTH",
            DatePart::Week => "WEEK",
            DatePart::Day => "DAYOFMONTH",
            DatePart::Weekday => "DAYOFWEEK",
            DatePart::Hour => "HOUR",
            DatePart::Minute => "MINUTE",
            DatePart::Second => "SECOND",
        };
        func(name, vec![expr])
    }

    fn json_array_length(&self, expr: Expr) -> Option<Expr> {
        Some(func("JSON_LENGTH", vec![expr]))
    }

    fn spatial_intersects(&self, column: Expr, geojson: &str, bbox: bool) -> Option<Expr> {
        let geometry = helpers::geometry_from_geojson(geojson);
        let name = if bbox { "MBRIntersects" } else { "ST_Intersects" };
        Some(func(name, vec![column, geometry]))
    }
}
