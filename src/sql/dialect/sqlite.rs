//! SQLite SQL dialect.
//!
//! SQLite specifics:
//! - ANSI identifier quoting (`"`)
//! - No boolean type (1/0)
//! - `timestamp` columns hold epoch milliseconds
//! - Date parts through `STRFTIME`, which returns text
//! - JSON1 for array length, no spatial support

use super::helpers;
use super::{DateKind, DatePart, SqlDialect};
use crate::sql::expr::{cast, func, lit_int, lit_str, CastType, Expr, ExprExt, Literal};

/// SQLite SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Sqlite;

impl SqlDialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_numeric(b)
    }

    fn parse_date(&self, value: &str, kind: DateKind) -> Literal {
        match kind {
            DateKind::Timestamp => match helpers::parse_datetime(value) {
                Some(dt) => Literal::Int(dt.and_utc().timestamp_millis()),
                None => Literal::String(value.to_string()),
            },
            _ => helpers::format_date_value(value, kind, "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M:%S"),
        }
    }

    fn date_part(&self, part: DatePart, expr: Expr, kind: DateKind) -> Expr {
        let pattern = match part {
            DatePart::Year => "%Y",
            DatePart::Month => "%m",
            DatePart::Week => "%W",
            DatePart::Day => "%d",
            DatePart::Weekday => "%w",
            DatePart::Hour => "%H",
            DatePart::Minute => "%M",
            DatePart::Second => "%S",
        };
        let args = match kind {
            DateKind::Timestamp => vec![
                lit_str(pattern),
                expr.div(lit_int(1000)),
                lit_str("unixepoch"),
            ],
            _ => vec![lit_str(pattern), expr],
        };
        cast(func("STRFTIME", args), CastType::Integer)
    }

    fn json_array_length(&self, expr: Expr) -> Option<Expr> {
        Some(func("JSON_ARRAY_LENGTH", vec![expr]))
    }
}
