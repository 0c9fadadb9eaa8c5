//! T-SQL (SQL Server / Azure SQL) dialect.
//!
//! T-SQL has significant differences from ANSI:
//! - Square bracket identifier quoting (`[name]`)
//! - No boolean literals (1/0)
//! - OFFSET FETCH for pagination (requires ORDER BY)
//! - N'...' prefix for Unicode strings
//! - `DATEPART(<part>, expr)` for date extraction
//! - No GeoJSON input for geometry, so spatial operators are unsupported

use super::helpers;
use super::{DateKind, DatePart, SqlDialect};
use crate::sql::expr::{func, raw_sql, Expr, Literal};
use crate::sql::token::TokenStream;

/// T-SQL (SQL Server) dialect.
#[derive(Debug, Clone, Copy)]
pub struct TSql;

impl SqlDialect for TSql {
    fn name(&self) -> &'static str {
        "tsql"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_bracket(ident)
    }

    fn quote_string(&self, s: &str) -> String {
        // N prefix only where the literal needs it
        if !s.is_ascii() {
            helpers::quote_string_unicode(s)
        } else {
            helpers::quote_string_single(s)
        }
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_numeric(b)
    }

    fn emit_limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> TokenStream {
        helpers::emit_limit_offset_tsql(limit, offset)
    }

    fn requires_order_by_for_offset(&self) -> bool {
        true
    }

    fn text_cast_type(&self) -> &'static str {
        "NVARCHAR(255)"
    }

    fn integer_cast_type(&self) -> &'static str {
        "INT"
    }

    fn parse_date(&self, value: &str, kind: DateKind) -> Literal {
        // ISO 8601 with the T separator is read the same under every DATEFORMAT
        helpers::format_date_value(value, kind, "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.3f")
    }

    fn date_part(&self, part: DatePart, expr: Expr, _kind: DateKind) -> Expr {
        let name = match part {
            DatePart::Year => "year",
            DatePart::Month => "month",
            DatePart::Week => "week",
            DatePart::Day => "day",
            DatePart::Weekday => "weekday",
            DatePart::Hour => "hour",
            DatePart::Minute => "minute",
            DatePart::Second => "second",
        };
        func("DATEPART", vec![raw_sql(name), expr])
    }
}
