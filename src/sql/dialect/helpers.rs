//! Building blocks shared by the dialect implementations: quoting, boolean
//! spelling, row windows, date normalisation and spatial predicates.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use super::super::expr::{func, lit_str, Expr, Literal};
use super::super::token::{Keyword, Token, TokenStream};
use super::{DateKind, DatePart};

// =============================================================================
// Quoting
// =============================================================================

/// Wrap `s` in `open`/`close`, doubling any embedded `close`.
fn enclose(s: &str, open: char, close: char) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push(open);
    for c in s.chars() {
        if c == close {
            out.push(close);
        }
        out.push(c);
    }
    out.push(close);
    out
}

/// `"name"`: Postgres, DuckDB, SQLite.
pub fn quote_double(ident: &str) -> String {
    enclose(ident, '"', '"')
}

/// `` `name` ``: MySQL.
pub fn quote_backtick(ident: &str) -> String {
    enclose(ident, '`', '`')
}

/// `[name]`: T-SQL.
pub fn quote_bracket(ident: &str) -> String {
    enclose(ident, '[', ']')
}

pub fn quote_string_single(s: &str) -> String {
    enclose(s, '\'', '\'')
}

/// `N'...'` so T-SQL compares against NVARCHAR columns without conversion.
pub fn quote_string_unicode(s: &str) -> String {
    format!("N{}", enclose(s, '\'', '\''))
}

/// MySQL treats backslash as an escape inside string literals.
pub fn quote_string_backslash(s: &str) -> String {
    enclose(&s.replace('\\', "\\\\"), '\'', '\'')
}

// =============================================================================
// Booleans
// =============================================================================

/// `true`/`false`: Postgres, DuckDB.
pub fn format_bool_literal(b: bool) -> &'static str {
    ["false", "true"][usize::from(b)]
}

/// `1`/`0`: T-SQL, MySQL, SQLite.
pub fn format_bool_numeric(b: bool) -> &'static str {
    ["0", "1"][usize::from(b)]
}

// =============================================================================
// Row Window
// =============================================================================

fn row_count(n: u64) -> Token {
    Token::Int(i64::try_from(n).unwrap_or(i64::MAX))
}

/// `LIMIT n OFFSET m`, either half omitted when unset.
pub fn emit_limit_offset_standard(limit: Option<u64>, offset: Option<u64>) -> TokenStream {
    let mut ts = TokenStream::new();
    if let Some(n) = limit {
        ts.kw(Keyword::Limit).space().push(row_count(n));
    }
    if let Some(m) = offset {
        if !ts.is_empty() {
            ts.space();
        }
        ts.kw(Keyword::Offset).space().push(row_count(m));
    }
    ts
}

/// `OFFSET m ROWS [FETCH NEXT n ROWS ONLY]`. The caller must have emitted an
/// ORDER BY.
pub fn emit_limit_offset_tsql(limit: Option<u64>, offset: Option<u64>) -> TokenStream {
    let mut ts = TokenStream::new();
    ts.kw(Keyword::Offset)
        .space()
        .push(row_count(offset.unwrap_or(0)))
        .space()
        .kw(Keyword::Rows);
    if let Some(n) = limit {
        ts.space()
            .kw(Keyword::FetchNext)
            .space()
            .push(row_count(n))
            .space()
            .kw(Keyword::Rows)
            .space()
            .kw(Keyword::Only);
    }
    ts
}

// MySQL rejects OFFSET without LIMIT; its manual suggests the largest
// unsigned BIGINT as an unbounded limit.
const MYSQL_UNBOUNDED: &str = "18446744073709551615";

pub fn emit_limit_offset_mysql(limit: Option<u64>, offset: Option<u64>) -> TokenStream {
    let (None, Some(m)) = (limit, offset) else {
        return emit_limit_offset_standard(limit, offset);
    };
    let mut ts = TokenStream::new();
    ts.kw(Keyword::Limit)
        .space()
        .push(Token::Raw(MYSQL_UNBOUNDED.to_string()))
        .space()
        .kw(Keyword::Offset)
        .space()
        .push(row_count(m));
    ts
}

// =============================================================================
// Date Parsing
// =============================================================================

/// Parse a date or date-time string in any of the accepted request formats.
///
/// Values with an offset are converted to UTC; plain dates are taken as midnight.
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc).naive_utc());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Parse a time-of-day string (`HH:MM[:SS[.fff]]`).
pub fn parse_time(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .ok()
}

/// Normalise a date-family value to a string literal.
///
/// `datetime_fmt` is used for `dateTime` columns and `timestamp_fmt` for
/// `timestamp` columns. Unparseable values are passed through untouched and
/// left for the database to reject.
pub fn format_date_value(
    value: &str,
    kind: DateKind,
    datetime_fmt: &str,
    timestamp_fmt: &str,
) -> Literal {
    let formatted = match kind {
        DateKind::Date => parse_datetime(value).map(|dt| dt.format("%Y-%m-%d").to_string()),
        DateKind::Time => parse_time(value).map(|t| t.format("%H:%M:%S").to_string()),
        DateKind::DateTime => parse_datetime(value).map(|dt| dt.format(datetime_fmt).to_string()),
        DateKind::Timestamp => {
            parse_datetime(value).map(|dt| dt.format(timestamp_fmt).to_string())
        }
    };
    Literal::String(formatted.unwrap_or_else(|| value.to_string()))
}

// =============================================================================
// Date Parts
// =============================================================================

/// `DATE_PART('<part>', expr)`.
/// Used by: Postgres, DuckDB
pub fn date_part_function(part: DatePart, expr: Expr) -> Expr {
    let name = match part {
        DatePart::Year => "year",
        DatePart::Month => "month",
        DatePart::Week => "week",
        DatePart::Day => "day",
        DatePart::Weekday => "dow",
        DatePart::Hour => "hour",
        DatePart::Minute => "minute",
        DatePart::Second => "second",
    };
    func("DATE_PART", vec![lit_str(name), expr])
}

// =============================================================================
// Spatial
// =============================================================================

/// `ST_GeomFromGeoJSON('<geojson>')`
pub fn geometry_from_geojson(geojson: &str) -> Expr {
    func("ST_GeomFromGeoJSON", vec![lit_str(geojson)])
}

/// `ST_Intersects(column, geometry)`, or the envelope comparison for bounding boxes.
/// Used by: Postgres (PostGIS), DuckDB (spatial extension)
pub fn st_intersects(column: Expr, geojson: &str, bbox: bool) -> Expr {
    let geometry = geometry_from_geojson(geojson);
    if bbox {
        func(
            "ST_Intersects",
            vec![
                func("ST_Envelope", vec![column]),
                func("ST_Envelope", vec![geometry]),
            ],
        )
    } else {
        func("ST_Intersects", vec![column, geometry])
    }
}
