//! Filter value coercion.
//!
//! Request values arrive as JSON. Before an operator builds its predicate
//! they are split (comma lists), dated through the dialect's parser or
//! turned into numbers, depending on what the target column holds.

use serde_json::{Number, Value};

use super::column::ResolvedColumn;
use crate::query::{Arity, Operator};
use crate::schema::FieldType;
use crate::sql::{DateKind, Dialect, Literal, SqlDialect};

/// What a column's values should be coerced to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ValueKind {
    Number,
    Date(DateKind),
    Boolean,
    Geometry,
    Plain,
}

impl ValueKind {
    pub fn of(column: &ResolvedColumn) -> Self {
        if column.function.is_some() {
            return ValueKind::Number;
        }
        if let Some(kind) = column.field_type.date_kind() {
            return ValueKind::Date(kind);
        }
        match column.field_type {
            t if t.is_numeric() => ValueKind::Number,
            FieldType::Boolean => ValueKind::Boolean,
            FieldType::Geometry => ValueKind::Geometry,
            _ => ValueKind::Plain,
        }
    }
}

/// Coerce the value of one comparison into literals for `operator`.
pub(super) fn coerce_values(
    value: &Value,
    operator: Operator,
    kind: ValueKind,
    dialect: Dialect,
) -> Vec<Literal> {
    let items: Vec<Value> = match (operator.arity(), value) {
        (Arity::List | Arity::Pair, Value::String(s)) => s
            .split(',')
            .map(|part| Value::String(part.trim().to_string()))
            .collect(),
        (Arity::List | Arity::Pair, Value::Array(items)) => items.clone(),
        (_, other) => vec![other.clone()],
    };

    items
        .iter()
        .filter(|item| !item.is_null())
        .map(|item| coerce_value(item, kind, dialect))
        .collect()
}

fn coerce_value(value: &Value, kind: ValueKind, dialect: Dialect) -> Literal {
    match (kind, value) {
        (ValueKind::Number, Value::String(s)) => parse_number(s),
        (ValueKind::Date(kind), Value::String(s)) => dialect.parse_date(s, kind),
        (ValueKind::Boolean, Value::String(s)) => match s.as_str() {
            "true" | "1" => Literal::Bool(true),
            "false" | "0" => Literal::Bool(false),
            _ => Literal::String(s.clone()),
        },
        (ValueKind::Geometry, Value::Object(_) | Value::Array(_)) => {
            Literal::String(value.to_string())
        }
        (_, Value::String(s)) => Literal::String(s.clone()),
        (_, Value::Number(n)) => number_literal(n),
        (_, Value::Bool(b)) => Literal::Bool(*b),
        (_, Value::Null) => Literal::Null,
        (_, Value::Array(_) | Value::Object(_)) => Literal::String(value.to_string()),
    }
}

/// Numeric parse, leaving unparsable text as a string.
fn parse_number(s: &str) -> Literal {
    let trimmed = s.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        return Literal::Int(n);
    }
    match trimmed.parse::<f64>() {
        Ok(f) if f.is_finite() => Literal::Float(f),
        _ => Literal::String(s.to_string()),
    }
}

fn number_literal(n: &Number) -> Literal {
    match n.as_i64() {
        Some(i) => Literal::Int(i),
        None => Literal::Float(n.as_f64().unwrap_or_default()),
    }
}

/// Flag of a no-value operator: `{"_null": false}` negates it.
pub(super) fn operator_enabled(value: Option<&Value>) -> bool {
    match value {
        None => true,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !matches!(s.as_str(), "false" | "0"),
        Some(Value::Number(n)) => n.as_f64() != Some(0.0),
        Some(_) => true,
    }
}
