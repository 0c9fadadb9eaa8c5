//! Typed filter tree parsed from request JSON.
//!
//! ```json
//! {
//!   "_or": [
//!     { "status": { "_eq": "published" } },
//!     { "author": { "name": { "_icontains": "ada" } } }
//!   ],
//!   "comments": { "_some": { "approved": true } }
//! }
//! ```

use serde_json::{Map, Value};

use super::operator::Operator;
use crate::error::{QueryError, QueryResult};

/// A filter object. Its clauses are ANDed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub clauses: Vec<Clause>,
}

/// One key of a filter object.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    And(Vec<Filter>),
    Or(Vec<Filter>),
    /// `field: ...`, where `field` may be a `:scope`d or `func(field)` segment.
    Field(String, FieldFilter),
}

/// What a field key maps to.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldFilter {
    /// `{ "_gt": 1, "_lt": 5 }` or a bare value (implicit `_eq`).
    Compare(Vec<Comparison>),
    /// `{ "_some": {...} }` / `{ "_none": {...} }` on a to-many relation.
    Quantified(Quantifier, Filter),
    /// A filter against the related collection.
    Nested(Filter),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub operator: Operator,
    /// `None` when the request passed `null`; arrays have their nulls removed.
    pub value: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    Some,
    None,
}

impl Filter {
    /// The empty filter, which restricts nothing.
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

impl TryFrom<Value> for Filter {
    type Error = QueryError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Filter::try_from(&value)
    }
}

impl TryFrom<&Value> for Filter {
    type Error = QueryError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => parse_filter(map),
            // Filters often arrive as a JSON string in query parameters.
            Value::String(s) => {
                let parsed: Value = serde_json::from_str(s)
                    .map_err(|e| QueryError::InvalidFilter(format!("filter is not valid JSON: {}", e)))?;
                match parsed {
                    Value::String(_) => Err(QueryError::InvalidFilter(
                        "filter must be an object".to_string(),
                    )),
                    other => Filter::try_from(&other),
                }
            }
            other => Err(QueryError::InvalidFilter(format!(
                "filter must be an object, got {}",
                other
            ))),
        }
    }
}

fn parse_filter(map: &Map<String, Value>) -> QueryResult<Filter> {
    let mut clauses = Vec::with_capacity(map.len());

    for (key, value) in map {
        let clause = match key.as_str() {
            "_and" => Clause::And(parse_children(key, value)?),
            "_or" => Clause::Or(parse_children(key, value)?),
            "_some" | "_none" => {
                return Err(QueryError::InvalidFilter(format!(
                    "\"{}\" must follow a relational field",
                    key
                )))
            }
            k if k.starts_with('_') => {
                // Validate the key so typos surface as unknown operators.
                let operator: Operator = k.parse()?;
                return Err(QueryError::InvalidFilter(format!(
                    "operator \"{}\" must follow a field",
                    operator
                )));
            }
            field => Clause::Field(field.to_string(), parse_field_filter(value)?),
        };
        clauses.push(clause);
    }

    Ok(Filter { clauses })
}

fn parse_children(key: &str, value: &Value) -> QueryResult<Vec<Filter>> {
    let Value::Array(items) = value else {
        return Err(QueryError::InvalidFilter(format!(
            "\"{}\" expects an array of filters",
            key
        )));
    };
    items.iter().map(Filter::try_from).collect()
}

fn parse_field_filter(value: &Value) -> QueryResult<FieldFilter> {
    let Value::Object(map) = value else {
        return Ok(FieldFilter::Compare(vec![Comparison {
            operator: Operator::Eq,
            value: normalize_value(value),
        }]));
    };

    let is_operator_key =
        |k: &str| k.starts_with('_') && !matches!(k, "_and" | "_or" | "_some" | "_none");

    if !map.is_empty() && map.keys().all(|k| is_operator_key(k.as_str())) {
        let comparisons = map
            .iter()
            .map(|(k, v)| {
                Ok(Comparison {
                    operator: k.parse()?,
                    value: normalize_value(v),
                })
            })
            .collect::<QueryResult<Vec<_>>>()?;
        return Ok(FieldFilter::Compare(comparisons));
    }

    if map.len() == 1 {
        if let Some((key, inner)) = map.iter().next() {
            let quantifier = match key.as_str() {
                "_some" => Some(Quantifier::Some),
                "_none" => Some(Quantifier::None),
                _ => None,
            };
            if let Some(quantifier) = quantifier {
                return Ok(FieldFilter::Quantified(quantifier, Filter::try_from(inner)?));
            }
        }
    }

    if map.keys().any(|k| is_operator_key(k.as_str())) {
        return Err(QueryError::InvalidFilter(
            "operators and nested fields cannot be mixed in one object".to_string(),
        ));
    }

    Ok(FieldFilter::Nested(parse_filter(map)?))
}

/// `null` means "no value"; nulls inside arrays are dropped.
fn normalize_value(value: &Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::Array(items) => Some(Value::Array(
            items.iter().filter(|v| !v.is_null()).cloned().collect(),
        )),
        other => Some(other.clone()),
    }
}
