//! Request-side query model.
//!
//! [`QuerySpec`] bundles everything a read request can ask for: filter,
//! sort, aggregate, group, search and pagination. It deserializes from the
//! JSON shape clients send, accepting comma-joined strings wherever a list
//! of fields is expected.

mod filter;
mod operator;

use std::str::FromStr;

use serde::Deserialize;
use serde_json::Value;

pub use filter::{Clause, Comparison, FieldFilter, Filter, Quantifier};
pub use operator::{Arity, Operator};

use crate::error::{QueryError, QueryResult};

/// Aggregate functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateOp {
    Count,
    CountAll,
    CountDistinct,
    Sum,
    SumDistinct,
    Avg,
    AvgDistinct,
    Min,
    Max,
}

impl AggregateOp {
    pub fn key(&self) -> &'static str {
        match self {
            AggregateOp::Count => "count",
            AggregateOp::CountAll => "countAll",
            AggregateOp::CountDistinct => "countDistinct",
            AggregateOp::Sum => "sum",
            AggregateOp::SumDistinct => "sumDistinct",
            AggregateOp::Avg => "avg",
            AggregateOp::AvgDistinct => "avgDistinct",
            AggregateOp::Min => "min",
            AggregateOp::Max => "max",
        }
    }
}

impl FromStr for AggregateOp {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "count" => AggregateOp::Count,
            "countAll" => AggregateOp::CountAll,
            "countDistinct" => AggregateOp::CountDistinct,
            "sum" => AggregateOp::Sum,
            "sumDistinct" => AggregateOp::SumDistinct,
            "avg" => AggregateOp::Avg,
            "avgDistinct" => AggregateOp::AvgDistinct,
            "min" => AggregateOp::Min,
            "max" => AggregateOp::Max,
            other => {
                return Err(QueryError::InvalidQuery(format!(
                    "unknown aggregate function \"{}\"",
                    other
                )))
            }
        })
    }
}

/// Aggregate request: operation → fields, in request order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregate {
    pub entries: Vec<(AggregateOp, Vec<String>)>,
}

impl Aggregate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, op: AggregateOp, fields: &[&str]) -> Self {
        self.entries
            .push((op, fields.iter().map(|f| f.to_string()).collect()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A read request against one collection.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub struct QuerySpec {
    pub filter: Option<Filter>,
    /// Sort keys, `-` prefix for descending.
    pub sort: Vec<String>,
    pub aggregate: Aggregate,
    pub group: Vec<String>,
    pub search: Option<String>,
    /// `-1` asks for every row.
    pub limit: Option<i64>,
    pub offset: Option<u64>,
    /// 1-based page, combined with `limit`.
    pub page: Option<u64>,
}

impl QuerySpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_sort(mut self, sort: &[&str]) -> Self {
        self.sort = sort.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_group(mut self, group: &[&str]) -> Self {
        self.group = group.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_aggregate(mut self, aggregate: Aggregate) -> Self {
        self.aggregate = aggregate;
        self
    }

    pub fn with_search(mut self, search: &str) -> Self {
        self.search = Some(search.to_string());
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_page(mut self, page: u64) -> Self {
        self.page = Some(page);
        self
    }
}

impl TryFrom<Value> for QuerySpec {
    type Error = QueryError;

    fn try_from(value: Value) -> QueryResult<Self> {
        let Value::Object(map) = value else {
            return Err(QueryError::InvalidQuery("query must be an object".to_string()));
        };

        let mut spec = QuerySpec::default();
        for (key, value) in map {
            if value.is_null() {
                continue;
            }
            match key.as_str() {
                "filter" => spec.filter = Some(Filter::try_from(value)?),
                "sort" => spec.sort = field_list("sort", &value)?,
                "group" | "groupBy" => spec.group = field_list("group", &value)?,
                "aggregate" => spec.aggregate = parse_aggregate(&value)?,
                "search" => spec.search = Some(scalar_string("search", &value)?),
                "limit" => spec.limit = Some(integer("limit", &value)?),
                "offset" => spec.offset = Some(unsigned("offset", &value)?),
                "page" => spec.page = Some(unsigned("page", &value)?),
                other => {
                    return Err(QueryError::InvalidQuery(format!(
                        "unknown query parameter \"{}\"",
                        other
                    )))
                }
            }
        }
        Ok(spec)
    }
}

/// `["a", "b"]` or `"a,b"`.
fn field_list(name: &str, value: &Value) -> QueryResult<Vec<String>> {
    match value {
        Value::String(s) => Ok(s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.trim().to_string()),
                other => Err(QueryError::InvalidQuery(format!(
                    "\"{}\" entries must be strings, got {}",
                    name, other
                ))),
            })
            .collect(),
        other => Err(QueryError::InvalidQuery(format!(
            "\"{}\" must be a list of fields, got {}",
            name, other
        ))),
    }
}

fn parse_aggregate(value: &Value) -> QueryResult<Aggregate> {
    let Value::Object(map) = value else {
        return Err(QueryError::InvalidQuery(
            "\"aggregate\" must map functions to fields".to_string(),
        ));
    };
    let mut aggregate = Aggregate::new();
    for (op, fields) in map {
        aggregate
            .entries
            .push((op.parse()?, field_list("aggregate", fields)?));
    }
    Ok(aggregate)
}

fn scalar_string(name: &str, value: &Value) -> QueryResult<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(QueryError::InvalidQuery(format!(
            "\"{}\" must be a string, got {}",
            name, other
        ))),
    }
}

fn integer(name: &str, value: &Value) -> QueryResult<i64> {
    let parsed = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        QueryError::InvalidQuery(format!("\"{}\" must be an integer, got {}", name, value))
    })
}

fn unsigned(name: &str, value: &Value) -> QueryResult<u64> {
    let n = integer(name, value)?;
    u64::try_from(n).map_err(|_| {
        QueryError::InvalidQuery(format!("\"{}\" must not be negative, got {}", name, n))
    })
}
