//! Filter operators.
//!
//! One table gives every operator its request key, its arity, the field
//! types it accepts and the SQL it builds, so validation and application
//! cannot drift apart.

use std::str::FromStr;

use tracing::debug;

use crate::error::{QueryError, QueryResult};
use crate::schema::FieldType;
use crate::sql::{lit_str, lower, Dialect, Expr, ExprExt, Literal, SqlDialect};

/// How many values an operator consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// No value; a `false` value flips the operator to its negation.
    None,
    Single,
    /// Any number of values (`_in`), comma-joined strings are split.
    List,
    /// Exactly two values (`_between`).
    Pair,
    /// A GeoJSON geometry.
    Geometry,
}

/// A filter operator such as `_eq` or `_nstarts_with`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Neq,
    Ieq,
    Nieq,
    Lt,
    Lte,
    Gt,
    Gte,
    In,
    Nin,
    Null,
    Nnull,
    Empty,
    Nempty,
    Contains,
    Ncontains,
    Icontains,
    Nicontains,
    StartsWith,
    NstartsWith,
    IstartsWith,
    NistartsWith,
    EndsWith,
    NendsWith,
    IendsWith,
    NiendsWith,
    Between,
    Nbetween,
    Intersects,
    Nintersects,
    IntersectsBbox,
    NintersectsBbox,
}

use Operator::*;

const ALL: [Operator; 32] = [
    Eq,
    Neq,
    Ieq,
    Nieq,
    Lt,
    Lte,
    Gt,
    Gte,
    In,
    Nin,
    Null,
    Nnull,
    Empty,
    Nempty,
    Contains,
    Ncontains,
    Icontains,
    Nicontains,
    StartsWith,
    NstartsWith,
    IstartsWith,
    NistartsWith,
    EndsWith,
    NendsWith,
    IendsWith,
    NiendsWith,
    Between,
    Nbetween,
    Intersects,
    Nintersects,
    IntersectsBbox,
    NintersectsBbox,
];

const TEXT_OPERATORS: &[Operator] = &[
    Eq,
    Neq,
    Ieq,
    Nieq,
    Contains,
    Ncontains,
    Icontains,
    Nicontains,
    StartsWith,
    NstartsWith,
    IstartsWith,
    NistartsWith,
    EndsWith,
    NendsWith,
    IendsWith,
    NiendsWith,
    In,
    Nin,
    Empty,
    Nempty,
    Null,
    Nnull,
];

const CSV_OPERATORS: &[Operator] = &[
    Eq, Neq, Contains, Ncontains, In, Nin, Empty, Nempty, Null, Nnull,
];

const UUID_OPERATORS: &[Operator] = &[Eq, Neq, In, Nin, Null, Nnull];

const ORDERED_OPERATORS: &[Operator] = &[
    Eq, Neq, Lt, Lte, Gt, Gte, Between, Nbetween, In, Nin, Null, Nnull,
];

const BOOLEAN_OPERATORS: &[Operator] = &[Eq, Neq, Null, Nnull];

const JSON_OPERATORS: &[Operator] = &[Null, Nnull];

const GEOMETRY_OPERATORS: &[Operator] = &[
    Eq,
    Neq,
    Intersects,
    Nintersects,
    IntersectsBbox,
    NintersectsBbox,
    Null,
    Nnull,
];

/// Operators that never reveal a concealed value.
const HASH_OPERATORS: &[Operator] = &[Null, Nnull, Empty, Nempty];

const OPAQUE_OPERATORS: &[Operator] = &[Eq, Neq, Null, Nnull];

impl Operator {
    /// Request key, e.g. `_starts_with`.
    pub fn key(&self) -> &'static str {
        match self {
            Eq => "_eq",
            Neq => "_neq",
            Ieq => "_ieq",
            Nieq => "_nieq",
            Lt => "_lt",
            Lte => "_lte",
            Gt => "_gt",
            Gte => "_gte",
            In => "_in",
            Nin => "_nin",
            Null => "_null",
            Nnull => "_nnull",
            Empty => "_empty",
            Nempty => "_nempty",
            Contains => "_contains",
            Ncontains => "_ncontains",
            Icontains => "_icontains",
            Nicontains => "_nicontains",
            StartsWith => "_starts_with",
            NstartsWith => "_nstarts_with",
            IstartsWith => "_istarts_with",
            NistartsWith => "_nistarts_with",
            EndsWith => "_ends_with",
            NendsWith => "_nends_with",
            IendsWith => "_iends_with",
            NiendsWith => "_niends_with",
            Between => "_between",
            Nbetween => "_nbetween",
            Intersects => "_intersects",
            Nintersects => "_nintersects",
            IntersectsBbox => "_intersects_bbox",
            NintersectsBbox => "_nintersects_bbox",
        }
    }

    pub fn arity(&self) -> Arity {
        match self {
            Null | Nnull | Empty | Nempty => Arity::None,
            In | Nin => Arity::List,
            Between | Nbetween => Arity::Pair,
            Intersects | Nintersects | IntersectsBbox | NintersectsBbox => Arity::Geometry,
            _ => Arity::Single,
        }
    }

    /// Operators usable on a field of this type.
    pub fn allowed_for_type(field_type: FieldType) -> &'static [Operator] {
        match field_type {
            FieldType::String | FieldType::Text => TEXT_OPERATORS,
            FieldType::Csv => CSV_OPERATORS,
            FieldType::Uuid => UUID_OPERATORS,
            FieldType::Integer
            | FieldType::BigInteger
            | FieldType::Decimal
            | FieldType::Float
            | FieldType::Date
            | FieldType::DateTime
            | FieldType::Time
            | FieldType::Timestamp => ORDERED_OPERATORS,
            FieldType::Boolean => BOOLEAN_OPERATORS,
            FieldType::Json => JSON_OPERATORS,
            FieldType::Geometry => GEOMETRY_OPERATORS,
            FieldType::Hash => HASH_OPERATORS,
            FieldType::Alias | FieldType::Binary | FieldType::Unknown => OPAQUE_OPERATORS,
        }
    }

    pub fn is_allowed_for(&self, field_type: FieldType) -> bool {
        Self::allowed_for_type(field_type).contains(self)
    }

    /// Whether the operator may be used on a concealed field.
    pub fn is_hash_comparable(&self) -> bool {
        HASH_OPERATORS.contains(self)
    }

    /// Build the predicate for `column`.
    ///
    /// `values` are already coerced for the column. `enabled` is the boolean
    /// carried by no-value operators (`{"_null": false}` negates). Returns
    /// `None` when the clause is dropped (missing value, malformed pair).
    pub fn build(
        &self,
        column: Expr,
        values: &[Literal],
        enabled: bool,
        dialect: Dialect,
    ) -> QueryResult<Option<Expr>> {
        let expr = match self.arity() {
            Arity::None => {
                let positive = match self {
                    Null | Empty => enabled,
                    _ => !enabled,
                };
                match (self, positive) {
                    (Null | Nnull, true) => column.is_null(),
                    (Null | Nnull, false) => column.is_not_null(),
                    (_, true) => column.eq(lit_str("")),
                    (_, false) => column.ne(lit_str("")),
                }
            }

            Arity::List => {
                let list: Vec<Expr> = values.iter().cloned().map(Expr::from).collect();
                match self {
                    In => column.in_list(list),
                    _ => column.not_in_list(list),
                }
            }

            Arity::Pair => {
                let [low, high] = values else {
                    debug!(
                        operator = self.key(),
                        count = values.len(),
                        "dropping range filter without exactly two bounds"
                    );
                    return Ok(None);
                };
                let (low, high) = (Expr::from(low.clone()), Expr::from(high.clone()));
                match self {
                    Between => column.between(low, high),
                    _ => column.not_between(low, high),
                }
            }

            Arity::Geometry => {
                let Some(Literal::String(geojson)) = values.first() else {
                    debug!(operator = self.key(), "dropping spatial filter without geometry");
                    return Ok(None);
                };
                let bbox = matches!(self, IntersectsBbox | NintersectsBbox);
                let predicate = dialect
                    .spatial_intersects(column, geojson, bbox)
                    .ok_or_else(|| QueryError::UnsupportedByDialect {
                        feature: self.key().to_string(),
                        dialect: dialect.name().to_string(),
                    })?;
                match self {
                    Intersects | IntersectsBbox => predicate,
                    _ => predicate.not(),
                }
            }

            Arity::Single => {
                let Some(value) = values.first() else {
                    return Ok(None);
                };
                self.build_single(column, value)
            }
        };

        Ok(Some(expr))
    }

    fn build_single(&self, column: Expr, value: &Literal) -> Expr {
        let text = literal_text(value);
        match self {
            Eq => column.eq(value.clone()),
            Neq => column.ne(value.clone()),
            Lt => column.lt(value.clone()),
            Lte => column.lte(value.clone()),
            Gt => column.gt(value.clone()),
            Gte => column.gte(value.clone()),
            Ieq => lower(column).eq(text.to_lowercase()),
            Nieq => lower(column).ne(text.to_lowercase()),
            Contains => column.like(format!("%{}%", text)),
            Ncontains => column.not_like(format!("%{}%", text)),
            Icontains => lower(column).like(format!("%{}%", text.to_lowercase())),
            Nicontains => lower(column).not_like(format!("%{}%", text.to_lowercase())),
            StartsWith => column.like(format!("{}%", text)),
            NstartsWith => column.not_like(format!("{}%", text)),
            IstartsWith => lower(column).like(format!("{}%", text.to_lowercase())),
            NistartsWith => lower(column).not_like(format!("{}%", text.to_lowercase())),
            EndsWith => column.like(format!("%{}", text)),
            NendsWith => column.not_like(format!("%{}", text)),
            IendsWith => lower(column).like(format!("%{}", text.to_lowercase())),
            NiendsWith => lower(column).not_like(format!("%{}", text.to_lowercase())),
            // Multi-value and no-value operators are handled by `build`.
            _ => column.eq(value.clone()),
        }
    }
}

/// Text form of a literal for LIKE patterns.
fn literal_text(value: &Literal) -> String {
    match value {
        Literal::Int(n) => n.to_string(),
        Literal::Float(f) => f.to_string(),
        Literal::String(s) => s.clone(),
        Literal::Bool(b) => b.to_string(),
        Literal::Null => String::new(),
    }
}

impl FromStr for Operator {
    type Err = QueryError;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        ALL.iter()
            .copied()
            .find(|op| op.key() == key)
            .ok_or_else(|| QueryError::UnknownOperator(key.to_string()))
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}
