//! Column resolution.
//!
//! Turns a field path into the SQL expression that reads it: a column on the
//! root table or on the alias recorded for the path prefix, optionally
//! wrapped in a function (`year(published_on)`, `count(comments)`).

use super::alias::AliasMap;
use super::Compilation;
use crate::error::{QueryError, QueryResult};
use crate::schema::{relation_info, FieldType, RelationInfo};
use crate::sql::{
    cast, count_star, lit_str, table_col, CastType, DateKind, DatePart, Expr, ExprExt, Query,
    SqlDialect, TableRef,
};

/// Function wrapper on the last path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum FieldFunction {
    DatePart(DatePart),
    Count,
}

impl FieldFunction {
    fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "year" => FieldFunction::DatePart(DatePart::Year),
            "month" => FieldFunction::DatePart(DatePart::Month),
            "week" => FieldFunction::DatePart(DatePart::Week),
            "day" => FieldFunction::DatePart(DatePart::Day),
            "weekday" => FieldFunction::DatePart(DatePart::Weekday),
            "hour" => FieldFunction::DatePart(DatePart::Hour),
            "minute" => FieldFunction::DatePart(DatePart::Minute),
            "second" => FieldFunction::DatePart(DatePart::Second),
            "count" => FieldFunction::Count,
            _ => return None,
        })
    }
}

/// `func(field)` → `(Some("func"), "field")`.
pub(super) fn split_function(segment: &str) -> (Option<&str>, &str) {
    if segment.starts_with('$') {
        return (None, segment);
    }
    match segment.strip_suffix(')').and_then(|s| s.split_once('(')) {
        Some((name, field)) if !name.is_empty() => (Some(name), field.trim()),
        _ => (None, segment),
    }
}

fn part_allowed(kind: DateKind, part: DatePart) -> bool {
    match kind {
        DateKind::Date => matches!(
            part,
            DatePart::Year | DatePart::Month | DatePart::Week | DatePart::Day | DatePart::Weekday
        ),
        DateKind::Time => matches!(part, DatePart::Hour | DatePart::Minute | DatePart::Second),
        DateKind::DateTime | DateKind::Timestamp => true,
    }
}

/// A field path resolved to SQL.
#[derive(Debug, Clone)]
pub(super) struct ResolvedColumn {
    pub expr: Expr,
    /// Dotted path as requested, for error messages.
    pub path: String,
    /// Type the expression evaluates to (`integer` for function columns).
    pub field_type: FieldType,
    pub concealed: bool,
    pub function: Option<FieldFunction>,
}

impl Compilation<'_> {
    /// Resolve `path` on `collection`. Joins for the prefix must already be
    /// recorded in `aliases`.
    pub(super) async fn resolve_column(
        &mut self,
        collection: &str,
        aliases: &AliasMap,
        path: &[String],
    ) -> QueryResult<ResolvedColumn> {
        let display = path.join(".");
        let (last, parents) = path
            .split_last()
            .ok_or_else(|| QueryError::InvalidQuery("empty field path".to_string()))?;

        let (table, target) = if parents.is_empty() {
            (collection.to_string(), collection.to_string())
        } else {
            let entry = aliases.get(parents).ok_or_else(|| {
                QueryError::InvalidQuery(format!(
                    "\"{}\" cannot be reached: \"{}\" is not a joinable relation here",
                    display,
                    parents.join(".")
                ))
            })?;
            (entry.alias.clone(), entry.collection.clone())
        };

        let (function, field_name) = split_function(last);
        let field = self
            .schema
            .field(&target, field_name)
            .await?
            .ok_or_else(|| QueryError::UnknownField {
                collection: target.clone(),
                field: field_name.to_string(),
            })?;
        let column = table_col(&table, field_name);

        let Some(name) = function else {
            if field.is_alias() {
                return Err(QueryError::InvalidQuery(format!(
                    "\"{}\" is a relational alias without a column; filter on its fields or use _some/_none",
                    display
                )));
            }
            return Ok(ResolvedColumn {
                expr: column,
                path: display,
                field_type: field.field_type,
                concealed: field.is_concealed(),
                function: None,
            });
        };

        let invalid = |reason: &str| QueryError::InvalidFunction {
            function: name.to_string(),
            field: display.clone(),
            reason: reason.to_string(),
        };
        let function = FieldFunction::parse(name).ok_or_else(|| invalid("unknown function"))?;

        let expr = match function {
            FieldFunction::DatePart(part) => {
                let kind = field
                    .field_type
                    .date_kind()
                    .ok_or_else(|| invalid("requires a date or time field"))?;
                if !part_allowed(kind, part) {
                    return Err(invalid(&format!("not available for {} fields", field.field_type)));
                }
                self.dialect().date_part(part, column, kind)
            }
            FieldFunction::Count if field.field_type == FieldType::Json => self
                .dialect()
                .json_array_length(column)
                .ok_or_else(|| QueryError::UnsupportedByDialect {
                    feature: "count() on JSON fields".to_string(),
                    dialect: self.dialect().name().to_string(),
                })?,
            FieldFunction::Count => {
                let relation = relation_info(&self.relations, &target, field_name);
                self.count_related(&target, &table, relation)
                    .await?
                    .ok_or_else(|| invalid("requires a JSON or to-many field"))?
            }
        };

        Ok(ResolvedColumn {
            expr,
            path: display,
            field_type: FieldType::Integer,
            concealed: false,
            function: Some(function),
        })
    }

    /// Correlated `(SELECT COUNT(*) ...)` over the rows of a to-many relation.
    async fn count_related(
        &mut self,
        collection: &str,
        table: &str,
        relation: RelationInfo,
    ) -> QueryResult<Option<Expr>> {
        let pk = self.primary_key(collection).await?;
        let inner = self.aliases.next_alias();

        let (related, condition) = match &relation {
            RelationInfo::OneToMany(rel) => (
                rel.collection.as_str(),
                table_col(&inner, &rel.field).eq(table_col(table, &pk)),
            ),
            RelationInfo::OneToAny(rel) => {
                let Some(discriminator) = rel.meta.one_collection_field.as_deref() else {
                    return Ok(None);
                };
                let condition = table_col(&inner, discriminator)
                    .eq(lit_str(collection))
                    .and(table_col(&inner, &rel.field).eq(cast(table_col(table, &pk), CastType::Text)));
                (rel.collection.as_str(), condition)
            }
            _ => return Ok(None),
        };

        let subquery = Query::new()
            .select(vec![count_star()])
            .from(TableRef::new(related).with_alias(&inner))
            .filter(condition);
        Ok(Some(Expr::Subquery(Box::new(subquery))))
    }
}
