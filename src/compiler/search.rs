//! Free-text search compiler.

use tracing::trace;

use super::filter::disjoin;
use super::Compilation;
use crate::error::QueryResult;
use crate::schema::{FieldInfo, FieldType};
use crate::sql::{lit_int, lower, table_col, Expr, ExprExt, Query};

/// Predicate matching `term` against one field, if the field can hold it.
fn field_predicate(collection: &str, field: &FieldInfo, term: &str) -> Option<Expr> {
    if field.is_alias() || field.is_concealed() {
        return None;
    }
    let column = table_col(collection, &field.field);
    match field.field_type {
        t if t.is_text() => Some(lower(column).like(format!("%{}%", term.to_lowercase()))),
        t if t.is_integer() => match term.parse::<i64>() {
            Ok(n) => Some(column.eq(n)),
            Err(_) => parse_number(term).map(|f| column.eq(f)),
        },
        FieldType::Decimal | FieldType::Float => parse_number(term).map(|f| column.eq(f)),
        FieldType::Uuid => uuid::Uuid::parse_str(term).ok().map(|_| column.eq(term)),
        _ => None,
    }
}

fn parse_number(term: &str) -> Option<f64> {
    term.parse::<f64>().ok().filter(|f| f.is_finite())
}

impl Compilation<'_> {
    /// AND one OR-group over every searchable field of `collection`. When no
    /// field can hold the term the group is empty and nothing matches.
    pub(super) async fn apply_search(
        &mut self,
        collection: &str,
        query: &mut Query,
        term: &str,
    ) -> QueryResult<()> {
        let term = term.trim();
        let fields = self.schema.fields(collection).await?;

        let predicates: Vec<Expr> = fields
            .iter()
            .filter_map(|field| field_predicate(collection, field, term))
            .collect();

        match disjoin(predicates) {
            Some(condition) => query.add_filter(condition),
            None => {
                trace!(collection, term, "no searchable field can hold the term");
                query.add_filter(lit_int(1).eq(lit_int(0)));
            }
        }
        Ok(())
    }
}
