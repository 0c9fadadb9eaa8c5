//! Sort compiler.

use super::alias::AliasMap;
use super::Compilation;
use crate::error::{QueryError, QueryResult};
use crate::sql::{OrderByExpr, Query};

/// Split a dotted field path.
pub(super) fn field_path(field: &str) -> Vec<String> {
    field.split('.').map(|s| s.trim().to_string()).collect()
}

impl Compilation<'_> {
    /// ORDER BY each entry in request order; `-field` sorts descending.
    pub(super) async fn apply_sort(
        &mut self,
        collection: &str,
        query: &mut Query,
        sort: &[String],
        aliases: &mut AliasMap,
    ) -> QueryResult<()> {
        for entry in sort {
            let (descending, field) = match entry.strip_prefix('-') {
                Some(field) => (true, field),
                None => (false, entry.as_str()),
            };
            if field.is_empty() {
                return Err(QueryError::InvalidQuery(format!("invalid sort key \"{}\"", entry)));
            }

            let path = field_path(field);
            if path.len() > 1 {
                self.resolve_path(query, aliases, collection, &path, false)
                    .await?;
            }
            let column = self.resolve_column(collection, aliases, &path).await?;

            query.add_order_by(if descending {
                OrderByExpr::desc(column.expr)
            } else {
                OrderByExpr::asc(column.expr)
            });
        }
        Ok(())
    }
}
