//! Aggregate and GROUP BY compiler.
//!
//! Projection names are what callers unflatten results by: `count` and
//! `countAll` for whole-row counts, `<operation>->.<field>` otherwise.

use super::alias::AliasMap;
use super::sort::field_path;
use super::Compilation;
use crate::error::{QueryError, QueryResult};
use crate::query::{Aggregate, AggregateOp};
use crate::schema::CollectionInfo;
use crate::sql::{
    avg, avg_distinct, count, count_distinct, count_star, max, min, sum, sum_distinct, table_col,
    Expr, ExprExt, Query,
};

/// Output column name for one aggregate.
pub fn aggregate_alias(op: AggregateOp, field: &str) -> String {
    match (op, field) {
        (AggregateOp::Count, "*") => "count".to_string(),
        (AggregateOp::CountAll, _) => "countAll".to_string(),
        (op, field) => format!("{}->.{}", op.key(), field),
    }
}

fn aggregate_expr(op: AggregateOp, column: Expr) -> Expr {
    match op {
        AggregateOp::Count | AggregateOp::CountAll => count(column),
        AggregateOp::CountDistinct => count_distinct(column),
        AggregateOp::Sum => sum(column),
        AggregateOp::SumDistinct => sum_distinct(column),
        AggregateOp::Avg => avg(column),
        AggregateOp::AvgDistinct => avg_distinct(column),
        AggregateOp::Min => min(column),
        AggregateOp::Max => max(column),
    }
}

impl Compilation<'_> {
    /// GROUP BY each field and select it under its requested name.
    pub(super) async fn apply_group(
        &mut self,
        collection: &str,
        query: &mut Query,
        group: &[String],
        aliases: &mut AliasMap,
    ) -> QueryResult<()> {
        for field in group {
            let path = field_path(field);
            if path.len() > 1 {
                self.resolve_path(query, aliases, collection, &path, false)
                    .await?;
            }
            let column = self.resolve_column(collection, aliases, &path).await?;
            query.add_group_by(column.expr.clone());
            query.add_select(column.expr.alias(field));
        }
        Ok(())
    }

    pub(super) async fn apply_aggregate(
        &mut self,
        info: &CollectionInfo,
        query: &mut Query,
        aggregate: &Aggregate,
        aliases: &mut AliasMap,
    ) -> QueryResult<()> {
        let collection = info.collection.as_str();

        // Join first so whole-row counts see every join.
        for (_, fields) in &aggregate.entries {
            for field in fields {
                let path = field_path(field);
                if path.len() > 1 {
                    self.resolve_path(query, aliases, collection, &path, false)
                        .await?;
                }
            }
        }
        let has_joins = query.has_joins();

        for (op, fields) in &aggregate.entries {
            let op = *op;

            if op == AggregateOp::CountAll {
                query.add_select(count_star().alias(&aggregate_alias(op, "*")));
                continue;
            }

            for field in fields {
                let name = aggregate_alias(op, field);
                if field == "*" {
                    if op != AggregateOp::Count {
                        return Err(QueryError::InvalidQuery(format!(
                            "\"{}\" needs a field, not \"*\"",
                            op.key()
                        )));
                    }
                    // Joined rows would be counted once per match.
                    let expr = if has_joins {
                        count_distinct(table_col(collection, &info.primary))
                    } else {
                        count_star()
                    };
                    query.add_select(expr.alias(&name));
                    continue;
                }

                let column = self
                    .resolve_column(collection, aliases, &field_path(field))
                    .await?;
                query.add_select(aggregate_expr(op, column.expr).alias(&name));
            }
        }
        Ok(())
    }
}
