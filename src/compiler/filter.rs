//! Filter compiler.
//!
//! Two walks over the same filter tree:
//!
//! 1. **Join pass**: every leaf path is handed to the path resolver, whatever
//!    its logical nesting, so later hops can address the aliases.
//! 2. **Predicate pass**: builds the WHERE expression. Keys of one object
//!    are ANDed, children of `_and`/`_or` become parenthesized groups, and a
//!    to-many relation at the root of a path compiles to an existential
//!    `pk [NOT] IN (SELECT fk FROM related WHERE ...)` subquery.
//!
//! An `_or` with an empty child matches everything and is skipped whole.

use futures::future::{BoxFuture, FutureExt};
use tracing::{debug, trace};

use super::alias::AliasMap;
use super::coerce::{coerce_values, operator_enabled, ValueKind};
use super::column::ResolvedColumn;
use super::sort::field_path;
use super::Compilation;
use crate::error::{QueryError, QueryResult};
use crate::query::{Arity, Clause, Comparison, FieldFilter, Filter, Operator, QuerySpec, Quantifier};
use crate::schema::{relation_info, RelationInfo};
use crate::sql::{cast, lit_str, table_col, CastType, Expr, ExprExt, Query, TableRef};

/// AND the parts together, or `None` when there are none.
pub(super) fn conjoin(parts: Vec<Expr>) -> Option<Expr> {
    parts.into_iter().reduce(|acc, part| {
        let acc = if acc.is_disjunction() { acc.paren() } else { acc };
        let part = if part.is_disjunction() { part.paren() } else { part };
        acc.and(part)
    })
}

/// OR the parts together, or `None` when there are none.
pub(super) fn disjoin(parts: Vec<Expr>) -> Option<Expr> {
    parts.into_iter().reduce(|acc, part| acc.or(part))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Logical {
    And,
    Or,
}

/// `prefix` extended by the segments of a possibly dotted key.
fn child_path(prefix: &[String], name: &str) -> Vec<String> {
    let mut path = prefix.to_vec();
    path.extend(field_path(name));
    path
}

/// First segment of a dotted key and the remainder, if any.
fn split_root(name: &str) -> (&str, Option<&str>) {
    match name.split_once('.') {
        Some((root, rest)) => (root.trim(), Some(rest)),
        None => (name, None),
    }
}

fn has_always_true_child(children: &[Filter]) -> bool {
    children.iter().any(Filter::is_empty)
}

impl Compilation<'_> {
    /// Apply `filter` to `query`. Returns whether a to-many hop was joined.
    pub(super) async fn apply_filter(
        &mut self,
        collection: &str,
        query: &mut Query,
        filter: &Filter,
        aliases: &mut AliasMap,
        is_subquery: bool,
    ) -> QueryResult<bool> {
        let has_multi_relational = self
            .join_pass(collection, query, filter, aliases, &[], is_subquery)
            .await?;

        if let Some(condition) = self
            .predicate_pass(collection, filter, aliases, &[], is_subquery)
            .await?
        {
            query.add_filter(condition);
        }

        Ok(has_multi_relational)
    }

    // =========================================================================
    // Join pass
    // =========================================================================

    fn join_pass<'a>(
        &'a mut self,
        collection: &'a str,
        query: &'a mut Query,
        filter: &'a Filter,
        aliases: &'a mut AliasMap,
        prefix: &'a [String],
        is_subquery: bool,
    ) -> BoxFuture<'a, QueryResult<bool>> {
        async move {
            let mut joined_to_many = false;

            for clause in &filter.clauses {
                match clause {
                    Clause::And(children) | Clause::Or(children) => {
                        if matches!(clause, Clause::Or(_)) && has_always_true_child(children) {
                            continue;
                        }
                        for child in children {
                            joined_to_many |= self
                                .join_pass(collection, query, child, aliases, prefix, is_subquery)
                                .await?;
                        }
                    }

                    Clause::Field(name, field_filter) => {
                        // Root to-many paths are compiled into subqueries with
                        // joins of their own.
                        let (root, _) = split_root(name);
                        if prefix.is_empty()
                            && relation_info(&self.relations, collection, root).is_to_many()
                        {
                            continue;
                        }

                        let path = child_path(prefix, name);
                        match field_filter {
                            FieldFilter::Nested(inner) => {
                                joined_to_many |= self
                                    .join_pass(collection, query, inner, aliases, &path, is_subquery)
                                    .await?;
                            }
                            FieldFilter::Compare(_) | FieldFilter::Quantified(..) => {
                                if path.len() > 1 {
                                    joined_to_many |= self
                                        .resolve_path(query, aliases, collection, &path, is_subquery)
                                        .await?;
                                }
                            }
                        }
                    }
                }
            }

            Ok(joined_to_many)
        }
        .boxed()
    }

    // =========================================================================
    // Predicate pass
    // =========================================================================

    fn predicate_pass<'a>(
        &'a mut self,
        collection: &'a str,
        filter: &'a Filter,
        aliases: &'a AliasMap,
        prefix: &'a [String],
        is_subquery: bool,
    ) -> BoxFuture<'a, QueryResult<Option<Expr>>> {
        async move {
            let mut parts = Vec::new();

            for clause in &filter.clauses {
                let part = match clause {
                    Clause::And(children) => {
                        self.group(collection, children, aliases, prefix, is_subquery, Logical::And)
                            .await?
                    }
                    Clause::Or(children) if has_always_true_child(children) => {
                        trace!("skipping _or with an always-true branch");
                        None
                    }
                    Clause::Or(children) => {
                        self.group(collection, children, aliases, prefix, is_subquery, Logical::Or)
                            .await?
                    }
                    Clause::Field(name, field_filter) => {
                        self.field_predicate(collection, name, field_filter, aliases, prefix, is_subquery)
                            .await?
                    }
                };
                parts.extend(part);
            }

            Ok(conjoin(parts))
        }
        .boxed()
    }

    /// Children of `_and`/`_or`, each as its own parenthesized group.
    async fn group(
        &mut self,
        collection: &str,
        children: &[Filter],
        aliases: &AliasMap,
        prefix: &[String],
        is_subquery: bool,
        logical: Logical,
    ) -> QueryResult<Option<Expr>> {
        let mut parts = Vec::with_capacity(children.len());
        for child in children {
            if let Some(expr) = self
                .predicate_pass(collection, child, aliases, prefix, is_subquery)
                .await?
            {
                parts.push(expr.paren());
            }
        }
        Ok(match logical {
            Logical::And => conjoin(parts),
            Logical::Or => disjoin(parts),
        })
    }

    async fn field_predicate(
        &mut self,
        collection: &str,
        name: &str,
        field_filter: &FieldFilter,
        aliases: &AliasMap,
        prefix: &[String],
        is_subquery: bool,
    ) -> QueryResult<Option<Expr>> {
        if prefix.is_empty() {
            let (root, rest) = split_root(name);
            let relation = relation_info(&self.relations, collection, root);
            if relation.is_to_many() {
                // `comments.body: {...}` reads as `comments: { body: {...} }`.
                let (quantifier, inner) = match (rest, field_filter) {
                    (Some(rest), _) => (
                        Quantifier::Some,
                        Filter {
                            clauses: vec![Clause::Field(rest.to_string(), field_filter.clone())],
                        },
                    ),
                    (None, FieldFilter::Quantified(quantifier, inner)) => (*quantifier, inner.clone()),
                    (None, FieldFilter::Nested(inner)) => (Quantifier::Some, inner.clone()),
                    (None, FieldFilter::Compare(_)) => {
                        return Err(QueryError::InvalidQuery(format!(
                            "\"{}\" is a to-many relation: filter on its fields or use _some/_none",
                            name
                        )))
                    }
                };
                let existential = self
                    .existential(collection, collection, &relation, quantifier, &inner)
                    .await?;
                return Ok(Some(existential));
            }
        }

        let path = child_path(prefix, name);
        match field_filter {
            FieldFilter::Nested(inner) => {
                self.predicate_pass(collection, inner, aliases, &path, is_subquery)
                    .await
            }

            FieldFilter::Compare(comparisons) => {
                let column = self.resolve_column(collection, aliases, &path).await?;
                self.compare(&column, comparisons)
            }

            FieldFilter::Quantified(quantifier, inner) => {
                // `_some`/`_none` below a joined hop: the outer key is the
                // parent alias's primary key.
                let Some((last, parent_path)) = path.split_last() else {
                    return Ok(None);
                };
                let parent = aliases.get(parent_path).ok_or_else(|| {
                    QueryError::InvalidFilter(format!(
                        "\"{}\" must follow a to-many relation",
                        path.join(".")
                    ))
                })?;
                let (parent_collection, parent_alias) = (parent.collection.clone(), parent.alias.clone());
                let relation = relation_info(&self.relations, &parent_collection, last);
                if !relation.is_to_many() {
                    return Err(QueryError::InvalidFilter(format!(
                        "\"{}\" must follow a to-many relation",
                        path.join(".")
                    )));
                }
                let existential = self
                    .existential(&parent_collection, &parent_alias, &relation, *quantifier, inner)
                    .await?;
                Ok(Some(existential))
            }
        }
    }

    /// `outer.pk [NOT] IN (SELECT fk FROM related WHERE fk IS NOT NULL AND ...)`.
    async fn existential(
        &mut self,
        collection: &str,
        outer_table: &str,
        relation: &RelationInfo,
        quantifier: Quantifier,
        filter: &Filter,
    ) -> QueryResult<Expr> {
        let (rel, polymorphic) = match relation {
            RelationInfo::OneToMany(rel) => (rel, false),
            RelationInfo::OneToAny(rel) => (rel, true),
            other => {
                return Err(QueryError::InvalidFilter(format!(
                    "_some/_none need a to-many relation, got {}",
                    other.kind()
                )))
            }
        };

        let foreign_key = table_col(&rel.collection, &rel.field);
        let mut subquery = Query::new()
            .select(vec![foreign_key.clone()])
            .from(TableRef::new(&rel.collection));
        subquery.add_filter(foreign_key.is_not_null());
        if polymorphic {
            let discriminator = rel.meta.one_collection_field.as_deref().ok_or_else(|| {
                QueryError::InvalidQuery(format!(
                    "polymorphic relation \"{}.{}\" has no collection field",
                    rel.collection, rel.field
                ))
            })?;
            subquery.add_filter(table_col(&rel.collection, discriminator).eq(lit_str(collection)));
        }

        let spec = QuerySpec::new().with_filter(filter.clone());
        let applied = self.apply(&rel.collection, subquery, &spec, true).await?;

        let negated = quantifier == Quantifier::None;
        debug!(
            collection,
            related = %rel.collection,
            kind = relation.kind(),
            negated,
            "built existential subquery"
        );

        let pk = self.primary_key(collection).await?;
        let outer = table_col(outer_table, &pk);
        let outer = if polymorphic { cast(outer, CastType::Text) } else { outer };

        Ok(match quantifier {
            Quantifier::Some => outer.in_subquery(applied.query),
            Quantifier::None => outer.not_in_subquery(applied.query),
        })
    }

    /// Validate and build the comparisons of one operator object (ANDed).
    fn compare(&self, column: &ResolvedColumn, comparisons: &[Comparison]) -> QueryResult<Option<Expr>> {
        let kind = ValueKind::of(column);
        let mut parts = Vec::with_capacity(comparisons.len());

        for comparison in comparisons {
            let operator = comparison.operator;
            validate_operator(column, operator)?;

            let value = comparison.value.as_ref();
            let arity = operator.arity();
            if arity != Arity::None && value.is_none() {
                trace!(field = %column.path, operator = operator.key(), "dropping clause without a value");
                continue;
            }

            let values = value
                .map(|v| coerce_values(v, operator, kind, self.dialect()))
                .unwrap_or_default();
            let enabled = operator_enabled(value);

            if let Some(expr) = operator.build(column.expr.clone(), &values, enabled, self.dialect())? {
                parts.push(expr);
            }
        }

        Ok(conjoin(parts))
    }
}

fn validate_operator(column: &ResolvedColumn, operator: Operator) -> QueryResult<()> {
    if column.concealed && !operator.is_hash_comparable() {
        return Err(QueryError::OperatorNotAllowedForConcealedField {
            field: column.path.clone(),
            operator: operator.key().to_string(),
        });
    }
    if !operator.is_allowed_for(column.field_type) {
        return Err(QueryError::OperatorNotAllowedForType {
            field: column.path.clone(),
            field_type: column.field_type.to_string(),
            operator: operator.key().to_string(),
        });
    }
    Ok(())
}
