//! Query compiler.
//!
//! Lowers a [`QuerySpec`] against one collection into a [`Query`]:
//!
//! ```text
//! QuerySpec ──▶ pagination ──▶ sort ──▶ search ──▶ group ──▶ filter ──▶ aggregate
//!                                │                   │          │            │
//!                                └──── path resolver (joins, aliases) ◀──────┘
//! ```
//!
//! Every call to [`Compiler::apply_query`] owns its alias generator and
//! alias maps, so concurrent compilations share nothing but the read-only
//! schema provider. To-many filters recurse into the same entry point to
//! build existential subqueries.
//!
//! # Example
//!
//! ```ignore
//! use relq::compiler::Compiler;
//! use relq::query::QuerySpec;
//!
//! let spec: QuerySpec = serde_json::from_str(r#"{"filter": {"author": {"name": {"_eq": "Ada"}}}}"#)?;
//! let query = Compiler::new(&schema).compile_query("articles", &spec).await?;
//! println!("{}", query.to_sql(Dialect::Postgres));
//! ```

mod aggregate;
mod alias;
mod coerce;
mod column;
mod filter;
mod path;
mod search;
mod sort;

use futures::future::{BoxFuture, FutureExt};
use tracing::debug;

pub use aggregate::aggregate_alias;
pub use alias::{AliasEntry, AliasGenerator, AliasMap, AliasStyle};

use crate::error::{QueryError, QueryResult};
use crate::query::QuerySpec;
use crate::schema::{CollectionInfo, Relation, SchemaProvider};
use crate::sql::{Dialect, Query, TableRef};

/// Knobs that shape the generated SQL.
#[derive(Debug, Clone, PartialEq)]
pub struct CompilerOptions {
    pub dialect: Dialect,
    pub alias_style: AliasStyle,
    /// Length of random aliases.
    pub alias_length: usize,
    /// Limit used when the request has none; `-1` for no limit.
    pub default_limit: i64,
    /// Upper bound for any limit; `-1` for no cap.
    pub max_limit: i64,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            alias_style: AliasStyle::Random,
            alias_length: 5,
            default_limit: 100,
            max_limit: -1,
        }
    }
}

impl CompilerOptions {
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn with_alias_style(mut self, style: AliasStyle) -> Self {
        self.alias_style = style;
        self
    }

    pub fn with_default_limit(mut self, limit: i64) -> Self {
        self.default_limit = limit;
        self
    }

    pub fn with_max_limit(mut self, limit: i64) -> Self {
        self.max_limit = limit;
        self
    }
}

/// Result of [`Compiler::apply_query`].
#[derive(Debug, Clone, PartialEq)]
pub struct Applied {
    pub query: Query,
    /// Any join was emitted (filter, sort, group or aggregate).
    pub has_joins: bool,
    /// A filter joined through a to-many relation, so rows may repeat.
    pub has_multi_relational_filter: bool,
}

/// Entry point. Cheap to build; holds no per-query state.
pub struct Compiler<'s> {
    schema: &'s dyn SchemaProvider,
    options: CompilerOptions,
}

impl<'s> Compiler<'s> {
    pub fn new(schema: &'s dyn SchemaProvider) -> Self {
        Self {
            schema,
            options: CompilerOptions::default(),
        }
    }

    pub fn with_options(mut self, options: CompilerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Apply `spec` to `query`, which must already select from `collection`.
    ///
    /// With `is_subquery` set, pagination and sorting are skipped and to-many
    /// hops at the root are joined instead of compiled to subqueries.
    pub async fn apply_query(
        &self,
        collection: &str,
        query: Query,
        spec: &QuerySpec,
        is_subquery: bool,
    ) -> QueryResult<Applied> {
        let mut compilation = Compilation {
            schema: self.schema,
            options: &self.options,
            relations: self.schema.relations().await?,
            aliases: AliasGenerator::new(self.options.alias_style, self.options.alias_length),
        };
        compilation.apply(collection, query, spec, is_subquery).await
    }

    /// Build the default statement for `collection` and apply `spec` to it.
    ///
    /// Plain reads select `collection.*`; grouped or aggregated reads select
    /// only the group columns and aggregates.
    pub async fn compile_query(&self, collection: &str, spec: &QuerySpec) -> QueryResult<Query> {
        let mut query = Query::new().from(TableRef::new(collection));
        if spec.aggregate.is_empty() && spec.group.is_empty() {
            query = query.select_table_star(collection);
        }
        let applied = self.apply_query(collection, query, spec, false).await?;
        Ok(applied.query)
    }
}

/// State of one top-level compilation, shared with its subqueries.
pub(crate) struct Compilation<'c> {
    schema: &'c dyn SchemaProvider,
    options: &'c CompilerOptions,
    /// Fetched once; relation lookups are hop-by-hop scans of this list.
    relations: Vec<Relation>,
    aliases: AliasGenerator,
}

impl<'c> Compilation<'c> {
    fn dialect(&self) -> Dialect {
        self.options.dialect
    }

    fn apply<'a>(
        &'a mut self,
        collection: &'a str,
        mut query: Query,
        spec: &'a QuerySpec,
        is_subquery: bool,
    ) -> BoxFuture<'a, QueryResult<Applied>> {
        async move {
            let info = self.collection_info(collection).await?;
            let mut aliases = AliasMap::new();

            if !is_subquery {
                self.apply_pagination(&mut query, spec);
                if !spec.sort.is_empty() {
                    self.apply_sort(collection, &mut query, &spec.sort, &mut aliases)
                        .await?;
                }
            }

            if let Some(term) = spec.search.as_deref() {
                self.apply_search(collection, &mut query, term).await?;
            }

            if !spec.group.is_empty() {
                self.apply_group(collection, &mut query, &spec.group, &mut aliases)
                    .await?;
            }

            let mut has_multi_relational_filter = false;
            if let Some(filter) = &spec.filter {
                has_multi_relational_filter = self
                    .apply_filter(collection, &mut query, filter, &mut aliases, is_subquery)
                    .await?;
            }

            if !spec.aggregate.is_empty() {
                self.apply_aggregate(&info, &mut query, &spec.aggregate, &mut aliases)
                    .await?;
            }

            debug!(
                collection,
                is_subquery,
                joins = aliases.len(),
                "applied query"
            );

            Ok(Applied {
                has_joins: query.has_joins(),
                has_multi_relational_filter,
                query,
            })
        }
        .boxed()
    }

    /// Resolve `limit`/`offset`/`page` against the configured defaults.
    fn apply_pagination(&self, query: &mut Query, spec: &QuerySpec) {
        let mut limit = spec.limit.unwrap_or(self.options.default_limit);
        let max = self.options.max_limit;
        if max >= 0 && (limit < 0 || limit > max) {
            limit = max;
        }

        if let Ok(limit) = u64::try_from(limit) {
            query.set_limit(limit);
        }
        if let Some(offset) = spec.offset {
            query.set_offset(offset);
        }
        if let (Some(page), Ok(limit)) = (spec.page, u64::try_from(limit)) {
            if limit > 0 {
                query.set_offset(limit.saturating_mul(page.saturating_sub(1)));
            }
        }
    }

    async fn collection_info(&self, collection: &str) -> QueryResult<CollectionInfo> {
        self.schema
            .collection(collection)
            .await?
            .ok_or_else(|| QueryError::UnknownCollection(collection.to_string()))
    }

    async fn primary_key(&self, collection: &str) -> QueryResult<String> {
        Ok(self.collection_info(collection).await?.primary)
    }
}
