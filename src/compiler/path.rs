//! Relation path resolver.
//!
//! Walks a dotted field path one relation hop at a time and emits one LEFT
//! JOIN per hop, recording each alias under its path prefix. The last
//! segment always names a field on the collection reached, so it is never
//! joined itself.

use tracing::debug;

use super::alias::{AliasEntry, AliasMap};
use super::Compilation;
use crate::error::{QueryError, QueryResult};
use crate::schema::{relation_info, split_scope, RelationInfo};
use crate::sql::{cast, lit_str, table_col, CastType, ExprExt, JoinType, Query, TableRef};

impl Compilation<'_> {
    /// Join the relations along `path`, starting at `collection`.
    ///
    /// Idempotent per alias map: hops already recorded are reused. Returns
    /// `true` when a to-many hop was joined, which can repeat root rows.
    pub(super) async fn resolve_path(
        &mut self,
        query: &mut Query,
        aliases: &mut AliasMap,
        collection: &str,
        path: &[String],
        is_subquery: bool,
    ) -> QueryResult<bool> {
        let mut current = collection.to_string();
        let mut parent_alias: Option<String> = None;
        let mut joined_to_many = false;

        for depth in 0..path.len().saturating_sub(1) {
            let segment = path[depth].as_str();
            let prefix = &path[..=depth];
            let relation = relation_info(&self.relations, &current, segment);
            let nested = parent_alias.is_some();

            if matches!(relation, RelationInfo::None) {
                break;
            }

            let entry = match aliases.get(prefix) {
                Some(entry) => entry.clone(),
                None => {
                    // Root one-to-many hops outside a subquery become
                    // existential subqueries instead of joins.
                    if matches!(relation, RelationInfo::OneToMany(_)) && !is_subquery && !nested {
                        break;
                    }
                    let parent = parent_alias.clone().unwrap_or_else(|| current.clone());
                    let entry = self
                        .join_relation(query, &current, &parent, segment, &relation)
                        .await?;
                    if relation.is_to_many() {
                        joined_to_many = true;
                    }
                    aliases.insert(prefix, entry.clone());
                    entry
                }
            };

            let descend = match relation {
                RelationInfo::ManyToOne(_) => true,
                _ => is_subquery || nested,
            };
            if !descend {
                break;
            }
            current = entry.collection;
            parent_alias = Some(entry.alias);
        }

        Ok(joined_to_many)
    }

    /// Emit the join for one hop from `parent` (table name or alias).
    async fn join_relation(
        &mut self,
        query: &mut Query,
        current: &str,
        parent: &str,
        segment: &str,
        relation: &RelationInfo,
    ) -> QueryResult<AliasEntry> {
        let alias = self.aliases.next_alias();

        let (target, on) = match relation {
            RelationInfo::ManyToOne(rel) => {
                let target = rel.related_collection.clone().ok_or_else(|| {
                    QueryError::InvalidQuery(format!(
                        "relation \"{}.{}\" has no related collection",
                        rel.collection, rel.field
                    ))
                })?;
                let pk = self.primary_key(&target).await?;
                let on = table_col(parent, &rel.field).eq(table_col(&alias, &pk));
                (target, on)
            }

            RelationInfo::ManyToAny { relation: rel, scope } => {
                let (field, _) = split_scope(segment);
                let scope = scope.clone().ok_or_else(|| QueryError::MissingPolymorphicScope {
                    collection: current.to_string(),
                    field: field.to_string(),
                })?;
                if !rel.meta.one_allowed_collections.contains(&scope) {
                    return Err(QueryError::InvalidQuery(format!(
                        "\"{}\" is not an allowed collection for \"{}.{}\"",
                        scope, current, field
                    )));
                }
                let discriminator = discriminator(rel.meta.one_collection_field.as_deref(), current, field)?;
                let pk = self.primary_key(&scope).await?;
                let on = table_col(parent, discriminator)
                    .eq(lit_str(&scope))
                    .and(table_col(parent, &rel.field).eq(cast(table_col(&alias, &pk), CastType::Text)));
                (scope, on)
            }

            RelationInfo::OneToMany(rel) => {
                let pk = self.primary_key(current).await?;
                let on = table_col(parent, &pk).eq(table_col(&alias, &rel.field));
                (rel.collection.clone(), on)
            }

            RelationInfo::OneToAny(rel) => {
                let discriminator =
                    discriminator(rel.meta.one_collection_field.as_deref(), &rel.collection, &rel.field)?;
                let pk = self.primary_key(current).await?;
                let on = table_col(&alias, discriminator)
                    .eq(lit_str(current))
                    .and(table_col(&alias, &rel.field).eq(cast(table_col(parent, &pk), CastType::Text)));
                (rel.collection.clone(), on)
            }

            RelationInfo::None => {
                return Err(QueryError::InvalidQuery(format!(
                    "\"{}\" is not a relational field of \"{}\"",
                    segment, current
                )))
            }
        };

        debug!(
            alias = %alias,
            kind = relation.kind(),
            collection = %target,
            "joined relation"
        );
        query.add_join(JoinType::Left, TableRef::new(&target).with_alias(&alias), on);

        Ok(AliasEntry {
            alias,
            collection: target,
        })
    }
}

fn discriminator<'r>(column: Option<&'r str>, collection: &str, field: &str) -> QueryResult<&'r str> {
    column.ok_or_else(|| {
        QueryError::InvalidQuery(format!(
            "polymorphic relation \"{}.{}\" has no collection field",
            collection, field
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{test_schema, AliasGenerator, AliasStyle, CompilerOptions};
    use crate::schema::{CollectionSchema, FieldInfo, FieldType, Relation, SchemaOverview, SchemaProvider};
    use crate::sql::Dialect;

    fn path(p: &str) -> Vec<String> {
        p.split('.').map(String::from).collect()
    }

    async fn compilation<'c>(
        schema: &'c SchemaOverview,
        options: &'c CompilerOptions,
    ) -> Compilation<'c> {
        Compilation {
            schema,
            options,
            relations: schema.relations().await.unwrap(),
            aliases: AliasGenerator::new(AliasStyle::Sequential, 5),
        }
    }

    fn join_sql(query: &Query, index: usize) -> String {
        let join = &query.joins[index];
        format!(
            "{} ON {}",
            join.table.to_tokens().serialize(Dialect::Postgres),
            join.on.to_sql(Dialect::Postgres)
        )
    }

    fn pages() -> SchemaOverview {
        SchemaOverview::new()
            .with_collection(
                CollectionSchema::new("blocks", "id")
                    .with_field(FieldInfo::new("id", FieldType::Integer))
                    .with_field(FieldInfo::new("item", FieldType::String))
                    .with_field(FieldInfo::new("collection", FieldType::String)),
            )
            .with_collection(
                CollectionSchema::new("headings", "id")
                    .with_field(FieldInfo::new("id", FieldType::Uuid))
                    .with_field(FieldInfo::new("text", FieldType::String)),
            )
            .with_relation(Relation::many_to_any("blocks", "item", "collection", &["headings"]))
    }

    #[tokio::test]
    async fn test_many_to_one_join() {
        let schema = test_schema::blog();
        let options = CompilerOptions::default();
        let mut compilation = compilation(&schema, &options).await;
        let mut query = Query::new();
        let mut aliases = AliasMap::new();

        compilation
            .resolve_path(&mut query, &mut aliases, "articles", &path("author.name"), false)
            .await
            .unwrap();

        assert_eq!(query.joins.len(), 1);
        assert_eq!(
            join_sql(&query, 0),
            "\"authors\" AS \"j1\" ON \"articles\".\"author\" = \"j1\".\"id\""
        );
        assert_eq!(aliases.get(&path("author")).unwrap().collection, "authors");
    }

    #[tokio::test]
    async fn test_repeated_paths_reuse_aliases() {
        let schema = test_schema::blog();
        let options = CompilerOptions::default();
        let mut compilation = compilation(&schema, &options).await;
        let mut query = Query::new();
        let mut aliases = AliasMap::new();

        for p in ["author.name", "author.id", "author.name"] {
            compilation
                .resolve_path(&mut query, &mut aliases, "articles", &path(p), false)
                .await
                .unwrap();
        }
        assert_eq!(query.joins.len(), 1);
    }

    #[tokio::test]
    async fn test_root_one_to_many_is_not_joined() {
        let schema = test_schema::blog();
        let options = CompilerOptions::default();
        let mut compilation = compilation(&schema, &options).await;
        let mut aliases = AliasMap::new();

        let mut query = Query::new();
        let to_many = compilation
            .resolve_path(&mut query, &mut aliases, "articles", &path("comments.body"), false)
            .await
            .unwrap();
        assert!(!to_many);
        assert!(query.joins.is_empty());

        // Inside a subquery the same hop is joined.
        let mut query = Query::new();
        let to_many = compilation
            .resolve_path(&mut query, &mut aliases, "articles", &path("comments.body"), true)
            .await
            .unwrap();
        assert!(to_many);
        assert_eq!(
            join_sql(&query, 0),
            "\"comments\" AS \"j1\" ON \"articles\".\"id\" = \"j1\".\"article\""
        );
    }

    #[tokio::test]
    async fn test_nested_one_to_many_is_joined() {
        let schema = test_schema::blog();
        let options = CompilerOptions::default();
        let mut compilation = compilation(&schema, &options).await;
        let mut query = Query::new();
        let mut aliases = AliasMap::new();

        let to_many = compilation
            .resolve_path(
                &mut query,
                &mut aliases,
                "comments",
                &path("article.author.articles.title"),
                false,
            )
            .await
            .unwrap();
        assert!(to_many);
        assert_eq!(query.joins.len(), 3);
        assert_eq!(
            join_sql(&query, 2),
            "\"articles\" AS \"j3\" ON \"j2\".\"id\" = \"j3\".\"author\""
        );
    }

    #[tokio::test]
    async fn test_many_to_any_requires_scope() {
        let schema = pages();
        let options = CompilerOptions::default();
        let mut compilation = compilation(&schema, &options).await;
        let mut query = Query::new();
        let mut aliases = AliasMap::new();

        let err = compilation
            .resolve_path(&mut query, &mut aliases, "blocks", &path("item.text"), false)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            QueryError::MissingPolymorphicScope { ref collection, ref field }
                if collection == "blocks" && field == "item"
        ));

        let err = compilation
            .resolve_path(&mut query, &mut aliases, "blocks", &path("item:pages.text"), false)
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidQuery(_)));
    }

    #[tokio::test]
    async fn test_many_to_any_join_casts_key() {
        let schema = pages();
        let options = CompilerOptions::default();
        let mut compilation = compilation(&schema, &options).await;
        let mut query = Query::new();
        let mut aliases = AliasMap::new();

        compilation
            .resolve_path(&mut query, &mut aliases, "blocks", &path("item:headings.text"), false)
            .await
            .unwrap();
        assert_eq!(
            join_sql(&query, 0),
            "\"headings\" AS \"j1\" ON \"blocks\".\"collection\" = 'headings' \
             AND \"blocks\".\"item\" = CAST(\"j1\".\"id\" AS TEXT)"
        );
    }

    #[tokio::test]
    async fn test_follow_one_to_any() {
        let schema = pages();
        let options = CompilerOptions::default();
        let mut compilation = compilation(&schema, &options).await;
        let mut query = Query::new();
        let mut aliases = AliasMap::new();

        compilation
            .resolve_path(
                &mut query,
                &mut aliases,
                "headings",
                &path("$FOLLOW(blocks, item, collection).id"),
                true,
            )
            .await
            .unwrap();
        assert_eq!(
            join_sql(&query, 0),
            "\"blocks\" AS \"j1\" ON \"j1\".\"collection\" = 'headings' \
             AND \"j1\".\"item\" = CAST(\"headings\".\"id\" AS TEXT)"
        );
    }
}
