//! Relation classification for a (collection, field) pair.

use super::types::{Relation, RelationMeta};

/// How a field relates its collection to another one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationInfo {
    /// Scalar field, no relation.
    None,
    /// The field holds a foreign key to one row of `related_collection`.
    ManyToOne(Relation),
    /// Alias field listing the rows of `relation.collection` pointing back here.
    OneToMany(Relation),
    /// Polymorphic foreign key; `scope` names the target collection when the
    /// path segment carried one.
    ManyToAny {
        relation: Relation,
        scope: Option<String>,
    },
    /// Inverse of a polymorphic key: rows of `relation.collection` whose
    /// discriminator names this collection.
    OneToAny(Relation),
}

impl RelationInfo {
    /// To-many relations are filtered through existential subqueries.
    pub fn is_to_many(&self) -> bool {
        matches!(self, RelationInfo::OneToMany(_) | RelationInfo::OneToAny(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RelationInfo::None => "none",
            RelationInfo::ManyToOne(_) => "m2o",
            RelationInfo::OneToMany(_) => "o2m",
            RelationInfo::ManyToAny { .. } => "a2o",
            RelationInfo::OneToAny(_) => "o2a",
        }
    }
}

/// Split `field:scope` into the field name and its polymorphic scope.
pub fn split_scope(segment: &str) -> (&str, Option<&str>) {
    match segment.split_once(':') {
        Some((field, scope)) => (field, Some(scope)),
        None => (segment, None),
    }
}

/// Classify `segment` (optionally `field:scope`, or `$FOLLOW(...)`) on `collection`.
pub fn relation_info(relations: &[Relation], collection: &str, segment: &str) -> RelationInfo {
    if let Some(follow) = parse_follow(collection, segment) {
        return follow;
    }

    let (field, scope) = split_scope(segment);

    for relation in relations {
        if relation.collection == collection && relation.field == field {
            if relation.related_collection.is_some() {
                return RelationInfo::ManyToOne(relation.clone());
            }
            if relation.meta.one_collection_field.is_some()
                && !relation.meta.one_allowed_collections.is_empty()
            {
                return RelationInfo::ManyToAny {
                    relation: relation.clone(),
                    scope: scope.map(str::to_string),
                };
            }
        }
    }

    for relation in relations {
        if relation.meta.one_field.as_deref() != Some(field) {
            continue;
        }
        match &relation.related_collection {
            Some(related) if related == collection => {
                return RelationInfo::OneToMany(relation.clone());
            }
            None if relation
                .meta
                .one_allowed_collections
                .iter()
                .any(|c| c == collection) =>
            {
                return RelationInfo::OneToAny(relation.clone());
            }
            _ => {}
        }
    }

    RelationInfo::None
}

/// `$FOLLOW(collection, field)` follows an undeclared reverse relation;
/// the three-argument form names a polymorphic discriminator column.
fn parse_follow(parent: &str, segment: &str) -> Option<RelationInfo> {
    let inner = segment.strip_prefix("$FOLLOW(")?.strip_suffix(')')?;
    let parts: Vec<&str> = inner.split(',').map(str::trim).collect();

    match parts.as_slice() {
        [collection, field] => Some(RelationInfo::OneToMany(Relation {
            collection: collection.to_string(),
            field: field.to_string(),
            related_collection: Some(parent.to_string()),
            meta: RelationMeta::default(),
        })),
        [collection, field, discriminator] => Some(RelationInfo::OneToAny(Relation {
            collection: collection.to_string(),
            field: field.to_string(),
            related_collection: None,
            meta: RelationMeta {
                one_collection_field: Some(discriminator.to_string()),
                one_allowed_collections: vec![parent.to_string()],
                ..RelationMeta::default()
            },
        })),
        _ => None,
    }
}
