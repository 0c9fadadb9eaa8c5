//! Join alias generation and bookkeeping.
//!
//! An [`AliasGenerator`] lives for one top-level compile and is shared with
//! the subqueries it spawns, so no alias is ever issued twice within a
//! statement. Each (sub)query records its own joins in an [`AliasMap`].

use std::collections::{HashMap, HashSet};

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// How join aliases are spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AliasStyle {
    /// Short random lowercase names such as `qhzrt`.
    #[default]
    Random,
    /// `j1`, `j2`, ... in traversal order. Stable output for tests and snapshots.
    Sequential,
}

/// Words a random alias must never spell.
const RESERVED: &[&str] = &[
    "and", "as", "asc", "by", "case", "cross", "desc", "else", "end", "fetch", "first", "from",
    "full", "group", "in", "inner", "is", "join", "left", "like", "limit", "not", "null", "nulls",
    "on", "or", "order", "outer", "right", "rows", "select", "table", "then", "union", "using",
    "when", "where", "with",
];

/// Consecutive collisions tolerated before random aliases get longer.
const MAX_COLLISIONS: usize = 64;

#[derive(Debug)]
pub struct AliasGenerator {
    style: AliasStyle,
    length: usize,
    counter: usize,
    issued: HashSet<String>,
}

impl AliasGenerator {
    pub fn new(style: AliasStyle, length: usize) -> Self {
        Self {
            style,
            length: length.max(1),
            counter: 0,
            issued: HashSet::new(),
        }
    }

    /// A fresh alias, unique for the lifetime of this generator.
    ///
    /// Random aliases grow by one letter once the current length keeps
    /// colliding, so a statement can never run out of names.
    pub fn next_alias(&mut self) -> String {
        if self.style == AliasStyle::Sequential {
            self.counter += 1;
            let alias = format!("j{}", self.counter);
            self.issued.insert(alias.clone());
            return alias;
        }

        let mut rng = rand::rng();
        let mut collisions = 0;
        loop {
            let candidate: String = (0..self.length)
                .map(|_| char::from(rng.random_range(b'a'..=b'z')))
                .collect();
            if !RESERVED.contains(&candidate.as_str()) && self.issued.insert(candidate.clone()) {
                return candidate;
            }
            collisions += 1;
            if collisions == MAX_COLLISIONS {
                trace!(length = self.length, "alias space crowded, widening");
                self.length += 1;
                collisions = 0;
            }
        }
    }
}

/// A join recorded for a path prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasEntry {
    pub alias: String,
    /// Collection the alias points at.
    pub collection: String,
}

/// Joins of one query, keyed by dotted path prefix (scopes included,
/// e.g. `item:headings.author`).
#[derive(Debug, Clone, Default)]
pub struct AliasMap {
    entries: HashMap<String, AliasEntry>,
}

impl AliasMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &[String]) -> Option<&AliasEntry> {
        self.entries.get(&path.join("."))
    }

    pub fn insert(&mut self, path: &[String], entry: AliasEntry) {
        self.entries.insert(path.join("."), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
