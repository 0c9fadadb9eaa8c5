//! The SELECT statement the compiler writes into.
//!
//! A `Query` starts life as `FROM <collection>` and is grown in place by the
//! compiler passes: joins are appended as relational paths are resolved,
//! conditions are ANDed onto the WHERE clause, and projections, groupings,
//! orderings and the row window are filled in last.

use super::dialect::{Dialect, SqlDialect};
use super::expr::{table_star, Expr, ExprExt};
use super::token::{Keyword, Token, TokenStream};

/// One projected column, optionally aliased.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectExpr {
    pub expr: Expr,
    pub alias: Option<String>,
}

impl SelectExpr {
    pub fn new(expr: Expr) -> Self {
        Self { expr, alias: None }
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn to_tokens_for_dialect(&self, dialect: Dialect) -> TokenStream {
        let mut ts = self.expr.to_tokens_for_dialect(dialect);
        push_alias(&mut ts, self.alias.as_deref());
        ts
    }
}

impl From<Expr> for SelectExpr {
    fn from(expr: Expr) -> Self {
        SelectExpr::new(expr)
    }
}

/// A collection table, aliased when it is joined in.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRef {
    pub table: String,
    pub alias: Option<String>,
}

impl TableRef {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.into(),
            alias: None,
        }
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Name that column references must use for this table.
    pub fn reference_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.table)
    }

    pub fn to_tokens(&self) -> TokenStream {
        let mut ts = TokenStream::new();
        ts.push(Token::Ident(self.table.clone()));
        push_alias(&mut ts, self.alias.as_deref());
        ts
    }
}

fn push_alias(ts: &mut TokenStream, alias: Option<&str>) {
    if let Some(alias) = alias {
        ts.space()
            .kw(Keyword::As)
            .space()
            .push(Token::Ident(alias.to_string()));
    }
}

/// Relational paths only ever need outer joins: a missing related row must
/// not drop the parent row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Left,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub join_type: JoinType,
    pub table: TableRef,
    pub on: Expr,
}

impl Join {
    pub fn to_tokens_for_dialect(&self, dialect: Dialect) -> TokenStream {
        let mut ts = TokenStream::new();
        ts.kw(match self.join_type {
            JoinType::Left => Keyword::LeftJoin,
        });
        ts.space().append(&self.table.to_tokens());
        ts.space().kw(Keyword::On).space();
        ts.append(&self.on.to_tokens_for_dialect(dialect));
        ts
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderByExpr {
    pub expr: Expr,
    pub dir: SortDir,
}

impl OrderByExpr {
    pub fn asc(expr: Expr) -> Self {
        Self {
            expr,
            dir: SortDir::Asc,
        }
    }

    pub fn desc(expr: Expr) -> Self {
        Self {
            expr,
            dir: SortDir::Desc,
        }
    }

    pub fn to_tokens_for_dialect(&self, dialect: Dialect) -> TokenStream {
        let mut ts = self.expr.to_tokens_for_dialect(dialect);
        ts.space().kw(match self.dir {
            SortDir::Asc => Keyword::Asc,
            SortDir::Desc => Keyword::Desc,
        });
        ts
    }
}

/// The row window. `None` on either side means "not constrained".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LimitOffset {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl LimitOffset {
    pub fn to_tokens(&self, dialect: Dialect) -> TokenStream {
        dialect.emit_limit_offset(self.limit, self.offset)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
#[must_use = "a Query does nothing until it is rendered with to_sql()"]
pub struct Query {
    pub select: Vec<SelectExpr>,
    pub from: Option<TableRef>,
    pub joins: Vec<Join>,
    pub where_clause: Option<Expr>,
    pub group_by: Vec<Expr>,
    pub order_by: Vec<OrderByExpr>,
    pub limit_offset: Option<LimitOffset>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(mut self, exprs: Vec<impl Into<SelectExpr>>) -> Self {
        self.select = exprs.into_iter().map(Into::into).collect();
        self
    }

    /// Project every column of `table` and nothing else.
    pub fn select_table_star(mut self, table: &str) -> Self {
        self.select = vec![SelectExpr::new(table_star(table))];
        self
    }

    pub fn from(mut self, table: TableRef) -> Self {
        self.from = Some(table);
        self
    }

    pub fn filter(mut self, condition: Expr) -> Self {
        self.add_filter(condition);
        self
    }

    pub fn add_join(&mut self, join_type: JoinType, table: TableRef, on: Expr) {
        self.joins.push(Join {
            join_type,
            table,
            on,
        });
    }

    /// AND `condition` onto the WHERE clause. An OR on either side is wrapped
    /// in parentheses first so the conjunction keeps its meaning.
    pub fn add_filter(&mut self, condition: Expr) {
        let wrap = |e: Expr| if e.is_disjunction() { e.paren() } else { e };
        let condition = wrap(condition);
        self.where_clause = Some(match self.where_clause.take() {
            Some(existing) => wrap(existing).and(condition),
            None => condition,
        });
    }

    pub fn add_select(&mut self, expr: impl Into<SelectExpr>) {
        self.select.push(expr.into());
    }

    pub fn add_group_by(&mut self, expr: Expr) {
        self.group_by.push(expr);
    }

    pub fn add_order_by(&mut self, order: OrderByExpr) {
        self.order_by.push(order);
    }

    pub fn set_limit(&mut self, limit: u64) {
        self.limit_offset.get_or_insert_with(LimitOffset::default).limit = Some(limit);
    }

    pub fn set_offset(&mut self, offset: u64) {
        self.limit_offset.get_or_insert_with(LimitOffset::default).offset = Some(offset);
    }

    pub fn has_joins(&self) -> bool {
        !self.joins.is_empty()
    }

    pub fn to_tokens_for_dialect(&self, dialect: Dialect) -> TokenStream {
        let mut ts = TokenStream::new();

        ts.kw(Keyword::Select);
        for (i, item) in self.select.iter().enumerate() {
            if i > 0 {
                ts.comma();
            }
            ts.newline().indent(1);
            ts.append(&item.to_tokens_for_dialect(dialect));
        }

        if let Some(from) = &self.from {
            ts.newline().kw(Keyword::From).space();
            ts.append(&from.to_tokens());
        }

        for join in &self.joins {
            ts.newline();
            ts.append(&join.to_tokens_for_dialect(dialect));
        }

        if let Some(condition) = &self.where_clause {
            ts.newline().kw(Keyword::Where).space();
            ts.append(&condition.to_tokens_for_dialect(dialect));
        }

        if !self.group_by.is_empty() {
            let items: Vec<_> = self
                .group_by
                .iter()
                .map(|e| e.to_tokens_for_dialect(dialect))
                .collect();
            ts.newline().kw(Keyword::GroupBy).space().comma_list(&items);
        }

        if !self.order_by.is_empty() {
            let items: Vec<_> = self
                .order_by
                .iter()
                .map(|o| o.to_tokens_for_dialect(dialect))
                .collect();
            ts.newline().kw(Keyword::OrderBy).space().comma_list(&items);
        } else if self.limit_offset.is_some() && dialect.requires_order_by_for_offset() {
            // OFFSET/FETCH is only legal after an ORDER BY; row order stays
            // unspecified.
            ts.newline()
                .kw(Keyword::OrderBy)
                .space()
                .lparen()
                .kw(Keyword::Select)
                .space()
                .kw(Keyword::Null)
                .rparen();
        }

        if let Some(window) = &self.limit_offset {
            ts.newline();
            ts.append(&window.to_tokens(dialect));
        }

        ts
    }

    pub fn to_sql(&self, dialect: Dialect) -> String {
        self.to_tokens_for_dialect(dialect).serialize(dialect)
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_sql(Dialect::default()))
    }
}
