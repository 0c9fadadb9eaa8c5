//! Scalar SQL expressions.
//!
//! Everything the compiler places in a WHERE, ON, ORDER BY or SELECT list is
//! an [`Expr`]. Request values only ever enter the tree as [`Literal`]s, which
//! the dialect quotes on output.

use super::dialect::{Dialect, SqlDialect};
use super::query::{Query, SelectExpr};
use super::token::{Keyword, Token, TokenStream};

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Column {
        table: Option<String>,
        name: String,
    },
    Literal(Literal),
    Binary {
        lhs: Box<Expr>,
        op: BinaryOperator,
        rhs: Box<Expr>,
    },
    Not(Box<Expr>),
    Call {
        name: String,
        args: Vec<Expr>,
        distinct: bool,
    },
    /// A scalar subquery, e.g. a correlated `COUNT(*)`.
    Subquery(Box<Query>),
    InList {
        expr: Box<Expr>,
        list: Vec<Expr>,
        negated: bool,
    },
    InQuery {
        expr: Box<Expr>,
        query: Box<Query>,
        negated: bool,
    },
    Between {
        expr: Box<Expr>,
        low: Box<Expr>,
        high: Box<Expr>,
        negated: bool,
    },
    IsNull {
        expr: Box<Expr>,
        negated: bool,
    },
    /// `*` or `table.*`
    AllColumns {
        table: Option<String>,
    },
    Nested(Box<Expr>),
    Cast {
        expr: Box<Expr>,
        target: CastType,
    },
    /// Dialect vocabulary emitted verbatim (`year` in `DATEPART(year, ..)`).
    /// Never built from request input.
    Raw(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    String(String),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Eq,
    Ne,
    Lt,
    Gt,
    Lte,
    Gte,
    And,
    Or,
    Div,
    Like,
    NotLike,
}

impl BinaryOperator {
    fn push_to(self, ts: &mut TokenStream) {
        match self {
            BinaryOperator::Eq => ts.sym("="),
            BinaryOperator::Ne => ts.sym("<>"),
            BinaryOperator::Lt => ts.sym("<"),
            BinaryOperator::Gt => ts.sym(">"),
            BinaryOperator::Lte => ts.sym("<="),
            BinaryOperator::Gte => ts.sym(">="),
            BinaryOperator::Div => ts.sym("/"),
            BinaryOperator::And => ts.kw(Keyword::And),
            BinaryOperator::Or => ts.kw(Keyword::Or),
            BinaryOperator::Like => ts.kw(Keyword::Like),
            BinaryOperator::NotLike => ts.kw(Keyword::Not).space().kw(Keyword::Like),
        };
    }
}

/// Portable cast targets; the concrete type name comes from the dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastType {
    /// Common text form used to compare polymorphic keys.
    Text,
    Integer,
}

impl CastType {
    fn type_name(self, dialect: Dialect) -> &'static str {
        match self {
            CastType::Text => dialect.text_cast_type(),
            CastType::Integer => dialect.integer_cast_type(),
        }
    }
}

impl Literal {
    fn to_token(&self) -> Token {
        match self {
            Literal::Int(n) => Token::Int(*n),
            Literal::Float(f) => Token::Float(*f),
            Literal::String(s) => Token::Str(s.clone()),
            Literal::Bool(b) => Token::Bool(*b),
            Literal::Null => Token::Keyword(Keyword::Null),
        }
    }
}

impl Expr {
    pub fn to_tokens_for_dialect(&self, dialect: Dialect) -> TokenStream {
        let mut ts = TokenStream::new();
        self.write(&mut ts, dialect);
        ts
    }

    fn write(&self, ts: &mut TokenStream, dialect: Dialect) {
        match self {
            Expr::Column { table, name } => {
                if let Some(table) = table {
                    ts.push(Token::Ident(table.clone())).sym(".");
                }
                ts.push(Token::Ident(name.clone()));
            }
            Expr::Literal(lit) => {
                ts.push(lit.to_token());
            }
            Expr::Binary { lhs, op, rhs } => {
                lhs.write(ts, dialect);
                ts.space();
                op.push_to(ts);
                ts.space();
                rhs.write(ts, dialect);
            }
            Expr::Not(inner) => {
                ts.kw(Keyword::Not).space();
                inner.write(ts, dialect);
            }
            Expr::Call {
                name,
                args,
                distinct,
            } => {
                ts.push(Token::Function(name.clone())).lparen();
                if *distinct {
                    ts.kw(Keyword::Distinct).space();
                }
                let args: Vec<_> = args
                    .iter()
                    .map(|a| a.to_tokens_for_dialect(dialect))
                    .collect();
                ts.comma_list(&args).rparen();
            }
            Expr::Subquery(query) => {
                ts.lparen()
                    .append(&query.to_tokens_for_dialect(dialect))
                    .rparen();
            }
            // `IN ()` is a syntax error everywhere. An empty list matches
            // nothing, an empty negated list matches everything; both are
            // spelled as integer comparisons because T-SQL has no boolean
            // literals.
            Expr::InList { list, negated, .. } if list.is_empty() => {
                ts.push(Token::Int(1))
                    .space()
                    .sym("=")
                    .space()
                    .push(Token::Int(i64::from(*negated)));
            }
            Expr::InList {
                expr,
                list,
                negated,
            } => {
                expr.write(ts, dialect);
                push_in(ts, *negated);
                let items: Vec<_> = list
                    .iter()
                    .map(|v| v.to_tokens_for_dialect(dialect))
                    .collect();
                ts.lparen().comma_list(&items).rparen();
            }
            Expr::InQuery {
                expr,
                query,
                negated,
            } => {
                expr.write(ts, dialect);
                push_in(ts, *negated);
                ts.lparen()
                    .append(&query.to_tokens_for_dialect(dialect))
                    .rparen();
            }
            Expr::Between {
                expr,
                low,
                high,
                negated,
            } => {
                expr.write(ts, dialect);
                if *negated {
                    ts.space().kw(Keyword::Not);
                }
                ts.space().kw(Keyword::Between).space();
                low.write(ts, dialect);
                ts.space().kw(Keyword::And).space();
                high.write(ts, dialect);
            }
            Expr::IsNull { expr, negated } => {
                expr.write(ts, dialect);
                ts.space().kw(if *negated {
                    Keyword::IsNotNull
                } else {
                    Keyword::IsNull
                });
            }
            Expr::AllColumns { table } => {
                if let Some(table) = table {
                    ts.push(Token::Ident(table.clone())).sym(".");
                }
                ts.sym("*");
            }
            Expr::Nested(inner) => {
                ts.lparen();
                inner.write(ts, dialect);
                ts.rparen();
            }
            Expr::Cast { expr, target } => {
                ts.kw(Keyword::Cast).lparen();
                expr.write(ts, dialect);
                ts.space()
                    .kw(Keyword::As)
                    .space()
                    .push(Token::TypeName(target.type_name(dialect).to_string()))
                    .rparen();
            }
            Expr::Raw(sql) => {
                ts.push(Token::Raw(sql.clone()));
            }
        }
    }

    pub fn to_sql(&self, dialect: Dialect) -> String {
        self.to_tokens_for_dialect(dialect).serialize(dialect)
    }

    /// A top-level OR, which must be parenthesized before it is ANDed.
    pub fn is_disjunction(&self) -> bool {
        matches!(
            self,
            Expr::Binary {
                op: BinaryOperator::Or,
                ..
            }
        )
    }
}

fn push_in(ts: &mut TokenStream, negated: bool) {
    if negated {
        ts.space().kw(Keyword::Not);
    }
    ts.space().kw(Keyword::In).space();
}

pub fn col(name: &str) -> Expr {
    Expr::Column {
        table: None,
        name: name.into(),
    }
}

pub fn table_col(table: &str, name: &str) -> Expr {
    Expr::Column {
        table: Some(table.into()),
        name: name.into(),
    }
}

pub fn lit_int(n: i64) -> Expr {
    Expr::Literal(Literal::Int(n))
}

pub fn lit_str(s: &str) -> Expr {
    Expr::Literal(Literal::String(s.into()))
}

pub fn table_star(table: &str) -> Expr {
    Expr::AllColumns {
        table: Some(table.into()),
    }
}

pub fn cast(expr: Expr, target: CastType) -> Expr {
    Expr::Cast {
        expr: Box::new(expr),
        target,
    }
}

pub fn func(name: &str, args: Vec<Expr>) -> Expr {
    Expr::Call {
        name: name.into(),
        args,
        distinct: false,
    }
}

fn distinct_func(name: &str, arg: Expr) -> Expr {
    Expr::Call {
        name: name.into(),
        args: vec![arg],
        distinct: true,
    }
}

pub fn lower(expr: Expr) -> Expr {
    func("LOWER", vec![expr])
}

pub fn count(expr: Expr) -> Expr {
    func("COUNT", vec![expr])
}

pub fn count_star() -> Expr {
    count(Expr::AllColumns { table: None })
}

pub fn count_distinct(expr: Expr) -> Expr {
    distinct_func("COUNT", expr)
}

pub fn sum(expr: Expr) -> Expr {
    func("SUM", vec![expr])
}

pub fn sum_distinct(expr: Expr) -> Expr {
    distinct_func("SUM", expr)
}

pub fn avg(expr: Expr) -> Expr {
    func("AVG", vec![expr])
}

pub fn avg_distinct(expr: Expr) -> Expr {
    distinct_func("AVG", expr)
}

pub fn min(expr: Expr) -> Expr {
    func("MIN", vec![expr])
}

pub fn max(expr: Expr) -> Expr {
    func("MAX", vec![expr])
}

/// See [`Expr::Raw`].
pub fn raw_sql(sql: &str) -> Expr {
    Expr::Raw(sql.into())
}

/// Fluent combinators over anything convertible to an [`Expr`].
pub trait ExprExt: Sized {
    fn into_expr(self) -> Expr;

    fn binary(self, op: BinaryOperator, rhs: impl Into<Expr>) -> Expr {
        Expr::Binary {
            lhs: Box::new(self.into_expr()),
            op,
            rhs: Box::new(rhs.into()),
        }
    }

    fn eq(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOperator::Eq, other)
    }

    fn ne(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOperator::Ne, other)
    }

    fn gt(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOperator::Gt, other)
    }

    fn gte(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOperator::Gte, other)
    }

    fn lt(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOperator::Lt, other)
    }

    fn lte(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOperator::Lte, other)
    }

    fn and(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOperator::And, other)
    }

    fn or(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOperator::Or, other)
    }

    fn div(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOperator::Div, other)
    }

    fn like(self, pattern: impl Into<Expr>) -> Expr {
        self.binary(BinaryOperator::Like, pattern)
    }

    fn not_like(self, pattern: impl Into<Expr>) -> Expr {
        self.binary(BinaryOperator::NotLike, pattern)
    }

    fn not(self) -> Expr {
        Expr::Not(Box::new(self.into_expr()))
    }

    #[allow(clippy::wrong_self_convention)]
    fn is_null(self) -> Expr {
        Expr::IsNull {
            expr: Box::new(self.into_expr()),
            negated: false,
        }
    }

    #[allow(clippy::wrong_self_convention)]
    fn is_not_null(self) -> Expr {
        Expr::IsNull {
            expr: Box::new(self.into_expr()),
            negated: true,
        }
    }

    fn in_list(self, list: Vec<Expr>) -> Expr {
        Expr::InList {
            expr: Box::new(self.into_expr()),
            list,
            negated: false,
        }
    }

    fn not_in_list(self, list: Vec<Expr>) -> Expr {
        Expr::InList {
            expr: Box::new(self.into_expr()),
            list,
            negated: true,
        }
    }

    fn in_subquery(self, query: Query) -> Expr {
        Expr::InQuery {
            expr: Box::new(self.into_expr()),
            query: Box::new(query),
            negated: false,
        }
    }

    fn not_in_subquery(self, query: Query) -> Expr {
        Expr::InQuery {
            expr: Box::new(self.into_expr()),
            query: Box::new(query),
            negated: true,
        }
    }

    fn between(self, low: impl Into<Expr>, high: impl Into<Expr>) -> Expr {
        Expr::Between {
            expr: Box::new(self.into_expr()),
            low: Box::new(low.into()),
            high: Box::new(high.into()),
            negated: false,
        }
    }

    fn not_between(self, low: impl Into<Expr>, high: impl Into<Expr>) -> Expr {
        Expr::Between {
            expr: Box::new(self.into_expr()),
            low: Box::new(low.into()),
            high: Box::new(high.into()),
            negated: true,
        }
    }

    fn paren(self) -> Expr {
        Expr::Nested(Box::new(self.into_expr()))
    }

    /// Project under `name` in a SELECT list.
    fn alias(self, name: &str) -> SelectExpr {
        SelectExpr::new(self.into_expr()).with_alias(name)
    }
}

impl ExprExt for Expr {
    fn into_expr(self) -> Expr {
        self
    }
}

impl From<Literal> for Expr {
    fn from(lit: Literal) -> Self {
        Expr::Literal(lit)
    }
}

impl From<i64> for Expr {
    fn from(n: i64) -> Self {
        Literal::Int(n).into()
    }
}

impl From<i32> for Expr {
    fn from(n: i32) -> Self {
        Literal::Int(n.into()).into()
    }
}

impl From<f64> for Expr {
    fn from(f: f64) -> Self {
        Literal::Float(f).into()
    }
}

impl From<&str> for Expr {
    fn from(s: &str) -> Self {
        Literal::String(s.into()).into()
    }
}

impl From<String> for Expr {
    fn from(s: String) -> Self {
        Literal::String(s).into()
    }
}

impl From<bool> for Expr {
    fn from(b: bool) -> Self {
        Literal::Bool(b).into()
    }
}
