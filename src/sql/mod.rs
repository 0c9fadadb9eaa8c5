//! The SQL target the compiler writes into.
//!
//! - [`query`]: the SELECT statement being assembled
//! - [`expr`]: scalar expressions and the fluent [`ExprExt`] combinators
//! - [`token`]: the flat token stream expressions lower to
//! - [`dialect`]: per-backend quoting, windows, dates and capabilities

pub mod dialect;
pub mod expr;
pub mod query;
pub mod test_utils;
pub mod token;

pub use dialect::{DateKind, DatePart, Dialect, SqlDialect};
pub use expr::{
    avg, avg_distinct, cast, col, count, count_distinct, count_star, func, lit_int, lit_str, lower,
    max, min, raw_sql, sum, sum_distinct, table_col, table_star, BinaryOperator, CastType, Expr,
    ExprExt, Literal,
};
pub use query::{Join, JoinType, LimitOffset, OrderByExpr, Query, SelectExpr, SortDir, TableRef};
pub use token::{Keyword, Token, TokenStream};
