//! # relq
//!
//! Compiles relational JSON query objects into multi-dialect SQL.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │              QuerySpec (JSON request object)             │
//! │  (filter, sort, aggregate, group, search, pagination)    │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [compiler]
//! ┌─────────────────────────────────────────────────────────┐
//! │        Path resolver + filter/sort/aggregate passes      │
//! │        (reads the schema graph through SchemaProvider)   │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [sql]
//! ┌─────────────────────────────────────────────────────────┐
//! │                SQL Query (per dialect)                   │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod compiler;
pub mod config;
pub mod error;
pub mod query;
pub mod schema;
pub mod sql;

pub use compiler::{Applied, Compiler, CompilerOptions};
pub use error::{QueryError, QueryResult};
pub use query::{Filter, QuerySpec};
pub use schema::{SchemaOverview, SchemaProvider};
pub use sql::{Dialect, Query};

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::compiler::{AliasStyle, Applied, Compiler, CompilerOptions};
    pub use crate::error::{QueryError, QueryResult};
    pub use crate::query::{Aggregate, AggregateOp, Filter, Operator, QuerySpec};
    pub use crate::schema::{
        CollectionInfo, FieldInfo, FieldType, Relation, SchemaOverview, SchemaProvider,
    };
    pub use crate::sql::{Dialect, Expr, ExprExt, Query, SqlDialect};
}
