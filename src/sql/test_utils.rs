//! Parse-back checks for rendered SQL, shared by unit and integration tests.

use sqlparser::dialect::{
    DuckDbDialect, MsSqlDialect, MySqlDialect, PostgreSqlDialect, SQLiteDialect,
};
use sqlparser::parser::Parser;

use super::dialect::Dialect;

/// Parse `sql` with sqlparser's grammar for `dialect`; the error carries
/// the offending statement.
pub fn validate_sql(sql: &str, dialect: Dialect) -> Result<(), String> {
    let grammar: Box<dyn sqlparser::dialect::Dialect> = match dialect {
        Dialect::Postgres => Box::new(PostgreSqlDialect {}),
        Dialect::DuckDb => Box::new(DuckDbDialect {}),
        Dialect::MySql => Box::new(MySqlDialect {}),
        Dialect::TSql => Box::new(MsSqlDialect {}),
        Dialect::Sqlite => Box::new(SQLiteDialect {}),
    };

    match Parser::parse_sql(grammar.as_ref(), sql) {
        Ok(_) => Ok(()),
        Err(e) => Err(format!("{} rejected the statement: {}\n{}", dialect, e, sql)),
    }
}
