//! Errors raised while compiling a query.

use crate::schema::SchemaError;

/// Error type for query compilation.
///
/// Every variant is a request-validation failure; nothing here is retried.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("Missing scope for polymorphic field \"{field}\" on \"{collection}\": use \"{field}:<collection>\"")]
    MissingPolymorphicScope { collection: String, field: String },

    #[error("Operator \"{operator}\" is not allowed for field \"{field}\" of type \"{field_type}\"")]
    OperatorNotAllowedForType {
        field: String,
        field_type: String,
        operator: String,
    },

    #[error("Operator \"{operator}\" is not allowed for concealed field \"{field}\"")]
    OperatorNotAllowedForConcealedField { field: String, operator: String },

    #[error("Unknown filter operator \"{0}\"")]
    UnknownOperator(String),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Collection \"{0}\" does not exist")]
    UnknownCollection(String),

    #[error("Field \"{field}\" does not exist on collection \"{collection}\"")]
    UnknownField { collection: String, field: String },

    #[error("Invalid function \"{function}\" on field \"{field}\": {reason}")]
    InvalidFunction {
        function: String,
        field: String,
        reason: String,
    },

    #[error("\"{feature}\" is not supported by the {dialect} dialect")]
    UnsupportedByDialect { feature: String, dialect: String },

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),
}

pub type QueryResult<T> = Result<T, QueryError>;
