//! Lexical pieces of rendered SQL.
//!
//! Expressions and queries are lowered to a flat [`TokenStream`] first and
//! serialized in one pass, so quoting and literal spelling are decided in a
//! single place per dialect.

use super::dialect::{Dialect, SqlDialect};

/// Reserved words the compiler emits. Multi-word keywords (`GROUP BY`,
/// `IS NOT NULL`) are kept as one unit so nothing can be spliced between
/// their parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Select,
    From,
    Where,
    And,
    Or,
    Not,
    As,
    On,
    LeftJoin,
    GroupBy,
    OrderBy,
    Asc,
    Desc,
    Limit,
    Offset,
    FetchNext,
    Rows,
    Only,
    In,
    Between,
    Like,
    IsNull,
    IsNotNull,
    Distinct,
    Cast,
    Null,
}

impl Keyword {
    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Select => "SELECT",
            Keyword::From => "FROM",
            Keyword::Where => "WHERE",
            Keyword::And => "AND",
            Keyword::Or => "OR",
            Keyword::Not => "NOT",
            Keyword::As => "AS",
            Keyword::On => "ON",
            Keyword::LeftJoin => "LEFT JOIN",
            Keyword::GroupBy => "GROUP BY",
            Keyword::OrderBy => "ORDER BY",
            Keyword::Asc => "ASC",
            Keyword::Desc => "DESC",
            Keyword::Limit => "LIMIT",
            Keyword::Offset => "OFFSET",
            Keyword::FetchNext => "FETCH NEXT",
            Keyword::Rows => "ROWS",
            Keyword::Only => "ONLY",
            Keyword::In => "IN",
            Keyword::Between => "BETWEEN",
            Keyword::Like => "LIKE",
            Keyword::IsNull => "IS NULL",
            Keyword::IsNotNull => "IS NOT NULL",
            Keyword::Distinct => "DISTINCT",
            Keyword::Cast => "CAST",
            Keyword::Null => "NULL",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Keyword(Keyword),
    /// Punctuation and operators (`,`, `.`, `*`, `(`, `=`, `<>`, ...).
    Symbol(&'static str),

    Space,
    Newline,
    Indent(usize),

    /// Quoted with the dialect's identifier quotes.
    Ident(String),
    Int(i64),
    /// Non-finite values render as NULL.
    Float(f64),
    /// Quoted and escaped for the dialect.
    Str(String),
    /// `true`/`false` or `1`/`0` depending on the dialect.
    Bool(bool),
    /// Uppercased on output.
    Function(String),
    /// Already resolved for the dialect.
    TypeName(String),
    /// Emitted verbatim. Only dialect vocabulary (date part names, format
    /// patterns) may go here, never request values.
    Raw(String),
}

impl Token {
    pub fn serialize(&self, dialect: Dialect) -> String {
        match self {
            Token::Keyword(kw) => kw.as_str().to_string(),
            Token::Symbol(s) => (*s).to_string(),
            Token::Space => " ".to_string(),
            Token::Newline => "\n".to_string(),
            Token::Indent(depth) => "  ".repeat(*depth),
            Token::Ident(name) => dialect.quote_identifier(name),
            Token::Int(n) => n.to_string(),
            Token::Float(f) if f.is_finite() => ryu::Buffer::new().format(*f).to_string(),
            Token::Float(_) => Keyword::Null.as_str().to_string(),
            Token::Str(s) => dialect.quote_string(s),
            Token::Bool(b) => dialect.format_bool(*b).to_string(),
            Token::Function(name) => name.to_uppercase(),
            Token::TypeName(name) | Token::Raw(name) => name.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, token: Token) -> &mut Self {
        self.tokens.push(token);
        self
    }

    pub fn append(&mut self, other: &TokenStream) -> &mut Self {
        self.tokens.extend_from_slice(&other.tokens);
        self
    }

    /// Append `items` separated by `, `.
    pub fn comma_list<'a>(&mut self, items: impl IntoIterator<Item = &'a TokenStream>) -> &mut Self {
        for (i, item) in items.into_iter().enumerate() {
            if i > 0 {
                self.comma().space();
            }
            self.append(item);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn serialize(&self, dialect: Dialect) -> String {
        self.tokens.iter().map(|t| t.serialize(dialect)).collect()
    }

    pub fn kw(&mut self, keyword: Keyword) -> &mut Self {
        self.push(Token::Keyword(keyword))
    }

    pub fn sym(&mut self, symbol: &'static str) -> &mut Self {
        self.push(Token::Symbol(symbol))
    }

    pub fn space(&mut self) -> &mut Self {
        self.push(Token::Space)
    }

    pub fn newline(&mut self) -> &mut Self {
        self.push(Token::Newline)
    }

    pub fn indent(&mut self, depth: usize) -> &mut Self {
        self.push(Token::Indent(depth))
    }

    pub fn comma(&mut self) -> &mut Self {
        self.sym(",")
    }

    pub fn lparen(&mut self) -> &mut Self {
        self.sym("(")
    }

    pub fn rparen(&mut self) -> &mut Self {
        self.sym(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multi_word_keywords() {
        assert_eq!(Token::Keyword(Keyword::GroupBy).serialize(Dialect::TSql), "GROUP BY");
        assert_eq!(
            Token::Keyword(Keyword::IsNotNull).serialize(Dialect::Sqlite),
            "IS NOT NULL"
        );
    }

    #[test]
    fn test_ident_quoting() {
        let tok = Token::Ident("articles".into());
        assert_eq!(tok.serialize(Dialect::Postgres), "\"articles\"");
        assert_eq!(tok.serialize(Dialect::TSql), "[articles]");
        assert_eq!(tok.serialize(Dialect::MySql), "`articles`");
    }

    #[test]
    fn test_stream_serialization() {
        let mut ts = TokenStream::new();
        ts.kw(Keyword::Select)
            .space()
            .push(Token::Ident("title".into()))
            .space()
            .kw(Keyword::From)
            .space()
            .push(Token::Ident("articles".into()));

        assert_eq!(
            ts.serialize(Dialect::Postgres),
            "SELECT \"title\" FROM \"articles\""
        );
    }

    #[test]
    fn test_comma_list() {
        let items: Vec<TokenStream> = ["a", "b", "c"]
            .iter()
            .map(|name| {
                let mut ts = TokenStream::new();
                ts.push(Token::Ident((*name).into()));
                ts
            })
            .collect();
        let mut ts = TokenStream::new();
        ts.comma_list(&items);
        assert_eq!(ts.serialize(Dialect::MySql), "`a`, `b`, `c`");
    }

    #[test]
    fn test_booleans_follow_dialect() {
        assert_eq!(Token::Bool(true).serialize(Dialect::Postgres), "true");
        assert_eq!(Token::Bool(false).serialize(Dialect::TSql), "0");
    }

    #[test]
    fn test_floats() {
        assert_eq!(Token::Float(3.25).serialize(Dialect::DuckDb), "3.25");
        assert_eq!(Token::Float(1.0).serialize(Dialect::DuckDb), "1.0");
        assert_eq!(Token::Float(f64::NAN).serialize(Dialect::DuckDb), "NULL");
    }

    #[test]
    fn test_string_escaping() {
        let tok = Token::Str("O'Brien".into());
        assert_eq!(tok.serialize(Dialect::Postgres), "'O''Brien'");
    }
}
