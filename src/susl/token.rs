use std::fmt;

use crate::diagnostics::Pos;

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: usize,
    pub col: usize,
}

impl Token {
    pub fn pos(&self) -> Pos {
        Pos::new(self.line, self.col)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// `#!WORD` language header.
    Header(String),
    /// Identifiers; may contain `#` after the first character (`C#4`) and
    /// inner hyphens (`thirty-second`).
    Ident(String),
    Integer(i64),
    Number(f64),
    Str(String),

    LBrace,
    RBrace,
    LParen,
    RParen,
    Comma,
    Semicolon,
    Assign,
    Slash,
    Dot,
    Plus,
    Minus,

    Eof,
}

impl TokenKind {
    pub fn is_ident(&self, name: &str) -> bool {
        matches!(self, TokenKind::Ident(s) if s == name)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Header(h) => write!(f, "header {h}"),
            TokenKind::Ident(s) => write!(f, "'{s}'"),
            TokenKind::Integer(n) => write!(f, "{n}"),
            TokenKind::Number(n) => write!(f, "{n}"),
            TokenKind::Str(s) => write!(f, "\"{s}\""),
            TokenKind::LBrace => f.write_str("'{'"),
            TokenKind::RBrace => f.write_str("'}'"),
            TokenKind::LParen => f.write_str("'('"),
            TokenKind::RParen => f.write_str("')'"),
            TokenKind::Comma => f.write_str("','"),
            TokenKind::Semicolon => f.write_str("';'"),
            TokenKind::Assign => f.write_str("'='"),
            TokenKind::Slash => f.write_str("'/'"),
            TokenKind::Dot => f.write_str("'.'"),
            TokenKind::Plus => f.write_str("'+'"),
            TokenKind::Minus => f.write_str("'-'"),
            TokenKind::Eof => f.write_str("end of input"),
        }
    }
}
