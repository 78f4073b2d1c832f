//! Token types for the macro-language lexer.

use std::fmt;

use crate::diagnostics::Pos;

/// A token produced by the lexer.
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

/// The kind of token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Keywords
    Let,
    Repeat,
    If,
    Else,
    Track,
    Global,
    Func,
    True,
    False,
    Null,

    // Literals
    Ident(String),
    Number(f64),
    Str(String),

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Assign,  // =
    EqEq,    // ==
    BangEq,  // !=
    Lt,
    LtEq,
    Gt,
    GtEq,
    AndAnd,  // &&
    OrOr,    // ||
    Bang,    // !

    // Delimiters
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semicolon,

    Eof,
}

impl TokenKind {
    /// Map an identifier to its keyword, if it is one.
    pub fn keyword(word: &str) -> Option<Self> {
        Some(match word {
            "let" => Self::Let,
            "repeat" => Self::Repeat,
            "if" => Self::If,
            "else" => Self::Else,
            "Track" => Self::Track,
            "Global" => Self::Global,
            "func" => Self::Func,
            "true" => Self::True,
            "false" => Self::False,
            "null" => Self::Null,
            _ => return None,
        })
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Let => "'let'",
            Self::Repeat => "'repeat'",
            Self::If => "'if'",
            Self::Else => "'else'",
            Self::Track => "'Track'",
            Self::Global => "'Global'",
            Self::Func => "'func'",
            Self::True => "'true'",
            Self::False => "'false'",
            Self::Null => "'null'",
            Self::Ident(name) => return write!(f, "identifier '{name}'"),
            Self::Number(n) => return write!(f, "number {n}"),
            Self::Str(s) => return write!(f, "string \"{s}\""),
            Self::Plus => "'+'",
            Self::Minus => "'-'",
            Self::Star => "'*'",
            Self::Slash => "'/'",
            Self::Percent => "'%'",
            Self::Assign => "'='",
            Self::EqEq => "'=='",
            Self::BangEq => "'!='",
            Self::Lt => "'<'",
            Self::LtEq => "'<='",
            Self::Gt => "'>'",
            Self::GtEq => "'>='",
            Self::AndAnd => "'&&'",
            Self::OrOr => "'||'",
            Self::Bang => "'!'",
            Self::LParen => "'('",
            Self::RParen => "')'",
            Self::LBrace => "'{'",
            Self::RBrace => "'}'",
            Self::LBracket => "'['",
            Self::RBracket => "']'",
            Self::Comma => "','",
            Self::Semicolon => "';'",
            Self::Eof => "end of input",
        };
        f.write_str(text)
    }
}
