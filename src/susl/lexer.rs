//! Lexer for the score language.

use crate::diagnostics::ParseError;

use super::error::ScoreDiagnostic;
use super::token::{Token, TokenKind};

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia();
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, ParseError> {
        let Some(ch) = self.peek() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                lexeme: String::new(),
                line: self.line,
                col: self.col,
            });
        };

        let token = match ch {
            '{' => self.single_char(TokenKind::LBrace),
            '}' => self.single_char(TokenKind::RBrace),
            '(' => self.single_char(TokenKind::LParen),
            ')' => self.single_char(TokenKind::RParen),
            ',' => self.single_char(TokenKind::Comma),
            ';' => self.single_char(TokenKind::Semicolon),
            '=' => self.single_char(TokenKind::Assign),
            '/' => self.single_char(TokenKind::Slash),
            '.' if self.peek_next().is_some_and(|c| c.is_ascii_digit()) => self.lex_number()?,
            '.' => self.single_char(TokenKind::Dot),
            '+' => self.single_char(TokenKind::Plus),
            '-' => self.single_char(TokenKind::Minus),
            '"' => self.lex_string()?,
            '#' if self.peek_next() == Some('!') => self.lex_header(),
            c if c.is_ascii_digit() => self.lex_number()?,
            c if c.is_alphabetic() || c == '_' => self.lex_ident(),
            other => {
                return Err(ParseError::new(
                    ScoreDiagnostic::InvalidCharacter,
                    self.line,
                    self.col,
                )
                .with_arg(other)
                .with_length(1))
            }
        };
        Ok(token)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn advance_while(&mut self, buf: &mut String, pred: impl Fn(char) -> bool) {
        while let Some(c) = self.peek().filter(|c| pred(*c)) {
            buf.push(c);
            self.advance();
        }
    }

    fn skip_trivia(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.advance();
            } else if ch == '/' && self.peek_next() == Some('/') {
                while self.peek().is_some_and(|c| c != '\n') {
                    self.advance();
                }
            } else {
                break;
            }
        }
    }

    fn token(&self, kind: TokenKind, lexeme: String, line: usize, col: usize) -> Token {
        Token {
            kind,
            lexeme,
            line,
            col,
        }
    }

    fn single_char(&mut self, kind: TokenKind) -> Token {
        let (line, col) = (self.line, self.col);
        let lexeme = self.advance().map(String::from).unwrap_or_default();
        self.token(kind, lexeme, line, col)
    }

    fn lex_header(&mut self) -> Token {
        let (line, col) = (self.line, self.col);
        let mut s = String::from("#!");
        self.advance();
        self.advance();
        self.advance_while(&mut s, |c| c.is_alphanumeric() || c == '_');
        self.token(TokenKind::Header(s.clone()), s, line, col)
    }

    fn lex_string(&mut self) -> Result<Token, ParseError> {
        let (line, col) = (self.line, self.col);
        let start = self.pos;
        self.advance(); // opening quote
        let mut s = String::new();
        loop {
            match self.advance() {
                None => {
                    return Err(ParseError::new(ScoreDiagnostic::UnterminatedString, line, col)
                        .with_length(self.pos - start))
                }
                Some('"') => break,
                Some('\\') => match self.advance() {
                    Some('n') => s.push('\n'),
                    Some('t') => s.push('\t'),
                    Some(other) => s.push(other),
                    None => {}
                },
                Some(c) => s.push(c),
            }
        }
        let lexeme = self.chars[start..self.pos].iter().collect();
        Ok(self.token(TokenKind::Str(s), lexeme, line, col))
    }

    /// Digits with an optional fraction. A fraction makes it a `Number`.
    fn lex_number(&mut self) -> Result<Token, ParseError> {
        let (line, col) = (self.line, self.col);
        let mut s = String::new();
        self.advance_while(&mut s, |c| c.is_ascii_digit());

        let fractional = self.peek() == Some('.')
            && self.peek_next().is_some_and(|c| c.is_ascii_digit());
        if fractional {
            s.push('.');
            self.advance();
            self.advance_while(&mut s, |c| c.is_ascii_digit());
        }

        let invalid = || {
            ParseError::new(ScoreDiagnostic::InvalidNumber, line, col)
                .with_arg(&s)
                .with_length(s.chars().count())
        };
        let kind = if fractional {
            TokenKind::Number(s.parse().map_err(|_| invalid())?)
        } else {
            TokenKind::Integer(s.parse().map_err(|_| invalid())?)
        };
        Ok(self.token(kind, s, line, col))
    }

    fn lex_ident(&mut self) -> Token {
        let (line, col) = (self.line, self.col);
        let mut s = String::new();
        loop {
            match self.peek() {
                Some(c) if c.is_alphanumeric() || c == '_' || c == '#' => {
                    s.push(c);
                    self.advance();
                }
                Some('-') if self.peek_next().is_some_and(|c| c.is_alphabetic()) => {
                    s.push('-');
                    self.advance();
                }
                _ => break,
            }
        }
        self.token(TokenKind::Ident(s.clone()), s, line, col)
    }
}
