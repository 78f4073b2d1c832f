//! Lexer for the macro language.
//!
//! Converts the script body (header already stripped) into a stream of
//! [`Token`]s. Whitespace and `//` comments are skipped.

use crate::diagnostics::ParseError;

use super::error::MacroDiagnostic;
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

            if self.is_at_end() {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    lexeme: String::new(),
                    line: self.line,
                    col: self.col,
                });
                break;
            }

            let ch = self.peek();
            let next = self.peek_next();
            let token = match ch {
                '(' => self.single_char(TokenKind::LParen),
                ')' => self.single_char(TokenKind::RParen),
                '{' => self.single_char(TokenKind::LBrace),
                '}' => self.single_char(TokenKind::RBrace),
                '[' => self.single_char(TokenKind::LBracket),
                ']' => self.single_char(TokenKind::RBracket),
                ',' => self.single_char(TokenKind::Comma),
                ';' => self.single_char(TokenKind::Semicolon),
                '+' => self.single_char(TokenKind::Plus),
                '-' => self.single_char(TokenKind::Minus),
                '*' => self.single_char(TokenKind::Star),
                '/' => self.single_char(TokenKind::Slash),
                '%' => self.single_char(TokenKind::Percent),
                '=' if next == Some('=') => self.double_char(TokenKind::EqEq),
                '=' => self.single_char(TokenKind::Assign),
                '!' if next == Some('=') => self.double_char(TokenKind::BangEq),
                '!' => self.single_char(TokenKind::Bang),
                '<' if next == Some('=') => self.double_char(TokenKind::LtEq),
                '<' => self.single_char(TokenKind::Lt),
                '>' if next == Some('=') => self.double_char(TokenKind::GtEq),
                '>' => self.single_char(TokenKind::Gt),
                '&' if next == Some('&') => self.double_char(TokenKind::AndAnd),
                '|' if next == Some('|') => self.double_char(TokenKind::OrOr),
                '"' => self.lex_string()?,
                '.' if next.is_some_and(|c| c.is_ascii_digit()) => self.lex_number()?,
                '0'..='9' => self.lex_number()?,
                c if c.is_alphabetic() || c == '_' => self.lex_ident_or_keyword(),
                _ => {
                    return Err(ParseError::new(
                        MacroDiagnostic::InvalidCharacter,
                        self.line,
                        self.col,
                    )
                    .with_arg(ch)
                    .with_length(1));
                }
            };

            tokens.push(token);
        }

        Ok(tokens)
    }

    fn peek(&self) -> char {
        self.chars[self.pos]
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> char {
        let ch = self.chars[self.pos];
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        ch
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn skip_trivia(&mut self) {
        while !self.is_at_end() {
            let ch = self.peek();
            if ch.is_whitespace() {
                self.advance();
            } else if ch == '/' && self.peek_next() == Some('/') {
                while !self.is_at_end() && self.peek() != '\n' {
                    self.advance();
                }
            } else {
                break;
            }
        }
    }

    fn single_char(&mut self, kind: TokenKind) -> Token {
        let line = self.line;
        let col = self.col;
        let lexeme = self.advance().to_string();
        Token {
            kind,
            lexeme,
            line,
            col,
        }
    }

    fn double_char(&mut self, kind: TokenKind) -> Token {
        let line = self.line;
        let col = self.col;
        let mut lexeme = String::with_capacity(2);
        lexeme.push(self.advance());
        lexeme.push(self.advance());
        Token {
            kind,
            lexeme,
            line,
            col,
        }
    }

    /// A backslash escapes exactly one following character.
    fn lex_string(&mut self) -> Result<Token, ParseError> {
        let line = self.line;
        let col = self.col;
        let start = self.pos;
        self.advance(); // consume opening '"'
        let mut s = String::new();
        loop {
            if self.is_at_end() {
                return Err(
                    ParseError::new(MacroDiagnostic::UnterminatedString, line, col)
                        .with_length(self.pos - start),
                );
            }
            match self.advance() {
                '"' => break,
                '\\' => {
                    if self.is_at_end() {
                        continue;
                    }
                    match self.advance() {
                        'n' => s.push('\n'),
                        't' => s.push('\t'),
                        other => s.push(other),
                    }
                }
                c => s.push(c),
            }
        }
        Ok(Token {
            kind: TokenKind::Str(s),
            lexeme: self.chars[start..self.pos].iter().collect(),
            line,
            col,
        })
    }

    fn lex_number(&mut self) -> Result<Token, ParseError> {
        let line = self.line;
        let col = self.col;
        let mut s = String::new();

        while !self.is_at_end() && self.peek().is_ascii_digit() {
            s.push(self.advance());
        }
        if !self.is_at_end()
            && self.peek() == '.'
            && self.peek_next().is_some_and(|c| c.is_ascii_digit())
        {
            s.push(self.advance()); // consume '.'
            while !self.is_at_end() && self.peek().is_ascii_digit() {
                s.push(self.advance());
            }
        }

        let val: f64 = s.parse().map_err(|_| {
            ParseError::new(MacroDiagnostic::InvalidNumber, line, col)
                .with_arg(&s)
                .with_length(s.chars().count())
        })?;
        Ok(Token {
            kind: TokenKind::Number(val),
            lexeme: s,
            line,
            col,
        })
    }

    fn lex_ident_or_keyword(&mut self) -> Token {
        let line = self.line;
        let col = self.col;
        let mut s = String::new();

        while !self.is_at_end() && (self.peek().is_alphanumeric() || self.peek() == '_') {
            s.push(self.advance());
        }

        let kind = TokenKind::keyword(&s).unwrap_or_else(|| TokenKind::Ident(s.clone()));
        Token {
            kind,
            lexeme: s,
            line,
            col,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lex_keywords() {
        assert_eq!(
            kinds("let repeat if else Track Global func true false null"),
            vec![
                TokenKind::Let,
                TokenKind::Repeat,
                TokenKind::If,
                TokenKind::Else,
                TokenKind::Track,
                TokenKind::Global,
                TokenKind::Func,
                TokenKind::True,
                TokenKind::False,
                TokenKind::Null,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn keywords_are_case_sensitive() {
        assert_eq!(kinds("track")[0], TokenKind::Ident("track".to_string()));
    }

    #[test]
    fn lex_operators() {
        assert_eq!(
            kinds("== != <= >= && || = < > ! % ;"),
            vec![
                TokenKind::EqEq,
                TokenKind::BangEq,
                TokenKind::LtEq,
                TokenKind::GtEq,
                TokenKind::AndAnd,
                TokenKind::OrOr,
                TokenKind::Assign,
                TokenKind::Lt,
                TokenKind::Gt,
                TokenKind::Bang,
                TokenKind::Percent,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_numbers() {
        assert_eq!(kinds("42")[0], TokenKind::Number(42.0));
        assert_eq!(kinds("0.95")[0], TokenKind::Number(0.95));
        assert_eq!(kinds(".5")[0], TokenKind::Number(0.5));
    }

    #[test]
    fn minus_is_an_operator() {
        assert_eq!(kinds("-3")[..2], [TokenKind::Minus, TokenKind::Number(3.0)]);
    }

    #[test]
    fn lex_string_escapes() {
        assert_eq!(
            kinds(r#""a\"b\\c\nd\q""#)[0],
            TokenKind::Str("a\"b\\c\ndq".to_string())
        );
    }

    #[test]
    fn lexeme_keeps_source_text() {
        let tokens = Lexer::new(r#"x "hi""#).tokenize().unwrap();
        assert_eq!(tokens[0].lexeme, "x");
        assert_eq!(tokens[1].lexeme, "\"hi\"");
    }

    #[test]
    fn lex_line_tracking() {
        let tokens = Lexer::new("let a = 1\n  let b = 2").tokenize().unwrap();
        assert_eq!((tokens[0].line, tokens[0].col), (1, 1));
        assert_eq!((tokens[4].line, tokens[4].col), (2, 3));
    }

    #[test]
    fn lex_comment() {
        assert_eq!(
            kinds("a // ignore me\nb"),
            vec![
                TokenKind::Ident("a".to_string()),
                TokenKind::Ident("b".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_error_on_invalid_character() {
        let err = Lexer::new("let a = @").tokenize().unwrap_err();
        assert!(err.is(MacroDiagnostic::InvalidCharacter));
        assert_eq!((err.line, err.column), (1, 9));
        assert_eq!(err.args, vec!["@".to_string()]);
    }

    #[test]
    fn lex_unterminated_string() {
        let err = Lexer::new("\n  \"open").tokenize().unwrap_err();
        assert!(err.is(MacroDiagnostic::UnterminatedString));
        assert_eq!((err.line, err.column), (2, 3));
    }

    #[test]
    fn lex_empty_input() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
    }
}
