//! Recursive-descent parser for the macro language.
//!
//! Binary operators are parsed by precedence level, loosest first:
//! `||`, `&&`, `== !=`, `< <= > >=`, `+ -`, `* / %`.

use crate::diagnostics::ParseError;

use super::ast::*;
use super::error::MacroDiagnostic;
use super::token::{Token, TokenKind};

/// Deepest allowed nesting of blocks, parentheses, calls and unary operators.
pub const MAX_NESTING: usize = 100;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    /// Run `inner` one nesting level deeper.
    fn nested<T>(
        &mut self,
        inner: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if self.depth >= MAX_NESTING {
            let t = self.peek();
            return Err(ParseError::at(MacroDiagnostic::NestingTooDeep, t.pos())
                .with_arg(MAX_NESTING)
                .with_length(t.lexeme.chars().count().max(1)));
        }
        self.depth += 1;
        let result = inner(self);
        self.depth -= 1;
        result
    }

    pub fn parse(&mut self) -> Result<Program, ParseError> {
        let mut items = Vec::new();

        while !self.is_at_end() {
            match &self.peek().kind {
                TokenKind::Track => items.push(self.parse_track()?),
                TokenKind::Global => items.push(self.parse_global()?),
                TokenKind::Semicolon => {
                    self.advance();
                }
                _ => items.push(self.parse_stmt()?),
            }
        }

        Ok(Program { items })
    }

    fn parse_track(&mut self) -> Result<Stmt, ParseError> {
        let pos = self.expect(TokenKind::Track)?.pos();
        self.expect(TokenKind::LParen)?;
        let index = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        let body = self.parse_block()?;
        Ok(Stmt::Track { index, body, pos })
    }

    fn parse_global(&mut self) -> Result<Stmt, ParseError> {
        let pos = self.expect(TokenKind::Global)?.pos();
        let body = self.parse_block()?;
        Ok(Stmt::Global { body, pos })
    }

    fn parse_block(&mut self) -> Result<Block, ParseError> {
        self.nested(Self::parse_block_body)
    }

    fn parse_block_body(&mut self) -> Result<Block, ParseError> {
        let pos = self.expect(TokenKind::LBrace)?.pos();
        let mut stmts = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            if self.check(&TokenKind::Semicolon) {
                self.advance();
                continue;
            }
            stmts.push(self.parse_stmt()?);
        }
        self.expect(TokenKind::RBrace)?;
        Ok(Block { stmts, pos })
    }

    fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        let stmt = match &self.peek().kind {
            TokenKind::Let => self.parse_let()?,
            TokenKind::Repeat => self.parse_repeat()?,
            TokenKind::If => self.parse_if()?,
            TokenKind::Func => Stmt::Function(self.parse_function()?),
            TokenKind::LBrace => Stmt::Block(self.parse_block()?),
            TokenKind::Track | TokenKind::Global => {
                let t = self.peek();
                return Err(
                    ParseError::at(MacroDiagnostic::UnexpectedToken, t.pos()).with_arg(&t.kind)
                );
            }
            _ => self.parse_expr_or_assign()?,
        };
        self.eat(&TokenKind::Semicolon);
        Ok(stmt)
    }

    fn parse_let(&mut self) -> Result<Stmt, ParseError> {
        let pos = self.expect(TokenKind::Let)?.pos();
        let name = self.expect_ident()?;
        self.expect(TokenKind::Assign)?;
        let value = self.parse_expr()?;
        Ok(Stmt::Let { name, value, pos })
    }

    fn parse_repeat(&mut self) -> Result<Stmt, ParseError> {
        let pos = self.expect(TokenKind::Repeat)?.pos();
        let count = self.parse_expr()?;
        let body = self.parse_block()?;
        Ok(Stmt::Repeat { count, body, pos })
    }

    /// `if cond { } [else { } | else if ...]`. An `else if` chain is stored as
    /// an else block holding a single `If`.
    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        let pos = self.expect(TokenKind::If)?.pos();
        let cond = self.parse_expr()?;
        let then = self.parse_block()?;
        let otherwise = if self.eat(&TokenKind::Else) {
            if self.check(&TokenKind::If) {
                let else_pos = self.peek().pos();
                let nested = self.nested(Self::parse_if)?;
                Some(Block {
                    stmts: vec![nested],
                    pos: else_pos,
                })
            } else {
                Some(self.parse_block()?)
            }
        } else {
            None
        };
        Ok(Stmt::If {
            cond,
            then,
            otherwise,
            pos,
        })
    }

    fn parse_function(&mut self) -> Result<FunctionDef, ParseError> {
        let pos = self.expect(TokenKind::Func)?.pos();
        let name = self.expect_ident()?;
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                params.push(self.expect_ident()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;
        let body = self.parse_block()?;
        Ok(FunctionDef {
            name,
            params,
            body,
            pos,
        })
    }

    fn parse_expr_or_assign(&mut self) -> Result<Stmt, ParseError> {
        let expr = self.parse_expr()?;
        if !self.check(&TokenKind::Assign) {
            return Ok(Stmt::Expr(expr));
        }
        match expr {
            Expr::Variable { name, pos } => {
                self.advance(); // consume '='
                let value = self.parse_expr()?;
                Ok(Stmt::Assign { name, value, pos })
            }
            other => Err(ParseError::at(
                MacroDiagnostic::InvalidAssignmentTarget,
                other.pos(),
            )),
        }
    }

    // --- Expressions ---

    pub fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.nested(Self::parse_or)
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(&[(TokenKind::OrOr, BinaryOp::Or)], Self::parse_and)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(&[(TokenKind::AndAnd, BinaryOp::And)], Self::parse_equality)
    }

    fn parse_equality(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(
            &[(TokenKind::EqEq, BinaryOp::Eq), (TokenKind::BangEq, BinaryOp::Ne)],
            Self::parse_comparison,
        )
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(
            &[
                (TokenKind::Lt, BinaryOp::Lt),
                (TokenKind::LtEq, BinaryOp::Le),
                (TokenKind::Gt, BinaryOp::Gt),
                (TokenKind::GtEq, BinaryOp::Ge),
            ],
            Self::parse_additive,
        )
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(
            &[(TokenKind::Plus, BinaryOp::Add), (TokenKind::Minus, BinaryOp::Sub)],
            Self::parse_multiplicative,
        )
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(
            &[
                (TokenKind::Star, BinaryOp::Mul),
                (TokenKind::Slash, BinaryOp::Div),
                (TokenKind::Percent, BinaryOp::Rem),
            ],
            Self::parse_unary,
        )
    }

    /// One left-associative precedence level. Every operator in a chain
    /// deepens the tree by one, so each counts as a nesting level.
    fn parse_binary_level(
        &mut self,
        ops: &[(TokenKind, BinaryOp)],
        next: fn(&mut Self) -> Result<Expr, ParseError>,
    ) -> Result<Expr, ParseError> {
        let base = self.depth;
        let mut lhs = next(self)?;
        while let Some(op) = ops
            .iter()
            .find(|(kind, _)| self.check(kind))
            .map(|(_, op)| *op)
        {
            let (pos, rhs) = self.nested(|p| {
                let pos = p.advance().pos();
                Ok((pos, next(p)?))
            })?;
            // Keep the level for the rest of the chain.
            self.depth += 1;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                pos,
            };
        }
        self.depth = base;
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek().kind {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Bang => UnaryOp::Not,
            _ => return self.parse_primary(),
        };
        let pos = self.advance().pos();
        let operand = self.nested(Self::parse_unary)?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
            pos,
        })
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let t = self.peek().clone();
        let pos = t.pos();
        let literal = |value| Expr::Literal { value, pos };
        match t.kind {
            TokenKind::Number(n) => {
                self.advance();
                Ok(literal(Literal::Number(n)))
            }
            TokenKind::Str(s) => {
                self.advance();
                Ok(literal(Literal::Str(s)))
            }
            TokenKind::True => {
                self.advance();
                Ok(literal(Literal::Bool(true)))
            }
            TokenKind::False => {
                self.advance();
                Ok(literal(Literal::Bool(false)))
            }
            TokenKind::Null => {
                self.advance();
                Ok(literal(Literal::Null))
            }
            TokenKind::Ident(name) => {
                self.advance();
                if self.eat(&TokenKind::LParen) {
                    let args = self.parse_list(TokenKind::RParen)?;
                    Ok(Expr::Call { name, args, pos })
                } else {
                    Ok(Expr::Variable { name, pos })
                }
            }
            TokenKind::LBracket => {
                self.advance();
                let items = self.parse_list(TokenKind::RBracket)?;
                Ok(Expr::Array { items, pos })
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            other => Err(ParseError::at(MacroDiagnostic::UnexpectedToken, pos)
                .with_arg(other)
                .with_length(t.lexeme.chars().count().max(1))),
        }
    }

    /// Comma-separated expressions up to and including `close`.
    fn parse_list(&mut self, close: TokenKind) -> Result<Vec<Expr>, ParseError> {
        let mut items = Vec::new();
        if !self.check(&close) {
            loop {
                items.push(self.parse_expr()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(close)?;
        Ok(items)
    }

    // --- Utility methods ---

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> &Token {
        let t = &self.tokens[self.pos.min(self.tokens.len() - 1)];
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        t
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len() || self.peek().kind == TokenKind::Eof
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(kind)
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<&Token, ParseError> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            let t = self.peek();
            Err(ParseError::at(MacroDiagnostic::ExpectedToken, t.pos())
                .with_arg(&kind)
                .with_arg(&t.kind))
        }
    }

    fn expect_ident(&mut self) -> Result<String, ParseError> {
        let t = self.peek();
        match &t.kind {
            TokenKind::Ident(s) => {
                let val = s.clone();
                self.advance();
                Ok(val)
            }
            other => Err(ParseError::at(MacroDiagnostic::ExpectedToken, t.pos())
                .with_arg("identifier")
                .with_arg(other)),
        }
    }
}
