//! Macro-language generator: walks the AST and emits the track command stream.
//!
//! Function definitions at top level and inside `Global` are hoisted into one
//! table before anything runs. `Global` then executes once in the root scope,
//! after which tracks and loose statements execute in source order. Every
//! diagnostic carries the position of the node that raised it.

use std::collections::HashMap;

use log::{debug, trace};

use crate::diagnostics::{ParseError, Pos};
use crate::pitch;

use super::ast::*;
use super::builtins;
use super::error::MacroDiagnostic;
use super::scope::Scopes;
use super::value::{format_number, Value};

/// Nested user-function calls allowed before giving up.
pub const MAX_CALL_DEPTH: usize = 256;

pub struct Generator<'a> {
    scopes: Scopes,
    functions: HashMap<&'a str, &'a FunctionDef>,
    output: String,
    call_depth: usize,
}

impl<'a> Generator<'a> {
    pub fn new() -> Self {
        Self {
            scopes: Scopes::new(),
            functions: HashMap::new(),
            output: String::new(),
            call_depth: 0,
        }
    }

    /// Run the whole program and return the emitted text.
    pub fn generate(mut self, program: &'a Program) -> Result<String, ParseError> {
        self.hoist(program)?;
        debug!("hoisted {} user function(s)", self.functions.len());

        for item in &program.items {
            if let Stmt::Global { body, .. } = item {
                self.exec_stmts(&body.stmts)?;
            }
        }

        for item in &program.items {
            match item {
                Stmt::Function(_) | Stmt::Global { .. } => {}
                other => {
                    self.exec_stmt(other)?;
                }
            }
        }

        Ok(self.output)
    }

    fn hoist(&mut self, program: &'a Program) -> Result<(), ParseError> {
        for item in &program.items {
            match item {
                Stmt::Function(def) => self.define_function(def)?,
                Stmt::Global { body, .. } => {
                    for stmt in &body.stmts {
                        if let Stmt::Function(def) = stmt {
                            self.define_function(def)?;
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Register a user function. Re-registering the same definition (a hoisted
    /// one being reached again) is a no-op.
    fn define_function(&mut self, def: &'a FunctionDef) -> Result<(), ParseError> {
        let duplicate = || {
            ParseError::at(MacroDiagnostic::DuplicateFunction, def.pos).with_arg(&def.name)
        };
        if builtins::lookup(&def.name).is_some() {
            return Err(duplicate());
        }
        match self.functions.get(def.name.as_str()) {
            Some(existing) if std::ptr::eq(*existing, def) => Ok(()),
            Some(_) => Err(duplicate()),
            None => {
                self.functions.insert(&def.name, def);
                Ok(())
            }
        }
    }

    // --- Statements ---

    /// Execute statements in the current scope. The result is the value of the
    /// last statement when it is an expression, else null.
    fn exec_stmts(&mut self, stmts: &'a [Stmt]) -> Result<Value, ParseError> {
        let mut last = Value::Null;
        for stmt in stmts {
            last = self.exec_stmt(stmt)?;
        }
        Ok(last)
    }

    fn exec_block(&mut self, block: &'a Block) -> Result<Value, ParseError> {
        let frame = self.scopes.enter_child();
        let result = self.exec_stmts(&block.stmts)?;
        self.scopes.leave(frame);
        Ok(result)
    }

    fn exec_stmt(&mut self, stmt: &'a Stmt) -> Result<Value, ParseError> {
        match stmt {
            Stmt::Let { name, value, .. } => {
                let v = self.eval(value)?;
                self.scopes.define(name, v);
                Ok(Value::Null)
            }
            Stmt::Assign { name, value, pos } => {
                let v = self.eval(value)?;
                if !self.scopes.assign(name, v) {
                    return Err(
                        ParseError::at(MacroDiagnostic::UndefinedVariable, *pos).with_arg(name)
                    );
                }
                Ok(Value::Null)
            }
            Stmt::Repeat { count, body, .. } => self.exec_repeat(count, body),
            Stmt::If {
                cond,
                then,
                otherwise,
                ..
            } => {
                if self.eval(cond)?.is_truthy() {
                    self.exec_block(then)
                } else if let Some(block) = otherwise {
                    self.exec_block(block)
                } else {
                    Ok(Value::Null)
                }
            }
            Stmt::Function(def) => {
                self.define_function(def)?;
                Ok(Value::Null)
            }
            Stmt::Track { index, body, .. } => self.exec_track(index, body),
            Stmt::Global { body, .. } => {
                self.exec_stmts(&body.stmts)?;
                Ok(Value::Null)
            }
            Stmt::Block(block) => self.exec_block(block),
            Stmt::Expr(expr) => self.eval(expr),
        }
    }

    fn exec_track(&mut self, index: &'a Expr, body: &'a Block) -> Result<Value, ParseError> {
        let frame = self.scopes.enter_child();
        let value = self.eval(index)?;
        let n = self.expect_number(&value, "Track", index.pos())?;
        trace!("entering track {}", format_number(n));
        self.output
            .push_str(&format!("#!Track={}\n", format_number(n)));
        self.exec_block(body)?;
        self.scopes.leave(frame);
        Ok(Value::Null)
    }

    /// One scope holds `index` for the whole loop; the body block opens a fresh
    /// nested scope on every pass.
    fn exec_repeat(&mut self, count: &'a Expr, body: &'a Block) -> Result<Value, ParseError> {
        let value = self.eval(count)?;
        let n = self.expect_number(&value, "repeat", count.pos())?;
        if n < 0.0 {
            return Err(ParseError::at(MacroDiagnostic::ValueOutOfRange, count.pos())
                .with_args([format_number(n), "repeat count".to_string()]));
        }

        let frame = self.scopes.enter_child();
        for i in 0..n.floor() as u64 {
            self.scopes.define("index", Value::Number(i as f64));
            self.exec_block(body)?;
        }
        self.scopes.leave(frame);
        Ok(Value::Null)
    }

    fn expect_number(&self, value: &Value, what: &str, pos: Pos) -> Result<f64, ParseError> {
        value.as_number().ok_or_else(|| {
            ParseError::at(MacroDiagnostic::InvalidOperandType, pos)
                .with_args([what, value.type_name()])
        })
    }

    // --- Expressions ---

    fn eval(&mut self, expr: &'a Expr) -> Result<Value, ParseError> {
        match expr {
            Expr::Literal { value, .. } => Ok(match value {
                Literal::Number(n) => Value::Number(*n),
                Literal::Str(s) => Value::Str(s.clone()),
                Literal::Bool(b) => Value::Bool(*b),
                Literal::Null => Value::Null,
            }),
            Expr::Variable { name, pos } => self.scopes.lookup(name).cloned().ok_or_else(|| {
                ParseError::at(MacroDiagnostic::UndefinedVariable, *pos).with_arg(name)
            }),
            Expr::Array { items, .. } => Ok(Value::Array(self.eval_all(items)?)),
            Expr::Binary { op, lhs, rhs, pos } => {
                let l = self.eval(lhs)?;
                let r = self.eval(rhs)?;
                binary(*op, l, r, *pos)
            }
            Expr::Unary { op, operand, pos } => {
                let v = self.eval(operand)?;
                match (op, v) {
                    (UnaryOp::Neg, Value::Number(n)) => Ok(Value::Number(-n)),
                    (UnaryOp::Neg, other) => {
                        Err(ParseError::at(MacroDiagnostic::InvalidOperandType, *pos)
                            .with_args([op.symbol(), other.type_name()]))
                    }
                    (UnaryOp::Not, v) => Ok(Value::Bool(!v.is_truthy())),
                }
            }
            Expr::Call { name, args, pos } => self.call(name, args, *pos),
        }
    }

    fn eval_all(&mut self, exprs: &'a [Expr]) -> Result<Vec<Value>, ParseError> {
        exprs.iter().map(|e| self.eval(e)).collect()
    }

    fn call(&mut self, name: &str, args: &'a [Expr], pos: Pos) -> Result<Value, ParseError> {
        let wrong_count = |expected: usize, got: usize| {
            ParseError::at(MacroDiagnostic::WrongArgumentCount, pos).with_args([
                name.to_string(),
                expected.to_string(),
                got.to_string(),
            ])
        };

        if let Some(def) = self.functions.get(name).copied() {
            let values = self.eval_all(args)?;
            if values.len() != def.params.len() {
                return Err(wrong_count(def.params.len(), values.len()));
            }
            if self.call_depth >= MAX_CALL_DEPTH {
                return Err(ParseError::at(MacroDiagnostic::RecursionLimit, pos)
                    .with_args([MAX_CALL_DEPTH.to_string(), name.to_string()]));
            }

            let frame = self.scopes.enter(Scopes::ROOT);
            for (param, value) in def.params.iter().zip(values) {
                self.scopes.define(param, value);
            }
            self.call_depth += 1;
            let result = self.exec_block(&def.body);
            self.call_depth -= 1;
            let result = result?;
            self.scopes.leave(frame);
            return Ok(result);
        }

        let Some(builtin) = builtins::lookup(name) else {
            return Err(ParseError::at(MacroDiagnostic::UndefinedFunction, pos).with_arg(name));
        };
        let values = self.eval_all(args)?;
        if values.len() != builtin.arity {
            return Err(wrong_count(builtin.arity, values.len()));
        }
        (builtin.func)(&values, &mut self.output)
            .map_err(|fault| ParseError::at(fault.kind, pos).with_args(fault.args))
    }
}

impl Default for Generator<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply a binary operator. Numeric operands (numbers or numeric strings) are
/// tried first; then logical and equality operators; then pitch transposition;
/// then string concatenation for `+`.
fn binary(op: BinaryOp, l: Value, r: Value, pos: Pos) -> Result<Value, ParseError> {
    if let (Some(a), Some(b)) = (l.as_number(), r.as_number()) {
        return numeric(op, a, b, pos);
    }

    match op {
        BinaryOp::And => return Ok(Value::Bool(l.is_truthy() && r.is_truthy())),
        BinaryOp::Or => return Ok(Value::Bool(l.is_truthy() || r.is_truthy())),
        BinaryOp::Eq => return Ok(Value::Bool(l == r)),
        BinaryOp::Ne => return Ok(Value::Bool(l != r)),
        _ => {}
    }

    if let Some(transposed) = transpose_operands(op, &l, &r, pos)? {
        return Ok(Value::Str(transposed));
    }

    if op == BinaryOp::Add && (matches!(l, Value::Str(_)) || matches!(r, Value::Str(_))) {
        return Ok(Value::Str(format!("{l}{r}")));
    }

    Err(
        ParseError::at(MacroDiagnostic::InvalidOperandTypes, pos).with_args([
            op.symbol(),
            l.type_name(),
            r.type_name(),
        ]),
    )
}

fn numeric(op: BinaryOp, a: f64, b: f64, pos: Pos) -> Result<Value, ParseError> {
    let divide_by_zero = || ParseError::at(MacroDiagnostic::DivideByZero, pos);
    Ok(match op {
        BinaryOp::Add => Value::Number(a + b),
        BinaryOp::Sub => Value::Number(a - b),
        BinaryOp::Mul => Value::Number(a * b),
        BinaryOp::Div if b == 0.0 => return Err(divide_by_zero()),
        BinaryOp::Div => Value::Number(a / b),
        BinaryOp::Rem if b == 0.0 => return Err(divide_by_zero()),
        BinaryOp::Rem => Value::Number(a % b),
        BinaryOp::Eq => Value::Bool(a == b),
        BinaryOp::Ne => Value::Bool(a != b),
        BinaryOp::Lt => Value::Bool(a < b),
        BinaryOp::Le => Value::Bool(a <= b),
        BinaryOp::Gt => Value::Bool(a > b),
        BinaryOp::Ge => Value::Bool(a >= b),
        BinaryOp::And => Value::Bool(a != 0.0 && b != 0.0),
        BinaryOp::Or => Value::Bool(a != 0.0 || b != 0.0),
    })
}

/// `pitch + n`, `n + pitch` and `pitch - n` with a whole semitone count.
/// Ok(None) when the operands don't form a transposition.
fn transpose_operands(
    op: BinaryOp,
    l: &Value,
    r: &Value,
    pos: Pos,
) -> Result<Option<String>, ParseError> {
    let (name, semitones) = match (op, l, r) {
        (BinaryOp::Add, Value::Str(p), Value::Number(n))
        | (BinaryOp::Add, Value::Number(n), Value::Str(p)) => (p, *n),
        (BinaryOp::Sub, Value::Str(p), Value::Number(n)) => (p, -*n),
        _ => return Ok(None),
    };
    if semitones.fract() != 0.0 || !pitch::is_pitch_name(name) {
        return Ok(None);
    }
    let limit = pitch::MAX_TRANSPOSE as f64;
    let shifted = if (-limit..=limit).contains(&semitones) {
        pitch::transpose(name, semitones as i32)
    } else {
        None
    };
    shifted.map(Some).ok_or_else(|| {
        ParseError::at(MacroDiagnostic::ValueOutOfRange, pos)
            .with_args([format_number(semitones), "transpose".to_string()])
    })
}
