//! Diagnostic catalog for the macro language.

use crate::diagnostics::{DiagnosticKey, Language};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacroDiagnostic {
    // Structural
    MissingHeader,
    WrongLanguageHeader,
    // Lexical
    InvalidCharacter,
    UnterminatedString,
    InvalidNumber,
    // Syntactic
    UnexpectedToken,
    ExpectedToken,
    InvalidAssignmentTarget,
    NestingTooDeep,
    // Semantic / runtime
    UndefinedVariable,
    UndefinedFunction,
    DuplicateFunction,
    WrongArgumentCount,
    InvalidOperandTypes,
    InvalidOperandType,
    InvalidArgumentType,
    DivideByZero,
    ValueOutOfRange,
    IndexOutOfRange,
    RecursionLimit,
}

impl DiagnosticKey for MacroDiagnostic {
    const LANGUAGE: Language = Language::Macro;

    fn key(self) -> &'static str {
        match self {
            Self::MissingHeader => "missing_header",
            Self::WrongLanguageHeader => "wrong_language_header",
            Self::InvalidCharacter => "invalid_character",
            Self::UnterminatedString => "unterminated_string",
            Self::InvalidNumber => "invalid_number",
            Self::UnexpectedToken => "unexpected_token",
            Self::ExpectedToken => "expected_token",
            Self::InvalidAssignmentTarget => "invalid_assignment_target",
            Self::NestingTooDeep => "nesting_too_deep",
            Self::UndefinedVariable => "undefined_variable",
            Self::UndefinedFunction => "undefined_function",
            Self::DuplicateFunction => "duplicate_function",
            Self::WrongArgumentCount => "wrong_argument_count",
            Self::InvalidOperandTypes => "invalid_operand_types",
            Self::InvalidOperandType => "invalid_operand_type",
            Self::InvalidArgumentType => "invalid_argument_type",
            Self::DivideByZero => "divide_by_zero",
            Self::ValueOutOfRange => "value_out_of_range",
            Self::IndexOutOfRange => "index_out_of_range",
            Self::RecursionLimit => "recursion_limit",
        }
    }

    fn template(self) -> &'static str {
        match self {
            Self::MissingHeader => "missing language header: the first line must be #!EMEL or #!EMEL2",
            Self::WrongLanguageHeader => "found header {0}, which belongs to the score language; macro scripts start with {1}",
            Self::InvalidCharacter => "invalid character '{0}'",
            Self::UnterminatedString => "unterminated string literal",
            Self::InvalidNumber => "invalid number '{0}'",
            Self::UnexpectedToken => "unexpected {0}",
            Self::ExpectedToken => "expected {0}, found {1}",
            Self::InvalidAssignmentTarget => "invalid assignment target",
            Self::NestingTooDeep => "nesting exceeds {0} levels",
            Self::UndefinedVariable => "undefined variable: {0}",
            Self::UndefinedFunction => "undefined function: {0}",
            Self::DuplicateFunction => "function {0} is already defined",
            Self::WrongArgumentCount => "wrong argument count: {0} expects {1}, got {2}",
            Self::InvalidOperandTypes => "invalid type for operation '{0}': {1} and {2}",
            Self::InvalidOperandType => "invalid type for operation '{0}': {1}",
            Self::InvalidArgumentType => "{0}: argument {1} must be {2}, got {3}",
            Self::DivideByZero => "divide by zero",
            Self::ValueOutOfRange => "{0} is out of range for {1}",
            Self::IndexOutOfRange => "index {0} is out of range for an array of length {1}",
            Self::RecursionLimit => "call depth exceeded {0} in {1}",
        }
    }
}
