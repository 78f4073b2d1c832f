//! Diagnostics model shared by both notation languages.
//!
//! Each language owns a catalog (an enum implementing [`DiagnosticKey`]) that
//! maps symbolic keys to message templates with `{n}` placeholders. A
//! [`ParseError`] keeps the key, its derived code, the source position and the
//! ordered template arguments; the message is only rendered on demand.

pub mod code;

use std::collections::BTreeSet;
use std::fmt;

pub use code::derive_code;

/// The catalog a diagnostic belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    /// Orchestrator-level diagnostics not tied to a grammar.
    Core,
    /// The procedural macro language (`#!EMEL`).
    Macro,
    /// The declarative score language (`#!SUSL`).
    Score,
}

impl Language {
    /// Printable prefix used in codes.
    pub fn tag(self) -> &'static str {
        match self {
            Language::Core => "CORE",
            Language::Macro => "EMEL",
            Language::Score => "SUSL",
        }
    }

    /// Salt character mixed into the code hash.
    pub fn salt(self) -> char {
        match self {
            Language::Core => 'C',
            Language::Macro => 'E',
            Language::Score => 'S',
        }
    }
}

/// An entry of a language's diagnostic catalog.
pub trait DiagnosticKey: Copy {
    const LANGUAGE: Language;

    /// Stable symbolic key, e.g. `"divide_by_zero"`.
    fn key(self) -> &'static str;

    /// Message template with `{0}`, `{1}`... placeholders.
    fn template(self) -> &'static str;
}

/// Diagnostics raised by the orchestrator itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreDiagnostic {
    NoParserFound,
}

impl DiagnosticKey for CoreDiagnostic {
    const LANGUAGE: Language = Language::Core;

    fn key(self) -> &'static str {
        match self {
            CoreDiagnostic::NoParserFound => "no_parser_found",
        }
    }

    fn template(self) -> &'static str {
        match self {
            CoreDiagnostic::NoParserFound => {
                "no parser found for this input (expected a #!EMEL, #!EMEL2 or #!SUSL header)"
            }
        }
    }
}

/// A source position (1-based line and column).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Pos {
    pub line: usize,
    pub col: usize,
}

impl Pos {
    pub fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

/// A positioned, coded diagnostic.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub language: Language,
    pub key: &'static str,
    pub code: String,
    pub template: &'static str,
    pub line: usize,
    pub column: usize,
    pub length: Option<usize>,
    pub args: Vec<String>,
}

impl ParseError {
    pub fn new<K: DiagnosticKey>(kind: K, line: usize, column: usize) -> Self {
        let key = kind.key();
        Self {
            language: K::LANGUAGE,
            key,
            code: derive_code(K::LANGUAGE, key),
            template: kind.template(),
            line,
            column,
            length: None,
            args: Vec::new(),
        }
    }

    /// Same as [`ParseError::new`], taking a [`Pos`].
    pub fn at<K: DiagnosticKey>(kind: K, pos: Pos) -> Self {
        Self::new(kind, pos.line, pos.col)
    }

    /// Append one template argument.
    pub fn with_arg(mut self, arg: impl ToString) -> Self {
        self.args.push(arg.to_string());
        self
    }

    /// Replace the template arguments.
    pub fn with_args<I, T>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        self.args = args.into_iter().map(|a| a.to_string()).collect();
        self
    }

    /// Attach the length of the offending span.
    pub fn with_length(mut self, length: usize) -> Self {
        self.length = Some(length);
        self
    }

    /// Move the diagnostic down by `offset` lines (used when a header line was
    /// stripped before lexing).
    pub fn shift_lines(mut self, offset: usize) -> Self {
        self.line += offset;
        self
    }

    /// Whether this diagnostic came from the given catalog entry.
    pub fn is<K: DiagnosticKey>(&self, kind: K) -> bool {
        self.language == K::LANGUAGE && self.key == kind.key()
    }

    /// Render the message. Falls back to the raw template when the arguments
    /// don't fit its placeholders.
    pub fn message(&self) -> String {
        format_template(self.template, &self.args)
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}:{}] {}: {}",
            self.line,
            self.column,
            self.code,
            self.message()
        )
    }
}

impl std::error::Error for ParseError {}

/// Substitute `{n}` placeholders. Returns the template unchanged if any
/// placeholder has no argument or if some argument is never referenced.
pub fn format_template(template: &str, args: &[String]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut used = BTreeSet::new();
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            rest = "";
            break;
        };
        match after[..close].parse::<usize>() {
            Ok(idx) => {
                let Some(arg) = args.get(idx) else {
                    return template.to_string();
                };
                used.insert(idx);
                out.push_str(arg);
            }
            Err(_) => out.push_str(&rest[open..open + close + 2]),
        }
        rest = &after[close + 1..];
    }
    out.push_str(rest);

    if used.len() != args.len() {
        return template.to_string();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn formats_in_order() {
        assert_eq!(
            format_template("{0} expects {1}, got {2}", &args(&["tie", "0", "1"])),
            "tie expects 0, got 1"
        );
    }

    #[test]
    fn placeholders_may_repeat_or_reorder() {
        assert_eq!(
            format_template("{1}-{0}-{1}", &args(&["a", "b"])),
            "b-a-b"
        );
    }

    #[test]
    fn missing_argument_returns_template() {
        assert_eq!(format_template("bad {0} and {1}", &args(&["x"])), "bad {0} and {1}");
    }

    #[test]
    fn surplus_argument_returns_template() {
        assert_eq!(format_template("just {0}", &args(&["x", "y"])), "just {0}");
    }

    #[test]
    fn non_numeric_braces_are_literal() {
        assert_eq!(format_template("a {b} c", &[]), "a {b} c");
    }

    #[test]
    fn core_error_display() {
        let err = ParseError::new(CoreDiagnostic::NoParserFound, 1, 1);
        let text = err.to_string();
        assert!(text.starts_with("[1:1] CORE-"));
        assert!(text.contains("no parser found"));
        assert!(err.is(CoreDiagnostic::NoParserFound));
    }

    #[test]
    fn shift_lines_moves_down() {
        let err = ParseError::new(CoreDiagnostic::NoParserFound, 3, 7).shift_lines(2);
        assert_eq!((err.line, err.column), (5, 7));
    }
}
