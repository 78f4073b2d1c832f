//! EMEL: the procedural macro language.
//!
//! A script starts with a `#!EMEL` (or `#!EMEL2`) header line; the body after
//! it is lexed, parsed and run by the [`generator::Generator`], which emits a
//! plain-text track command stream.

pub mod ast;
pub mod builtins;
pub mod error;
pub mod generator;
pub mod lexer;
pub mod parser;
pub mod scope;
pub mod token;
pub mod value;

use crate::diagnostics::ParseError;
use crate::header;
use crate::susl;

use ast::Program;
use error::MacroDiagnostic;
use generator::Generator;
use lexer::Lexer;
use parser::Parser;

/// Header lines that select the macro language.
pub const HEADERS: [&str; 2] = ["#!EMEL", "#!EMEL2"];

/// Validate the header and return its line number with the body after it.
fn split_header(text: &str) -> Result<(usize, &str), ParseError> {
    let Some(header) = header::first_nonblank_line(text) else {
        return Err(ParseError::new(MacroDiagnostic::MissingHeader, 1, 1));
    };
    if HEADERS.contains(&header.text) {
        return Ok((header.line, &text[header.body_offset..]));
    }
    if header.text.starts_with(susl::HEADER) {
        return Err(
            ParseError::new(MacroDiagnostic::WrongLanguageHeader, header.line, 1)
                .with_args([header.text, HEADERS[0]])
                .with_length(header.text.chars().count()),
        );
    }
    Err(ParseError::new(MacroDiagnostic::MissingHeader, header.line, 1)
        .with_length(header.text.chars().count()))
}

/// Parse a script into its AST. Diagnostic lines refer to the full text.
pub fn parse(text: &str) -> Result<Program, ParseError> {
    let (offset, body) = split_header(text)?;
    let shift = |e: ParseError| e.shift_lines(offset);
    let tokens = Lexer::new(body).tokenize().map_err(shift)?;
    Parser::new(tokens).parse().map_err(shift)
}

/// Compile a script to its track command stream.
pub fn compile(text: &str) -> Result<String, ParseError> {
    let (offset, body) = split_header(text)?;
    let shift = |e: ParseError| e.shift_lines(offset);
    let tokens = Lexer::new(body).tokenize().map_err(shift)?;
    let program = Parser::new(tokens).parse().map_err(shift)?;
    Generator::new().generate(&program).map_err(shift)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_after_header() {
        let out = compile("#!EMEL\nTrack(1) { note(\"C4\", 4) }").unwrap();
        assert_eq!(out, "#!Track=1\nnote C4 4\n");
    }

    #[test]
    fn second_header_variant() {
        assert!(compile("\n\n#!EMEL2\n").unwrap().is_empty());
    }

    #[test]
    fn missing_header() {
        let err = compile("Track(1) { }").unwrap_err();
        assert!(err.is(MacroDiagnostic::MissingHeader));
        assert_eq!(err.line, 1);

        let err = compile("   \n").unwrap_err();
        assert!(err.is(MacroDiagnostic::MissingHeader));
    }

    #[test]
    fn score_header_is_called_out() {
        let err = compile("\n#!SUSL\nSequence { }").unwrap_err();
        assert!(err.is(MacroDiagnostic::WrongLanguageHeader));
        assert_eq!(err.line, 2);
        assert_eq!(err.args, vec!["#!SUSL", "#!EMEL"]);
    }

    #[test]
    fn body_errors_report_full_text_lines() {
        let err = compile("#!EMEL\nTrack(1) {\n  let x = 1 / 0\n}").unwrap_err();
        assert!(err.is(MacroDiagnostic::DivideByZero));
        assert_eq!((err.line, err.column), (3, 13));

        let err = compile("\n\n#!EMEL\n@").unwrap_err();
        assert!(err.is(MacroDiagnostic::InvalidCharacter));
        assert_eq!(err.line, 4);
    }

    #[test]
    fn parse_returns_program() {
        let program = parse("#!EMEL\nfunc f() { 1 }\nTrack(1) { f() }").unwrap();
        assert_eq!(program.items.len(), 2);
    }
}
