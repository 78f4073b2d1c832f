//! SUSL: the declarative score language.
//!
//! `compile` runs the whole pipeline: lex, parse, resolve the configuration
//! into a [`context::SemanticContext`], then serialise the sequence with
//! [`binary::BinaryGenerator`].

pub mod ast;
pub mod binary;
pub mod context;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod reader;
pub mod token;

use crate::diagnostics::ParseError;

use ast::Program;
use binary::{BinaryGenerator, Placement};
use context::SemanticContext;
use lexer::Lexer;
use parser::Parser;

/// The only header that selects the score language.
pub const HEADER: &str = "#!SUSL";

/// Output of a successful compilation.
#[derive(Debug, Clone)]
pub struct ScoreCompilation {
    pub bytes: Vec<u8>,
    /// Final context, including the tempo and time-signature change lists.
    pub context: SemanticContext,
    /// Start tick and duration of each sequence command, in source order.
    pub placements: Vec<Placement>,
}

pub fn parse(text: &str) -> Result<Program, ParseError> {
    let tokens = Lexer::new(text).tokenize()?;
    Parser::new(tokens).parse()
}

pub fn compile(text: &str) -> Result<ScoreCompilation, ParseError> {
    let program = parse(text)?;
    let mut context = SemanticContext::from_configuration(program.configuration.as_ref())?;
    let (bytes, placements) = BinaryGenerator::new(&mut context).generate(&program);
    Ok(ScoreCompilation {
        bytes,
        context,
        placements,
    })
}
