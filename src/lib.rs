//! Cadenza: a dual-grammar music-notation compiler.
//!
//! Two notation languages share one front door. EMEL scripts (`#!EMEL`)
//! are procedural macros that expand into a text track command stream;
//! SUSL scores (`#!SUSL`) are declarative and compile to a compact binary
//! event format. The [`orchestrator::Orchestrator`] picks the language from
//! the header line and reports errors with stable per-language codes.

pub mod config;
pub mod diagnostics;
pub mod emel;
pub mod header;
pub mod orchestrator;
pub mod pitch;
pub mod susl;

pub use config::CompilerConfig;
pub use diagnostics::ParseError;
pub use orchestrator::{CompileOutput, Orchestrator, ParseResult};
