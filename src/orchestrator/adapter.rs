//! Language adapters: one per notation language, each able to sniff its header
//! and run its own pipeline.

use std::fmt;
use std::sync::Arc;

use crate::emel;
use crate::header;
use crate::susl;

use super::{CompileOutput, ParseResult};

/// A notation language the orchestrator can dispatch to.
/// Implementors must be safe to share across threads.
pub trait LanguageAdapter: Send + Sync + fmt::Debug {
    /// Adapter name, e.g. `"EMEL"`. Reported on failed results.
    fn name(&self) -> &str;

    /// 0 when the text is clearly not this language, 100 when it certainly is.
    fn confidence(&self, text: &str) -> u32;

    fn parse(&self, text: &str) -> ParseResult;
}

/// Confidence from an exact match of the first non-blank line.
fn header_confidence(text: &str, headers: &[&str]) -> u32 {
    if header::has_header(text, headers) {
        100
    } else {
        0
    }
}

/// The procedural macro language; produces a text command stream.
#[derive(Debug, Default, Clone, Copy)]
pub struct MacroAdapter;

impl LanguageAdapter for MacroAdapter {
    fn name(&self) -> &str {
        "EMEL"
    }

    fn confidence(&self, text: &str) -> u32 {
        header_confidence(text, &emel::HEADERS)
    }

    fn parse(&self, text: &str) -> ParseResult {
        match emel::compile(text) {
            Ok(out) => ParseResult::success(self.name(), CompileOutput::Text(out)),
            Err(e) => ParseResult::failure(Some(self.name()), vec![e]),
        }
    }
}

/// The declarative score language; produces the binary event format.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScoreAdapter;

impl LanguageAdapter for ScoreAdapter {
    fn name(&self) -> &str {
        "SUSL"
    }

    /// Near-miss headers (`#!susl`, `#!SUSL2`) score lower but still reach
    /// the parser, which reports them with a suggestion.
    fn confidence(&self, text: &str) -> u32 {
        match header::first_nonblank_line(text) {
            Some(h) if h.text == susl::HEADER => 100,
            Some(h) if h.text.to_ascii_uppercase().starts_with(susl::HEADER) => 50,
            _ => 0,
        }
    }

    fn parse(&self, text: &str) -> ParseResult {
        match susl::compile(text) {
            Ok(compiled) => ParseResult::success(self.name(), CompileOutput::Binary(compiled.bytes)),
            Err(e) => ParseResult::failure(Some(self.name()), vec![e]),
        }
    }
}

/// Look up a built-in adapter by name, ignoring case.
pub fn adapter_for(name: &str) -> Option<Arc<dyn LanguageAdapter>> {
    match name.to_ascii_uppercase().as_str() {
        "EMEL" => Some(Arc::new(MacroAdapter)),
        "SUSL" => Some(Arc::new(ScoreAdapter)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_confidence_is_exclusive() {
        for text in ["#!EMEL\n", "  \n#!EMEL2\nTrack(1) { }"] {
            assert_eq!(MacroAdapter.confidence(text), 100);
            assert_eq!(ScoreAdapter.confidence(text), 0);
        }
        let score = "\n#!SUSL\nSequence { }";
        assert_eq!(ScoreAdapter.confidence(score), 100);
        assert_eq!(MacroAdapter.confidence(score), 0);
    }

    #[test]
    fn macro_header_must_match_exactly() {
        assert_eq!(MacroAdapter.confidence("#!emel\n"), 0);
        assert_eq!(MacroAdapter.confidence("// #!EMEL\n"), 0);
        assert_eq!(MacroAdapter.confidence("#!SUSL\n"), 0);
    }

    #[test]
    fn score_near_miss_headers_score_partially() {
        assert_eq!(ScoreAdapter.confidence("#!SUSL\n"), 100);
        assert_eq!(ScoreAdapter.confidence("#!susl\n"), 50);
        assert_eq!(ScoreAdapter.confidence("\n#!SUSL2\n"), 50);
        assert_eq!(ScoreAdapter.confidence("#!EMEL\n"), 0);
        assert_eq!(ScoreAdapter.confidence("// #!SUSL\n"), 0);
        assert_eq!(ScoreAdapter.confidence("#!SUS\n"), 0);
    }

    #[test]
    fn adapters_wrap_outputs() {
        let text = MacroAdapter.parse("#!EMEL\nTrack(2) { tie() }");
        assert_eq!(
            text.output,
            Some(CompileOutput::Text("#!Track=2\ntie\n".into()))
        );
        let bin = ScoreAdapter.parse("#!SUSL\nSequence { }");
        assert!(matches!(bin.output, Some(CompileOutput::Binary(_))));
        assert!(text.is_success() && bin.is_success());
    }

    #[test]
    fn adapter_lookup() {
        assert_eq!(adapter_for("susl").unwrap().name(), "SUSL");
        assert_eq!(adapter_for("EMEL").unwrap().name(), "EMEL");
        assert!(adapter_for("ABC").is_none());
    }
}
