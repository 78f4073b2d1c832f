//! Parsing orchestrator.
//!
//! Ranks registered [`LanguageAdapter`]s by header confidence and tries them
//! best-first. The first successful result wins; otherwise every candidate's
//! errors are returned in the order the candidates were tried.

pub mod adapter;

use std::sync::Arc;

use log::debug;

use crate::diagnostics::{CoreDiagnostic, ParseError};

pub use adapter::{adapter_for, LanguageAdapter, MacroAdapter, ScoreAdapter};

/// What a language produced.
#[derive(Debug, Clone, PartialEq)]
pub enum CompileOutput {
    /// Track command stream from the macro language.
    Text(String),
    /// Binary event stream from the score language.
    Binary(Vec<u8>),
}

impl CompileOutput {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            CompileOutput::Text(s) => s.as_bytes(),
            CompileOutput::Binary(b) => b,
        }
    }

    /// File extension for writing this output to disk.
    pub fn extension(&self) -> &'static str {
        match self {
            CompileOutput::Text(_) => "txt",
            CompileOutput::Binary(_) => "bin",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseResult {
    pub success: bool,
    pub output: Option<CompileOutput>,
    pub errors: Vec<ParseError>,
    /// Adapter that produced the result; none for empty input or when no
    /// adapter recognised the text.
    pub language: Option<String>,
}

impl ParseResult {
    /// Result for empty or whitespace-only input.
    pub fn empty() -> Self {
        Self {
            success: true,
            output: None,
            errors: Vec::new(),
            language: None,
        }
    }

    pub fn success(language: &str, output: CompileOutput) -> Self {
        Self {
            success: true,
            output: Some(output),
            errors: Vec::new(),
            language: Some(language.to_string()),
        }
    }

    pub fn failure(language: Option<&str>, errors: Vec<ParseError>) -> Self {
        Self {
            success: false,
            output: None,
            errors,
            language: language.map(str::to_string),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success || (self.output.is_some() && self.errors.is_empty())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Orchestrator {
    adapters: Vec<Arc<dyn LanguageAdapter>>,
}

impl Orchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// An orchestrator with both built-in languages registered.
    pub fn with_default_adapters() -> Self {
        let mut orchestrator = Self::new();
        orchestrator.register(Arc::new(MacroAdapter));
        orchestrator.register(Arc::new(ScoreAdapter));
        orchestrator
    }

    pub fn register(&mut self, adapter: Arc<dyn LanguageAdapter>) {
        debug!("registering language adapter {}", adapter.name());
        self.adapters.push(adapter);
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.adapters.iter().map(|a| a.name())
    }

    /// Every registered adapter's confidence for `text`, in registration order.
    pub fn confidences(&self, text: &str) -> Vec<(&str, u32)> {
        self.adapters
            .iter()
            .map(|a| (a.name(), a.confidence(text)))
            .collect()
    }

    pub fn compile(&self, text: &str) -> ParseResult {
        if text.trim().is_empty() {
            debug!("empty input, nothing to compile");
            return ParseResult::empty();
        }

        let mut candidates: Vec<(u32, &Arc<dyn LanguageAdapter>)> = self
            .adapters
            .iter()
            .map(|a| (a.confidence(text), a))
            .filter(|(score, _)| *score > 0)
            .collect();
        // Stable: equal scores keep registration order.
        candidates.sort_by(|a, b| b.0.cmp(&a.0));

        let Some((_, first)) = candidates.first() else {
            debug!("no adapter recognised the input");
            return ParseResult::failure(
                None,
                vec![ParseError::new(CoreDiagnostic::NoParserFound, 1, 1)],
            );
        };

        let mut errors = Vec::new();
        for (score, adapter) in &candidates {
            debug!("trying {} (confidence {score})", adapter.name());
            let result = adapter.parse(text);
            if result.is_success() {
                debug!("{} succeeded", adapter.name());
                return result;
            }
            debug!("{} failed with {} error(s)", adapter.name(), result.errors.len());
            errors.extend(result.errors);
        }

        ParseResult::failure(Some(first.name()), errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Language;
    use crate::emel::error::MacroDiagnostic;

    /// Claims every input with a fixed score and always fails.
    #[derive(Debug)]
    struct Greedy {
        name: &'static str,
        score: u32,
    }

    impl LanguageAdapter for Greedy {
        fn name(&self) -> &str {
            self.name
        }

        fn confidence(&self, _text: &str) -> u32 {
            self.score
        }

        fn parse(&self, _text: &str) -> ParseResult {
            ParseResult::failure(
                Some(self.name),
                vec![ParseError::new(MacroDiagnostic::UnexpectedToken, 1, 1).with_arg(self.name)],
            )
        }
    }

    #[test]
    fn empty_input_succeeds_without_adapters() {
        for text in ["", "  \n\t"] {
            let result = Orchestrator::new().compile(text);
            assert!(result.is_success());
            assert!(result.output.is_none());
            assert!(result.errors.is_empty());
        }
    }

    #[test]
    fn unknown_header_reports_no_parser() {
        let result = Orchestrator::with_default_adapters().compile("#!ABC\nfoo");
        assert!(!result.is_success());
        assert_eq!(result.errors.len(), 1);
        let err = &result.errors[0];
        assert!(err.is(CoreDiagnostic::NoParserFound));
        assert_eq!((err.line, err.column), (1, 1));
        assert!(err.code.starts_with("CORE-"));
    }

    #[test]
    fn dispatches_by_header() {
        let orchestrator = Orchestrator::with_default_adapters();
        let text = orchestrator.compile("#!EMEL\nTrack(1) { rest(4) }");
        assert_eq!(text.language.as_deref(), Some("EMEL"));
        assert_eq!(
            text.output,
            Some(CompileOutput::Text("#!Track=1\nrest 4\n".into()))
        );

        let bin = orchestrator.compile("#!SUSL\nSequence { }");
        assert_eq!(bin.language.as_deref(), Some("SUSL"));
        assert_eq!(bin.output.as_ref().map(|o| o.extension()), Some("bin"));
    }

    #[test]
    fn broken_score_reports_score_errors() {
        let result = Orchestrator::with_default_adapters().compile("#!SUSL\nSequence {");
        assert!(!result.is_success());
        assert_eq!(result.language.as_deref(), Some("SUSL"));
        assert!(result.errors[0].code.starts_with("SUSL-"));
        assert_eq!(result.errors[0].language, Language::Score);
    }

    #[test]
    fn candidates_run_best_first_and_errors_aggregate() {
        let mut orchestrator = Orchestrator::new();
        orchestrator.register(Arc::new(Greedy { name: "low", score: 10 }));
        orchestrator.register(Arc::new(Greedy { name: "none", score: 0 }));
        orchestrator.register(Arc::new(Greedy { name: "high", score: 90 }));
        orchestrator.register(Arc::new(Greedy { name: "tied", score: 10 }));

        let result = orchestrator.compile("anything");
        assert_eq!(result.language.as_deref(), Some("high"));
        let order: Vec<&str> = result.errors.iter().map(|e| e.args[0].as_str()).collect();
        assert_eq!(order, vec!["high", "low", "tied"]);
    }

    #[test]
    fn success_short_circuits() {
        let mut orchestrator = Orchestrator::with_default_adapters();
        orchestrator.register(Arc::new(Greedy { name: "late", score: 1 }));
        let result = orchestrator.compile("#!EMEL\n");
        assert!(result.is_success());
        assert!(result.errors.is_empty());
        assert_eq!(result.language.as_deref(), Some("EMEL"));
    }

    #[test]
    fn lists_languages_and_confidences() {
        let orchestrator = Orchestrator::with_default_adapters();
        assert_eq!(orchestrator.languages().collect::<Vec<_>>(), vec!["EMEL", "SUSL"]);
        assert_eq!(
            orchestrator.confidences("#!SUSL"),
            vec![("EMEL", 0), ("SUSL", 100)]
        );
    }
}
