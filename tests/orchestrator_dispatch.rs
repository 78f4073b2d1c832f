use std::sync::Arc;

use cadenza::diagnostics::{CoreDiagnostic, Language};
use cadenza::emel::error::MacroDiagnostic;
use cadenza::orchestrator::{MacroAdapter, ScoreAdapter};
use cadenza::susl::error::ScoreDiagnostic;
use cadenza::{CompileOutput, Orchestrator};

#[test]
fn macro_script_compiles_to_text() {
    let result = Orchestrator::with_default_adapters()
        .compile("#!EMEL\nTrack(1) {\n  note(\"C4\", 4)\n  note(\"E4\", 4)\n}\n");
    assert!(result.is_success());
    assert_eq!(result.language.as_deref(), Some("EMEL"));
    assert_eq!(
        result.output,
        Some(CompileOutput::Text(
            "#!Track=1\nnote C4 4\nnote E4 4\n".to_string()
        ))
    );
}

#[test]
fn score_compiles_to_binary() {
    let result = Orchestrator::with_default_adapters()
        .compile("#!SUSL\nSequence {\n  Note Length(quarter) Pitch(60)\n}\n");
    assert!(result.is_success());
    assert_eq!(result.language.as_deref(), Some("SUSL"));
    let output = result.output.expect("binary output");
    assert_eq!(output.extension(), "bin");
    assert_eq!(&output.as_bytes()[..4], b"SUSL");
}

#[test]
fn leading_blank_lines_before_header() {
    let result = Orchestrator::with_default_adapters().compile("\n\n   \n#!EMEL2\nTrack(3) { tie() }");
    assert_eq!(result.language.as_deref(), Some("EMEL"));
    assert_eq!(
        result.output,
        Some(CompileOutput::Text("#!Track=3\ntie\n".to_string()))
    );
}

#[test]
fn empty_input_is_a_silent_success() {
    let result = Orchestrator::with_default_adapters().compile(" \n\n\t");
    assert!(result.success);
    assert!(result.output.is_none());
    assert!(result.errors.is_empty());
    assert!(result.language.is_none());
}

#[test]
fn unrecognised_text_has_no_parser() {
    let result = Orchestrator::with_default_adapters().compile("X: 1\nT: tune\nK: C\nCDEF|");
    assert!(!result.is_success());
    assert!(result.language.is_none());
    assert_eq!(result.errors.len(), 1);
    let err = &result.errors[0];
    assert!(err.is(CoreDiagnostic::NoParserFound));
    assert_eq!(err.language, Language::Core);
    assert!(err.to_string().starts_with(&format!("[1:1] {}: no parser found", err.code)));
}

#[test]
fn broken_score_carries_score_codes() {
    let result = Orchestrator::with_default_adapters()
        .compile("#!SUSL\nSequence {\n  Note Pitch(60)\n}\n");
    assert!(!result.is_success());
    assert_eq!(result.language.as_deref(), Some("SUSL"));
    let err = &result.errors[0];
    assert!(err.is(ScoreDiagnostic::MissingNoteField));
    assert!(err.code.starts_with("SUSL-"));
    assert_eq!(err.line, 3);
}

#[test]
fn near_miss_score_header_gets_a_suggestion() {
    let result = Orchestrator::with_default_adapters().compile("#!susl\nSequence { }");
    assert!(!result.is_success());
    assert_eq!(result.language.as_deref(), Some("SUSL"));
    assert_eq!(result.errors.len(), 1);
    let err = &result.errors[0];
    assert!(err.is(ScoreDiagnostic::InvalidHeader));
    assert!(err.code.starts_with("SUSL-"));
    assert!(err.message().contains("did you mean #!SUSL"));
}

#[test]
fn hostile_input_is_reported_not_fatal() {
    let orchestrator = Orchestrator::with_default_adapters();
    let deep = format!("#!EMEL\nTrack(1) {{ raw({}1{}) }}", "(".repeat(50_000), ")".repeat(50_000));
    let sources = [
        deep.as_str(),
        "#!EMEL\nTrack(1) { raw(\"C4\" + 10000000000) }",
        "#!EMEL\nTrack(1) { raw(midi(\"C999999999\")) }",
        "#!SUSL\nSequence { Note Length(1) Pitch(C999999999) }",
    ];
    for (i, src) in sources.iter().enumerate() {
        let result = orchestrator.compile(src);
        assert!(!result.is_success(), "source {i}");
        assert_eq!(result.errors.len(), 1, "source {i}");
    }

    let text = orchestrator.compile("#!EMEL\nTrack(1) { raw(\"C999999999\" + 1) }");
    assert_eq!(
        text.output,
        Some(CompileOutput::Text("#!Track=1\nC9999999991\n".to_string()))
    );
}

#[test]
fn broken_macro_script_carries_macro_codes() {
    let result = Orchestrator::with_default_adapters().compile("#!EMEL\nTrack(1) { undefined_thing }");
    assert_eq!(result.language.as_deref(), Some("EMEL"));
    let err = &result.errors[0];
    assert!(err.is(MacroDiagnostic::UndefinedVariable));
    assert!(err.code.starts_with("EMEL-"));
}

#[test]
fn same_key_differs_between_languages() {
    let orchestrator = Orchestrator::with_default_adapters();
    let emel = orchestrator.compile("#!EMEL\n@");
    let susl = orchestrator.compile("#!SUSL\n@");
    assert!(emel.errors[0].is(MacroDiagnostic::InvalidCharacter));
    assert!(susl.errors[0].is(ScoreDiagnostic::InvalidCharacter));
    assert_ne!(emel.errors[0].code, susl.errors[0].code);
}

#[test]
fn registration_order_breaks_ties() {
    let mut orchestrator = Orchestrator::new();
    orchestrator.register(Arc::new(ScoreAdapter));
    orchestrator.register(Arc::new(MacroAdapter));
    assert_eq!(orchestrator.languages().collect::<Vec<_>>(), vec!["SUSL", "EMEL"]);
    let result = orchestrator.compile("#!EMEL\n");
    assert!(result.is_success());
    assert_eq!(result.language.as_deref(), Some("EMEL"));
}

#[test]
fn orchestrator_is_shareable_across_threads() {
    let orchestrator = Arc::new(Orchestrator::with_default_adapters());
    let handles: Vec<_> = (1..=4)
        .map(|n| {
            let orchestrator = Arc::clone(&orchestrator);
            std::thread::spawn(move || {
                orchestrator
                    .compile(&format!("#!EMEL\nTrack({n}) {{ rest({n}) }}"))
                    .output
            })
        })
        .collect();
    for (n, handle) in (1..=4).zip(handles) {
        let out = handle.join().unwrap();
        assert_eq!(
            out,
            Some(CompileOutput::Text(format!("#!Track={n}\nrest {n}\n")))
        );
    }
}
