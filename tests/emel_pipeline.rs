use cadenza::emel::{self, error::MacroDiagnostic};
use cadenza::pitch;

#[test]
fn functions_loops_and_globals() {
    let src = r#"#!EMEL
Global {
    let root = "C4"
}

func arpeggio(base, length) {
    note(base, length)
    note(base + 4, length)
    note(base + 7, length)
}

Track(1) {
    tempo(120)
    repeat 2 {
        arpeggio(root + index * 12, 8)
    }
}
"#;
    let out = emel::compile(src).unwrap();
    assert_eq!(
        out,
        "#!Track=1\ntempo 120\n\
         note C4 8\nnote E4 8\nnote G4 8\n\
         note C5 8\nnote E5 8\nnote G5 8\n"
    );
}

#[test]
fn track_locals_do_not_leak_between_tracks() {
    let src = "#!EMEL\nTrack(1) { let x = 1 }\nTrack(2) { raw(x) }";
    let err = emel::compile(src).unwrap_err();
    assert!(err.is(MacroDiagnostic::UndefinedVariable));
    assert_eq!(err.args, vec!["x"]);
    assert_eq!(err.line, 3);
}

#[test]
fn block_scopes_shadow_without_clobbering() {
    let src = "#!EMEL\nTrack(1) {\n  let x = 1\n  if true { let x = 2; raw(x) }\n  raw(x)\n}";
    assert_eq!(emel::compile(src).unwrap(), "#!Track=1\n2\n1\n");
}

#[test]
fn divide_by_zero_reports_operator_position() {
    let err = emel::compile("#!EMEL\n\nTrack(1) {\n    let ratio = 8 / 0\n}").unwrap_err();
    assert!(err.is(MacroDiagnostic::DivideByZero));
    assert_eq!((err.line, err.column), (4, 19));
    assert!(err.code.starts_with("EMEL-"));
}

#[test]
fn builtin_arity_error_names_call() {
    let err = emel::compile("#!EMEL\nTrack(1) { tie(1) }").unwrap_err();
    assert!(err.is(MacroDiagnostic::WrongArgumentCount));
    assert_eq!(err.args, vec!["tie", "0", "1"]);
    assert_eq!(err.line, 2);
}

#[test]
fn transpose_builtin_round_trips() {
    let src = "#!EMEL\nTrack(1) {\n  let up = transpose(\"F#3\", 14)\n  raw(up)\n  raw(transpose(up, -14))\n}";
    assert_eq!(emel::compile(src).unwrap(), "#!Track=1\nG#4\nF#3\n");
}

#[test]
fn pitch_helpers_round_trip_sharp_spellings() {
    for midi in 0..=127 {
        let name = pitch::midi_to_name(midi);
        assert_eq!(pitch::parse_note_name(&name), Some(midi as u8));
        for shift in [-12, -1, 1, 7] {
            if !(0..=127).contains(&(midi + shift)) {
                continue;
            }
            let moved = pitch::transpose(&name, shift).unwrap();
            assert_eq!(pitch::transpose(&moved, -shift).as_deref(), Some(name.as_str()));
        }
    }
}

#[test]
fn errors_are_displayed_with_code_and_position() {
    let err = emel::compile("#!EMEL\nTrack(1) { nope() }").unwrap_err();
    let shown = err.to_string();
    assert!(shown.starts_with("[2:12] EMEL-"), "{shown}");
    assert!(shown.contains("nope"), "{shown}");
}

#[test]
fn score_header_is_rejected() {
    let err = emel::compile("#!SUSL\nSequence { }").unwrap_err();
    assert!(err.is(MacroDiagnostic::WrongLanguageHeader));
}
