//! Builtin functions of the macro language.
//!
//! The table is built once and shared read-only by every compilation. Emitting
//! builtins append one command line to the generator's output; the others are
//! pure helpers.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::pitch::{self, PitchName};

use super::error::MacroDiagnostic;
use super::value::{format_number, Value};

/// A builtin failure, positioned by the generator at the call site.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltinFault {
    pub kind: MacroDiagnostic,
    pub args: Vec<String>,
}

impl BuiltinFault {
    fn new<const N: usize>(kind: MacroDiagnostic, args: [String; N]) -> Self {
        Self {
            kind,
            args: args.into(),
        }
    }
}

pub type BuiltinFn = fn(&[Value], &mut String) -> Result<Value, BuiltinFault>;

#[derive(Debug, Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub arity: usize,
    pub func: BuiltinFn,
}

static BUILTINS: Lazy<HashMap<&'static str, Builtin>> = Lazy::new(|| {
    let table: [(&'static str, usize, BuiltinFn); 18] = [
        ("note", 2, note),
        ("rest", 1, rest),
        ("tempo", 1, tempo),
        ("volume", 1, volume),
        ("octave", 1, octave),
        ("program", 1, program),
        ("tie", 0, tie),
        ("raw", 1, raw),
        ("len", 1, len),
        ("at", 2, at),
        ("abs", 1, abs),
        ("floor", 1, floor),
        ("min", 2, min),
        ("max", 2, max),
        ("str", 1, to_str),
        ("midi", 1, midi),
        ("pitch_name", 1, pitch_name),
        ("transpose", 2, transpose),
    ];
    table
        .into_iter()
        .map(|(name, arity, func)| (name, Builtin { name, arity, func }))
        .collect()
});

pub fn lookup(name: &str) -> Option<&'static Builtin> {
    BUILTINS.get(name)
}

fn emit(out: &mut String, line: &str) {
    out.push_str(line);
    out.push('\n');
}

fn type_fault(func: &str, index: usize, expected: &str, got: &Value) -> BuiltinFault {
    BuiltinFault::new(
        MacroDiagnostic::InvalidArgumentType,
        [
            func.to_string(),
            (index + 1).to_string(),
            expected.to_string(),
            got.type_name().to_string(),
        ],
    )
}

fn number_arg(func: &str, args: &[Value], index: usize) -> Result<f64, BuiltinFault> {
    match &args[index] {
        Value::Number(n) => Ok(*n),
        other => Err(type_fault(func, index, "number", other)),
    }
}

/// A whole number within `lo..=hi`.
fn ranged_arg(
    func: &str,
    args: &[Value],
    index: usize,
    lo: f64,
    hi: f64,
) -> Result<f64, BuiltinFault> {
    let n = number_arg(func, args, index)?;
    if n.fract() != 0.0 || n < lo || n > hi {
        return Err(BuiltinFault::new(
            MacroDiagnostic::ValueOutOfRange,
            [format_number(n), func.to_string()],
        ));
    }
    Ok(n)
}

/// Pitch names pass through as written; numbers must be MIDI notes.
fn pitch_arg(func: &str, args: &[Value], index: usize) -> Result<String, BuiltinFault> {
    match &args[index] {
        Value::Str(s) if pitch::is_pitch_name(s) => Ok(s.clone()),
        Value::Number(_) => Ok(pitch::midi_to_name(ranged_arg(func, args, index, 0.0, 127.0)? as i32)),
        other => Err(type_fault(func, index, "a pitch name or MIDI note", other)),
    }
}

fn note(args: &[Value], out: &mut String) -> Result<Value, BuiltinFault> {
    let name = pitch_arg("note", args, 0)?;
    let length = number_arg("note", args, 1)?;
    emit(out, &format!("note {name} {}", format_number(length)));
    Ok(Value::Null)
}

fn rest(args: &[Value], out: &mut String) -> Result<Value, BuiltinFault> {
    let length = number_arg("rest", args, 0)?;
    emit(out, &format!("rest {}", format_number(length)));
    Ok(Value::Null)
}

fn tempo(args: &[Value], out: &mut String) -> Result<Value, BuiltinFault> {
    let bpm = number_arg("tempo", args, 0)?;
    if !(1.0..=999.0).contains(&bpm) {
        return Err(BuiltinFault::new(
            MacroDiagnostic::ValueOutOfRange,
            [format_number(bpm), "tempo".to_string()],
        ));
    }
    emit(out, &format!("tempo {}", format_number(bpm)));
    Ok(Value::Null)
}

fn volume(args: &[Value], out: &mut String) -> Result<Value, BuiltinFault> {
    let v = ranged_arg("volume", args, 0, 0.0, 127.0)?;
    emit(out, &format!("volume {}", format_number(v)));
    Ok(Value::Null)
}

fn octave(args: &[Value], out: &mut String) -> Result<Value, BuiltinFault> {
    let o = ranged_arg("octave", args, 0, -1.0, 9.0)?;
    emit(out, &format!("octave {}", format_number(o)));
    Ok(Value::Null)
}

fn program(args: &[Value], out: &mut String) -> Result<Value, BuiltinFault> {
    let p = ranged_arg("program", args, 0, 0.0, 127.0)?;
    emit(out, &format!("program {}", format_number(p)));
    Ok(Value::Null)
}

fn tie(_args: &[Value], out: &mut String) -> Result<Value, BuiltinFault> {
    emit(out, "tie");
    Ok(Value::Null)
}

fn raw(args: &[Value], out: &mut String) -> Result<Value, BuiltinFault> {
    emit(out, &args[0].to_string());
    Ok(Value::Null)
}

fn len(args: &[Value], _out: &mut String) -> Result<Value, BuiltinFault> {
    match &args[0] {
        Value::Array(items) => Ok(Value::Number(items.len() as f64)),
        Value::Str(s) => Ok(Value::Number(s.chars().count() as f64)),
        other => Err(type_fault("len", 0, "an array or string", other)),
    }
}

fn at(args: &[Value], _out: &mut String) -> Result<Value, BuiltinFault> {
    let Value::Array(items) = &args[0] else {
        return Err(type_fault("at", 0, "array", &args[0]));
    };
    let i = number_arg("at", args, 1)?;
    if i.fract() != 0.0 || i < 0.0 || i as usize >= items.len() {
        return Err(BuiltinFault::new(
            MacroDiagnostic::IndexOutOfRange,
            [format_number(i), items.len().to_string()],
        ));
    }
    Ok(items[i as usize].clone())
}

fn abs(args: &[Value], _out: &mut String) -> Result<Value, BuiltinFault> {
    Ok(Value::Number(number_arg("abs", args, 0)?.abs()))
}

fn floor(args: &[Value], _out: &mut String) -> Result<Value, BuiltinFault> {
    Ok(Value::Number(number_arg("floor", args, 0)?.floor()))
}

fn min(args: &[Value], _out: &mut String) -> Result<Value, BuiltinFault> {
    Ok(Value::Number(
        number_arg("min", args, 0)?.min(number_arg("min", args, 1)?),
    ))
}

fn max(args: &[Value], _out: &mut String) -> Result<Value, BuiltinFault> {
    Ok(Value::Number(
        number_arg("max", args, 0)?.max(number_arg("max", args, 1)?),
    ))
}

fn to_str(args: &[Value], _out: &mut String) -> Result<Value, BuiltinFault> {
    Ok(Value::Str(args[0].to_string()))
}

fn midi(args: &[Value], _out: &mut String) -> Result<Value, BuiltinFault> {
    match &args[0] {
        Value::Str(s) => match PitchName::parse(s).and_then(|p| p.midi()) {
            Some(m) => Ok(Value::Number(m as f64)),
            None => Err(type_fault("midi", 0, "a pitch name with octave", &args[0])),
        },
        other => Err(type_fault("midi", 0, "a pitch name with octave", other)),
    }
}

fn pitch_name(args: &[Value], _out: &mut String) -> Result<Value, BuiltinFault> {
    let n = ranged_arg("pitch_name", args, 0, 0.0, 127.0)?;
    Ok(Value::Str(pitch::midi_to_name(n as i32)))
}

fn transpose(args: &[Value], _out: &mut String) -> Result<Value, BuiltinFault> {
    let name = match &args[0] {
        Value::Str(s) if pitch::is_pitch_name(s) => s,
        other => return Err(type_fault("transpose", 0, "a pitch name", other)),
    };
    let limit = pitch::MAX_TRANSPOSE as f64;
    let semitones = ranged_arg("transpose", args, 1, -limit, limit)?;
    pitch::transpose(name, semitones as i32)
        .map(Value::Str)
        .ok_or_else(|| {
            BuiltinFault::new(
                MacroDiagnostic::ValueOutOfRange,
                [format_number(semitones), "transpose".to_string()],
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: &[Value]) -> (Result<Value, BuiltinFault>, String) {
        let builtin = lookup(name).unwrap();
        assert_eq!(builtin.arity, args.len(), "arity of {name}");
        let mut out = String::new();
        let result = (builtin.func)(args, &mut out);
        (result, out)
    }

    #[test]
    fn table_names_match_entries() {
        for name in BUILTINS.keys().copied() {
            assert_eq!(lookup(name).unwrap().name, name);
        }
        assert!(lookup("nope").is_none());
    }

    #[test]
    fn tie_has_zero_arity() {
        assert_eq!(lookup("tie").unwrap().arity, 0);
    }

    #[test]
    fn note_emits_line() {
        let (result, out) = call("note", &["C4".into(), Value::Number(4.0)]);
        assert_eq!(result, Ok(Value::Null));
        assert_eq!(out, "note C4 4\n");
    }

    #[test]
    fn note_accepts_midi_numbers() {
        let (_, out) = call("note", &[Value::Number(61.0), Value::Number(8.0)]);
        assert_eq!(out, "note C#4 8\n");
    }

    #[test]
    fn note_rejects_non_pitch_string() {
        let (result, out) = call("note", &["hello".into(), Value::Number(4.0)]);
        let fault = result.unwrap_err();
        assert_eq!(fault.kind, MacroDiagnostic::InvalidArgumentType);
        assert_eq!(fault.args[0], "note");
        assert!(out.is_empty());
    }

    #[test]
    fn volume_out_of_range() {
        let (result, _) = call("volume", &[Value::Number(128.0)]);
        let fault = result.unwrap_err();
        assert_eq!(fault.kind, MacroDiagnostic::ValueOutOfRange);
        assert_eq!(fault.args, vec!["128".to_string(), "volume".to_string()]);
    }

    #[test]
    fn at_checks_bounds() {
        let arr = Value::Array(vec![Value::Number(1.0)]);
        let (ok, _) = call("at", &[arr.clone(), Value::Number(0.0)]);
        assert_eq!(ok, Ok(Value::Number(1.0)));
        let (err, _) = call("at", &[arr, Value::Number(1.0)]);
        assert_eq!(err.unwrap_err().kind, MacroDiagnostic::IndexOutOfRange);
    }

    #[test]
    fn pure_helpers() {
        assert_eq!(call("len", &["abc".into()]).0, Ok(Value::Number(3.0)));
        assert_eq!(call("abs", &[Value::Number(-2.0)]).0, Ok(Value::Number(2.0)));
        assert_eq!(
            call("min", &[Value::Number(3.0), Value::Number(1.0)]).0,
            Ok(Value::Number(1.0))
        );
        assert_eq!(call("midi", &["A4".into()]).0, Ok(Value::Number(69.0)));
        assert_eq!(call("pitch_name", &[Value::Number(60.0)]).0, Ok(Value::from("C4")));
        assert_eq!(
            call("transpose", &["C4".into(), Value::Number(-1.0)]).0,
            Ok(Value::from("B3"))
        );
        assert_eq!(call("str", &[Value::Number(1.5)]).0, Ok(Value::from("1.5")));
    }

    #[test]
    fn transpose_bounds() {
        let (err, _) = call("transpose", &["B100".into(), Value::Number(1.0)]);
        let err = err.unwrap_err();
        assert_eq!(err.kind, MacroDiagnostic::ValueOutOfRange);
        assert_eq!(err.args, vec!["1", "transpose"]);

        let (err, _) = call("transpose", &["C999999999".into(), Value::Number(1.0)]);
        assert_eq!(err.unwrap_err().kind, MacroDiagnostic::InvalidArgumentType);

        let (err, _) = call("midi", &["C999999999".into()]);
        assert_eq!(err.unwrap_err().kind, MacroDiagnostic::InvalidArgumentType);
    }
}
