//! Semantic context for the score language.
//!
//! Holds the resolved configuration (timebase, tempo, time signature) and the
//! tempo/time-signature changes met while walking the sequence. Positions are
//! always resolved against the configuration values; the change lists are
//! metadata for downstream consumers and never feed back into resolution.

use log::debug;

use crate::diagnostics::{ParseError, Pos};

use super::ast::{AtPosition, ConfigurationSection, Length, TimeSignature};
use super::error::ScoreDiagnostic;

pub const DEFAULT_TIMEBASE: i32 = 480;
pub const DEFAULT_TEMPO: f64 = 120.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoChange {
    pub tick: i64,
    pub bpm: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSignatureChange {
    pub tick: i64,
    pub signature: TimeSignature,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SemanticContext {
    timebase: i32,
    tempo: f64,
    time_signature: TimeSignature,
    tempo_changes: Vec<TempoChange>,
    time_signature_changes: Vec<TimeSignatureChange>,
}

impl Default for SemanticContext {
    fn default() -> Self {
        Self {
            timebase: DEFAULT_TIMEBASE,
            tempo: DEFAULT_TEMPO,
            time_signature: TimeSignature::COMMON,
            tempo_changes: Vec::new(),
            time_signature_changes: Vec::new(),
        }
    }
}

impl SemanticContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context from an optional configuration section, validating
    /// every value that was given.
    pub fn from_configuration(config: Option<&ConfigurationSection>) -> Result<Self, ParseError> {
        let mut ctx = Self::default();
        let Some(config) = config else {
            return Ok(ctx);
        };

        if let Some(s) = config.timebase {
            if s.value <= 0 {
                return Err(out_of_range(s.value, "timebase", s.pos));
            }
            ctx.timebase = s.value;
        }
        if let Some(s) = config.tempo {
            if !(s.value > 0.0 && s.value.is_finite()) {
                return Err(out_of_range(s.value, "tempo", s.pos));
            }
            ctx.tempo = s.value;
        }
        if let Some(s) = config.time_signature {
            if !s.value.is_valid() {
                let ts = s.value;
                return Err(out_of_range(
                    format!("{}/{}", ts.numerator, ts.denominator),
                    "time signature",
                    s.pos,
                ));
            }
            ctx.time_signature = s.value;
        }

        debug!(
            "score context: timebase {}, tempo {}, time signature {}/{}",
            ctx.timebase, ctx.tempo, ctx.time_signature.numerator, ctx.time_signature.denominator
        );
        Ok(ctx)
    }

    pub fn timebase(&self) -> i32 {
        self.timebase
    }

    pub fn tempo(&self) -> f64 {
        self.tempo
    }

    pub fn time_signature(&self) -> TimeSignature {
        self.time_signature
    }

    pub fn tempo_changes(&self) -> &[TempoChange] {
        &self.tempo_changes
    }

    pub fn time_signature_changes(&self) -> &[TimeSignatureChange] {
        &self.time_signature_changes
    }

    /// `timebase * numerator * (4 / denominator)`.
    pub fn ticks_per_measure(&self) -> f64 {
        let ts = self.time_signature;
        self.timebase as f64 * ts.numerator as f64 * (4.0 / ts.denominator as f64)
    }

    /// Absolute tick of a position. Measure and beat are 1-based and, like the
    /// tick, clamp at zero so the result is never negative. No position means
    /// tick 0.
    pub fn position_to_tick(&self, at: Option<&AtPosition>) -> i64 {
        let Some(at) = at else {
            return 0;
        };
        let measures = (at.measure as i64 - 1).max(0) as f64;
        let beats = (at.beat as i64 - 1).max(0) as f64;
        let tick = at.tick.max(0) as f64;
        (measures * self.ticks_per_measure() + beats * self.timebase as f64 + tick).round() as i64
    }

    /// Ticks for a note-value name. Unknown names count as a quarter note.
    pub fn note_length_to_ticks(&self, name: &str) -> i64 {
        let ratio = match name.to_ascii_lowercase().as_str() {
            "whole" => 4.0,
            "half" => 2.0,
            "quarter" => 1.0,
            "eighth" => 0.5,
            "sixteenth" => 0.25,
            "thirty-second" | "thirtysecond" | "thirty_second" => 0.125,
            "sixty-fourth" | "sixtyfourth" | "sixty_fourth" => 0.0625,
            other => {
                debug!("unknown note length {other:?}, using a quarter note");
                1.0
            }
        };
        (self.timebase as f64 * ratio).round() as i64
    }

    /// Duration of a length clause; a dot adds half again.
    pub fn length_to_ticks(&self, length: &Length) -> i64 {
        match length {
            Length::Ticks(t) => *t as i64,
            Length::Constant { name, dotted } => {
                let base = self.note_length_to_ticks(name);
                if *dotted {
                    (base as f64 * 1.5).round() as i64
                } else {
                    base
                }
            }
        }
    }

    pub fn add_tempo_change(&mut self, tick: i64, bpm: f64) {
        self.tempo_changes.push(TempoChange { tick, bpm });
        self.tempo_changes.sort_by_key(|c| c.tick);
    }

    pub fn add_time_signature_change(&mut self, tick: i64, signature: TimeSignature) {
        self.time_signature_changes
            .push(TimeSignatureChange { tick, signature });
        self.time_signature_changes.sort_by_key(|c| c.tick);
    }
}

fn out_of_range(value: impl ToString, what: &str, pos: Pos) -> ParseError {
    ParseError::at(ScoreDiagnostic::ValueOutOfRange, pos)
        .with_arg(value)
        .with_arg(what)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::susl::ast::Setting;

    fn at(measure: i32, beat: i32, tick: i32) -> AtPosition {
        AtPosition {
            measure,
            beat,
            tick,
        }
    }

    fn with_signature(numerator: i32, denominator: i32) -> SemanticContext {
        let config = ConfigurationSection {
            time_signature: Some(Setting {
                value: TimeSignature::new(numerator, denominator),
                pos: Pos::new(1, 1),
            }),
            ..Default::default()
        };
        SemanticContext::from_configuration(Some(&config)).unwrap()
    }

    #[test]
    fn defaults() {
        let ctx = SemanticContext::from_configuration(None).unwrap();
        assert_eq!(ctx.timebase(), 480);
        assert_eq!(ctx.tempo(), 120.0);
        assert_eq!(ctx.time_signature(), TimeSignature::COMMON);
        assert_eq!(ctx.ticks_per_measure(), 1920.0);
    }

    #[test]
    fn position_to_tick_in_common_time() {
        let ctx = SemanticContext::new();
        assert_eq!(ctx.position_to_tick(None), 0);
        assert_eq!(ctx.position_to_tick(Some(&at(1, 1, 0))), 0);
        assert_eq!(ctx.position_to_tick(Some(&at(2, 1, 0))), 1920);
        assert_eq!(ctx.position_to_tick(Some(&at(2, 3, 15))), 1920 + 960 + 15);
    }

    #[test]
    fn compound_meter_measure_length() {
        let ctx = with_signature(6, 8);
        assert_eq!(ctx.ticks_per_measure(), 1440.0);
        assert_eq!(ctx.position_to_tick(Some(&at(3, 1, 0))), 2880);
    }

    #[test]
    fn negative_positions_clamp() {
        let ctx = SemanticContext::new();
        assert_eq!(ctx.position_to_tick(Some(&at(-4, 0, -10))), 0);
        assert_eq!(ctx.position_to_tick(Some(&at(0, 2, 0))), 480);
    }

    #[test]
    fn note_lengths() {
        let ctx = SemanticContext::new();
        assert_eq!(ctx.note_length_to_ticks("whole"), 1920);
        assert_eq!(ctx.note_length_to_ticks("eighth"), 240);
        assert_eq!(ctx.note_length_to_ticks("thirty-second"), 60);
        assert_eq!(ctx.note_length_to_ticks("sixty-fourth"), 30);
        assert_eq!(ctx.note_length_to_ticks("breve"), 480);
    }

    #[test]
    fn dotted_lengths() {
        let ctx = SemanticContext::new();
        let dotted = Length::Constant {
            name: "quarter".into(),
            dotted: true,
        };
        assert_eq!(ctx.length_to_ticks(&dotted), 720);
        assert_eq!(ctx.length_to_ticks(&Length::Ticks(100)), 100);
    }

    #[test]
    fn changes_stay_sorted() {
        let mut ctx = SemanticContext::new();
        ctx.add_tempo_change(1920, 140.0);
        ctx.add_tempo_change(0, 90.0);
        ctx.add_tempo_change(960, 100.0);
        let ticks: Vec<i64> = ctx.tempo_changes().iter().map(|c| c.tick).collect();
        assert_eq!(ticks, vec![0, 960, 1920]);

        ctx.add_time_signature_change(3840, TimeSignature::new(3, 4));
        ctx.add_time_signature_change(0, TimeSignature::new(4, 4));
        assert_eq!(ctx.time_signature_changes()[0].signature, TimeSignature::COMMON);
    }

    #[test]
    fn changes_do_not_affect_resolution() {
        let mut ctx = SemanticContext::new();
        ctx.add_time_signature_change(0, TimeSignature::new(3, 4));
        assert_eq!(ctx.position_to_tick(Some(&at(2, 1, 0))), 1920);
    }

    #[test]
    fn invalid_configuration_values() {
        let config = ConfigurationSection {
            timebase: Some(Setting {
                value: 0,
                pos: Pos::new(2, 17),
            }),
            ..Default::default()
        };
        let err = SemanticContext::from_configuration(Some(&config)).unwrap_err();
        assert!(err.is(ScoreDiagnostic::ValueOutOfRange));
        assert_eq!((err.line, err.column), (2, 17));
        assert_eq!(err.args, vec!["0", "timebase"]);

        let config = ConfigurationSection {
            tempo: Some(Setting {
                value: -1.0,
                pos: Pos::new(1, 1),
            }),
            ..Default::default()
        };
        assert!(SemanticContext::from_configuration(Some(&config)).is_err());
    }
}
