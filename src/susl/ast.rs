//! Score-language AST.
//!
//! Nodes own their children and are read-only once parsed. The binary reader
//! decodes into the same value types, so everything below compares by value.

use crate::diagnostics::Pos;

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub configuration: Option<ConfigurationSection>,
    pub default: Option<DefaultSection>,
    pub sequence: SequenceSection,
}

/// A configuration value along with where it was written.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Setting<T> {
    pub value: T,
    pub pos: Pos,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigurationSection {
    pub timebase: Option<Setting<i32>>,
    pub tempo: Option<Setting<f64>>,
    pub time_signature: Option<Setting<TimeSignature>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefaultSection {
    pub expressions: Vec<Expression>,
    pub vibrato: Option<VibratoBlock>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SequenceSection {
    pub commands: Vec<Command>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSignature {
    pub numerator: i32,
    pub denominator: i32,
}

impl TimeSignature {
    pub const COMMON: TimeSignature = TimeSignature {
        numerator: 4,
        denominator: 4,
    };

    pub fn new(numerator: i32, denominator: i32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Positive numerator, power-of-two denominator.
    pub fn is_valid(&self) -> bool {
        self.numerator > 0 && self.denominator > 0 && (self.denominator as u32).is_power_of_two()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub at: Option<AtPosition>,
    pub kind: CommandKind,
    pub pos: Pos,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommandKind {
    Note(Note),
    Rest { length: Length },
    Tempo { bpm: f64 },
    TimeSignature(TimeSignature),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtPosition {
    pub measure: i32,
    pub beat: i32,
    pub tick: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub length: Length,
    pub pitch: Pitch,
    pub lyric: LyricPhoneme,
    pub parameters: Option<ParametersBlock>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Length {
    Ticks(i32),
    /// A note-value name such as `quarter`; dotted adds half again.
    Constant { name: String, dotted: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Pitch {
    MidiNote(i32),
    Scientific(String),
    /// Semitones relative to the previous note.
    Relative(i32),
}

impl Pitch {
    pub fn type_tag(&self) -> u8 {
        match self {
            Pitch::MidiNote(_) => 0,
            Pitch::Scientific(_) => 1,
            Pitch::Relative(_) => 2,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LyricPhoneme {
    pub lyric: Option<String>,
    pub phoneme: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParametersBlock {
    pub expressions: Vec<Expression>,
    pub vibrato: VibratoHandling,
    pub pitch_curve: Option<PitchCurveBlock>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum VibratoHandling {
    #[default]
    None,
    Inherit,
    Override(VibratoBlock),
}

impl VibratoHandling {
    pub fn tag(&self) -> u8 {
        match self {
            VibratoHandling::None => 0,
            VibratoHandling::Inherit => 1,
            VibratoHandling::Override(_) => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VibratoBlock {
    pub period: Option<f64>,
    pub depth: Option<f64>,
    pub fade_in: Option<f64>,
    pub fade_out: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PitchCurveBlock {
    pub bezier: bool,
    pub points: Vec<PitchCurvePoint>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PitchCurvePoint {
    pub tick: i32,
    pub cent: f64,
    pub shape: String,
}
