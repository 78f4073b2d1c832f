//! Binary event format writer.
//!
//! Layout (little-endian throughout):
//!
//! ```text
//! "SUSL" i32:version
//! 0x01 i32:timebase f64:tempo i32:num i32:den
//! 0x02 i32:count (string f64)* bool:has_vibrato [vibrato]
//! 0x03 i32:count command*
//! ```
//!
//! Strings are a LEB128 byte length followed by UTF-8; booleans are one byte.
//! All three sections are always present. Nothing is backpatched.

use byteorder::{ByteOrder, LittleEndian};
use log::trace;

use super::ast::*;
use super::context::SemanticContext;

pub const MAGIC: &[u8; 4] = b"SUSL";
pub const VERSION: i32 = 1;

pub const SECTION_CONFIG: u8 = 0x01;
pub const SECTION_DEFAULTS: u8 = 0x02;
pub const SECTION_SEQUENCE: u8 = 0x03;

pub const TAG_NOTE: u8 = 0x10;
pub const TAG_REST: u8 = 0x11;
pub const TAG_TEMPO: u8 = 0x20;
pub const TAG_TIME_SIGNATURE: u8 = 0x21;

/// Append-only little-endian byte sink.
#[derive(Debug, Default)]
pub struct BinaryWriter {
    buf: Vec<u8>,
}

impl BinaryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn bool(&mut self, v: bool) {
        self.buf.push(v as u8);
    }

    pub fn i32(&mut self, v: i32) {
        let mut b = [0; 4];
        LittleEndian::write_i32(&mut b, v);
        self.buf.extend_from_slice(&b);
    }

    pub fn f64(&mut self, v: f64) {
        let mut b = [0; 8];
        LittleEndian::write_f64(&mut b, v);
        self.buf.extend_from_slice(&b);
    }

    /// Element count of a list.
    pub fn count(&mut self, n: usize) {
        self.i32(n as i32);
    }

    pub fn string(&mut self, s: &str) {
        let mut len = s.len() as u64;
        loop {
            let byte = (len & 0x7f) as u8;
            len >>= 7;
            if len == 0 {
                self.buf.push(byte);
                break;
            }
            self.buf.push(byte | 0x80);
        }
        self.buf.extend_from_slice(s.as_bytes());
    }

    pub fn bytes(&mut self, b: &[u8]) {
        self.buf.extend_from_slice(b);
    }
}

/// Where a command landed on the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub start: i64,
    pub duration: i64,
}

/// Walks a parsed program once, writing bytes and recording tempo and
/// time-signature changes into the context.
pub struct BinaryGenerator<'a> {
    ctx: &'a mut SemanticContext,
    out: BinaryWriter,
    cursor: i64,
    placements: Vec<Placement>,
}

impl<'a> BinaryGenerator<'a> {
    pub fn new(ctx: &'a mut SemanticContext) -> Self {
        Self {
            ctx,
            out: BinaryWriter::new(),
            cursor: 0,
            placements: Vec::new(),
        }
    }

    pub fn generate(mut self, program: &Program) -> (Vec<u8>, Vec<Placement>) {
        self.out.bytes(MAGIC);
        self.out.i32(VERSION);
        self.write_config();
        self.write_defaults(program.default.as_ref());
        self.write_sequence(&program.sequence);
        (self.out.into_bytes(), self.placements)
    }

    fn write_config(&mut self) {
        let ts = self.ctx.time_signature();
        self.out.u8(SECTION_CONFIG);
        self.out.i32(self.ctx.timebase());
        self.out.f64(self.ctx.tempo());
        self.out.i32(ts.numerator);
        self.out.i32(ts.denominator);
    }

    fn write_defaults(&mut self, default: Option<&DefaultSection>) {
        self.out.u8(SECTION_DEFAULTS);
        match default {
            Some(section) => {
                self.write_expressions(&section.expressions);
                self.out.bool(section.vibrato.is_some());
                if let Some(vibrato) = &section.vibrato {
                    self.write_vibrato(vibrato);
                }
            }
            None => {
                self.out.count(0);
                self.out.bool(false);
            }
        }
    }

    fn write_sequence(&mut self, sequence: &SequenceSection) {
        self.out.u8(SECTION_SEQUENCE);
        self.out.count(sequence.commands.len());
        for command in &sequence.commands {
            self.write_command(command);
        }
    }

    fn write_command(&mut self, command: &Command) {
        let start = match &command.at {
            Some(at) => self.ctx.position_to_tick(Some(at)),
            None => self.cursor,
        };
        let mut duration = 0;

        match &command.kind {
            CommandKind::Note(note) => {
                self.out.u8(TAG_NOTE);
                self.write_at(command.at.as_ref());
                self.write_length(&note.length);
                self.write_pitch(&note.pitch);
                self.write_lyric(&note.lyric);
                self.out.bool(note.parameters.is_some());
                if let Some(params) = &note.parameters {
                    self.write_parameters(params);
                }
                duration = self.ctx.length_to_ticks(&note.length);
            }
            CommandKind::Rest { length } => {
                self.out.u8(TAG_REST);
                self.write_at(command.at.as_ref());
                self.write_length(length);
                duration = self.ctx.length_to_ticks(length);
            }
            CommandKind::Tempo { bpm } => {
                self.out.u8(TAG_TEMPO);
                self.write_at(command.at.as_ref());
                self.out.f64(*bpm);
                self.ctx.add_tempo_change(start, *bpm);
            }
            CommandKind::TimeSignature(ts) => {
                self.out.u8(TAG_TIME_SIGNATURE);
                self.write_at(command.at.as_ref());
                self.out.i32(ts.numerator);
                self.out.i32(ts.denominator);
                self.ctx.add_time_signature_change(start, *ts);
            }
        }

        trace!("command at tick {start} for {duration} ticks");
        self.placements.push(Placement { start, duration });
        self.cursor = start + duration;
    }

    fn write_at(&mut self, at: Option<&AtPosition>) {
        self.out.bool(at.is_some());
        if let Some(at) = at {
            self.out.i32(at.measure);
            self.out.i32(at.beat);
            self.out.i32(at.tick);
        }
    }

    fn write_length(&mut self, length: &Length) {
        match length {
            Length::Ticks(ticks) => {
                self.out.bool(true);
                self.out.i32(*ticks);
            }
            Length::Constant { name, dotted } => {
                self.out.bool(false);
                self.out.string(name);
                self.out.bool(*dotted);
            }
        }
    }

    fn write_pitch(&mut self, pitch: &Pitch) {
        self.out.u8(pitch.type_tag());
        match pitch {
            Pitch::MidiNote(v) | Pitch::Relative(v) => self.out.i32(*v),
            Pitch::Scientific(name) => self.out.string(name),
        }
    }

    fn write_lyric(&mut self, lp: &LyricPhoneme) {
        let has_both = lp.lyric.is_some() && lp.phoneme.is_some();
        self.out.bool(lp.phoneme.is_some() && !has_both);
        self.out.bool(lp.lyric.is_some() && !has_both);
        self.out.bool(has_both);
        if let Some(phoneme) = &lp.phoneme {
            self.out.string(phoneme);
        }
        if let Some(lyric) = &lp.lyric {
            self.out.string(lyric);
        }
    }

    fn write_parameters(&mut self, params: &ParametersBlock) {
        self.write_expressions(&params.expressions);
        self.out.u8(params.vibrato.tag());
        if let VibratoHandling::Override(block) = &params.vibrato {
            self.write_vibrato(block);
        }
        self.out.bool(params.pitch_curve.is_some());
        if let Some(curve) = &params.pitch_curve {
            self.out.bool(curve.bezier);
            self.out.count(curve.points.len());
            for p in &curve.points {
                self.out.i32(p.tick);
                self.out.f64(p.cent);
                self.out.string(&p.shape);
            }
        }
    }

    fn write_expressions(&mut self, expressions: &[Expression]) {
        self.out.count(expressions.len());
        for e in expressions {
            self.out.string(&e.name);
            self.out.f64(e.value);
        }
    }

    fn write_vibrato(&mut self, v: &VibratoBlock) {
        for field in [v.period, v.depth, v.fade_in, v.fade_out] {
            self.out.bool(field.is_some());
            if let Some(value) = field {
                self.out.f64(value);
            }
        }
    }
}
