//! Recursive-descent parser for the score language.
//!
//! A file is a `#!SUSL` header followed by up to three sections in any order:
//! `Configuration`, `Default` and the required `Sequence`. Literal ranges local
//! to a node (MIDI notes, tick lengths, tempo changes, time signatures) are
//! checked here; configuration ranges are checked by the semantic context.

use crate::diagnostics::{ParseError, Pos};
use crate::emel;
use crate::pitch;

use super::ast::*;
use super::error::ScoreDiagnostic;
use super::token::{Token, TokenKind};
use super::HEADER;

type ParseResult<T> = Result<T, ParseError>;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn parse(&mut self) -> ParseResult<Program> {
        self.parse_header()?;

        let mut configuration = None;
        let mut default = None;
        let mut sequence = None;

        while !self.is_at_end() {
            let t = self.peek().clone();
            let TokenKind::Ident(name) = &t.kind else {
                return Err(ParseError::at(ScoreDiagnostic::UnexpectedToken, t.pos())
                    .with_arg(&t.kind)
                    .with_length(t.lexeme.chars().count().max(1)));
            };
            let duplicate = || {
                ParseError::at(ScoreDiagnostic::DuplicateSection, t.pos())
                    .with_arg(name)
                    .with_length(name.chars().count())
            };
            match name.as_str() {
                "Configuration" if configuration.is_some() => return Err(duplicate()),
                "Default" if default.is_some() => return Err(duplicate()),
                "Sequence" if sequence.is_some() => return Err(duplicate()),
                "Configuration" => {
                    self.advance();
                    configuration = Some(self.parse_configuration()?);
                }
                "Default" => {
                    self.advance();
                    default = Some(self.parse_default()?);
                }
                "Sequence" => {
                    self.advance();
                    sequence = Some(self.parse_sequence()?);
                }
                other => {
                    return Err(ParseError::at(ScoreDiagnostic::InvalidSectionName, t.pos())
                        .with_arg(other)
                        .with_length(other.chars().count()))
                }
            }
        }

        let sequence = sequence
            .ok_or_else(|| ParseError::at(ScoreDiagnostic::MissingSequence, self.peek().pos()))?;
        Ok(Program {
            configuration,
            default,
            sequence,
        })
    }

    fn parse_header(&mut self) -> ParseResult<()> {
        let t = self.peek();
        let TokenKind::Header(found) = &t.kind else {
            return Err(ParseError::at(ScoreDiagnostic::MissingHeader, t.pos()));
        };
        if found == HEADER {
            self.advance();
            return Ok(());
        }

        let kind = if emel::HEADERS.contains(&found.as_str()) {
            ScoreDiagnostic::WrongLanguageHeader
        } else if found.to_ascii_uppercase().starts_with(HEADER) {
            ScoreDiagnostic::InvalidHeader
        } else {
            ScoreDiagnostic::MissingHeader
        };
        Err(ParseError::at(kind, t.pos())
            .with_args([found.as_str(), HEADER])
            .with_length(found.chars().count()))
    }

    // --- Sections ---

    fn parse_configuration(&mut self) -> ParseResult<ConfigurationSection> {
        let mut section = ConfigurationSection::default();
        self.expect(TokenKind::LBrace)?;
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            if self.eat(&TokenKind::Semicolon) {
                continue;
            }
            let (key, pos) = self.expect_ident()?;
            self.expect(TokenKind::Assign)?;
            match key.as_str() {
                "Timebase" => {
                    let value = self.parse_int()?;
                    set_once(&mut section.timebase, Setting { value, pos }, &key, pos)?;
                }
                "Tempo" => {
                    let value = self.parse_number()?;
                    set_once(&mut section.tempo, Setting { value, pos }, &key, pos)?;
                }
                "TimeSignature" => {
                    let value = self.parse_time_signature()?;
                    set_once(&mut section.time_signature, Setting { value, pos }, &key, pos)?;
                }
                _ => return Err(unknown_setting("configuration", &key, pos)),
            }
            self.eat(&TokenKind::Semicolon);
        }
        self.expect(TokenKind::RBrace)?;
        Ok(section)
    }

    fn parse_default(&mut self) -> ParseResult<DefaultSection> {
        let mut section = DefaultSection::default();
        self.expect(TokenKind::LBrace)?;
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            if self.eat(&TokenKind::Semicolon) {
                continue;
            }
            let (name, pos) = self.expect_ident()?;
            if name == "Vibrato" {
                self.eat(&TokenKind::Assign);
                let block = self.parse_vibrato_block()?;
                set_once(&mut section.vibrato, block, &name, pos)?;
            } else {
                self.expect(TokenKind::Assign)?;
                let value = self.parse_number()?;
                push_expression(&mut section.expressions, name, value, pos)?;
            }
            self.eat(&TokenKind::Semicolon);
        }
        self.expect(TokenKind::RBrace)?;
        Ok(section)
    }

    fn parse_sequence(&mut self) -> ParseResult<SequenceSection> {
        let mut commands = Vec::new();
        self.expect(TokenKind::LBrace)?;
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            if self.eat(&TokenKind::Semicolon) {
                continue;
            }
            commands.push(self.parse_command()?);
        }
        self.expect(TokenKind::RBrace)?;
        Ok(SequenceSection { commands })
    }

    // --- Commands ---

    fn parse_command(&mut self) -> ParseResult<Command> {
        let (name, pos) = self.expect_ident()?;
        let at = if self.peek().kind.is_ident("At") {
            Some(self.parse_at()?)
        } else {
            None
        };

        let kind = match name.as_str() {
            "Note" => CommandKind::Note(self.parse_note(pos)?),
            "Rest" => {
                self.expect_word("Length")?;
                CommandKind::Rest {
                    length: self.parenthesized(Self::parse_length)?,
                }
            }
            "Tempo" => {
                let value_pos = self.peek().pos();
                let bpm = self.parse_number()?;
                if bpm <= 0.0 {
                    return Err(out_of_range(bpm, "tempo", value_pos));
                }
                CommandKind::Tempo { bpm }
            }
            "TimeSignature" => CommandKind::TimeSignature(self.parse_time_signature()?),
            other => {
                return Err(ParseError::at(ScoreDiagnostic::UnknownCommand, pos)
                    .with_arg(other)
                    .with_length(other.chars().count()))
            }
        };
        self.eat(&TokenKind::Semicolon);
        Ok(Command { at, kind, pos })
    }

    /// `At(measure, beat[, tick])`.
    fn parse_at(&mut self) -> ParseResult<AtPosition> {
        self.expect_word("At")?;
        self.expect(TokenKind::LParen)?;
        let measure = self.parse_int()?;
        self.expect(TokenKind::Comma)?;
        let beat = self.parse_int()?;
        let tick = if self.eat(&TokenKind::Comma) {
            self.parse_int()?
        } else {
            0
        };
        self.expect(TokenKind::RParen)?;
        Ok(AtPosition {
            measure,
            beat,
            tick,
        })
    }

    /// Note clauses may come in any order; `Length` and `Pitch` are required.
    fn parse_note(&mut self, note_pos: Pos) -> ParseResult<Note> {
        let mut length = None;
        let mut pitch = None;
        let mut lyric = None;
        let mut phoneme = None;
        let mut parameters = None;

        loop {
            let t = self.peek().clone();
            let TokenKind::Ident(clause) = &t.kind else {
                break;
            };
            let pos = t.pos();
            match clause.as_str() {
                "Length" => {
                    self.advance();
                    let value = self.parenthesized(Self::parse_length)?;
                    set_once(&mut length, value, clause, pos)?;
                }
                "Pitch" => {
                    self.advance();
                    let value = self.parenthesized(Self::parse_pitch)?;
                    set_once(&mut pitch, value, clause, pos)?;
                }
                "Lyric" => {
                    self.advance();
                    let value = self.parenthesized(Self::expect_string)?;
                    set_once(&mut lyric, value, clause, pos)?;
                }
                "Phoneme" => {
                    self.advance();
                    let value = self.parenthesized(Self::expect_string)?;
                    set_once(&mut phoneme, value, clause, pos)?;
                }
                "Parameters" => {
                    self.advance();
                    self.eat(&TokenKind::Assign);
                    let value = self.parse_parameters()?;
                    set_once(&mut parameters, value, clause, pos)?;
                }
                _ => break,
            }
        }

        let missing = |field: &str| {
            ParseError::at(ScoreDiagnostic::MissingNoteField, note_pos).with_arg(field)
        };
        Ok(Note {
            length: length.ok_or_else(|| missing("Length"))?,
            pitch: pitch.ok_or_else(|| missing("Pitch"))?,
            lyric: LyricPhoneme { lyric, phoneme },
            parameters,
        })
    }

    fn parse_length(&mut self) -> ParseResult<Length> {
        let t = self.peek().clone();
        let pos = t.pos();
        match t.kind {
            TokenKind::Integer(_) => {
                let ticks = self.parse_int()?;
                if ticks <= 0 {
                    return Err(out_of_range(ticks, "length", pos));
                }
                Ok(Length::Ticks(ticks))
            }
            TokenKind::Ident(name) => {
                self.advance();
                let dotted = self.eat(&TokenKind::Dot);
                Ok(Length::Constant { name, dotted })
            }
            other => Err(expected("a length", &other, pos)),
        }
    }

    fn parse_pitch(&mut self) -> ParseResult<Pitch> {
        let t = self.peek().clone();
        let pos = t.pos();
        match t.kind {
            TokenKind::Integer(_) => {
                let midi = self.parse_int()?;
                if !(0..=127).contains(&midi) {
                    return Err(out_of_range(midi, "MIDI pitch", pos));
                }
                Ok(Pitch::MidiNote(midi))
            }
            TokenKind::Plus | TokenKind::Minus => Ok(Pitch::Relative(self.parse_int()?)),
            TokenKind::Ident(mut name) => {
                self.advance();
                // Negative octaves lex as a separate minus and integer.
                if self.check(&TokenKind::Minus) {
                    if let TokenKind::Integer(octave) = self.peek_at(1).kind {
                        self.advance();
                        self.advance();
                        name = format!("{name}-{octave}");
                    }
                }
                if pitch::parse_note_name(&name).is_none() {
                    return Err(ParseError::at(ScoreDiagnostic::InvalidPitch, pos)
                        .with_arg(&name)
                        .with_length(name.chars().count()));
                }
                Ok(Pitch::Scientific(name))
            }
            other => Err(expected("a pitch", &other, pos)),
        }
    }

    // --- Parameters ---

    fn parse_parameters(&mut self) -> ParseResult<ParametersBlock> {
        let mut expressions = Vec::new();
        let mut vibrato = None;
        let mut pitch_curve = None;

        self.expect(TokenKind::LBrace)?;
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            if self.eat(&TokenKind::Semicolon) {
                continue;
            }
            let (name, pos) = self.expect_ident()?;
            match name.as_str() {
                "Vibrato" => {
                    let handling = if self.eat(&TokenKind::Assign) {
                        self.parse_vibrato_handling()?
                    } else {
                        VibratoHandling::Override(self.parse_vibrato_block()?)
                    };
                    set_once(&mut vibrato, handling, &name, pos)?;
                }
                "PitchCurve" => {
                    self.eat(&TokenKind::Assign);
                    let curve = self.parse_pitch_curve()?;
                    set_once(&mut pitch_curve, curve, &name, pos)?;
                }
                _ => {
                    self.expect(TokenKind::Assign)?;
                    let value = self.parse_number()?;
                    push_expression(&mut expressions, name, value, pos)?;
                }
            }
            self.eat(&TokenKind::Semicolon);
        }
        self.expect(TokenKind::RBrace)?;

        Ok(ParametersBlock {
            expressions,
            vibrato: vibrato.unwrap_or_default(),
            pitch_curve,
        })
    }

    fn parse_vibrato_handling(&mut self) -> ParseResult<VibratoHandling> {
        let t = self.peek().clone();
        match &t.kind {
            TokenKind::Ident(word) if word == "None" => {
                self.advance();
                Ok(VibratoHandling::None)
            }
            TokenKind::Ident(word) if word == "Inherit" => {
                self.advance();
                Ok(VibratoHandling::Inherit)
            }
            TokenKind::LBrace => Ok(VibratoHandling::Override(self.parse_vibrato_block()?)),
            other => Err(expected("None, Inherit or a vibrato block", other, t.pos())),
        }
    }

    fn parse_vibrato_block(&mut self) -> ParseResult<VibratoBlock> {
        let mut block = VibratoBlock::default();
        self.expect(TokenKind::LBrace)?;
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            if self.eat(&TokenKind::Semicolon) {
                continue;
            }
            let (key, pos) = self.expect_ident()?;
            let slot = match key.as_str() {
                "Period" => &mut block.period,
                "Depth" => &mut block.depth,
                "FadeIn" => &mut block.fade_in,
                "FadeOut" => &mut block.fade_out,
                _ => return Err(unknown_setting("vibrato", &key, pos)),
            };
            self.expect(TokenKind::Assign)?;
            let value = self.parse_number()?;
            set_once(slot, value, &key, pos)?;
            self.eat(&TokenKind::Semicolon);
        }
        self.expect(TokenKind::RBrace)?;
        Ok(block)
    }

    /// `[Bezier] { (tick, cent[, "shape"]), ... }`; the shape defaults to
    /// `linear`.
    fn parse_pitch_curve(&mut self) -> ParseResult<PitchCurveBlock> {
        let bezier = self.peek().kind.is_ident("Bezier");
        if bezier {
            self.advance();
        }

        let mut points = Vec::new();
        self.expect(TokenKind::LBrace)?;
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            if self.eat(&TokenKind::Comma) || self.eat(&TokenKind::Semicolon) {
                continue;
            }
            self.expect(TokenKind::LParen)?;
            let tick = self.parse_int()?;
            self.expect(TokenKind::Comma)?;
            let cent = self.parse_number()?;
            let shape = if self.eat(&TokenKind::Comma) {
                self.expect_string()?
            } else {
                "linear".to_string()
            };
            self.expect(TokenKind::RParen)?;
            points.push(PitchCurvePoint { tick, cent, shape });
        }
        self.expect(TokenKind::RBrace)?;
        Ok(PitchCurveBlock { bezier, points })
    }

    // --- Values ---

    fn parse_time_signature(&mut self) -> ParseResult<TimeSignature> {
        let pos = self.peek().pos();
        let numerator = self.parse_int()?;
        self.expect(TokenKind::Slash)?;
        let denominator = self.parse_int()?;
        let signature = TimeSignature::new(numerator, denominator);
        if !signature.is_valid() {
            return Err(out_of_range(
                format!("{numerator}/{denominator}"),
                "time signature",
                pos,
            ));
        }
        Ok(signature)
    }

    /// An integer with an optional sign.
    fn parse_int(&mut self) -> ParseResult<i32> {
        let negative = self.parse_sign();
        let t = self.peek().clone();
        let TokenKind::Integer(n) = t.kind else {
            return Err(expected("an integer", &t.kind, t.pos()));
        };
        self.advance();
        let n = if negative { -n } else { n };
        i32::try_from(n).map_err(|_| out_of_range(n, "a 32-bit integer", t.pos()))
    }

    /// An integer or decimal with an optional sign.
    fn parse_number(&mut self) -> ParseResult<f64> {
        let negative = self.parse_sign();
        let t = self.peek();
        let n = match t.kind {
            TokenKind::Integer(n) => n as f64,
            TokenKind::Number(n) => n,
            ref other => return Err(expected("a number", other, t.pos())),
        };
        self.advance();
        Ok(if negative { -n } else { n })
    }

    fn parse_sign(&mut self) -> bool {
        if self.eat(&TokenKind::Minus) {
            true
        } else {
            self.eat(&TokenKind::Plus);
            false
        }
    }

    fn parenthesized<T>(&mut self, inner: fn(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        self.expect(TokenKind::LParen)?;
        let value = inner(self)?;
        self.expect(TokenKind::RParen)?;
        Ok(value)
    }

    // --- Utility methods ---

    fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> &Token {
        &self.tokens[(self.pos + offset).min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> &Token {
        let idx = self.pos.min(self.tokens.len() - 1);
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        &self.tokens[idx]
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len() || self.peek().kind == TokenKind::Eof
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(kind)
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> ParseResult<&Token> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            let t = self.peek();
            Err(expected(kind, &t.kind, t.pos()))
        }
    }

    /// A specific identifier such as `At` or `Length`.
    fn expect_word(&mut self, word: &str) -> ParseResult<()> {
        if self.peek().kind.is_ident(word) {
            self.advance();
            Ok(())
        } else {
            let t = self.peek();
            Err(expected(format!("'{word}'"), &t.kind, t.pos()))
        }
    }

    fn expect_ident(&mut self) -> ParseResult<(String, Pos)> {
        let t = self.peek();
        match &t.kind {
            TokenKind::Ident(s) => {
                let found = (s.clone(), t.pos());
                self.advance();
                Ok(found)
            }
            other => Err(expected("an identifier", other, t.pos())),
        }
    }

    fn expect_string(&mut self) -> ParseResult<String> {
        let t = self.peek();
        match &t.kind {
            TokenKind::Str(s) => {
                let s = s.clone();
                self.advance();
                Ok(s)
            }
            other => Err(expected("a string", other, t.pos())),
        }
    }
}

fn expected(what: impl ToString, found: &TokenKind, pos: Pos) -> ParseError {
    ParseError::at(ScoreDiagnostic::ExpectedToken, pos)
        .with_arg(what)
        .with_arg(found)
}

fn out_of_range(value: impl ToString, what: &str, pos: Pos) -> ParseError {
    ParseError::at(ScoreDiagnostic::ValueOutOfRange, pos)
        .with_arg(value)
        .with_arg(what)
}

fn unknown_setting(scope: &str, key: &str, pos: Pos) -> ParseError {
    ParseError::at(ScoreDiagnostic::UnknownSetting, pos)
        .with_args([scope, key])
        .with_length(key.chars().count())
}

fn set_once<T>(slot: &mut Option<T>, value: T, name: &str, pos: Pos) -> ParseResult<()> {
    if slot.is_some() {
        return Err(ParseError::at(ScoreDiagnostic::DuplicateSetting, pos).with_arg(name));
    }
    *slot = Some(value);
    Ok(())
}

fn push_expression(
    expressions: &mut Vec<Expression>,
    name: String,
    value: f64,
    pos: Pos,
) -> ParseResult<()> {
    if expressions.iter().any(|e| e.name == name) {
        return Err(ParseError::at(ScoreDiagnostic::DuplicateSetting, pos).with_arg(name));
    }
    expressions.push(Expression { name, value });
    Ok(())
}
