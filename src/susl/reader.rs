//! Decoder for the binary event format. Reverses [`super::binary`] exactly.

use std::fmt;
use std::io::{self, Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt};

use super::ast::*;
use super::binary::*;

#[derive(Debug)]
pub enum DecodeError {
    Io(io::Error),
    BadMagic([u8; 4]),
    UnsupportedVersion(i32),
    UnknownTag { what: &'static str, tag: u8 },
    NegativeCount(i32),
    InvalidUtf8,
    TrailingBytes(usize),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Io(e) => write!(f, "read error: {e}"),
            DecodeError::BadMagic(m) => write!(f, "not a score binary (magic {m:02x?})"),
            DecodeError::UnsupportedVersion(v) => write!(f, "unsupported format version {v}"),
            DecodeError::UnknownTag { what, tag } => write!(f, "unknown {what} tag 0x{tag:02x}"),
            DecodeError::NegativeCount(n) => write!(f, "negative element count {n}"),
            DecodeError::InvalidUtf8 => f.write_str("string is not valid UTF-8"),
            DecodeError::TrailingBytes(n) => write!(f, "{n} unexpected trailing byte(s)"),
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecodeError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for DecodeError {
    fn from(e: io::Error) -> Self {
        DecodeError::Io(e)
    }
}

/// A decoded command. Source positions are not part of the format.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedCommand {
    pub at: Option<AtPosition>,
    pub kind: CommandKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedScore {
    pub version: i32,
    pub timebase: i32,
    pub tempo: f64,
    pub time_signature: TimeSignature,
    pub defaults: Vec<Expression>,
    pub default_vibrato: Option<VibratoBlock>,
    pub commands: Vec<DecodedCommand>,
}

pub fn decode(bytes: &[u8]) -> Result<DecodedScore, DecodeError> {
    let mut r = Reader {
        inner: Cursor::new(bytes),
    };

    let mut magic = [0u8; 4];
    r.inner.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(DecodeError::BadMagic(magic));
    }
    let version = r.i32()?;
    if version != VERSION {
        return Err(DecodeError::UnsupportedVersion(version));
    }

    r.section(SECTION_CONFIG)?;
    let timebase = r.i32()?;
    let tempo = r.f64()?;
    let time_signature = TimeSignature::new(r.i32()?, r.i32()?);

    r.section(SECTION_DEFAULTS)?;
    let defaults = r.expressions()?;
    let default_vibrato = if r.bool()? { Some(r.vibrato()?) } else { None };

    r.section(SECTION_SEQUENCE)?;
    let count = r.count()?;
    let mut commands = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
        commands.push(r.command()?);
    }

    let remaining = bytes.len() - r.inner.position() as usize;
    if remaining > 0 {
        return Err(DecodeError::TrailingBytes(remaining));
    }

    Ok(DecodedScore {
        version,
        timebase,
        tempo,
        time_signature,
        defaults,
        default_vibrato,
        commands,
    })
}

struct Reader<'a> {
    inner: Cursor<&'a [u8]>,
}

impl Reader<'_> {
    fn u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.inner.read_u8()?)
    }

    fn bool(&mut self) -> Result<bool, DecodeError> {
        Ok(self.u8()? != 0)
    }

    fn i32(&mut self) -> Result<i32, DecodeError> {
        Ok(self.inner.read_i32::<LittleEndian>()?)
    }

    fn f64(&mut self) -> Result<f64, DecodeError> {
        Ok(self.inner.read_f64::<LittleEndian>()?)
    }

    fn count(&mut self) -> Result<usize, DecodeError> {
        let n = self.i32()?;
        usize::try_from(n).map_err(|_| DecodeError::NegativeCount(n))
    }

    fn string(&mut self) -> Result<String, DecodeError> {
        let mut len: u64 = 0;
        let mut shift = 0;
        loop {
            let byte = self.u8()?;
            len |= ((byte & 0x7f) as u64) << shift;
            if byte & 0x80 == 0 {
                break;
            }
            shift += 7;
            if shift >= 64 {
                return Err(io::Error::new(io::ErrorKind::InvalidData, "string length overflow").into());
            }
        }
        let mut buf = Vec::new();
        (&mut self.inner).take(len).read_to_end(&mut buf)?;
        if (buf.len() as u64) < len {
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
        }
        String::from_utf8(buf).map_err(|_| DecodeError::InvalidUtf8)
    }

    fn section(&mut self, expected: u8) -> Result<(), DecodeError> {
        match self.u8()? {
            tag if tag == expected => Ok(()),
            tag => Err(DecodeError::UnknownTag {
                what: "section",
                tag,
            }),
        }
    }

    fn expressions(&mut self) -> Result<Vec<Expression>, DecodeError> {
        let count = self.count()?;
        let mut out = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            let name = self.string()?;
            let value = self.f64()?;
            out.push(Expression { name, value });
        }
        Ok(out)
    }

    fn vibrato(&mut self) -> Result<VibratoBlock, DecodeError> {
        let mut field = || -> Result<Option<f64>, DecodeError> {
            Ok(if self.bool()? { Some(self.f64()?) } else { None })
        };
        Ok(VibratoBlock {
            period: field()?,
            depth: field()?,
            fade_in: field()?,
            fade_out: field()?,
        })
    }

    fn at(&mut self) -> Result<Option<AtPosition>, DecodeError> {
        if !self.bool()? {
            return Ok(None);
        }
        Ok(Some(AtPosition {
            measure: self.i32()?,
            beat: self.i32()?,
            tick: self.i32()?,
        }))
    }

    fn length(&mut self) -> Result<Length, DecodeError> {
        if self.bool()? {
            return Ok(Length::Ticks(self.i32()?));
        }
        let name = self.string()?;
        let dotted = self.bool()?;
        Ok(Length::Constant { name, dotted })
    }

    fn pitch(&mut self) -> Result<Pitch, DecodeError> {
        match self.u8()? {
            0 => Ok(Pitch::MidiNote(self.i32()?)),
            1 => Ok(Pitch::Scientific(self.string()?)),
            2 => Ok(Pitch::Relative(self.i32()?)),
            tag => Err(DecodeError::UnknownTag { what: "pitch", tag }),
        }
    }

    fn lyric(&mut self) -> Result<LyricPhoneme, DecodeError> {
        let phoneme_only = self.bool()?;
        let lyric_only = self.bool()?;
        let has_both = self.bool()?;
        let phoneme = if phoneme_only || has_both {
            Some(self.string()?)
        } else {
            None
        };
        let lyric = if lyric_only || has_both {
            Some(self.string()?)
        } else {
            None
        };
        Ok(LyricPhoneme { lyric, phoneme })
    }

    fn parameters(&mut self) -> Result<ParametersBlock, DecodeError> {
        let expressions = self.expressions()?;
        let vibrato = match self.u8()? {
            0 => VibratoHandling::None,
            1 => VibratoHandling::Inherit,
            2 => VibratoHandling::Override(self.vibrato()?),
            tag => return Err(DecodeError::UnknownTag { what: "vibrato", tag }),
        };
        let pitch_curve = if self.bool()? {
            let bezier = self.bool()?;
            let count = self.count()?;
            let mut points = Vec::with_capacity(count.min(1024));
            for _ in 0..count {
                points.push(PitchCurvePoint {
                    tick: self.i32()?,
                    cent: self.f64()?,
                    shape: self.string()?,
                });
            }
            Some(PitchCurveBlock { bezier, points })
        } else {
            None
        };
        Ok(ParametersBlock {
            expressions,
            vibrato,
            pitch_curve,
        })
    }

    fn command(&mut self) -> Result<DecodedCommand, DecodeError> {
        let tag = self.u8()?;
        let at = self.at()?;
        let kind = match tag {
            TAG_NOTE => {
                let length = self.length()?;
                let pitch = self.pitch()?;
                let lyric = self.lyric()?;
                let parameters = if self.bool()? {
                    Some(self.parameters()?)
                } else {
                    None
                };
                CommandKind::Note(Note {
                    length,
                    pitch,
                    lyric,
                    parameters,
                })
            }
            TAG_REST => CommandKind::Rest {
                length: self.length()?,
            },
            TAG_TEMPO => CommandKind::Tempo { bpm: self.f64()? },
            TAG_TIME_SIGNATURE => {
                CommandKind::TimeSignature(TimeSignature::new(self.i32()?, self.i32()?))
            }
            tag => return Err(DecodeError::UnknownTag { what: "command", tag }),
        };
        Ok(DecodedCommand { at, kind })
    }
}
