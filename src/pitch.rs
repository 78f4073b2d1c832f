//! Pitch names: parses "C4", "Eb2", "f#", converts to MIDI and transposes.

/// Octaves outside this range are not pitch names.
pub const OCTAVE_RANGE: std::ops::RangeInclusive<i32> = -100..=100;

/// Largest semitone shift accepted by transposition.
pub const MAX_TRANSPOSE: i32 = 1024;

const SHARP_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// A parsed pitch name.
///
/// Format: `<letter><optional accidental><optional octave>`
/// - Letter: A–G, either case (case is kept when transposing)
/// - Accidental: # (sharp) or b (flat)
/// - Octave: signed integer within [`OCTAVE_RANGE`] (C4 = middle C =
///   MIDI 60); absent means a bare pitch class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PitchName {
    /// Semitone within the octave, 0 = C. May be -1 or 12 for Cb / B#.
    pub class: i32,
    pub octave: Option<i32>,
    pub lowercase: bool,
}

impl PitchName {
    pub fn parse(name: &str) -> Option<Self> {
        let mut chars = name.chars();
        let letter = chars.next()?;
        let base = match letter.to_ascii_uppercase() {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            _ => return None,
        };

        let rest = chars.as_str();
        let (accidental, octave_str) = if let Some(r) = rest.strip_prefix('#') {
            (1, r)
        } else if let Some(r) = rest.strip_prefix('b') {
            (-1, r)
        } else {
            (0, rest)
        };

        let octave = if octave_str.is_empty() {
            None
        } else {
            let digits = octave_str.strip_prefix('-').unwrap_or(octave_str);
            if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            let octave: i32 = octave_str.parse().ok()?;
            if !OCTAVE_RANGE.contains(&octave) {
                return None;
            }
            Some(octave)
        };

        Some(Self {
            class: base + accidental,
            octave,
            lowercase: letter.is_ascii_lowercase(),
        })
    }

    /// MIDI note number, `(octave + 1) * 12 + class`. None without an octave.
    pub fn midi(&self) -> Option<i32> {
        self.octave?
            .checked_add(1)?
            .checked_mul(12)?
            .checked_add(self.class)
    }

    /// Shift by a signed number of semitones. None when the shift exceeds
    /// [`MAX_TRANSPOSE`] or the result leaves [`OCTAVE_RANGE`].
    pub fn transposed(&self, semitones: i32) -> Option<Self> {
        if semitones.unsigned_abs() > MAX_TRANSPOSE.unsigned_abs() {
            return None;
        }
        match self.octave {
            Some(_) => {
                let abs = self.midi()?.checked_add(semitones)?;
                let octave = abs.div_euclid(12) - 1;
                if !OCTAVE_RANGE.contains(&octave) {
                    return None;
                }
                Some(Self {
                    class: abs.rem_euclid(12),
                    octave: Some(octave),
                    lowercase: self.lowercase,
                })
            }
            None => Some(Self {
                class: (self.class + semitones).rem_euclid(12),
                octave: None,
                lowercase: self.lowercase,
            }),
        }
    }

    /// Spell the pitch with sharps.
    pub fn spell(&self) -> String {
        let (class, octave) = match self.octave {
            Some(_) => {
                let abs = self.midi().unwrap_or(0);
                (abs.rem_euclid(12), Some(abs.div_euclid(12) - 1))
            }
            None => (self.class.rem_euclid(12), None),
        };
        let mut out = SHARP_NAMES[class as usize].to_string();
        if self.lowercase {
            out = out.to_ascii_lowercase();
        }
        if let Some(o) = octave {
            out.push_str(&o.to_string());
        }
        out
    }
}

/// Whether the string is a pitch name.
pub fn is_pitch_name(s: &str) -> bool {
    PitchName::parse(s).is_some()
}

/// Parse a pitch name with an octave into a MIDI note number (0–127).
pub fn parse_note_name(name: &str) -> Option<u8> {
    let midi = PitchName::parse(name)?.midi()?;
    u8::try_from(midi).ok().filter(|m| *m <= 127)
}

/// Spell a MIDI note number, e.g. 61 → "C#4".
pub fn midi_to_name(midi: i32) -> String {
    PitchName {
        class: midi.rem_euclid(12),
        octave: Some(midi.div_euclid(12) - 1),
        lowercase: false,
    }
    .spell()
}

/// Transpose a pitch name by `semitones`. Returns None if `name` isn't a
/// pitch or the result can't be spelled as one.
pub fn transpose(name: &str, semitones: i32) -> Option<String> {
    Some(PitchName::parse(name)?.transposed(semitones)?.spell())
}
