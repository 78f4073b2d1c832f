//! Diagnostic catalog for the score language.

use crate::diagnostics::{DiagnosticKey, Language};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreDiagnostic {
    // Structural
    MissingHeader,
    WrongLanguageHeader,
    InvalidHeader,
    // Lexical
    InvalidCharacter,
    UnterminatedString,
    InvalidNumber,
    // Syntactic
    UnexpectedToken,
    ExpectedToken,
    InvalidSectionName,
    DuplicateSection,
    MissingSequence,
    UnknownCommand,
    UnknownSetting,
    DuplicateSetting,
    MissingNoteField,
    // Semantic
    InvalidPitch,
    ValueOutOfRange,
}

impl DiagnosticKey for ScoreDiagnostic {
    const LANGUAGE: Language = Language::Score;

    fn key(self) -> &'static str {
        match self {
            Self::MissingHeader => "missing_header",
            Self::WrongLanguageHeader => "wrong_language_header",
            Self::InvalidHeader => "invalid_header",
            Self::InvalidCharacter => "invalid_character",
            Self::UnterminatedString => "unterminated_string",
            Self::InvalidNumber => "invalid_number",
            Self::UnexpectedToken => "unexpected_token",
            Self::ExpectedToken => "expected_token",
            Self::InvalidSectionName => "invalid_section_name",
            Self::DuplicateSection => "duplicate_section",
            Self::MissingSequence => "missing_sequence",
            Self::UnknownCommand => "unknown_command",
            Self::UnknownSetting => "unknown_setting",
            Self::DuplicateSetting => "duplicate_setting",
            Self::MissingNoteField => "missing_note_field",
            Self::InvalidPitch => "invalid_pitch",
            Self::ValueOutOfRange => "value_out_of_range",
        }
    }

    fn template(self) -> &'static str {
        match self {
            Self::MissingHeader => "missing language header: the first line must be #!SUSL",
            Self::WrongLanguageHeader => "found header {0}, which belongs to the macro language; score files start with {1}",
            Self::InvalidHeader => "invalid header {0}; did you mean {1}?",
            Self::InvalidCharacter => "invalid character '{0}'",
            Self::UnterminatedString => "unterminated string literal",
            Self::InvalidNumber => "invalid number '{0}'",
            Self::UnexpectedToken => "unexpected {0}",
            Self::ExpectedToken => "expected {0}, found {1}",
            Self::InvalidSectionName => "invalid section name '{0}': expected Configuration, Default or Sequence",
            Self::DuplicateSection => "section {0} appears more than once",
            Self::MissingSequence => "missing Sequence section",
            Self::UnknownCommand => "unknown command '{0}'",
            Self::UnknownSetting => "unknown {0} setting '{1}'",
            Self::DuplicateSetting => "{0} is set more than once",
            Self::MissingNoteField => "note is missing {0}",
            Self::InvalidPitch => "invalid pitch '{0}'",
            Self::ValueOutOfRange => "{0} is out of range for {1}",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::ParseError;
    use crate::emel::error::MacroDiagnostic;

    #[test]
    fn codes_are_prefixed() {
        let err = ParseError::new(ScoreDiagnostic::MissingSequence, 1, 1);
        assert!(err.code.starts_with("SUSL-"));
    }

    #[test]
    fn same_key_differs_across_languages() {
        let score = ParseError::new(ScoreDiagnostic::MissingHeader, 1, 1);
        let macro_ = ParseError::new(MacroDiagnostic::MissingHeader, 1, 1);
        assert_eq!(score.key, macro_.key);
        assert_ne!(score.code[5..], macro_.code[5..]);
    }
}
