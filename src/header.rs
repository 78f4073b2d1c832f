//! Language header sniffing.

/// The first non-blank line of a source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderLine<'a> {
    /// 1-based line number.
    pub line: usize,
    /// The line with surrounding whitespace trimmed.
    pub text: &'a str,
    /// Byte offset just past the line (and its newline).
    pub body_offset: usize,
}

/// Find the first line that isn't empty or whitespace-only.
pub fn first_nonblank_line(text: &str) -> Option<HeaderLine<'_>> {
    let mut offset = 0;
    for (idx, raw) in text.split_inclusive('\n').enumerate() {
        offset += raw.len();
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return Some(HeaderLine {
                line: idx + 1,
                text: trimmed,
                body_offset: offset,
            });
        }
    }
    None
}

/// Whether the first non-blank line is exactly one of `headers`.
pub fn has_header(text: &str, headers: &[&str]) -> bool {
    first_nonblank_line(text).is_some_and(|h| headers.contains(&h.text))
}
