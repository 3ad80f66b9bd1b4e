//! Char-offset helpers over UTF-8 strings.

use std::ops::Range;

pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

pub fn char_to_byte(s: &str, ci: usize) -> usize {
    if ci == 0 {
        0
    } else {
        s.char_indices().nth(ci).map(|(i, _)| i).unwrap_or(s.len())
    }
}

pub fn byte_to_char(s: &str, byte: usize) -> usize {
    s.char_indices().take_while(|(i, _)| *i < byte).count()
}

/// Substring covering the char range `range`, clamped to the text.
pub fn slice_chars(s: &str, range: Range<usize>) -> &str {
    let start = char_to_byte(s, range.start);
    let end = char_to_byte(s, range.end.max(range.start));
    &s[start..end]
}

/// Replaces the char range `range` with `insert` and returns the char offset
/// just past the inserted text.
pub fn replace_chars(s: &mut String, range: Range<usize>, insert: &str) -> usize {
    let start_ci = range.start.min(char_len(s));
    let start = char_to_byte(s, range.start);
    let end = char_to_byte(s, range.end.max(range.start));
    s.replace_range(start..end, insert);
    start_ci + char_len(insert)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_are_chars_not_bytes() {
        let s = "héllo";
        assert_eq!(char_to_byte(s, 2), 3);
        assert_eq!(byte_to_char(s, 3), 2);
        assert_eq!(char_to_byte(s, 99), s.len());
        assert_eq!(slice_chars(s, 1..3), "él");
    }

    #[test]
    fn replace_returns_caret_after_insert() {
        let mut s = String::from("añb");
        let caret = replace_chars(&mut s, 1..2, "xyz");
        assert_eq!(s, "axyzb");
        assert_eq!(caret, 4);
    }
}
