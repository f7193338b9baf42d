//! Locating the `/` that opens an inline query

/// Character that opens an inline query
pub const TRIGGER: char = '/';

/// Find the trigger of the query ending at the end of `line`
///
/// Scans right to left and returns the character index of the last `/` that
/// sits at the start of the line or right after whitespace. A slash inside a
/// word (`and/or`, `a/b`) never counts.
pub fn find_trigger(line: &str) -> Option<usize> {
    let chars: Vec<char> = line.chars().collect();
    (0..chars.len()).rev().find(|&i| {
        chars[i] == TRIGGER && (i == 0 || chars[i - 1].is_whitespace())
    })
}
