//! Script-match predicate.
//!
//! The target application gives no structured signal that a transliteration
//! happened. Presence of characters from the Sinhala Unicode block in the
//! rendered text is used as the proxy.

use std::ops::RangeInclusive;

/// Unicode block used by Sinhala script (U+0D80..U+0DFF)
pub const SINHALA_BLOCK: RangeInclusive<char> = '\u{0D80}'..='\u{0DFF}';

/// Check whether a character belongs to the Sinhala block
#[must_use]
pub fn is_sinhala(c: char) -> bool {
    SINHALA_BLOCK.contains(&c)
}

/// Check whether any character of `text` belongs to the Sinhala block
#[must_use]
pub fn contains_sinhala(text: &str) -> bool {
    text.chars().any(is_sinhala)
}

/// Pick the best-effort output line out of a page's visible text.
///
/// Lines are trimmed, blank lines dropped, and only lines with Sinhala
/// characters kept. The longest line by character count wins; on a tie the
/// earliest line is returned.
#[must_use]
pub fn longest_sinhala_line(text: &str) -> Option<&str> {
    let mut best: Option<(&str, usize)> = None;
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if !contains_sinhala(line) {
            continue;
        }
        let len = line.chars().count();
        match best {
            Some((_, best_len)) if best_len >= len => {}
            _ => best = Some((line, len)),
        }
    }
    best.map(|(line, _)| line)
}
