// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};

/// How a commit locates the typed digits inside the target's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitAnchor {
    /// The digits are the characters right before the current cursor.
    #[default]
    Cursor,
    /// The digits start at the cursor offset captured when the session opened.
    SessionStart,
}

impl CommitAnchor {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cursor => "cursor",
            Self::SessionStart => "session_start",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "cursor" => Some(Self::Cursor),
            "session_start" => Some(Self::SessionStart),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Splice {
    pub text: String,
    pub cursor: usize,
}

/// Character range `[start, end)` the commit replaces.
pub fn replaced_range(
    anchor: CommitAnchor,
    cursor: usize,
    start_offset: Option<usize>,
    buffer_len: usize,
) -> (usize, usize) {
    match (anchor, start_offset) {
        (CommitAnchor::SessionStart, Some(start)) => (start, start.saturating_add(buffer_len)),
        _ => (cursor.saturating_sub(buffer_len), cursor),
    }
}

/// Replaces characters `[start, end)` of `text` with `"<identifier> "` and
/// returns the new text with the cursor placed after the inserted space.
/// Offsets are clamped to the text.
pub fn splice_identifier(text: &str, start: usize, end: usize, identifier: &str) -> Splice {
    let total = text.chars().count();
    let end = end.min(total);
    let start = start.min(end);

    let before = &text[..byte_offset(text, start)];
    let after = &text[byte_offset(text, end)..];

    let mut spliced = String::with_capacity(text.len() + identifier.len() + 1);
    spliced.push_str(before);
    spliced.push_str(identifier);
    spliced.push(' ');
    spliced.push_str(after);

    Splice {
        text: spliced,
        cursor: start + identifier.chars().count() + 1,
    }
}

fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map_or(text.len(), |(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::{CommitAnchor, Splice, replaced_range, splice_identifier};

    fn commit(text: &str, cursor: usize, buffer: &str, id: &str) -> Splice {
        let (start, end) = replaced_range(CommitAnchor::Cursor, cursor, None, buffer.len());
        splice_identifier(text, start, end, id)
    }

    #[test]
    fn replaces_typed_digits_before_cursor() {
        let splice = commit("see part 12", 11, "12", "1245");
        assert_eq!(splice.text, "see part 1245 ");
        assert_eq!(splice.cursor, 14);
    }

    #[test]
    fn keeps_text_after_cursor() {
        let splice = commit("see part 12 now", 11, "12", "1245");
        assert_eq!(splice.text, "see part 1245  now");
        assert_eq!(splice.cursor, 14);
    }

    #[test]
    fn cursor_inside_the_digits_cuts_relative_to_cursor() {
        // Digits "12" typed at 9..11, cursor moved back to 10 afterwards.
        let splice = commit("see part 12 now", 10, "12", "1245");
        assert_eq!(splice.text, "see part1245 2 now");
        assert_eq!(splice.cursor, 13);
    }

    #[test]
    fn session_start_anchor_ignores_cursor_moves() {
        let (start, end) = replaced_range(CommitAnchor::SessionStart, 2, Some(9), 2);
        let splice = splice_identifier("see part 12 now", start, end, "1245");
        assert_eq!(splice.text, "see part 1245  now");
        assert_eq!(splice.cursor, 14);
    }

    #[test]
    fn session_start_without_captured_offset_falls_back_to_cursor() {
        assert_eq!(
            replaced_range(CommitAnchor::SessionStart, 11, None, 2),
            (9, 11)
        );
    }

    #[test]
    fn short_text_saturates_at_start() {
        let splice = commit("7", 1, "77", "777");
        assert_eq!(splice.text, "777 ");
        assert_eq!(splice.cursor, 4);
    }

    #[test]
    fn offsets_past_end_are_clamped() {
        let splice = splice_identifier("ab", 5, 9, "3");
        assert_eq!(splice.text, "ab3 ");
        assert_eq!(splice.cursor, 3);
    }

    #[test]
    fn offsets_count_characters_not_bytes() {
        let splice = commit("né 12", 5, "12", "129");
        assert_eq!(splice.text, "né 129 ");
        assert_eq!(splice.cursor, 7);
    }

    #[test]
    fn anchor_names_round_trip_through_parse() {
        for anchor in [CommitAnchor::Cursor, CommitAnchor::SessionStart] {
            assert_eq!(CommitAnchor::parse(anchor.as_str()), Some(anchor));
        }
        assert_eq!(CommitAnchor::parse("elsewhere"), None);
    }
}
