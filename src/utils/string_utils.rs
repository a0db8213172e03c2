//! UTF-8-safe string truncation.

/// Truncate a string to at most `max_chars` characters (not bytes), never
/// splitting a multi-byte character.
///
/// Zero allocation: returns a slice of the original string.
#[inline]
#[must_use]
pub fn safe_truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        None => s,
        Some((byte_idx, _)) => &s[..byte_idx],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_at_character_boundaries() {
        assert_eq!(safe_truncate_chars("Hello, World!", 5), "Hello");
        assert_eq!(safe_truncate_chars("héllo", 2), "hé");
        assert_eq!(safe_truncate_chars("short", 100), "short");
        assert_eq!(safe_truncate_chars("", 3), "");
    }
}
