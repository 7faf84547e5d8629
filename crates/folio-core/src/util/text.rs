//! Text helpers.

/// Whether `text` is empty after trimming whitespace.
pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

/// Keep at most the first `max_chars` characters of `text`.
///
/// Cuts on a char boundary, so the result is always valid UTF-8 and the
/// same input always yields the same prefix.
pub fn head_truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_is_blank() {
        assert!(is_blank(""));
        assert!(is_blank("  \n\t"));
        assert!(!is_blank(" a "));
    }

    #[test]
    fn test_head_truncate_short_text_unchanged() {
        assert_eq!(head_truncate("hello", 10), "hello");
        assert_eq!(head_truncate("hello", 5), "hello");
    }

    #[test]
    fn test_head_truncate_cuts_prefix() {
        assert_eq!(head_truncate("hello world", 5), "hello");
        assert_eq!(head_truncate("hello", 0), "");
    }

    #[test]
    fn test_head_truncate_multibyte() {
        // Each Hangul syllable is 3 bytes.
        assert_eq!(head_truncate("한국어 기사", 3), "한국어");
    }

    proptest! {
        #[test]
        fn prop_head_truncate_is_prefix(s in ".*", n in 0usize..64) {
            let out = head_truncate(&s, n);
            prop_assert!(s.starts_with(out));
            prop_assert!(out.chars().count() <= n);
            prop_assert_eq!(out.chars().count(), s.chars().count().min(n));
        }
    }
}
