//! Outbound text chunking.
//!
//! Messenger rejects text messages longer than 2000 characters. [`split`] cuts long replies at a
//! line break, else at a space, inside the last 200 characters of each window (never before
//! character 1800), and hard-cuts when neither exists. Lengths count Unicode scalar values.

/// Platform limit for one text message.
pub const MAX_MESSAGE_CHARS: usize = 2000;

const SEARCH_WINDOW: usize = 200;
const MIN_SPLIT_AT: usize = 1800;

/// Splits `text` into ordered fragments of at most `max` characters.
///
/// Concatenating the fragments reproduces `text`. An empty input yields no fragments.
pub fn split(text: &str, max: usize) -> Vec<String> {
    let max = max.max(1);
    let mut chunks = Vec::new();
    let mut rest = text;

    loop {
        // Char index -> byte offset for the first max + 1 characters.
        let window: Vec<(usize, char)> = rest.char_indices().take(max + 1).collect();
        if window.len() <= max {
            if !rest.is_empty() {
                chunks.push(rest.to_string());
            }
            return chunks;
        }

        let split_at = find_boundary(&window, max, '\n')
            .or_else(|| find_boundary(&window, max, ' '))
            .unwrap_or(max);
        let byte_at = window[split_at].0;
        chunks.push(rest[..byte_at].to_string());
        rest = &rest[byte_at..];
    }
}

/// Highest char index in `[max(1800, max - 200), max]` holding `needle`.
fn find_boundary(window: &[(usize, char)], max: usize, needle: char) -> Option<usize> {
    let floor = MIN_SPLIT_AT.max(max.saturating_sub(SEARCH_WINDOW));
    if floor > max {
        return None;
    }
    (floor..=max).rev().find(|&i| window[i].1 == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_single_fragment() {
        assert_eq!(split("hello", MAX_MESSAGE_CHARS), vec!["hello".to_string()]);
    }

    #[test]
    fn test_empty_text_yields_nothing() {
        assert!(split("", MAX_MESSAGE_CHARS).is_empty());
    }

    #[test]
    fn test_exact_limit_is_not_split() {
        let text = "a".repeat(MAX_MESSAGE_CHARS);
        assert_eq!(split(&text, MAX_MESSAGE_CHARS).len(), 1);
    }

    #[test]
    fn test_splits_before_newline_at_1900() {
        let mut text = "a".repeat(1900);
        text.push('\n');
        text.push_str(&"b".repeat(149));
        assert_eq!(text.chars().count(), 2050);

        let chunks = split(&text, MAX_MESSAGE_CHARS);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], "a".repeat(1900));
        assert!(chunks[1].starts_with('\n'));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_prefers_newline_over_later_space() {
        let mut text = "a".repeat(1850);
        text.push('\n');
        text.push_str(&"b".repeat(100));
        text.push(' ');
        text.push_str(&"c".repeat(300));

        let chunks = split(&text, MAX_MESSAGE_CHARS);

        assert_eq!(chunks[0].chars().count(), 1850);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_falls_back_to_space() {
        let mut text = "a".repeat(1950);
        text.push(' ');
        text.push_str(&"b".repeat(500));

        let chunks = split(&text, MAX_MESSAGE_CHARS);

        assert_eq!(chunks[0].chars().count(), 1950);
        assert!(chunks[1].starts_with(' '));
    }

    #[test]
    fn test_newline_before_window_is_ignored() {
        let mut text = "a".repeat(1700);
        text.push('\n');
        text.push_str(&"b".repeat(800));

        let chunks = split(&text, MAX_MESSAGE_CHARS);

        assert_eq!(chunks[0].chars().count(), MAX_MESSAGE_CHARS);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        let text = "é".repeat(4500);

        let chunks = split(&text, MAX_MESSAGE_CHARS);

        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.chars().count() <= MAX_MESSAGE_CHARS));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_fragments_never_exceed_limit() {
        let text = "word ".repeat(2000) + &"line\n".repeat(700);

        let chunks = split(&text, MAX_MESSAGE_CHARS);

        assert!(chunks.iter().all(|c| c.chars().count() <= MAX_MESSAGE_CHARS));
        assert!(chunks.iter().all(|c| !c.is_empty()));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_small_limit_hard_cuts() {
        assert_eq!(split("abcdefg", 3), vec!["abc", "def", "g"]);
    }
}
