//! Completion cleanup: drop model reasoning, keep a short summary.

/// Text after the last `close_tag`, trimmed. Without the tag, the whole text trimmed.
pub fn strip_reasoning<'a>(raw: &'a str, close_tag: &str) -> &'a str {
    let body = if close_tag.is_empty() {
        raw
    } else {
        match raw.rfind(close_tag) {
            Some(pos) => &raw[pos + close_tag.len()..],
            None => raw,
        }
    };
    body.trim()
}

/// First `max_lines` newline-separated lines of the stripped answer, joined by
/// a single space and trimmed. Empty when the model produced nothing usable.
pub fn summarize(raw: &str, close_tag: &str, max_lines: usize) -> String {
    strip_reasoning(raw, close_tag)
        .split('\n')
        .take(max_lines)
        .map(|line| line.trim_end_matches('\r'))
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TAG: &str = "</think>";

    #[test]
    fn reasoning_is_removed_and_two_lines_kept() {
        let raw = "<think>X</think>Y line1\nY line2\nY line3";
        assert_eq!(summarize(raw, TAG, 2), "Y line1 Y line2");
    }

    #[test]
    fn text_without_reasoning_passes_through() {
        assert_eq!(summarize("First line\nSecond line\nThird", TAG, 2), "First line Second line");
        assert_eq!(summarize("  only one  ", TAG, 2), "only one");
    }

    #[test]
    fn empty_output_stays_empty() {
        assert_eq!(summarize("", TAG, 2), "");
        assert_eq!(summarize("<think>all reasoning</think>   \n ", TAG, 2), "");
    }

    #[test]
    fn last_close_tag_wins() {
        let raw = "<think>a</think>draft</think>\nFinal answer";
        assert_eq!(strip_reasoning(raw, TAG), "Final answer");
    }

    #[test]
    fn crlf_lines_are_joined_cleanly() {
        assert_eq!(summarize("One\r\nTwo\r\nThree", TAG, 2), "One Two");
    }

    #[test]
    fn line_count_is_configurable() {
        assert_eq!(summarize("a\nb\nc\nd", TAG, 3), "a b c");
        assert_eq!(summarize("a\nb", TAG, 5), "a b");
    }
}
