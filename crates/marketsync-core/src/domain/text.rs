const ELLIPSIS: &str = "...";

/// Shortens `input` to at most `max_chars` characters, ending in `...` when cut.
///
/// Counts characters rather than bytes so multi-byte text is never split.
pub fn truncate_with_ellipsis(input: &str, max_chars: usize) -> String {
    if input.chars().count() <= max_chars {
        return input.to_owned();
    }

    let marker_len = ELLIPSIS.len();
    if max_chars <= marker_len {
        return ELLIPSIS.chars().take(max_chars).collect();
    }

    let kept: String = input.chars().take(max_chars - marker_len).collect();
    format!("{}{ELLIPSIS}", kept.trim_end())
}
