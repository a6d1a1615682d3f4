use std::collections::HashSet;

/// Maximum content length in a search result before truncation.
pub const DISPLAY_CONTENT_MAX_CHARS: usize = 200;

/// Marker appended to truncated result content.
pub const TRUNCATION_MARKER: &str = "...";

/// Truncate content for result display.
///
/// Stored content is never altered; only the projection handed to callers
/// is cut to the first [`DISPLAY_CONTENT_MAX_CHARS`] characters plus a
/// marker.
pub fn truncate_for_display(content: &str) -> String {
    if content.chars().count() <= DISPLAY_CONTENT_MAX_CHARS {
        return content.to_string();
    }
    let mut truncated: String =
        content.chars().take(DISPLAY_CONTENT_MAX_CHARS).collect();
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}

/// Extract lowercase alphanumeric words of at least `min_length` characters.
pub fn extract_keywords(text: &str, min_length: usize) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() >= min_length)
        .map(str::to_string)
        .collect()
}

/// Word-overlap (Jaccard) similarity between two texts, in [0.0, 1.0].
pub fn word_overlap_similarity(a: &str, b: &str) -> f32 {
    let words_a: HashSet<String> = extract_keywords(a, 3).into_iter().collect();
    let words_b: HashSet<String> = extract_keywords(b, 3).into_iter().collect();

    if words_a.is_empty() || words_b.is_empty() {
        return 0.0;
    }

    let intersection = words_a.intersection(&words_b).count();
    let union = words_a.union(&words_b).count();
    intersection as f32 / union as f32
}

/// Collapse whitespace runs and lowercase.
pub fn normalize_text(text: &str) -> String {
    text.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}
