/// Text processing utilities
pub mod text {
    /// Collapse runs of whitespace into single spaces and trim the ends.
    pub fn collapse_whitespace(text: &str) -> String {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Truncate to at most `max_chars` characters, preferring a sentence or
    /// word boundary. Counts characters, not bytes.
    pub fn smart_truncate(text: &str, max_chars: usize) -> String {
        let text = text.trim();
        if text.chars().count() <= max_chars {
            return text.to_string();
        }

        let cut = text
            .char_indices()
            .nth(max_chars)
            .map(|(index, _)| index)
            .unwrap_or(text.len());
        let truncated = &text[..cut];

        if let Some(last_sentence) = truncated.rfind('.') {
            truncated[..last_sentence + 1].to_string()
        } else if let Some(last_space) = truncated.rfind(' ') {
            format!("{}...", &truncated[..last_space])
        } else {
            format!("{}...", truncated)
        }
    }
}

/// Identifier helpers
pub mod ids {
    /// A stored post id, only when `raw` is exactly the decimal form of an integer.
    pub fn parse_stored_id(raw: &str) -> Option<i64> {
        let id = raw.parse::<i64>().ok()?;
        (id.to_string() == raw).then_some(id)
    }

    /// Unique stand-in for the `url` column of user posts.
    pub fn user_post_token() -> String {
        format!("user-post-{}", uuid::Uuid::new_v4())
    }
}
