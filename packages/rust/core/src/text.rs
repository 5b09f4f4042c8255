//! Text shaping for prompts and model output.

/// Clean a raw opener returned by the model.
///
/// Lowercases, strips one pair of enclosing straight double quotes, cuts at
/// the first `#` and trims surrounding whitespace.
pub fn postprocess_opener(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let unquoted = match lowered.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        Some(inner) => inner,
        None => lowered.as_str(),
    };
    let before_tags = unquoted.split('#').next().unwrap_or_default();
    before_tags.trim().to_string()
}

/// Keep at most `budget` characters. The cut is not word-aware.
pub fn truncate_chars(text: &str, budget: usize) -> &str {
    match text.char_indices().nth(budget) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opener_drops_hashtags_and_case() {
        assert_eq!(postprocess_opener("I loved it! #great #video"), "i loved it!");
        assert_eq!(postprocess_opener("\"I loved it! #great #video\""), "i loved it!");
    }

    #[test]
    fn opener_strips_only_one_quote_layer() {
        assert_eq!(postprocess_opener("\"\"Nested\"\""), "\"nested\"");
        assert_eq!(postprocess_opener("\"unterminated"), "\"unterminated");
        assert_eq!(postprocess_opener("\""), "\"");
    }

    #[test]
    fn opener_of_only_tags_is_empty() {
        assert_eq!(postprocess_opener("  #one #two"), "");
    }

    #[test]
    fn truncation_counts_characters() {
        assert_eq!(truncate_chars("abcdef", 4), "abcd");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("héllo wörld", 7), "héllo w");
        assert_eq!(truncate_chars("abc", 0), "");
    }
}
