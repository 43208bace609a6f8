/// Pure utility functions for content manipulation
///
/// These functions contain NO side effects - they take inputs and return outputs
/// without touching databases, making API calls, or performing I/O.

/// Generate an excerpt from post content by truncation (fallback when the model omits one)
///
/// Markdown heading markers and line breaks are flattened first. If the text is
/// longer than `max_chars`, it is cut at a character boundary to
/// `max_chars - 3` characters and "..." is appended.
pub fn generate_excerpt(content: &str, max_chars: usize) -> String {
    let flattened = content
        .lines()
        .map(|line| line.trim_start_matches('#').trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if flattened.chars().count() > max_chars {
        let truncated: String = flattened.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", truncated.trim_end())
    } else {
        flattened
    }
}

/// Strip a Markdown code fence wrapping a model response.
///
/// Handles "```json\n{...}\n```", bare "```\n{...}\n```" and the single-line
/// "```json{...}```". Text without a leading fence is returned trimmed but
/// otherwise unchanged.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the info string ("json", "JSON", ...) up to the first newline.
    // A single-line fence has no newline, so only the leading word goes.
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
    };

    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_excerpt_short_content() {
        let excerpt = generate_excerpt("Short body", 160);
        assert_eq!(excerpt, "Short body");
    }

    #[test]
    fn test_generate_excerpt_long_content() {
        let long = "a".repeat(300);
        let excerpt = generate_excerpt(&long, 160);
        assert_eq!(excerpt.chars().count(), 160);
        assert!(excerpt.ends_with("..."));
    }

    #[test]
    fn test_generate_excerpt_flattens_markdown_headings() {
        let excerpt = generate_excerpt("# Heading\n\nFirst paragraph.\n## Next", 160);
        assert_eq!(excerpt, "Heading First paragraph. Next");
    }

    #[test]
    fn test_generate_excerpt_respects_char_boundaries() {
        let text = "é".repeat(200);
        let excerpt = generate_excerpt(&text, 10);
        assert_eq!(excerpt, format!("{}...", "é".repeat(7)));
    }

    #[test]
    fn test_strip_code_fence_with_language() {
        let raw = "```json\n{\"title\":\"x\"}\n```";
        assert_eq!(strip_code_fence(raw), "{\"title\":\"x\"}");
    }

    #[test]
    fn test_strip_code_fence_bare() {
        let raw = "  ```\n{\"a\":1}\n```  ";
        assert_eq!(strip_code_fence(raw), "{\"a\":1}");
    }

    #[test]
    fn test_strip_code_fence_no_fence() {
        assert_eq!(strip_code_fence("  {\"a\":1}\n"), "{\"a\":1}");
    }

    #[test]
    fn test_strip_code_fence_unterminated() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}"), "{\"a\":1}");
    }

    #[test]
    fn test_strip_code_fence_single_line() {
        assert_eq!(strip_code_fence("```json{\"a\":1}```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```{\"a\":1}```"), "{\"a\":1}");
    }
}
