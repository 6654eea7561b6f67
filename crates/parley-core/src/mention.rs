//! Leading-mention filter.
//!
//! A message is addressed to the bot only when it *starts* with the bot's
//! mention token. The server's `mentioned` flag fires for a mention at any
//! position, so this filter narrows it down.

/// Builds the mention token for a display name: `@**Name**`.
pub fn mention_token(full_name: &str) -> String {
    format!("@**{full_name}**")
}

/// Strips a leading mention of `full_name` from `content`.
///
/// Returns the rest of the message with leading whitespace removed, or
/// `None` if the content does not start with the mention token.
pub fn extract_query_without_mention<'a>(content: &'a str, full_name: &str) -> Option<&'a str> {
    content
        .strip_prefix(mention_token(full_name).as_str())
        .map(str::trim_start)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leading_mention_is_stripped() {
        assert_eq!(
            extract_query_without_mention("@**Bot** hello", "Bot"),
            Some("hello")
        );
        assert_eq!(
            extract_query_without_mention("@**Bot**   \n what's up", "Bot"),
            Some("what's up")
        );
    }

    #[test]
    fn test_mention_only_yields_empty_query() {
        assert_eq!(extract_query_without_mention("@**Bot**", "Bot"), Some(""));
    }

    #[test]
    fn test_non_leading_mention_is_rejected() {
        assert_eq!(extract_query_without_mention("hi @**Bot**", "Bot"), None);
        assert_eq!(extract_query_without_mention(" @**Bot** hi", "Bot"), None);
    }

    #[test]
    fn test_other_names_do_not_match() {
        assert_eq!(extract_query_without_mention("@**Bot Two** hi", "Bot"), None);
        assert_eq!(extract_query_without_mention("@**Bo** hi", "Bot"), None);
    }

    #[test]
    fn test_names_with_spaces() {
        assert_eq!(
            extract_query_without_mention("@**Hello World Bot** ping", "Hello World Bot"),
            Some("ping")
        );
    }
}
