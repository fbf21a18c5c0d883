//! Property-based tests for tool-call extraction

use super::*;
use proptest::prelude::*;

proptest! {
    #[test]
    fn extract_never_panics(content in ".{0,200}") {
        let _ = extract(&Message::assistant(content));
    }

    #[test]
    fn extract_without_tags_is_none(content in "[a-zA-Z0-9 {}\":,.\n]{0,120}") {
        prop_assert_eq!(extract(&Message::assistant(content)), None);
    }

    #[test]
    fn extract_returns_trimmed_inner_text(
        prefix in "[a-zA-Z .\n]{0,40}",
        payload in "[a-zA-Z0-9{}\":,_]{1,60}",
        suffix in "[a-zA-Z .\n]{0,40}",
    ) {
        let content = format!("{prefix}<tool_call>\n  {payload}\n</tool_call>{suffix}");
        prop_assert_eq!(extract(&Message::assistant(content)), Some(payload));
    }
}
