//! Property-based tests for prompt rendering

use super::*;
use crate::state_machine::state::Role;
use proptest::prelude::*;

fn arb_role() -> impl Strategy<Value = Role> {
    prop_oneof![
        Just(Role::System),
        Just(Role::User),
        Just(Role::Assistant),
        Just(Role::Tool),
    ]
}

fn arb_message() -> impl Strategy<Value = Message> {
    (arb_role(), "[a-zA-Z0-9 <>/_{}:\",.\n]{0,80}")
        .prop_map(|(role, content)| Message { role, content })
}

proptest! {
    #[test]
    fn render_is_deterministic(messages in prop::collection::vec(arb_message(), 0..12)) {
        let first = render(&messages);
        let second = render(&messages.clone());
        prop_assert_eq!(first, second);
    }

    #[test]
    fn render_brackets_with_bos_and_generation_prompt(
        messages in prop::collection::vec(arb_message(), 0..12)
    ) {
        let prompt = render(&messages);
        prop_assert!(prompt.starts_with(BOS_TOKEN));
        let generation_prompt = format!("{IM_START}assistant\n");
        prop_assert!(prompt.ends_with(&generation_prompt));
    }

    #[test]
    fn render_preserves_order(messages in prop::collection::vec(arb_message(), 1..12)) {
        let prompt = render(&messages);
        let mut cursor = 0;
        for message in &messages {
            let segment = format!("{IM_START}{}\n{}{IM_END}\n", message.role, message.content);
            let found = prompt.get(cursor..).and_then(|rest| rest.find(&segment));
            prop_assert!(found.is_some(), "segment missing or out of order");
            cursor += found.unwrap_or(0) + segment.len();
        }
    }
}
