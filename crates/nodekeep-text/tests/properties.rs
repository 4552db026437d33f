//! Property-based tests for nodekeep-text.
//!
//! These pin down the edit-distance contract the reference validator relies
//! on: symmetry, identity, and the suggestion threshold.

use nodekeep_text::{
    SUGGESTION_THRESHOLD, component_id, edit_distance, nearest, replace_whole_word, type_name,
};
use proptest::prelude::*;

fn arb_ident() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9]{0,12}"
}

proptest! {
    #[test]
    fn distance_is_symmetric(a in arb_ident(), b in arb_ident()) {
        prop_assert_eq!(edit_distance(&a, &b), edit_distance(&b, &a));
    }

    #[test]
    fn distance_to_self_is_zero(a in arb_ident()) {
        prop_assert_eq!(edit_distance(&a, &a), 0);
    }

    #[test]
    fn suggestion_offered_iff_min_distance_within_threshold(
        needle in arb_ident(),
        candidates in prop::collection::vec(arb_ident(), 0..8),
    ) {
        let min = candidates.iter().map(|c| edit_distance(&needle, c)).min();
        let hit = nearest(&needle, candidates.iter().map(String::as_str), SUGGESTION_THRESHOLD);
        match min {
            Some(d) if d <= SUGGESTION_THRESHOLD => {
                let hit = hit.expect("suggestion expected");
                prop_assert_eq!(hit.distance, d);
            }
            _ => prop_assert!(hit.is_none()),
        }
    }

    #[test]
    fn component_id_then_type_name_restores_capitalized_names(rest in "[a-z0-9]{0,10}", first in "[A-Z]") {
        let name = format!("{first}{rest}");
        prop_assert_eq!(type_name(&component_id(&name)), name);
    }

    #[test]
    fn replacing_a_word_with_itself_is_identity(text in "[a-zA-Z ,.]{0,40}", word in arb_ident()) {
        let (out, _) = replace_whole_word(&text, &word, &word);
        prop_assert_eq!(out, text);
    }
}
