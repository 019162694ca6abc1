//! Property-based tests for path normalization and cache naming.
//!
//! These tests use proptest to generate random inputs and verify that
//! invariants hold for all possible inputs.

#[cfg(test)]
mod proptest_tests {
    use crate::path::{cache_file_name, encode_path, normalize, PathKey};
    use std::path::Path;
    use proptest::prelude::*;

    // ============================================================================
    // encode_path property tests
    // ============================================================================

    proptest! {
        /// Property: encode_path never produces filesystem-unsafe characters
        #[test]
        fn encode_path_never_produces_unsafe_chars(input in ".*") {
            let result = encode_path(&input);
            let unsafe_chars = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];
            for ch in unsafe_chars {
                prop_assert!(
                    !result.contains(ch),
                    "encode_path produced unsafe character '{}' from input '{}'",
                    ch,
                    input
                );
            }
        }

        /// Property: encode_path replaces characters 1:1
        #[test]
        fn encode_path_preserves_char_count(input in ".+") {
            let result = encode_path(&input);
            prop_assert_eq!(result.chars().count(), input.chars().count());
        }
    }

    // ============================================================================
    // normalize property tests
    // ============================================================================

    proptest! {
        /// Property: normalizing twice is the same as normalizing once
        #[test]
        fn normalize_is_idempotent(input in "[a-zA-Z0-9_./\\\\]{0,40}") {
            let once = normalize(&input);
            let twice = normalize(&once);
            prop_assert_eq!(once, twice);
        }

        /// Property: normalized output never contains backslashes or uppercase ASCII
        #[test]
        fn normalize_output_is_canonical(input in "[a-zA-Z0-9_./\\\\]{0,40}") {
            let result = normalize(&input);
            prop_assert!(!result.contains('\\'));
            prop_assert!(!result.chars().any(|c| c.is_ascii_uppercase()));
        }

        /// Property: keys differing only in case and separators are equal
        #[test]
        fn path_key_ignores_case_and_separator_style(segments in prop::collection::vec("[a-zA-Z0-9]{1,8}", 1..6)) {
            let forward = format!("/{}", segments.join("/"));
            let backward = format!("\\{}", segments.join("\\")).to_uppercase();
            prop_assert_eq!(PathKey::new(&forward), PathKey::new(&backward));
        }
    }

    // ============================================================================
    // cache_file_name property tests
    // ============================================================================

    proptest! {
        /// Property: cache file names are single, safe path components
        #[test]
        fn cache_file_name_is_single_component(input in "/[a-zA-Z0-9_./:]{0,300}") {
            let name = cache_file_name(Path::new(&input));
            prop_assert!(!name.contains('/'));
            prop_assert!(!name.contains(':'));
            prop_assert!(name.ends_with(".cache"));
            prop_assert!(name.chars().count() <= 150 + 1 + 12 + 6);
        }

        /// Property: cache file names are deterministic
        #[test]
        fn cache_file_name_is_deterministic(input in ".*") {
            let path = Path::new(&input);
            prop_assert_eq!(cache_file_name(path), cache_file_name(path));
        }

        /// Property: paths differing only in ASCII case get different cache files
        #[test]
        fn cache_file_name_preserves_case(segments in prop::collection::vec("[a-z]{1,8}", 1..6)) {
            let lower = format!("/{}", segments.join("/"));
            let upper = lower.to_uppercase();
            prop_assert_ne!(cache_file_name(Path::new(&lower)), cache_file_name(Path::new(&upper)));
        }
    }
}
