//! Property tests for the pure math: Jaccard, compression, cache keys.

use proptest::prelude::*;

use aoma_mesh::services::cache::cache_key;
use aoma_mesh::services::swarm::compression::{compress, CompressionLevel};
use aoma_mesh::services::swarm::correlation::{extract_key_terms, jaccard};

proptest! {
    #[test]
    fn jaccard_stays_in_unit_interval(a in prop::collection::vec("[a-z]{1,8}", 0..30),
                                      b in prop::collection::vec("[a-z]{1,8}", 0..30)) {
        let similarity = jaccard(&a, &b);
        prop_assert!((0.0..=1.0).contains(&similarity));
    }

    #[test]
    fn jaccard_is_symmetric(a in prop::collection::vec("[a-z]{1,8}", 0..30),
                            b in prop::collection::vec("[a-z]{1,8}", 0..30)) {
        prop_assert_eq!(jaccard(&a, &b), jaccard(&b, &a));
    }

    #[test]
    fn jaccard_identity_is_one_for_nonempty(a in prop::collection::vec("[a-z]{1,8}", 1..30)) {
        prop_assert_eq!(jaccard(&a, &a), 1.0);
    }

    #[test]
    fn term_extraction_caps_at_twenty(text in ".{0,2000}") {
        prop_assert!(extract_key_terms(&text).len() <= 20);
    }

    #[test]
    fn compression_lengths_follow_ratios(text in ".{0,500}") {
        let total = text.chars().count();
        for level in [CompressionLevel::Light, CompressionLevel::Aggressive, CompressionLevel::Semantic] {
            let compressed = compress(&text, level);
            let expected = (total as f64 * level.ratio()).floor() as usize;
            prop_assert_eq!(compressed.chars().count(), expected);
        }
        prop_assert_eq!(compress(&text, CompressionLevel::None), text.clone());
    }

    #[test]
    fn cache_keys_are_16_hex_chars(tool in "[a-z_]{1,30}", n in 0u64..1_000_000) {
        let key = cache_key(&tool, &serde_json::json!({ "n": n }));
        prop_assert_eq!(key.len(), 16);
        prop_assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn cache_keys_differ_by_tool(n in 0u64..1_000_000) {
        let args = serde_json::json!({ "n": n });
        prop_assert_ne!(cache_key("tool_a", &args), cache_key("tool_b", &args));
    }
}
