//! Sequence number extraction
//!
//! Filenames embed an ordinal in several competing shapes (explicit
//! photo/step prefixes, digits glued to a stage keyword, bare digit runs).
//! Patterns are tried in a fixed priority order and the first match wins;
//! conflicting matches from lower-priority patterns are never merged in.

use once_cell::sync::Lazy;
use regex::Regex;

/// Ordered pattern table, highest priority first
static SEQUENCE_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    vec![
        // Explicit capture prefixes: step_04, photo-12, img9001, dsc0042
        (
            "prefixed",
            Regex::new(r"(?:^|[^a-z0-9])(?:step|photo|img|image|pic|dsc)[\s_\-]*([0-9]+)")
                .expect("prefixed sequence pattern"),
        ),
        // Digits adjacent to a stage keyword: rough03, final_2
        (
            "stage-adjacent",
            Regex::new(
                r"(?:^|[^a-z0-9])(?:raw|blank|rough|roughout|detail|process|wip|sanded|paint|finish|final|complete|done)[\s_\-]*([0-9]+)",
            )
            .expect("stage-adjacent sequence pattern"),
        ),
        // Bare 3-4 digit run
        (
            "bare-3-4",
            Regex::new(r"(?:^|[^0-9])([0-9]{3,4})(?:[^0-9]|$)").expect("3-4 digit pattern"),
        ),
        // Bare 2-3 digit run (last resort)
        (
            "bare-2-3",
            Regex::new(r"(?:^|[^0-9])([0-9]{2,3})(?:[^0-9]|$)").expect("2-3 digit pattern"),
        ),
    ]
});

/// Extract a sequence number from a lowercased filename stem
///
/// Returns the capture of the first pattern that matches. Leading zeros are
/// accepted ("012" parses to 12); a digit run too large for u32 yields no
/// sequence number rather than falling through to a lower-priority pattern.
pub fn parse_sequence(stem: &str) -> Option<u32> {
    for (name, pattern) in SEQUENCE_PATTERNS.iter() {
        if let Some(captures) = pattern.captures(stem) {
            let digits = &captures[1];
            let parsed = digits.parse::<u32>().ok();
            tracing::trace!(pattern = name, digits, ?parsed, "Sequence pattern matched");
            return parsed;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixed_patterns() {
        assert_eq!(parse_sequence("img_9001"), Some(9001));
        assert_eq!(parse_sequence("photo-12"), Some(12));
        assert_eq!(parse_sequence("step04"), Some(4));
        assert_eq!(parse_sequence("dsc 0042"), Some(42));
    }

    #[test]
    fn test_stage_adjacent_pattern() {
        assert_eq!(parse_sequence("bass_rough03"), Some(3));
        assert_eq!(parse_sequence("owl_final_2"), Some(2));
    }

    #[test]
    fn test_bare_digit_runs() {
        // "photo" prefix is not adjacent to the digits, so the bare 3-digit
        // run is the first pattern that matches
        assert_eq!(parse_sequence("photo_butterfly_012"), Some(12));
        assert_eq!(parse_sequence("eagle_0423"), Some(423));
        assert_eq!(parse_sequence("bear_07"), Some(7));
    }

    #[test]
    fn test_pattern_priority_no_merging() {
        // Both the img prefix (9001) and a bare run (123) are present;
        // only the highest-priority pattern contributes
        assert_eq!(parse_sequence("img_9001_take_123"), Some(9001));
        // Stage-adjacent beats the bare run later in the name
        assert_eq!(parse_sequence("rough2_v100"), Some(2));
    }

    #[test]
    fn test_no_sequence() {
        assert_eq!(parse_sequence("bass_showcase"), None);
        // A 5+ digit bare run matches neither bare pattern
        assert_eq!(parse_sequence("carving_123456"), None);
        // Single digit is below the bare-run minimum
        assert_eq!(parse_sequence("owl_5"), None);
    }

    #[test]
    fn test_oversized_prefixed_run_yields_none() {
        // Matches the prefixed pattern but overflows u32; no fallback merge
        assert_eq!(parse_sequence("img_99999999999999999999"), None);
    }
}
