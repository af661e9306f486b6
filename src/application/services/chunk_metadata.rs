use regex::Regex;
use std::sync::OnceLock;

use crate::domain::entities::{ChunkFlags, SectionType};

fn table_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Pipe-delimited rows or multi-column runs of 3+ spaces.
    RE.get_or_init(|| Regex::new(r"(?m)^\s*\|.+\|\s*$|\S {3,}\S.* {3,}\S").unwrap())
}

fn list_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\s*(?:[-*•]|\d+[.)])\s+\S").unwrap())
}

fn code_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Part/error code patterns: E-42, F13, WP1234567, 4681EA2001T.
    RE.get_or_init(|| Regex::new(r"\b(?:[A-Z]{1,3}-?\d{1,7}|\d{3,}[A-Z]{1,3}\d*[A-Z]?)\b").unwrap())
}

/// Derive content flags from chunk text via pattern matching.
pub fn detect_flags(content: &str) -> ChunkFlags {
    ChunkFlags {
        has_tables: table_re().is_match(content),
        has_lists: list_re().is_match(content),
        has_code_numbers: code_number_re().is_match(content),
    }
}

/// Classify the section a chunk belongs to from its hierarchical menu path.
pub fn classify_section(menu_path: Option<&str>) -> SectionType {
    let Some(path) = menu_path else {
        return SectionType::General;
    };
    let path = path.to_lowercase();

    if path.contains("troubleshoot") || path.contains("diagnos") || path.contains("error") {
        SectionType::Troubleshooting
    } else if path.contains("maint") || path.contains("clean") || path.contains("service") {
        SectionType::Maintenance
    } else if path.contains("install") || path.contains("setup") || path.contains("mounting") {
        SectionType::Installation
    } else if path.contains("part") || path.contains("component") || path.contains("assembly") {
        SectionType::Parts
    } else if path.contains("safety") || path.contains("warning") || path.contains("caution") {
        SectionType::Safety
    } else {
        SectionType::General
    }
}

/// Heuristic content quality in [0, 1]: full credit inside the healthy
/// length band, scaled down for stubs and walls of text.
pub fn score_chunk(content: &str) -> f32 {
    let len = content.chars().count();
    if len < 100 {
        len as f32 / 100.0 * 0.5
    } else if len <= 2000 {
        1.0
    } else {
        (2000.0 / len as f32).max(0.25)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_detection() {
        let piped = "| Code | Meaning |\n| E1 | Sensor open |";
        assert!(detect_flags(piped).has_tables);

        let columns = "Voltage    Current    Expected\n120V       2.1A       2.0A";
        assert!(detect_flags(columns).has_tables);

        assert!(!detect_flags("Plain sentence with no structure.").has_tables);
    }

    #[test]
    fn test_list_detection() {
        let bulleted = "Before servicing:\n- unplug the unit\n- discharge the capacitor";
        assert!(detect_flags(bulleted).has_lists);

        let numbered = "1. Remove the rear panel\n2. Locate the thermostat";
        assert!(detect_flags(numbered).has_lists);

        assert!(!detect_flags("No list here, just 2 sentences. Honest.").has_lists);
    }

    #[test]
    fn test_code_number_detection() {
        assert!(detect_flags("Error E-42 indicates a stuck damper.").has_code_numbers);
        assert!(detect_flags("Replace part WP1234567 if worn.").has_code_numbers);
        assert!(detect_flags("Order 4681EA2001T from the parts list.").has_code_numbers);
        assert!(!detect_flags("the quick brown fox").has_code_numbers);
    }

    #[test]
    fn test_section_classification() {
        assert_eq!(
            classify_section(Some("Chapter 4 > Troubleshooting > No Power")),
            SectionType::Troubleshooting
        );
        assert_eq!(
            classify_section(Some("Care and Maintenance > Cleaning")),
            SectionType::Maintenance
        );
        assert_eq!(
            classify_section(Some("Installation > Mounting the Bracket")),
            SectionType::Installation
        );
        assert_eq!(
            classify_section(Some("Appendix > Parts List")),
            SectionType::Parts
        );
        assert_eq!(
            classify_section(Some("Important Safety Instructions")),
            SectionType::Safety
        );
        assert_eq!(classify_section(Some("Introduction")), SectionType::General);
        assert_eq!(classify_section(None), SectionType::General);
    }

    #[test]
    fn test_chunk_score_bands() {
        assert!(score_chunk("tiny") < 0.1);
        assert_eq!(score_chunk(&"x".repeat(500)), 1.0);
        assert!(score_chunk(&"x".repeat(4000)) < 1.0);
        assert!(score_chunk(&"x".repeat(4000)) >= 0.25);
    }
}
