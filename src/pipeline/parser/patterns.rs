//! Line patterns of the catalog grammar.
//!
//! Module codes look like `SYS.3.2.2`: a short uppercase family followed by
//! dot-separated numeric segments. Requirement codes are module-scoped
//! (`A1`, `A.1`, `A 2`) or fully qualified (`SYS.3.2.2.A1`). Classification
//! tags are `(B)`, `(S)` or `(H)`.

use std::sync::LazyLock;

use regex::Regex;

/// Module boundary: code + mandatory title on one line.
///
/// A qualified requirement line (`SYS.3.2.2.A1 ...`) can never match: every
/// split of its code is followed by `.` or a digit, not whitespace.
pub static MODULE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z]{2,4}(?:\.\d+)+)\s+(\S.*)$").unwrap());

/// Requirement boundary: optional qualifying module code, `A` (case tolerant,
/// optional dot or space), number, separator, then the start of the header.
pub static REQUIREMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:([A-Z]{2,4}(?:\.\d+)+)\.)?[Aa]\s*\.?\s*(\d+)[\s.:\-]*(.*)$").unwrap()
});

/// First classification tag in a header: `(B)`, `(S)` or `(H)`.
pub static CLASS_TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(([BSH])\)").unwrap());

/// Letter family of a module code (`SYS.3.2.2` → `SYS`).
pub fn code_family(code: &str) -> &str {
    code.split('.').next().unwrap_or(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_line_matches() {
        let caps = MODULE_RE.captures("SYS.3.2.2 Mobile Datenträger").unwrap();
        assert_eq!(&caps[1], "SYS.3.2.2");
        assert_eq!(&caps[2], "Mobile Datenträger");
    }

    #[test]
    fn single_segment_module_matches() {
        let caps = MODULE_RE.captures("OPS.1 Betrieb").unwrap();
        assert_eq!(&caps[1], "OPS.1");
    }

    #[test]
    fn qualified_requirement_is_not_a_module() {
        assert!(MODULE_RE.captures("SYS.3.2.2.A1 Patchmanagement (B)").is_none());
    }

    #[test]
    fn module_without_title_is_not_a_boundary() {
        assert!(MODULE_RE.captures("SYS.3.2.2").is_none());
        assert!(MODULE_RE.captures("SYS.3.2.2   ").is_none());
    }

    #[test]
    fn requirement_variants_match() {
        for line in ["A1 Titel", "A.1 Titel", "A 1 Titel", "a1 Titel"] {
            let caps = REQUIREMENT_RE.captures(line).unwrap();
            assert_eq!(&caps[2], "1", "for {line}");
            assert_eq!(&caps[3], "Titel", "for {line}");
            assert!(caps.get(1).is_none());
        }
    }

    #[test]
    fn qualified_requirement_captures_module_code() {
        let caps = REQUIREMENT_RE
            .captures("SYS.3.2.2.A1 Patchmanagement (B) Text")
            .unwrap();
        assert_eq!(caps.get(1).unwrap().as_str(), "SYS.3.2.2");
        assert_eq!(&caps[2], "1");
        assert_eq!(&caps[3], "Patchmanagement (B) Text");
    }

    #[test]
    fn prose_starting_with_a_does_not_match() {
        assert!(REQUIREMENT_RE.captures("Absatz drei gilt nicht").is_none());
        assert!(REQUIREMENT_RE.captures("Auch dieser Satz nicht").is_none());
    }

    #[test]
    fn classification_tag_found() {
        let caps = CLASS_TAG_RE.captures("Patchmanagement (B) Text").unwrap();
        assert_eq!(&caps[1], "B");
        assert!(CLASS_TAG_RE.captures("Titel ohne Tag (X)").is_none());
    }

    #[test]
    fn family_extraction() {
        assert_eq!(code_family("SYS.3.2.2"), "SYS");
        assert_eq!(code_family("ORP.4"), "ORP");
    }
}
