//! Detection of residual PDF extraction damage.
//!
//! The predicate never alters text — it only reports whether a string still
//! shows damage signatures. The normalization engine runs it before and
//! after repair to compute the `artifact_before`/`artifact_after` flags.

use std::sync::LazyLock;

use regex::Regex;

use super::heuristics::COMPOUND_CONJUNCTIONS;

static PAGE_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bSeite\s+\d+\s+von\s+\d+\b").unwrap());

// Hyphen plus whitespace between letters. Wider than the repair rule: the
// repairer only rejoins lowercase-lowercase splits, but an uppercase-adjacent
// split ("USB- Stick") is still damage — it just cannot be repaired safely
// and stays flagged for the LLM pass. The conjunction exemption mirrors the
// repair rule so "Patch- und" never counts as damage.
static HYPHEN_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-zÄÖÜäöüß]-\s+([A-Za-zÄÖÜäöüß]+)").unwrap());

static SINGLE_LETTER_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Za-zÄÖÜäöüß]\s+[a-zäöüß]{4,}\b").unwrap());

static DOUBLE_SPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]{2,}").unwrap());

/// True when the text still exhibits signs of extraction damage.
pub fn contains_artifacts(text: &str) -> bool {
    if text.is_empty() {
        return false;
    }

    if text.contains('\u{00AD}') {
        return true;
    }
    if PAGE_MARKER_RE.is_match(text) {
        return true;
    }
    if HYPHEN_SPLIT_RE
        .captures_iter(text)
        .any(|caps| !COMPOUND_CONJUNCTIONS.contains(&&caps[1]))
    {
        return true;
    }
    if SINGLE_LETTER_SPLIT_RE.is_match(text) {
        return true;
    }
    if DOUBLE_SPACE_RE.is_match(text) {
        return true;
    }

    // Line breaks inside flow text; pure bullet lists are fine.
    if text.contains('\n') {
        let non_bullet = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('•'))
            .count();
        if non_bullet >= 2 {
            return true;
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::cleanup::heuristics::{clean_description, clean_title};

    #[test]
    fn clean_text_has_no_artifacts() {
        assert!(!contains_artifacts(
            "Das Institut MUSS Patches zeitnah einspielen."
        ));
        assert!(!contains_artifacts(""));
    }

    #[test]
    fn soft_hyphen_flags() {
        assert!(contains_artifacts("Daten\u{00AD}träger"));
    }

    #[test]
    fn page_marker_flags() {
        assert!(contains_artifacts("Text Seite 3 von 17 Text"));
    }

    #[test]
    fn hyphen_split_flags() {
        assert!(contains_artifacts("Sicher- heit"));
        assert!(contains_artifacts("Änderungsma-\nnagement"));
    }

    #[test]
    fn uppercase_adjacent_split_flags_but_survives_repair() {
        // Detectable damage the repairer must not touch: joining could mean
        // "USB-Stick" or "USBStick", so the flag stays for the LLM pass.
        assert!(contains_artifacts("USB- Stick"));
        let cleaned = clean_description("Die USB- Sticks MÜSSEN geprüft werden.");
        assert!(cleaned.contains("USB- Sticks"));
        assert!(contains_artifacts(&cleaned));
    }

    #[test]
    fn compound_conjunction_hyphen_is_not_damage() {
        assert!(!contains_artifacts("Patch- und Änderungsmanagement"));
        assert!(!contains_artifacts("Hard- oder Software"));
    }

    #[test]
    fn single_letter_split_flags() {
        assert!(contains_artifacts("m indestens einmal"));
    }

    #[test]
    fn double_space_flags() {
        assert!(contains_artifacts("zu  viel Abstand"));
    }

    #[test]
    fn flow_newlines_flag_but_bullets_do_not() {
        assert!(contains_artifacts("Erster Satz\nZweiter Satz"));
        assert!(!contains_artifacts("Einleitung:\n• Erstens\n• Zweitens"));
    }

    #[test]
    fn repaired_text_passes_the_detector() {
        let damaged =
            "Das InstitutMUSS die Sicher- heit\nm indestens  einmal prüfen. Seite 3 von 17";
        assert!(contains_artifacts(damaged));
        assert!(!contains_artifacts(&clean_description(damaged)));
        assert!(!contains_artifacts(&clean_title(damaged)));
    }
}
