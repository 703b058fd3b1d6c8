//! Strict validation of LLM normalization answers.
//!
//! The corrector prompt forbids any content change, but a local model will
//! still occasionally invent examples, drop normative keywords or answer
//! with meta prose. Any answer that fails one of these checks is discarded —
//! the caller falls back to the raw text (dev) or fails the job (prod).

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

/// Markers that betray invented content (German/English mix, lowercase).
/// Extend when new hallucination shapes show up in rejected answers.
const BAD_MARKERS: &[&str] = &[
    "here is",
    "hier ist",
    "please note",
    "in this example",
    "zum beispiel",
    "beispielsweise",
    "airwatch",
    "app annie",
    "similarweb",
    "microsoft intune",
    "android 4.3",
    "ios 8",
];

/// Normative keywords whose counts must survive normalization unchanged.
const NORM_KEYWORDS: &[&str] = &["MUSS", "SOLLTE", "SOLL", "DARF", "DÜRFEN", "MÜSSEN", "SOLLEN"];

/// Meta prefixes that mean the model answered *about* the text instead of
/// returning it.
const META_PREFIXES: &[&str] = &["here", "hier", "note:", "korrekturen"];

/// Description length from which the new-word ratio check applies; shorter
/// texts produce too noisy a ratio.
const NEW_WORD_MIN_LEN: usize = 120;

/// Maximum tolerated share of words absent from the raw text.
const NEW_WORD_MAX_RATIO: f32 = 0.25;

static TAGGED_ANSWER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<TITLE>\s*(.*?)\s*</TITLE>\s*<DESCRIPTION>\s*(.*?)\s*</DESCRIPTION>\s*$")
        .unwrap()
});

static WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-zÄÖÜäöüß]{4,}").unwrap());

/// A parsed `<TITLE>…</TITLE><DESCRIPTION>…</DESCRIPTION>` answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedAnswer {
    pub title: String,
    pub description: String,
}

/// Parse the mandated answer format. `None` means the format was violated.
pub fn parse_tagged_answer(out: &str) -> Option<TaggedAnswer> {
    let caps = TAGGED_ANSWER_RE.captures(out)?;
    Some(TaggedAnswer {
        title: caps[1].trim().to_string(),
        description: caps[2].trim().to_string(),
    })
}

/// Substring counts of the normative keywords, case-normalized.
pub fn count_norm_keywords(text: &str) -> HashMap<&'static str, usize> {
    let upper = text.to_uppercase();
    NORM_KEYWORDS
        .iter()
        .map(|&k| (k, upper.matches(k).count()))
        .collect()
}

/// Share of alphabetic words (≥ 4 chars) in `out` that do not occur in
/// `raw`. A coarse invention detector.
pub fn new_word_ratio(raw: &str, out: &str) -> f32 {
    let raw_lower = raw.to_lowercase();
    let out_lower = out.to_lowercase();
    let raw_words: std::collections::HashSet<&str> =
        WORD_RE.find_iter(&raw_lower).map(|m| m.as_str()).collect();
    let out_words: std::collections::HashSet<&str> =
        WORD_RE.find_iter(&out_lower).map(|m| m.as_str()).collect();
    if out_words.is_empty() {
        return 0.0;
    }
    let new_words = out_words.difference(&raw_words).count();
    new_words as f32 / out_words.len() as f32
}

/// Check a candidate answer against the raw text.
/// Returns a reject reason, or `None` when the answer is acceptable.
pub fn reject_reason(
    raw_title: &str,
    raw_description: &str,
    cand_title: &str,
    cand_description: &str,
) -> Option<String> {
    let combined = format!("{cand_title}\n{cand_description}").to_lowercase();

    for marker in BAD_MARKERS {
        if combined.contains(marker) {
            return Some(format!("bad_marker:{marker}"));
        }
    }

    // Invented bullet lists
    let raw_bullets = raw_title.matches('•').count() + raw_description.matches('•').count();
    let cand_bullets = cand_title.matches('•').count() + cand_description.matches('•').count();
    if cand_bullets > raw_bullets + 1 {
        return Some("bullets_increased".to_string());
    }

    // Normative keywords may neither vanish nor appear
    if count_norm_keywords(raw_description) != count_norm_keywords(cand_description) {
        return Some("norm_keywords_changed".to_string());
    }

    // Too many unseen words — likely invention
    let ratio = new_word_ratio(raw_description, cand_description);
    if raw_description.len() >= NEW_WORD_MIN_LEN && ratio > NEW_WORD_MAX_RATIO {
        return Some(format!("too_many_new_words:{ratio:.2}"));
    }

    // Meta answers ("Hier ist der korrigierte Text: ...")
    let trimmed = combined.trim_start();
    if META_PREFIXES.iter().any(|p| trimmed.starts_with(p)) {
        return Some("meta_prefix".to_string());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_answer() {
        let out = "<TITLE>\nPatchmanagement\n</TITLE>\n<DESCRIPTION>\nDas Institut MUSS.\n</DESCRIPTION>";
        let answer = parse_tagged_answer(out).unwrap();
        assert_eq!(answer.title, "Patchmanagement");
        assert_eq!(answer.description, "Das Institut MUSS.");
    }

    #[test]
    fn rejects_untagged_answer() {
        assert!(parse_tagged_answer("Patchmanagement: Das Institut MUSS.").is_none());
        assert!(parse_tagged_answer("<TITLE>nur Titel</TITLE>").is_none());
    }

    #[test]
    fn answer_with_trailing_prose_is_rejected() {
        let out = "<TITLE>T</TITLE>\n<DESCRIPTION>D</DESCRIPTION>\nNoch ein Hinweis.";
        assert!(parse_tagged_answer(out).is_none());
    }

    #[test]
    fn keyword_counts_match_for_identical_text() {
        let text = "Das Institut MUSS prüfen. Es SOLLTE dokumentieren.";
        assert_eq!(count_norm_keywords(text), count_norm_keywords(text));
    }

    #[test]
    fn dropped_keyword_changes_counts() {
        let raw = "Das Institut MUSS prüfen.";
        let cand = "Das Institut kann prüfen.";
        assert_ne!(count_norm_keywords(raw), count_norm_keywords(cand));
    }

    #[test]
    fn new_word_ratio_zero_for_same_text() {
        let text = "Das Institut MUSS die Systeme regelmäßig prüfen.";
        assert_eq!(new_word_ratio(text, text), 0.0);
    }

    #[test]
    fn new_word_ratio_rises_with_inventions() {
        let raw = "Datenträger MÜSSEN verschlüsselt werden.";
        let out = "Datenträger MÜSSEN verschlüsselt werden. Empfohlen werden Produkte verschiedener Hersteller.";
        assert!(new_word_ratio(raw, out) > 0.3);
    }

    #[test]
    fn accepts_pure_formatting_fix() {
        let raw_desc = "Das Institut MUSS die Sicher- heit der Daten gewährleisten.";
        let cand_desc = "Das Institut MUSS die Sicherheit der Daten gewährleisten.";
        assert_eq!(reject_reason("Titel", raw_desc, "Titel", cand_desc), None);
    }

    #[test]
    fn rejects_bad_marker() {
        let reason = reject_reason("T", "Text.", "T", "Zum Beispiel Microsoft Intune nutzen.")
            .unwrap();
        assert!(reason.starts_with("bad_marker:"));
    }

    #[test]
    fn rejects_changed_keywords() {
        let reason =
            reject_reason("T", "Das Institut MUSS prüfen.", "T", "Das Institut SOLLTE prüfen.")
                .unwrap();
        assert_eq!(reason, "norm_keywords_changed");
    }

    #[test]
    fn rejects_invented_bullets() {
        let reason = reject_reason("T", "Fließtext ohne Listen.", "T", "• eins\n• zwei\n• drei")
            .unwrap();
        assert_eq!(reason, "bullets_increased");
    }

    #[test]
    fn rejects_meta_prefix() {
        let reason = reject_reason("T", "Text.", "T", "Hier ist der korrigierte Text.").unwrap();
        // "hier ist" is already a bad marker; both paths reject
        assert!(reason.starts_with("bad_marker:") || reason == "meta_prefix");
    }

    #[test]
    fn rejects_heavy_invention_on_long_text() {
        let raw = "Das Institut MUSS alle mobilen Datenträger vor der Verwendung auf Schadsoftware prüfen und die Ergebnisse der Prüfung nachvollziehbar dokumentieren.";
        assert!(raw.len() >= 120);
        let cand = "Das Institut MUSS alle mobilen Datenträger vor der Verwendung auf Schadsoftware prüfen. Geeignete Werkzeuge bieten moderne Antivirenlösungen, Quarantäneverfahren, Sandboxen, Signaturdatenbanken sowie heuristische Analysen unterschiedlicher Anbieter.";
        let reason = reject_reason("T", raw, "T", cand).unwrap();
        assert!(reason.starts_with("too_many_new_words:"));
    }
}
