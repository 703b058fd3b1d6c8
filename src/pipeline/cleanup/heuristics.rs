//! Deterministic repairs for PDF extraction damage.
//!
//! Every repair is a pure `fn(&str) -> String`, registered by name in
//! [`REPAIR_PIPELINE`] and composed by a fixed-order reducer — no hidden
//! ordering dependencies between regex passes. The composition is
//! idempotent: running the pipeline twice yields the same text as once.
//!
//! The repairs fix formatting only. Normative content — codes, defined
//! terms, keywords like MUSS/SOLLTE — passes through verbatim.

use std::sync::LazyLock;

use regex::Regex;

/// A named text repair step.
pub type Transform = fn(&str) -> String;

/// Ordered repair pipeline. Line-structure repairs run first (they need the
/// original line breaks for context), token-level repairs after, and the
/// conservative keyword splitter last.
pub const REPAIR_PIPELINE: &[(&str, Transform)] = &[
    ("normalize_line_endings", normalize_line_endings),
    ("strip_soft_hyphens", strip_soft_hyphens),
    ("strip_page_markers", strip_page_markers),
    ("rejoin_hyphen_wraps", rejoin_hyphen_wraps),
    ("fix_single_letter_splits", fix_single_letter_splits),
    ("apply_token_corrections", apply_token_corrections),
    ("split_glued_keywords", split_glued_keywords),
];

/// Known run-together tokens and their corrections. Extend as new extraction
/// artifacts are observed in real catalogs. Longest variants first — entries
/// are applied in order with plain substring replacement.
const TOKEN_CORRECTIONS: &[(&str, &str)] = &[
    ("ITSystemen", "IT-Systemen"),
    ("ITSysteme", "IT-Systeme"),
    ("ITSystems", "IT-Systems"),
    ("ITSystem", "IT-System"),
    ("ITGrundschutz", "IT-Grundschutz"),
    ("EMails", "E-Mails"),
    ("EMail", "E-Mail"),
];

/// Coordination conjunctions that legitimately follow a hanging hyphen in
/// German compounds ("Patch- und Änderungsmanagement"). A hyphen before one
/// of these is real orthography, not a wrap artifact.
pub(crate) const COMPOUND_CONJUNCTIONS: &[&str] =
    &["und", "oder", "sowie", "bzw", "beziehungsweise"];

/// Normative keywords of the catalog language, longest first so the regex
/// alternation never matches a prefix of a longer keyword.
const NORM_KEYWORDS: &str = "MÜSSEN|MUSS|SOLLTEN|SOLLTE|SOLLEN|SOLL|DÜRFEN|DARF|KÖNNEN|KANN";

pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

pub fn strip_soft_hyphens(text: &str) -> String {
    text.replace('\u{00AD}', "")
}

static PAGE_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bSeite\s+\d+\s+von\s+\d+\b").unwrap());

pub fn strip_page_markers(text: &str) -> String {
    PAGE_MARKER_RE.replace_all(text, "").into_owned()
}

// Wrap across a line break: "Änderungsma-\nnagement" → "Änderungsmanagement".
static WRAP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-zäöüß])-[ \t]*\n[ \t]*([a-zäöüß])").unwrap());

// In-line split: "Sicher- heit" → "Sicherheit". The second word is checked
// against COMPOUND_CONJUNCTIONS so "Patch- und" keeps its hyphen.
static INLINE_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-zäöüß])-[ \t]+([a-zäöüß]+)").unwrap());

/// Rejoin hyphenated wrap splits. Fires only between lowercase letters —
/// the one context where a hyphen plus whitespace is almost certainly a
/// line-wrap artifact rather than orthography.
pub fn rejoin_hyphen_wraps(text: &str) -> String {
    let joined = WRAP_RE.replace_all(text, "$1$2");
    INLINE_SPLIT_RE
        .replace_all(&joined, |caps: &regex::Captures<'_>| {
            let word = &caps[2];
            if COMPOUND_CONJUNCTIONS.contains(&word) {
                caps[0].to_string()
            } else {
                format!("{}{}", &caps[1], word)
            }
        })
        .into_owned()
}

// "m indestens" / "E influss" → "mindestens" / "Einfluss". The stranded
// character must be a single letter and the remainder at least four
// lowercase letters, otherwise legitimate short words would be glued.
static SINGLE_LETTER_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Za-zÄÖÜäöüß])\s+([a-zäöüß]{4,})\b").unwrap());

pub fn fix_single_letter_splits(text: &str) -> String {
    SINGLE_LETTER_SPLIT_RE.replace_all(text, "$1$2").into_owned()
}

pub fn apply_token_corrections(text: &str) -> String {
    let mut out = text.to_string();
    for (broken, fixed) in TOKEN_CORRECTIONS {
        if out.contains(broken) {
            out = out.replace(broken, fixed);
        }
    }
    out
}

// "InstitutMUSS" → "Institut MUSS". No boundary required after the keyword:
// the following text may itself be glued ("InstitutMUSSdie").
static GLUED_BEFORE_KEYWORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"([a-zäöüß])({NORM_KEYWORDS})")).unwrap());

// "MUSSdie" → "MUSS die"
static GLUED_AFTER_KEYWORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"\b({NORM_KEYWORDS})([a-zäöüß]{{2,}})")).unwrap());

/// Insert the space lost between a normative keyword and an adjacent word.
/// The case boundary (lowercase↔ALL-CAPS) is the only signal conservative
/// enough to never fire inside a regular word, so only keyword gluings are
/// repaired here; other observed splits belong in [`TOKEN_CORRECTIONS`].
pub fn split_glued_keywords(text: &str) -> String {
    let out = GLUED_BEFORE_KEYWORD_RE.replace_all(text, "$1 $2");
    GLUED_AFTER_KEYWORD_RE.replace_all(&out, "$1 $2").into_owned()
}

/// Run the full repair pipeline in its fixed order.
pub fn repair_text(text: &str) -> String {
    REPAIR_PIPELINE
        .iter()
        .fold(text.to_string(), |acc, (_, transform)| transform(&acc))
}

static BULLET_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]*\n?[ \t]*•[ \t]*").unwrap());
static MULTI_SPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]{2,}").unwrap());
static SPACE_BEFORE_NEWLINE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+\n").unwrap());
static SPACE_AFTER_NEWLINE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n[ \t]+").unwrap());

fn collapse_whitespace(text: &str) -> String {
    let out = MULTI_SPACE_RE.replace_all(text, " ");
    let out = SPACE_BEFORE_NEWLINE_RE.replace_all(&out, "\n");
    let out = SPACE_AFTER_NEWLINE_RE.replace_all(&out, "\n");
    out.trim().to_string()
}

/// Clean a title: run the repair pipeline, then flatten to a single line.
/// Titles carry no bullets and no line structure.
pub fn clean_title(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let repaired = repair_text(text);
    let flat = repaired.replace('•', " ").replace('\n', " ");
    collapse_whitespace(&flat)
}

/// Clean a description: run the repair pipeline, put every bullet on its own
/// line, and collapse the remaining line breaks of the paragraph flow into
/// single spaces.
pub fn clean_description(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let repaired = repair_text(text);

    // Bullet markers onto their own lines, even when glued into flow text
    let bulleted = BULLET_RE.replace_all(&repaired, "\n• ");

    // Preserve bullet line breaks, fold all others into spaces
    let protected = bulleted.replace("\n• ", "\u{1}");
    let flowed = protected.replace('\n', " ");
    let restored = flowed.replace('\u{1}', "\n• ");

    collapse_whitespace(&restored)
}
