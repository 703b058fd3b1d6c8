//! Single-pass structural scan: normalized catalog text in, modules and
//! requirements out.
//!
//! The scan is line-oriented and never fails on malformed input — lines that
//! resolve to nothing are dropped, and the result only carries hints that let
//! the caller downgrade the catalog status. Prefix scoping pins the parse to
//! the letter family of the first module code, so citations of foreign
//! modules (`ORP.4` inside a `SYS` document) never open a module.

use std::collections::HashMap;
use std::str::FromStr;

use crate::models::Classification;
use crate::pipeline::cleanup::heuristics::{normalize_line_endings, rejoin_hyphen_wraps};

use super::patterns::{code_family, CLASS_TAG_RE, MODULE_RE, REQUIREMENT_RE};

/// Marker in a requirement title meaning the requirement was superseded.
const OBSOLETE_MARKER: &str = "ENTFALLEN";

#[derive(Debug, Clone)]
pub struct ParsedRequirement {
    /// Module-scoped identifier, e.g. `A1`.
    pub req_id: String,
    /// Composite key: module code + number + title + classification tag.
    pub code: String,
    pub title: String,
    pub classification: Option<Classification>,
    pub is_obsolete: bool,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct ParsedModule {
    pub code: String,
    pub title: String,
    pub requirements: Vec<ParsedRequirement>,
}

#[derive(Debug, Default)]
pub struct ParsedCatalog {
    /// Modules in order of first occurrence; duplicate codes are merged.
    pub modules: Vec<ParsedModule>,
    /// Letter family accepted for module boundaries (from the first module).
    pub family: Option<String>,
    /// Requirement-code lines seen before any module boundary. Non-zero
    /// means the parse was degraded and the catalog should be `partial`.
    pub orphan_lines: usize,
}

impl ParsedCatalog {
    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    pub fn requirement_count(&self) -> usize {
        self.modules.iter().map(|m| m.requirements.len()).sum()
    }

    pub fn is_degraded(&self) -> bool {
        self.orphan_lines > 0
    }
}

/// Header accumulation state of the requirement currently being built.
///
/// `Hunting`: the classification tag has not been seen yet; lines are
/// buffered because the header may wrap. `Body`: header settled, every
/// further line belongs to the description.
enum HeaderState {
    Hunting { head: String, extra: Vec<String> },
    Body,
}

struct ReqBuilder {
    module_idx: usize,
    num: String,
    state: HeaderState,
    title: String,
    classification: Option<Classification>,
    description: Vec<String>,
}

/// Parse normalized catalog text into modules and requirements.
pub fn parse_catalog(text: &str) -> ParsedCatalog {
    // Wrap repair first so headers broken across lines scan whole.
    let text = rejoin_hyphen_wraps(&normalize_line_endings(text));

    let mut result = ParsedCatalog::default();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut current_module: Option<usize> = None;
    let mut pending: Option<ReqBuilder> = None;

    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        // Module boundary — only for the accepted letter family.
        if let Some(caps) = MODULE_RE.captures(line) {
            let code = caps[1].to_string();
            let family = code_family(&code);
            let family_ok = result.family.as_deref().map_or(true, |f| f == family);
            if family_ok {
                if result.family.is_none() {
                    result.family = Some(family.to_string());
                    tracing::debug!(family, "Accepted module family");
                }
                if let Some(builder) = pending.take() {
                    finalize_requirement(builder, &mut result.modules);
                }
                let title = caps[2].trim().to_string();
                let idx = match index.get(&code) {
                    Some(&existing) => {
                        // Repeated module heading: merge into the first one.
                        if result.modules[existing].title.is_empty() && !title.is_empty() {
                            result.modules[existing].title = title;
                        }
                        existing
                    }
                    None => {
                        result.modules.push(ParsedModule {
                            code: code.clone(),
                            title,
                            requirements: Vec::new(),
                        });
                        index.insert(code, result.modules.len() - 1);
                        result.modules.len() - 1
                    }
                };
                current_module = Some(idx);
                continue;
            }
            // Foreign family: a reference, not a boundary. Falls through as
            // plain text.
        }

        // Requirement boundary.
        if let Some(caps) = REQUIREMENT_RE.captures(line) {
            let qualified = caps.get(1).map(|m| m.as_str());
            match current_module {
                Some(idx) => {
                    // A qualified code citing a different module is not a
                    // boundary — it stays continuation text.
                    let accepted =
                        qualified.map_or(true, |q| q == result.modules[idx].code);
                    if accepted {
                        if let Some(builder) = pending.take() {
                            finalize_requirement(builder, &mut result.modules);
                        }
                        pending = Some(start_requirement(
                            idx,
                            caps[2].to_string(),
                            caps[3].trim(),
                        ));
                        continue;
                    }
                }
                None => {
                    // No active module: discard and remember the shortfall.
                    result.orphan_lines += 1;
                    continue;
                }
            }
        }

        // Continuation of the current requirement; anything else (module
        // preamble, stray fragments) is dropped.
        if let Some(builder) = pending.as_mut() {
            advance_requirement(builder, line);
        }
    }

    if let Some(builder) = pending.take() {
        finalize_requirement(builder, &mut result.modules);
    }

    result
}

fn start_requirement(module_idx: usize, num: String, remainder: &str) -> ReqBuilder {
    match CLASS_TAG_RE.captures(remainder) {
        Some(caps) => {
            let tag = caps.get(0).expect("tag match");
            let title = collapse_spaces(&remainder[..tag.start()]);
            let classification = Classification::from_str(&caps[1]).ok();
            let mut description = Vec::new();
            let rest = remainder[tag.end()..].trim();
            if !rest.is_empty() {
                description.push(rest.to_string());
            }
            ReqBuilder {
                module_idx,
                num,
                state: HeaderState::Body,
                title,
                classification,
                description,
            }
        }
        None => ReqBuilder {
            module_idx,
            num,
            state: HeaderState::Hunting {
                head: remainder.to_string(),
                extra: Vec::new(),
            },
            title: String::new(),
            classification: None,
            description: Vec::new(),
        },
    }
}

fn advance_requirement(builder: &mut ReqBuilder, line: &str) {
    match &mut builder.state {
        HeaderState::Hunting { head, extra } => {
            if line.starts_with('•') {
                // A bullet before any tag ends the header hunt: the header
                // line alone is the title, the buffered lines open the
                // description.
                builder.title = collapse_spaces(head);
                let mut description = std::mem::take(extra);
                description.push(line.to_string());
                builder.description = description;
                builder.state = HeaderState::Body;
                return;
            }
            match CLASS_TAG_RE.captures(line) {
                Some(caps) => {
                    let tag = caps.get(0).expect("tag match");
                    let mut pieces = vec![head.clone()];
                    pieces.append(extra);
                    pieces.push(line[..tag.start()].to_string());
                    builder.title = collapse_spaces(&pieces.join(" "));
                    builder.classification = Classification::from_str(&caps[1]).ok();
                    let rest = line[tag.end()..].trim();
                    if !rest.is_empty() {
                        builder.description.push(rest.to_string());
                    }
                    builder.state = HeaderState::Body;
                }
                None => extra.push(line.to_string()),
            }
        }
        HeaderState::Body => builder.description.push(line.to_string()),
    }
}

fn finalize_requirement(mut builder: ReqBuilder, modules: &mut [ParsedModule]) {
    // A requirement whose tag never showed up keeps its whole header line as
    // title and everything after as description.
    if let HeaderState::Hunting { head, extra } = &mut builder.state {
        builder.title = collapse_spaces(head);
        builder.description = std::mem::take(extra);
    }

    let module = &mut modules[builder.module_idx];
    let req_id = format!("A{}", builder.num);
    let full_code = match (builder.classification, builder.title.is_empty()) {
        (Some(cls), _) => format!(
            "{}.{} {} ({})",
            module.code,
            req_id,
            builder.title,
            cls.as_str()
        ),
        (None, false) => format!("{}.{} {}", module.code, req_id, builder.title),
        (None, true) => format!("{}.{}", module.code, req_id),
    };
    let is_obsolete = builder
        .title
        .to_uppercase()
        .contains(OBSOLETE_MARKER);
    let description = builder.description.join(" ").trim().to_string();

    tracing::debug!(
        code = %full_code,
        classification = ?builder.classification,
        obsolete = is_obsolete,
        "Parsed requirement"
    );

    module.requirements.push(ParsedRequirement {
        req_id,
        code: full_code,
        title: builder.title,
        classification: builder.classification,
        is_obsolete,
        description,
    });
}

fn collapse_spaces(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
SYS.3.2.2 Mobile Datenträger
Dieser Baustein beschreibt mobile Datenträger.
SYS.3.2.2.A1 Patch- und Änderungsma-
nagement (B) Das Institut MUSS Patches zeitnah einspielen.
Weitere Hinweise gelten sinngemäß.
A2 Kryptographische Verfahren (ENTFALLEN)
A3 Regelungen zur Mitnahme (S)
Mitarbeitende DÜRFEN Datenträger nur verschlüsselt mitnehmen.
";

    #[test]
    fn parses_modules_and_requirements() {
        let parsed = parse_catalog(SAMPLE);
        assert_eq!(parsed.module_count(), 1);
        assert_eq!(parsed.family.as_deref(), Some("SYS"));

        let module = &parsed.modules[0];
        assert_eq!(module.code, "SYS.3.2.2");
        assert_eq!(module.title, "Mobile Datenträger");
        assert_eq!(module.requirements.len(), 3);
    }

    // Wrapped header with hyphen split repairs into a whole
    // title, classification and description intact.
    #[test]
    fn wrapped_header_parses_whole() {
        let parsed = parse_catalog(SAMPLE);
        let req = &parsed.modules[0].requirements[0];

        assert_eq!(req.req_id, "A1");
        assert_eq!(req.classification, Some(Classification::Basis));
        assert!(req.title.contains("Patch- und Änderungsmanagement"));
        assert!(req.description.starts_with("Das Institut MUSS"));
        assert!(req.description.contains("Weitere Hinweise"));
        assert!(!req.is_obsolete);
    }

    #[test]
    fn obsolete_marker_sets_flag_and_keeps_requirement() {
        let parsed = parse_catalog(SAMPLE);
        let req = &parsed.modules[0].requirements[1];
        assert_eq!(req.req_id, "A2");
        assert!(req.is_obsolete);
        assert!(req.classification.is_none());
        assert_eq!(req.title, "Kryptographische Verfahren (ENTFALLEN)");
    }

    #[test]
    fn classification_on_following_line() {
        let text = "\
SYS.1.1 Allgemeiner Server
A1 Geeignete Aufstellung
und Absicherung (B)
Server MÜSSEN geeignet aufgestellt werden.
";
        let parsed = parse_catalog(text);
        let req = &parsed.modules[0].requirements[0];
        assert_eq!(req.title, "Geeignete Aufstellung und Absicherung");
        assert_eq!(req.classification, Some(Classification::Basis));
        assert_eq!(req.description, "Server MÜSSEN geeignet aufgestellt werden.");
    }

    // No tag before the next boundary → the header line is
    // the whole title, description from subsequent lines only.
    #[test]
    fn missing_tag_degrades_to_untagged_title() {
        let text = "\
SYS.1.1 Allgemeiner Server
A1 Anforderung ohne Einstufung
Erster Beschreibungssatz.
Zweiter Beschreibungssatz.
A2 Nächste Anforderung (B)
";
        let parsed = parse_catalog(text);
        let reqs = &parsed.modules[0].requirements;
        assert_eq!(reqs.len(), 2);
        assert_eq!(reqs[0].title, "Anforderung ohne Einstufung");
        assert!(reqs[0].classification.is_none());
        assert_eq!(
            reqs[0].description,
            "Erster Beschreibungssatz. Zweiter Beschreibungssatz."
        );
    }

    #[test]
    fn duplicate_module_code_merges_requirements() {
        let text = "\
IND.2.3 Sensoren und Aktoren
A1 Erste Anforderung (B)
Text eins.
IND.2.3 Sensoren und Aktoren R2
A2 Zweite Anforderung (S)
Text zwei.
";
        let parsed = parse_catalog(text);
        assert_eq!(parsed.module_count(), 1);
        let module = &parsed.modules[0];
        assert_eq!(module.requirements.len(), 2);
        assert_eq!(module.requirements[0].req_id, "A1");
        assert_eq!(module.requirements[1].req_id, "A2");
    }

    // Foreign-family codes never create modules.
    #[test]
    fn foreign_family_reference_creates_no_module() {
        let text = "\
SYS.3.2.2 Mobile Datenträger
A1 Regelung (B)
Siehe auch den Baustein
ORP.4 Identitäts- und Berechtigungsmanagement
für weitere Hinweise.
";
        let parsed = parse_catalog(text);
        assert_eq!(parsed.module_count(), 1);
        assert_eq!(parsed.modules[0].code, "SYS.3.2.2");
        // The reference line stays part of the description text.
        let req = &parsed.modules[0].requirements[0];
        assert!(req.description.contains("ORP.4"));
    }

    #[test]
    fn qualified_code_of_other_module_is_not_a_boundary() {
        let text = "\
SYS.3.2.2 Mobile Datenträger
A1 Regelung (B)
Die Vorgaben aus SYS.3.2.1.A5 Verschlüsselung gelten weiter.
";
        let parsed = parse_catalog(text);
        let module = &parsed.modules[0];
        assert_eq!(module.requirements.len(), 1);
        assert!(module.requirements[0]
            .description
            .contains("SYS.3.2.1.A5"));
    }

    #[test]
    fn qualified_code_of_current_module_is_a_boundary() {
        let text = "\
SYS.3.2.2 Mobile Datenträger
SYS.3.2.2.A1 Patchmanagement (B) Text eins.
SYS.3.2.2.A2 Schutz vor Schadsoftware (S) Text zwei.
";
        let parsed = parse_catalog(text);
        let module = &parsed.modules[0];
        assert_eq!(module.requirements.len(), 2);
        assert_eq!(module.requirements[0].code, "SYS.3.2.2.A1 Patchmanagement (B)");
        assert_eq!(module.requirements[1].req_id, "A2");
    }

    #[test]
    fn requirement_before_any_module_is_discarded() {
        let text = "\
A1 Verlorene Anforderung (B)
Text ohne Baustein.
SYS.1.1 Allgemeiner Server
A2 Echte Anforderung (B)
";
        let parsed = parse_catalog(text);
        assert!(parsed.is_degraded());
        assert_eq!(parsed.orphan_lines, 1);
        assert_eq!(parsed.module_count(), 1);
        assert_eq!(parsed.modules[0].requirements.len(), 1);
        assert_eq!(parsed.modules[0].requirements[0].req_id, "A2");
    }

    #[test]
    fn empty_text_yields_empty_catalog() {
        let parsed = parse_catalog("");
        assert_eq!(parsed.module_count(), 0);
        assert_eq!(parsed.requirement_count(), 0);
        assert!(!parsed.is_degraded());
        assert!(parsed.family.is_none());
    }

    #[test]
    fn prose_only_text_yields_no_modules() {
        let parsed = parse_catalog("Nur Fließtext ohne jede Struktur.\nNoch eine Zeile.");
        assert_eq!(parsed.module_count(), 0);
    }

    #[test]
    fn requirement_variants_all_bound() {
        let text = "\
SYS.1.1 Allgemeiner Server
A1 Erste (B)
A.2 Zweite (S)
A 3 Dritte (H)
";
        let parsed = parse_catalog(text);
        let reqs = &parsed.modules[0].requirements;
        assert_eq!(reqs.len(), 3);
        assert_eq!(reqs[0].req_id, "A1");
        assert_eq!(reqs[1].req_id, "A2");
        assert_eq!(reqs[2].req_id, "A3");
        assert_eq!(reqs[2].classification, Some(Classification::High));
    }

    #[test]
    fn malformed_tag_degrades_gracefully() {
        let text = "\
SYS.1.1 Allgemeiner Server
A1 Titel mit kaputter Klammer (B
Beschreibung folgt.
A2 Nächste (S)
";
        let parsed = parse_catalog(text);
        let reqs = &parsed.modules[0].requirements;
        assert_eq!(reqs.len(), 2);
        assert!(reqs[0].classification.is_none());
        assert!(reqs[0].title.contains("kaputter Klammer"));
    }

    #[test]
    fn bullet_ends_header_hunt() {
        let text = "\
SYS.1.1 Allgemeiner Server
A1 Anforderung ohne Tag
• Erste Vorgabe
• Zweite Vorgabe
";
        let parsed = parse_catalog(text);
        let req = &parsed.modules[0].requirements[0];
        assert_eq!(req.title, "Anforderung ohne Tag");
        assert!(req.classification.is_none());
        assert!(req.description.contains("• Erste Vorgabe"));
        assert!(req.description.contains("• Zweite Vorgabe"));
    }
}
