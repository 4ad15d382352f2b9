//! Corruption detection and replacement validation.
//!
//! `is_corrupt` scans whole-file text against a fixed catalogue of
//! malformed-text signatures left behind by earlier mechanical edits. One
//! match anywhere rejects the file for this run; no partial correction is
//! attempted. `validate_replacement` gates each individual substitution:
//! the catalogue, a strict re-parse, and a small set of redundant-annotation
//! checks that indicate the substitution collided with existing text.

use crate::models::RewriteSite;
use crate::parser::is_valid_syntax;
use regex::Regex;
use std::sync::OnceLock;

/// Catalogue of corruption signatures. Matching is deliberately blunt:
/// these shapes do not occur in well-formed sources.
fn corruption_catalogue() -> &'static [(&'static str, Regex)] {
    static CATALOGUE: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    CATALOGUE.get_or_init(|| {
        vec![
            (
                "duplicated-type-token",
                Regex::new(
                    r"\b(?:string|number|boolean|unknown|any|void|never|object)\s+(?:string|number|boolean|unknown|any|void|never|object)\b",
                )
                .unwrap(),
            ),
            ("doubled-colon", Regex::new(r":\s*:").unwrap()),
            ("doubled-as", Regex::new(r"\bas\s+as\b").unwrap()),
            ("triple-bracket", Regex::new(r"\[\]\[\]\[\]|<<<").unwrap()),
            (
                "duplicated-import-keyword",
                Regex::new(r"(?m)^\s*import\s+import\b").unwrap(),
            ),
            (
                "duplicated-export-keyword",
                Regex::new(r"(?m)^\s*export\s+export\b").unwrap(),
            ),
            (
                "impossible-assertion",
                Regex::new(r"\bas\s+(?:string|number|boolean)\s+as\b").unwrap(),
            ),
            (
                "duplicated-declaration-keyword",
                Regex::new(
                    r"(?m)^\s*(?:const\s+const|let\s+let|var\s+var|function\s+function|interface\s+interface|type\s+type)\b",
                )
                .unwrap(),
            ),
        ]
    })
}

/// Whether `text` matches any known corruption signature.
pub fn is_corrupt(text: &str) -> bool {
    corruption_signature(text).is_some()
}

/// The first matching signature id, for reporting.
pub fn corruption_signature(text: &str) -> Option<&'static str> {
    corruption_catalogue()
        .iter()
        .find(|(_, re)| re.is_match(text))
        .map(|(id, _)| *id)
}

/// Redundant-annotation shapes a substitution can produce when it collides
/// with text that already carried the replacement.
fn is_redundant_annotation(after: &str, new_type: &str) -> bool {
    let doubled = format!("{} {}", new_type, new_type);
    let doubled_colon = format!(": {}: {}", new_type, new_type);
    after.contains(&doubled) || after.contains(&doubled_colon)
}

/// Gate one substitution immediately after it is applied.
///
/// Rejecting here discards only this site; the caller reverts to the
/// pre-substitution text and continues with the rest of the file.
pub fn validate_replacement(
    before: &str,
    after: &str,
    _site: &RewriteSite,
    new_type: &str,
) -> bool {
    if after == before {
        return false;
    }
    if is_corrupt(after) {
        return false;
    }
    if is_redundant_annotation(after, new_type) {
        return false;
    }
    is_valid_syntax(after)
}
