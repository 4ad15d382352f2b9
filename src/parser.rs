//! Source parsing with a full-fidelity primary path and a degraded fallback.
//!
//! The primary path parses TypeScript/TSX (decorators included) through
//! tree-sitter with its built-in error recovery: a local syntax error yields
//! ERROR nodes inside an otherwise usable tree and still counts as `Full`.
//! When the parser cannot be constructed or the whole file fails to produce
//! a usable tree, the outcome degrades to raw lines; the degraded extractor
//! recognizes only simple single-line patterns and reports sites without
//! byte offsets, which restricts callers to line-based text surgery.
//!
//! Re-parsing in strict mode (no ERROR/MISSING nodes tolerated) doubles as
//! the syntax validator used before and after rewriting.

use crate::models::{RewriteSite, SiteKind};
use regex::Regex;
use std::sync::OnceLock;
use tree_sitter::{Parser, Tree};

/// A successfully parsed file: the tree plus the exact text it was built from.
pub struct SourceTree {
    pub tree: Tree,
    pub text: String,
}

/// Result of parsing one file.
pub enum ParseOutcome {
    /// Full-fidelity tree; sites carry byte offsets.
    Full(SourceTree),
    /// Best-effort raw lines; offset-dependent edits are unavailable.
    Degraded(Vec<String>),
}

fn make_parser() -> Option<Parser> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_typescript::LANGUAGE_TSX.into())
        .ok()?;
    Some(parser)
}

/// Whether error recovery produced anything usable at all. A tree whose
/// top level is nothing but ERROR nodes carries no structure worth walking.
fn is_usable(tree: &Tree) -> bool {
    let root = tree.root_node();
    if root.named_child_count() == 0 {
        return true;
    }
    let mut cursor = root.walk();
    let usable = root.named_children(&mut cursor).any(|c| !c.is_error());
    usable
}

/// Parse `text`, falling back to the degraded line-based variant.
pub fn parse(text: &str) -> ParseOutcome {
    let Some(mut parser) = make_parser() else {
        return ParseOutcome::Degraded(split_lines(text));
    };
    match parser.parse(text, None) {
        Some(tree) if is_usable(&tree) => ParseOutcome::Full(SourceTree {
            tree,
            text: text.to_string(),
        }),
        _ => ParseOutcome::Degraded(split_lines(text)),
    }
}

pub fn split_lines(text: &str) -> Vec<String> {
    text.lines().map(|l| l.to_string()).collect()
}

/// Strict syntax validation: any ERROR or MISSING node fails.
pub fn is_valid_syntax(text: &str) -> bool {
    let Some(mut parser) = make_parser() else {
        // No parser available; validation cannot pass vacuously.
        return false;
    };
    match parser.parse(text, None) {
        Some(tree) => !tree.root_node().has_error(),
        None => false,
    }
}

struct FallbackPattern {
    kind: SiteKind,
    re: Regex,
    named: bool,
}

fn fallback_patterns() -> &'static [FallbackPattern] {
    static PATTERNS: OnceLock<Vec<FallbackPattern>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        vec![
            FallbackPattern {
                kind: SiteKind::ArrayElement,
                re: Regex::new(r":\s*any\[\]").unwrap(),
                named: false,
            },
            FallbackPattern {
                kind: SiteKind::TypeAssertion,
                re: Regex::new(r"\bas\s+any\b").unwrap(),
                named: false,
            },
            FallbackPattern {
                kind: SiteKind::GenericParameter,
                re: Regex::new(r"<\s*any\s*>").unwrap(),
                named: false,
            },
            FallbackPattern {
                kind: SiteKind::VariableDeclaration,
                re: Regex::new(r"^\s*(?:export\s+)?(?:const|let|var)\s+(\w+)\s*:\s*any\b")
                    .unwrap(),
                named: true,
            },
            FallbackPattern {
                kind: SiteKind::FunctionReturn,
                re: Regex::new(r"\)\s*:\s*any\s*(?:\{|=>|;|$)").unwrap(),
                named: false,
            },
            FallbackPattern {
                kind: SiteKind::InterfaceProperty,
                re: Regex::new(r"^\s*(?:readonly\s+)?(\w+)\??\s*:\s*any\s*[;,]?\s*$").unwrap(),
                named: true,
            },
            FallbackPattern {
                kind: SiteKind::FunctionParameter,
                re: Regex::new(r"[(,]\s*(\w+)\??\s*:\s*any\b").unwrap(),
                named: true,
            },
        ]
    })
}

/// Regex-based site extraction for the degraded path.
///
/// One site per line at most; patterns are tried in a fixed specificity
/// order and the first match wins. Multi-line and nested constructs are
/// intentionally out of reach here.
pub fn degraded_sites(lines: &[String]) -> Vec<RewriteSite> {
    let mut sites = Vec::new();
    for (idx, line) in lines.iter().enumerate() {
        for pat in fallback_patterns() {
            if let Some(c) = pat.re.captures(line) {
                let name = if pat.named {
                    c.get(1).map(|m| m.as_str().to_string())
                } else {
                    None
                };
                sites.push(RewriteSite {
                    kind: pat.kind,
                    name,
                    line: idx + 1,
                    span: None,
                });
                break;
            }
        }
    }
    sites
}
