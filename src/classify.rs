//! Usage classification and replacement inference.
//!
//! `find_sites` locates every `any` occurrence in a parsed file and tags it
//! with its syntactic context. `propose` runs a prioritized chain of
//! heuristics over one site; the chain is an ordered list evaluated with
//! first-match-wins semantics:
//!
//! 1. protected context — the site is intentionally preserved (`skip`)
//! 2. domain vocabulary — identifier matches the configured keyword table
//! 3. context window — structural cues in surrounding lines
//! 4. conservative fallback — `unknown`, which never fails validation
//!
//! Heuristics 2–3 carry fixed confidence scores gated by the configured
//! `confidence_threshold`; the fallback is exempt so classification can
//! never end in an error. Everything here is a pure function of the text
//! and config; mutation happens in the orchestrator.

use crate::config::Effective;
use crate::models::{Confidence, Proposal, RewriteSite, SiteKind};
use crate::parser::{degraded_sites, ParseOutcome};
use tree_sitter::Node;

/// Locate rewrite sites in a parse outcome.
pub fn find_sites(outcome: &ParseOutcome) -> Vec<RewriteSite> {
    match outcome {
        ParseOutcome::Full(src) => {
            let mut sites = Vec::new();
            walk(src.tree.root_node(), src.text.as_bytes(), &mut sites);
            sites
        }
        ParseOutcome::Degraded(lines) => degraded_sites(lines),
    }
}

fn walk(node: Node, text: &[u8], sites: &mut Vec<RewriteSite>) {
    if node.kind() == "predefined_type" && node.utf8_text(text) == Ok("any") {
        if let Some(site) = classify_any(node, text) {
            sites.push(site);
        }
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk(child, text, sites);
    }
}

fn node_text(node: Node, text: &[u8]) -> Option<String> {
    node.utf8_text(text).ok().map(|s| s.to_string())
}

fn field_text(node: Node, field: &str, text: &[u8]) -> Option<String> {
    node.child_by_field_name(field)
        .and_then(|n| node_text(n, text))
}

/// Classify one `any` token by its ancestor chain.
fn classify_any(any_node: Node, text: &[u8]) -> Option<RewriteSite> {
    let line = any_node.start_position().row + 1;
    let span = Some((any_node.start_byte(), any_node.end_byte()));

    let mut cur = any_node;
    while let Some(parent) = cur.parent() {
        let (kind, name) = match parent.kind() {
            "array_type" => (SiteKind::ArrayElement, None),
            "as_expression" | "satisfies_expression" => (SiteKind::TypeAssertion, None),
            "type_arguments" => (SiteKind::GenericParameter, None),
            "type_annotation" => {
                let holder = parent.parent()?;
                match holder.kind() {
                    "required_parameter" | "optional_parameter" => (
                        SiteKind::FunctionParameter,
                        field_text(holder, "pattern", text),
                    ),
                    "variable_declarator" => (
                        SiteKind::VariableDeclaration,
                        field_text(holder, "name", text),
                    ),
                    "catch_clause" => (
                        SiteKind::VariableDeclaration,
                        field_text(holder, "parameter", text),
                    ),
                    "property_signature" | "public_field_definition" => (
                        SiteKind::InterfaceProperty,
                        field_text(holder, "name", text),
                    ),
                    "function_declaration"
                    | "function_expression"
                    | "function_signature"
                    | "arrow_function"
                    | "method_definition"
                    | "method_signature" => {
                        (SiteKind::FunctionReturn, field_text(holder, "name", text))
                    }
                    _ => {
                        cur = parent;
                        continue;
                    }
                }
            }
            _ => {
                cur = parent;
                continue;
            }
        };
        return Some(RewriteSite {
            kind,
            name,
            line,
            span,
        });
    }
    None
}

struct HeurCtx<'a> {
    site: &'a RewriteSite,
    site_line: &'a str,
    window: String,
    eff: &'a Effective,
}

type HeuristicFn = fn(&HeurCtx) -> Option<Proposal>;

/// The chain: (label, fixed confidence score, gated, heuristic).
/// Order here is the tie-break rule; do not reorder casually.
const CHAIN: &[(&str, f64, bool, HeuristicFn)] = &[
    ("protected", 1.0, false, protected_context),
    ("vocabulary", 0.8, true, vocabulary),
    ("context", 0.6, true, context_window),
    ("fallback", 0.3, false, fallback),
];

/// Propose a replacement for one site. Never fails: the conservative
/// fallback matches anything the earlier heuristics decline.
pub fn propose(site: &RewriteSite, lines: &[String], eff: &Effective) -> Proposal {
    let site_line = lines
        .get(site.line.saturating_sub(1))
        .map(String::as_str)
        .unwrap_or("");
    let ctx = HeurCtx {
        site,
        site_line,
        window: window_around(lines, site.line, eff.context_window),
        eff,
    };
    for (_, score, gated, heuristic) in CHAIN {
        if *gated && *score < eff.confidence_threshold {
            continue;
        }
        if let Some(mut p) = heuristic(&ctx) {
            // regex-derived sites carry no offsets and are lower-confidence
            if site.span.is_none() && !p.skip && p.confidence == Confidence::High {
                p.confidence = Confidence::Medium;
            }
            return p;
        }
    }
    // unreachable: fallback always proposes
    Proposal {
        new_type: Some("unknown".to_string()),
        confidence: Confidence::Low,
        reason: "fallback:unknown".to_string(),
        skip: false,
    }
}

fn window_around(lines: &[String], line: usize, radius: usize) -> String {
    let idx = line.saturating_sub(1);
    let lo = idx.saturating_sub(radius);
    let hi = (idx + radius + 1).min(lines.len());
    lines[lo..hi].join("\n")
}

/// Heuristic 1: error-handling and configuration contexts are preserved.
fn protected_context(ctx: &HeurCtx) -> Option<Proposal> {
    let skip = |reason: &str| {
        Some(Proposal {
            new_type: None,
            confidence: Confidence::High,
            reason: reason.to_string(),
            skip: true,
        })
    };
    let line = ctx.site_line;
    if line.contains("catch (") || line.contains("catch(") {
        return skip("protected:catch");
    }
    if ctx.window.contains(".catch(") || ctx.window.contains("throw new Error") {
        return skip("protected:error-handling");
    }
    if ctx.window.contains("console.") || ctx.window.contains("logger.") {
        return skip("protected:logging");
    }
    let lower = line.to_ascii_lowercase();
    if lower.contains("export const") && lower.contains("config") {
        return skip("protected:configuration");
    }
    if line.contains("plugin(") || line.contains("middleware(") {
        return skip("protected:configuration");
    }
    None
}

/// Heuristic 2: identifier name matches the configured keyword table.
fn vocabulary(ctx: &HeurCtx) -> Option<Proposal> {
    let name = ctx.site.name.as_deref()?.to_ascii_lowercase();
    for (keyword, ty) in &ctx.eff.vocabulary {
        if name == *keyword || name.ends_with(keyword.as_str()) {
            return Some(Proposal {
                new_type: Some(ty.clone()),
                confidence: Confidence::High,
                reason: format!("vocabulary:{}", keyword),
                skip: false,
            });
        }
    }
    None
}

/// Event-handler name -> DOM event type.
fn event_type_for(name: &str) -> Option<&'static str> {
    match name {
        "onClick" | "onMouseDown" | "onMouseUp" => Some("MouseEvent"),
        "onKeyDown" | "onKeyUp" | "onKeyPress" => Some("KeyboardEvent"),
        "onChange" | "onInput" | "onSubmit" | "onFocus" | "onBlur" => Some("Event"),
        _ => {
            if name.starts_with("on") && name[2..].starts_with(char::is_uppercase) {
                Some("Event")
            } else {
                None
            }
        }
    }
}

/// Heuristic 3: structural cues in the surrounding window. Sub-patterns
/// are evaluated in a fixed priority order; no scoring across them.
fn context_window(ctx: &HeurCtx) -> Option<Proposal> {
    let w = &ctx.window;
    let hit = |reason: &str, ty: &str| {
        Some(Proposal {
            new_type: Some(ty.to_string()),
            confidence: Confidence::Medium,
            reason: format!("context:{}", reason),
            skip: false,
        })
    };
    if [".map(", ".filter(", ".forEach(", ".reduce(", ".length"]
        .iter()
        .any(|p| w.contains(p))
    {
        return hit("array", "unknown[]");
    }
    if w.contains("await ") || w.contains(".then(") {
        return hit("promise", "Promise<unknown>");
    }
    if [
        "JSON.",
        "fetch(",
        ".json()",
        "response",
        "Response",
    ]
    .iter()
    .any(|p| w.contains(p))
    {
        return hit("record", "Record<string, unknown>");
    }
    if let Some(name) = ctx.site.name.as_deref() {
        if let Some(ev) = event_type_for(name) {
            return hit("event", ev);
        }
    }
    if w.contains("=>") || w.contains("function (") || w.contains("function(") {
        return hit("callback", "(...args: unknown[]) => unknown");
    }
    None
}

/// Heuristic 4: the weakest always-safe supertype.
fn fallback(_ctx: &HeurCtx) -> Option<Proposal> {
    Some(Proposal {
        new_type: Some("unknown".to_string()),
        confidence: Confidence::Low,
        reason: "fallback:unknown".to_string(),
        skip: false,
    })
}
