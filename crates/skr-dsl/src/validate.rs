//! Syntactic and semantic checks.
//!
//! The syntactic pass reads the syntax tree in document order and reports
//! every recovered problem. The semantic pass reads the built script (ids,
//! content, beat collisions) and the syntax tree (choice placement, targets).

use std::collections::{HashMap, HashSet};

use skr_core::{LineIndex, Node, NodeKind, Script};

use crate::ast::*;
use crate::diagnostics::Diagnostic;

// -- Pass 1: syntax --

/// Diagnostics for error, missing and indentation markers (SKR001-SKR003).
pub fn syntax_diagnostics(file: &SourceFile, index: &LineIndex<'_>) -> Vec<Diagnostic> {
    let mut pass = SyntaxPass {
        index,
        diagnostics: Vec::new(),
    };
    if let Some(fence) = &file.metadata {
        pass.issues(&fence.issues);
    }
    pass.statements(&file.statements);
    pass.diagnostics
}

struct SyntaxPass<'a, 'src> {
    index: &'a LineIndex<'src>,
    diagnostics: Vec<Diagnostic>,
}

impl SyntaxPass<'_, '_> {
    fn unexpected(&mut self, span: &Span) {
        let snippet = self.index.source().get(span.clone()).unwrap_or_default().trim();
        let message = if snippet.is_empty() {
            "Unexpected token.".to_string()
        } else {
            format!("Unexpected token near \"{snippet}\".")
        };
        self.diagnostics
            .push(Diagnostic::error("SKR001", message, self.index.range(span.clone())));
    }

    fn issues(&mut self, issues: &[Issue]) {
        for issue in issues {
            match issue {
                Issue::Missing { what, at } => self.diagnostics.push(Diagnostic::error(
                    "SKR002",
                    format!("Missing {what} segment."),
                    self.index.range(*at..*at),
                )),
                Issue::Unexpected(span) => self.unexpected(span),
            }
        }
    }

    fn statements(&mut self, statements: &[Statement]) {
        for stmt in statements {
            match stmt.kind {
                StatementKind::Error => self.unexpected(&stmt.span),
                StatementKind::InconsistentIndentation => self.diagnostics.push(Diagnostic::error(
                    "SKR003",
                    "Inconsistent indentation detected.",
                    self.index.range(stmt.span.clone()),
                )),
                _ => {}
            }
            self.issues(&stmt.issues);
            if let Some(block) = stmt.block() {
                self.statements(&block.items);
            }
        }
    }
}

// -- Pass 2: semantics --

/// Diagnostics for duplicates, empty nodes, beat collisions, choice
/// placement and targets (SKR101-SKR105).
pub fn semantic_diagnostics(
    script: &Script,
    file: &SourceFile,
    index: &LineIndex<'_>,
) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    let mut targets = HashSet::new();
    script.walk(&mut |node, _| {
        if !node.id.is_empty() {
            targets.insert(node.id.as_str());
        }
    });

    check_node_list(&script.nodes, None, &mut diagnostics);
    check_beat_collisions(script, &mut diagnostics);

    let mut pass = TargetPass {
        index,
        targets: &targets,
        diagnostics: &mut diagnostics,
    };
    pass.statements(&file.statements, false);

    diagnostics
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn id_suffix(node: &Node) -> String {
    if node.id.is_empty() {
        String::new()
    } else {
        format!(" \"{}\"", node.id)
    }
}

/// Sibling duplicates (SKR101) and empty declarations (SKR104).
fn check_node_list(nodes: &[Node], parent: Option<&Node>, diagnostics: &mut Vec<Diagnostic>) {
    let mut seen: HashSet<&str> = HashSet::new();
    for node in nodes {
        if !node.id.is_empty() && !seen.insert(node.id.as_str()) {
            let within = parent
                .map(|p| format!(" within {}{}", p.kind.label(), id_suffix(p)))
                .unwrap_or_default();
            diagnostics.push(Diagnostic::error(
                "SKR101",
                format!("Duplicate {}{}{within}.", node.kind.label(), id_suffix(node)),
                node.range,
            ));
        }

        if node.kind.is_semantic() && node.is_empty() {
            diagnostics.push(Diagnostic::error(
                "SKR104",
                format!(
                    "{}{} has no content.",
                    capitalize(node.kind.label()),
                    id_suffix(node)
                ),
                node.range,
            ));
        }

        if !node.children.is_empty() {
            check_node_list(&node.children, Some(node), diagnostics);
        }
    }
}

/// Beats sharing an id across different parents (SKR105).
///
/// The session's beat index keeps the last declaration, so the warning sits
/// on the later one and names where the earlier one lives.
fn check_beat_collisions(script: &Script, diagnostics: &mut Vec<Diagnostic>) {
    let mut declared: HashMap<&str, Option<&Node>> = HashMap::new();
    script.walk(&mut |node, parent| {
        if node.kind != NodeKind::Beat || node.id.is_empty() {
            return;
        }
        if let Some(previous) = declared.insert(node.id.as_str(), parent) {
            let same_parent = match (previous, parent) {
                (Some(a), Some(b)) => std::ptr::eq(a, b),
                (None, None) => true,
                _ => false,
            };
            if !same_parent {
                let location = previous
                    .map(|p| format!("{}{}", p.kind.label(), id_suffix(p)))
                    .unwrap_or_else(|| "the top level".to_string());
                diagnostics.push(Diagnostic::warning(
                    "SKR105",
                    format!(
                        "Beat \"{}\" is also declared in {location}; targets resolve to the last declaration.",
                        node.id
                    ),
                    node.range,
                ));
            }
        }
    });
}

/// Choice placement (SKR102) and target checks (SKR103) over the syntax tree.
struct TargetPass<'a, 'src> {
    index: &'a LineIndex<'src>,
    targets: &'a HashSet<&'a str>,
    diagnostics: &'a mut Vec<Diagnostic>,
}

impl TargetPass<'_, '_> {
    fn check_target(&mut self, target: &Spanned<String>) {
        if !target.node.is_empty() && !self.targets.contains(target.node.as_str()) {
            self.diagnostics.push(Diagnostic::error(
                "SKR103",
                format!("Target \"{}\" does not match any declared node.", target.node),
                self.index.range(target.span.clone()),
            ));
        }
    }

    fn statements(&mut self, statements: &[Statement], in_beat: bool) {
        for stmt in statements {
            match &stmt.kind {
                StatementKind::Choice(_) if !in_beat => {
                    self.diagnostics.push(Diagnostic::error(
                        "SKR102",
                        "Choice blocks must be nested inside a beat.",
                        self.index.range(stmt.span.clone()),
                    ));
                }
                StatementKind::Goto(Some(target)) => self.check_target(target),
                StatementKind::Option(option) => match (&option.target, &option.block) {
                    (Some(target), _) => self.check_target(target),
                    (None, None) => {
                        let label = option
                            .label
                            .as_ref()
                            .map(|l| format!(" \"{}\"", l.node))
                            .unwrap_or_default();
                        self.diagnostics.push(Diagnostic::error(
                            "SKR103",
                            format!("Option{label} is missing a target or inline body."),
                            self.index.range(stmt.span.clone()),
                        ));
                    }
                    (None, Some(_)) => {}
                },
                _ => {}
            }

            if let Some(block) = stmt.block() {
                let in_beat = in_beat || matches!(stmt.kind, StatementKind::Beat(_));
                self.statements(&block.items, in_beat);
            }
        }
    }
}
