use std::collections::BTreeMap;

use skr_core::{Action, Choice, LineIndex, Node, NodeKind, Script, SourceRange};

use crate::ast::*;

/// Build the script model from a parsed source file.
///
/// Building is total: statements that failed to parse become `unknown` nodes
/// or are skipped, and incomplete actions are left out.
pub fn build(file: &SourceFile, source: &str) -> Script {
    let builder = Builder {
        source,
        index: LineIndex::new(source),
    };
    let script = Script {
        metadata: builder.metadata(file.metadata.as_ref()),
        nodes: builder.top_level(&file.statements),
        range: builder.index.full_range(),
    };
    log::debug!("built {} top-level nodes", script.nodes.len());
    script
}

struct Builder<'a> {
    source: &'a str,
    index: LineIndex<'a>,
}

impl Builder<'_> {
    fn range(&self, span: &Span) -> SourceRange {
        self.index.range(span.clone())
    }

    /// Trimmed source text of a span.
    fn text(&self, span: &Span) -> String {
        self.source
            .get(span.clone())
            .unwrap_or_default()
            .trim()
            .to_string()
    }

    fn when_text(&self, when: Option<&Spanned<Expr>>) -> Option<String> {
        when.map(|w| self.text(&w.span)).filter(|w| !w.is_empty())
    }

    /// Text between the block start and end markers, trimmed.
    fn body(&self, block: Option<&Block>) -> String {
        block.map_or_else(String::new, |b| self.text(&(b.start..b.end)))
    }

    // -- Metadata --

    fn metadata(&self, fence: Option<&MetadataFence>) -> BTreeMap<String, String> {
        let Some(fence) = fence else {
            return BTreeMap::new();
        };
        fence
            .entries
            .iter()
            .map(|entry| {
                let value = match &entry.value {
                    Some(Spanned {
                        node: MetadataValue::String(text),
                        ..
                    }) => text.clone(),
                    Some(value) => self.text(&value.span),
                    None => String::new(),
                };
                (entry.key.node.clone(), value)
            })
            .collect()
    }

    // -- Nodes --

    fn top_level(&self, statements: &[Statement]) -> Vec<Node> {
        statements
            .iter()
            .filter_map(|stmt| match &stmt.kind {
                StatementKind::Story(decl) => Some(self.declaration(stmt, NodeKind::Story, decl)),
                StatementKind::Scene(decl) => Some(self.declaration(stmt, NodeKind::Scene, decl)),
                StatementKind::Beat(decl) => Some(self.declaration(stmt, NodeKind::Beat, decl)),
                StatementKind::Error => Some(self.unknown(stmt)),
                _ => None,
            })
            .collect()
    }

    fn empty_node(&self, stmt: &Statement, kind: NodeKind) -> Node {
        Node {
            id: String::new(),
            kind,
            when: None,
            body: String::new(),
            actions: Vec::new(),
            children: Vec::new(),
            choices: Vec::new(),
            range: self.range(&stmt.span),
        }
    }

    fn unknown(&self, stmt: &Statement) -> Node {
        Node {
            body: self.text(&stmt.span),
            ..self.empty_node(stmt, NodeKind::Unknown)
        }
    }

    fn declaration(&self, stmt: &Statement, kind: NodeKind, decl: &Declaration) -> Node {
        let mut node = Node {
            id: decl.name.as_ref().map(|n| n.node.clone()).unwrap_or_default(),
            when: self.when_text(decl.when.as_ref()),
            body: self.body(decl.block.as_ref()),
            ..self.empty_node(stmt, kind)
        };
        if let Some(block) = &decl.block {
            self.fill(&mut node, &block.items);
        }
        node
    }

    fn config(&self, stmt: &Statement, block: Option<&Block>) -> Node {
        let mut node = Node {
            body: self.body(block),
            ..self.empty_node(stmt, NodeKind::Config)
        };
        if let Some(block) = block {
            self.fill(&mut node, &block.items);
        }
        node
    }

    /// Distribute block statements into children, choices and actions.
    fn fill(&self, node: &mut Node, items: &[Statement]) {
        for item in items {
            match &item.kind {
                StatementKind::Story(decl) => {
                    node.children.push(self.declaration(item, NodeKind::Story, decl));
                }
                StatementKind::Scene(decl) => {
                    node.children.push(self.declaration(item, NodeKind::Scene, decl));
                }
                StatementKind::Beat(decl) => {
                    node.children.push(self.declaration(item, NodeKind::Beat, decl));
                }
                StatementKind::Config(block) => {
                    node.children.push(self.config(item, block.as_ref()));
                }
                StatementKind::Choice(choice) => {
                    node.choices.extend(self.choice_block(choice));
                    if let Some(holder) = self.choice_node(item, choice) {
                        node.children.push(holder);
                    }
                }
                StatementKind::Error if node.kind.is_semantic() => {
                    node.children.push(self.unknown(item));
                }
                _ => node.actions.extend(self.action(item)),
            }
        }
    }

    /// A `choice` node for choice blocks that declare beats of their own.
    fn choice_node(&self, stmt: &Statement, choice: &ChoiceBlock) -> Option<Node> {
        let block = choice.block.as_ref()?;
        let beats: Vec<Node> = block
            .items
            .iter()
            .filter_map(|item| match &item.kind {
                StatementKind::Beat(decl) => Some(self.declaration(item, NodeKind::Beat, decl)),
                _ => None,
            })
            .collect();
        if beats.is_empty() {
            return None;
        }
        Some(Node {
            when: self.when_text(choice.when.as_ref()),
            body: self.body(Some(block)),
            children: beats,
            ..self.empty_node(stmt, NodeKind::Choice)
        })
    }

    /// Expand a choice block into its options, combining guards.
    fn choice_block(&self, choice: &ChoiceBlock) -> Vec<Choice> {
        let Some(block) = &choice.block else {
            return Vec::new();
        };
        let block_when = self.when_text(choice.when.as_ref());
        block
            .items
            .iter()
            .filter_map(|item| {
                let StatementKind::Option(entry) = &item.kind else {
                    return None;
                };
                let label = entry.label.as_ref()?;
                let option_when = self.when_text(entry.when.as_ref());
                let (actions, choices) = entry
                    .block
                    .as_ref()
                    .map(|b| self.inline_body(&b.items))
                    .unwrap_or_default();
                Some(Choice {
                    label: label.node.clone(),
                    target: entry.target.as_ref().map(|t| t.node.clone()),
                    when: combine_when(block_when.clone(), option_when),
                    actions,
                    choices,
                    range: self.range(&item.span),
                })
            })
            .collect()
    }

    /// Actions and nested choices of an option body.
    fn inline_body(&self, items: &[Statement]) -> (Vec<Action>, Vec<Choice>) {
        let mut actions = Vec::new();
        let mut choices = Vec::new();
        for item in items {
            match &item.kind {
                StatementKind::Choice(choice) => choices.extend(self.choice_block(choice)),
                _ => actions.extend(self.action(item)),
            }
        }
        (actions, choices)
    }

    fn action(&self, stmt: &Statement) -> Option<Action> {
        let range = self.range(&stmt.span);
        let action = match &stmt.kind {
            StatementKind::Say {
                speaker: Some(speaker),
                text: Some(text),
            } => Action::Say {
                speaker: speaker.node.clone(),
                text: text.node.clone(),
                range,
            },
            StatementKind::Stage { text: Some(text) } => Action::Stage {
                text: text.node.clone(),
                range,
            },
            StatementKind::Set {
                state: Some(state),
                value: Some(value),
            } => Action::Set {
                state: state.node.clone(),
                value: self.text(&value.span),
                range,
            },
            StatementKind::Emit {
                event: Some(event),
                payload,
            } => Action::Emit {
                event: event.node.clone(),
                payload: payload.as_ref().map(|p| self.text(&p.span)),
                range,
            },
            StatementKind::Goto(Some(target)) => Action::Goto {
                target: target.node.clone(),
                range,
            },
            StatementKind::End => Action::End { range },
            StatementKind::Return => Action::Return { range },
            StatementKind::Assignment {
                name,
                value: Some(value),
            } => Action::Assignment {
                name: name.node.clone(),
                value: self.text(&value.span),
                range,
            },
            _ => return None,
        };
        Some(action)
    }
}

/// AND two optional guards; when both exist each side is parenthesized.
fn combine_when(outer: Option<String>, inner: Option<String>) -> Option<String> {
    match (outer, inner) {
        (Some(outer), Some(inner)) => Some(format!("({outer}) and ({inner})")),
        (outer, inner) => outer.or(inner),
    }
}
