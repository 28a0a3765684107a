use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::position::SourceRange;

/// The kind of a node in a built script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Top-level container holding configuration and scenes.
    Story,
    /// Named grouping of beats.
    Scene,
    /// Atomic narrative unit.
    Beat,
    /// A choice block that declares beats of its own.
    Choice,
    /// A `config:` block of assignments.
    Config,
    /// Anything the parser could not make sense of.
    Unknown,
}

impl NodeKind {
    /// Lowercase label used in diagnostics. Unknown nodes are just "node".
    pub fn label(self) -> &'static str {
        match self {
            NodeKind::Story => "story",
            NodeKind::Scene => "scene",
            NodeKind::Beat => "beat",
            NodeKind::Choice => "choice",
            NodeKind::Config => "config",
            NodeKind::Unknown => "node",
        }
    }

    /// Story, scene and beat nodes carry narrative meaning and must not be empty.
    pub fn is_semantic(self) -> bool {
        matches!(self, NodeKind::Story | NodeKind::Scene | NodeKind::Beat)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single statement inside a block, in typed form.
///
/// Expression operands (`value`, `payload`) keep their trimmed source text;
/// evaluating them is up to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Action {
    /// `say <speaker> "<text>"`
    Say {
        /// Who is speaking.
        speaker: String,
        /// The spoken line, unquoted.
        text: String,
        /// Where the action was written.
        range: SourceRange,
    },
    /// `stage "<text>"`
    Stage {
        /// The stage direction, unquoted.
        text: String,
        /// Where the action was written.
        range: SourceRange,
    },
    /// `set <state> = <expr>`
    Set {
        /// State variable name.
        state: String,
        /// Expression source text.
        value: String,
        /// Where the action was written.
        range: SourceRange,
    },
    /// `emit <event> [with <expr>]`
    Emit {
        /// Event name.
        event: String,
        /// Payload expression source text, if any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<String>,
        /// Where the action was written.
        range: SourceRange,
    },
    /// `goto <target>`
    Goto {
        /// Target node id.
        target: String,
        /// Where the action was written.
        range: SourceRange,
    },
    /// `end`
    End {
        /// Where the action was written.
        range: SourceRange,
    },
    /// `return`
    Return {
        /// Where the action was written.
        range: SourceRange,
    },
    /// `<name> = <expr>`
    Assignment {
        /// Assigned name.
        name: String,
        /// Expression source text.
        value: String,
        /// Where the action was written.
        range: SourceRange,
    },
}

impl Action {
    /// Source range of the action.
    pub fn range(&self) -> SourceRange {
        match self {
            Action::Say { range, .. }
            | Action::Stage { range, .. }
            | Action::Set { range, .. }
            | Action::Emit { range, .. }
            | Action::Goto { range, .. }
            | Action::End { range }
            | Action::Return { range }
            | Action::Assignment { range, .. } => *range,
        }
    }

    /// Returns `true` for `end`.
    pub fn is_end(&self) -> bool {
        matches!(self, Action::End { .. })
    }
}

/// Renders the action as one line of player-facing text.
impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Say { text, .. } | Action::Stage { text, .. } => f.write_str(text),
            Action::Set { state, value, .. } => write!(f, "set {state} = {value}"),
            Action::Emit {
                event,
                payload: Some(payload),
                ..
            } => write!(f, "emit {event} with {payload}"),
            Action::Emit { event, .. } => write!(f, "emit {event}"),
            Action::Goto { target, .. } => write!(f, "goto {target}"),
            Action::End { .. } => f.write_str("end"),
            Action::Return { .. } => f.write_str("return"),
            Action::Assignment { name, value, .. } => write!(f, "{name} = {value}"),
        }
    }
}

/// One selectable option of a choice block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    /// Label shown to the player, unquoted.
    pub label: String,
    /// Explicit `goto` target, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Combined guard of the choice block and the option.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<String>,
    /// Actions of an inline option body.
    #[serde(default)]
    pub actions: Vec<Action>,
    /// Nested choices of an inline option body.
    #[serde(default)]
    pub choices: Vec<Choice>,
    /// Where the option was written.
    pub range: SourceRange,
}

impl Choice {
    /// The explicit target with surrounding whitespace removed, unless blank.
    pub fn explicit_target(&self) -> Option<&str> {
        self.target
            .as_deref()
            .map(str::trim)
            .filter(|target| !target.is_empty())
    }

    /// Returns `true` if the option carries actions or nested choices.
    pub fn has_inline_body(&self) -> bool {
        !self.actions.is_empty() || !self.choices.is_empty()
    }
}

/// A declaration in the script tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Declared name. Empty for config, choice and unknown nodes.
    pub id: String,
    /// What was declared.
    pub kind: NodeKind,
    /// The node's own `when` clause, trimmed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<String>,
    /// Verbatim block text, trimmed.
    #[serde(default)]
    pub body: String,
    /// Typed statements of the block.
    #[serde(default)]
    pub actions: Vec<Action>,
    /// Nested declarations.
    #[serde(default)]
    pub children: Vec<Node>,
    /// Options of the choice blocks in this node.
    #[serde(default)]
    pub choices: Vec<Choice>,
    /// Where the node was written.
    pub range: SourceRange,
}

impl Node {
    /// Returns `true` if the node has no body, actions, children or choices.
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
            && self.actions.is_empty()
            && self.children.is_empty()
            && self.choices.is_empty()
    }

    /// Returns `true` if any action is `end`.
    pub fn has_end_action(&self) -> bool {
        self.actions.iter().any(Action::is_end)
    }

    /// Direct children of the given kind, in declaration order.
    pub fn children_of(&self, kind: NodeKind) -> impl Iterator<Item = &Node> {
        self.children.iter().filter(move |child| child.kind == kind)
    }
}

/// A fully built script.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "Script")]
pub struct Script {
    /// Entries of the `:::meta` fence.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    /// Top-level declarations.
    #[serde(default)]
    pub nodes: Vec<Node>,
    /// The whole source.
    pub range: SourceRange,
}

impl Script {
    /// Load a script from its JSON form.
    pub fn from_json(json: &str) -> CoreResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the script as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> CoreResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The first top-level story declaration.
    pub fn story(&self) -> Option<&Node> {
        self.nodes.iter().find(|node| node.kind == NodeKind::Story)
    }

    /// Visit every node depth-first in declaration order, with its parent.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Node, Option<&'a Node>)) {
        fn go<'a>(
            nodes: &'a [Node],
            parent: Option<&'a Node>,
            visit: &mut impl FnMut(&'a Node, Option<&'a Node>),
        ) {
            for node in nodes {
                visit(node, parent);
                go(&node.children, Some(node), visit);
            }
        }
        go(&self.nodes, None, visit);
    }

    /// Check that ranges nest properly and that declarations are named.
    pub fn check_structure(&self) -> CoreResult<()> {
        if !self.range.is_ordered() {
            return Err(CoreError::Malformed("script range is reversed".into()));
        }
        for node in &self.nodes {
            check_node(node, &self.range)?;
        }
        Ok(())
    }
}

fn describe(node: &Node) -> String {
    if node.id.is_empty() {
        format!("{} at {}", node.kind.label(), node.range.start)
    } else {
        format!("{} \"{}\"", node.kind.label(), node.id)
    }
}

fn check_node(node: &Node, parent: &SourceRange) -> CoreResult<()> {
    if node.kind.is_semantic() && node.id.trim().is_empty() {
        return Err(CoreError::Malformed(format!(
            "{} at {} has no id",
            node.kind.label(),
            node.range.start
        )));
    }
    if !node.range.is_ordered() || !parent.contains(&node.range) {
        return Err(CoreError::Malformed(format!(
            "{} has a range outside its parent",
            describe(node)
        )));
    }
    for choice in &node.choices {
        check_choice(choice, &node.range, node)?;
    }
    for child in &node.children {
        check_node(child, &node.range)?;
    }
    Ok(())
}

fn check_choice(choice: &Choice, parent: &SourceRange, owner: &Node) -> CoreResult<()> {
    if !choice.range.is_ordered() || !parent.contains(&choice.range) {
        return Err(CoreError::Malformed(format!(
            "choice \"{}\" in {} has a range outside its parent",
            choice.label,
            describe(owner)
        )));
    }
    for nested in &choice.choices {
        check_choice(nested, &choice.range, owner)?;
    }
    Ok(())
}
