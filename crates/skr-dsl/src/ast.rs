//! Typed syntax tree produced by the parser.
//!
//! The tree keeps every statement the parser saw, including ones it could not
//! make sense of, so that diagnostics and the builder work from one source.

pub use crate::lexer::Span;

/// An AST node with source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    /// The wrapped AST node.
    pub node: T,
    /// The byte range of this node in the source text.
    pub span: Span,
}

impl<T> Spanned<T> {
    /// Wrap `node` with `span`.
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

/// A parsed source file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceFile {
    /// The leading `:::meta` fence, if present.
    pub metadata: Option<MetadataFence>,
    /// Top-level statements.
    pub statements: Vec<Statement>,
    /// Byte length of the source.
    pub len: usize,
}

/// A `:::meta ... :::` fence.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataFence {
    /// `key: value` entries in order.
    pub entries: Vec<MetadataEntry>,
    /// Problems found inside the fence.
    pub issues: Vec<Issue>,
    /// From `:::meta` to the closing `:::` (or the last entry).
    pub span: Span,
}

/// One `key: value` line of the metadata fence.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataEntry {
    /// The key.
    pub key: Spanned<String>,
    /// The value, absent when the line stops after the colon.
    pub value: Option<Spanned<MetadataValue>>,
}

/// The value forms allowed in the metadata fence.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    /// A string literal (escapes resolved).
    String(String),
    /// An object literal `{ k: v }`.
    Object,
    /// `**strong**` inline markup.
    Strong,
    /// `*emphasis*` inline markup.
    Emphasis,
    /// A number literal.
    Number,
    /// `true` or `false`.
    Boolean,
    /// A bare identifier.
    Identifier,
}

/// Something the parser had to recover from.
#[derive(Debug, Clone, PartialEq)]
pub enum Issue {
    /// A required segment is absent; `at` is where it was expected.
    Missing {
        /// What was expected, e.g. `identifier` or `:`.
        what: &'static str,
        /// Byte offset where it was expected.
        at: usize,
    },
    /// Tokens that do not fit the grammar at this point.
    Unexpected(Span),
}

/// A statement with its source span and any recovered problems.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// What kind of statement this is.
    pub kind: StatementKind,
    /// From the first token to the last non-layout token, nested blocks included.
    pub span: Span,
    /// Problems inside the statement header, in source order.
    pub issues: Vec<Issue>,
}

impl Statement {
    /// The nested block, if the statement has one.
    pub fn block(&self) -> Option<&Block> {
        match &self.kind {
            StatementKind::Story(decl) | StatementKind::Scene(decl) | StatementKind::Beat(decl) => {
                decl.block.as_ref()
            }
            StatementKind::Config(block) => block.as_ref(),
            StatementKind::Choice(choice) => choice.block.as_ref(),
            StatementKind::Option(option) => option.block.as_ref(),
            _ => None,
        }
    }
}

/// An indented block.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// Offset of the block start marker (the first token of the block).
    pub start: usize,
    /// End of the block's last token. Trailing comments and blank lines are outside.
    pub end: usize,
    /// Statements of the block.
    pub items: Vec<Statement>,
}

/// `story`/`scene`/`beat` declarations.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    /// The declared name.
    pub name: Option<Spanned<String>>,
    /// The `when` clause of the header.
    pub when: Option<Spanned<Expr>>,
    /// The body.
    pub block: Option<Block>,
}

/// A `choice [when <expr>]:` block.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceBlock {
    /// Guard applying to every option.
    pub when: Option<Spanned<Expr>>,
    /// Options (and permissively, beats).
    pub block: Option<Block>,
}

/// `option "<label>" [when <expr>] (goto <id> | : [block])`
#[derive(Debug, Clone, PartialEq)]
pub struct OptionEntry {
    /// The label string.
    pub label: Option<Spanned<String>>,
    /// The option's own guard.
    pub when: Option<Spanned<Expr>>,
    /// `goto` target.
    pub target: Option<Spanned<String>>,
    /// Inline body after `:`.
    pub block: Option<Block>,
}

/// The statements of the language.
#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    /// `story <id>:`
    Story(Declaration),
    /// `scene <id> [when <expr>]:`
    Scene(Declaration),
    /// `beat <id> [when <expr>]:`
    Beat(Declaration),
    /// `config:`
    Config(Option<Block>),
    /// `choice [when <expr>]:`
    Choice(ChoiceBlock),
    /// `option ...`
    Option(OptionEntry),
    /// `goto <id>`
    Goto(Option<Spanned<String>>),
    /// `end`
    End,
    /// `return`
    Return,
    /// `include "<path>"`
    Include(Option<Spanned<String>>),
    /// A standalone `when <expr>` guard.
    WhenGuard(Option<Spanned<Expr>>),
    /// `<name> = <expr>`
    Assignment {
        /// Assigned name.
        name: Spanned<String>,
        /// Assigned value.
        value: Option<Spanned<Expr>>,
    },
    /// `say <speaker> "<text>"`
    Say {
        /// Speaker identifier.
        speaker: Option<Spanned<String>>,
        /// Spoken text.
        text: Option<Spanned<String>>,
    },
    /// `stage "<text>"`
    Stage {
        /// Stage direction.
        text: Option<Spanned<String>>,
    },
    /// `set <state> = <expr>`
    Set {
        /// State name.
        state: Option<Spanned<String>>,
        /// Assigned value.
        value: Option<Spanned<Expr>>,
    },
    /// `emit <event> [with <expr>]`
    Emit {
        /// Event name.
        event: Option<Spanned<String>>,
        /// Payload after `with`.
        payload: Option<Spanned<Expr>>,
    },
    /// A line whose indentation matches no open block.
    InconsistentIndentation,
    /// Input that does not parse as a statement here.
    Error,
}

/// Binary operators, lowest precedence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `or`
    Or,
    /// `and`
    And,
    /// `==`
    Eq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Rem,
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `not`
    Not,
    /// `-`
    Neg,
    /// `+`
    Plus,
}

/// Expressions. Stored for validation; the builder keeps their source text.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `lhs op rhs`
    Binary {
        /// Operator.
        op: BinaryOp,
        /// Left operand.
        lhs: Box<Spanned<Expr>>,
        /// Right operand.
        rhs: Box<Spanned<Expr>>,
    },
    /// `op operand`
    Unary {
        /// Operator.
        op: UnaryOp,
        /// Operand.
        operand: Box<Spanned<Expr>>,
    },
    /// `( inner )`
    Group(Box<Spanned<Expr>>),
    /// `{ key: value, ... }`
    Object(Vec<(Spanned<String>, Spanned<Expr>)>),
    /// `[ a, b, ... ]`
    Array(Vec<Spanned<Expr>>),
    /// String literal.
    String(String),
    /// Number literal.
    Number(f64),
    /// `true` / `false`
    Boolean(bool),
    /// Bare identifier.
    Identifier(String),
    /// Tokens that do not form an expression.
    Error,
}
