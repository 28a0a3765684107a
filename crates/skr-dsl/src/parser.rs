use crate::ast::*;
use crate::expr::parse_expression;
use crate::lexer::Token;

/// The block a statement appears in. Decides which statements are allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockContext {
    TopLevel,
    Story,
    Scene,
    Beat,
    Config,
    Choice,
    OptionBody,
}

/// What the first tokens of a line announce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Head {
    Story,
    Scene,
    Beat,
    Config,
    Choice,
    Option,
    Goto,
    End,
    Return,
    Include,
    When,
    Say,
    Stage,
    Set,
    Emit,
    Assignment,
}

impl Head {
    fn from_keyword(word: &str) -> Option<Self> {
        Some(match word {
            "story" => Head::Story,
            "scene" => Head::Scene,
            "beat" => Head::Beat,
            "config" => Head::Config,
            "choice" => Head::Choice,
            "option" => Head::Option,
            "goto" => Head::Goto,
            "end" => Head::End,
            "return" => Head::Return,
            "include" => Head::Include,
            "when" => Head::When,
            "say" => Head::Say,
            "stage" => Head::Stage,
            "set" => Head::Set,
            "emit" => Head::Emit,
            _ => return None,
        })
    }
}

impl BlockContext {
    fn allows(self, head: Head) -> bool {
        use Head as H;
        match self {
            BlockContext::TopLevel => matches!(
                head,
                H::Story
                    | H::Scene
                    | H::Beat
                    | H::Config
                    | H::Assignment
                    | H::Choice
                    | H::Goto
                    | H::End
                    | H::Return
                    | H::Include
                    | H::When
            ),
            BlockContext::Story => {
                matches!(head, H::Story | H::Scene | H::Beat | H::Config | H::Include)
            }
            BlockContext::Scene => matches!(
                head,
                H::Beat | H::Choice | H::Goto | H::End | H::Return | H::When
            ),
            BlockContext::Beat | BlockContext::OptionBody => matches!(
                head,
                H::Say
                    | H::Stage
                    | H::Set
                    | H::Emit
                    | H::Choice
                    | H::Goto
                    | H::End
                    | H::Return
                    | H::When
                    | H::Assignment
            ),
            BlockContext::Config => head == H::Assignment,
            BlockContext::Choice => matches!(head, H::Option | H::Beat),
        }
    }
}

fn is_colon(token: &Token) -> bool {
    *token == Token::Colon
}

fn is_colon_or_goto(token: &Token) -> bool {
    *token == Token::Colon || token.is_word("goto")
}

fn never(_: &Token) -> bool {
    false
}

struct Parser<'t> {
    tokens: &'t [(Token, Span)],
    pos: usize,
    eof: usize,
    last_end: usize,
}

impl<'t> Parser<'t> {
    fn new(tokens: &'t [(Token, Span)], eof: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            eof,
            last_end: 0,
        }
    }

    // -- Token helpers --

    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn peek_at(&self, offset: usize) -> Option<&'t Token> {
        self.tokens.get(self.pos + offset).map(|(t, _)| t)
    }

    fn peek_start(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.eof, |(_, s)| s.start)
    }

    fn peek_word(&self, word: &str) -> bool {
        self.peek().is_some_and(|t| t.is_word(word))
    }

    fn bump(&mut self) -> Option<&'t (Token, Span)> {
        let entry = self.tokens.get(self.pos)?;
        self.pos += 1;
        if !entry.0.is_layout() {
            self.last_end = entry.1.end;
        }
        Some(entry)
    }

    fn at_line_end(&self) -> bool {
        matches!(self.peek(), None | Some(Token::Newline))
    }

    /// Consume the rest of the line (not the newline). Returns the consumed span.
    fn consume_line(&mut self) -> Option<Span> {
        let start = self.peek_start();
        let mut any = false;
        while !self.at_line_end() {
            self.bump();
            any = true;
        }
        any.then(|| start..self.last_end)
    }

    /// Report leftovers as unexpected and step over the newline.
    fn finish_line(&mut self, issues: &mut Vec<Issue>) {
        if let Some(span) = self.consume_line() {
            issues.push(Issue::Unexpected(span));
        }
        if self.peek() == Some(&Token::Newline) {
            self.bump();
        }
    }

    /// Position of the next `Indent`, looking past blank lines.
    fn indent_ahead(&self) -> Option<usize> {
        let mut look = self.pos;
        while matches!(self.tokens.get(look), Some((Token::BlankLine, _))) {
            look += 1;
        }
        matches!(self.tokens.get(look), Some((Token::Indent, _))).then_some(look)
    }

    /// Skip an indented region and everything nested in it.
    fn skip_nested(&mut self) {
        let Some(indent) = self.indent_ahead() else {
            return;
        };
        self.pos = indent;
        let mut depth = 0usize;
        while let Some((token, _)) = self.bump() {
            match token {
                Token::Indent => depth += 1,
                Token::Dedent => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
        }
    }

    fn identifier(&mut self, issues: &mut Vec<Issue>) -> Option<Spanned<String>> {
        match self.tokens.get(self.pos) {
            Some((Token::Ident(name), span)) => {
                self.bump();
                Some(Spanned::new(name.clone(), span.clone()))
            }
            _ => {
                issues.push(Issue::Missing {
                    what: "identifier",
                    at: self.peek_start(),
                });
                None
            }
        }
    }

    fn string(&mut self, issues: &mut Vec<Issue>) -> Option<Spanned<String>> {
        match self.tokens.get(self.pos) {
            Some((Token::Str(text), span)) => {
                self.bump();
                Some(Spanned::new(text.clone(), span.clone()))
            }
            _ => {
                issues.push(Issue::Missing {
                    what: "string",
                    at: self.peek_start(),
                });
                None
            }
        }
    }

    fn expect(&mut self, token: Token, what: &'static str, issues: &mut Vec<Issue>) -> bool {
        if self.peek() == Some(&token) {
            self.bump();
            true
        } else {
            issues.push(Issue::Missing {
                what,
                at: self.peek_start(),
            });
            false
        }
    }

    /// Parse an expression running to the end of the line or to a depth-0 stop token.
    fn expression(
        &mut self,
        stop: fn(&Token) -> bool,
        issues: &mut Vec<Issue>,
    ) -> Option<Spanned<Expr>> {
        let from = self.pos;
        let mut depth = 0usize;
        while let Some(token) = self.peek() {
            if *token == Token::Newline || (depth == 0 && stop(token)) {
                break;
            }
            match token {
                Token::LParen | Token::LBrace | Token::LBracket => depth += 1,
                Token::RParen | Token::RBrace | Token::RBracket => {
                    depth = depth.saturating_sub(1)
                }
                _ => {}
            }
            self.bump();
        }

        let slice = &self.tokens[from..self.pos];
        let (Some(first), Some(last)) = (slice.first(), slice.last()) else {
            issues.push(Issue::Missing {
                what: "expression",
                at: self.peek_start(),
            });
            return None;
        };
        let span = first.1.start..last.1.end;
        match parse_expression(slice) {
            Some(expr) => Some(expr),
            None => {
                issues.push(Issue::Unexpected(span.clone()));
                Some(Spanned::new(Expr::Error, span))
            }
        }
    }

    fn when_clause(
        &mut self,
        stop: fn(&Token) -> bool,
        issues: &mut Vec<Issue>,
    ) -> Option<Spanned<Expr>> {
        if !self.peek_word("when") {
            return None;
        }
        self.bump();
        self.expression(stop, issues)
    }

    /// A required indented block after a header line.
    fn block(&mut self, context: BlockContext, issues: &mut Vec<Issue>) -> Option<Block> {
        let block = self.optional_block(context);
        if block.is_none() {
            issues.push(Issue::Missing {
                what: "block",
                at: self.last_end,
            });
        }
        block
    }

    fn optional_block(&mut self, context: BlockContext) -> Option<Block> {
        let indent = self.indent_ahead()?;
        self.pos = indent;
        let start = self.peek_start();
        self.bump();
        let items = self.block_items(context);
        let end = self.last_end.max(start);
        if self.peek() == Some(&Token::Dedent) {
            self.bump();
        }
        Some(Block { start, end, items })
    }

    // -- Statements --

    fn block_items(&mut self, context: BlockContext) -> Vec<Statement> {
        let mut items = Vec::new();
        while let Some(token) = self.peek() {
            match token {
                Token::Dedent if context == BlockContext::TopLevel => {
                    self.bump();
                }
                Token::Dedent => break,
                Token::BlankLine | Token::Newline => {
                    self.bump();
                }
                Token::IndentError => {
                    let span = self.tokens[self.pos].1.clone();
                    self.bump();
                    items.push(Statement {
                        kind: StatementKind::InconsistentIndentation,
                        span,
                        issues: Vec::new(),
                    });
                }
                Token::Indent => {
                    let start = self.peek_start();
                    self.skip_nested();
                    items.push(Statement {
                        kind: StatementKind::Error,
                        span: start..self.last_end.max(start),
                        issues: Vec::new(),
                    });
                }
                _ => items.push(self.statement(context)),
            }
        }
        items
    }

    fn head(&self) -> Option<Head> {
        let Some(Token::Ident(word)) = self.peek() else {
            return None;
        };
        if self.peek_at(1) == Some(&Token::Assign) {
            return Some(Head::Assignment);
        }
        Head::from_keyword(word)
    }

    fn statement(&mut self, context: BlockContext) -> Statement {
        let start = self.peek_start();
        let head = match self.head() {
            Some(head) if context.allows(head) => head,
            _ => return self.error_statement(start),
        };

        let mut issues = Vec::new();
        let kind = match head {
            Head::Story | Head::Scene | Head::Beat => self.declaration(head, &mut issues),
            Head::Config => {
                self.bump();
                self.expect(Token::Colon, ":", &mut issues);
                self.finish_line(&mut issues);
                StatementKind::Config(self.block(BlockContext::Config, &mut issues))
            }
            Head::Choice => {
                self.bump();
                let when = self.when_clause(is_colon, &mut issues);
                self.expect(Token::Colon, ":", &mut issues);
                self.finish_line(&mut issues);
                let block = self.block(BlockContext::Choice, &mut issues);
                StatementKind::Choice(ChoiceBlock { when, block })
            }
            Head::Option => self.option_entry(&mut issues),
            Head::Goto => {
                self.bump();
                StatementKind::Goto(self.identifier(&mut issues))
            }
            Head::End => {
                self.bump();
                StatementKind::End
            }
            Head::Return => {
                self.bump();
                StatementKind::Return
            }
            Head::Include => {
                self.bump();
                StatementKind::Include(self.string(&mut issues))
            }
            Head::When => {
                self.bump();
                StatementKind::WhenGuard(self.expression(never, &mut issues))
            }
            Head::Say => {
                self.bump();
                let speaker = self.identifier(&mut issues);
                let text = self.string(&mut issues);
                StatementKind::Say { speaker, text }
            }
            Head::Stage => {
                self.bump();
                StatementKind::Stage {
                    text: self.string(&mut issues),
                }
            }
            Head::Set => {
                self.bump();
                let state = self.identifier(&mut issues);
                self.expect(Token::Assign, "=", &mut issues);
                let value = self.expression(never, &mut issues);
                StatementKind::Set { state, value }
            }
            Head::Emit => {
                self.bump();
                let event = self.identifier(&mut issues);
                let payload = if self.peek_word("with") {
                    self.bump();
                    self.expression(never, &mut issues)
                } else {
                    None
                };
                StatementKind::Emit { event, payload }
            }
            Head::Assignment => {
                let name = self.identifier(&mut issues);
                self.bump();
                let value = self.expression(never, &mut issues);
                match name {
                    Some(name) => StatementKind::Assignment { name, value },
                    None => StatementKind::Error,
                }
            }
        };

        // Block statements already consumed their header line.
        if !matches!(
            head,
            Head::Story | Head::Scene | Head::Beat | Head::Config | Head::Choice | Head::Option
        ) {
            self.finish_line(&mut issues);
        }

        Statement {
            kind,
            span: start..self.last_end,
            issues,
        }
    }

    fn declaration(&mut self, head: Head, issues: &mut Vec<Issue>) -> StatementKind {
        self.bump();
        let name = self.identifier(issues);
        let when = if head == Head::Story {
            None
        } else {
            self.when_clause(is_colon, issues)
        };
        self.expect(Token::Colon, ":", issues);
        self.finish_line(issues);

        let context = match head {
            Head::Story => BlockContext::Story,
            Head::Scene => BlockContext::Scene,
            _ => BlockContext::Beat,
        };
        let block = self.block(context, issues);
        let decl = Declaration { name, when, block };
        match head {
            Head::Story => StatementKind::Story(decl),
            Head::Scene => StatementKind::Scene(decl),
            _ => StatementKind::Beat(decl),
        }
    }

    fn option_entry(&mut self, issues: &mut Vec<Issue>) -> StatementKind {
        self.bump();
        let label = self.string(issues);
        let when = self.when_clause(is_colon_or_goto, issues);

        let mut target = None;
        let mut block = None;
        if self.peek_word("goto") {
            self.bump();
            target = self.identifier(issues);
            self.finish_line(issues);
        } else if self.peek() == Some(&Token::Colon) {
            self.bump();
            self.finish_line(issues);
            block = self.optional_block(BlockContext::OptionBody);
        } else {
            self.finish_line(issues);
        }

        StatementKind::Option(OptionEntry {
            label,
            when,
            target,
            block,
        })
    }

    /// A statement that does not belong here: the line and any block under it.
    fn error_statement(&mut self, start: usize) -> Statement {
        self.consume_line();
        if self.peek() == Some(&Token::Newline) {
            self.bump();
        }
        self.skip_nested();
        Statement {
            kind: StatementKind::Error,
            span: start..self.last_end.max(start),
            issues: Vec::new(),
        }
    }

    // -- Metadata fence --

    fn metadata_fence(&mut self) -> MetadataFence {
        let start = self.peek_start();
        self.bump();
        let mut issues = Vec::new();
        let mut entries = Vec::new();
        self.finish_line(&mut issues);

        loop {
            match self.peek() {
                None => {
                    issues.push(Issue::Missing {
                        what: ":::",
                        at: self.eof,
                    });
                    break;
                }
                Some(Token::MetaClose) => {
                    self.bump();
                    self.finish_line(&mut issues);
                    break;
                }
                Some(
                    Token::BlankLine
                    | Token::Newline
                    | Token::Indent
                    | Token::Dedent
                    | Token::IndentError,
                ) => {
                    self.bump();
                }
                Some(token)
                    if token.is_word("story") && self.peek_at(1) != Some(&Token::Colon) =>
                {
                    issues.push(Issue::Missing {
                        what: ":::",
                        at: self.peek_start(),
                    });
                    break;
                }
                Some(Token::Ident(_)) if self.peek_at(1) == Some(&Token::Colon) => {
                    entries.push(self.metadata_entry(&mut issues));
                }
                Some(_) => self.finish_line(&mut issues),
            }
        }

        MetadataFence {
            entries,
            issues,
            span: start..self.last_end,
        }
    }

    fn metadata_entry(&mut self, issues: &mut Vec<Issue>) -> MetadataEntry {
        let key = match self.bump() {
            Some((Token::Ident(key), span)) => Spanned::new(key.clone(), span.clone()),
            _ => Spanned::new(String::new(), self.last_end..self.last_end),
        };
        self.bump();

        let from = self.pos;
        while !self.at_line_end() {
            self.bump();
        }
        let slice = &self.tokens[from..self.pos];
        let value = match (slice.first(), slice.last()) {
            (Some(first), Some(last)) => {
                let span = first.1.start..last.1.end;
                match metadata_value(slice) {
                    Some(value) => Some(Spanned::new(value, span)),
                    None => {
                        issues.push(Issue::Unexpected(span));
                        None
                    }
                }
            }
            _ => {
                issues.push(Issue::Missing {
                    what: "value",
                    at: self.peek_start(),
                });
                None
            }
        };
        self.finish_line(issues);
        MetadataEntry { key, value }
    }
}

fn metadata_value(slice: &[(Token, Span)]) -> Option<MetadataValue> {
    let star = |i: usize| matches!(slice.get(i), Some((Token::Star, _)));
    let n = slice.len();
    match slice {
        [(Token::Str(text), _)] => Some(MetadataValue::String(text.clone())),
        [(Token::Number(..), _)] => Some(MetadataValue::Number),
        [(Token::Ident(word), _)] if word == "true" || word == "false" => {
            Some(MetadataValue::Boolean)
        }
        [(Token::Ident(_), _)] => Some(MetadataValue::Identifier),
        [(Token::LBrace, _), ..] => match parse_expression(slice) {
            Some(Spanned {
                node: Expr::Object(_),
                ..
            }) => Some(MetadataValue::Object),
            _ => None,
        },
        _ if n > 4 && star(0) && star(1) && star(n - 2) && star(n - 1) => {
            let inner = &slice[2..n - 2];
            (!inner.iter().any(|(t, _)| *t == Token::Star)).then_some(MetadataValue::Strong)
        }
        _ if n > 2 && star(0) && star(n - 1) => {
            let inner = &slice[1..n - 1];
            (!inner.iter().any(|(t, _)| *t == Token::Star)).then_some(MetadataValue::Emphasis)
        }
        _ => None,
    }
}

/// Parse a token stream into a syntax tree.
///
/// Never fails: problems are recorded as [`Issue`]s, `Error` statements, and
/// `InconsistentIndentation` statements.
pub fn parse(tokens: &[(Token, Span)], source_len: usize) -> SourceFile {
    let mut parser = Parser::new(tokens, source_len);
    while parser.peek() == Some(&Token::BlankLine) {
        parser.bump();
    }
    let metadata = (parser.peek() == Some(&Token::MetaOpen)).then(|| parser.metadata_fence());
    let statements = parser.block_items(BlockContext::TopLevel);
    log::debug!("parsed {} top-level statements", statements.len());
    SourceFile {
        metadata,
        statements,
        len: source_len,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer;

    fn parse_source(source: &str) -> SourceFile {
        parse(&lexer::lex(source), source.len())
    }

    fn decl(stmt: &Statement) -> &Declaration {
        match &stmt.kind {
            StatementKind::Story(d) | StatementKind::Scene(d) | StatementKind::Beat(d) => d,
            other => panic!("expected declaration, got {other:?}"),
        }
    }

    fn items(stmt: &Statement) -> &[Statement] {
        stmt.block().map(|b| b.items.as_slice()).unwrap_or_default()
    }

    #[test]
    fn parse_nested_declarations() {
        let file = parse_source("story s:\n  scene a:\n    beat x:\n      say n \"hi\"\n      end\n");
        assert_eq!(file.statements.len(), 1);
        let story = &file.statements[0];
        assert_eq!(decl(story).name.as_ref().map(|n| n.node.as_str()), Some("s"));
        let scene = &items(story)[0];
        let beat = &items(scene)[0];
        assert_eq!(decl(beat).name.as_ref().map(|n| n.span.clone()), Some(29..30));

        let actions = items(beat);
        assert!(matches!(
            &actions[0].kind,
            StatementKind::Say { speaker: Some(s), text: Some(t) } if s.node == "n" && t.node == "hi"
        ));
        assert_eq!(actions[1].kind, StatementKind::End);
        assert!(story.issues.is_empty());
    }

    #[test]
    fn statement_span_ends_at_last_token() {
        let source = "story s:\n  scene a:\n    beat x:\n      end\n\n\n";
        let file = parse_source(source);
        assert_eq!(file.statements[0].span, 0..source.trim_end().len());
    }

    #[test]
    fn block_markers_surround_body() {
        let source = "beat x:\n  say n \"a\"\n  end\nbeat y:\n  end\n";
        let file = parse_source(source);
        let block = file.statements[0].block().unwrap();
        assert_eq!(&source[block.start..block.end], "say n \"a\"\n  end");
    }

    #[test]
    fn headers_with_when_clauses() {
        let file = parse_source("scene a when gold > 3 and (x or y):\n  end\n");
        let when = decl(&file.statements[0]).when.clone().unwrap();
        assert!(matches!(when.node, Expr::Binary { op: BinaryOp::And, .. }));
        assert_eq!(when.span, 13..34);
    }

    #[test]
    fn option_forms() {
        let file = parse_source(
            "beat b:\n  choice when c:\n    option \"Go\" when d goto x\n    option \"Stay\":\n      say n \"ok\"\n    option \"Nothing\"\n",
        );
        let choice = &items(&file.statements[0])[0];
        let StatementKind::Choice(block) = &choice.kind else {
            panic!("expected choice");
        };
        assert!(block.when.is_some());
        let options: Vec<&OptionEntry> = items(choice)
            .iter()
            .map(|s| match &s.kind {
                StatementKind::Option(o) => o,
                other => panic!("expected option, got {other:?}"),
            })
            .collect();
        assert_eq!(options.len(), 3);
        assert_eq!(options[0].target.as_ref().map(|t| t.node.as_str()), Some("x"));
        assert!(options[0].when.is_some());
        assert_eq!(options[1].block.as_ref().map(|b| b.items.len()), Some(1));
        assert!(options[2].target.is_none() && options[2].block.is_none());
        assert!(items(choice).iter().all(|s| s.issues.is_empty()));
    }

    #[test]
    fn missing_segments() {
        let file = parse_source("beat:\n  say \"hi\"\n  set x\n");
        let beat = &file.statements[0];
        assert_eq!(
            beat.issues,
            vec![Issue::Missing {
                what: "identifier",
                at: 4
            }]
        );
        let body = items(beat);
        assert_eq!(
            body[0].issues,
            vec![Issue::Missing {
                what: "identifier",
                at: 12
            }]
        );
        let whats: Vec<_> = body[1]
            .issues
            .iter()
            .map(|i| match i {
                Issue::Missing { what, .. } => *what,
                Issue::Unexpected(_) => "unexpected",
            })
            .collect();
        assert_eq!(whats, vec!["=", "expression"]);
    }

    #[test]
    fn missing_block_and_colon() {
        let file = parse_source("story s\nscene a:\n");
        let whats: Vec<_> = file
            .statements
            .iter()
            .flat_map(|s| s.issues.iter())
            .map(|i| match i {
                Issue::Missing { what, .. } => *what,
                Issue::Unexpected(_) => "unexpected",
            })
            .collect();
        assert_eq!(whats, vec![":", "block", "block"]);
    }

    #[test]
    fn statement_in_wrong_block_is_an_error() {
        let file = parse_source("story s:\n  say n \"x\"\n  scene a:\n    beat b:\n      end\n");
        let story = items(&file.statements[0]);
        assert_eq!(story[0].kind, StatementKind::Error);
        assert_eq!(story[0].span, 11..20);
        assert!(matches!(story[1].kind, StatementKind::Scene(_)));
    }

    #[test]
    fn error_statement_swallows_its_block() {
        let file = parse_source("bogus thing:\n  say n \"x\"\nstory s:\n  scene a:\n    beat b:\n      end\n");
        assert_eq!(file.statements.len(), 2);
        assert_eq!(file.statements[0].kind, StatementKind::Error);
        assert_eq!(file.statements[0].span, 0..24);
    }

    #[test]
    fn trailing_tokens_are_unexpected() {
        let file = parse_source("beat b:\n  end now\n");
        let end = &items(&file.statements[0])[0];
        assert_eq!(end.kind, StatementKind::End);
        assert_eq!(end.issues, vec![Issue::Unexpected(14..17)]);
    }

    #[test]
    fn bad_expression_keeps_statement() {
        let file = parse_source("beat b:\n  set x = 1 +\n");
        let set = &items(&file.statements[0])[0];
        assert!(matches!(&set.kind, StatementKind::Set { value: Some(v), .. } if v.node == Expr::Error));
        assert_eq!(set.issues, vec![Issue::Unexpected(18..21)]);
    }

    #[test]
    fn inconsistent_indentation_statement() {
        let file = parse_source("beat b:\n    say n \"1\"\n  end\n");
        assert!(
            file.statements
                .iter()
                .any(|s| s.kind == StatementKind::InconsistentIndentation)
        );
        // `end` lands at the top level after recovery
        assert!(file.statements.iter().any(|s| s.kind == StatementKind::End));
    }

    #[test]
    fn metadata_fence_values() {
        let file = parse_source(
            ":::meta\nid: \"new-story\"\nversion: 1\ntitle: **Bold**\ntone: *soft*\nextra: { a: 1 }\nflag: true\nkind: draft\n:::\n\nstory s:\n  scene a:\n    beat b:\n      end\n",
        );
        let fence = file.metadata.unwrap();
        assert!(fence.issues.is_empty(), "{:?}", fence.issues);
        let values: Vec<_> = fence
            .entries
            .iter()
            .map(|e| e.value.as_ref().map(|v| v.node.clone()))
            .collect();
        assert_eq!(
            values,
            vec![
                Some(MetadataValue::String("new-story".into())),
                Some(MetadataValue::Number),
                Some(MetadataValue::Strong),
                Some(MetadataValue::Emphasis),
                Some(MetadataValue::Object),
                Some(MetadataValue::Boolean),
                Some(MetadataValue::Identifier),
            ]
        );
        assert_eq!(file.statements.len(), 1);
    }

    #[test]
    fn unclosed_fence_stops_at_story() {
        let file = parse_source(":::meta\nid: x\nstory s:\n  scene a:\n    beat b:\n      end\n");
        let fence = file.metadata.unwrap();
        assert_eq!(
            fence.issues,
            vec![Issue::Missing {
                what: ":::",
                at: 14
            }]
        );
        assert_eq!(file.statements.len(), 1);
    }

    #[test]
    fn config_block_with_assignments() {
        let file = parse_source("story s:\n  config:\n    starting_scene = opening\n");
        let config = &items(&file.statements[0])[0];
        assert!(matches!(config.kind, StatementKind::Config(Some(_))));
        assert!(matches!(
            &items(config)[0].kind,
            StatementKind::Assignment { name, value: Some(_) } if name.node == "starting_scene"
        ));
    }

    #[test]
    fn empty_input() {
        let file = parse_source("");
        assert!(file.metadata.is_none());
        assert!(file.statements.is_empty());
    }
}
