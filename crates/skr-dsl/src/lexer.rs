use logos::Logos;
use std::fmt;
use std::ops::Range;

/// Byte span of a token.
pub type Span = Range<usize>;

/// Token type for the Skroll DSL.
///
/// Keywords are plain identifiers; the parser decides what they mean.
/// Layout tokens (`Newline`, `Indent`, `Dedent`, `BlankLine`, `IndentError`) are
/// synthesized by the indentation pass after raw lexing.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// End of a line that carried at least one token.
    Newline,
    /// The following line is indented deeper than the current block.
    Indent,
    /// One enclosing block was closed.
    Dedent,
    /// An empty or comment-only line.
    BlankLine,
    /// A line whose indentation matches no open block.
    IndentError,
    /// `:::meta`
    MetaOpen,
    /// `:::`
    MetaClose,
    /// `:`
    Colon,
    /// `,`
    Comma,
    /// `=`
    Assign,
    /// `==`
    EqEq,
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
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// Double-quoted string literal, escapes resolved.
    Str(String),
    /// Number literal: parsed value and source text.
    Number(f64, String),
    /// Identifier or keyword.
    Ident(String),
    /// Input the lexer could not recognize.
    Unknown(String),
}

impl Token {
    /// Returns `true` for tokens synthesized by the indentation pass.
    pub fn is_layout(&self) -> bool {
        matches!(
            self,
            Token::Newline | Token::Indent | Token::Dedent | Token::BlankLine | Token::IndentError
        )
    }

    /// Returns `true` if this is the identifier `word`.
    pub fn is_word(&self, word: &str) -> bool {
        matches!(self, Token::Ident(w) if w == word)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Newline => write!(f, "newline"),
            Token::Indent => write!(f, "indent"),
            Token::Dedent => write!(f, "dedent"),
            Token::BlankLine => write!(f, "blank line"),
            Token::IndentError => write!(f, "indentation error"),
            Token::MetaOpen => write!(f, ":::meta"),
            Token::MetaClose => write!(f, ":::"),
            Token::Colon => write!(f, ":"),
            Token::Comma => write!(f, ","),
            Token::Assign => write!(f, "="),
            Token::EqEq => write!(f, "=="),
            Token::NotEq => write!(f, "!="),
            Token::Lt => write!(f, "<"),
            Token::Le => write!(f, "<="),
            Token::Gt => write!(f, ">"),
            Token::Ge => write!(f, ">="),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Percent => write!(f, "%"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::Str(s) => write!(f, "\"{s}\""),
            Token::Number(_, s) => write!(f, "{s}"),
            Token::Ident(w) => write!(f, "{w}"),
            Token::Unknown(s) => write!(f, "{s}"),
        }
    }
}

/// Internal logos token. Converted to owned `Token` after lexing.
#[derive(Logos, Debug)]
#[logos(skip r"[ \t\r\f\u{00A0}\u{FEFF}]+")]
#[logos(skip r"//[^\n]*")]
enum RawToken {
    #[token("\n")]
    Newline,

    /// Start of a `/* ... */` comment; the lexer scans to the close.
    #[token("/*")]
    BlockComment,

    #[token(":::meta")]
    MetaOpen,

    #[token(":::")]
    MetaClose,

    #[token(":")]
    Colon,

    #[token(",")]
    Comma,

    #[token("=")]
    Assign,

    #[token("==")]
    EqEq,

    #[token("!=")]
    NotEq,

    #[token("<")]
    Lt,

    #[token("<=")]
    Le,

    #[token(">")]
    Gt,

    #[token(">=")]
    Ge,

    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    #[token("%")]
    Percent,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[regex(r#""([^"\\\n\r]|\\[^\n\r])*""#)]
    Str,

    #[regex(r#""([^"\\\n\r]|\\[^\n\r])*"#)]
    UnterminatedStr,

    #[regex(r"(0|[1-9][0-9]*)(\.[0-9]+)?")]
    Number,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,
}

/// Lex source code into `(Token, Span)` pairs, including layout tokens.
///
/// Uses the default tab width of 8.
pub fn lex(source: &str) -> Vec<(Token, Span)> {
    lex_with_tab_width(source, 8)
}

/// Lex source code with an explicit tab width for indentation.
///
/// Lexing never fails: unrecognized input becomes [`Token::Unknown`].
pub fn lex_with_tab_width(source: &str, tab_width: usize) -> Vec<(Token, Span)> {
    let raw = lex_raw(source);
    let tokens = Layout::new(source, tab_width.max(1)).apply(raw);
    log::debug!("lexed {} tokens", tokens.len());
    tokens
}

fn lex_raw(source: &str) -> Vec<(Token, Span)> {
    let mut tokens = Vec::new();
    let mut lexer = RawToken::lexer(source);

    while let Some(result) = lexer.next() {
        if matches!(result, Ok(RawToken::BlockComment)) {
            match lexer.remainder().find("*/") {
                Some(close) => {
                    lexer.bump(close + 2);
                    continue;
                }
                None => {
                    lexer.bump(lexer.remainder().len());
                    tokens.push((Token::Unknown(lexer.slice().to_string()), lexer.span()));
                    continue;
                }
            }
        }
        let span = lexer.span();
        let token = match result {
            Ok(raw) => match raw {
                RawToken::Newline => Token::Newline,
                RawToken::BlockComment => continue,
                RawToken::MetaOpen => Token::MetaOpen,
                RawToken::MetaClose => Token::MetaClose,
                RawToken::Colon => Token::Colon,
                RawToken::Comma => Token::Comma,
                RawToken::Assign => Token::Assign,
                RawToken::EqEq => Token::EqEq,
                RawToken::NotEq => Token::NotEq,
                RawToken::Lt => Token::Lt,
                RawToken::Le => Token::Le,
                RawToken::Gt => Token::Gt,
                RawToken::Ge => Token::Ge,
                RawToken::Plus => Token::Plus,
                RawToken::Minus => Token::Minus,
                RawToken::Star => Token::Star,
                RawToken::Slash => Token::Slash,
                RawToken::Percent => Token::Percent,
                RawToken::LParen => Token::LParen,
                RawToken::RParen => Token::RParen,
                RawToken::LBrace => Token::LBrace,
                RawToken::RBrace => Token::RBrace,
                RawToken::LBracket => Token::LBracket,
                RawToken::RBracket => Token::RBracket,
                RawToken::Str => {
                    let slice = lexer.slice();
                    Token::Str(unescape(&slice[1..slice.len() - 1]))
                }
                RawToken::UnterminatedStr => Token::Unknown(lexer.slice().to_string()),
                RawToken::Number => {
                    let text = lexer.slice().to_string();
                    match text.parse::<f64>() {
                        Ok(n) => Token::Number(n, text),
                        Err(_) => Token::Unknown(text),
                    }
                }
                RawToken::Ident => Token::Ident(lexer.slice().to_string()),
            },
            Err(()) => Token::Unknown(lexer.slice().to_string()),
        };
        tokens.push((token, span));
    }

    tokens
}

/// The indentation pass: turns raw newlines into layout tokens.
///
/// Layout tokens that introduce a line (`BlankLine`, `Indent`, `Dedent`,
/// `IndentError`) are placed at the first token of that line. `IndentError`
/// spans the offending leading whitespace.
struct Layout<'a> {
    source: &'a str,
    tab_width: usize,
    stack: Vec<usize>,
    out: Vec<(Token, Span)>,
    blanks: Vec<Span>,
}

impl<'a> Layout<'a> {
    fn new(source: &'a str, tab_width: usize) -> Self {
        Self {
            source,
            tab_width,
            stack: vec![0],
            out: Vec::new(),
            blanks: Vec::new(),
        }
    }

    fn apply(mut self, raw: Vec<(Token, Span)>) -> Vec<(Token, Span)> {
        let mut line: Vec<(Token, Span)> = Vec::new();
        for (token, span) in raw {
            if token == Token::Newline {
                self.finish_line(std::mem::take(&mut line), span);
            } else {
                line.push((token, span));
            }
        }
        let end = self.source.len();
        if !line.is_empty() {
            self.finish_line(line, end..end);
        }
        self.flush_blanks();
        while self.stack.len() > 1 {
            self.stack.pop();
            self.out.push((Token::Dedent, end..end));
        }
        self.out
    }

    fn finish_line(&mut self, line: Vec<(Token, Span)>, newline: Span) {
        let Some(first) = line.first().map(|(_, span)| span.start) else {
            self.blanks.push(newline);
            return;
        };
        self.flush_blanks();

        let line_start = self.source[..first].rfind('\n').map_or(0, |i| i + 1);
        let width = self.indent_width(line_start);
        let at = first..first;
        let top = self.stack.last().copied().unwrap_or(0);

        if width > top {
            self.stack.push(width);
            self.out.push((Token::Indent, at));
        } else if width < top {
            while self.stack.last().is_some_and(|&level| level > width) {
                self.stack.pop();
                self.out.push((Token::Dedent, at.clone()));
            }
            if self.stack.last().is_some_and(|&level| level != width) {
                self.out.push((Token::IndentError, line_start..first));
            }
        }

        self.out.extend(line);
        self.out.push((Token::Newline, newline));
    }

    fn flush_blanks(&mut self) {
        for span in self.blanks.drain(..) {
            self.out.push((Token::BlankLine, span));
        }
    }

    /// Width of the leading whitespace of the line starting at `line_start`.
    fn indent_width(&self, line_start: usize) -> usize {
        let mut width = 0;
        for c in self.source[line_start..].chars() {
            match c {
                ' ' | '\u{00A0}' | '\u{000C}' => width += 1,
                '\t' => width += self.tab_width - (width % self.tab_width),
                '\r' | '\u{FEFF}' => {}
                _ => break,
            }
        }
        width
    }
}

/// Process escape sequences in a string literal.
///
/// Supports `\\`, `\n`, `\t`, `\"`. Unknown sequences are kept as-is.
pub(crate) fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('\\') => out.push('\\'),
                Some('"') => out.push('"'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<String> {
        lex(source).iter().map(|(t, _)| t.to_string()).collect()
    }

    #[test]
    fn lex_story_header() {
        assert_eq!(kinds("story s:"), vec!["story", "s", ":", "newline"]);
    }

    #[test]
    fn indent_and_dedent() {
        let tokens = kinds("a:\n  b\nc\n");
        assert_eq!(
            tokens,
            vec!["a", ":", "newline", "indent", "b", "newline", "dedent", "c", "newline"]
        );
    }

    #[test]
    fn dedents_close_every_open_level_at_eof() {
        let tokens = kinds("a:\n  b:\n    c");
        assert_eq!(
            &tokens[tokens.len() - 3..],
            &["newline", "dedent", "dedent"]
        );
    }

    #[test]
    fn multiple_dedents_on_one_line() {
        let tokens = kinds("a:\n  b:\n    c\nd\n");
        let dedents = tokens.iter().filter(|t| *t == "dedent").count();
        assert_eq!(dedents, 2);
        assert_eq!(tokens.last().map(String::as_str), Some("newline"));
    }

    #[test]
    fn blank_lines_come_before_dedent() {
        let tokens = kinds("a:\n  b\n\n   \nc\n");
        assert_eq!(
            tokens,
            vec![
                "a",
                ":",
                "newline",
                "indent",
                "b",
                "newline",
                "blank line",
                "blank line",
                "dedent",
                "c",
                "newline"
            ]
        );
    }

    #[test]
    fn comments_do_not_affect_indentation() {
        let tokens = kinds("a:\n  b\n// note\n  /* block\ncomment */\n  c\n");
        assert_eq!(
            tokens,
            vec![
                "a",
                ":",
                "newline",
                "indent",
                "b",
                "newline",
                "blank line",
                "blank line",
                "c",
                "newline",
                "dedent"
            ]
        );
    }

    #[test]
    fn mismatched_dedent_is_an_error() {
        let source = "a:\n    b\n  c\n";
        let tokens = lex(source);
        let error = tokens
            .iter()
            .find(|(t, _)| *t == Token::IndentError)
            .map(|(_, span)| span.clone());
        assert_eq!(error, Some(9..11));
        // after popping the deeper level we continue at the top level
        let kinds: Vec<_> = tokens.iter().map(|(t, _)| t.to_string()).collect();
        assert_eq!(
            kinds,
            vec![
                "a",
                ":",
                "newline",
                "indent",
                "b",
                "newline",
                "dedent",
                "indentation error",
                "c",
                "newline"
            ]
        );
    }

    #[test]
    fn tabs_advance_to_tab_stops() {
        // a tab and eight spaces are the same level
        let tokens = kinds("a:\n\tb\n        c\n");
        assert_eq!(tokens.iter().filter(|t| *t == "indent").count(), 1);
        assert!(!tokens.contains(&"indentation error".to_string()));

        let narrow = lex_with_tab_width("a:\n\tb\n    c\n", 4);
        assert!(!narrow.iter().any(|(t, _)| *t == Token::IndentError));
    }

    #[test]
    fn carriage_returns_are_ignored() {
        assert_eq!(
            kinds("a:\r\n  b\r\n"),
            vec!["a", ":", "newline", "indent", "b", "newline", "dedent"]
        );
    }

    #[test]
    fn byte_order_mark_is_not_indentation() {
        assert_eq!(kinds("\u{FEFF}story s:"), vec!["story", "s", ":", "newline"]);
    }

    #[test]
    fn layout_tokens_are_zero_width_at_line_start() {
        let tokens = lex("a:\n  b\n");
        assert_eq!(tokens[3], (Token::Indent, 5..5));
        assert_eq!(tokens.last(), Some(&(Token::Dedent, 7..7)));
    }

    #[test]
    fn operators_and_fences() {
        assert_eq!(
            kinds(":::meta\n:::\nx <= 1 != 2 == 3 >= 4 % 2"),
            vec![
                ":::meta", "newline", ":::", "newline", "x", "<=", "1", "!=", "2", "==", "3",
                ">=", "4", "%", "2", "newline"
            ]
        );
    }

    #[test]
    fn numbers_keep_their_text() {
        let tokens = lex("3.50");
        assert!(matches!(&tokens[0].0, Token::Number(n, s) if (*n - 3.5).abs() < f64::EPSILON && s == "3.50"));
    }

    #[test]
    fn unknown_characters_are_tokens() {
        let tokens = lex("say @ \"x\"");
        assert_eq!(tokens[1], (Token::Unknown("@".into()), 4..5));
    }

    #[test]
    fn unterminated_string_is_unknown() {
        let tokens = lex("stage \"oops\nend");
        assert!(matches!(&tokens[1].0, Token::Unknown(s) if s == "\"oops"));
        assert!(tokens.iter().any(|(t, _)| t.is_word("end")));
    }

    #[test]
    fn block_comment_inside_a_line() {
        assert_eq!(kinds("a /* x * y / z */ b"), vec!["a", "b", "newline"]);
        assert_eq!(kinds("a /**/ b /***/"), vec!["a", "b", "newline"]);
    }

    #[test]
    fn unterminated_block_comment_is_unknown() {
        let tokens = lex("a\n/* never\nclosed");
        assert_eq!(
            tokens[2],
            (Token::Unknown("/* never\nclosed".into()), 2..17)
        );
    }

    #[test]
    fn lex_string_with_escapes() {
        let tokens = lex(r#""line1\nline2 \"q\"""#);
        assert!(matches!(&tokens[0].0, Token::Str(s) if s == "line1\nline2 \"q\""));
    }

    #[test]
    fn unescape_unknown_kept() {
        assert_eq!(unescape(r"\x"), "\\x");
        assert_eq!(unescape("trail\\"), "trail\\");
    }
}
