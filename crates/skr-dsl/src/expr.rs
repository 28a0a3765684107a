use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::ast::{BinaryOp, Expr, Spanned, UnaryOp};
use crate::lexer::Token;

type Span = SimpleSpan;

/// Words that never parse as a bare identifier inside an expression.
const RESERVED: &[&str] = &["and", "or", "not", "true", "false"];

/// Deepest bracket and prefix-operator nesting an expression may use.
pub const MAX_NESTING: usize = 256;

fn spanned<T>(node: T, span: Span) -> Spanned<T> {
    Spanned::new(node, span.into_range())
}

fn fold_binary(lhs: Spanned<Expr>, (op, rhs): (BinaryOp, Spanned<Expr>)) -> Spanned<Expr> {
    let span = lhs.span.start..rhs.span.end;
    Spanned::new(
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        },
        span,
    )
}

/// Build the expression parser.
///
/// Precedence from loosest to tightest: `or`, `and`, equality, comparison,
/// additive, multiplicative, unary. All binary levels are left-associative.
fn expression_parser<'a, I>()
-> impl Parser<'a, I, Spanned<Expr>, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = Span>,
{
    let kw = |k: &'static str| select! { Token::Ident(ref w) if w.as_str() == k => () }.labelled(k);

    recursive(|expr| {
        let ident = select! {
            Token::Ident(ref w) if !RESERVED.contains(&w.as_str()) => w.clone()
        }
        .labelled("identifier");
        let string = select! { Token::Str(s) => s }.labelled("string");

        let literal = choice((
            string.clone().map(Expr::String),
            select! { Token::Number(n, _) => Expr::Number(n) }.labelled("number"),
            kw("true").to(Expr::Boolean(true)),
            kw("false").to(Expr::Boolean(false)),
            ident.clone().map(Expr::Identifier),
        ));

        let group = expr
            .clone()
            .delimited_by(just(Token::LParen), just(Token::RParen))
            .map(|inner| Expr::Group(Box::new(inner)));

        let pair = ident
            .or(string)
            .map_with(|key, e| spanned(key, e.span()))
            .then_ignore(just(Token::Colon))
            .then(expr.clone());
        let object = pair
            .separated_by(just(Token::Comma))
            .allow_trailing()
            .collect::<Vec<_>>()
            .delimited_by(just(Token::LBrace), just(Token::RBrace))
            .map(Expr::Object);

        let array = expr
            .clone()
            .separated_by(just(Token::Comma))
            .allow_trailing()
            .collect::<Vec<_>>()
            .delimited_by(just(Token::LBracket), just(Token::RBracket))
            .map(Expr::Array);

        let atom = choice((literal, group, object, array))
            .map_with(|node, e| spanned(node, e.span()))
            .labelled("expression");

        let unary = recursive(|unary| {
            choice((
                kw("not").to(UnaryOp::Not),
                just(Token::Minus).to(UnaryOp::Neg),
                just(Token::Plus).to(UnaryOp::Plus),
            ))
            .then(unary)
            .map_with(|(op, operand), e| {
                spanned(
                    Expr::Unary {
                        op,
                        operand: Box::new(operand),
                    },
                    e.span(),
                )
            })
            .or(atom)
        });

        let product = unary.clone().foldl(
            choice((
                just(Token::Star).to(BinaryOp::Mul),
                just(Token::Slash).to(BinaryOp::Div),
                just(Token::Percent).to(BinaryOp::Rem),
            ))
            .then(unary)
            .repeated(),
            fold_binary,
        );

        let sum = product.clone().foldl(
            choice((
                just(Token::Plus).to(BinaryOp::Add),
                just(Token::Minus).to(BinaryOp::Sub),
            ))
            .then(product)
            .repeated(),
            fold_binary,
        );

        let comparison = sum.clone().foldl(
            choice((
                just(Token::Lt).to(BinaryOp::Lt),
                just(Token::Le).to(BinaryOp::Le),
                just(Token::Gt).to(BinaryOp::Gt),
                just(Token::Ge).to(BinaryOp::Ge),
            ))
            .then(sum)
            .repeated(),
            fold_binary,
        );

        let equality = comparison.clone().foldl(
            choice((
                just(Token::EqEq).to(BinaryOp::Eq),
                just(Token::NotEq).to(BinaryOp::NotEq),
            ))
            .then(comparison)
            .repeated(),
            fold_binary,
        );

        let conjunction = equality.clone().foldl(
            kw("and").to(BinaryOp::And).then(equality).repeated(),
            fold_binary,
        );

        conjunction.clone().foldl(
            kw("or").to(BinaryOp::Or).then(conjunction).repeated(),
            fold_binary,
        )
    })
}

/// How deeply the grammar would recurse on these tokens.
///
/// Every open bracket and every prefix operator adds a level. A level opened
/// by a prefix operator closes with its operand; a bracket level closes with
/// its matching bracket.
fn nesting(tokens: &[(Token, std::ops::Range<usize>)]) -> usize {
    let mut bases = vec![0usize];
    let mut depth = 0usize;
    let mut deepest = 0usize;
    let mut expect_operand = true;
    for (token, _) in tokens {
        let base = bases.last().copied().unwrap_or(0);
        match token {
            Token::LParen | Token::LBrace | Token::LBracket => {
                depth += 1;
                bases.push(depth);
                expect_operand = true;
            }
            Token::RParen | Token::RBrace | Token::RBracket => {
                if bases.len() > 1 {
                    bases.pop();
                }
                depth = bases.last().copied().unwrap_or(0);
                expect_operand = false;
            }
            Token::Minus | Token::Plus if expect_operand => depth += 1,
            Token::Ident(w) if w == "not" => {
                depth += 1;
                expect_operand = true;
            }
            Token::Ident(w) if w == "and" || w == "or" => {
                depth = base;
                expect_operand = true;
            }
            Token::Str(_) | Token::Number(..) | Token::Ident(_) => {
                depth = base;
                expect_operand = false;
            }
            _ => {
                depth = base;
                expect_operand = true;
            }
        }
        deepest = deepest.max(depth);
    }
    deepest
}

/// Parse a complete expression from a token slice.
///
/// Returns `None` when the tokens do not form exactly one expression, or
/// nest deeper than [`MAX_NESTING`].
pub fn parse_expression(tokens: &[(Token, std::ops::Range<usize>)]) -> Option<Spanned<Expr>> {
    if nesting(tokens) > MAX_NESTING {
        return None;
    }
    let token_iter = tokens
        .iter()
        .map(|(tok, span)| (tok.clone(), Span::from(span.clone())));

    let len = tokens.last().map_or(0, |(_, s)| s.end);
    let eoi: Span = (len..len).into();
    let stream = Stream::from_iter(token_iter).map(eoi, |(t, s): (_, _)| (t, s));

    let (output, errors) = expression_parser()
        .then_ignore(end())
        .parse(stream)
        .into_output_errors();

    if errors.is_empty() { output } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer;

    fn parse(source: &str) -> Option<Spanned<Expr>> {
        let tokens: Vec<_> = lexer::lex(source)
            .into_iter()
            .filter(|(t, _)| !t.is_layout())
            .collect();
        parse_expression(&tokens)
    }

    fn op_of(expr: &Spanned<Expr>) -> Option<BinaryOp> {
        match &expr.node {
            Expr::Binary { op, .. } => Some(*op),
            _ => None,
        }
    }

    #[test]
    fn or_binds_looser_than_and() {
        let expr = parse("a or b and c").unwrap();
        assert_eq!(op_of(&expr), Some(BinaryOp::Or));
        let Expr::Binary { rhs, .. } = &expr.node else {
            panic!("expected binary");
        };
        assert_eq!(op_of(rhs), Some(BinaryOp::And));
    }

    #[test]
    fn arithmetic_precedence() {
        let expr = parse("1 + 2 * 3 >= 4").unwrap();
        assert_eq!(op_of(&expr), Some(BinaryOp::Ge));
        let Expr::Binary { lhs, .. } = &expr.node else {
            panic!("expected binary");
        };
        assert_eq!(op_of(lhs), Some(BinaryOp::Add));
    }

    #[test]
    fn binary_operators_are_left_associative() {
        let expr = parse("a - b - c").unwrap();
        let Expr::Binary { lhs, rhs, .. } = &expr.node else {
            panic!("expected binary");
        };
        assert_eq!(op_of(lhs), Some(BinaryOp::Sub));
        assert_eq!(rhs.node, Expr::Identifier("c".into()));
    }

    #[test]
    fn unary_binds_tightest() {
        let expr = parse("not ready == false").unwrap();
        assert_eq!(op_of(&expr), Some(BinaryOp::Eq));
        let Expr::Binary { lhs, .. } = &expr.node else {
            panic!("expected binary");
        };
        assert!(matches!(lhs.node, Expr::Unary { op: UnaryOp::Not, .. }));
    }

    #[test]
    fn spans_cover_operands() {
        let expr = parse("gold + 10").unwrap();
        assert_eq!(expr.span, 0..9);
    }

    #[test]
    fn object_and_array_literals() {
        let expr = parse(r#"{ mood: "calm", "n": [1, -2,], }"#).unwrap();
        let Expr::Object(pairs) = &expr.node else {
            panic!("expected object");
        };
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[1].0.node, "n");
        assert!(matches!(&pairs[1].1.node, Expr::Array(items) if items.len() == 2));
    }

    #[test]
    fn groups() {
        let expr = parse("(a or b) and c").unwrap();
        assert_eq!(op_of(&expr), Some(BinaryOp::And));
    }

    #[test]
    fn rejects_incomplete_input() {
        assert!(parse("1 +").is_none());
        assert!(parse("and").is_none());
        assert!(parse("a b").is_none());
        assert!(parse("").is_none());
        assert!(parse("{ a: }").is_none());
    }

    #[test]
    fn nesting_is_bounded() {
        let deep = |open: &str, close: &str, n: usize| {
            format!("{}x{}", open.repeat(n), close.repeat(n))
        };
        assert!(parse(&deep("(", ")", MAX_NESTING)).is_some());
        assert!(parse(&deep("(", ")", MAX_NESTING + 1)).is_none());
        assert!(parse(&deep("not ", "", MAX_NESTING)).is_some());
        assert!(parse(&deep("not ", "", 20_000)).is_none());
        assert!(parse(&deep("[", "]", 20_000)).is_none());
        assert!(parse(&deep("- (", ")", 20_000)).is_none());
    }

    #[test]
    fn long_flat_chains_are_not_nesting() {
        let chain = vec!["a"; 1_000].join(" - ");
        assert!(parse(&chain).is_some());
        let guards = vec!["ready"; 1_000].join(" and ");
        assert!(parse(&guards).is_some());
    }
}
