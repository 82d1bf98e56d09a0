//! Concrete syntax for STL/MTL formulas
//!
//! The grammar accepts what [`Formula`]'s `Display` implementation prints,
//! plus the usual ASCII and unicode spellings of the connectives, so any
//! printed formula parses back to an equal tree. Names that would re-lex as
//! keywords (or that are not plain identifiers at all) print quoted, and the
//! lexer strips the quotes again. Conjunction and disjunction chains fold
//! through the flattening n-ary builders.

mod lexer;

use chumsky::prelude::*;
use itertools::Itertools;
use lexer::{lexer, Span, Token};

use crate::ast::{
    alw, bot, env, iff, implies, neg, top, until, xor, AtomicPred, Formula, Interval, LinEq,
    Ordering, Scalar, Term,
};
use crate::StlResult;

/// Print a variable, predicate, or parameter name into the grammar.
///
/// Plain identifiers print bare; anything the lexer would not hand back
/// unchanged (keywords, names with spaces or leading digits) prints quoted.
pub(crate) fn fmt_ident(name: &str, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    if ident_is_plain(name) {
        write!(f, "{}", name)
    } else {
        write!(f, "\"{}\"", name)
    }
}

fn ident_is_plain(name: &str) -> bool {
    let mut chars = name.chars();
    let head_ok = chars
        .next()
        .map_or(false, |c| c.is_ascii_alphabetic() || c == '_');
    head_ok
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !lexer::is_keyword(name)
}

type ParserInput<'tokens, 'src> =
    chumsky::input::SpannedInput<Token<'src>, Span, &'tokens [(Token<'src>, Span)]>;
type ParseError<'tokens, 'src> = extra::Err<Rich<'tokens, Token<'src>, Span>>;

fn parser<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, Formula, ParseError<'tokens, 'src>> {
    let num = select! { Token::Num(val) => val }.labelled("number");
    let ident = select! { Token::Ident(name) => name }.labelled("identifier");

    let signed_num = just(Token::Minus)
        .or_not()
        .then(num)
        .map(|(minus, val)| if minus.is_some() { -val } else { val });

    let scalar = choice((
        signed_num.map(Scalar::Num),
        ident.map(|name| Scalar::Param(name.to_owned())),
    ))
    .labelled("scalar");

    let interval = scalar
        .clone()
        .then_ignore(just(Token::Comma))
        .then(scalar.clone())
        .delimited_by(just(Token::LBracket), just(Token::RBracket))
        .map(|(lo, hi)| Interval { lo, hi })
        .labelled("interval");

    // `2*x`, `-y`, or a bare variable with an implicit unit coefficient.
    let term = just(Token::Minus)
        .or_not()
        .then(num.then_ignore(just(Token::Times)).or_not())
        .then(ident)
        .map(|((minus, coeff), name)| {
            let coeff = coeff.unwrap_or(1.0);
            Term::new(if minus.is_some() { -coeff } else { coeff }, name)
        })
        .labelled("term");

    let sign = choice((just(Token::Plus).to(1.0), just(Token::Minus).to(-1.0)));
    let terms = term.clone().map(|t| vec![t]).foldl(
        sign.then(term).repeated(),
        |mut terms, (sign, mut term)| {
            term.coeff *= sign;
            terms.push(term);
            terms
        },
    );

    let cmp = select! {
        Token::Lt => Ordering::less_than(),
        Token::Le => Ordering::less_than_eq(),
        Token::Gt => Ordering::greater_than(),
        Token::Ge => Ordering::greater_than_eq(),
        Token::Eq => Ordering::equal(),
    }
    .labelled("comparison");

    let lineq = terms
        .then(cmp)
        .then(scalar)
        .map(|((terms, op), constant)| Formula::from(LinEq { terms, op, constant }))
        .labelled("linear inequality");

    recursive(|formula| {
        let atom = choice((
            select! {
                Token::Bool(true) => top(),
                Token::Bool(false) => bot(),
            },
            lineq,
            ident.map(|name| Formula::from(AtomicPred { name: name.to_owned() })),
            formula.delimited_by(just(Token::LParen), just(Token::RParen)),
        ))
        .labelled("atom");

        let unary = recursive(|unary| {
            choice((
                just(Token::Not).ignore_then(unary.clone()).map(neg),
                just(Token::Eventually)
                    .ignore_then(interval.clone())
                    .then(unary.clone())
                    .map(|(interval, arg)| env(interval, arg)),
                just(Token::Always)
                    .ignore_then(interval.clone())
                    .then(unary)
                    .map(|(interval, arg)| alw(interval, arg)),
                atom,
            ))
        });

        let conjunction = unary
            .clone()
            .foldl(just(Token::And).ignore_then(unary).repeated(), |lhs, rhs| lhs & rhs);

        let disjunction = conjunction.clone().foldl(
            just(Token::Or).ignore_then(conjunction).repeated(),
            |lhs, rhs| lhs | rhs,
        );

        let until_chain = disjunction.clone().foldl(
            just(Token::Until)
                .ignore_then(interval)
                .then(disjunction)
                .repeated(),
            |lhs, (interval, rhs)| until(interval, lhs, rhs),
        );

        let xor_chain = until_chain
            .clone()
            .foldl(just(Token::Xor).ignore_then(until_chain).repeated(), xor);

        let implication = xor_chain
            .clone()
            .foldl(just(Token::Implies).ignore_then(xor_chain).repeated(), implies);

        implication
            .clone()
            .foldl(just(Token::Equiv).ignore_then(implication).repeated(), iff)
    })
    .then_ignore(end())
}

/// Parse a string into a [`Formula`].
pub fn parse_str(src: &str) -> StlResult<Formula> {
    let (tokens, lex_errors) = lexer().parse(src).into_output_errors();
    log::debug!("** Tokens output **");
    log::debug!("{:#?}", tokens);
    log::debug!("** Lexing Errors: {} **", lex_errors.len());
    log::debug!("\n{}", lex_errors.iter().map(|e| e.to_string()).join("\n"));

    let (parsed, parse_errors) = if let Some(tokens) = &tokens {
        parser()
            .parse(tokens.as_slice().spanned((src.len()..src.len()).into()))
            .into_output_errors()
    } else {
        (None, Vec::new())
    };

    log::debug!("** Parse output **");
    log::debug!("{:#?}", parsed);
    log::debug!("** Parse Errors: {} **", parse_errors.len());
    log::debug!("\n{}", parse_errors.iter().map(|e| e.to_string()).join("\n"));

    let errors: Vec<String> = lex_errors
        .into_iter()
        .filter_map(|e| {
            // HACK: Discard empty expected lex errors
            use chumsky::error::RichReason::*;
            match e.reason() {
                ExpectedFound { expected, found: _ } if expected.is_empty() => None,
                _ => Some(e.to_string()),
            }
        })
        .chain(parse_errors.into_iter().map(|e| e.to_string()))
        .collect();
    if !errors.is_empty() {
        return Err(crate::Error::Parse(errors.join("\n")));
    }
    parsed.ok_or_else(|| crate::Error::Parse("empty input".to_owned()))
}

impl std::str::FromStr for Formula {
    type Err = crate::Error;

    fn from_str(src: &str) -> Result<Self, Self::Err> {
        parse_str(src)
    }
}
