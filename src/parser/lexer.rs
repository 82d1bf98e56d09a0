use std::fmt;

use chumsky::prelude::*;

pub(crate) type Span = SimpleSpan<usize>;
pub(crate) type Output<'a> = Vec<(Token<'a>, Span)>;
pub(crate) type Error<'a> = extra::Err<Rich<'a, char, Span>>;

#[derive(Clone, Debug, PartialEq)]
pub enum Token<'src> {
    LBracket,
    RBracket,
    LParen,
    RParen,
    Comma,
    Bool(bool),
    Num(f64),
    Ident(&'src str),
    Minus,
    Plus,
    Times,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Not,
    And,
    Or,
    Implies,
    Equiv,
    Xor,
    Always,
    Eventually,
    Until,
}

impl<'src> fmt::Display for Token<'src> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Comma => write!(f, ","),
            Token::Bool(val) => write!(f, "{}", val),
            Token::Num(val) => write!(f, "{}", val),
            Token::Ident(ident) => write!(f, "{}", ident),
            Token::Minus => write!(f, "-"),
            Token::Plus => write!(f, "+"),
            Token::Times => write!(f, "*"),
            Token::Lt => write!(f, "<"),
            Token::Le => write!(f, "<="),
            Token::Gt => write!(f, ">"),
            Token::Ge => write!(f, ">="),
            Token::Eq => write!(f, "="),
            Token::Not => write!(f, "!"),
            Token::And => write!(f, "&"),
            Token::Or => write!(f, "|"),
            Token::Implies => write!(f, "->"),
            Token::Equiv => write!(f, "<->"),
            Token::Xor => write!(f, "^"),
            Token::Always => write!(f, "G"),
            Token::Eventually => write!(f, "F"),
            Token::Until => write!(f, "U"),
        }
    }
}

/// Check whether a word is claimed by the keyword table of [`lexer`].
///
/// Keyword names cannot print bare; the formula printer quotes them.
pub(crate) fn is_keyword(word: &str) -> bool {
    matches!(
        word,
        "true"
            | "false"
            | "TRUE"
            | "FALSE"
            | "G"
            | "alw"
            | "always"
            | "globally"
            | "F"
            | "ev"
            | "eventually"
            | "finally"
            | "U"
            | "until"
    )
}

pub fn lexer<'src>() -> impl Parser<'src, &'src str, Output<'src>, Error<'src>> {
    // A parser for numbers
    let digits = text::digits(10).to_slice().labelled("digits");

    let frac = just('.').then(digits.or_not());

    let exp = just('e').or(just('E')).then(one_of("+-").or_not()).then(digits);

    // A leading sign is lexed separately as `Minus`/`Plus`.
    let floating_number = digits
        .then(choice((frac.then(exp).to_slice(), frac.to_slice(), exp.to_slice())))
        .to_slice()
        .try_map_with(|s: &str, e| {
            s.parse()
                .map(Token::Num)
                .map_err(|err| Rich::custom(e.span(), format!("Unable to parse as 64-bit float: {}", err)))
        })
        .labelled("float")
        .boxed();

    let integer = digits
        .to_slice()
        .try_map_with(|s: &str, e| {
            s.parse::<u64>()
                .map(|val| Token::Num(val as f64))
                .map_err(|err| Rich::custom(e.span(), format!("Unable to parse as 64-bit integer: {}", err)))
        })
        .labelled("integer");

    let number = choice((floating_number, integer)).labelled("number");

    // A parser for control characters (delimiters, commas, etc.)
    let ctrl = choice((
        just("[").to(Token::LBracket),
        just("]").to(Token::RBracket),
        just("(").to(Token::LParen),
        just(")").to(Token::RParen),
        just(",").to(Token::Comma),
    ))
    .labelled("control token");

    // Lexer for operator symbols
    let op = choice((
        just("<->").to(Token::Equiv),
        just("<=>").to(Token::Equiv),
        just("<=").to(Token::Le),
        just("<").to(Token::Lt),
        just(">=").to(Token::Ge),
        just(">").to(Token::Gt),
        just("==").to(Token::Eq),
        just("->").to(Token::Implies),
        just("=>").to(Token::Implies),
        just("!").to(Token::Not),
        just("~").to(Token::Not),
        just("\u{00ac}").to(Token::Not), // ¬
        just("&&").to(Token::And),
        just("&").to(Token::And),
        just("\u{2227}").to(Token::And), // ∧
        just("||").to(Token::Or),
        just("|").to(Token::Or),
        just("\u{2228}").to(Token::Or), // ∨
        just("^").to(Token::Xor),
        just("-").to(Token::Minus),
        just("+").to(Token::Plus),
        just("*").to(Token::Times),
        just("=").to(Token::Eq),
    ))
    .labelled("operator token");

    let temporal_op = choice((
        just("\u{25c7}").to(Token::Eventually), // ◇
        just("\u{25a1}").to(Token::Always),     // □
    ))
    .labelled("temporal operator token");

    // A parser for strings
    // Strings in our grammar are identifiers too; the quotes are not part of
    // the name.
    let quoted_ident = none_of('"')
        .repeated()
        .to_slice()
        .delimited_by(just('"'), just('"'))
        .map(Token::Ident)
        .labelled("quoted identifier");

    // A parser for identifiers and keywords
    let ident = text::ident()
        .map(|ident: &str| match ident {
            "true" => Token::Bool(true),
            "false" => Token::Bool(false),
            "TRUE" => Token::Bool(true),
            "FALSE" => Token::Bool(false),
            "G" => Token::Always,
            "alw" => Token::Always,
            "always" => Token::Always,
            "globally" => Token::Always,
            "F" => Token::Eventually,
            "ev" => Token::Eventually,
            "eventually" => Token::Eventually,
            "finally" => Token::Eventually,
            "U" => Token::Until,
            "until" => Token::Until,
            _ => Token::Ident(ident),
        })
        .labelled("identifier");

    // A single token can be one of the above
    let token = choice((op, temporal_op, ctrl, quoted_ident, ident, number)).boxed();

    let comment = just("//").then(any().and_is(just('\n').not()).repeated()).padded();

    token
        .map_with(|tok, e| (tok, e.span()))
        .padded_by(comment.repeated())
        .padded()
        // If we encounter an error, skip and attempt to lex the next character as a token instead
        .recover_with(skip_then_retry_until(any().ignored(), end()))
        .repeated()
        .collect()
}
