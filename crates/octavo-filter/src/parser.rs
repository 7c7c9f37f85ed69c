//! A `nom`-based parser for the filter expression language.

use crate::ast::{BinaryOp, CompareOp, Expr, LogicalOp, Program};
use crate::error::{Error, Result};
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, multispace0},
    combinator::{map, not, opt, recognize},
    multi::{many0, separated_list1},
    number::complete::double,
    sequence::{delimited, pair, preceded, terminated},
};

/// Reserved words that are never identifiers.
const KEYWORDS: [&str; 8] = [
    "and", "or", "not", "in", "true", "false", "True", "False",
];

// --- Main Public Parser ---

/// Parse filter source into a [`Program`].
///
/// Several `;`-separated expressions parse successfully; rejecting programs
/// with more than one statement is left to the evaluator so that the error
/// can say so precisely.
pub fn parse_filter(source: &str) -> Result<Program> {
    match program(source.trim()) {
        Ok(("", program)) => Ok(program),
        Ok((remainder, _)) => Err(Error::Parse {
            message: format!("did not consume all input, remainder: '{remainder}'"),
        }),
        Err(err) => Err(Error::Parse {
            message: err.to_string(),
        }),
    }
}

// --- Combinators & Helpers ---

fn ws<'a, F, O, E>(inner: F) -> impl Parser<&'a str, Output = O, Error = E>
where
    F: Parser<&'a str, Output = O, Error = E>,
    E: nom::error::ParseError<&'a str>,
{
    delimited(multispace0, inner, multispace0)
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// A keyword: the exact word, not merely a prefix of an identifier such as
/// `orchid` or `android`.
fn word<'a>(
    keyword: &'static str,
) -> impl Parser<&'a str, Output = &'a str, Error = nom::error::Error<&'a str>> {
    terminated(tag(keyword), not(take_while1(is_ident_char)))
}

fn build_logical_expr_parser<'a, F>(
    sub_expr_parser: F,
    keyword: &'static str,
    op: LogicalOp,
) -> impl FnMut(&'a str) -> IResult<&'a str, Expr>
where
    F: Parser<&'a str, Output = Expr, Error = nom::error::Error<&'a str>> + Clone,
{
    move |input: &str| {
        let (input, first) = sub_expr_parser.clone().parse(input)?;
        let (input, remainder) =
            many0(preceded(ws(word(keyword)), sub_expr_parser.clone())).parse(input)?;

        if remainder.is_empty() {
            return Ok((input, first));
        }
        let mut operands = vec![first];
        operands.extend(remainder);
        Ok((input, Expr::Logical { op, operands }))
    }
}

fn build_binary_expr_parser<'a, F, G>(
    sub_expr_parser: F,
    op_parser: G,
) -> impl FnMut(&'a str) -> IResult<&'a str, Expr>
where
    F: Parser<&'a str, Output = Expr, Error = nom::error::Error<&'a str>> + Clone,
    G: Parser<&'a str, Output = BinaryOp, Error = nom::error::Error<&'a str>> + Clone,
{
    move |input: &str| {
        let (input, mut left) = sub_expr_parser.clone().parse(input)?;
        let (input, remainder) =
            many0(pair(ws(op_parser.clone()), sub_expr_parser.clone())).parse(input)?;

        for (op, right) in remainder {
            left = Expr::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
        Ok((input, left))
    }
}

// --- Expression Parsers (in order of precedence) ---

fn program(input: &str) -> IResult<&str, Program> {
    map(
        terminated(
            separated_list1(ws(char(';')), expression),
            opt(ws(char(';'))),
        ),
        |exprs| Program { exprs },
    )
    .parse(input)
}

fn expression(input: &str) -> IResult<&str, Expr> {
    or_expr(input)
}

fn or_expr(input: &str) -> IResult<&str, Expr> {
    build_logical_expr_parser(and_expr, "or", LogicalOp::Or)(input)
}

fn and_expr(input: &str) -> IResult<&str, Expr> {
    build_logical_expr_parser(not_expr, "and", LogicalOp::And)(input)
}

fn not_expr(input: &str) -> IResult<&str, Expr> {
    alt((
        map(preceded(ws(word("not")), not_expr), |expr| {
            Expr::Not(Box::new(expr))
        }),
        comparison,
    ))
    .parse(input)
}

fn compare_op(input: &str) -> IResult<&str, CompareOp> {
    alt((
        map(tag("=="), |_| CompareOp::Eq),
        map(tag("!="), |_| CompareOp::Ne),
        map(tag("<="), |_| CompareOp::Le),
        map(tag(">="), |_| CompareOp::Ge),
        map(tag("<"), |_| CompareOp::Lt),
        map(tag(">"), |_| CompareOp::Gt),
        map(pair(word("not"), ws(word("in"))), |_| CompareOp::NotIn),
        map(word("in"), |_| CompareOp::In),
    ))
    .parse(input)
}

fn comparison(input: &str) -> IResult<&str, Expr> {
    let (input, first) = union_expr(input)?;
    let (input, comparisons) = many0(pair(ws(compare_op), union_expr)).parse(input)?;

    if comparisons.is_empty() {
        return Ok((input, first));
    }
    Ok((
        input,
        Expr::Compare {
            left: Box::new(first),
            comparisons,
        },
    ))
}

fn union_op(input: &str) -> IResult<&str, BinaryOp> {
    map(char('|'), |_| BinaryOp::Union).parse(input)
}

fn intersect_op(input: &str) -> IResult<&str, BinaryOp> {
    map(char('&'), |_| BinaryOp::Intersect).parse(input)
}

fn matches_op(input: &str) -> IResult<&str, BinaryOp> {
    map(char('%'), |_| BinaryOp::Matches).parse(input)
}

fn union_expr(input: &str) -> IResult<&str, Expr> {
    build_binary_expr_parser(intersect_expr, union_op)(input)
}

fn intersect_expr(input: &str) -> IResult<&str, Expr> {
    build_binary_expr_parser(matches_expr, intersect_op)(input)
}

fn matches_expr(input: &str) -> IResult<&str, Expr> {
    build_binary_expr_parser(primary_expr, matches_op)(input)
}

fn primary_expr(input: &str) -> IResult<&str, Expr> {
    // Identifiers come before numbers so that words like `inf` stay field
    // lookups instead of float literals.
    ws(alt((
        bool_literal,
        string_literal,
        set_literal,
        map(identifier, |name: &str| Expr::Ident(name.to_string())),
        map(double, Expr::Num),
        delimited(ws(char('(')), expression, ws(char(')'))),
    )))
    .parse(input)
}

// --- Literal Parsers ---

fn bool_literal(input: &str) -> IResult<&str, Expr> {
    alt((
        map(alt((word("true"), word("True"))), |_| Expr::Bool(true)),
        map(alt((word("false"), word("False"))), |_| Expr::Bool(false)),
    ))
    .parse(input)
}

fn string_literal(input: &str) -> IResult<&str, Expr> {
    map(
        alt((
            delimited(char('\''), take_while(|c| c != '\''), char('\'')),
            delimited(char('"'), take_while(|c| c != '"'), char('"')),
        )),
        |s: &str| Expr::Str(s.to_string()),
    )
    .parse(input)
}

fn set_literal(input: &str) -> IResult<&str, Expr> {
    map(
        delimited(
            ws(char('{')),
            separated_list1(ws(char(',')), expression),
            ws(char('}')),
        ),
        Expr::Set,
    )
    .parse(input)
}

fn identifier(input: &str) -> IResult<&str, &str> {
    let (rest, name) = recognize(pair(
        take_while1(|c: char| c.is_alphabetic() || c == '_'),
        take_while(is_ident_char),
    ))
    .parse(input)?;

    if KEYWORDS.contains(&name) {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Verify,
        )));
    }
    Ok((rest, name))
}
