//! Parsers for PGN comment bodies.
//!
//! Comments may interleave free text with embedded annotation tags such as
//! `[%clk 0:03:00]` and `[%eval 0.17]` (or `[%eval #-3]` for forced mates).
//! The known tags are lifted out into structured fields; everything else is
//! preserved as text so comments round-trip through parse/serialize.

use nom::{
    branch::alt,
    bytes::complete::{is_not, tag},
    character::complete::{char, digit1},
    combinator::{map, map_res, opt, recognize},
    multi::{many0, many1},
    sequence::{delimited, pair, preceded},
    IResult, Parser,
};

/// An engine evaluation attached to a move, in pawns or moves-to-mate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Evaluation {
    Pawns(f32),
    Mate(i32),
}

#[derive(Debug, Clone, PartialEq)]
enum CommentPart {
    Clock(f32),
    Eval(Evaluation),
    Text(String),
}

/// The structured content of one `{ ... }` comment span.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedComment {
    pub clock: Option<f32>,
    pub eval: Option<Evaluation>,
    pub text: Option<String>,
}

/// Split a comment body into annotation fields and remaining text.
///
/// Unknown bracketed tags (`[%csl ...]` and friends) are kept verbatim in the
/// text portion. Duplicate clk/eval tags take the last value.
pub fn parse_comment(body: &str) -> ParsedComment {
    let (remaining, parts) = comment_parts(body).unwrap_or((body, Vec::new()));

    let mut parsed = ParsedComment::default();
    let mut texts: Vec<String> = Vec::new();
    for part in parts {
        match part {
            CommentPart::Clock(seconds) => parsed.clock = Some(seconds),
            CommentPart::Eval(eval) => parsed.eval = Some(eval),
            CommentPart::Text(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    texts.push(trimmed.to_string());
                }
            }
        }
    }
    // Stray unclosed brackets stop the combinators; keep the tail as text.
    let tail = remaining.trim();
    if !tail.is_empty() {
        texts.push(tail.to_string());
    }
    if !texts.is_empty() {
        parsed.text = Some(texts.join(" "));
    }
    parsed
}

fn comment_parts(input: &str) -> IResult<&str, Vec<CommentPart>> {
    many0(alt((
        embedded_tag,
        map(unknown_tag, |s: &str| CommentPart::Text(s.to_string())),
        map(text, |s: &str| CommentPart::Text(s.to_string())),
    )))
    .parse(input)
}

/// Parser for a `[%name value]` tag with a recognized name.
fn embedded_tag(input: &str) -> IResult<&str, CommentPart> {
    delimited(
        pair(char('['), char('%')),
        alt((
            map(
                preceded(pair(tag("eval"), spacing), eval_value),
                CommentPart::Eval,
            ),
            map(
                preceded(pair(tag("clk"), spacing), time_value),
                CommentPart::Clock,
            ),
        )),
        char(']'),
    )
    .parse(input)
}

/// Any other bracketed span, returned whole so it survives round-trips.
fn unknown_tag(input: &str) -> IResult<&str, &str> {
    recognize(delimited(char('['), is_not("[]"), char(']'))).parse(input)
}

fn eval_value(input: &str) -> IResult<&str, Evaluation> {
    alt((
        map(
            map_res(
                preceded(char('#'), recognize(pair(opt(char('-')), digit1))),
                str::parse::<i32>,
            ),
            Evaluation::Mate,
        ),
        map(
            map_res(signed_number, str::parse::<f32>),
            Evaluation::Pawns,
        ),
    ))
    .parse(input)
}

/// Parser for a signed decimal number.
fn signed_number(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        opt(alt((char('+'), char('-')))),
        recognize(pair(digit1, opt(preceded(char('.'), digit1)))),
    ))
    .parse(input)
}

/// Parser for an `h:mm:ss` clock value, returned as seconds.
fn time_value(input: &str) -> IResult<&str, f32> {
    map(
        (
            map_res(digit1, str::parse::<u32>),
            char(':'),
            map_res(digit1, str::parse::<u32>),
            char(':'),
            map_res(
                recognize(pair(digit1, opt(preceded(char('.'), digit1)))),
                str::parse::<f32>,
            ),
        ),
        |(h, _, m, _, s)| h as f32 * 3600.0 + m as f32 * 60.0 + s,
    )
    .parse(input)
}

/// Parser for text (any characters except brackets).
fn text(input: &str) -> IResult<&str, &str> {
    is_not("[]").parse(input)
}

/// Parser for spacing (one or more spaces).
fn spacing(input: &str) -> IResult<&str, &str> {
    recognize(many1(char(' '))).parse(input)
}
