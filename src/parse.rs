//! PGN notation parser.
//!
//! Tokenizes tag pairs, SAN tokens, variation parens, comments, NAGs,
//! move-number markers and result markers, and builds the move tree with an
//! explicit stack of cursors: a move appends a child under the cursor, `(`
//! rewinds the cursor to the parent of the last move played (variations
//! branch from the position *before* that move), `)` restores it. Moves are
//! validated against the position as they are read, so an illegal or unknown
//! token aborts the parse with its character offset; no partial tree is ever
//! returned.

use crate::comment::parse_comment;
use crate::error::{ParseError, ParseErrorKind};
use crate::state::{Headers, Orientation, TreeState};
use crate::tree::{node_at_mut, Node, Path};
use nom::{
    bytes::complete::take_while1,
    character::complete::{char, multispace0},
    error::{Error, ErrorKind},
    sequence::{delimited, pair, preceded},
    IResult, Parser,
};
use shakmaty::{fen::Fen, san::SanPlus, Chess, EnPassantMode, Position};

#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Abort with `NestingTooDeep` past this many open variations, so
    /// pathological input cannot grow the cursor stack without bound.
    pub max_variation_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            max_variation_depth: 64,
        }
    }
}

/// Parse one PGN game into a tree state with the cursor at the root.
pub fn parse_pgn(text: &str) -> Result<TreeState, ParseError> {
    parse_pgn_with(text, &ParseOptions::default())
}

pub fn parse_pgn_with(text: &str, opts: &ParseOptions) -> Result<TreeState, ParseError> {
    GameParser::new(text, opts).run()
}

/// Saved cursor for one open variation.
struct Frame {
    cur: Path,
    pos: Chess,
    prev: Option<Chess>,
}

struct GameParser<'a> {
    text: &'a str,
    rest: &'a str,
    opts: &'a ParseOptions,
    headers: Headers,
    root: Node,
    /// Cursor: path of the most recently created node.
    cur: Path,
    /// Position at the cursor.
    cur_pos: Chess,
    /// Position at the cursor's parent, present only while the last token at
    /// this nesting level was a move. `(` branches from here.
    prev_pos: Option<Chess>,
    stack: Vec<Frame>,
    in_movetext: bool,
    fen_tag_offset: usize,
}

impl<'a> GameParser<'a> {
    fn new(text: &'a str, opts: &'a ParseOptions) -> Self {
        GameParser {
            text,
            rest: text,
            opts,
            headers: Headers::default(),
            root: Node::new(String::new()),
            cur: Vec::new(),
            cur_pos: Chess::default(),
            prev_pos: None,
            stack: Vec::new(),
            in_movetext: false,
            fen_tag_offset: 0,
        }
    }

    fn run(mut self) -> Result<TreeState, ParseError> {
        let mut finished = false;
        while !finished {
            self.skip_whitespace();
            let off = self.offset();
            let Some(c) = self.rest.chars().next() else {
                break;
            };
            match c {
                '[' if !self.in_movetext => match tag_pair(self.rest) {
                    Ok((rest, (key, value))) => {
                        self.rest = rest;
                        self.apply_tag(off, key, value);
                    }
                    Err(_) => return Err(self.err(off, ParseErrorKind::MalformedTag)),
                },
                '{' => {
                    self.begin_movetext()?;
                    self.take_brace_comment(off)?;
                }
                ';' => {
                    self.begin_movetext()?;
                    self.take_line_comment();
                }
                '(' => {
                    self.begin_movetext()?;
                    self.open_variation(off)?;
                }
                ')' => {
                    self.close_variation(off)?;
                }
                '.' => {
                    // Dots after move numbers (including "...") carry no content.
                    let dots = self.rest.bytes().take_while(|&b| b == b'.').count();
                    self.advance(dots);
                }
                '$' => {
                    self.begin_movetext()?;
                    self.take_nag(off)?;
                }
                '!' | '?' => {
                    self.begin_movetext()?;
                    self.take_suffix()?;
                }
                '*' => {
                    self.begin_movetext()?;
                    self.advance(1);
                    self.finish_with_result(off, "*")?;
                    finished = true;
                }
                c if c.is_ascii_digit() => {
                    self.begin_movetext()?;
                    if let Some(result) = self.peek_result() {
                        self.advance(result.len());
                        self.finish_with_result(off, result)?;
                        finished = true;
                    } else if self.rest.starts_with("0-0") {
                        // Castling written with zeros.
                        self.take_move(off)?;
                    } else {
                        // Move-number marker; its dots are skipped above.
                        let digits = self.rest.bytes().take_while(u8::is_ascii_digit).count();
                        self.advance(digits);
                    }
                }
                c if c.is_ascii_alphabetic() => {
                    self.begin_movetext()?;
                    self.take_move(off)?;
                }
                _ => {
                    let word = self.peek_word();
                    return Err(self.err(off, ParseErrorKind::UnknownToken(word)));
                }
            }
        }

        if !self.stack.is_empty() {
            return Err(self.err(self.text.len(), ParseErrorKind::UnterminatedVariation));
        }
        // Header-only input still needs the root position materialized.
        self.begin_movetext()?;
        if self.headers.result.is_empty() {
            self.headers.result = "*".to_string();
        }
        Ok(TreeState::new(self.root, self.headers))
    }

    /// First transition out of the tag section: fix the starting position
    /// from the FEN/Variant headers and stamp it on the root.
    fn begin_movetext(&mut self) -> Result<(), ParseError> {
        if self.in_movetext {
            return Ok(());
        }
        self.in_movetext = true;
        let mode = self.headers.castling_mode();
        let fen_off = self.fen_tag_offset;
        self.cur_pos = match self.headers.fen.clone() {
            Some(fen_str) => {
                let fen: Fen = fen_str
                    .parse()
                    .map_err(|e| self.err_for(fen_off, e, ParseErrorKind::InvalidFen))?;
                fen.into_position(mode)
                    .map_err(|e| self.err_for(fen_off, e, ParseErrorKind::InvalidFen))?
            }
            None => Chess::default(),
        };
        self.root.fen = Fen::from_position(self.cur_pos.clone(), EnPassantMode::Legal).to_string();
        Ok(())
    }

    fn apply_tag(&mut self, off: usize, key: &str, value: String) {
        match key {
            "Event" => self.headers.event = value,
            "Site" => self.headers.site = value,
            "Date" => self.headers.date = value,
            "Round" => self.headers.round = value,
            "White" => self.headers.white = value,
            "Black" => self.headers.black = value,
            "Result" => self.headers.result = value,
            // A non-numeric rating ("unrated", "-") survives as an extra tag.
            "WhiteElo" => match value.parse() {
                Ok(elo) => self.headers.white_elo = Some(elo),
                Err(_) => self.keep_extra(key, value),
            },
            "BlackElo" => match value.parse() {
                Ok(elo) => self.headers.black_elo = Some(elo),
                Err(_) => self.keep_extra(key, value),
            },
            "Orientation" => {
                self.headers.orientation = if value.eq_ignore_ascii_case("black") {
                    Orientation::Black
                } else {
                    Orientation::White
                }
            }
            _ if key.eq_ignore_ascii_case("FEN") => {
                self.fen_tag_offset = off;
                self.headers.fen = Some(value);
            }
            _ if key.eq_ignore_ascii_case("Variant") => self.headers.variant = Some(value),
            // Implied by the FEN tag on output; keeping it in extra would
            // duplicate it on re-serialization.
            "SetUp" => {}
            _ => self.keep_extra(key, value),
        }
    }

    /// Tags outside the roster; duplicates take the last value.
    fn keep_extra(&mut self, key: &str, value: String) {
        match self.headers.extra.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.headers.extra.push((key.to_string(), value)),
        }
    }

    fn take_move(&mut self, off: usize) -> Result<(), ParseError> {
        let len = self
            .rest
            .bytes()
            .take_while(|&b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'#' | b'=' | b'-'))
            .count();
        let token = &self.rest[..len];
        self.advance(len);

        // shakmaty spells castling with letter O.
        let ascii = if token.starts_with("0-0") {
            token.replace('0', "O")
        } else {
            token.to_string()
        };
        let san_plus = SanPlus::from_ascii(ascii.as_bytes())
            .map_err(|_| self.err(off, ParseErrorKind::UnknownToken(token.to_string())))?;
        let m = san_plus.san.to_move(&self.cur_pos).map_err(|e| {
            self.err(
                off,
                ParseErrorKind::IllegalMove {
                    san: token.to_string(),
                    reason: e.to_string(),
                },
            )
        })?;

        self.prev_pos = Some(self.cur_pos.clone());
        self.cur_pos.play_unchecked(&m);
        let fen = Fen::from_position(self.cur_pos.clone(), EnPassantMode::Legal).to_string();
        let index = {
            let parent = cursor_mut(&mut self.root, &self.cur);
            parent.children.push(Node::with_move(fen, san_plus));
            parent.children.len() - 1
        };
        self.cur.push(index);

        // Attached "e4!?" style suffix.
        self.take_suffix()?;
        Ok(())
    }

    fn open_variation(&mut self, off: usize) -> Result<(), ParseError> {
        // A variation replaces the move just played, so there must be one.
        let Some(parent_pos) = self.prev_pos.clone() else {
            return Err(self.err(off, ParseErrorKind::VariationWithoutMove));
        };
        if self.stack.len() >= self.opts.max_variation_depth {
            return Err(self.err(
                off,
                ParseErrorKind::NestingTooDeep(self.opts.max_variation_depth),
            ));
        }
        self.advance(1);
        self.stack.push(Frame {
            cur: self.cur.clone(),
            pos: self.cur_pos.clone(),
            prev: self.prev_pos.take(),
        });
        self.cur.pop();
        self.cur_pos = parent_pos;
        Ok(())
    }

    fn close_variation(&mut self, off: usize) -> Result<(), ParseError> {
        let Some(frame) = self.stack.pop() else {
            return Err(self.err(off, ParseErrorKind::UnmatchedVariationClose));
        };
        self.advance(1);
        self.cur = frame.cur;
        self.cur_pos = frame.pos;
        self.prev_pos = frame.prev;
        Ok(())
    }

    fn finish_with_result(&mut self, off: usize, result: &str) -> Result<(), ParseError> {
        if !self.stack.is_empty() {
            return Err(self.err(off, ParseErrorKind::UnterminatedVariation));
        }
        // The Result tag wins over the movetext marker, unless it said nothing.
        if self.headers.result.is_empty() || self.headers.result == "*" {
            self.headers.result = result.to_string();
        }
        Ok(())
    }

    fn take_brace_comment(&mut self, off: usize) -> Result<(), ParseError> {
        let Some(end) = self.rest[1..].find('}') else {
            return Err(self.err(off, ParseErrorKind::UnterminatedComment));
        };
        let body = &self.rest[1..1 + end];
        self.advance(end + 2);
        self.attach_comment(body);
        Ok(())
    }

    fn take_line_comment(&mut self) {
        let end = self.rest.find('\n').unwrap_or(self.rest.len());
        let body = &self.rest[1..end];
        self.advance(end);
        self.attach_comment(body);
    }

    /// Comments and annotations attach to the node most recently created
    /// (the root, for comments before the first move).
    fn attach_comment(&mut self, body: &str) {
        let parsed = parse_comment(body);
        let node = cursor_mut(&mut self.root, &self.cur);
        if let Some(text) = parsed.text {
            match &mut node.comment {
                Some(existing) => {
                    existing.push(' ');
                    existing.push_str(&text);
                }
                None => node.comment = Some(text),
            }
        }
        if parsed.clock.is_some() {
            node.clock = parsed.clock;
        }
        if parsed.eval.is_some() {
            node.eval = parsed.eval;
        }
    }

    fn take_nag(&mut self, off: usize) -> Result<(), ParseError> {
        let word = self.peek_word();
        let digits = self.rest[1..]
            .bytes()
            .take_while(u8::is_ascii_digit)
            .count();
        let nag = self.rest[1..1 + digits]
            .parse::<u8>()
            .map_err(|_| self.err(off, ParseErrorKind::UnknownToken(word)))?;
        self.advance(1 + digits);
        cursor_mut(&mut self.root, &self.cur).nags.push(nag);
        Ok(())
    }

    /// `!`, `?`, `!!`, `??`, `!?`, `?!` map onto NAGs 1-6. Longer runs are
    /// not annotations and are rejected whole.
    fn take_suffix(&mut self) -> Result<(), ParseError> {
        let off = self.offset();
        let len = self
            .rest
            .bytes()
            .take_while(|&b| b == b'!' || b == b'?')
            .count();
        if len == 0 {
            return Ok(());
        }
        if len > 2 {
            let run = self.rest[..len].to_string();
            return Err(self.err(off, ParseErrorKind::UnknownToken(run)));
        }
        let nag = match &self.rest[..len] {
            "!" => 1,
            "?" => 2,
            "!!" => 3,
            "??" => 4,
            "!?" => 5,
            _ => 6,
        };
        self.advance(len);
        cursor_mut(&mut self.root, &self.cur).nags.push(nag);
        Ok(())
    }

    fn peek_result(&self) -> Option<&'static str> {
        for candidate in ["1-0", "0-1", "1/2-1/2"] {
            if let Some(rest) = self.rest.strip_prefix(candidate) {
                let bounded = rest
                    .chars()
                    .next()
                    .map_or(true, |c| c.is_whitespace() || matches!(c, ')' | '{' | ';'));
                if bounded {
                    return Some(candidate);
                }
            }
        }
        None
    }

    fn peek_word(&self) -> String {
        self.rest
            .chars()
            .take_while(|c| !c.is_whitespace() && !matches!(c, '(' | ')' | '{' | '}'))
            .collect()
    }

    fn skip_whitespace(&mut self) {
        self.rest = self.rest.trim_start();
    }

    fn offset(&self) -> usize {
        self.text.len() - self.rest.len()
    }

    fn advance(&mut self, bytes: usize) {
        self.rest = &self.rest[bytes..];
    }

    fn err(&self, byte: usize, kind: ParseErrorKind) -> ParseError {
        ParseError {
            // Offsets are reported in characters so callers can point into
            // the original string regardless of multibyte comment content.
            offset: self.text[..byte].chars().count(),
            kind,
        }
    }

    fn err_for<E: std::fmt::Display>(
        &self,
        byte: usize,
        source: E,
        wrap: fn(String) -> ParseErrorKind,
    ) -> ParseError {
        self.err(byte, wrap(source.to_string()))
    }
}

/// The parser only ever builds `cur` out of indices it just pushed, so the
/// lookup cannot fail; a failure here is a parser bug, not bad input.
fn cursor_mut<'n>(root: &'n mut Node, path: &[usize]) -> &'n mut Node {
    node_at_mut(root, path).expect("parser cursor resolves to a node")
}

/// Parser for a `[Key "Value"]` tag pair.
fn tag_pair(input: &str) -> IResult<&str, (&str, String)> {
    delimited(
        pair(char('['), multispace0),
        pair(tag_key, preceded(multispace0, quoted_value)),
        pair(multispace0, char(']')),
    )
    .parse(input)
}

fn tag_key(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_').parse(input)
}

/// Quoted tag value with `\"` and `\\` escapes.
fn quoted_value(input: &str) -> IResult<&str, String> {
    let (rest, _) = char('"').parse(input)?;
    let mut value = String::new();
    let mut escaped = false;
    for (i, c) in rest.char_indices() {
        if escaped {
            match c {
                '"' | '\\' => value.push(c),
                other => {
                    value.push('\\');
                    value.push(other);
                }
            }
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '"' {
            return Ok((&rest[i + 1..], value));
        } else {
            value.push(c);
        }
    }
    Err(nom::Err::Error(Error::new(input, ErrorKind::Char)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comment::Evaluation;
    use crate::tree::node_at;

    #[test]
    fn test_parse_main_line() {
        let state = parse_pgn("1. e4 e5 2. Nf3 Nc6 1-0").unwrap();
        let line: Vec<String> = state
            .root
            .main_line()
            .map(|n| n.san.as_ref().map(|s| s.to_string()).unwrap_or_default())
            .collect();
        assert_eq!(line, vec!["e4", "e5", "Nf3", "Nc6"]);
        assert_eq!(state.headers.result, "1-0");
        assert!(state.current.is_empty());
    }

    #[test]
    fn test_empty_input_is_root_only() {
        let state = parse_pgn("").unwrap();
        assert!(state.root.children.is_empty());
        assert_eq!(state.headers.result, "*");
        assert_eq!(
            state.root.fen,
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
        );
    }

    #[test]
    fn test_headers_populated() {
        let pgn = r#"[Event "Test"]
[White "Player1"]
[Black "Player2"]
[WhiteElo "2800"]
[Result "1/2-1/2"]
[Annotator "someone"]

1. d4 d5 1/2-1/2"#;
        let state = parse_pgn(pgn).unwrap();
        assert_eq!(state.headers.event, "Test");
        assert_eq!(state.headers.white, "Player1");
        assert_eq!(state.headers.black, "Player2");
        assert_eq!(state.headers.white_elo, Some(2800));
        assert_eq!(state.headers.black_elo, None);
        assert_eq!(state.headers.result, "1/2-1/2");
        assert_eq!(
            state.headers.extra,
            vec![("Annotator".to_string(), "someone".to_string())]
        );
    }

    #[test]
    fn test_non_numeric_elo_kept_as_extra_tag() {
        let pgn = "[WhiteElo \"unrated\"]\n[BlackElo \"2650\"]\n\n1. e4 *";
        let state = parse_pgn(pgn).unwrap();
        assert_eq!(state.headers.white_elo, None);
        assert_eq!(state.headers.black_elo, Some(2650));
        assert_eq!(
            state.headers.extra,
            vec![("WhiteElo".to_string(), "unrated".to_string())]
        );
        // The tag still comes back out on serialization.
        let written = crate::write::write_pgn(&state);
        assert!(written.contains("[WhiteElo \"unrated\"]"));
        assert!(written.contains("[BlackElo \"2650\"]"));
    }

    #[test]
    fn test_duplicate_tag_takes_last_value() {
        let pgn = "[Event \"First\"]\n[Event \"Second\"]\n\n1. e4 *";
        let state = parse_pgn(pgn).unwrap();
        assert_eq!(state.headers.event, "Second");
    }

    #[test]
    fn test_variation_attaches_at_parent() {
        // The d4 variation is a sibling of e4 under the root, and e5
        // continues the main line below e4.
        let state = parse_pgn("1. e4 (1. d4) e5").unwrap();
        assert_eq!(state.root.children.len(), 2);
        let e4 = node_at(&state.root, &[0]).unwrap();
        let d4 = node_at(&state.root, &[1]).unwrap();
        assert_eq!(e4.san.as_ref().unwrap().to_string(), "e4");
        assert_eq!(d4.san.as_ref().unwrap().to_string(), "d4");
        assert!(d4.children.is_empty());
        assert_eq!(e4.children.len(), 1);
        assert_eq!(
            e4.children[0].san.as_ref().unwrap().to_string(),
            "e5"
        );
    }

    #[test]
    fn test_sibling_order_is_insertion_order() {
        let state = parse_pgn("1. e4 (1. d4) (1. c4) e5 *").unwrap();
        let sans: Vec<String> = state
            .root
            .children
            .iter()
            .map(|n| n.san.as_ref().unwrap().to_string())
            .collect();
        assert_eq!(sans, vec!["e4", "d4", "c4"]);
    }

    #[test]
    fn test_nested_variation() {
        // The c4 line nests inside the d4 variation and branches from the
        // root position, landing as a third sibling.
        let state = parse_pgn("1. e4 (1. d4 (1. c4 e5) d5) e5 *").unwrap();
        let sans: Vec<String> = state
            .root
            .children
            .iter()
            .map(|n| n.san.as_ref().unwrap().to_string())
            .collect();
        assert_eq!(sans, vec!["e4", "d4", "c4"]);
        let d4 = node_at(&state.root, &[1]).unwrap();
        assert_eq!(d4.children[0].san.as_ref().unwrap().to_string(), "d5");
        let c4 = node_at(&state.root, &[2]).unwrap();
        assert_eq!(c4.children[0].san.as_ref().unwrap().to_string(), "e5");
    }

    #[test]
    fn test_variation_positions_are_consistent() {
        let state = parse_pgn("1. e4 (1. d4) e5 *").unwrap();
        let d4 = node_at(&state.root, &[1]).unwrap();
        assert!(d4.fen.starts_with("rnbqkbnr/pppppppp/8/8/3P4/8/PPP1PPPP/RNBQKBNR b"));
    }

    #[test]
    fn test_illegal_move_offset() {
        let err = parse_pgn("1. e4 e5 2. Nf7").unwrap_err();
        assert_eq!(err.offset, 12);
        assert!(matches!(
            err.kind,
            ParseErrorKind::IllegalMove { ref san, .. } if san == "Nf7"
        ));
    }

    #[test]
    fn test_unknown_token_offset() {
        let err = parse_pgn("1. e4 xyzzy9").unwrap_err();
        assert_eq!(err.offset, 6);
        assert_eq!(
            err.kind,
            ParseErrorKind::UnknownToken("xyzzy9".to_string())
        );
    }

    #[test]
    fn test_offset_is_in_characters() {
        let err = parse_pgn("1. e4 {héllo wörld} Nf7 *").unwrap_err();
        let pgn = "1. e4 {héllo wörld} Nf7 *";
        let char_off = pgn.char_indices().position(|(_, c)| c == 'N').unwrap();
        assert_eq!(err.offset, char_off);
    }

    #[test]
    fn test_unmatched_open_paren() {
        let err = parse_pgn("1. e4 (1. d4 e5").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnterminatedVariation);
    }

    #[test]
    fn test_unmatched_close_paren() {
        let err = parse_pgn("1. e4 ) e5").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnmatchedVariationClose);
        assert_eq!(err.offset, 6);
    }

    #[test]
    fn test_variation_before_any_move() {
        let err = parse_pgn("(1. e4)").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::VariationWithoutMove);
    }

    #[test]
    fn test_nesting_limit() {
        let opts = ParseOptions {
            max_variation_depth: 2,
        };
        let pgn = "1. e4 (1. d4 (1. c4 (1. b3)))";
        let err = parse_pgn_with(pgn, &opts).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::NestingTooDeep(2));
    }

    #[test]
    fn test_comment_attaches_to_latest_node() {
        let state = parse_pgn("1. e4 {best by test} e5 *").unwrap();
        let e4 = node_at(&state.root, &[0]).unwrap();
        assert_eq!(e4.comment.as_deref(), Some("best by test"));
        let e5 = node_at(&state.root, &[0, 0]).unwrap();
        assert_eq!(e5.comment, None);
    }

    #[test]
    fn test_comment_before_first_move_attaches_to_root() {
        let state = parse_pgn("{from the start} 1. e4 *").unwrap();
        assert_eq!(state.root.comment.as_deref(), Some("from the start"));
    }

    #[test]
    fn test_unterminated_comment() {
        let err = parse_pgn("1. e4 {no end").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnterminatedComment);
        assert_eq!(err.offset, 6);
    }

    #[test]
    fn test_clock_and_eval_annotations() {
        let state =
            parse_pgn("1. e4 { [%eval 0.17] [%clk 0:03:00] } e5 { [%eval -0.2] } *").unwrap();
        let e4 = node_at(&state.root, &[0]).unwrap();
        assert_eq!(e4.eval, Some(Evaluation::Pawns(0.17)));
        assert_eq!(e4.clock, Some(180.0));
        let e5 = node_at(&state.root, &[0, 0]).unwrap();
        assert_eq!(e5.eval, Some(Evaluation::Pawns(-0.2)));
    }

    #[test]
    fn test_nags_and_suffixes() {
        let state = parse_pgn("1. e4!? e5 $14 2. Nf3?? *").unwrap();
        assert_eq!(node_at(&state.root, &[0]).unwrap().nags, vec![5]);
        assert_eq!(node_at(&state.root, &[0, 0]).unwrap().nags, vec![14]);
        assert_eq!(node_at(&state.root, &[0, 0, 0]).unwrap().nags, vec![4]);
    }

    #[test]
    fn test_long_suffix_run_is_rejected() {
        let err = parse_pgn("1. e4!!! e5 *").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnknownToken("!!!".to_string()));
        assert_eq!(err.offset, 5);
        // Detached runs are rejected the same way.
        let err = parse_pgn("1. e4 ?!? e5 *").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnknownToken("?!?".to_string()));
    }

    #[test]
    fn test_castling_both_spellings() {
        let pgn = "1. e4 e5 2. Nf3 Nc6 3. Bc4 Bc5 4. O-O Nf6 5. d3 0-0 *";
        let state = parse_pgn(pgn).unwrap();
        let line: Vec<String> = state
            .root
            .main_line()
            .map(|n| n.san.as_ref().unwrap().to_string())
            .collect();
        assert_eq!(line[6], "O-O");
        assert_eq!(line[9], "O-O");
    }

    #[test]
    fn test_fen_header_sets_root() {
        let pgn = r#"[FEN "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3"]

3. Bb5 a6 *"#;
        let state = parse_pgn(pgn).unwrap();
        assert!(state.root.fen.starts_with("r1bqkbnr/pppp1ppp/2n5/4p3"));
        assert_eq!(state.root.children.len(), 1);
    }

    #[test]
    fn test_invalid_fen_header_is_an_error() {
        let err = parse_pgn("[FEN \"not a fen\"]\n\n1. e4 *").unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::InvalidFen(_)));
        assert_eq!(err.offset, 0);
    }

    #[test]
    fn test_chess960_castling_mode() {
        let pgn = r#"[Variant "chess960"]
[FEN "brkrqnnb/pppppppp/8/8/8/8/PPPPPPPP/BRKRQNNB w KQkq - 0 1"]

1. g3 d5 2. d4 g6 *"#;
        let state = parse_pgn(pgn).unwrap();
        assert_eq!(state.root.main_line().count(), 4);
    }

    #[test]
    fn test_result_marker_fills_headers() {
        let state = parse_pgn("1. e4 e5 0-1").unwrap();
        assert_eq!(state.headers.result, "0-1");
    }

    #[test]
    fn test_result_tag_wins_over_marker() {
        let state = parse_pgn("[Result \"1-0\"]\n\n1. e4 *").unwrap();
        assert_eq!(state.headers.result, "1-0");
    }

    #[test]
    fn test_result_inside_variation_is_an_error() {
        let err = parse_pgn("1. e4 (1. d4 *)").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnterminatedVariation);
    }

    #[test]
    fn test_malformed_tag() {
        let err = parse_pgn("[Event Test]\n\n1. e4 *").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MalformedTag);
        assert_eq!(err.offset, 0);
    }

    #[test]
    fn test_tag_value_escapes() {
        let state = parse_pgn("[Event \"The \\\"big\\\" one\"]\n\n*").unwrap();
        assert_eq!(state.headers.event, "The \"big\" one");
    }

    #[test]
    fn test_determinism() {
        let pgn = "1. e4 (1. d4 d5) e5 2. Nf3 {main} Nc6 *";
        let a = parse_pgn(pgn).unwrap();
        let b = parse_pgn(pgn).unwrap();
        assert_eq!(a.root, b.root);
        assert_eq!(a.headers, b.headers);
    }

    #[test]
    fn test_semicolon_comment() {
        let state = parse_pgn("1. e4 ; king's pawn\ne5 *").unwrap();
        let e4 = node_at(&state.root, &[0]).unwrap();
        assert_eq!(e4.comment.as_deref(), Some("king's pawn"));
        assert_eq!(state.root.main_line().count(), 2);
    }
}
