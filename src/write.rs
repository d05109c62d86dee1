//! PGN serialization from the move tree.
//!
//! Re-emits tag section and movetext, including nested variations, NAGs and
//! comments with their `[%clk]`/`[%eval]` annotations, so a parse/serialize
//! round trip preserves the tree.

use crate::comment::Evaluation;
use crate::state::{Headers, Orientation, TreeState};
use crate::tree::Node;
use shakmaty::{fen::Fen, Color};
use std::fmt::Write as _;

pub fn write_pgn(state: &TreeState) -> String {
    let mut out = String::new();
    write_headers(&mut out, &state.headers);
    out.push('\n');
    write_movetext(&mut out, &state.root);
    push_sep(&mut out);
    if state.headers.result.is_empty() {
        out.push('*');
    } else {
        out.push_str(&state.headers.result);
    }
    out.push('\n');
    out
}

fn write_headers(out: &mut String, headers: &Headers) {
    let field = |s: &str, fallback: &str| -> String {
        if s.is_empty() {
            fallback.to_string()
        } else {
            escape(s)
        }
    };
    let _ = writeln!(out, "[Event \"{}\"]", field(&headers.event, "?"));
    let _ = writeln!(out, "[Site \"{}\"]", field(&headers.site, "?"));
    let _ = writeln!(out, "[Date \"{}\"]", field(&headers.date, "????.??.??"));
    let _ = writeln!(out, "[Round \"{}\"]", field(&headers.round, "?"));
    let _ = writeln!(out, "[White \"{}\"]", field(&headers.white, "?"));
    let _ = writeln!(out, "[Black \"{}\"]", field(&headers.black, "?"));
    let _ = writeln!(out, "[Result \"{}\"]", field(&headers.result, "*"));
    if let Some(elo) = headers.white_elo {
        let _ = writeln!(out, "[WhiteElo \"{}\"]", elo);
    }
    if let Some(elo) = headers.black_elo {
        let _ = writeln!(out, "[BlackElo \"{}\"]", elo);
    }
    if let Some(variant) = &headers.variant {
        let _ = writeln!(out, "[Variant \"{}\"]", escape(variant));
    }
    if let Some(fen) = &headers.fen {
        let _ = writeln!(out, "[SetUp \"1\"]");
        let _ = writeln!(out, "[FEN \"{}\"]", escape(fen));
    }
    if headers.orientation == Orientation::Black {
        let _ = writeln!(out, "[Orientation \"black\"]");
    }
    for (key, value) in &headers.extra {
        let _ = writeln!(out, "[{} \"{}\"]", key, escape(value));
    }
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn write_movetext(out: &mut String, root: &Node) {
    let (fullmove, white) = start_counters(&root.fen);
    if has_comment(root) {
        push_sep(out);
        write_comment(out, root);
    }
    write_line(out, root, fullmove, white, true);
}

/// Move counter and side to move at the root, read off its FEN.
fn start_counters(fen: &str) -> (u32, bool) {
    match fen.parse::<Fen>() {
        Ok(fen) => {
            let setup = fen.into_setup();
            (setup.fullmoves.get(), setup.turn == Color::White)
        }
        Err(_) => (1, true),
    }
}

/// Emit the line below `parent`: main move, then each variation in parens,
/// then onward along the main line. Recursion depth equals variation
/// nesting, not game length.
fn write_line(out: &mut String, parent: &Node, fullmove: u32, white: bool, force_number: bool) {
    let mut parent = parent;
    let mut fullmove = fullmove;
    let mut white = white;
    let mut force_number = force_number;
    while let Some(main) = parent.children.first() {
        let annotated = write_move(out, main, fullmove, white, force_number);
        let mut had_variation = false;
        for variation in &parent.children[1..] {
            push_sep(out);
            out.push('(');
            let var_annotated = write_move(out, variation, fullmove, white, true);
            let (n, w) = advance(fullmove, white);
            write_line(out, variation, n, w, var_annotated);
            out.push(')');
            had_variation = true;
        }
        // A black move after an interruption repeats its number.
        force_number = had_variation || annotated;
        let (n, w) = advance(fullmove, white);
        fullmove = n;
        white = w;
        parent = main;
    }
}

/// Emit one move with its number, NAGs and comment. Returns whether a
/// comment interrupted the line.
fn write_move(out: &mut String, node: &Node, fullmove: u32, white: bool, force_number: bool) -> bool {
    push_sep(out);
    if white {
        let _ = write!(out, "{}. ", fullmove);
    } else if force_number {
        let _ = write!(out, "{}... ", fullmove);
    }
    if let Some(san) = &node.san {
        let _ = write!(out, "{}", san);
    }
    for nag in &node.nags {
        let _ = write!(out, " ${}", nag);
    }
    if has_comment(node) {
        push_sep(out);
        write_comment(out, node);
        true
    } else {
        false
    }
}

fn has_comment(node: &Node) -> bool {
    node.comment.is_some() || node.clock.is_some() || node.eval.is_some()
}

fn write_comment(out: &mut String, node: &Node) {
    let mut parts: Vec<String> = Vec::new();
    if let Some(seconds) = node.clock {
        parts.push(format!("[%clk {}]", format_clock(seconds)));
    }
    if let Some(eval) = node.eval {
        parts.push(format!("[%eval {}]", format_eval(eval)));
    }
    if let Some(text) = &node.comment {
        // Braces cannot nest in PGN comments.
        parts.push(text.replace('}', ")"));
    }
    let _ = write!(out, "{{ {} }}", parts.join(" "));
}

fn format_clock(seconds: f32) -> String {
    let total = seconds.max(0.0);
    let hours = (total / 3600.0) as u32;
    let minutes = ((total % 3600.0) / 60.0) as u32;
    let secs = total % 60.0;
    if secs.fract() < 1e-3 {
        format!("{}:{:02}:{:02}", hours, minutes, secs as u32)
    } else {
        format!("{}:{:02}:{:04.1}", hours, minutes, secs)
    }
}

fn format_eval(eval: Evaluation) -> String {
    match eval {
        Evaluation::Pawns(pawns) => format!("{}", pawns),
        Evaluation::Mate(moves) => format!("#{}", moves),
    }
}

fn advance(fullmove: u32, white: bool) -> (u32, bool) {
    if white {
        (fullmove, false)
    } else {
        (fullmove + 1, true)
    }
}

fn push_sep(out: &mut String) {
    match out.chars().last() {
        None | Some('(') | Some('\n') | Some(' ') => {}
        _ => out.push(' '),
    }
}
