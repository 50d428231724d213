//! Property tests for the stream parser.
//!
//! 1. Splitting input at any point yields the same complete lines
//! 2. Arbitrary input never panics and formats stay inside their line
//! 3. The SGR sequence describing an ANSI state recreates that state

mod common;

use common::CollectSink;
use mud_parser_core::{AnsiColorProcessor, Parser, ParserLine, ParserOptions};
use proptest::prelude::*;

const PIECES: &[&str] = &[
    "hello",
    " ",
    "world",
    "\n",
    "\r\n",
    "\t",
    "\x1b[31m",
    "\x1b[1;4;44m",
    "\x1b[0m",
    "\x1b[38;5;100m",
    "\x1b[1z",
    "\x1b[0z",
    "\x1b[6z",
    "\x1b[7z",
    "<B>",
    "</B>",
    "<COLOR red>",
    "</COLOR>",
    "<SEND \"look|get\">item</SEND>",
    "<A href=\"http://x.org\">x</A>",
    "&lt;",
    "&amp;",
    "&nbsp;",
    "<!ENTITY hp 42>",
    "&hp;",
    "<!-- note -->",
    "http://mud.org/a?b=c",
    "www.example.com",
    ".",
    ",",
    "(",
    ")",
    "!!SOUND(rain.wav V=20)",
    "!!",
    "\x1b]0;title\x07",
    "\x07",
    "\x08",
    "<",
    "&",
];

fn arb_stream() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(PIECES), 0..40).prop_map(|pieces| pieces.concat())
}

fn arb_sgr() -> impl Strategy<Value = Vec<i32>> {
    let extended = prop_oneof![Just(38), Just(48)];
    let group = prop_oneof![
        8 => (0i32..=107).prop_map(|code| vec![code]),
        1 => prop::sample::select(&[-3, -4, -7, -8, -11, -12][..]).prop_map(|code| vec![code]),
        1 => (extended.clone(), 0i32..=255).prop_map(|(kind, n)| vec![kind, 5, n]),
        1 => (extended, 0i32..=255, 0i32..=255, 0i32..=255).prop_map(|(kind, r, g, b)| vec![kind, 2, r, g, b]),
    ];
    prop::collection::vec(group, 1..12).prop_map(|groups| groups.concat())
}

fn complete_lines(sink: CollectSink) -> Vec<ParserLine> {
    sink.lines.into_iter().filter(|l| !l.fragment).collect()
}

fn parse_chunks(chunks: &[&str]) -> Vec<ParserLine> {
    let mut parser = Parser::new(ParserOptions::default());
    let mut sink = CollectSink::new();
    for chunk in chunks {
        parser.parse(chunk, true, false, &mut sink);
    }
    complete_lines(sink)
}

proptest! {
    #[test]
    fn sgr_state_survives_serialization(params in arb_sgr()) {
        let mut original = AnsiColorProcessor::new();
        original.apply(&params);

        let sequence = original.current_as_escape_sequence();
        let body = sequence.trim_start_matches("\x1b[").trim_end_matches('m');
        let replayed: Vec<i32> = body.split(';').map(|p| p.parse().unwrap()).collect();
        let mut copy = AnsiColorProcessor::new();
        copy.apply(&[31, 44, 1, 7]);
        copy.apply(&replayed);
        prop_assert_eq!(original, copy);
    }

    #[test]
    fn split_point_does_not_change_lines(text in arb_stream(), split in any::<prop::sample::Index>()) {
        let boundaries: Vec<usize> = text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len())).collect();
        let at = boundaries[split.index(boundaries.len())];
        let (head, tail) = text.split_at(at);

        let whole = parse_chunks(&[&text]);
        let split = parse_chunks(&[head, tail]);
        prop_assert_eq!(whole, split);
    }

    #[test]
    fn char_by_char_matches_whole(text in arb_stream()) {
        let chars: Vec<String> = text.chars().map(String::from).collect();
        let chunks: Vec<&str> = chars.iter().map(String::as_str).collect();
        prop_assert_eq!(parse_chunks(&[&text]), parse_chunks(&chunks));
    }

    #[test]
    fn arbitrary_input_is_survived(text in "[\\x00-\\x7f<>&;!#\\[\\]\"'=|ÇΩ]{0,300}", emulate in any::<bool>()) {
        let mut options = ParserOptions::default();
        options.emulate_terminal = emulate;
        options.display_control_codes = !emulate;
        let mut parser = Parser::new(options);
        let mut sink = CollectSink::new();
        parser.parse(&text, true, false, &mut sink);
        parser.parse("\n", true, false, &mut sink);

        for line in &sink.lines {
            let len = line.text.chars().count();
            for format in &line.formats {
                prop_assert!(format.offset() <= len, "{:?} past end of {:?}", format, line.text);
            }
        }
    }
}
