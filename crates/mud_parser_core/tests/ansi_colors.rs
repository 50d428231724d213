mod common;

use common::{Event, parse, parse_with, parser_with, runs};
use mud_parser_core::{ColorValue, FontStyle, LineFormat, Parser, ParserError, Rgb, palette_slot};
use pretty_assertions::assert_eq;

fn normal_fore(format: &LineFormat) -> ColorValue {
    match format {
        LineFormat::Normal(n) => n.fore,
        other => panic!("expected a normal run, got {other:?}"),
    }
}

#[test]
fn test_plain_lines() {
    let sink = parse("hello\nworld\n");
    assert_eq!(sink.texts(), vec!["hello", "world"]);
    assert_eq!(sink.lines[0].raw, "hello\n");
    assert!(sink.lines.iter().all(|l| !l.fragment && !l.gagged && l.remote));
    assert_eq!(sink.done, 1);
}

#[test]
fn test_sgr_runs() {
    let sink = parse("\x1b[31mred\x1b[0m plain\n");
    let line = &sink.lines[0];
    assert_eq!(line.text, "red plain");
    assert_eq!(line.raw, "\x1b[31mred\x1b[0m plain\n");
    assert_eq!(line.formats.len(), 2);
    assert_eq!(normal_fore(&line.formats[0]), ColorValue::Code(31));
    assert_eq!(normal_fore(&line.formats[1]), ColorValue::Code(37));
    assert_eq!(runs(line), vec![(0, "red".to_string()), (3, " plain".to_string())]);
}

#[test]
fn test_bold_brightens_foreground() {
    let sink = parse("\x1b[1;32mhi\n");
    let line = &sink.lines[0];
    assert_eq!(line.formats.len(), 1);
    match &line.formats[0] {
        LineFormat::Normal(n) => {
            assert_eq!(n.fore, ColorValue::Code(320));
            assert_eq!(n.back, ColorValue::Code(40));
            assert!(n.style.is_empty());
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_attributes_and_flashing() {
    let sink = parse("\x1b[4;5mx\n");
    match &sink.lines[0].formats[0] {
        LineFormat::Normal(n) => assert_eq!(n.style, FontStyle::UNDERLINE | FontStyle::SLOW),
        other => panic!("unexpected {other:?}"),
    }

    let mut parser = parser_with(|o| o.enable_flashing = false);
    let sink = parse_with(&mut parser, "\x1b[4;5mx\n");
    match &sink.lines[0].formats[0] {
        LineFormat::Normal(n) => assert_eq!(n.style, FontStyle::UNDERLINE),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_inverse_swaps_colors() {
    let sink = parse("\x1b[7;31;44mx\n");
    match &sink.lines[0].formats[0] {
        LineFormat::Normal(n) => {
            assert_eq!(n.fore, ColorValue::Code(44));
            assert_eq!(n.back, ColorValue::Code(31));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_hidden_text_becomes_spaces() {
    let sink = parse("\x1b[8mpw\x1b[0m!\n");
    assert_eq!(sink.lines[0].text, "  !");
}

#[test]
fn test_current_ansi_code() {
    let mut parser = Parser::default();
    parse_with(&mut parser, "\x1b[1;31m");
    assert_eq!(parser.current_ansi_code(), "\x1b[0;31;40;1m");

    parse_with(&mut parser, "\x1b[0;38;5;100;48;2;1;2;3m");
    assert_eq!(parser.current_ansi_code(), "\x1b[0;38;5;100;48;2;1;2;3m");

    parser.clear();
    assert_eq!(parser.current_ansi_code(), "\x1b[0;37;40m");
    assert_eq!(parser.text_length(), 0);
}

#[test]
fn test_sgr_state_survives_lines() {
    let sink = parse("\x1b[33mone\ntwo\n");
    assert_eq!(normal_fore(&sink.lines[1].formats[0]), ColorValue::Code(33));
}

#[test]
fn test_palette_override() {
    let mut parser = Parser::default();
    assert_eq!(parser.color(31), Rgb::new(128, 0, 0));
    parser.set_color(palette_slot(31) as i32, "#ff8000").unwrap();
    assert_eq!(parser.color(31), Rgb::new(255, 128, 0));

    assert!(matches!(parser.set_color(-5, "red"), Err(ParserError::OutOfRange { .. })));
    assert!(matches!(parser.set_color(0, "not a color"), Err(ParserError::InvalidColor(_))));
    assert_eq!(parser.color_table().get(30), parser.color(30));
}

#[test]
fn test_title_sequences() {
    let sink = parse("\x1b]0;My Title\x07after\n\x1b]2;Other\x1b\\\n");
    let titles: Vec<&Event> = sink.events.iter().collect();
    assert_eq!(
        titles,
        vec![&Event::Title("My Title".to_string(), 0), &Event::Title("Other".to_string(), 2)]
    );
    assert_eq!(sink.texts(), vec!["after", ""]);
}

#[test]
fn test_unknown_csi_is_swallowed() {
    let sink = parse("a\x1b[2Kb\x1b[10;5Hc\n");
    assert_eq!(sink.lines[0].text, "abc");
}

#[test]
fn test_aborted_csi_keeps_text() {
    let sink = parse("\x1b[31\nnext\n");
    assert_eq!(sink.texts(), vec!["", "next"]);
}

#[test]
fn test_reset_sequence() {
    let mut parser = Parser::default();
    let sink = parse_with(&mut parser, "\x1b[31mred\x1bcplain\n");
    assert_eq!(sink.lines[0].text, "redplain");
    assert_eq!(normal_fore(sink.lines[0].formats.last().unwrap()), ColorValue::Code(37));
}
