mod common;

use common::{CollectSink, Event, parse, parse_with, parser_with, runs};
use mud_parser_core::{FontStyle, LineFormat, MusicData, ParseStatus, Parser, SoundData};
use pretty_assertions::assert_eq;

#[test]
fn test_fragment_is_replaced() {
    let mut parser = Parser::default();
    let mut sink = CollectSink::new();
    parser.parse("Hello ", true, false, &mut sink);
    assert_eq!(sink.lines.len(), 1);
    assert!(sink.lines[0].fragment);
    assert_eq!(sink.lines[0].text, "Hello ");
    assert!(!parser.at_end_of_line());

    parser.parse("world\n", true, false, &mut sink);
    assert_eq!(sink.removed, 1);
    assert_eq!(sink.texts(), vec!["Hello world"]);
    assert!(!sink.lines[0].fragment);
    assert_eq!(sink.lines[0].raw, "Hello world\n");
    assert_eq!(sink.done, 2);
    assert!(parser.at_end_of_line());
}

#[test]
fn test_no_fragment_for_empty_line() {
    let mut parser = Parser::default();
    let mut sink = CollectSink::new();
    parser.parse("one\n", true, false, &mut sink);
    parser.parse("two\n", true, false, &mut sink);
    assert_eq!(sink.removed, 0);
    assert_eq!(sink.texts(), vec!["one", "two"]);
}

#[test]
fn test_split_escape_sequence() {
    let mut parser = Parser::default();
    let mut sink = CollectSink::new();
    parser.parse("\x1b[3", true, false, &mut sink);
    assert!(sink.lines.is_empty());
    parser.parse("1mred\n", true, false, &mut sink);
    assert_eq!(sink.texts(), vec!["red"]);
    assert!(matches!(&sink.lines[0].formats[0], LineFormat::Normal(n) if n.fore == mud_parser_core::ColorValue::Code(31)));
}

#[test]
fn test_split_mxp_tag() {
    let mut parser = Parser::default();
    let mut sink = CollectSink::new();
    parser.parse("\x1b[0z<B", true, false, &mut sink);
    parser.parse(">bold</B> plain\n", true, false, &mut sink);
    let line = sink.lines.last().unwrap();
    assert_eq!(line.text, "bold plain");
    assert_eq!(runs(line), vec![(0, "bold".to_string()), (4, " plain".to_string())]);
    assert!(matches!(&line.formats[0], LineFormat::Normal(n) if n.style == FontStyle::BOLD));
}

#[test]
fn test_queue() {
    let mut parser = Parser::default();
    let mut sink = CollectSink::new();
    assert!(!parser.parse_next(&mut sink));

    parser.enqueue("a\n", true);
    assert_eq!(parser.parse("b", false, false, &mut sink), ParseStatus::Queued);
    assert_eq!(parser.pending_len(), 2);
    assert!(!parser.queue_ends_with_newline());
    parser.enqueue("\n", true);
    assert!(parser.queue_ends_with_newline());
    assert!(sink.lines.is_empty());

    assert_eq!(parser.parse("forced\n", true, true, &mut sink), ParseStatus::Parsed);
    assert_eq!(sink.texts(), vec!["forced"]);

    assert_eq!(parser.drain(&mut sink), 3);
    assert_eq!(parser.pending_len(), 0);
    assert_eq!(sink.texts(), vec!["forced", "a", "b"]);
    assert_eq!(sink.removed, 1);
    assert_eq!(parser.parse("c\n", true, false, &mut sink), ParseStatus::Parsed);
}

#[test]
fn test_bell() {
    let sink = parse("ding\x07\n");
    assert_eq!(sink.lines[0].text, "ding");
    assert_eq!(sink.events, vec![Event::Bell]);

    let mut parser = parser_with(|o| {
        o.enable_bell = false;
        o.display_control_codes = true;
    });
    let sink = parse_with(&mut parser, "ding\x07\n");
    assert_eq!(sink.lines[0].text, "ding␇");
    assert!(sink.events.is_empty());
}

#[test]
fn test_bell_sound_is_host_setting() {
    let options = mud_parser_core::ParserOptions::from_toml_str("bell_sound = \"chime.ogg\"\n").unwrap();
    let mut parser = Parser::new(options);
    let sink = parse_with(&mut parser, "ding\x07\n");
    assert_eq!(sink.events, vec![Event::Bell]);
    assert_eq!(sink.lines[0].text, "ding");
    assert_eq!(parser.options().bell_sound, "chime.ogg");
}

#[test]
fn test_tab_backspace_and_carriage_return() {
    let sink = parse("a\tb\nabc\x08d\nline\r\nx\ry\n");
    assert_eq!(sink.texts(), vec!["a       b", "abd", "line", "xy"]);

    let mut parser = parser_with(|o| o.tab_width = 4);
    let sink = parse_with(&mut parser, "ab\tc\n");
    assert_eq!(sink.lines[0].text, "ab  c");
}

#[test]
fn test_control_code_display() {
    let sink = parse("a\x01b\n");
    assert_eq!(sink.lines[0].text, "ab");

    let mut parser = parser_with(|o| o.emulate_terminal = true);
    let sink = parse_with(&mut parser, "a\x01b\u{80}\u{b0}\n");
    assert_eq!(sink.lines[0].text, "a☺bÇ░");

    let mut parser = parser_with(|o| o.display_control_codes = true);
    let sink = parse_with(&mut parser, "a\x01b\n");
    assert_eq!(sink.lines[0].text, "a␁b");
}

#[test]
fn test_raw_control_codes_without_emulation() {
    let mut parser = parser_with(|o| {
        o.emulate_control_codes = false;
        o.display_control_codes = true;
    });
    let sink = parse_with(&mut parser, "a\x1b[31mb\n");
    assert_eq!(sink.lines[0].text, "a␛[31mb");
}

#[test]
fn test_erase_display() {
    let mut parser = parser_with(|o| o.window.height = 3);
    let sink = parse_with(&mut parser, "top\x1b[2Jafter\n");
    assert_eq!(sink.texts(), vec!["top", "", "", "", "after"]);
    assert_eq!(parser.text_length(), 13);
}

#[test]
fn test_text_length() {
    let mut parser = Parser::default();
    parse_with(&mut parser, "ab\ncd");
    assert_eq!(parser.text_length(), 5);
    assert!(!parser.at_end_of_line());
    parser.clear();
    assert_eq!(parser.text_length(), 0);
}

#[test]
fn test_msp_sound() {
    let sink = parse("!!SOUND(rain.wav V=50 L=2)\nnext\n");
    assert_eq!(sink.texts(), vec!["next"]);
    assert_eq!(
        sink.events,
        vec![Event::Sound(SoundData {
            off: false,
            file: "rain.wav".to_string(),
            url: String::new(),
            volume: 50,
            repeat: 2,
            priority: 50,
            sound_type: String::new(),
        })]
    );
}

#[test]
fn test_msp_music_off() {
    let sink = parse("!!MUSIC(Off)\r\n");
    assert!(sink.lines.is_empty());
    assert_eq!(
        sink.events,
        vec![Event::Music(MusicData {
            off: true,
            file: String::new(),
            url: String::new(),
            volume: 100,
            repeat: 1,
            continue_playing: true,
            music_type: String::new(),
        })]
    );
}

#[test]
fn test_msp_only_at_line_start() {
    let sink = parse("say !!SOUND(x)\n!hello\n!!\n");
    assert_eq!(sink.texts(), vec!["say !!SOUND(x)", "!hello", "!!"]);
    assert!(sink.events.is_empty());

    let mut parser = parser_with(|o| o.enable_msp = false);
    let sink = parse_with(&mut parser, "!!SOUND(x)\n");
    assert_eq!(sink.texts(), vec!["!!SOUND(x)"]);
}

#[test]
fn test_msp_split_across_chunks() {
    let mut parser = Parser::default();
    let mut sink = CollectSink::new();
    parser.parse("!!SOU", true, false, &mut sink);
    parser.parse("ND(a.wav)\n", true, false, &mut sink);
    assert!(sink.lines.is_empty());
    assert!(matches!(&sink.events[0], Event::Sound(s) if s.file == "a.wav"));
}

#[test]
fn test_debug_messages() {
    let mut parser = parser_with(|o| o.enable_debug = true);
    let sink = parse_with(&mut parser, "\x1b[0z&bogus;\n");
    assert_eq!(sink.lines[0].text, "&bogus;");
    assert!(sink.events.contains(&Event::Debug("unknown MXP entity &bogus;".to_string())));
}

#[test]
fn test_oversized_sequence_is_dropped() {
    let mut parser = parser_with(|o| o.enable_debug = true);
    let text = format!("\x1b[{}mok\n", "1".repeat(10_000));
    let sink = parse_with(&mut parser, &text);
    assert!(sink.lines[0].text.ends_with("mok"));
    assert!(sink.events.iter().any(|e| matches!(e, Event::Debug(m) if m.contains("CSI parameters too long"))));

    let sink = parse_with(&mut parser, "after\n");
    assert_eq!(sink.texts(), vec!["after"]);
}

#[test]
fn test_bare_carriage_return_ends_secure_mode() {
    let sink = parse("\x1b[1z\r<B>x</B>\n");
    assert_eq!(sink.lines[0].text, "<B>x</B>");
}

#[test]
fn test_options_from_toml() {
    let options = mud_parser_core::ParserOptions::from_toml_str("enable_mxp = false\ntab_width = 2\nwindow = { width = 80, height = 40 }\n").unwrap();
    assert!(!options.enable_mxp);
    assert_eq!(options.tab_width, 2);
    assert_eq!(options.window.height, 40);

    let mut parser = Parser::new(options);
    parser.update_window(100, 10);
    assert_eq!(parser.options().window.height, 10);
    parser.options_mut().tab_width = 3;
    assert_eq!(parser.options().tab_width, 3);

    assert!(mud_parser_core::ParserOptions::from_toml_str("tab_width = \"wide\"").is_err());
}
