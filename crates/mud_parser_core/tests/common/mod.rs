#![allow(dead_code)]

use mud_parser_core::{GaugeData, LineFormat, LineType, MusicData, Parser, ParserLine, ParserOptions, ParserSink, SoundData, StatData};

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Title(String, i32),
    Bell,
    Gauge(GaugeData),
    Stat(StatData),
    Music(MusicData),
    Sound(SoundData),
    Expire(Vec<String>),
    Variable(String, String),
    Flag(String, String),
    Reply(String, Vec<String>),
    TagEnd(LineType, String),
    Debug(String),
}

#[derive(Debug, Default)]
pub struct CollectSink {
    pub lines: Vec<ParserLine>,
    pub removed: usize,
    pub done: usize,
    pub events: Vec<Event>,
}

impl CollectSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.lines.iter().map(|l| l.text.as_str()).collect()
    }

    pub fn last(&self) -> &ParserLine {
        self.lines.last().expect("no line emitted")
    }

    pub fn links(&self, line: usize) -> Vec<String> {
        self.lines[line]
            .formats
            .iter()
            .filter_map(|f| match f {
                LineFormat::Link { href, .. } => Some(href.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn events_without_debug(&self) -> Vec<&Event> {
        self.events.iter().filter(|e| !matches!(e, Event::Debug(_))).collect()
    }
}

impl ParserSink for CollectSink {
    fn add_line(&mut self, line: ParserLine) {
        self.lines.push(line);
    }

    fn remove_last_line(&mut self) {
        self.lines.pop();
        self.removed += 1;
    }

    fn parse_done(&mut self) {
        self.done += 1;
    }

    fn set_title(&mut self, title: &str, kind: i32) {
        self.events.push(Event::Title(title.to_string(), kind));
    }

    fn bell(&mut self) {
        self.events.push(Event::Bell);
    }

    fn gauge(&mut self, gauge: GaugeData) {
        self.events.push(Event::Gauge(gauge));
    }

    fn stat(&mut self, stat: StatData) {
        self.events.push(Event::Stat(stat));
    }

    fn music(&mut self, music: MusicData) {
        self.events.push(Event::Music(music));
    }

    fn sound(&mut self, sound: SoundData) {
        self.events.push(Event::Sound(sound));
    }

    fn expire_links(&mut self, args: Vec<String>) {
        self.events.push(Event::Expire(args));
    }

    fn set_variable(&mut self, name: &str, value: &str) {
        self.events.push(Event::Variable(name.to_string(), value.to_string()));
    }

    fn mxp_flag(&mut self, flag: &str, value: &str) {
        self.events.push(Event::Flag(flag.to_string(), value.to_string()));
    }

    fn mxp_tag_reply(&mut self, tag: &str, args: Vec<String>) {
        self.events.push(Event::Reply(tag.to_string(), args));
    }

    fn mxp_tag_end(&mut self, line_type: LineType, text: &str, _formats: &[LineFormat]) {
        self.events.push(Event::TagEnd(line_type, text.to_string()));
    }

    fn debug(&mut self, message: &str) {
        self.events.push(Event::Debug(message.to_string()));
    }
}

/// Parses `text` as one remote chunk with a default parser.
pub fn parse(text: &str) -> CollectSink {
    let mut parser = Parser::default();
    parse_with(&mut parser, text)
}

pub fn parse_with(parser: &mut Parser, text: &str) -> CollectSink {
    let mut sink = CollectSink::new();
    parser.parse(text, true, false, &mut sink);
    sink
}

pub fn parser_with(configure: impl FnOnce(&mut ParserOptions)) -> Parser {
    let mut options = ParserOptions::default();
    configure(&mut options);
    Parser::new(options)
}

/// Text of every `Normal` run on a line, split at the format offsets.
pub fn runs(line: &ParserLine) -> Vec<(usize, String)> {
    let chars: Vec<char> = line.text.chars().collect();
    let normals: Vec<usize> = line
        .formats
        .iter()
        .filter_map(|f| match f {
            LineFormat::Normal(n) => Some(n.offset),
            _ => None,
        })
        .collect();
    normals
        .iter()
        .enumerate()
        .map(|(i, start)| {
            let end = normals.get(i + 1).copied().unwrap_or(chars.len());
            (*start, chars[*start..end.max(*start)].iter().collect())
        })
        .collect()
}
