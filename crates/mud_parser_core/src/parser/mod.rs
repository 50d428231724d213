//! The stream parser
//!
//! A character-at-a-time state machine over ANSI escapes, MXP markup, MSP
//! triggers and plain text. Scan state survives chunk boundaries, so a
//! sequence split across two network reads is simply finished by the next
//! `parse` call. Markup produced by entity and element expansion is pushed back
//! onto the pending input and scanned like network text.

mod escape;
mod line;
mod links;
mod markup;
mod text;

use std::collections::VecDeque;

use crate::mxp::MxpEngine;
use crate::{
    AnsiColorProcessor, ColorTable, ErrorLevel, FontStyle, LineFormat, ParserError, ParserLine, ParserOptions, ParserSink, Rgb, TextFormat,
};

pub(crate) use line::{LineBuilder, insert_sorted, prune_formats};
use links::UrlScan;

/// Longest escape parameter list, tag, entity, comment or title accepted before the token is dropped.
const MAX_TOKEN_LEN: usize = 8192;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum ScanState {
    #[default]
    Ground,
    Escape,
    /// `ESC (`, `ESC )` and `ESC #` take one more character
    EscapeArgument,
    Csi,
    Title,
    TitleEscape,
    Tag,
    TagArg,
    TagQuoted,
    TagDoubleQuoted,
    Entity,
    Comment,
    /// Saw `:`, waiting for `//`
    UrlScheme,
    UrlFound,
    /// Matching `!!SOUND(` / `!!MUSIC(` at the start of a line
    MspPrefix,
    MspSound,
    MspMusic,
}

/// A character waiting to be scanned. `raw` characters came from the network
/// and are recorded in the line's raw text when consumed.
#[derive(Debug, Clone, Copy)]
struct InputChar {
    ch: char,
    raw: bool,
}

/// Outcome of [`Parser::parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStatus {
    /// The chunk was scanned and its lines delivered.
    Parsed,
    /// Earlier chunks are still waiting; this one was appended to the queue.
    Queued,
}

pub struct Parser {
    options: ParserOptions,
    colors: ColorTable,
    ansi: AnsiColorProcessor,
    mxp: MxpEngine,

    state: ScanState,
    /// State an entity or comment returns to
    return_state: ScanState,
    line: LineBuilder,
    /// Pending input, next character last
    input: Vec<InputChar>,
    queue: VecDeque<(String, bool)>,
    remote: bool,
    text_length: usize,
    fragment_pending: bool,
    expansions: usize,

    params: String,
    title: String,
    title_kind: Option<i32>,
    tag: String,
    tag_args: Vec<String>,
    entity: String,
    comment: String,
    msp_prefix: String,
    msp_args: Vec<String>,
    url: UrlScan,

    pending_cr: bool,
    temp_secure_pending: bool,
    swallow_newline: bool,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new(ParserOptions::default())
    }
}

impl Parser {
    pub fn new(options: ParserOptions) -> Self {
        let mut parser = Self {
            options,
            colors: ColorTable::new(),
            ansi: AnsiColorProcessor::new(),
            mxp: MxpEngine::new(),
            state: ScanState::Ground,
            return_state: ScanState::Ground,
            line: LineBuilder::default(),
            input: Vec::new(),
            queue: VecDeque::new(),
            remote: false,
            text_length: 0,
            fragment_pending: false,
            expansions: 0,
            params: String::new(),
            title: String::new(),
            title_kind: None,
            tag: String::new(),
            tag_args: Vec::new(),
            entity: String::new(),
            comment: String::new(),
            msp_prefix: String::new(),
            msp_args: Vec::new(),
            url: UrlScan::default(),
            pending_cr: false,
            temp_secure_pending: false,
            swallow_newline: false,
        };
        parser.line = LineBuilder::new(parser.open_line_formats());
        parser
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut ParserOptions {
        &mut self.options
    }

    pub fn update_window(&mut self, width: usize, height: usize) {
        self.options.window.width = width;
        self.options.window.height = height;
    }

    /// Scans one chunk of server (or local, `remote == false`) text.
    ///
    /// While earlier chunks wait in the queue a new chunk is queued behind them
    /// unless `force` is set; [`Parser::parse_next`] and [`Parser::drain`]
    /// process the queue in arrival order.
    pub fn parse(&mut self, text: &str, remote: bool, force: bool, sink: &mut dyn ParserSink) -> ParseStatus {
        if !force && !self.queue.is_empty() {
            self.queue.push_back((text.to_string(), remote));
            return ParseStatus::Queued;
        }
        self.process(text, remote, sink);
        ParseStatus::Parsed
    }

    pub fn enqueue(&mut self, text: impl Into<String>, remote: bool) {
        self.queue.push_back((text.into(), remote));
    }

    /// Parses the oldest queued chunk. Returns false when the queue was empty.
    pub fn parse_next(&mut self, sink: &mut dyn ParserSink) -> bool {
        match self.queue.pop_front() {
            Some((text, remote)) => {
                self.process(&text, remote, sink);
                true
            }
            None => false,
        }
    }

    /// Parses every queued chunk and returns how many there were.
    pub fn drain(&mut self, sink: &mut dyn ParserSink) -> usize {
        let mut parsed = 0;
        while self.parse_next(sink) {
            parsed += 1;
        }
        parsed
    }

    pub fn pending_len(&self) -> usize {
        self.queue.len()
    }

    /// Whether the most recently queued chunk completes its line.
    pub fn queue_ends_with_newline(&self) -> bool {
        self.queue.back().is_some_and(|(text, _)| text.ends_with('\n'))
    }

    /// Resets ANSI colors, the text counter and any half scanned sequence.
    pub fn clear(&mut self) {
        self.ansi.reset();
        self.text_length = 0;
        self.abandon_token();
        self.pending_cr = false;
        self.temp_secure_pending = false;
        self.swallow_newline = false;
    }

    /// Forgets all MXP elements, entities and line tags and resets MXP state.
    pub fn clear_mxp(&mut self) {
        self.mxp.clear();
    }

    /// Resets the MXP style stack.
    pub fn reset_mxp(&mut self) {
        self.mxp.styles.reset();
    }

    /// Returns the line mode and its default to open.
    pub fn reset_mxp_line(&mut self) {
        self.mxp.reset_line();
    }

    /// Value of a published entity, otherwise the name itself.
    pub fn public_entity(&self, name: &str) -> String {
        self.mxp.public_entity(name)
    }

    /// Style version announced by the server with `<VERSION x>`.
    pub fn style_version(&self) -> Option<&str> {
        self.mxp.style_version.as_deref()
    }

    pub fn color(&self, code: i32) -> Rgb {
        self.colors.get(code)
    }

    pub fn set_color(&mut self, slot: i32, color: &str) -> Result<(), ParserError> {
        self.colors.set(slot, color)
    }

    pub fn color_table(&self) -> &ColorTable {
        &self.colors
    }

    pub fn ansi(&self) -> &AnsiColorProcessor {
        &self.ansi
    }

    /// SGR sequence reproducing the current ANSI colors and attributes.
    pub fn current_ansi_code(&self) -> String {
        self.ansi.current_as_escape_sequence()
    }

    pub fn mxp_state(&self) -> &crate::MxpState {
        &self.mxp.state
    }

    pub fn entity(&self, name: &str) -> Option<&crate::Entity> {
        self.mxp.entities.get(name)
    }

    pub fn element(&self, name: &str) -> Option<&crate::Element> {
        self.mxp.elements.get(&name.to_ascii_uppercase())
    }

    pub fn line_tag(&self, index: i32) -> Option<&crate::LineTag> {
        self.mxp.line_tags.get(&index)
    }

    /// Characters displayed so far, line breaks included.
    pub fn text_length(&self) -> usize {
        self.text_length
    }

    /// No partial line is waiting for more text.
    pub fn at_end_of_line(&self) -> bool {
        self.line.len == 0
    }

    fn process(&mut self, text: &str, remote: bool, sink: &mut dyn ParserSink) {
        if self.fragment_pending {
            sink.remove_last_line();
            self.fragment_pending = false;
        }
        self.remote = remote;
        self.expansions = 0;
        self.input.extend(text.chars().rev().map(|ch| InputChar { ch, raw: true }));

        while let Some(next) = self.input.pop() {
            if next.raw {
                self.line.raw.push(next.ch);
            }
            if let Err(err) = self.step(next.ch, sink) {
                self.report(&err, sink);
                self.abandon_token();
            }
        }

        self.emit_fragment(sink);
        sink.parse_done();
        for args in std::mem::take(&mut self.mxp.pending_expires) {
            sink.expire_links(args);
        }
    }

    fn step(&mut self, ch: char, sink: &mut dyn ParserSink) -> Result<(), ParserError> {
        match self.state {
            ScanState::Ground => self.ground(ch, sink),
            ScanState::Escape => self.escape(ch),
            ScanState::EscapeArgument => {
                self.state = ScanState::Ground;
                Ok(())
            }
            ScanState::Csi => self.csi(ch, sink),
            ScanState::Title => self.title(ch, sink),
            ScanState::TitleEscape => self.title_escape(ch, sink),
            ScanState::Tag => self.tag_name(ch, sink),
            ScanState::TagArg => self.tag_arg(ch, sink),
            ScanState::TagQuoted => self.tag_quoted(ch, '\'', sink),
            ScanState::TagDoubleQuoted => self.tag_quoted(ch, '"', sink),
            ScanState::Entity => self.entity_ref(ch, sink),
            ScanState::Comment => self.comment(ch, sink),
            ScanState::UrlScheme => self.url_scheme(ch),
            ScanState::UrlFound => self.url_found(ch, sink),
            ScanState::MspPrefix => self.msp_prefix(ch),
            ScanState::MspSound => self.msp_args(ch, "SOUND", sink),
            ScanState::MspMusic => self.msp_args(ch, "MUSIC", sink),
        }
    }

    /// Drops whatever token is half scanned and returns to plain text.
    fn abandon_token(&mut self) {
        self.state = ScanState::Ground;
        self.return_state = ScanState::Ground;
        self.params.clear();
        self.title.clear();
        self.title_kind = None;
        self.tag.clear();
        self.tag_args.clear();
        self.entity.clear();
        self.comment.clear();
        self.msp_prefix.clear();
        self.msp_args.clear();
    }

    fn report(&self, err: &ParserError, sink: &mut dyn ParserSink) {
        match err.level() {
            ErrorLevel::Error => log::error!("{err}"),
            ErrorLevel::Warning => log::warn!("{err}"),
            ErrorLevel::Info => log::info!("{err}"),
        }
        if self.options.enable_debug {
            sink.debug(&err.to_string());
        }
    }

    fn trace(&self, sink: &mut dyn ParserSink, message: &str) {
        log::debug!("{message}");
        if self.options.enable_debug {
            sink.debug(message);
        }
    }

    /// Rejects a token that grew past [`MAX_TOKEN_LEN`].
    fn check_token(len: usize, description: &'static str, token: &str) -> Result<(), ParserError> {
        if len >= MAX_TOKEN_LEN {
            return Err(ParserError::MalformedSequence {
                description,
                sequence: Some(token.chars().take(32).collect()),
            });
        }
        Ok(())
    }

    /// Scans `ch` again in the current state without recording it as raw text.
    fn redo(&mut self, ch: char) {
        self.input.push(InputChar { ch, raw: false });
    }

    /// Queues expansion markup in front of the remaining input.
    /// Returns false once the per chunk expansion limit is reached.
    fn inject(&mut self, text: &str) -> bool {
        if self.expansions >= crate::mxp::MAX_EXPANSIONS {
            log::warn!("MXP expansion limit reached, dropping {} characters", text.len());
            return false;
        }
        self.expansions += 1;
        self.input.extend(text.chars().rev().map(|ch| InputChar { ch, raw: false }));
        true
    }

    /// Display state of the next run.
    fn current_text_format(&self, offset: usize) -> TextFormat {
        let style = self.mxp.current_style();
        let (fore, back) = self.ansi.resolve_colors(&style, &self.colors);
        let mut flags = style.style | (self.ansi.attributes - FontStyle::BOLD);
        if !self.options.enable_flashing {
            flags -= FontStyle::SLOW | FontStyle::RAPID;
        }
        TextFormat {
            offset,
            fore,
            back,
            font: style.font,
            size: style.font_size,
            style: flags,
            hr: false,
        }
    }

    /// Starts a new run with the current style.
    fn restyle(&mut self) {
        let format = self.current_text_format(self.line.len);
        self.line.formats.push(LineFormat::Normal(format));
    }

    /// Formats every line starts with: the current run and re-opened links.
    fn open_line_formats(&self) -> Vec<LineFormat> {
        let mut formats = vec![LineFormat::Normal(self.current_text_format(0))];
        if self.mxp.state.on {
            formats.extend(self.mxp.styles.open_links().map(|link| {
                let mut link = link.clone();
                link.set_offset(0);
                link
            }));
        }
        formats
    }

    /// Ends of the links still open on the style stack, innermost first.
    fn close_link_formats(&self) -> Vec<LineFormat> {
        if !self.mxp.state.on {
            return Vec::new();
        }
        let offset = self.line.len;
        self.mxp
            .styles
            .open_links()
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .filter_map(|link| match link {
                LineFormat::MxpLink(_) => Some(LineFormat::MxpLinkEnd { offset }),
                LineFormat::MxpSend(_) => Some(LineFormat::MxpSendEnd { offset }),
                _ => None,
            })
            .collect()
    }

    /// Closes the links of the current line before it is emitted.
    fn close_line(&mut self) {
        let closing = self.close_link_formats();
        self.line.formats.extend(closing);
    }

    /// Hands the current line to the sink and starts the next one.
    fn emit_line(&mut self, sink: &mut dyn ParserSink, gagged: bool) {
        let next = LineBuilder::new(self.open_line_formats());
        let line = std::mem::replace(&mut self.line, next);
        let formats = prune_formats(line.formats, line.len, false);
        sink.add_line(ParserLine {
            text: line.text,
            raw: line.raw,
            formats,
            fragment: false,
            gagged,
            remote: self.remote,
        });
    }

    /// Emits the unfinished line as a provisional fragment. The line stays in
    /// the builder and is retracted when the next chunk arrives.
    fn emit_fragment(&mut self, sink: &mut dyn ParserSink) {
        if self.line.len == 0 {
            return;
        }
        let mut formats = self.line.formats.clone();
        if self.state == ScanState::UrlFound {
            insert_sorted(
                &mut formats,
                LineFormat::Link {
                    offset: self.url.start,
                    href: format!("{}{}", self.url.prefix, self.url_text()),
                },
            );
        }
        formats.extend(self.close_link_formats());
        sink.add_line(ParserLine {
            text: self.line.text.clone(),
            raw: self.line.raw.clone(),
            formats: prune_formats(formats, self.line.len, true),
            fragment: true,
            gagged: false,
            remote: self.remote,
        });
        self.fragment_pending = true;
    }

    /// Appends displayed text to the line and to the MXP capture buffers.
    fn put_char(&mut self, ch: char) {
        self.line.push_char(ch);
        self.mxp.capture(ch);
        self.text_length += 1;
        self.mxp.state.no_break = false;
    }

    fn put_text(&mut self, text: &str) {
        for ch in text.chars() {
            self.put_char(ch);
        }
    }

    fn mxp_active(&self) -> bool {
        self.options.enable_mxp && self.mxp.state.on
    }
}
