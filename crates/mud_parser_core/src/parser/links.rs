//! Bare URL detection.
//!
//! Three triggers start a link: a known single-colon protocol (`mailto:`),
//! `scheme://`, and `www.`. Each looks back into the text already on the line
//! to find where the link starts; the link then grows until a character that
//! cannot be part of a URL, or the bracket the URL was wrapped in, ends it.

use crate::url::{MAX_PROTOCOL_LEN, PROTOCOLS, WWW_PREFIX, char_allowed_in_url, closer_for, is_link_boundary, trailing_trim};
use crate::{LineFormat, ParserError, ParserSink};

use super::{Parser, ScanState};

#[derive(Debug, Clone, Default)]
pub(super) struct UrlScan {
    /// Offset of the first link character
    pub start: usize,
    pub start_byte: usize,
    pub prefix: &'static str,
    /// Line length right after the trigger; the link must extend past it
    pub trigger_end: usize,
    /// Bracket that encloses the whole URL
    pub closer: Option<char>,
    /// Closers of brackets opened inside the URL
    pub nest: Vec<char>,
    pub slashes: u8,
}

impl Parser {
    /// Runs after a `:` was placed on the line.
    pub(super) fn scheme_colon(&mut self) {
        // last character first, the colon itself skipped
        let back: Vec<(usize, char)> = self.line.text.char_indices().rev().skip(1).take(MAX_PROTOCOL_LEN + 1).collect();
        for protocol in PROTOCOLS {
            let n = protocol.len();
            if back.len() < n {
                continue;
            }
            let word: String = back[..n].iter().rev().map(|(_, c)| *c).collect();
            let before = back.get(n).map(|(_, c)| *c);
            if word == protocol && is_link_boundary(before) {
                let start = self.line.len - 1 - n;
                self.begin_url(start, back[n - 1].0, before, "", self.line.len);
                return;
            }
        }
        self.url.slashes = 0;
        self.state = ScanState::UrlScheme;
    }

    /// Runs after a `.` was placed on the line.
    pub(super) fn www_dot(&mut self) {
        let back: Vec<(usize, char)> = self.line.text.char_indices().rev().take(5).collect();
        if back.len() < 4 {
            return;
        }
        let word: String = back[..4].iter().rev().map(|(_, c)| *c).collect();
        let before = back.get(4).map(|(_, c)| *c);
        if word.eq_ignore_ascii_case("www.") && is_link_boundary(before) {
            self.begin_url(self.line.len - 4, back[3].0, before, WWW_PREFIX, self.line.len);
        }
    }

    pub(super) fn url_scheme(&mut self, ch: char) -> Result<(), ParserError> {
        if ch != '/' {
            self.state = ScanState::Ground;
            self.redo(ch);
            return Ok(());
        }
        self.put_char('/');
        self.url.slashes += 1;
        if self.url.slashes < 2 {
            return Ok(());
        }

        self.state = ScanState::Ground;
        let colon = self.line.len.checked_sub(3).ok_or(ParserError::InvalidState("URL scheme without '://'"))?;
        let mut scheme_len = 0;
        let mut start_byte = None;
        let mut before = None;
        for (i, c) in self.line.text.char_indices().rev().skip(3) {
            if !char_allowed_in_url(c, true) {
                before = Some(c);
                break;
            }
            scheme_len += 1;
            start_byte = Some(i);
        }
        if let Some(start_byte) = start_byte {
            self.begin_url(colon - scheme_len, start_byte, before, "", self.line.len);
        }
        Ok(())
    }

    /// `start` is the character offset of the link, `start_byte` the same position in the line text.
    fn begin_url(&mut self, start: usize, start_byte: usize, before: Option<char>, prefix: &'static str, trigger_end: usize) {
        self.url = UrlScan {
            start,
            start_byte,
            prefix,
            trigger_end,
            closer: closer_for(before),
            nest: Vec::new(),
            slashes: 0,
        };
        self.state = ScanState::UrlFound;
    }

    /// Link text scanned so far.
    pub(super) fn url_text(&self) -> &str {
        self.line.text.get(self.url.start_byte..).unwrap_or_default()
    }

    pub(super) fn url_found(&mut self, ch: char, sink: &mut dyn ParserSink) -> Result<(), ParserError> {
        if !char_allowed_in_url(ch, false) {
            self.finish_url(sink);
            self.redo(ch);
            return Ok(());
        }
        match ch {
            '(' => self.url.nest.push(')'),
            '[' => self.url.nest.push(']'),
            c if self.url.nest.last() == Some(&c) => {
                self.url.nest.pop();
            }
            c if self.url.nest.is_empty() && self.url.closer == Some(c) => {
                self.finish_url(sink);
                self.redo(c);
                return Ok(());
            }
            _ => {}
        }
        self.put_char(ch);
        Ok(())
    }

    /// Marks the scanned URL on the line. Trailing punctuation stays outside the link.
    fn finish_url(&mut self, sink: &mut dyn ParserSink) {
        self.state = ScanState::Ground;
        let start = self.url.start;
        let tail = self.url_text();
        let end = self.line.len - trailing_trim(tail);
        if end <= self.url.trigger_end {
            return;
        }
        let href: String = format!("{}{}", self.url.prefix, tail.chars().take(end - start).collect::<String>());
        self.trace(sink, &format!("URL found: {href}"));

        self.line.insert_format(LineFormat::Link { offset: start, href });
        if end == self.line.len {
            self.line.insert_format(LineFormat::LinkEnd { offset: end });
            self.restyle();
        } else {
            let normal = self.line.normal_at(end);
            self.line.insert_format(LineFormat::LinkEnd { offset: end });
            if let Some(mut normal) = normal {
                normal.offset = end;
                self.line.insert_format(LineFormat::Normal(normal));
            }
        }
    }
}
