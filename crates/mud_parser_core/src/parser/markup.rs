//! MXP tags, entities and comments as they appear in the text stream.

use crate::mxp::args::decode_char_reference;
use crate::mxp::{TagContext, TagResult};
use crate::{LineFormat, ParserError, ParserSink};

use super::{Parser, ScanState};

impl Parser {
    pub(super) fn tag_name(&mut self, ch: char, sink: &mut dyn ParserSink) -> Result<(), ParserError> {
        match ch {
            '"' | '\'' => {
                self.tag_args.push(ch.to_string());
                self.state = Self::quote_state(ch);
            }
            '&' => self.begin_entity(ScanState::Tag),
            '\n' | '\x1b' => self.abandon_tag(ch, sink),
            ' ' => {
                self.tag_args.push(String::new());
                self.state = ScanState::TagArg;
            }
            '>' => self.finish_tag(sink),
            '<' => {
                // not a tag after all
                let literal = format!("<{}", std::mem::take(&mut self.tag));
                self.tag_args.clear();
                self.state = ScanState::Ground;
                self.put_text(&literal);
                self.redo(ch);
            }
            c => {
                Self::check_token(self.tag.len(), "MXP tag name too long", &self.tag)?;
                self.tag.push(c);
                if self.tag == "!--" {
                    self.tag.clear();
                    self.comment.clear();
                    self.comment.push_str("<!--");
                    self.return_state = ScanState::Ground;
                    self.state = ScanState::Comment;
                }
            }
        }
        Ok(())
    }

    pub(super) fn tag_arg(&mut self, ch: char, sink: &mut dyn ParserSink) -> Result<(), ParserError> {
        match ch {
            '"' | '\'' => {
                self.push_tag_arg(ch);
                self.state = Self::quote_state(ch);
            }
            '&' => self.begin_entity(ScanState::TagArg),
            '\n' | '\x1b' => self.abandon_tag(ch, sink),
            ' ' => {
                if self.tag_args.last().is_some_and(|a| !a.is_empty()) {
                    self.tag_args.push(String::new());
                }
            }
            '>' => self.finish_tag(sink),
            c => {
                self.check_tag_args()?;
                self.push_tag_arg(c);
            }
        }
        Ok(())
    }

    pub(super) fn tag_quoted(&mut self, ch: char, quote: char, sink: &mut dyn ParserSink) -> Result<(), ParserError> {
        match ch {
            '\n' | '\x1b' => self.abandon_tag(ch, sink),
            '&' => self.begin_entity(Self::quote_state(quote)),
            c => {
                self.check_tag_args()?;
                self.push_tag_arg(c);
                if c == quote {
                    self.state = ScanState::TagArg;
                }
            }
        }
        Ok(())
    }

    fn quote_state(quote: char) -> ScanState {
        if quote == '"' { ScanState::TagDoubleQuoted } else { ScanState::TagQuoted }
    }

    fn check_tag_args(&self) -> Result<(), ParserError> {
        let len = self.tag_args.iter().map(String::len).sum();
        Self::check_token(len, "MXP tag arguments too long", &self.tag)
    }

    fn push_tag_arg(&mut self, ch: char) {
        match self.tag_args.last_mut() {
            Some(last) => last.push(ch),
            None => self.tag_args.push(ch.to_string()),
        }
    }

    fn append_to_tag(&mut self, text: &str) {
        if self.return_state == ScanState::Tag {
            self.tag.push_str(text);
        } else {
            match self.tag_args.last_mut() {
                Some(last) => last.push_str(text),
                None => self.tag_args.push(text.to_string()),
            }
        }
    }

    fn abandon_tag(&mut self, ch: char, sink: &mut dyn ParserSink) {
        self.trace(sink, &format!("unterminated MXP tag <{}", self.tag));
        self.tag.clear();
        self.tag_args.clear();
        self.state = ScanState::Ground;
        if ch == '\n' && self.mxp.state.on {
            self.mxp.clear_open();
        }
        self.redo(ch);
    }

    fn begin_entity(&mut self, return_state: ScanState) {
        self.entity.clear();
        self.return_state = return_state;
        self.state = ScanState::Entity;
    }

    pub(super) fn entity_ref(&mut self, ch: char, sink: &mut dyn ParserSink) -> Result<(), ParserError> {
        let in_tag = matches!(
            self.return_state,
            ScanState::Tag | ScanState::TagArg | ScanState::TagQuoted | ScanState::TagDoubleQuoted
        );
        match ch {
            ';' => {
                self.state = self.return_state;
                let name = std::mem::take(&mut self.entity);
                if in_tag {
                    let text = match self.mxp.entity_value(&name) {
                        Some(value) => self.mxp.expand_entities(value),
                        None => format!("&{name};"),
                    };
                    self.append_to_tag(&text);
                } else {
                    self.resolve_entity(&name, sink);
                }
            }
            c if c.is_whitespace() || c == '<' || c == '&' || c == '\x1b' || (in_tag && matches!(c, '>' | '"' | '\'')) => {
                // unterminated reference, keep it as text
                self.state = self.return_state;
                let literal = format!("&{}", std::mem::take(&mut self.entity));
                if in_tag {
                    self.append_to_tag(&literal);
                } else {
                    self.put_text(&literal);
                }
                self.redo(c);
            }
            c => {
                Self::check_token(self.entity.len(), "MXP entity name too long", &self.entity)?;
                self.entity.push(c);
            }
        }
        Ok(())
    }

    fn resolve_entity(&mut self, name: &str, sink: &mut dyn ParserSink) {
        if let Some(value) = self.mxp.entity_value(name) {
            let value = value.to_string();
            if self.inject(&value) {
                return;
            }
            self.put_text(&format!("&{name};"));
            return;
        }
        match decode_char_reference(name) {
            Some(c) => self.put_char(c),
            None => {
                self.trace(sink, &format!("unknown MXP entity &{name};"));
                self.put_text(&format!("&{name};"));
            }
        }
    }

    pub(super) fn comment(&mut self, ch: char, sink: &mut dyn ParserSink) -> Result<(), ParserError> {
        match ch {
            '\n' | '\x1b' => {
                self.trace(sink, "unterminated MXP comment");
                self.comment.clear();
                self.state = self.return_state;
                self.redo(ch);
            }
            c => {
                Self::check_token(self.comment.len(), "MXP comment too long", &self.comment)?;
                self.comment.push(c);
                if self.comment.ends_with("-->") {
                    log::trace!("MXP comment {}", self.comment);
                    self.comment.clear();
                    self.state = self.return_state;
                }
            }
        }
        Ok(())
    }

    fn finish_tag(&mut self, sink: &mut dyn ParserSink) {
        self.state = ScanState::Ground;
        let name = std::mem::take(&mut self.tag);
        let args = std::mem::take(&mut self.tag_args);
        if name.is_empty() {
            return;
        }
        let ctx = TagContext {
            remote: self.remote,
            enable_links: self.options.enable_links,
            show_invalid_tags: self.options.show_invalid_mxp_tags,
            default_image_url: &self.options.default_image_url,
            can_expand: self.expansions < crate::mxp::MAX_EXPANSIONS,
        };
        let result = self.mxp.interpret(&name, &args, &ctx, sink);
        self.apply_tag_result(result, sink);
    }

    fn apply_tag_result(&mut self, result: TagResult, sink: &mut dyn ParserSink) {
        match result {
            TagResult::Handled => self.restyle(),
            TagResult::Format(format) => {
                self.line.push_format(format);
                self.restyle();
            }
            TagResult::Text { format, text } => {
                if let Some(format) = format {
                    self.line.push_format(format);
                }
                self.restyle();
                self.put_text(&text);
            }
            TagResult::Expand(markup) => {
                self.inject(&markup);
            }
            TagResult::HorizontalRule => self.horizontal_rule(sink),
            TagResult::LineBreak => {
                self.close_line();
                self.mxp.capture('\n');
                self.emit_line(sink, false);
                self.text_length += 1;
            }
            TagResult::Expire(name) => {
                self.line.expire_links(&name);
                self.restyle();
            }
        }
    }

    /// `<HR>` ends the current line and emits a line of its own.
    fn horizontal_rule(&mut self, sink: &mut dyn ParserSink) {
        if self.line.len > 0 {
            self.close_line();
            self.mxp.capture('\n');
            self.emit_line(sink, false);
            self.text_length += 1;
        }
        let mut rule = self.current_text_format(0);
        rule.hr = true;
        let mut formats = self.open_line_formats();
        formats[0] = LineFormat::Normal(rule);
        self.line.formats = formats;
        self.close_line();
        self.emit_line(sink, false);
        self.text_length += 1;
    }
}
