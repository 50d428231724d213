//! Plain text, control codes, line ends and MSP triggers.

use crate::mxp::TagContext;
use crate::{FontStyle, LineType, ParserError, ParserSink, oem};

use super::{Parser, ScanState};

const MSP_TRIGGERS: [(&str, ScanState); 2] = [("!!SOUND(", ScanState::MspSound), ("!!MUSIC(", ScanState::MspMusic)];

impl Parser {
    pub(super) fn ground(&mut self, ch: char, sink: &mut dyn ParserSink) -> Result<(), ParserError> {
        // a line break that followed an MSP trigger belongs to the trigger
        if self.swallow_newline {
            match ch {
                '\r' => return Ok(()),
                '\n' => {
                    self.swallow_newline = false;
                    return Ok(());
                }
                _ => self.swallow_newline = false,
            }
        }
        // ESC[4z only secures a tag that follows immediately
        if self.temp_secure_pending {
            self.temp_secure_pending = false;
            if ch != '<' {
                self.mxp.state.line_type = LineType::OPEN;
                self.mxp.state.on = false;
            }
        }
        // a bare carriage return starts an unsecured line
        if self.pending_cr {
            self.pending_cr = false;
            if ch != '\n' && !self.mxp.state.locked {
                if self.mxp.state.on {
                    self.mxp.clear_open();
                }
                self.mxp.state.on = false;
                self.mxp.state.line_type = LineType::OPEN;
            }
        }

        let control = self.options.emulate_control_codes;
        match ch {
            '\n' => self.newline(sink),
            '\x07' if control => self.bell(sink),
            '\x08' if control => self.backspace(),
            '\t' if control => self.tab(),
            '\r' if control => self.pending_cr = true,
            '\x1b' if control => self.state = ScanState::Escape,
            c if c < ' ' || c == '\x7f' => self.control_char(c),
            ' ' => self.put_char(' '),
            _ if self.ansi.attributes.contains(FontStyle::HIDDEN) => self.put_char(' '),
            '<' if self.mxp_active() => {
                self.tag.clear();
                self.tag_args.clear();
                self.state = ScanState::Tag;
            }
            '&' if self.mxp_active() => {
                self.entity.clear();
                self.return_state = ScanState::Ground;
                self.state = ScanState::Entity;
            }
            ':' => {
                self.put_char(':');
                if self.options.enable_url_detection {
                    self.scheme_colon();
                }
            }
            '.' => {
                self.put_char('.');
                if self.options.enable_url_detection {
                    self.www_dot();
                }
            }
            '!' if self.options.enable_msp && self.line.len == 0 => {
                self.msp_prefix.clear();
                self.msp_prefix.push('!');
                self.state = ScanState::MspPrefix;
            }
            c if self.options.emulate_terminal => self.put_char(oem::cp437_glyph(c)),
            c => self.put_char(c),
        }
        Ok(())
    }

    fn bell(&mut self, sink: &mut dyn ParserSink) {
        if self.options.emulate_terminal || self.options.display_control_codes {
            self.put_char('␇');
        }
        if self.options.enable_bell {
            sink.bell();
        }
    }

    fn backspace(&mut self) {
        self.line.backspace();
        if self.options.display_control_codes {
            self.put_char('◘');
        }
        self.mxp.state.no_break = false;
    }

    fn tab(&mut self) {
        let width = self.options.tab_width.max(1);
        let spaces = width - self.line.len % width;
        for _ in 0..spaces {
            self.put_char(' ');
        }
    }

    fn control_char(&mut self, ch: char) {
        let glyph = if self.options.emulate_terminal {
            oem::control_glyph(ch)
        } else if self.options.display_control_codes {
            oem::control_picture(ch)
        } else {
            None
        };
        match glyph {
            Some(glyph) => self.put_char(glyph),
            None => log::trace!("dropping control character {}", crate::print_char_value(ch)),
        }
    }

    pub(super) fn newline(&mut self, sink: &mut dyn ParserSink) {
        if self.mxp.state.no_break || self.mxp.state.paragraph {
            return;
        }
        let mut gagged = false;
        if !self.mxp.state.locked {
            if !self.mxp.state.line_expanded {
                let closing = self.mxp.active_line_tag().map(|tag| {
                    let mut closing = String::new();
                    if !tag.element.is_empty() {
                        closing.push_str(&format!("</{}>", tag.element));
                    }
                    closing.push_str(&tag.close_definition);
                    closing
                });
                if let Some(closing) = closing.filter(|c| !c.is_empty()) {
                    // close the line tag markup first, then see this line end again
                    self.mxp.state.line_expanded = true;
                    self.redo('\n');
                    self.inject(&closing);
                    return;
                }
            }
            if self.mxp.state.line_type != LineType::OPEN {
                sink.mxp_tag_end(self.mxp.state.line_type, &self.line.text, &self.line.formats);
            }
            self.mxp.state.line_expanded = false;
            self.close_line();
            if self.mxp.state.on {
                self.mxp.clear_open();
            }
            self.mxp.state.on = false;
            gagged = self.mxp.active_line_tag().is_some_and(|tag| tag.gag) || self.mxp.state.gagged;
            self.mxp.state.line_type = self.mxp.default_mode;
            if !self.options.enable_mxp {
                self.mxp.styles.reset();
            }
        } else {
            self.close_line();
            if self.mxp.state.on {
                self.mxp.clear_open();
            }
        }

        if !gagged {
            self.mxp.capture('\n');
        }
        self.emit_line(sink, gagged);
        self.text_length += 1;
        self.mxp.state.no_break = false;
    }

    pub(super) fn msp_prefix(&mut self, ch: char) -> Result<(), ParserError> {
        self.msp_prefix.push(ch);
        for (trigger, state) in MSP_TRIGGERS {
            if trigger == self.msp_prefix {
                self.msp_prefix.clear();
                self.msp_args.clear();
                self.msp_args.push(String::new());
                self.state = state;
                return Ok(());
            }
            if trigger.starts_with(self.msp_prefix.as_str()) {
                return Ok(());
            }
        }
        // not a trigger: the first '!' is text, everything after it is scanned again
        let rest: Vec<char> = self.msp_prefix.chars().skip(1).collect();
        self.msp_prefix.clear();
        self.state = ScanState::Ground;
        self.put_char('!');
        for c in rest.into_iter().rev() {
            self.redo(c);
        }
        Ok(())
    }

    pub(super) fn msp_args(&mut self, ch: char, tag: &str, sink: &mut dyn ParserSink) -> Result<(), ParserError> {
        match ch {
            ')' => {
                self.state = ScanState::Ground;
                let args: Vec<String> = std::mem::take(&mut self.msp_args).into_iter().filter(|a| !a.is_empty()).collect();
                log::debug!("MSP {tag} {args:?}");
                let saved = self.mxp.state.line_type;
                self.mxp.state.line_type = LineType::TEMP_SECURE;
                let ctx = TagContext {
                    remote: self.remote,
                    enable_links: self.options.enable_links,
                    show_invalid_tags: false,
                    default_image_url: &self.options.default_image_url,
                    // the result is not applied, so nothing may be expanded
                    can_expand: false,
                };
                self.mxp.interpret(tag, &args, &ctx, sink);
                self.mxp.state.line_type = saved;
                self.swallow_newline = true;
            }
            '\n' => {
                self.trace(sink, &format!("unterminated MSP {tag} trigger"));
                self.msp_args.clear();
                self.state = ScanState::Ground;
                self.redo(ch);
            }
            ' ' => {
                if self.msp_args.last().is_some_and(|a| !a.is_empty()) {
                    self.msp_args.push(String::new());
                }
            }
            c => {
                let len = self.msp_args.iter().map(String::len).sum();
                Self::check_token(len, "MSP trigger too long", &format!("!!{tag}("))?;
                match self.msp_args.last_mut() {
                    Some(last) => last.push(c),
                    None => self.msp_args.push(c.to_string()),
                }
            }
        }
        Ok(())
    }
}
