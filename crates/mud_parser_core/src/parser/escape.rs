//! `ESC` sequences: CSI (SGR colors, MXP line modes, erase) and OSC titles.

use crate::ansi::parse_sgr_params;
use crate::{LineType, ParserError, ParserSink, print_char_value};

use super::{Parser, ScanState};

impl Parser {
    pub(super) fn escape(&mut self, ch: char) -> Result<(), ParserError> {
        self.state = ScanState::Ground;
        match ch {
            '[' => {
                self.params.clear();
                self.state = ScanState::Csi;
            }
            ']' => {
                self.title.clear();
                self.title_kind = None;
                self.state = ScanState::Title;
            }
            'c' => {
                // RIS
                self.ansi.reset();
                self.mxp.clear();
                self.restyle();
            }
            '(' | ')' | '#' => self.state = ScanState::EscapeArgument,
            'D' | 'E' | 'M' | '1' | '2' | '7' | '8' | '>' | '=' => {
                if self.options.display_control_codes {
                    self.put_char('␛');
                    self.put_char(ch);
                }
            }
            _ => {
                log::debug!("unsupported escape sequence ESC {}", print_char_value(ch));
                self.redo(ch);
            }
        }
        Ok(())
    }

    pub(super) fn csi(&mut self, ch: char, sink: &mut dyn ParserSink) -> Result<(), ParserError> {
        match ch {
            '\x20'..='\x3f' => {
                Self::check_token(self.params.len(), "CSI parameters too long", &self.params)?;
                self.params.push(ch);
            }
            '\x40'..='\x7e' => {
                self.state = ScanState::Ground;
                let params = std::mem::take(&mut self.params);
                match ch {
                    'm' => {
                        self.ansi.apply(&parse_sgr_params(&params));
                        self.restyle();
                    }
                    'z' => self.line_mode(&params),
                    'J' => {
                        self.mxp.clear_open();
                        if params == "2" {
                            self.erase_display(sink);
                        }
                    }
                    _ => {
                        log::trace!("ignoring CSI {params}{ch}");
                        self.mxp.clear_open();
                    }
                }
            }
            _ => {
                self.trace(sink, &format!("aborted CSI sequence at {}", print_char_value(ch)));
                self.params.clear();
                self.state = ScanState::Ground;
                self.redo(ch);
            }
        }
        Ok(())
    }

    /// `ESC[2J` scrolls the window contents away with blank lines.
    fn erase_display(&mut self, sink: &mut dyn ParserSink) {
        self.close_line();
        self.mxp.capture('\n');
        self.emit_line(sink, false);
        for _ in 0..self.options.window.height {
            self.mxp.capture('\n');
            self.emit_line(sink, false);
        }
        self.text_length += self.options.window.height + 1;
    }

    /// MXP line mode selection, `ESC[Nz`.
    fn line_mode(&mut self, params: &str) {
        let mode = params
            .split(';')
            .rev()
            .find(|p| !p.is_empty())
            .map(|p| p.trim().parse::<i32>().unwrap_or(0))
            .unwrap_or(0);
        log::debug!("MXP line mode {mode}");

        let state = &mut self.mxp.state;
        state.on = true;
        state.no_break = false;
        state.paragraph = false;
        if state.line_type == LineType::OPEN {
            self.mxp.clear_open();
        }

        match LineType(mode) {
            LineType::LOCKED => {
                self.mxp.state.on = false;
                self.mxp.state.locked = false;
                self.mxp.state.line_type = LineType::LOCKED;
                self.mxp.clear_open();
            }
            LineType::RESET => self.mxp.styles.reset(),
            LineType::TEMP_SECURE => {
                self.mxp.state.line_type = LineType::TEMP_SECURE;
                self.mxp.state.locked = false;
                self.mxp.clear_open();
                self.temp_secure_pending = true;
            }
            LineType::LOCK_OPEN => self.lock_mode(LineType::OPEN, LineType::LOCK_OPEN),
            LineType::LOCK_SECURE => self.lock_mode(LineType::SECURE, LineType::LOCK_SECURE),
            LineType::LOCK_LOCKED => self.lock_mode(LineType::LOCKED, LineType::LOCK_LOCKED),
            LineType(0..=99) => {
                self.mxp.state.line_type = LineType(mode);
                self.mxp.state.locked = false;
                let opening = self.mxp.active_line_tag().map(|tag| {
                    let mut opening = String::new();
                    if !tag.element.is_empty() {
                        opening.push_str(&format!("<{}>", tag.element));
                    }
                    opening.push_str(&tag.definition);
                    opening
                });
                if let Some(opening) = opening.filter(|o| !o.is_empty()) {
                    self.inject(&opening);
                }
            }
            _ => self.mxp.styles.reset(),
        }
    }

    fn lock_mode(&mut self, default_mode: LineType, line_type: LineType) {
        self.mxp.default_mode = default_mode;
        self.mxp.state.locked = true;
        self.mxp.state.line_type = line_type;
        self.mxp.clear_open();
    }

    pub(super) fn title(&mut self, ch: char, sink: &mut dyn ParserSink) -> Result<(), ParserError> {
        match ch {
            '\x07' => self.finish_title(sink),
            '\x1b' => self.state = ScanState::TitleEscape,
            '\n' => {
                self.trace(sink, "unterminated title sequence");
                self.title.clear();
                self.state = ScanState::Ground;
                self.redo(ch);
            }
            ';' if self.title_kind.is_none() => {
                self.title_kind = Some(self.title.trim().parse().unwrap_or(0));
                self.title.clear();
            }
            c => {
                Self::check_token(self.title.len(), "title too long", &self.title)?;
                self.title.push(c);
            }
        }
        Ok(())
    }

    pub(super) fn title_escape(&mut self, ch: char, sink: &mut dyn ParserSink) -> Result<(), ParserError> {
        if ch == '\\' {
            self.finish_title(sink);
        } else {
            self.trace(sink, "unterminated title sequence");
            self.title.clear();
            self.title_kind = None;
            self.state = ScanState::Escape;
            self.redo(ch);
        }
        Ok(())
    }

    fn finish_title(&mut self, sink: &mut dyn ParserSink) {
        self.state = ScanState::Ground;
        let title = std::mem::take(&mut self.title);
        sink.set_title(&title, self.title_kind.take().unwrap_or(0));
    }
}
