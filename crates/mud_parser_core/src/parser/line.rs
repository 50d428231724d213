//! The line under construction and the clean-up applied when it is emitted.

use crate::{LineFormat, TextFormat};

/// Text, raw network characters and formats of the current line.
/// Offsets count characters, not bytes.
#[derive(Debug, Clone, Default)]
pub(crate) struct LineBuilder {
    pub text: String,
    pub raw: String,
    pub len: usize,
    pub formats: Vec<LineFormat>,
}

impl LineBuilder {
    pub fn new(formats: Vec<LineFormat>) -> Self {
        Self {
            text: String::new(),
            raw: String::new(),
            len: 0,
            formats,
        }
    }

    pub fn push_char(&mut self, ch: char) {
        self.text.push(ch);
        self.len += 1;
    }

    pub fn push_format(&mut self, mut format: LineFormat) {
        format.set_offset(self.len);
        self.formats.push(format);
    }

    pub fn insert_format(&mut self, format: LineFormat) {
        insert_sorted(&mut self.formats, format);
    }

    /// Removes the last character. Formats that started behind it move back.
    pub fn backspace(&mut self) -> bool {
        if self.text.pop().is_none() {
            return false;
        }
        self.len -= 1;
        for format in &mut self.formats {
            if format.offset() > self.len {
                format.set_offset(self.len);
            }
        }
        true
    }

    /// The `Normal` run in effect at `offset`.
    pub fn normal_at(&self, offset: usize) -> Option<TextFormat> {
        self.formats.iter().rev().find_map(|f| match f {
            LineFormat::Normal(normal) if normal.offset <= offset => Some(normal.clone()),
            _ => None,
        })
    }

    /// Turns `<A>`/`<SEND>` starts carrying `expire` (all of them when empty)
    /// into `MxpExpired` and their matching ends into `MxpSkip`.
    pub fn expire_links(&mut self, expire: &str) {
        for b in 0..self.formats.len() {
            let (offset, linked) = match &self.formats[b] {
                LineFormat::MxpLink(link) if expire.is_empty() || link.expire == expire => (link.offset, true),
                LineFormat::MxpSend(send) if expire.is_empty() || send.expire == expire => (send.offset, false),
                _ => continue,
            };
            self.formats[b] = LineFormat::MxpExpired { offset };

            let mut nest = 0;
            for f in b + 1..self.formats.len() {
                let (start, end) = match (&self.formats[f], linked) {
                    (LineFormat::MxpLink(_), true) | (LineFormat::MxpSend(_), false) => (true, false),
                    (LineFormat::MxpLinkEnd { .. }, true) | (LineFormat::MxpSendEnd { .. }, false) => (false, true),
                    _ => (false, false),
                };
                if start {
                    nest += 1;
                } else if end {
                    if nest == 0 {
                        let offset = self.formats[f].offset();
                        self.formats[f] = LineFormat::MxpSkip { offset };
                        break;
                    }
                    nest -= 1;
                }
            }
        }
    }
}

/// Inserts behind every format that starts at or before its offset.
pub(crate) fn insert_sorted(formats: &mut Vec<LineFormat>, format: LineFormat) {
    let pos = formats.iter().position(|f| f.offset() > format.offset()).unwrap_or(formats.len());
    formats.insert(pos, format);
}

fn is_empty_span(format: &LineFormat, next: &LineFormat) -> bool {
    matches!(
        (format, next),
        (LineFormat::Link { .. }, LineFormat::LinkEnd { .. })
            | (LineFormat::MxpLink(_), LineFormat::MxpLinkEnd { .. })
            | (LineFormat::MxpSend(_), LineFormat::MxpSendEnd { .. })
    ) && format.offset() == next.offset()
}

/// Drops formats that have no effect: one of two same-kind formats at the
/// same offset, empty link spans and, on complete lines, a trailing run that
/// starts at the end of the text.
pub(crate) fn prune_formats(formats: Vec<LineFormat>, text_len: usize, fragment: bool) -> Vec<LineFormat> {
    if formats.len() < 2 {
        return formats;
    }
    let last = formats.len() - 1;
    let mut pruned = Vec::with_capacity(formats.len());
    let mut skip_end = false;
    for (f, format) in formats.iter().enumerate() {
        if std::mem::take(&mut skip_end) {
            continue;
        }
        if f < last {
            let next = &formats[f + 1];
            if format.offset() == next.offset() && format.is_same_kind(next) {
                continue;
            }
            if is_empty_span(format, next) {
                skip_end = true;
                continue;
            }
        } else if !fragment && text_len != 0 && format.offset() == text_len {
            let trailing = match format {
                LineFormat::Normal(normal) => !normal.hr,
                LineFormat::Link { .. } | LineFormat::MxpLink(_) | LineFormat::MxpSend(_) => true,
                _ => false,
            };
            if trailing {
                continue;
            }
        }
        pruned.push(format.clone());
    }
    pruned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ColorValue, FontStyle, LinkFormat};

    fn normal(offset: usize, fore: i32) -> LineFormat {
        LineFormat::Normal(TextFormat {
            offset,
            fore: ColorValue::Code(fore),
            back: ColorValue::Code(40),
            font: None,
            size: None,
            style: FontStyle::empty(),
            hr: false,
        })
    }

    #[test]
    fn test_prune_keeps_last_of_same_offset() {
        let pruned = prune_formats(vec![normal(0, 37), normal(0, 31), normal(5, 37)], 5, false);
        assert_eq!(pruned, vec![normal(0, 31)]);
    }

    #[test]
    fn test_prune_fragment_keeps_trailing() {
        let pruned = prune_formats(vec![normal(0, 37), normal(5, 31)], 5, true);
        assert_eq!(pruned.len(), 2);
    }

    #[test]
    fn test_prune_empty_link() {
        let formats = vec![
            normal(0, 37),
            LineFormat::Link {
                offset: 2,
                href: "x".into(),
            },
            LineFormat::LinkEnd { offset: 2 },
            normal(2, 37),
        ];
        let pruned = prune_formats(formats, 4, false);
        assert_eq!(pruned, vec![normal(0, 37), normal(2, 37)]);
    }

    #[test]
    fn test_prune_empty_anchor_keeps_later_end() {
        let anchor = LineFormat::MxpLink(LinkFormat {
            offset: 1,
            href: "http://mud.org".into(),
            hint: String::new(),
            expire: String::new(),
        });
        let formats = vec![
            normal(0, 37),
            anchor.clone(),
            LineFormat::MxpLinkEnd { offset: 1 },
            anchor.clone(),
            normal(1, 31),
            LineFormat::MxpLinkEnd { offset: 3 },
        ];
        let pruned = prune_formats(formats, 5, false);
        assert_eq!(pruned, vec![normal(0, 37), anchor, normal(1, 31), LineFormat::MxpLinkEnd { offset: 3 }]);
    }

    #[test]
    fn test_backspace_moves_formats() {
        let mut line = LineBuilder::new(vec![normal(0, 37)]);
        line.push_char('a');
        line.push_char('b');
        line.push_format(normal(0, 31));
        assert!(line.backspace());
        assert_eq!(line.text, "a");
        assert_eq!(line.formats[1].offset(), 1);
    }

    #[test]
    fn test_expire_nested() {
        let link = |expire: &str| {
            LineFormat::MxpLink(LinkFormat {
                offset: 0,
                href: "h".into(),
                hint: "h".into(),
                expire: expire.into(),
            })
        };
        let mut line = LineBuilder::new(vec![normal(0, 37), link("a"), link("b"), LineFormat::MxpLinkEnd { offset: 1 }, LineFormat::MxpLinkEnd { offset: 2 }]);
        line.expire_links("a");
        assert_eq!(line.formats[1], LineFormat::MxpExpired { offset: 0 });
        assert!(matches!(line.formats[2], LineFormat::MxpLink(_)));
        assert_eq!(line.formats[3], LineFormat::MxpLinkEnd { offset: 1 });
        assert_eq!(line.formats[4], LineFormat::MxpSkip { offset: 2 });
    }
}
