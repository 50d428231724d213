//! The MXP style stack.
//!
//! Every open markup tag pushes a frame that copies the frame below it and
//! adds its own change. Closing a tag drops its frame and everything opened
//! after it.

use crate::{FontStyle, LineFormat, Rgb};

use super::args::TagArg;

/// Identity of the tag that pushed a frame. Aliases (`B`/`BOLD`/`STRONG`, ...)
/// share one identity so either spelling closes the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StyleTag {
    #[default]
    None,
    Bold,
    Italic,
    Underline,
    Strikeout,
    High,
    Color,
    Font,
    Heading(u8),
    Anchor,
    Send,
    Paragraph,
    Var,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MxpStyle {
    pub tag: StyleTag,
    /// Element name for `StyleTag::Custom` frames
    pub custom: String,
    pub font: Option<String>,
    pub font_size: Option<String>,
    pub style: FontStyle,
    pub fore: Option<Rgb>,
    pub back: Option<Rgb>,
    pub high: bool,
    /// Open frames are closed by the end of the line.
    pub open: bool,
    pub gagged: bool,
    /// Link format of an `<A>`/`<SEND>` frame, re-opened on each new line.
    pub link: Option<LineFormat>,
    /// Arguments of a `<VAR>` frame, consumed by `</VAR>`.
    pub saved_args: Vec<TagArg>,
}

impl MxpStyle {
    /// A copy of `self` to be pushed for `tag`.
    pub(crate) fn derive(&self, tag: StyleTag, open: bool) -> Self {
        Self {
            tag,
            custom: String::new(),
            open,
            link: None,
            saved_args: Vec::new(),
            ..self.clone()
        }
    }
}

/// Never empty: the bottom frame is the default style.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleStack {
    frames: Vec<MxpStyle>,
}

impl Default for StyleStack {
    fn default() -> Self {
        Self { frames: vec![MxpStyle::default()] }
    }
}

impl StyleStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &MxpStyle {
        // frames is never empty, reset() restores the base frame
        &self.frames[self.frames.len() - 1]
    }

    pub fn push(&mut self, frame: MxpStyle) {
        self.frames.push(frame);
    }

    /// Pushes a copy of the current frame for `tag` and returns it for modification.
    pub fn push_derived(&mut self, tag: StyleTag, open: bool) -> &mut MxpStyle {
        let frame = self.current().derive(tag, open);
        self.frames.push(frame);
        let top = self.frames.len() - 1;
        &mut self.frames[top]
    }

    /// Collapses the stack to a single default frame.
    pub fn reset(&mut self) {
        self.frames.clear();
        self.frames.push(MxpStyle::default());
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[MxpStyle] {
        &self.frames
    }

    /// Removes the topmost frame pushed by `tag` (and `custom` element name for
    /// custom frames) together with everything above it and returns it.
    /// Unknown tags leave the stack alone.
    pub fn clear_to_tag(&mut self, tag: StyleTag, custom: &str) -> Option<MxpStyle> {
        let index = self
            .frames
            .iter()
            .rposition(|frame| frame.tag == tag && (tag != StyleTag::Custom || frame.custom.eq_ignore_ascii_case(custom)))?;
        let mut removed = self.frames.split_off(index);
        if self.frames.is_empty() {
            self.reset();
        }
        Some(removed.swap_remove(0))
    }

    /// Drops every frame opened in open mode.
    pub fn clear_open(&mut self) {
        self.frames.retain(|frame| !frame.open);
        if self.frames.is_empty() {
            self.reset();
        }
    }

    /// Link formats of the `<A>`/`<SEND>` frames still on the stack, bottom up.
    pub fn open_links(&self) -> impl Iterator<Item = &LineFormat> {
        self.frames.iter().filter_map(|frame| frame.link.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_to_tag_drops_intermediate_frames() {
        let mut stack = StyleStack::new();
        stack.push_derived(StyleTag::Bold, true).style |= FontStyle::BOLD;
        stack.push_derived(StyleTag::Italic, true).style |= FontStyle::ITALIC;
        assert_eq!(stack.current().style, FontStyle::BOLD | FontStyle::ITALIC);

        let closed = stack.clear_to_tag(StyleTag::Bold, "").unwrap();
        assert_eq!(closed.tag, StyleTag::Bold);
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.current().style, FontStyle::empty());
    }

    #[test]
    fn test_unmatched_close_is_ignored() {
        let mut stack = StyleStack::new();
        stack.push_derived(StyleTag::Italic, true);
        assert!(stack.clear_to_tag(StyleTag::Bold, "").is_none());
        assert_eq!(stack.len(), 2);
    }

    #[test]
    fn test_custom_frames_match_by_name() {
        let mut stack = StyleStack::new();
        stack.push_derived(StyleTag::Custom, false).custom = "ROOM".into();
        stack.push_derived(StyleTag::Custom, false).custom = "EXITS".into();
        let closed = stack.clear_to_tag(StyleTag::Custom, "room").unwrap();
        assert_eq!(closed.custom, "ROOM");
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_clear_open_keeps_secure_frames() {
        let mut stack = StyleStack::new();
        stack.push_derived(StyleTag::Paragraph, false);
        stack.push_derived(StyleTag::Bold, true);
        stack.clear_open();
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.current().tag, StyleTag::Paragraph);
    }
}
