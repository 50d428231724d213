//! MXP (MUD eXtension Protocol) state
//!
//! Holds the line mode selected by `ESC[Nz`, the style stack, the
//! server-defined element/entity/line-tag registries and the text capture
//! buffers. Tag interpretation lives in [`tags`], definitions in [`definitions`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::Rgb;

pub(crate) mod args;
mod definitions;
mod style;
mod support;
mod tags;

pub use style::{MxpStyle, StyleStack, StyleTag};
pub(crate) use tags::{TagContext, TagResult};

/// MXP line mode. 0-7 are the protocol modes, 10-19 tag room/welcome text,
/// 20-99 select server defined line tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LineType(pub i32);

impl LineType {
    pub const OPEN: LineType = LineType(0);
    pub const SECURE: LineType = LineType(1);
    pub const LOCKED: LineType = LineType(2);
    pub const RESET: LineType = LineType(3);
    pub const TEMP_SECURE: LineType = LineType(4);
    pub const LOCK_OPEN: LineType = LineType(5);
    pub const LOCK_SECURE: LineType = LineType(6);
    pub const LOCK_LOCKED: LineType = LineType(7);
    pub const ROOM_NAME: LineType = LineType(10);
    pub const ROOM_DESCRIPTION: LineType = LineType(11);
    pub const ROOM_EXITS: LineType = LineType(12);
    pub const WELCOME_TEXT: LineType = LineType(19);

    /// Lines on which secure-only tags and definitions are accepted.
    pub fn is_secure(self) -> bool {
        matches!(self, LineType::SECURE | LineType::LOCK_SECURE | LineType::TEMP_SECURE)
    }
}

impl Default for LineType {
    fn default() -> Self {
        LineType::OPEN
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Entity {
    pub name: String,
    pub value: String,
    pub description: String,
    pub publish: bool,
    /// Defined by the server (as opposed to locally)
    pub remote: bool,
}

/// A server defined custom tag (`<!ELEMENT>`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    pub name: String,
    pub definition: String,
    pub close_definition: String,
    /// Declared attributes in declaration order with their defaults; names lower-cased.
    pub attributes: Vec<(String, String)>,
    /// Line tag (20-99) the element binds to
    pub tag: Option<i32>,
    pub flag: String,
    /// Usable on open lines
    pub open: bool,
    /// Has no closing tag and captures nothing
    pub empty: bool,
    pub remote: bool,
}

/// A server defined line tag (`<!TAG>`), selected with `ESC[Nz`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineTag {
    pub index: i32,
    pub window: String,
    pub gag: bool,
    pub fore: Option<Rgb>,
    pub back: Option<Rgb>,
    pub enabled: bool,
    pub remote: bool,
    /// Element bound to this tag by `<!ELEMENT ... TAG=n>`
    pub element: String,
    pub definition: String,
    pub close_definition: String,
}

impl LineTag {
    pub fn new(index: i32, remote: bool) -> Self {
        Self {
            index,
            window: String::new(),
            gag: false,
            fore: None,
            back: None,
            enabled: true,
            remote,
            element: String::new(),
            definition: String::new(),
            close_definition: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MxpState {
    /// MXP markup is recognized on the current line
    pub on: bool,
    pub line_type: LineType,
    pub locked: bool,
    pub paragraph: bool,
    pub no_break: bool,
    /// Line-tag markup was injected for the current line
    pub line_expanded: bool,
    /// One buffer per element or `<VAR>` currently capturing text
    pub captured: Vec<String>,
    pub gagged: bool,
}

/// Upper bound on entity and element expansions within one chunk.
pub(crate) const MAX_EXPANSIONS: usize = 4096;

/// Upper bound on simultaneously open capturing elements.
pub(crate) const MAX_CAPTURE_DEPTH: usize = 64;

/// Captured text beyond this many bytes is dropped.
pub(crate) const MAX_CAPTURE_LEN: usize = 64 * 1024;

#[derive(Debug, Default)]
pub(crate) struct MxpEngine {
    pub state: MxpState,
    pub styles: StyleStack,
    pub entities: HashMap<String, Entity>,
    pub elements: HashMap<String, Element>,
    pub line_tags: HashMap<i32, LineTag>,
    /// Line mode restored at each line end
    pub default_mode: LineType,
    pub style_version: Option<String>,
    /// `expire_links` payloads waiting for the end of the chunk
    pub pending_expires: Vec<Vec<String>>,
}

impl MxpEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wipes registries and state.
    pub fn clear(&mut self) {
        self.entities.clear();
        self.elements.clear();
        self.line_tags.clear();
        self.styles.reset();
        self.state = MxpState::default();
    }

    pub fn reset_line(&mut self) {
        self.default_mode = LineType::OPEN;
        self.state.line_type = LineType::OPEN;
    }

    pub fn clear_open(&mut self) {
        self.styles.clear_open();
    }

    /// Enabled line tag for the current line mode.
    pub fn active_line_tag(&self) -> Option<&LineTag> {
        self.line_tags.get(&self.state.line_type.0).filter(|t| t.enabled)
    }

    /// Current style frame with the gag of the active line tag applied.
    pub fn current_style(&self) -> MxpStyle {
        let mut style = self.styles.current().clone();
        if let Some(tag) = self.active_line_tag() {
            style.gagged = tag.gag;
        }
        style
    }

    /// Appends displayed text to every active capture buffer.
    pub fn capture(&mut self, c: char) {
        for buffer in self.state.captured.iter_mut().filter(|b| b.len() < MAX_CAPTURE_LEN) {
            if c == '\n' {
                buffer.push('\n');
            } else {
                args::escape_captured(c, buffer);
            }
        }
    }

    /// Value of a registered entity.
    pub fn entity_value(&self, name: &str) -> Option<&str> {
        self.entities.get(name).map(|e| e.value.as_str())
    }

    pub fn public_entity(&self, name: &str) -> String {
        match self.entities.get(name) {
            Some(entity) if entity.publish => entity.value.clone(),
            _ => name.to_string(),
        }
    }

    /// Replaces `&name;` references of registered entities, recursively up to a small depth.
    pub fn expand_entities(&self, text: &str) -> String {
        self.expand_entities_depth(text, 0)
    }

    fn expand_entities_depth(&self, text: &str, depth: usize) -> String {
        if depth > 8 || !text.contains('&') {
            return text.to_string();
        }
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(amp) = rest.find('&') {
            out.push_str(&rest[..amp]);
            let tail = &rest[amp + 1..];
            match tail.find(';') {
                Some(semi) if self.entities.contains_key(&tail[..semi]) => {
                    let value = self.entity_value(&tail[..semi]).unwrap_or_default();
                    out.push_str(&self.expand_entities_depth(value, depth + 1));
                    rest = &tail[semi + 1..];
                }
                _ => {
                    out.push('&');
                    rest = tail;
                }
            }
        }
        out.push_str(rest);
        out
    }
}
