//! Incoming-text protocol engine for MUD clients.
//!
//! Turns the raw character stream of a MUD connection (ANSI/VT100 SGR color,
//! MXP markup, MSP sound triggers and bare URLs) into display lines carrying
//! formatting runs, plus side-channel events delivered through [`ParserSink`].

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

mod errors;
pub use errors::*;

mod color;
pub use color::{ColorValue, Rgb};

mod color_table;
pub use color_table::{ColorTable, PALETTE_SIZE, palette_slot};

mod options;
pub use options::{ParserOptions, Size};

mod ansi;
pub use ansi::AnsiColorProcessor;

mod mxp;
pub use mxp::{Element, Entity, LineTag, LineType, MxpState, MxpStyle, StyleStack, StyleTag};

mod oem;

mod url;

mod parser;
pub use parser::{ParseStatus, Parser};

mod session;
pub use session::ParserSession;

/// SGR code of the default foreground color.
pub const DEFAULT_FORE: i32 = 37;
/// SGR code of the default background color.
pub const DEFAULT_BACK: i32 = 40;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct FontStyle: u16 {
        const BOLD = 1;
        const FAINT = 2;
        const ITALIC = 4;
        const UNDERLINE = 8;
        const SLOW = 16;
        const RAPID = 32;
        const INVERSE = 64;
        const HIDDEN = 128;
        const STRIKEOUT = 256;
        const DOUBLE_UNDERLINE = 512;
        const OVERLINE = 1024;
    }
}

/// A styled run starting at `offset` and lasting until the next format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFormat {
    pub offset: usize,
    pub fore: ColorValue,
    pub back: ColorValue,
    pub font: Option<String>,
    pub size: Option<String>,
    pub style: FontStyle,
    /// The line is a horizontal rule.
    pub hr: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkFormat {
    pub offset: usize,
    pub href: String,
    pub hint: String,
    pub expire: String,
}

/// `<SEND>` target. `href` is a command list (`['a','b']` when split on `|`)
/// and `tt` holds the per command captions of a menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendFormat {
    pub offset: usize,
    pub href: String,
    pub hint: String,
    pub expire: String,
    pub prompt: bool,
    pub tt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageFormat {
    pub offset: usize,
    pub name: String,
    pub url: String,
    pub image_type: String,
    pub height: String,
    pub width: String,
    pub hspace: String,
    pub vspace: String,
    pub align: String,
    pub ismap: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LineFormat {
    Normal(TextFormat),
    /// Start of an autodetected URL.
    Link { offset: usize, href: String },
    LinkEnd { offset: usize },
    MxpLink(LinkFormat),
    MxpLinkEnd { offset: usize },
    MxpSend(SendFormat),
    MxpSendEnd { offset: usize },
    /// An `<A>` or `<SEND>` start whose link was expired by `<EXPIRE>`.
    MxpExpired { offset: usize },
    /// The end marker that belonged to an expired link.
    MxpSkip { offset: usize },
    Image(ImageFormat),
    WordBreak { offset: usize },
}

impl LineFormat {
    pub fn offset(&self) -> usize {
        match self {
            LineFormat::Normal(f) => f.offset,
            LineFormat::MxpLink(f) => f.offset,
            LineFormat::MxpSend(f) => f.offset,
            LineFormat::Image(f) => f.offset,
            LineFormat::Link { offset, .. }
            | LineFormat::LinkEnd { offset }
            | LineFormat::MxpLinkEnd { offset }
            | LineFormat::MxpSendEnd { offset }
            | LineFormat::MxpExpired { offset }
            | LineFormat::MxpSkip { offset }
            | LineFormat::WordBreak { offset } => *offset,
        }
    }

    pub fn set_offset(&mut self, new_offset: usize) {
        match self {
            LineFormat::Normal(f) => f.offset = new_offset,
            LineFormat::MxpLink(f) => f.offset = new_offset,
            LineFormat::MxpSend(f) => f.offset = new_offset,
            LineFormat::Image(f) => f.offset = new_offset,
            LineFormat::Link { offset, .. }
            | LineFormat::LinkEnd { offset }
            | LineFormat::MxpLinkEnd { offset }
            | LineFormat::MxpSendEnd { offset }
            | LineFormat::MxpExpired { offset }
            | LineFormat::MxpSkip { offset }
            | LineFormat::WordBreak { offset } => *offset = new_offset,
        }
    }

    pub fn is_same_kind(&self, other: &LineFormat) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

/// One display line as handed to the sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParserLine {
    pub text: String,
    /// Network characters that built this line; expansion text is not included.
    pub raw: String,
    /// Ascending by offset, first entry is the offset 0 `Normal` run.
    pub formats: Vec<LineFormat>,
    /// Provisional partial line, retracted when the next chunk arrives.
    pub fragment: bool,
    pub gagged: bool,
    pub remote: bool,
}

/// Numeric gauge/stat field, or the entity name when it does not hold a number yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GaugeValue {
    Number(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaugeData {
    pub value: GaugeValue,
    pub max: GaugeValue,
    pub caption: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatData {
    pub value: GaugeValue,
    pub max: GaugeValue,
    pub caption: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoundData {
    /// `FName=Off` stops playback.
    pub off: bool,
    pub file: String,
    pub url: String,
    pub volume: i32,
    /// -1 repeats forever.
    pub repeat: i32,
    pub priority: i32,
    pub sound_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MusicData {
    pub off: bool,
    pub file: String,
    pub url: String,
    pub volume: i32,
    pub repeat: i32,
    /// Keep playing when the same file is requested again.
    pub continue_playing: bool,
    pub music_type: String,
}

/// Receiver of everything the parser produces. Only `add_line` is required.
pub trait ParserSink {
    /// A completed line, or a fragment when `line.fragment` is set.
    fn add_line(&mut self, line: ParserLine);

    /// Retract the fragment emitted at the end of the previous chunk.
    fn remove_last_line(&mut self) {}

    /// One chunk has been fully processed.
    fn parse_done(&mut self) {}

    fn set_title(&mut self, _title: &str, _kind: i32) {}

    fn bell(&mut self) {}

    fn gauge(&mut self, _gauge: GaugeData) {}

    fn stat(&mut self, _stat: StatData) {}

    fn music(&mut self, _music: MusicData) {}

    fn sound(&mut self, _sound: SoundData) {}

    /// Delivered after the chunk that contained the `<EXPIRE>` finished.
    fn expire_links(&mut self, _args: Vec<String>) {}

    fn set_variable(&mut self, _name: &str, _value: &str) {}

    fn mxp_flag(&mut self, _flag: &str, _value: &str) {}

    /// The server asked for a reply (`VERSION`, `SUPPORT`, `USER`, `PASSWORD`).
    fn mxp_tag_reply(&mut self, _tag: &str, _args: Vec<String>) {}

    /// A non-open line type ended.
    fn mxp_tag_end(&mut self, _line_type: LineType, _text: &str, _formats: &[LineFormat]) {}

    fn debug(&mut self, _message: &str) {}
}
