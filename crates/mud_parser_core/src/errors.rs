//! Errors raised while scanning and how loudly they are reported.

use std::fmt::Display;

use thiserror::Error;

/// Log level a [`ParserError`] is reported at.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorLevel {
    /// Overlong or malformed tokens that were dropped
    Info = 0,
    /// Bad values from the server or the host, ignored
    Warning = 1,
    /// Parser or session failure
    Error = 2,
}

impl ErrorLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl Display for ErrorLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ParserError {
    /// A color string that is neither a CSS name, a hex triple nor `rgb()`.
    #[error("invalid color specification '{0}'")]
    InvalidColor(String),

    /// Palette slot outside of the color table.
    #[error("palette index {index} out of range [0, {max})")]
    OutOfRange { index: i32, max: usize },

    /// Scanner state and its buffers disagree; the token in progress is dropped.
    #[error("inconsistent scanner state: {0}")]
    InvalidState(&'static str),

    /// Escape sequence, tag or trigger dropped while scanning.
    #[error("malformed sequence: {description}")]
    MalformedSequence {
        description: &'static str,
        /// Start of the dropped token
        sequence: Option<String>,
    },

    #[error("invalid parser configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("parser session is closed")]
    SessionClosed,

    #[error("parser task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ParserError {
    pub fn level(&self) -> ErrorLevel {
        match self {
            Self::InvalidColor(_) => ErrorLevel::Warning,
            Self::OutOfRange { .. } => ErrorLevel::Warning,
            Self::InvalidState(_) => ErrorLevel::Error,
            Self::MalformedSequence { .. } => ErrorLevel::Info,
            Self::Config(_) => ErrorLevel::Error,
            Self::SessionClosed => ErrorLevel::Error,
            Self::Task(_) => ErrorLevel::Error,
        }
    }
}

/// Format a character for human-readable diagnostics.
///
/// - Printable characters: "0x41 ('A')"
/// - C0 controls with names: "0x0A (LF)", "0x1B (ESC)", etc.
/// - Everything else: "U+2400"
pub fn print_char_value(ch: char) -> String {
    const C0_NAMES: [&str; 32] = [
        "NUL", "SOH", "STX", "ETX", "EOT", "ENQ", "ACK", "BEL", "BS", "TAB", "LF", "VT", "FF", "CR", "SO", "SI", "DLE", "DC1", "DC2", "DC3", "DC4", "NAK", "SYN",
        "ETB", "CAN", "EM", "SUB", "ESC", "FS", "GS", "RS", "US",
    ];
    let code = ch as u32;
    match code {
        0x00..=0x1F => format!("0x{:02X} ({})", code, C0_NAMES[code as usize]),
        0x20..=0x7E => format!("0x{:02X} ('{}')", code, ch),
        0x7F => "0x7F (DEL)".to_string(),
        _ => format!("U+{:04X}", code),
    }
}
