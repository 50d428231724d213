//! SGR (Select Graphic Rendition) handling
//!
//! Applies the parameters of `CSI ... m` to the running color/attribute state.

use super::AnsiColorProcessor;
use crate::{ColorValue, DEFAULT_BACK, DEFAULT_FORE, FontStyle, Rgb};

/// SGR lookup table entry - describes what a particular SGR parameter code means
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SgrLutEntry {
    Reset,
    /// Set `set`, clearing `clear` first (bold and faint exclude each other)
    Set { set: FontStyle, clear: FontStyle },
    Clear(FontStyle),
    Foreground(i32),
    Background(i32),
    /// zMUD extension: 50-57 select a bold foreground (code - 20), except 53 and 55
    BoldForeground(i32),
    /// Extended foreground color (38) - needs sub-parameters (38;5;n or 38;2;r;g;b)
    ExtendedForeground,
    /// Extended background color (48) - needs sub-parameters (48;5;n or 48;2;r;g;b)
    ExtendedBackground,
    /// Undefined/unsupported SGR code
    Undefined,
}

const fn set(flag: FontStyle) -> SgrLutEntry {
    SgrLutEntry::Set { set: flag, clear: FontStyle::empty() }
}

// SGR lookup table: maps SGR parameter values (0-107) to their meaning
static SGR_LUT: [SgrLutEntry; 108] = [
    SgrLutEntry::Reset,                                                        // 0
    SgrLutEntry::Set { set: FontStyle::BOLD, clear: FontStyle::FAINT },        // 1
    SgrLutEntry::Set { set: FontStyle::FAINT, clear: FontStyle::BOLD },        // 2
    set(FontStyle::ITALIC),                                                    // 3
    set(FontStyle::UNDERLINE),                                                 // 4
    set(FontStyle::SLOW),                                                      // 5
    set(FontStyle::RAPID),                                                     // 6
    set(FontStyle::INVERSE),                                                   // 7
    set(FontStyle::HIDDEN),                                                    // 8
    set(FontStyle::STRIKEOUT),                                                 // 9
    SgrLutEntry::Undefined,                                                    // 10 - fonts
    SgrLutEntry::Undefined,                                                    // 11
    SgrLutEntry::Undefined,                                                    // 12
    SgrLutEntry::Undefined,                                                    // 13
    SgrLutEntry::Undefined,                                                    // 14
    SgrLutEntry::Undefined,                                                    // 15
    SgrLutEntry::Undefined,                                                    // 16
    SgrLutEntry::Undefined,                                                    // 17
    SgrLutEntry::Undefined,                                                    // 18
    SgrLutEntry::Undefined,                                                    // 19
    SgrLutEntry::Undefined,                                                    // 20 - fraktur
    set(FontStyle::DOUBLE_UNDERLINE),                                          // 21
    SgrLutEntry::Clear(FontStyle::BOLD.union(FontStyle::FAINT)),               // 22
    SgrLutEntry::Clear(FontStyle::ITALIC),                                     // 23
    SgrLutEntry::Clear(FontStyle::UNDERLINE.union(FontStyle::DOUBLE_UNDERLINE)), // 24
    SgrLutEntry::Clear(FontStyle::SLOW),                                       // 25
    SgrLutEntry::Clear(FontStyle::RAPID),                                      // 26
    SgrLutEntry::Clear(FontStyle::INVERSE),                                    // 27
    SgrLutEntry::Clear(FontStyle::HIDDEN),                                     // 28
    SgrLutEntry::Clear(FontStyle::STRIKEOUT),                                  // 29
    SgrLutEntry::Foreground(30),                                               // 30 - Black
    SgrLutEntry::Foreground(31),                                               // 31 - Red
    SgrLutEntry::Foreground(32),                                               // 32 - Green
    SgrLutEntry::Foreground(33),                                               // 33 - Yellow
    SgrLutEntry::Foreground(34),                                               // 34 - Blue
    SgrLutEntry::Foreground(35),                                               // 35 - Magenta
    SgrLutEntry::Foreground(36),                                               // 36 - Cyan
    SgrLutEntry::Foreground(37),                                               // 37 - White
    SgrLutEntry::ExtendedForeground,                                           // 38
    SgrLutEntry::Foreground(-1),                                               // 39 - default
    SgrLutEntry::Background(40),                                               // 40 - Black
    SgrLutEntry::Background(41),                                               // 41 - Red
    SgrLutEntry::Background(42),                                               // 42 - Green
    SgrLutEntry::Background(43),                                               // 43 - Yellow
    SgrLutEntry::Background(44),                                               // 44 - Blue
    SgrLutEntry::Background(45),                                               // 45 - Magenta
    SgrLutEntry::Background(46),                                               // 46 - Cyan
    SgrLutEntry::Background(47),                                               // 47 - White
    SgrLutEntry::ExtendedBackground,                                           // 48
    SgrLutEntry::Background(-2),                                               // 49 - default
    SgrLutEntry::BoldForeground(30),                                           // 50
    SgrLutEntry::BoldForeground(31),                                           // 51
    SgrLutEntry::BoldForeground(32),                                           // 52
    set(FontStyle::OVERLINE),                                                  // 53
    SgrLutEntry::BoldForeground(34),                                           // 54
    SgrLutEntry::Clear(FontStyle::OVERLINE),                                   // 55
    SgrLutEntry::BoldForeground(36),                                           // 56
    SgrLutEntry::BoldForeground(37),                                           // 57
    SgrLutEntry::Undefined,                                                    // 58
    SgrLutEntry::Undefined,                                                    // 59
    SgrLutEntry::Undefined,
    SgrLutEntry::Undefined,
    SgrLutEntry::Undefined,
    SgrLutEntry::Undefined,
    SgrLutEntry::Undefined, // 60-64
    SgrLutEntry::Undefined,
    SgrLutEntry::Undefined,
    SgrLutEntry::Undefined,
    SgrLutEntry::Undefined,
    SgrLutEntry::Undefined, // 65-69
    SgrLutEntry::Undefined,
    SgrLutEntry::Undefined,
    SgrLutEntry::Undefined,
    SgrLutEntry::Undefined,
    SgrLutEntry::Undefined, // 70-74
    SgrLutEntry::Undefined,
    SgrLutEntry::Undefined,
    SgrLutEntry::Undefined,
    SgrLutEntry::Undefined,
    SgrLutEntry::Undefined, // 75-79
    SgrLutEntry::Undefined,
    SgrLutEntry::Undefined,
    SgrLutEntry::Undefined,
    SgrLutEntry::Undefined,
    SgrLutEntry::Undefined, // 80-84
    SgrLutEntry::Undefined,
    SgrLutEntry::Undefined,
    SgrLutEntry::Undefined,
    SgrLutEntry::Undefined,
    SgrLutEntry::Undefined,  // 85-89
    SgrLutEntry::Foreground(90),                                               // 90 - Bright Black
    SgrLutEntry::Foreground(91),                                               // 91 - Bright Red
    SgrLutEntry::Foreground(92),                                               // 92 - Bright Green
    SgrLutEntry::Foreground(93),                                               // 93 - Bright Yellow
    SgrLutEntry::Foreground(94),                                               // 94 - Bright Blue
    SgrLutEntry::Foreground(95),                                               // 95 - Bright Magenta
    SgrLutEntry::Foreground(96),                                               // 96 - Bright Cyan
    SgrLutEntry::Foreground(97),                                               // 97 - Bright White
    SgrLutEntry::Undefined,
    SgrLutEntry::Undefined,                                                    // 98-99
    SgrLutEntry::Background(100),                                              // 100 - Bright Black
    SgrLutEntry::Background(101),                                              // 101 - Bright Red
    SgrLutEntry::Background(102),                                              // 102 - Bright Green
    SgrLutEntry::Background(103),                                              // 103 - Bright Yellow
    SgrLutEntry::Background(104),                                              // 104 - Bright Blue
    SgrLutEntry::Background(105),                                              // 105 - Bright Magenta
    SgrLutEntry::Background(106),                                              // 106 - Bright Cyan
    SgrLutEntry::Background(107),                                              // 107 - Bright White
];

/// Parse the raw parameter text of a `CSI ... m` sequence.
///
/// Empty and unparsable parameters count as 0, matching how terminals treat `ESC[;1m`.
pub fn parse_sgr_params(params: &str) -> Vec<i32> {
    params.split([';', ':']).map(|p| p.trim().parse::<i32>().unwrap_or(0)).collect()
}

/// Result of reading the sub-parameters after 38/48.
enum Extended {
    Color(ColorValue),
    /// Index out of range, fall back to the default color
    Default,
    /// Malformed truecolor triple, leave the current color alone
    Skip,
}

/// Reads `5;n` or `2;r;g;b` and returns the color plus the number of sub-parameters used.
fn read_extended(params: &[i32]) -> (Option<Extended>, usize) {
    match params.first() {
        Some(5) => match params.get(1) {
            Some(&n) if (0..=255).contains(&n) => (Some(Extended::Color(ColorValue::Code(-(n + 16)))), 2),
            Some(_) => (Some(Extended::Default), 2),
            None => (None, 1),
        },
        Some(2) => {
            if params.len() < 4 {
                return (None, params.len());
            }
            let channel = |v: i32| u8::try_from(v).ok();
            match (channel(params[1]), channel(params[2]), channel(params[3])) {
                (Some(r), Some(g), Some(b)) => (Some(Extended::Color(ColorValue::Rgb(Rgb::new(r, g, b)))), 4),
                _ => (Some(Extended::Skip), 4),
            }
        }
        _ => (None, 0),
    }
}

impl AnsiColorProcessor {
    /// Applies SGR parameters in order. An empty list is a reset.
    pub fn apply(&mut self, params: &[i32]) {
        if params.is_empty() {
            self.reset();
            return;
        }
        let mut i = 0;
        while i < params.len() {
            let code = params[i];
            i += 1;
            match code {
                // client-side semantic colors (local echo, info, error)
                -11 | -7 | -3 => self.fore = ColorValue::Code(code),
                -12 | -8 | -4 => self.back = ColorValue::Code(code),
                0..=107 => match SGR_LUT[code as usize] {
                    SgrLutEntry::Reset => self.reset(),
                    SgrLutEntry::Set { set, clear } => {
                        self.attributes.remove(clear);
                        self.attributes.insert(set);
                    }
                    SgrLutEntry::Clear(flags) => self.attributes.remove(flags),
                    SgrLutEntry::Foreground(c) => self.fore = ColorValue::Code(c),
                    SgrLutEntry::Background(c) => self.back = ColorValue::Code(c),
                    SgrLutEntry::BoldForeground(c) => {
                        self.fore = ColorValue::Code(c);
                        self.attributes.remove(FontStyle::FAINT);
                        self.attributes.insert(FontStyle::BOLD);
                    }
                    SgrLutEntry::ExtendedForeground => i += self.apply_extended(&params[i..], true),
                    SgrLutEntry::ExtendedBackground => i += self.apply_extended(&params[i..], false),
                    SgrLutEntry::Undefined => {
                        log::trace!("ignoring SGR parameter {code}");
                    }
                },
                _ => {
                    log::trace!("ignoring SGR parameter {code}");
                }
            }
        }
    }
}

impl AnsiColorProcessor {
    fn apply_extended(&mut self, params: &[i32], foreground: bool) -> usize {
        let (color, used) = read_extended(params);
        let (target, default) = if foreground { (&mut self.fore, DEFAULT_FORE) } else { (&mut self.back, DEFAULT_BACK) };
        match color {
            Some(Extended::Color(c)) => *target = c,
            Some(Extended::Default) => *target = ColorValue::Code(default),
            Some(Extended::Skip) | None => {}
        }
        used
    }
}
