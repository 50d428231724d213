//! The 281 slot palette behind every color code the parser emits.
//!
//! Layout:
//! - 0..16    the 16 ANSI colors (normal + bright)
//! - 16..232  6x6x6 color cube
//! - 232..256 grayscale ramp
//! - 256..264 faint variants of the 8 base colors
//! - 264..272 background variants of the 8 base colors
//! - 272..281 semantic slots (info, local echo, default, error, bright default)

use crate::{ColorValue, ParserError, Rgb};

pub const PALETTE_SIZE: usize = 281;

pub const SLOT_INFO_BACK: usize = 272;
pub const SLOT_INFO_TEXT: usize = 273;
pub const SLOT_LOCAL_ECHO_BACK: usize = 274;
pub const SLOT_LOCAL_ECHO_TEXT: usize = 275;
pub const SLOT_DEFAULT_BACK: usize = 276;
pub const SLOT_DEFAULT_FORE: usize = 277;
pub const SLOT_ERROR_FORE: usize = 278;
pub const SLOT_ERROR_BACK: usize = 279;
pub const SLOT_DEFAULT_BRIGHT_FORE: usize = 280;

const BASE_COLORS: [Rgb; 16] = [
    Rgb::new(0, 0, 0),
    Rgb::new(128, 0, 0),
    Rgb::new(0, 128, 0),
    Rgb::new(128, 128, 0),
    Rgb::new(0, 0, 238),
    Rgb::new(128, 0, 128),
    Rgb::new(0, 128, 128),
    Rgb::new(187, 187, 187),
    Rgb::new(128, 128, 128),
    Rgb::new(255, 0, 0),
    Rgb::new(0, 255, 0),
    Rgb::new(255, 255, 0),
    Rgb::new(92, 92, 255),
    Rgb::new(255, 0, 255),
    Rgb::new(0, 255, 255),
    Rgb::new(255, 255, 255),
];

const FAINT_COLORS: [Rgb; 8] = [
    Rgb::new(0, 0, 0),
    Rgb::new(118, 0, 0),
    Rgb::new(0, 108, 0),
    Rgb::new(145, 136, 0),
    Rgb::new(0, 0, 167),
    Rgb::new(108, 0, 108),
    Rgb::new(0, 108, 108),
    Rgb::new(161, 161, 161),
];

const SEMANTIC_COLORS: [Rgb; 9] = [
    Rgb::new(0, 0, 0),       // info back
    Rgb::new(0, 255, 255),   // info text
    Rgb::new(0, 0, 0),       // local echo back
    Rgb::new(255, 255, 0),   // local echo text
    Rgb::new(0, 0, 0),       // default back
    Rgb::new(229, 229, 229), // default fore
    Rgb::new(205, 0, 0),     // error fore
    Rgb::new(229, 229, 229), // error back
    Rgb::new(255, 255, 255), // default bright fore
];

fn build_default_palette() -> Vec<Rgb> {
    let mut palette = Vec::with_capacity(PALETTE_SIZE);
    palette.extend_from_slice(&BASE_COLORS);
    let level = |c: u8| if c == 0 { 0 } else { c * 40 + 55 };
    for r in 0..6 {
        for g in 0..6 {
            for b in 0..6 {
                palette.push(Rgb::new(level(r), level(g), level(b)));
            }
        }
    }
    for i in 0..24u8 {
        let gray = i * 10 + 8;
        palette.push(Rgb::new(gray, gray, gray));
    }
    palette.extend_from_slice(&FAINT_COLORS);
    palette.extend_from_slice(&BASE_COLORS[0..8]);
    palette.extend_from_slice(&SEMANTIC_COLORS);
    palette
}

lazy_static::lazy_static! {
    static ref DEFAULT_PALETTE: Vec<Rgb> = build_default_palette();
}

/// Maps a color code to its palette slot.
///
/// Codes are SGR numbers (30-37, 40-47, 90-97, 100-107), bold encodings
/// (300-370 / 400-470 in steps of 10), faint encodings (3000-3700 / 4000-4700
/// in steps of 100), semantic negatives (-1 default fore, -2 default back,
/// -3/-4 local echo, -7/-8 info, -11/-12 error, -10 bright default) and
/// extended 256-color indices stored as `-(n + 16)`.
pub fn palette_slot(code: i32) -> usize {
    match code {
        -12 => SLOT_ERROR_BACK,
        -11 => SLOT_ERROR_FORE,
        -10 => SLOT_DEFAULT_BRIGHT_FORE,
        -8 => SLOT_INFO_BACK,
        -7 => SLOT_INFO_TEXT,
        -4 => SLOT_LOCAL_ECHO_BACK,
        -3 => SLOT_LOCAL_ECHO_TEXT,
        49 | -2 => SLOT_DEFAULT_BACK,
        39 | -1 => SLOT_DEFAULT_FORE,
        0..=15 => code as usize,
        30..=37 => (code - 30) as usize,
        40..=47 => 264 + (code - 40) as usize,
        90..=97 => 8 + (code - 90) as usize,
        100..=107 => 8 + (code - 100) as usize,
        300..=370 if code % 10 == 0 => 8 + ((code - 300) / 10) as usize,
        400..=470 if code % 10 == 0 => 8 + ((code - 400) / 10) as usize,
        3000..=3700 if code % 100 == 0 => 256 + ((code - 3000) / 100) as usize,
        4000..=4700 if code % 100 == 0 => 256 + ((code - 4000) / 100) as usize,
        _ => {
            let index = if code <= -16 { -(code + 16) } else { code };
            if (0..PALETTE_SIZE as i32).contains(&index) {
                index as usize
            } else {
                SLOT_DEFAULT_FORE
            }
        }
    }
}

/// Palette shared by all parsers until a slot is overridden; the first
/// `set` copies the defaults into the instance.
#[derive(Debug, Clone, Default)]
pub struct ColorTable {
    overrides: Option<Vec<Rgb>>,
}

impl ColorTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> &[Rgb] {
        match &self.overrides {
            Some(slots) => slots,
            None => &DEFAULT_PALETTE,
        }
    }

    /// Resolves a color code to a concrete color.
    pub fn get(&self, code: i32) -> Rgb {
        self.slots()[palette_slot(code)]
    }

    pub fn resolve(&self, color: &ColorValue) -> Rgb {
        match color {
            ColorValue::Code(code) => self.get(*code),
            ColorValue::Rgb(rgb) => *rgb,
        }
    }

    /// Overrides a palette slot. Invalid colors and out of range slots leave the table untouched.
    pub fn set(&mut self, index: i32, color: &str) -> Result<(), ParserError> {
        if !(0..PALETTE_SIZE as i32).contains(&index) {
            return Err(ParserError::OutOfRange { index, max: PALETTE_SIZE });
        }
        let rgb: Rgb = color.parse()?;
        let slots = self.overrides.get_or_insert_with(|| DEFAULT_PALETTE.clone());
        slots[index as usize] = rgb;
        Ok(())
    }

    /// Drops all overrides and returns to the default palette.
    pub fn reset(&mut self) {
        self.overrides = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_layout() {
        let table = ColorTable::new();
        assert_eq!(DEFAULT_PALETTE.len(), PALETTE_SIZE);
        assert_eq!(table.get(31), Rgb::new(128, 0, 0));
        assert_eq!(table.get(44), Rgb::new(0, 0, 238));
        assert_eq!(table.get(91), Rgb::new(255, 0, 0));
        assert_eq!(table.get(310), Rgb::new(255, 0, 0));
        assert_eq!(table.get(3100), Rgb::new(118, 0, 0));
        // cube corner and the first gray
        assert_eq!(table.get(-(16 + 16)), Rgb::new(0, 0, 0));
        assert_eq!(table.get(-(231 + 16)), Rgb::new(255, 255, 255));
        assert_eq!(table.get(-(232 + 16)), Rgb::new(8, 8, 8));
        assert_eq!(table.get(-(196 + 16)), Rgb::new(255, 0, 0));
    }

    #[test]
    fn test_semantic_codes() {
        let table = ColorTable::new();
        assert_eq!(table.get(-1), Rgb::new(229, 229, 229));
        assert_eq!(table.get(39), Rgb::new(229, 229, 229));
        assert_eq!(table.get(-2), Rgb::new(0, 0, 0));
        assert_eq!(table.get(-11), Rgb::new(205, 0, 0));
        assert_eq!(table.get(-7), Rgb::new(0, 255, 255));
        assert_eq!(table.get(-3), Rgb::new(255, 255, 0));
    }

    #[test]
    fn test_unknown_falls_back_to_default_fore() {
        let table = ColorTable::new();
        assert_eq!(table.get(9999), table.get(-1));
        assert_eq!(table.get(-(400 + 16)), table.get(-1));
    }

    #[test]
    fn test_set_is_per_instance() {
        let mut table = ColorTable::new();
        table.set(1, "#102030").unwrap();
        assert_eq!(table.get(31), Rgb::new(0x10, 0x20, 0x30));
        assert_eq!(ColorTable::new().get(31), Rgb::new(128, 0, 0));
    }

    #[test]
    fn test_set_rejects_bad_input() {
        let mut table = ColorTable::new();
        assert!(table.set(281, "red").is_err());
        assert!(table.set(-1, "red").is_err());
        assert!(table.set(3, "nonsense").is_err());
        assert_eq!(table.get(33), Rgb::new(128, 128, 0));
    }
}
