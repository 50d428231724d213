//! ANSI color state
//!
//! Tracks the foreground, background and attribute set selected by SGR
//! sequences and combines it with the active MXP style into the colors of a
//! format run.

mod sgr;
pub(crate) use sgr::parse_sgr_params;

use crate::{ColorTable, ColorValue, DEFAULT_BACK, DEFAULT_FORE, FontStyle, MxpStyle};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnsiColorProcessor {
    pub fore: ColorValue,
    pub back: ColorValue,
    pub attributes: FontStyle,
}

impl Default for AnsiColorProcessor {
    fn default() -> Self {
        Self {
            fore: ColorValue::Code(DEFAULT_FORE),
            back: ColorValue::Code(DEFAULT_BACK),
            attributes: FontStyle::empty(),
        }
    }
}

const ATTRIBUTE_CODES: [(FontStyle, u8); 11] = [
    (FontStyle::BOLD, 1),
    (FontStyle::FAINT, 2),
    (FontStyle::ITALIC, 3),
    (FontStyle::UNDERLINE, 4),
    (FontStyle::SLOW, 5),
    (FontStyle::RAPID, 6),
    (FontStyle::INVERSE, 7),
    (FontStyle::HIDDEN, 8),
    (FontStyle::STRIKEOUT, 9),
    (FontStyle::DOUBLE_UNDERLINE, 21),
    (FontStyle::OVERLINE, 53),
];

fn color_params(color: &ColorValue, foreground: bool) -> String {
    let (extended, default) = if foreground { (38, 39) } else { (48, 49) };
    match color {
        ColorValue::Rgb(rgb) => format!("{extended};2;{};{};{}", rgb.r, rgb.g, rgb.b),
        ColorValue::Code(code) if *code <= -16 => format!("{extended};5;{}", -(code + 16)),
        ColorValue::Code(-1) | ColorValue::Code(-2) => default.to_string(),
        ColorValue::Code(code) => code.to_string(),
    }
}

impl AnsiColorProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Back to default colors with no attributes.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Serializes the current state as an SGR sequence that recreates it from any state.
    pub fn current_as_escape_sequence(&self) -> String {
        let mut params = vec!["0".to_string(), color_params(&self.fore, true), color_params(&self.back, false)];
        for (flag, code) in ATTRIBUTE_CODES {
            if self.attributes.contains(flag) {
                params.push(code.to_string());
            }
        }
        format!("\x1b[{}m", params.join(";"))
    }

    /// Computes the colors of a run from the ANSI state and the active MXP frame.
    ///
    /// MXP colors win over ANSI ones. ANSI bold brightens and faint dims the
    /// foreground, `high` lightens it further, inverse (from either side) swaps
    /// foreground and background.
    pub fn resolve_colors(&self, style: &MxpStyle, table: &ColorTable) -> (ColorValue, ColorValue) {
        let bold = self.attributes.contains(FontStyle::BOLD);
        let faint = self.attributes.contains(FontStyle::FAINT);

        let mut fore = if let Some(rgb) = style.fore {
            if bold {
                ColorValue::Rgb(rgb.lighten(0.5))
            } else if faint {
                ColorValue::Rgb(rgb.darken(0.5))
            } else {
                ColorValue::Rgb(rgb)
            }
        } else {
            match self.fore {
                ColorValue::Rgb(rgb) => ColorValue::Rgb(rgb),
                ColorValue::Code(code) if bold => match code {
                    30..=37 => ColorValue::Code(code * 10),
                    c if c <= -16 => ColorValue::Rgb(table.get(c).lighten(0.5)),
                    c => ColorValue::Code(c),
                },
                ColorValue::Code(code) if faint => match code {
                    30..=37 => ColorValue::Code(code * 100),
                    c if c <= -16 => ColorValue::Rgb(table.get(c).darken(0.15)),
                    c => ColorValue::Code(c),
                },
                code => code,
            }
        };
        if style.high {
            fore = ColorValue::Rgb(table.resolve(&fore).lighten(0.25));
        }

        let mut back = match style.back {
            Some(rgb) => ColorValue::Rgb(rgb),
            None => self.back,
        };
        if self.attributes.contains(FontStyle::INVERSE) || style.style.contains(FontStyle::INVERSE) {
            std::mem::swap(&mut fore, &mut back);
        }
        (fore, back)
    }
}
