//! Concrete RGB colors and the textual color forms servers send.
//!
//! MXP and the palette API accept CSS color names, `#rrggbb` / `rrggbb` hex
//! triples (3 or 6 digits) and `rgb(r, g, b)` functional notation.

use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ParserError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Raises every channel by `ceil(channel * percent)`, saturating at 255.
    pub fn lighten(self, percent: f64) -> Self {
        let up = |c: u8| {
            let c = c as f64;
            (c + (c * percent).ceil()).min(255.0) as u8
        };
        Self::new(up(self.r), up(self.g), up(self.b))
    }

    /// Lowers every channel by `ceil(channel * percent)`, saturating at 0.
    pub fn darken(self, percent: f64) -> Self {
        let down = |c: u8| {
            let c = c as f64;
            (c - (c * percent).ceil()).max(0.0) as u8
        };
        Self::new(down(self.r), down(self.g), down(self.b))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = ParserError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let spec = s.trim();
        if spec.is_empty() {
            return Err(ParserError::InvalidColor(s.to_string()));
        }
        let lower = spec.to_ascii_lowercase();
        if let Some(color) = NAMED_COLORS.get(lower.as_str()) {
            return Ok(*color);
        }
        if let Some(inner) = lower.strip_prefix("rgb(").and_then(|rest| rest.strip_suffix(')')) {
            return parse_rgb_function(inner).ok_or_else(|| ParserError::InvalidColor(s.to_string()));
        }
        parse_hex(lower.strip_prefix('#').unwrap_or(&lower)).ok_or_else(|| ParserError::InvalidColor(s.to_string()))
    }
}

fn parse_rgb_function(inner: &str) -> Option<Rgb> {
    let mut channels = inner.split([',', ';']).map(|c| c.trim().parse::<u8>());
    let r = channels.next()?.ok()?;
    let g = channels.next()?.ok()?;
    let b = channels.next()?.ok()?;
    if channels.next().is_some() {
        return None;
    }
    Some(Rgb::new(r, g, b))
}

fn parse_hex(digits: &str) -> Option<Rgb> {
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    match digits.len() {
        6 => {
            let v = u32::from_str_radix(digits, 16).ok()?;
            Some(Rgb::new((v >> 16) as u8, (v >> 8) as u8, v as u8))
        }
        3 => {
            let v = u32::from_str_radix(digits, 16).ok()?;
            let expand = |n: u32| ((n & 0xF) * 0x11) as u8;
            Some(Rgb::new(expand(v >> 8), expand(v >> 4), expand(v)))
        }
        _ => None,
    }
}

/// A color as carried by the ANSI state and by emitted formats: either a
/// palette code resolved late through the color table, or a concrete value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorValue {
    /// SGR-style code, semantic negative code or encoded extended index (see [`crate::ColorTable`]).
    Code(i32),
    Rgb(Rgb),
}

impl Default for ColorValue {
    fn default() -> Self {
        ColorValue::Code(crate::DEFAULT_FORE)
    }
}

const CSS_COLORS: [(&str, u32); 148] = [
    ("aliceblue", 0xF0F8FF),
    ("antiquewhite", 0xFAEBD7),
    ("aqua", 0x00FFFF),
    ("aquamarine", 0x7FFFD4),
    ("azure", 0xF0FFFF),
    ("beige", 0xF5F5DC),
    ("bisque", 0xFFE4C4),
    ("black", 0x000000),
    ("blanchedalmond", 0xFFEBCD),
    ("blue", 0x0000FF),
    ("blueviolet", 0x8A2BE2),
    ("brown", 0xA52A2A),
    ("burlywood", 0xDEB887),
    ("cadetblue", 0x5F9EA0),
    ("chartreuse", 0x7FFF00),
    ("chocolate", 0xD2691E),
    ("coral", 0xFF7F50),
    ("cornflowerblue", 0x6495ED),
    ("cornsilk", 0xFFF8DC),
    ("crimson", 0xDC143C),
    ("cyan", 0x00FFFF),
    ("darkblue", 0x00008B),
    ("darkcyan", 0x008B8B),
    ("darkgoldenrod", 0xB8860B),
    ("darkgray", 0xA9A9A9),
    ("darkgreen", 0x006400),
    ("darkgrey", 0xA9A9A9),
    ("darkkhaki", 0xBDB76B),
    ("darkmagenta", 0x8B008B),
    ("darkolivegreen", 0x556B2F),
    ("darkorange", 0xFF8C00),
    ("darkorchid", 0x9932CC),
    ("darkred", 0x8B0000),
    ("darksalmon", 0xE9967A),
    ("darkseagreen", 0x8FBC8F),
    ("darkslateblue", 0x483D8B),
    ("darkslategray", 0x2F4F4F),
    ("darkslategrey", 0x2F4F4F),
    ("darkturquoise", 0x00CED1),
    ("darkviolet", 0x9400D3),
    ("deeppink", 0xFF1493),
    ("deepskyblue", 0x00BFFF),
    ("dimgray", 0x696969),
    ("dimgrey", 0x696969),
    ("dodgerblue", 0x1E90FF),
    ("firebrick", 0xB22222),
    ("floralwhite", 0xFFFAF0),
    ("forestgreen", 0x228B22),
    ("fuchsia", 0xFF00FF),
    ("gainsboro", 0xDCDCDC),
    ("ghostwhite", 0xF8F8FF),
    ("gold", 0xFFD700),
    ("goldenrod", 0xDAA520),
    ("gray", 0x808080),
    ("green", 0x008000),
    ("greenyellow", 0xADFF2F),
    ("grey", 0x808080),
    ("honeydew", 0xF0FFF0),
    ("hotpink", 0xFF69B4),
    ("indianred", 0xCD5C5C),
    ("indigo", 0x4B0082),
    ("ivory", 0xFFFFF0),
    ("khaki", 0xF0E68C),
    ("lavender", 0xE6E6FA),
    ("lavenderblush", 0xFFF0F5),
    ("lawngreen", 0x7CFC00),
    ("lemonchiffon", 0xFFFACD),
    ("lightblue", 0xADD8E6),
    ("lightcoral", 0xF08080),
    ("lightcyan", 0xE0FFFF),
    ("lightgoldenrodyellow", 0xFAFAD2),
    ("lightgray", 0xD3D3D3),
    ("lightgreen", 0x90EE90),
    ("lightgrey", 0xD3D3D3),
    ("lightpink", 0xFFB6C1),
    ("lightsalmon", 0xFFA07A),
    ("lightseagreen", 0x20B2AA),
    ("lightskyblue", 0x87CEFA),
    ("lightslategray", 0x778899),
    ("lightslategrey", 0x778899),
    ("lightsteelblue", 0xB0C4DE),
    ("lightyellow", 0xFFFFE0),
    ("lime", 0x00FF00),
    ("limegreen", 0x32CD32),
    ("linen", 0xFAF0E6),
    ("magenta", 0xFF00FF),
    ("maroon", 0x800000),
    ("mediumaquamarine", 0x66CDAA),
    ("mediumblue", 0x0000CD),
    ("mediumorchid", 0xBA55D3),
    ("mediumpurple", 0x9370DB),
    ("mediumseagreen", 0x3CB371),
    ("mediumslateblue", 0x7B68EE),
    ("mediumspringgreen", 0x00FA9A),
    ("mediumturquoise", 0x48D1CC),
    ("mediumvioletred", 0xC71585),
    ("midnightblue", 0x191970),
    ("mintcream", 0xF5FFFA),
    ("mistyrose", 0xFFE4E1),
    ("moccasin", 0xFFE4B5),
    ("navajowhite", 0xFFDEAD),
    ("navy", 0x000080),
    ("oldlace", 0xFDF5E6),
    ("olive", 0x808000),
    ("olivedrab", 0x6B8E23),
    ("orange", 0xFFA500),
    ("orangered", 0xFF4500),
    ("orchid", 0xDA70D6),
    ("palegoldenrod", 0xEEE8AA),
    ("palegreen", 0x98FB98),
    ("paleturquoise", 0xAFEEEE),
    ("palevioletred", 0xDB7093),
    ("papayawhip", 0xFFEFD5),
    ("peachpuff", 0xFFDAB9),
    ("peru", 0xCD853F),
    ("pink", 0xFFC0CB),
    ("plum", 0xDDA0DD),
    ("powderblue", 0xB0E0E6),
    ("purple", 0x800080),
    ("rebeccapurple", 0x663399),
    ("red", 0xFF0000),
    ("rosybrown", 0xBC8F8F),
    ("royalblue", 0x4169E1),
    ("saddlebrown", 0x8B4513),
    ("salmon", 0xFA8072),
    ("sandybrown", 0xF4A460),
    ("seagreen", 0x2E8B57),
    ("seashell", 0xFFF5EE),
    ("sienna", 0xA0522D),
    ("silver", 0xC0C0C0),
    ("skyblue", 0x87CEEB),
    ("slateblue", 0x6A5ACD),
    ("slategray", 0x708090),
    ("slategrey", 0x708090),
    ("snow", 0xFFFAFA),
    ("springgreen", 0x00FF7F),
    ("steelblue", 0x4682B4),
    ("tan", 0xD2B48C),
    ("teal", 0x008080),
    ("thistle", 0xD8BFD8),
    ("tomato", 0xFF6347),
    ("turquoise", 0x40E0D0),
    ("violet", 0xEE82EE),
    ("wheat", 0xF5DEB3),
    ("white", 0xFFFFFF),
    ("whitesmoke", 0xF5F5F5),
    ("yellow", 0xFFFF00),
    ("yellowgreen", 0x9ACD32),
];

lazy_static::lazy_static! {
    static ref NAMED_COLORS: HashMap<&'static str, Rgb> = CSS_COLORS
        .iter()
        .map(|(name, v)| (*name, Rgb::new((v >> 16) as u8, (v >> 8) as u8, *v as u8)))
        .collect();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_forms() {
        assert_eq!("red".parse::<Rgb>().unwrap(), Rgb::new(255, 0, 0));
        assert_eq!("DarkOliveGreen".parse::<Rgb>().unwrap(), Rgb::new(0x55, 0x6B, 0x2F));
        assert_eq!("#ff8000".parse::<Rgb>().unwrap(), Rgb::new(255, 128, 0));
        assert_eq!("ff8000".parse::<Rgb>().unwrap(), Rgb::new(255, 128, 0));
        assert_eq!("#f80".parse::<Rgb>().unwrap(), Rgb::new(255, 136, 0));
        assert_eq!("rgb(1, 2, 3)".parse::<Rgb>().unwrap(), Rgb::new(1, 2, 3));
    }

    #[test]
    fn test_parse_invalid() {
        assert!("".parse::<Rgb>().is_err());
        assert!("notacolor".parse::<Rgb>().is_err());
        assert!("#12345".parse::<Rgb>().is_err());
        assert!("rgb(300, 0, 0)".parse::<Rgb>().is_err());
    }

    #[test]
    fn test_display_round_trip() {
        let c = Rgb::new(12, 34, 56);
        assert_eq!(c.to_string().parse::<Rgb>().unwrap(), c);
    }

    #[test]
    fn test_lighten_darken() {
        assert_eq!(Rgb::new(100, 200, 0).lighten(0.5), Rgb::new(150, 255, 0));
        assert_eq!(Rgb::new(100, 200, 0).darken(0.15), Rgb::new(85, 170, 0));
    }
}
