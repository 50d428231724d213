//! Code page 437 glyphs used when emulating a terminal.
//!
//! Control codes 1-31 and DEL have printable CP437 pictures, and the upper half
//! of the code page maps to accented letters, box drawing and math symbols.

/// CP437 pictures for the C0 control codes, indexed by code. NUL has none.
const CONTROL_GLYPHS: [char; 32] = [
    '\0', '☺', '☻', '♥', '♦', '♣', '♠', '␇', '◘', '○', '◙', '♂', '♀', '♪', '♫', '☼', '►', '◄', '↕', '‼', '¶', '§', '▬', '↨', '↑', '↓', '→', '←', '∟', '↔', '▲',
    '▼',
];

/// CP437 128-254.
const HIGH_GLYPHS: [char; 127] = [
    'Ç', 'ü', 'é', 'â', 'ä', 'à', 'å', 'ç', 'ê', 'ë', 'è', 'ï', 'î', 'ì', 'Ä', 'Å', //
    'É', 'æ', 'Æ', 'ô', 'ö', 'ò', 'û', 'ù', 'ÿ', 'Ö', 'Ü', '¢', '£', '¥', '₧', 'ƒ', //
    'á', 'í', 'ó', 'ú', 'ñ', 'Ñ', 'ª', 'º', '¿', '⌐', '¬', '½', '¼', '¡', '«', '»', //
    '░', '▒', '▓', '│', '┤', '╡', '╢', '╖', '╕', '╣', '║', '╗', '╝', '╜', '╛', '┐', //
    '└', '┴', '┬', '├', '─', '┼', '╞', '╟', '╚', '╔', '╩', '╦', '╠', '═', '╬', '╧', //
    '╨', '╤', '╥', '╙', '╘', '╒', '╓', '╫', '╪', '┘', '┌', '█', '▄', '▌', '▐', '▀', //
    'α', 'ß', 'Γ', 'π', 'Σ', 'σ', 'µ', 'τ', 'Φ', 'Θ', 'Ω', 'δ', '∞', 'φ', 'ε', '∩', //
    '≡', '±', '≥', '≤', '⌠', '⌡', '÷', '≈', '°', '∙', '·', '√', 'ⁿ', '²', '■',
];

/// Printable picture of a control code (1-31, 127).
pub(crate) fn control_glyph(ch: char) -> Option<char> {
    match ch as u32 {
        1..=31 => Some(CONTROL_GLYPHS[ch as usize]),
        127 => Some('⌂'),
        _ => None,
    }
}

/// Unicode control picture (`␀`..`␟`, `␡`) used to make control codes visible.
pub(crate) fn control_picture(ch: char) -> Option<char> {
    match ch as u32 {
        code @ 0..=31 => char::from_u32(0x2400 + code),
        127 => Some('␡'),
        _ => None,
    }
}

/// CP437 glyph for 128-254; other characters are left alone.
pub(crate) fn cp437_glyph(ch: char) -> char {
    match ch as u32 {
        code @ 128..=254 => HIGH_GLYPHS[(code - 128) as usize],
        _ => ch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_glyphs() {
        assert_eq!(control_glyph('\x01'), Some('☺'));
        assert_eq!(control_glyph('\x1f'), Some('▼'));
        assert_eq!(control_glyph('\x7f'), Some('⌂'));
        assert_eq!(control_glyph('\0'), None);
        assert_eq!(control_picture('\x1b'), Some('␛'));
        assert_eq!(control_picture('\x7f'), Some('␡'));
    }

    #[test]
    fn test_high_glyphs() {
        assert_eq!(cp437_glyph('\u{80}'), 'Ç');
        assert_eq!(cp437_glyph('\u{b0}'), '░');
        assert_eq!(cp437_glyph('\u{fe}'), '■');
        assert_eq!(cp437_glyph('\u{ff}'), '\u{ff}');
        assert_eq!(cp437_glyph('a'), 'a');
    }
}
