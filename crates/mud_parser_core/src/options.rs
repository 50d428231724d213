use serde::{Deserialize, Serialize};

use crate::ParserError;

/// Visible window size in character cells, used to emit blank lines for `ESC[2J`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: usize,
    pub height: usize,
}

impl Default for Size {
    fn default() -> Self {
        Self { width: 100, height: 25 }
    }
}

/// Parser configuration. Every field has a default so partial TOML files are fine:
///
/// ```toml
/// enable_mxp = true
/// emulate_terminal = true
/// window = { width = 80, height = 40 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserOptions {
    pub enable_mxp: bool,
    pub enable_msp: bool,
    pub enable_url_detection: bool,
    /// MXP `<A>`/`<SEND>` produce link formats.
    pub enable_links: bool,
    /// Keep blink attributes in emitted formats.
    pub enable_flashing: bool,
    /// Map CP437 control/high characters to their glyphs.
    pub emulate_terminal: bool,
    /// Interpret BEL, BS, TAB, CR and ESC instead of treating them as plain control codes.
    pub emulate_control_codes: bool,
    /// Show control codes as Unicode control pictures.
    pub display_control_codes: bool,
    pub enable_bell: bool,
    /// Sound file for BEL. Only carried for the host, which reads it back
    /// through [`crate::Parser::options`] when the `bell` event arrives.
    pub bell_sound: String,
    /// Forward diagnostics to the `debug` sink event.
    pub enable_debug: bool,
    /// Render unknown MXP tags literally instead of dropping them.
    pub show_invalid_mxp_tags: bool,
    pub default_image_url: String,
    pub tab_width: usize,
    pub window: Size,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            enable_mxp: true,
            enable_msp: true,
            enable_url_detection: true,
            enable_links: true,
            enable_flashing: true,
            emulate_terminal: false,
            emulate_control_codes: true,
            display_control_codes: false,
            enable_bell: true,
            bell_sound: "bell.wav".to_string(),
            enable_debug: false,
            show_invalid_mxp_tags: false,
            default_image_url: "themes/general".to_string(),
            tab_width: 8,
            window: Size::default(),
        }
    }
}

impl ParserOptions {
    pub fn from_toml_str(text: &str) -> Result<Self, ParserError> {
        Ok(toml::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml() {
        let opts = ParserOptions::from_toml_str("enable_mxp = false\nwindow = { width = 80, height = 40 }\n").unwrap();
        assert!(!opts.enable_mxp);
        assert!(opts.enable_msp);
        assert_eq!(opts.window, Size { width: 80, height: 40 });
        assert_eq!(opts.tab_width, 8);
    }

    #[test]
    fn test_bad_toml() {
        let err = ParserOptions::from_toml_str("tab_width = \"wide\"").unwrap_err();
        assert!(matches!(err, ParserError::Config(_)));
    }
}
