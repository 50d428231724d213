//! MXP tag interpretation
//!
//! `MxpEngine::interpret` receives a complete tag (name plus raw argument
//! strings) and either changes the style stack, emits side-channel events,
//! or hands back something for the scanner to place into the line.

use crate::{
    FontStyle, GaugeData, GaugeValue, ImageFormat, LineFormat, LinkFormat, MusicData, ParserSink, Rgb, SendFormat, SoundData, StatData,
};

use super::args::{TagArg, parse_args};
use super::{MAX_CAPTURE_DEPTH, MxpEngine, StyleTag};

/// Per call settings the interpreter needs from the parser.
pub(crate) struct TagContext<'a> {
    /// Tag came from the server
    pub remote: bool,
    pub enable_links: bool,
    pub show_invalid_tags: bool,
    pub default_image_url: &'a str,
    /// Expansion budget of the current chunk is not used up
    pub can_expand: bool,
}

/// What the scanner has to do after a tag.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TagResult {
    /// Style or state changed, nothing to place into the line
    Handled,
    /// Insert at the current offset and start a fresh `Normal` run after it
    Format(LineFormat),
    /// Literal text, optionally preceded by a format
    Text { format: Option<LineFormat>, text: String },
    /// Markup to scan in place of the tag
    Expand(String),
    HorizontalRule,
    LineBreak,
    /// Links with this expire name (or all when empty) on the current line stop working
    Expire(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BuiltinTag {
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
    NoBreak,
    LineBreak,
    SoftBreak,
    HorizontalRule,
    Reset,
    Var,
    Expire,
    Version,
    Support,
    User,
    Password,
    Gauge,
    Stat,
    Image,
    Music,
    Sound,
    AttList,
    TagDefinition,
    ElementDefinition,
    EntityDefinition,
}

impl BuiltinTag {
    /// Looks up an upper-cased tag name without the leading `/`.
    pub fn from_name(name: &str) -> Option<Self> {
        let tag = match name {
            "B" | "BOLD" | "STRONG" => Self::Bold,
            "I" | "ITALIC" | "EM" => Self::Italic,
            "U" | "UNDERLINE" => Self::Underline,
            "S" | "STRIKEOUT" | "STRIKE" => Self::Strikeout,
            "H" | "HIGH" => Self::High,
            "C" | "COLOR" => Self::Color,
            "FONT" => Self::Font,
            "H1" => Self::Heading(1),
            "H2" => Self::Heading(2),
            "H3" => Self::Heading(3),
            "H4" => Self::Heading(4),
            "H5" => Self::Heading(5),
            "H6" => Self::Heading(6),
            "A" => Self::Anchor,
            "SEND" => Self::Send,
            "P" => Self::Paragraph,
            "NOBR" => Self::NoBreak,
            "BR" => Self::LineBreak,
            "SBR" => Self::SoftBreak,
            "HR" => Self::HorizontalRule,
            "RESET" => Self::Reset,
            "V" | "VAR" => Self::Var,
            "EXPIRE" => Self::Expire,
            "VERSION" => Self::Version,
            "SUPPORT" => Self::Support,
            "USER" => Self::User,
            "PASSWORD" => Self::Password,
            "GAUGE" => Self::Gauge,
            "STAT" => Self::Stat,
            "IMAGE" => Self::Image,
            "MUSIC" => Self::Music,
            "SOUND" => Self::Sound,
            "!AT" | "!ATTLIST" => Self::AttList,
            "!TAG" => Self::TagDefinition,
            "!EL" | "!ELEMENT" => Self::ElementDefinition,
            "!EN" | "!ENTITY" => Self::EntityDefinition,
            _ => return None,
        };
        Some(tag)
    }

    /// Text styling tags, accepted on open lines.
    fn is_inline(self) -> bool {
        matches!(self, Self::Bold | Self::Italic | Self::Underline | Self::Strikeout | Self::High | Self::Color | Self::Font)
    }

    fn style_tag(self) -> Option<StyleTag> {
        let tag = match self {
            Self::Bold => StyleTag::Bold,
            Self::Italic => StyleTag::Italic,
            Self::Underline => StyleTag::Underline,
            Self::Strikeout => StyleTag::Strikeout,
            Self::High => StyleTag::High,
            Self::Color => StyleTag::Color,
            Self::Font => StyleTag::Font,
            Self::Heading(n) => StyleTag::Heading(n),
            Self::Anchor => StyleTag::Anchor,
            Self::Send => StyleTag::Send,
            Self::Paragraph => StyleTag::Paragraph,
            Self::Var => StyleTag::Var,
            _ => return None,
        };
        Some(tag)
    }
}

fn parse_color(value: &str) -> Option<Rgb> {
    value.parse().ok()
}

fn font_size(value: &str) -> String {
    if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
        format!("{value}pt")
    } else {
        value.to_string()
    }
}

fn parse_i32(value: &str, default: i32) -> i32 {
    value.trim().parse().unwrap_or(default)
}

/// Media URLs are directories; make sure they end in `/`.
fn media_url(value: &str) -> String {
    let mut url = value.to_string();
    if !url.is_empty() && !url.ends_with('/') {
        url.push('/');
    }
    url
}

impl MxpEngine {
    pub(crate) fn interpret(&mut self, name: &str, raw_args: &[String], ctx: &TagContext<'_>, sink: &mut dyn ParserSink) -> TagResult {
        let upper = name.to_ascii_uppercase();
        let args = parse_args(raw_args);
        log::debug!("MXP tag <{upper}> args {raw_args:?}");

        let (closing, base) = match upper.strip_prefix('/') {
            Some(rest) => (true, rest),
            None => (false, upper.as_str()),
        };
        let builtin = BuiltinTag::from_name(base);

        if let Some(tag) = builtin.filter(|t| t.is_inline()) {
            if closing {
                if let Some(style_tag) = tag.style_tag() {
                    self.styles.clear_to_tag(style_tag, "");
                }
            } else {
                self.open_inline(tag, &args);
            }
            return TagResult::Handled;
        }

        if let Some(tag) = builtin {
            if self.state.line_type.is_secure() {
                return if closing {
                    self.close_secure(tag, ctx)
                } else {
                    self.open_secure(tag, &args, raw_args, ctx, sink)
                };
            }
        }

        if let Some(result) = self.expand_element(closing, base, &args, ctx.can_expand, sink) {
            return result;
        }

        if ctx.show_invalid_tags && builtin.is_none() {
            let mut text = format!("<{name}");
            for arg in raw_args.iter().filter(|a| !a.is_empty()) {
                text.push(' ');
                text.push_str(arg);
            }
            text.push('>');
            return TagResult::Text { format: None, text };
        }
        TagResult::Handled
    }

    fn open_inline(&mut self, tag: BuiltinTag, args: &[TagArg]) {
        match tag {
            BuiltinTag::Color => {
                let mut fore = None;
                let mut back = None;
                for (x, arg) in args.iter().take(2).enumerate() {
                    match arg.name.as_deref() {
                        Some(name) => {
                            // a named color that does not parse drops the whole tag
                            let Some(color) = parse_color(arg.text()) else {
                                return;
                            };
                            let is_back = if x == 0 { name == "BACK" } else { name != "FORE" };
                            if is_back {
                                back = Some(color);
                            } else {
                                fore = Some(color);
                            }
                        }
                        None => {
                            let color = parse_color(arg.text());
                            if x == 0 {
                                fore = color.or(fore);
                            } else {
                                back = color.or(back);
                            }
                        }
                    }
                }
                let frame = self.styles.push_derived(StyleTag::Color, true);
                if fore.is_some() {
                    frame.fore = fore;
                }
                if back.is_some() {
                    frame.back = back;
                }
            }
            BuiltinTag::Font => {
                let frame = self.styles.push_derived(StyleTag::Font, true);
                for (x, arg) in args.iter().enumerate() {
                    match arg.name.as_deref() {
                        Some("SIZE") => frame.font_size = Some(font_size(arg.text())),
                        Some("COLOR") => {
                            let mut parts = arg.text().split(',');
                            if let Some(color) = parts.next().and_then(|c| parse_color(super::args::strip_quotes(c.trim()))) {
                                frame.fore = Some(color);
                            }
                            for part in parts {
                                let flag = match part.trim().to_ascii_lowercase().as_str() {
                                    "bold" => FontStyle::BOLD,
                                    "italic" => FontStyle::ITALIC,
                                    "underline" => FontStyle::UNDERLINE,
                                    "blink" => FontStyle::SLOW,
                                    "inverse" => FontStyle::INVERSE,
                                    "hidden" => FontStyle::HIDDEN,
                                    "strikeout" => FontStyle::STRIKEOUT,
                                    "overline" => FontStyle::OVERLINE,
                                    "doubleunderline" => FontStyle::DOUBLE_UNDERLINE,
                                    _ => FontStyle::empty(),
                                };
                                frame.style |= flag;
                            }
                        }
                        Some("BACK") => {
                            if let Some(color) = parse_color(arg.text()) {
                                frame.back = Some(color);
                            }
                        }
                        Some("FACE") => frame.font = Some(arg.text().to_string()),
                        Some(other) => log::debug!("invalid argument for FONT: {other}"),
                        None => match x {
                            0 => frame.font = Some(arg.text().to_string()),
                            1 => frame.font_size = Some(font_size(arg.text())),
                            2 => {
                                if let Some(color) = parse_color(arg.text()) {
                                    frame.fore = Some(color);
                                }
                            }
                            3 => {
                                if let Some(color) = parse_color(arg.text()) {
                                    frame.back = Some(color);
                                }
                            }
                            _ => {}
                        },
                    }
                }
            }
            BuiltinTag::High => self.styles.push_derived(StyleTag::High, true).high = true,
            _ => {
                let flag = match tag {
                    BuiltinTag::Bold => FontStyle::BOLD,
                    BuiltinTag::Italic => FontStyle::ITALIC,
                    BuiltinTag::Underline => FontStyle::UNDERLINE,
                    _ => FontStyle::STRIKEOUT,
                };
                if let Some(style_tag) = tag.style_tag() {
                    self.styles.push_derived(style_tag, true).style |= flag;
                }
            }
        }
    }

    fn open_secure(&mut self, tag: BuiltinTag, args: &[TagArg], raw_args: &[String], ctx: &TagContext<'_>, sink: &mut dyn ParserSink) -> TagResult {
        match tag {
            BuiltinTag::Heading(n) => {
                self.styles.push_derived(StyleTag::Heading(n), true).style |= FontStyle::BOLD;
                TagResult::Handled
            }
            BuiltinTag::Anchor => self.open_anchor(args, ctx),
            BuiltinTag::Send => self.open_send(args, ctx),
            BuiltinTag::Paragraph => {
                self.styles.push_derived(StyleTag::Paragraph, false);
                self.state.paragraph = true;
                TagResult::Handled
            }
            BuiltinTag::NoBreak => {
                self.state.no_break = true;
                TagResult::Handled
            }
            BuiltinTag::LineBreak => TagResult::LineBreak,
            BuiltinTag::SoftBreak => TagResult::Text {
                format: Some(LineFormat::WordBreak { offset: 0 }),
                text: " ".to_string(),
            },
            BuiltinTag::HorizontalRule => TagResult::HorizontalRule,
            BuiltinTag::Reset => {
                self.styles.reset();
                TagResult::Handled
            }
            BuiltinTag::Var if self.state.captured.len() >= MAX_CAPTURE_DEPTH => {
                log::warn!("MXP elements nested too deep, ignoring <VAR>");
                TagResult::Handled
            }
            BuiltinTag::Var => {
                self.state.captured.push(String::new());
                self.styles.push_derived(StyleTag::Var, false).saved_args = args.to_vec();
                TagResult::Handled
            }
            BuiltinTag::Expire => {
                self.pending_expires.push(raw_args.iter().filter(|a| !a.is_empty()).cloned().collect());
                TagResult::Expire(args.first().map(|a| a.text().to_string()).unwrap_or_default())
            }
            BuiltinTag::Version => {
                match args.first() {
                    Some(version) => self.style_version = Some(version.text().to_string()),
                    None => sink.mxp_tag_reply("VERSION", Vec::new()),
                }
                TagResult::Handled
            }
            BuiltinTag::User | BuiltinTag::Password => {
                let name = if tag == BuiltinTag::User { "USER" } else { "PASSWORD" };
                sink.mxp_tag_reply(name, raw_args.iter().filter(|a| !a.is_empty()).cloned().collect());
                TagResult::Handled
            }
            BuiltinTag::Support => {
                sink.mxp_tag_reply("SUPPORT", super::support::support_reply(args));
                TagResult::Handled
            }
            BuiltinTag::Gauge => {
                sink.gauge(self.gauge(args));
                TagResult::Handled
            }
            BuiltinTag::Stat => {
                let gauge = self.gauge(args);
                sink.stat(StatData {
                    value: gauge.value,
                    max: gauge.max,
                    caption: gauge.caption,
                });
                TagResult::Handled
            }
            BuiltinTag::Image => TagResult::Format(LineFormat::Image(image(args, ctx.default_image_url))),
            BuiltinTag::Music => {
                sink.music(music(args));
                TagResult::Handled
            }
            BuiltinTag::Sound => {
                sink.sound(sound(args));
                TagResult::Handled
            }
            BuiltinTag::AttList => self.define_attlist(args, ctx.remote),
            BuiltinTag::TagDefinition => self.define_line_tag(args, ctx.remote),
            BuiltinTag::ElementDefinition => self.define_element(args, ctx.remote),
            BuiltinTag::EntityDefinition => self.define_entity(args, ctx.remote),
            // inline tags never get here
            _ => TagResult::Handled,
        }
    }

    fn close_secure(&mut self, tag: BuiltinTag, ctx: &TagContext<'_>) -> TagResult {
        match tag {
            BuiltinTag::Anchor => {
                self.styles.clear_to_tag(StyleTag::Anchor, "");
                if ctx.enable_links {
                    return TagResult::Format(LineFormat::MxpLinkEnd { offset: 0 });
                }
            }
            BuiltinTag::Send => {
                self.styles.clear_to_tag(StyleTag::Send, "");
                if ctx.enable_links {
                    return TagResult::Format(LineFormat::MxpSendEnd { offset: 0 });
                }
            }
            BuiltinTag::Heading(n) => {
                self.styles.clear_to_tag(StyleTag::Heading(n), "");
            }
            BuiltinTag::Paragraph => {
                self.styles.clear_to_tag(StyleTag::Paragraph, "");
                self.state.paragraph = false;
            }
            BuiltinTag::Var => self.close_var(ctx.remote),
            _ => {}
        }
        TagResult::Handled
    }

    fn open_anchor(&mut self, args: &[TagArg], ctx: &TagContext<'_>) -> TagResult {
        let mut href = String::new();
        let mut hint = String::new();
        let mut expire = String::new();
        for (x, arg) in args.iter().enumerate() {
            match (arg.name.as_deref(), x) {
                (Some("HREF"), _) | (None, 0) => href = arg.text().to_string(),
                (Some("HINT"), _) | (None, 1) => hint = arg.text().to_string(),
                (Some("EXPIRE"), _) | (None, 2) => expire = arg.text().to_string(),
                (Some(other), _) => log::debug!("invalid argument for A: {other}"),
                _ => {}
            }
        }
        if hint.is_empty() {
            hint = href.clone();
        }
        let link = LineFormat::MxpLink(LinkFormat { offset: 0, href, hint, expire });
        let frame = self.styles.push_derived(StyleTag::Anchor, false);
        if !ctx.enable_links {
            return TagResult::Handled;
        }
        frame.link = Some(link.clone());
        TagResult::Format(link)
    }

    fn open_send(&mut self, args: &[TagArg], ctx: &TagContext<'_>) -> TagResult {
        let mut href = String::new();
        let mut hint = String::new();
        let mut expire = String::new();
        let mut prompt = false;
        for (x, arg) in args.iter().enumerate() {
            if arg.is_flag("PROMPT") {
                prompt = true;
                continue;
            }
            match (arg.name.as_deref(), x) {
                (Some("HREF"), _) | (None, 0) => href = arg.text().to_string(),
                (Some("HINT"), _) | (None, 1) => hint = arg.text().to_string(),
                (Some("PROMPT"), _) | (None, 2) => prompt = true,
                (Some("EXPIRE"), _) | (None, 3) => expire = arg.text().to_string(),
                (Some(other), _) => log::debug!("invalid argument for SEND: {other}"),
                _ => {}
            }
        }
        if href.is_empty() {
            href = "&text;".to_string();
        }
        if hint.is_empty() {
            hint = href.clone();
        }
        let mut tt = String::new();
        let commands: Vec<&str> = href.split('|').collect();
        let href = if commands.len() > 1 {
            let captions: Vec<&str> = hint.split('|').collect();
            if captions.len() == commands.len() + 1 {
                tt = format!("['{}']", captions[1..].join("','"));
                hint = captions[0].to_string();
            }
            format!("['{}']", commands.join("','"))
        } else {
            format!("'{href}'")
        };
        let send = LineFormat::MxpSend(SendFormat {
            offset: 0,
            href,
            hint,
            expire,
            prompt,
            tt,
        });
        let frame = self.styles.push_derived(StyleTag::Send, false);
        if !ctx.enable_links {
            return TagResult::Handled;
        }
        frame.link = Some(send.clone());
        TagResult::Format(send)
    }

    /// Registered entity value parsed as a number, the raw value otherwise.
    fn gauge_value(&self, value: &str) -> GaugeValue {
        let resolved = self.entity_value(value).unwrap_or(value);
        match resolved.trim().parse::<f64>() {
            Ok(n) => GaugeValue::Number(n),
            Err(_) => GaugeValue::Text(resolved.to_string()),
        }
    }

    fn gauge(&self, args: &[TagArg]) -> GaugeData {
        let mut gauge = GaugeData {
            value: GaugeValue::Number(0.0),
            max: GaugeValue::Number(1.0),
            caption: String::new(),
            color: String::new(),
        };
        for (x, arg) in args.iter().enumerate() {
            match (arg.name.as_deref(), x) {
                (Some("VALUE"), _) | (None, 0) => gauge.value = self.gauge_value(arg.text()),
                (Some("MAX"), _) | (None, 1) => gauge.max = self.gauge_value(arg.text()),
                (Some("CAPTION"), _) | (None, 2) => gauge.caption = arg.text().to_string(),
                (Some("COLOR"), _) | (None, 3) => {
                    if let Some(color) = parse_color(arg.text()) {
                        gauge.color = color.to_string();
                    }
                }
                (Some(other), _) => log::debug!("invalid argument for GAUGE: {other}"),
                _ => {}
            }
        }
        gauge
    }
}

fn image(args: &[TagArg], default_url: &str) -> ImageFormat {
    let mut image = ImageFormat {
        offset: 0,
        name: String::new(),
        url: default_url.to_string(),
        image_type: String::new(),
        height: String::new(),
        width: String::new(),
        hspace: String::new(),
        vspace: String::new(),
        align: "bottom".to_string(),
        ismap: false,
    };
    for (x, arg) in args.iter().enumerate() {
        if arg.is_flag("ISMAP") {
            image.ismap = true;
            continue;
        }
        match (arg.name.as_deref(), x) {
            (Some("FNAME"), _) | (None, 0) => image.name = arg.text().to_string(),
            (Some("URL"), _) | (None, 1) => image.url = arg.text().to_string(),
            (Some("TYPE" | "T"), _) | (None, 2) => {
                if !arg.text().is_empty() {
                    image.image_type = arg.text().to_string();
                }
            }
            (Some("HEIGHT" | "H"), _) | (None, 3) => image.height = arg.text().to_string(),
            (Some("WIDTH" | "W"), _) | (None, 4) => image.width = arg.text().to_string(),
            (Some("HSPACE"), _) | (None, 5) => image.hspace = arg.text().to_string(),
            (Some("VSPACE"), _) | (None, 6) => image.vspace = arg.text().to_string(),
            (Some("ALIGN"), _) | (None, 7) => image.align = arg.text().to_ascii_lowercase(),
            (Some("ISMAP"), _) => image.ismap = true,
            (Some(other), _) => log::debug!("invalid argument for IMAGE: {other}"),
            _ => {}
        }
    }
    image
}

pub(crate) fn music(args: &[TagArg]) -> MusicData {
    let mut music = MusicData {
        off: false,
        file: String::new(),
        url: String::new(),
        volume: 100,
        repeat: 1,
        continue_playing: true,
        music_type: String::new(),
    };
    for (x, arg) in args.iter().enumerate() {
        match (arg.name.as_deref(), x) {
            (Some("FNAME"), _) | (None, 0) => {
                music.off = arg.text().eq_ignore_ascii_case("off");
                music.file = if music.off { String::new() } else { arg.text().to_string() };
            }
            (Some("V"), _) | (None, 1) => music.volume = parse_i32(arg.text(), 100),
            (Some("L"), _) | (None, 2) => music.repeat = parse_i32(arg.text(), 1),
            (Some("C"), _) | (None, 3) => music.continue_playing = arg.text() != "0",
            (Some("T"), _) | (None, 4) => music.music_type = arg.text().to_string(),
            (Some("U"), _) | (None, 5) => music.url = media_url(arg.text()),
            (Some(other), _) => log::debug!("invalid argument for MUSIC: {other}"),
            _ => {}
        }
    }
    music
}

pub(crate) fn sound(args: &[TagArg]) -> SoundData {
    let mut sound = SoundData {
        off: false,
        file: String::new(),
        url: String::new(),
        volume: 100,
        repeat: 1,
        priority: 50,
        sound_type: String::new(),
    };
    for (x, arg) in args.iter().enumerate() {
        match (arg.name.as_deref(), x) {
            (Some("FNAME"), _) | (None, 0) => {
                sound.off = arg.text().eq_ignore_ascii_case("off");
                sound.file = if sound.off { String::new() } else { arg.text().to_string() };
            }
            (Some("V"), _) | (None, 1) => sound.volume = parse_i32(arg.text(), 100),
            (Some("L"), _) | (None, 2) => sound.repeat = parse_i32(arg.text(), 1),
            (Some("P"), _) | (None, 3) => sound.priority = parse_i32(arg.text(), 1),
            (Some("T"), _) | (None, 4) => sound.sound_type = arg.text().to_string(),
            (Some("U"), _) | (None, 5) => sound.url = media_url(arg.text()),
            (Some(other), _) => log::debug!("invalid argument for SOUND: {other}"),
            _ => {}
        }
    }
    sound
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mxp::args::TagArg;

    fn args(raw: &[&str]) -> Vec<TagArg> {
        raw.iter().map(|a| TagArg::parse(a)).collect()
    }

    #[test]
    fn test_builtin_aliases() {
        assert_eq!(BuiltinTag::from_name("STRONG"), Some(BuiltinTag::Bold));
        assert_eq!(BuiltinTag::from_name("!EL"), Some(BuiltinTag::ElementDefinition));
        assert_eq!(BuiltinTag::from_name("H4"), Some(BuiltinTag::Heading(4)));
        assert_eq!(BuiltinTag::from_name("ROOM"), None);
    }

    #[test]
    fn test_sound_arguments() {
        let s = sound(&args(&["rain.wav", "V=50", "L=-1", "P=x", "U=http://host/sounds"]));
        assert_eq!(s.file, "rain.wav");
        assert_eq!(s.volume, 50);
        assert_eq!(s.repeat, -1);
        assert_eq!(s.priority, 1);
        assert_eq!(s.url, "http://host/sounds/");
        assert!(!s.off);
    }

    #[test]
    fn test_music_off_and_continue() {
        let m = music(&args(&["Off", "C=0"]));
        assert!(m.off);
        assert!(!m.continue_playing);
        assert_eq!(m.volume, 100);
    }

    #[test]
    fn test_image_defaults() {
        let i = image(&args(&["map.png", "ISMAP", "ALIGN=Top"]), "themes/general");
        assert_eq!(i.name, "map.png");
        assert_eq!(i.url, "themes/general");
        assert_eq!(i.align, "top");
        assert!(i.ismap);
    }
}
