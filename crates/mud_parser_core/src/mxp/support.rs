//! `<SUPPORT>` reply builder.

use super::args::TagArg;

const SUPPORTED_TAGS: [&str; 41] = [
    "A", "SEND", "B", "I", "COLOR", "C", "EM", "ITALIC", "STRONG", "BOLD", "UNDERLINE", "U", "S", "STRIKEOUT", "H", "HIGH", "FONT", "EXPIRE",
    "VERSION", "SUPPORT", "NOBR", "P", "BR", "SBR", "VAR", "SOUND", "MUSIC", "USER", "PASSWORD", "RESET", "STRIKE", "H1", "H2", "H3", "H4",
    "H5", "H6", "IMAGE", "STAT", "GAUGE", "HR",
];

const SUPPORTED_ATTRIBUTES: [(&str, &[&str]); 11] = [
    ("IMAGE", &["fname", "url", "t", "h", "w", "hspace", "vspace", "align", "ismap"]),
    ("SOUND", &["v", "l", "p", "t", "u"]),
    ("MUSIC", &["v", "l", "c", "t", "u"]),
    ("A", &["href", "hint", "expire"]),
    ("SEND", &["href", "hint", "prompt", "expire"]),
    ("COLOR", &["fore", "back"]),
    ("C", &["fore", "back"]),
    ("FONT", &["face", "size", "color", "back"]),
    ("EXPIRE", &["name"]),
    ("GAUGE", &["max", "caption", "color"]),
    ("STAT", &["max", "caption"]),
];

fn attributes_of(tag: &str) -> Option<&'static [&'static str]> {
    SUPPORTED_ATTRIBUTES.iter().find(|(name, _)| *name == tag).map(|(_, attrs)| *attrs)
}

/// `+item` / `-item` list for the requested tags (`TAG`, `TAG.attr`, `TAG.*`),
/// or every supported tag when nothing was asked for.
pub(crate) fn support_reply(args: &[TagArg]) -> Vec<String> {
    if args.is_empty() {
        return SUPPORTED_TAGS.iter().map(|tag| format!("+{tag}")).collect();
    }
    let mut reply = Vec::new();
    for arg in args {
        let request = super::args::strip_quotes(&arg.raw);
        match request.split_once('.') {
            None => {
                let tag = request.to_ascii_uppercase();
                let sign = if SUPPORTED_TAGS.contains(&tag.as_str()) { '+' } else { '-' };
                reply.push(format!("{sign}{request}"));
            }
            Some((tag, attr)) => {
                let upper = tag.to_ascii_uppercase();
                let lower = upper.to_ascii_lowercase();
                match attributes_of(&upper) {
                    Some(attrs) if attr == "*" => reply.extend(attrs.iter().map(|a| format!("+{lower}.{a}"))),
                    Some(attrs) if attrs.iter().any(|a| a.eq_ignore_ascii_case(attr)) => reply.push(format!("+{lower}.{attr}")),
                    _ if attr == "*" => reply.push(format!("-{lower}")),
                    _ => reply.push(format!("-{lower}.{attr}")),
                }
            }
        }
    }
    reply
}
