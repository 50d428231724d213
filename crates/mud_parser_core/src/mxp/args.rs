//! Tag argument handling shared by the MXP tag handlers.

/// One argument of a tag: `NAME=value`, or a positional `value`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TagArg {
    /// Upper-cased argument name for `NAME=value` arguments
    pub name: Option<String>,
    /// Value with its quotes still attached
    pub value: String,
    /// The argument as it appeared in the tag
    pub raw: String,
}

impl TagArg {
    pub fn parse(raw: &str) -> Self {
        if let Some(eq) = raw.find('=') {
            let name = &raw[..eq];
            if !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.') {
                return Self {
                    name: Some(name.to_ascii_uppercase()),
                    value: raw[eq + 1..].to_string(),
                    raw: raw.to_string(),
                };
            }
        }
        Self {
            name: None,
            value: raw.to_string(),
            raw: raw.to_string(),
        }
    }

    /// The value without surrounding quotes.
    pub fn text(&self) -> &str {
        strip_quotes(&self.value)
    }

    /// Bare keyword argument such as `PROMPT` or `DELETE`.
    pub fn is_flag(&self, keyword: &str) -> bool {
        self.name.is_none() && self.value.eq_ignore_ascii_case(keyword)
    }
}

pub fn parse_args(raw: &[String]) -> Vec<TagArg> {
    raw.iter().filter(|a| !a.is_empty()).map(|a| TagArg::parse(a)).collect()
}

/// Strips one pair of matching `"` or `'` quotes.
pub fn strip_quotes(text: &str) -> &str {
    let bytes = text.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'"' || first == b'\'') && first == last {
            return &text[1..text.len() - 1];
        }
    }
    text
}

/// Derives the closing markup for an element definition: `<B><COLOR red>`
/// closes with `</COLOR></B>`. Tags already closed inside the definition are skipped.
pub fn close_tags(definition: &str) -> String {
    let mut open: Vec<&str> = Vec::new();
    for start in memchr::memchr_iter(b'<', definition.as_bytes()) {
        let rest = &definition[start + 1..];
        let end = rest.find([' ', '>']).unwrap_or(rest.len());
        let name = &rest[..end];
        if name.is_empty() || name.starts_with('!') {
            continue;
        }
        if let Some(closed) = name.strip_prefix('/') {
            if let Some(pos) = open.iter().rposition(|n| n.eq_ignore_ascii_case(closed)) {
                open.remove(pos);
            }
            continue;
        }
        open.push(name);
    }
    open.iter().rev().map(|name| format!("</{name}>")).collect()
}

/// Escapes text for storage in a captured buffer.
pub fn escape_captured(c: char, out: &mut String) {
    match c {
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        '"' => out.push_str("&quot;"),
        '\'' => out.push_str("&apos;"),
        _ => out.push(c),
    }
}

const NAMED_ENTITIES: [(&str, char); 36] = [
    ("lt", '<'),
    ("gt", '>'),
    ("amp", '&'),
    ("quot", '"'),
    ("apos", '\''),
    ("nbsp", '\u{00A0}'),
    ("iexcl", '¡'),
    ("cent", '¢'),
    ("pound", '£'),
    ("curren", '¤'),
    ("yen", '¥'),
    ("brvbar", '¦'),
    ("sect", '§'),
    ("uml", '¨'),
    ("copy", '©'),
    ("laquo", '«'),
    ("not", '¬'),
    ("reg", '®'),
    ("deg", '°'),
    ("plusmn", '±'),
    ("para", '¶'),
    ("middot", '·'),
    ("raquo", '»'),
    ("frac14", '¼'),
    ("frac12", '½'),
    ("frac34", '¾'),
    ("iquest", '¿'),
    ("times", '×'),
    ("divide", '÷'),
    ("ndash", '–'),
    ("mdash", '—'),
    ("lsquo", '‘'),
    ("rsquo", '’'),
    ("bull", '•'),
    ("hellip", '…'),
    ("euro", '€'),
];

/// Decodes a standard character reference name (`lt`, `#65`, `#x41`).
pub fn decode_char_reference(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        return char::from_u32(code);
    }
    NAMED_ENTITIES.iter().find(|(n, _)| *n == name).map(|(_, c)| *c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_named_and_positional() {
        let a = TagArg::parse("href=\"go north\"");
        assert_eq!(a.name.as_deref(), Some("HREF"));
        assert_eq!(a.text(), "go north");

        let b = TagArg::parse("\"a=b\"");
        assert_eq!(b.name, None);
        assert_eq!(b.text(), "a=b");

        let c = TagArg::parse("url=http://x/?a=b");
        assert_eq!(c.name.as_deref(), Some("URL"));
        assert_eq!(c.value, "http://x/?a=b");
    }

    #[test]
    fn test_strip_quotes() {
        assert_eq!(strip_quotes("'x'"), "x");
        assert_eq!(strip_quotes("\"x'"), "\"x'");
        assert_eq!(strip_quotes("\""), "\"");
    }

    #[test]
    fn test_close_tags() {
        assert_eq!(close_tags("<B><COLOR red>"), "</COLOR></B>");
        assert_eq!(close_tags("<B>&name;</B>"), "");
        assert_eq!(close_tags("<SEND href=\"x\"><U>"), "</U></SEND>");
        assert_eq!(close_tags(""), "");
    }

    #[test]
    fn test_char_references() {
        assert_eq!(decode_char_reference("lt"), Some('<'));
        assert_eq!(decode_char_reference("#65"), Some('A'));
        assert_eq!(decode_char_reference("#x263A"), Some('☺'));
        assert_eq!(decode_char_reference("bogus"), None);
    }
}
