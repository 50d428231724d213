//! Character classes and helpers for bare URL detection.

/// Schemes recognized with a single `:` (no `//`).
pub(crate) const PROTOCOLS: [&str; 10] = ["mailto", "skype", "aim", "callto", "gtalk", "im", "itms", "msnim", "tel", "ymsgr"];

/// Length of the longest entry in [`PROTOCOLS`].
pub(crate) const MAX_PROTOCOL_LEN: usize = 6;

/// Prefix added to `www.` links.
pub(crate) const WWW_PREFIX: &str = "http://";

/// Whether `ch` may appear in a URL. In `scheme` mode only letters and digits
/// qualify, which is what the lookback before `://` walks over.
pub(crate) fn char_allowed_in_url(ch: char, scheme: bool) -> bool {
    if ch.is_ascii_alphanumeric() {
        return true;
    }
    !scheme
        && matches!(
            ch,
            '-' | '_' | '.' | '~' | '!' | '*' | '\'' | ';' | ':' | '@' | '&' | '=' | '+' | '$' | ',' | '/' | '?' | '%' | '#' | '[' | ']' | '(' | ')'
        )
}

/// Closing bracket for a URL that starts right after `(` or `[`.
pub(crate) fn closer_for(opening: Option<char>) -> Option<char> {
    match opening {
        Some('(') => Some(')'),
        Some('[') => Some(']'),
        _ => None,
    }
}

/// A link may only start at a word boundary: nothing before it, whitespace,
/// or an opening bracket.
pub(crate) fn is_link_boundary(before: Option<char>) -> bool {
    match before {
        None => true,
        Some(c) => c.is_whitespace() || c == '(' || c == '[',
    }
}

/// Number of trailing characters that belong to the surrounding sentence
/// rather than the URL: punctuation and unbalanced closing brackets.
pub(crate) fn trailing_trim(url: &str) -> usize {
    let chars: Vec<char> = url.chars().collect();
    let mut end = chars.len();
    while end > 0 {
        let c = chars[end - 1];
        let trim = match c {
            '.' | ',' | ';' | ':' | '!' | '?' | '\'' | '"' => true,
            ')' => unbalanced(&chars[..end], '(', ')'),
            ']' => unbalanced(&chars[..end], '[', ']'),
            _ => false,
        };
        if !trim {
            break;
        }
        end -= 1;
    }
    chars.len() - end
}

fn unbalanced(chars: &[char], open: char, close: char) -> bool {
    let opens = chars.iter().filter(|c| **c == open).count();
    let closes = chars.iter().filter(|c| **c == close).count();
    closes > opens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_lookback_covers_all_protocols() {
        assert_eq!(PROTOCOLS.iter().map(|p| p.len()).max(), Some(MAX_PROTOCOL_LEN));
    }

    #[test]
    fn test_char_classes() {
        assert!(char_allowed_in_url('a', true));
        assert!(!char_allowed_in_url('/', true));
        assert!(char_allowed_in_url('/', false));
        assert!(!char_allowed_in_url(' ', false));
        assert!(!char_allowed_in_url('<', false));
    }

    #[test]
    fn test_trailing_trim() {
        assert_eq!(trailing_trim("http://example.com/path(1)."), 1);
        assert_eq!(trailing_trim("http://example.com/x)"), 1);
        assert_eq!(trailing_trim("http://example.com/?a=b"), 0);
        assert_eq!(trailing_trim("http://x.org/!?"), 2);
    }

    #[test]
    fn test_boundary() {
        assert!(is_link_boundary(None));
        assert!(is_link_boundary(Some(' ')));
        assert!(is_link_boundary(Some('(')));
        assert!(!is_link_boundary(Some('x')));
        assert_eq!(closer_for(Some('[')), Some(']'));
    }
}
