//! Small text helpers shared by the collectors and the HTML renderers.

use std::sync::LazyLock;

use regex::Regex;

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\r\n\t ]+").unwrap());
static NUMERIC_ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#(x[0-9a-fA-F]+|[0-9]+);").unwrap());

/// Plain-text form of visitor input: tags and stray `<` removed, whitespace
/// runs collapsed, ends trimmed.
pub fn sanitize_text(raw: &str) -> String {
    let stripped = TAG.replace_all(raw, "");
    let stripped = stripped.replace('<', "");
    WHITESPACE.replace_all(&stripped, " ").trim().to_string()
}

/// Escapes text for use inside an HTML attribute or element.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            other => out.push(other),
        }
    }
    out
}

/// Reverses the entity encoding editors apply to template text.
pub fn decode_entities(raw: &str) -> String {
    let named = raw
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&nbsp;", "\u{a0}");

    let numeric = NUMERIC_ENTITY.replace_all(&named, |caps: &regex::Captures| {
        let code = &caps[1];
        let parsed = match code.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => code.parse::<u32>().ok(),
        };
        parsed
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_else(|| caps[0].to_string())
    });

    // last, so "&amp;lt;" decodes to "&lt;" and not "<"
    numeric.replace("&amp;", "&")
}
