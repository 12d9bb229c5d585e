//! The `[field]` substitution protocol and other small HTML helpers.

use std::sync::LazyLock;

use regex::Regex;

use crate::utils::text::decode_entities;

pub const NO_FIELD_TEXT: &str =
    "You must specify the listing field to display using the \"field\" shortcode attribute";
pub const NO_PAGE_TEXT: &str = "<p>ERROR: 'Page' shortcode attribute must be set.</p>";

static QUERY_UNSAFE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9 ,&=?%+]").unwrap());

/// Replaces every `[name]` token in `template` with `lookup(name)`.
///
/// The template is entity-decoded first. Tokens are found by splitting on
/// `]`; a piece holding more than one `[` is kept with an inline
/// `ERROR: Extra [ before ...` marker.
pub fn replace_fields<F>(template: &str, mut lookup: F) -> String
where
    F: FnMut(&str) -> String,
{
    let decoded = decode_entities(template);
    let mut out = String::with_capacity(decoded.len());

    for token in decoded.split(']') {
        if !token.contains('[') {
            out.push_str(token);
            continue;
        }
        let parts: Vec<&str> = token.split('[').collect();
        out.push_str(parts[0]);
        out.push_str(&lookup(parts[1]));
        if let Some(extra) = parts.get(2) {
            out.push_str(&format!("ERROR: Extra [ before {}", extra));
        }
    }
    out
}

/// Replaces every `[name]` token with an empty span the map script fills in.
pub fn field_spans(template: &str) -> String {
    replace_fields(template, |name| {
        format!("<span class='vsta-map-field' id='vsta-map-info-{}'></span>", name)
    })
}

/// `<a>` to `page` carrying the current query string, restricted to
/// `[A-Za-z0-9 ,&=?%+]`.
pub fn link_with_query(page: Option<&str>, content: &str, raw_query: &str) -> String {
    let Some(page) = page else {
        return NO_PAGE_TEXT.to_string();
    };
    let validated = QUERY_UNSAFE.replace_all(raw_query, "");
    let query = if validated.is_empty() {
        String::new()
    } else {
        format!("?{}", validated)
    };
    format!("<a href='{}{}'>{}</a>", page, query, content)
}
