//! Next/previous page links for multi-record views.
//!
//! Paging is carried entirely by `offset` and `limit` in the page's own
//! query string; every other visitor parameter is carried over unchanged.

use std::str::FromStr;

use serde::Serialize;

use crate::api::collector::QueryInput;
use crate::api::params::ParamValue;
use crate::core::error::VistaError;
use crate::utils::text::sanitize_text;

pub const NO_TYPE_TEXT: &str =
    "<p>You must set type=forward or type=back for this pagination button to work</p>";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forward,
    Backward,
}

impl FromStr for Direction {
    type Err = VistaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "forward" => Ok(Direction::Forward),
            "backward" => Ok(Direction::Backward),
            other => Err(VistaError::Configuration(format!("Bad pagination type: {}", other))),
        }
    }
}

/// Where the visitor currently is in the result list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaginationState {
    pub offset: i64,
    pub limit: i64,
    pub total_count: i64,
}

impl PaginationState {
    /// Reads `offset` (default 0) and `limit` (default `default_limit`) from
    /// the query. Unparseable values count as 0, like an integer cast.
    /// Negative values are clamped to 0.
    pub fn from_query(query: &QueryInput, total_count: i64, default_limit: i64) -> Self {
        let int = |key: &str, default: i64| {
            query.get_str(key).map(leading_int).unwrap_or(default).max(0)
        };
        Self {
            offset: int("offset", 0),
            limit: int("limit", default_limit),
            total_count,
        }
    }
}

fn leading_int(raw: &str) -> i64 {
    let raw = raw.trim();
    let end = raw
        .char_indices()
        .find(|(i, c)| !(c.is_ascii_digit() || (*i == 0 && (*c == '-' || *c == '+'))))
        .map(|(i, _)| i)
        .unwrap_or(raw.len());
    raw[..end].parse().unwrap_or(0)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageLink {
    pub direction: Direction,
    pub offset: i64,
    pub limit: i64,
    pub disabled: bool,
    pub url: String,
}

/// Computes the link one page away from `state`.
///
/// Forward moves by `limit` and shrinks the limit to what remains; it is
/// disabled once nothing remains. Backward never goes below offset 0, is
/// disabled at offset 0, and always asks for `default_limit` records since
/// only the last page can be short.
pub fn build_link(
    direction: Direction,
    state: &PaginationState,
    default_limit: i64,
    base_url: &str,
    passthrough: &QueryInput,
) -> PageLink {
    let (offset, limit, disabled) = match direction {
        Direction::Forward => {
            let offset = state.offset.saturating_add(state.limit);
            let remaining = state.total_count.saturating_sub(offset);
            let limit = if remaining < state.limit { remaining } else { state.limit };
            (offset, limit, remaining <= 0)
        }
        Direction::Backward => {
            let offset = state.offset.saturating_sub(state.limit).max(0);
            (offset, default_limit, state.offset == 0)
        }
    };

    let mut url = format!("{}?offset={}&limit={}", base_url, offset, limit);
    for (name, value) in passthrough.iter() {
        let name = sanitize_text(name);
        if name == "offset" || name == "limit" {
            continue;
        }
        match value {
            ParamValue::Single(v) => url.push_str(&format!("&{}={}", name, sanitize_text(v))),
            ParamValue::List(items) => {
                for v in items {
                    url.push_str(&format!("&{}[]={}", name, sanitize_text(v)));
                }
            }
        }
    }

    PageLink {
        direction,
        offset,
        limit,
        disabled,
        url,
    }
}

/// `<button>` markup for a link; `content` is the button label.
pub fn button_html(link: &PageLink, content: &str) -> String {
    let class = match link.direction {
        Direction::Forward => "vista-listings-paginator listings-forward",
        Direction::Backward => "vista-listings-paginator listings-backward",
    };
    let disabled = if link.disabled { "disabled" } else { "" };
    format!(
        "<button class='{}' onclick=\"window.location.href='{}'\" {}>{}</button>",
        class, link.url, disabled, content
    )
}
