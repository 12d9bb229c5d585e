//! Views over a list of records: listing search results, open house search
//! results, and listings picked by shortcode attributes.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::api::call::{CallDescriptor, CallType};
use crate::api::client::{ResponseHeaders, header_value};
use crate::api::collector::{LISTING_PARAMS, ParamCollector};
use crate::api::params::ParameterSet;
use crate::display::page::{LoadState, RenderContext, fetch, log_failures};
use crate::display::pagination::{Direction, NO_TYPE_TEXT, PaginationState, build_link, button_html};
use crate::display::shortcode::replace_fields;
use crate::error;
use crate::fields::table::FieldTable;
use crate::records::RecordKind;
use crate::retrieve::http::Transport;
use crate::utils::text::sanitize_text;

pub const NO_LISTINGS_TEXT: &str = "No listings matched your query";
pub const NO_OPEN_HOUSES_TEXT: &str = "No open houses matched your query";

pub const TOTAL_COUNT_HEADER: &str = "X-Total-Count";

/// Shortcode attribute values accept `,` with any trailing whitespace too.
static FILTER_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(%2C\+)|(, )|\+|,\s*").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MultiKind {
    Listings,
    OpenHouses,
    Filtered,
}

impl MultiKind {
    fn call_type(self) -> CallType {
        match self {
            MultiKind::Listings | MultiKind::Filtered => CallType::Properties,
            MultiKind::OpenHouses => CallType::OpenHouses,
        }
    }

    fn record_kind(self) -> RecordKind {
        match self {
            MultiKind::Listings | MultiKind::Filtered => RecordKind::Listing,
            MultiKind::OpenHouses => RecordKind::OpenHouse,
        }
    }

    fn empty_text(self) -> &'static str {
        match self {
            MultiKind::Listings | MultiKind::Filtered => NO_LISTINGS_TEXT,
            MultiKind::OpenHouses => NO_OPEN_HOUSES_TEXT,
        }
    }

    /// Paginated views always ask for an exact count and a page size.
    fn paginated(self) -> bool {
        !matches!(self, MultiKind::Filtered)
    }

    /// Parameters collected from the visitor's query string. Filtered views
    /// take theirs from shortcode attributes instead.
    pub fn collect<T>(self, ctx: &RenderContext<'_, T>) -> ParameterSet {
        match self {
            MultiKind::Listings => ParamCollector::listings(ctx.collect).collect(&ctx.query),
            MultiKind::OpenHouses => ParamCollector::open_houses(ctx.collect).collect(&ctx.query),
            MultiKind::Filtered => ParameterSet::new(),
        }
    }
}

/// Listing parameters from shortcode attributes. `listing_ids` and
/// `mls_area` are both searched through `q`.
pub fn filter_params(atts: &[(&str, &str)]) -> ParameterSet {
    let mut params = ParameterSet::new();
    for (external, api_name) in LISTING_PARAMS.entries() {
        let Some((_, raw)) = atts.iter().find(|(name, _)| *name == external) else {
            continue;
        };
        let target = match api_name {
            "listing_ids" | "mls_area" => "q",
            other => other,
        };
        let sanitized = sanitize_text(raw);
        for token in FILTER_SEPARATOR.split(&sanitized).filter(|t| !t.is_empty()) {
            params.merge(target, token);
        }
    }
    params
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MultiData {
    pub records: Vec<FieldTable>,
    pub headers: ResponseHeaders,
}

impl MultiData {
    /// `X-Total-Count` as sent, or `"0"`.
    pub fn total_count(&self) -> &str {
        header_value(&self.headers, TOTAL_COUNT_HEADER).unwrap_or("0")
    }
}

#[derive(Debug)]
pub struct MultiView {
    kind: MultiKind,
    state: LoadState<MultiData>,
}

impl MultiView {
    pub fn new(kind: MultiKind) -> Self {
        Self {
            kind,
            state: LoadState::Pending,
        }
    }

    pub fn kind(&self) -> MultiKind {
        self.kind
    }

    pub fn state(&self) -> &LoadState<MultiData> {
        &self.state
    }

    /// Fetches on first use with `params`; later calls ignore `params` and
    /// return what the first call produced.
    pub async fn ensure<T: Transport>(
        &mut self,
        ctx: &RenderContext<'_, T>,
        params: &ParameterSet,
    ) -> Result<&MultiData, &str> {
        if matches!(self.state, LoadState::Pending) {
            self.state = match load(self.kind, ctx, params).await {
                Ok(data) => LoadState::Ready(data),
                Err(message) => {
                    error!(ctx.api.logger, "View load failed", "view" => self.kind, "message" => &message);
                    LoadState::Failed(message)
                }
            };
        }

        match &self.state {
            LoadState::Ready(data) => Ok(data),
            LoadState::Failed(message) => Err(message),
            LoadState::Pending => Err("View was not loaded"),
        }
    }

    /// `template` rendered once per record, concatenated.
    pub async fn list<T: Transport>(
        &mut self,
        ctx: &RenderContext<'_, T>,
        params: &ParameterSet,
        template: &str,
    ) -> String {
        match self.ensure(ctx, params).await {
            Ok(data) => data
                .records
                .iter()
                .map(|record| replace_fields(template, |name| record.field(name)))
                .collect(),
            Err(message) => message.to_string(),
        }
    }

    pub async fn total<T: Transport>(&mut self, ctx: &RenderContext<'_, T>, params: &ParameterSet) -> String {
        match self.ensure(ctx, params).await {
            Ok(data) => data.total_count().to_string(),
            Err(message) => message.to_string(),
        }
    }

    /// Pagination button; `direction` is the raw `type` attribute.
    pub async fn paginator<T: Transport>(
        &mut self,
        ctx: &RenderContext<'_, T>,
        params: &ParameterSet,
        direction: Option<&str>,
        content: &str,
    ) -> String {
        let Some(direction) = direction.and_then(|d| d.parse::<Direction>().ok()) else {
            return NO_TYPE_TEXT.to_string();
        };
        let data = match self.ensure(ctx, params).await {
            Ok(data) => data,
            Err(message) => return message.to_string(),
        };

        let total = data.total_count().trim().parse::<i64>().unwrap_or(0);
        let default_limit = i64::from(ctx.api.config.default_limit);
        let state = PaginationState::from_query(&ctx.query, total, default_limit);
        let link = build_link(direction, &state, default_limit, &ctx.page_url, &ctx.query);
        button_html(&link, content)
    }

    /// Every record's own fields as a JSON array of objects.
    pub async fn fields_json<T: Transport>(
        &mut self,
        ctx: &RenderContext<'_, T>,
        params: &ParameterSet,
    ) -> Result<String, String> {
        let data = self.ensure(ctx, params).await.map_err(str::to_string)?;
        serde_json::to_string(&data.records).map_err(|e| e.to_string())
    }
}

async fn load<T: Transport>(
    kind: MultiKind,
    ctx: &RenderContext<'_, T>,
    params: &ParameterSet,
) -> Result<MultiData, String> {
    let descriptor = CallDescriptor::collection(kind.call_type()).map_err(|e| e.to_string())?;

    let mut request = params.clone();
    if kind.paginated() {
        request.merge("count", "true");
        if !params.contains("limit") {
            request.merge("limit", ctx.api.config.default_limit.to_string());
        }
    }

    let response = fetch(ctx, descriptor, &request).await.map_err(|e| e.to_string())?;
    let records = match &response.body {
        Value::Array(items) if !items.is_empty() => items,
        _ => return Err(kind.empty_text().to_string()),
    };

    let records = records
        .iter()
        .map(|record| {
            let table = kind.record_kind().normalize(record, &ctx.options);
            log_failures(ctx, kind.record_kind(), &table);
            table
        })
        .collect();

    Ok(MultiData {
        records,
        headers: response.headers,
    })
}
