//! # Page Render
//!
//! One `PageRender` lives for one page render. It owns at most one view of
//! each kind, so every shortcode on the page that reads listings shares a
//! single fetch, and a failed fetch is reported the same way everywhere.

use serde::Serialize;

use crate::api::call::CallDescriptor;
use crate::api::client::{ApiClient, ApiContext, ApiResponse};
use crate::api::collector::{CollectOptions, QueryInput};
use crate::api::params::ParameterSet;
use crate::core::error::VistaError;
use crate::display::multiple::{MultiKind, MultiView, filter_params};
use crate::display::shortcode::{field_spans, link_with_query};
use crate::display::single::{SingleKind, SingleView};
use crate::fields::normalizer::NormalizeOptions;
use crate::fields::table::FieldTable;
use crate::records::RecordKind;
use crate::retrieve::http::Transport;
use crate::utils::text::escape_html;
use crate::warn;

pub const ONE_MAP_TEXT: &str = "<p>Cannot display more than one map per page</p>";

/// Lazily loaded view data. A failure is kept as display text for the rest
/// of the render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LoadState<D> {
    Pending,
    Ready(D),
    Failed(String),
}

/// What the views need from the current request.
pub struct RenderContext<'a, T> {
    pub api: ApiContext<'a, T>,
    /// Decoded visitor query string.
    pub query: QueryInput,
    /// The query string as received, for `link_with_query`.
    pub raw_query: String,
    /// URL of the page being rendered; pagination links point back here.
    pub page_url: String,
    pub options: NormalizeOptions,
    pub collect: CollectOptions,
}

impl<'a, T> RenderContext<'a, T> {
    pub fn new(api: ApiContext<'a, T>, page_url: &str, raw_query: &str) -> Self {
        Self {
            query: QueryInput::parse(raw_query),
            raw_query: raw_query.to_string(),
            page_url: page_url.to_string(),
            options: NormalizeOptions::from_config(api.config),
            collect: CollectOptions {
                trim_tokens: api.config.trim_list_tokens,
            },
            api,
        }
    }
}

/// One request through a fresh client.
pub(crate) async fn fetch<T: Transport>(
    ctx: &RenderContext<'_, T>,
    descriptor: CallDescriptor,
    params: &ParameterSet,
) -> Result<ApiResponse, VistaError> {
    let mut client = ApiClient::new(ctx.api, descriptor);
    client.add_params(params)?;
    client.into_response().await
}

pub(crate) fn log_failures<T>(ctx: &RenderContext<'_, T>, kind: RecordKind, table: &FieldTable) {
    for failure in table.failures() {
        warn!(
            ctx.api.logger,
            "Field handler failed",
            "record" => kind,
            "field" => &failure.field,
            "details" => &failure.details
        );
    }
}

pub struct PageRender<'a, T: Transport> {
    ctx: RenderContext<'a, T>,
    listing: SingleView,
    open_house: SingleView,
    analytics: SingleView,
    listings: MultiView,
    open_houses: MultiView,
    filtered: MultiView,
    map_shown: bool,
}

impl<'a, T: Transport> PageRender<'a, T> {
    pub fn new(ctx: RenderContext<'a, T>) -> Self {
        Self {
            ctx,
            listing: SingleView::new(SingleKind::Listing),
            open_house: SingleView::new(SingleKind::OpenHouse),
            analytics: SingleView::new(SingleKind::Analytics),
            listings: MultiView::new(MultiKind::Listings),
            open_houses: MultiView::new(MultiKind::OpenHouses),
            filtered: MultiView::new(MultiKind::Filtered),
            map_shown: false,
        }
    }

    pub fn context(&self) -> &RenderContext<'a, T> {
        &self.ctx
    }

    /// `[vista_listing_field]`, `[vista_openhouse_field]`, `[vista_analytics_field]`.
    pub async fn field(&mut self, kind: SingleKind, field: Option<&str>) -> String {
        let (ctx, view) = self.single(kind);
        view.display_field(ctx, field).await
    }

    /// `[vista_<kind>_list]`: `template` repeated per record.
    pub async fn list(&mut self, kind: MultiKind, template: &str) -> String {
        let params = kind.collect(&self.ctx);
        let (ctx, view) = self.multi(kind);
        view.list(ctx, &params, template).await
    }

    /// `[vista_<kind>_total]`.
    pub async fn total(&mut self, kind: MultiKind) -> String {
        let params = kind.collect(&self.ctx);
        let (ctx, view) = self.multi(kind);
        view.total(ctx, &params).await
    }

    /// `[vista_<kind>_paginator type=forward|backward]content[/...]`.
    pub async fn paginator(&mut self, kind: MultiKind, direction: Option<&str>, content: &str) -> String {
        let params = kind.collect(&self.ctx);
        let (ctx, view) = self.multi(kind);
        view.paginator(ctx, &params, direction, content).await
    }

    /// `[vista_listing_filter ...atts]template[/vista_listing_filter]`.
    pub async fn listing_filter(&mut self, atts: &[(&str, &str)], template: &str) -> String {
        let params = filter_params(atts);
        self.filtered.list(&self.ctx, &params, template).await
    }

    /// `[vista_listings_map]`: listing data for the map script, the map
    /// container, and `template` with every field token turned into a span.
    /// Only the first call on a page renders.
    pub async fn listings_map(&mut self, template: &str) -> String {
        if self.map_shown {
            return ONE_MAP_TEXT.to_string();
        }
        let params = MultiKind::Listings.collect(&self.ctx);
        let data = match self.listings.fields_json(&self.ctx, &params).await {
            Ok(data) => data,
            Err(message) => return message,
        };
        self.map_shown = true;
        format!(
            "<span id='vsta-listing-data' style='display: none;' data-listings='{}'></span><div id='vsta-listing-map'></div><div id='vsta-listing-map-info'>{}</div>",
            escape_html(&data),
            field_spans(template)
        )
    }

    /// `[vista_link_query page=...]content[/vista_link_query]`.
    pub fn link_query(&self, page: Option<&str>, content: &str) -> String {
        link_with_query(page, content, &self.ctx.raw_query)
    }

    fn single(&mut self, kind: SingleKind) -> (&RenderContext<'a, T>, &mut SingleView) {
        let view = match kind {
            SingleKind::Listing => &mut self.listing,
            SingleKind::OpenHouse => &mut self.open_house,
            SingleKind::Analytics => &mut self.analytics,
        };
        (&self.ctx, view)
    }

    fn multi(&mut self, kind: MultiKind) -> (&RenderContext<'a, T>, &mut MultiView) {
        let view = match kind {
            MultiKind::Listings => &mut self.listings,
            MultiKind::OpenHouses => &mut self.open_houses,
            MultiKind::Filtered => &mut self.filtered,
        };
        (&self.ctx, view)
    }
}
