//! Views over one record: a single listing, a single open house, or an
//! analytics summary.

use serde::Serialize;

use crate::api::call::{CallDescriptor, CallType};
use crate::api::collector::ParamCollector;
use crate::api::params::ParameterSet;
use crate::display::page::{LoadState, RenderContext, fetch, log_failures};
use crate::display::shortcode::NO_FIELD_TEXT;
use crate::error;
use crate::fields::table::FieldTable;
use crate::records::RecordKind;
use crate::retrieve::http::Transport;
use crate::utils::text::sanitize_text;

pub const NO_LISTING_PARAM_TEXT: &str = "<p>Listing MLS ID must be in the URL parameter 'listing'</p>";
pub const LISTING_UNAVAILABLE_TEXT: &str = "<p>Unable to retrieve listing</p>";
pub const NO_OPENHOUSE_PARAM_TEXT: &str = "<p>Open house ID must be in the URL parameter \"openhouse\"</p>";
pub const ANALYTICS_UNAVAILABLE_TEXT: &str = "<p>Unable to retrieve analytics</p>";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SingleKind {
    Listing,
    OpenHouse,
    Analytics,
}

impl SingleKind {
    pub fn record_kind(self) -> RecordKind {
        match self {
            SingleKind::Listing => RecordKind::Listing,
            SingleKind::OpenHouse => RecordKind::OpenHouse,
            SingleKind::Analytics => RecordKind::Analytics,
        }
    }
}

#[derive(Debug)]
pub struct SingleView {
    kind: SingleKind,
    state: LoadState<FieldTable>,
}

impl SingleView {
    pub fn new(kind: SingleKind) -> Self {
        Self {
            kind,
            state: LoadState::Pending,
        }
    }

    pub fn kind(&self) -> SingleKind {
        self.kind
    }

    pub fn state(&self) -> &LoadState<FieldTable> {
        &self.state
    }

    /// Fetches and normalizes on first use; afterwards returns what the first
    /// use produced.
    pub async fn ensure<T: Transport>(&mut self, ctx: &RenderContext<'_, T>) -> Result<&FieldTable, &str> {
        if matches!(self.state, LoadState::Pending) {
            self.state = match load(self.kind, ctx).await {
                Ok(table) => {
                    log_failures(ctx, self.kind.record_kind(), &table);
                    LoadState::Ready(table)
                }
                Err(message) => {
                    error!(ctx.api.logger, "View load failed", "view" => self.kind, "message" => &message);
                    LoadState::Failed(message)
                }
            };
        }

        match &self.state {
            LoadState::Ready(table) => Ok(table),
            LoadState::Failed(message) => Err(message),
            LoadState::Pending => Err("View was not loaded"),
        }
    }

    /// Display value of one field, or the load failure message.
    pub async fn get_field<T: Transport>(&mut self, ctx: &RenderContext<'_, T>, name: &str) -> String {
        match self.ensure(ctx).await {
            Ok(table) => table.field(name),
            Err(message) => message.to_string(),
        }
    }

    /// `get_field` for a shortcode whose `field` attribute may be missing.
    pub async fn display_field<T: Transport>(&mut self, ctx: &RenderContext<'_, T>, field: Option<&str>) -> String {
        match field {
            Some(name) => self.get_field(ctx, name).await,
            None => NO_FIELD_TEXT.to_string(),
        }
    }
}

async fn load<T: Transport>(kind: SingleKind, ctx: &RenderContext<'_, T>) -> Result<FieldTable, String> {
    let body = match kind {
        SingleKind::Listing => {
            let id = ctx.query.get_str("listing").ok_or(NO_LISTING_PARAM_TEXT)?;
            let descriptor = CallDescriptor::new(CallType::Property, &sanitize_text(id)).map_err(|e| e.to_string())?;
            let mut params = ParameterSet::new();
            params.merge("include", "rooms");
            fetch(ctx, descriptor, &params)
                .await
                .map_err(|_| LISTING_UNAVAILABLE_TEXT.to_string())?
                .body
        }
        SingleKind::OpenHouse => {
            let id = ctx.query.get_str("openhouse").ok_or(NO_OPENHOUSE_PARAM_TEXT)?;
            let descriptor = CallDescriptor::new(CallType::OpenHouse, &sanitize_text(id)).map_err(|e| e.to_string())?;
            fetch(ctx, descriptor, &ParameterSet::new())
                .await
                .map_err(|e| e.to_string())?
                .body
        }
        SingleKind::Analytics => {
            let descriptor = CallDescriptor::collection(CallType::Analytics).map_err(|e| e.to_string())?;
            let params = ParamCollector::analytics(ctx.collect).collect(&ctx.query);
            fetch(ctx, descriptor, &params)
                .await
                .map_err(|_| ANALYTICS_UNAVAILABLE_TEXT.to_string())?
                .body
        }
    };

    Ok(kind.record_kind().normalize(&body, &ctx.options))
}
