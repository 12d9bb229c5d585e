//! # Listings API Client
//!
//! One `ApiClient` performs at most one network call. The first call to
//! `response`/`get_response`/`get_headers` fetches; every later call returns
//! the cached envelope, or re-raises the recorded error without retrying.
//!
//! Failures stamp a process-wide "last error" marker in the settings store so
//! the next render, even from another request, can append `nocache=<ts>` and
//! get past any HTTP cache holding the failed reply. A success clears it.

use std::collections::BTreeMap;

use base64::{Engine as _, engine::general_purpose};
use chrono::Utc;
use reqwest::Url;
use serde::Serialize;
use serde_json::Value;

use crate::api::call::CallDescriptor;
use crate::api::params::{ParamValue, ParameterSet};
use crate::configs::VistaConfig;
use crate::core::error::VistaError;
use crate::loggers::Logger;
use crate::retrieve::http::{OutboundRequest, Transport, TransportReply};
use crate::store::{ErrorMarker, License, SettingsStore};
use crate::{error, info, warn};

/// Header name → values, as returned inside the envelope.
pub type ResponseHeaders = BTreeMap<String, Vec<String>>;

/// Decoded `{ headers, body }` envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse {
    pub body: Value,
    pub headers: ResponseHeaders,
}

impl ApiResponse {
    /// First value of a header, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        header_value(&self.headers, name)
    }
}

pub fn header_value<'h>(headers: &'h ResponseHeaders, name: &str) -> Option<&'h str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .and_then(|(_, v)| v.first())
        .map(String::as_str)
}

/// Everything a client borrows from the current page render.
pub struct ApiContext<'a, T> {
    pub transport: &'a T,
    pub store: &'a dyn SettingsStore,
    pub config: &'a VistaConfig,
    pub logger: &'a Logger,
}

impl<T> Clone for ApiContext<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ApiContext<'_, T> {}

#[derive(Debug)]
enum ClientState {
    Pending,
    Fetched(ApiResponse),
    Failed(VistaError),
}

pub struct ApiClient<'a, T: Transport> {
    ctx: ApiContext<'a, T>,
    descriptor: CallDescriptor,
    params: ParameterSet,
    state: ClientState,
}

impl<'a, T: Transport> ApiClient<'a, T> {
    pub fn new(ctx: ApiContext<'a, T>, descriptor: CallDescriptor) -> Self {
        Self {
            ctx,
            descriptor,
            params: ParameterSet::new(),
            state: ClientState::Pending,
        }
    }

    pub fn descriptor(&self) -> &CallDescriptor {
        &self.descriptor
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    /// Adds a filter parameter. Values are not validated against the upstream API.
    pub fn add_param(&mut self, name: &str, value: impl Into<ParamValue>) -> Result<(), VistaError> {
        if !matches!(self.state, ClientState::Pending) {
            return Err(VistaError::AlreadyCalled);
        }
        self.params.merge(name, value);
        Ok(())
    }

    /// Merges a whole collected set, in order.
    pub fn add_params(&mut self, params: &ParameterSet) -> Result<(), VistaError> {
        for (name, value) in params.iter() {
            self.add_param(name, value.clone())?;
        }
        Ok(())
    }

    /// Outbound URL: endpoint and record id, then parameters in insertion order,
    /// then `nocache` when a recent failure is on record.
    pub fn request_url(&self, cache_buster: Option<i64>) -> Result<String, VistaError> {
        let mut url = Url::parse(&self.ctx.config.remote_url).map_err(|e| {
            VistaError::Configuration(format!("Invalid remote URL '{}': {}", self.ctx.config.remote_url, e))
        })?;

        {
            let mut query = url.query_pairs_mut();
            for (name, value) in self.descriptor.query_pairs() {
                query.append_pair(name, value);
            }
            for (name, value) in self.params.pairs() {
                query.append_pair(name, value);
            }
            if let Some(ts) = cache_buster {
                query.append_pair("nocache", &ts.to_string());
            }
        }

        Ok(url.into())
    }

    fn authorization(&self) -> String {
        let credential = format!("{}:{}", self.ctx.config.api_user, self.ctx.config.api_password);
        format!("Basic {}", general_purpose::STANDARD.encode(credential))
    }

    /// The decoded envelope, fetching it on first use.
    pub async fn response(&mut self) -> Result<&ApiResponse, VistaError> {
        if matches!(self.state, ClientState::Pending) {
            self.state = match self.perform().await {
                Ok(resp) => ClientState::Fetched(resp),
                Err(e) => ClientState::Failed(e),
            };
        }

        match &self.state {
            ClientState::Fetched(resp) => Ok(resp),
            ClientState::Failed(e) => Err(e.clone()),
            ClientState::Pending => Err(VistaError::Internal("Response was not fetched".into())),
        }
    }

    pub async fn get_response(&mut self) -> Result<&Value, VistaError> {
        Ok(&self.response().await?.body)
    }

    pub async fn get_headers(&mut self) -> Result<&ResponseHeaders, VistaError> {
        Ok(&self.response().await?.headers)
    }

    /// Fetches if needed and hands the envelope over.
    pub async fn into_response(mut self) -> Result<ApiResponse, VistaError> {
        self.response().await?;
        match self.state {
            ClientState::Fetched(resp) => Ok(resp),
            ClientState::Failed(e) => Err(e),
            ClientState::Pending => Err(VistaError::Internal("Response was not fetched".into())),
        }
    }

    async fn perform(&self) -> Result<ApiResponse, VistaError> {
        let marker = ErrorMarker::new(self.ctx.store);
        let endpoint = self.descriptor.call_type().endpoint();

        let buster = match marker.cache_buster(Utc::now()) {
            Ok(buster) => buster,
            Err(e) => {
                warn!(self.ctx.logger, "Could not clear API error marker", "error" => e.to_string());
                None
            }
        };
        if let Some(ts) = buster {
            info!(self.ctx.logger, "Recent API failure on record, busting cache", "nocache" => ts);
        }

        let license = License::load(self.ctx.store);
        let result = match self.request_url(buster) {
            Ok(url) => {
                info!(
                    self.ctx.logger,
                    "API request",
                    "endpoint" => endpoint,
                    "params" => self.params.len(),
                    "licensed" => license.valid,
                    "tier" => license.tier
                );
                let request = OutboundRequest {
                    url,
                    authorization: self.authorization(),
                    form: vec![("key".to_string(), license.token().to_string())],
                };
                match self.ctx.transport.post(&request).await {
                    Ok(reply) => classify_reply(&reply, endpoint),
                    Err(e) => Err(e),
                }
            }
            Err(e) => Err(e),
        };

        match &result {
            Ok(_) => {
                if let Err(e) = marker.clear() {
                    warn!(self.ctx.logger, "Could not clear API error marker", "error" => e.to_string());
                }
            }
            Err(e) => {
                error!(self.ctx.logger, "API call failed", "endpoint" => endpoint, "error" => e.to_string());
                if let Err(store_err) = marker.record(Utc::now()) {
                    warn!(self.ctx.logger, "Could not record API error marker", "error" => store_err.to_string());
                }
            }
        }

        result
    }
}

/// Decodes and classifies a raw reply: undecodable body, then missing
/// envelope keys, then an explicit upstream error flag.
pub fn classify_reply(reply: &TransportReply, endpoint: &str) -> Result<ApiResponse, VistaError> {
    let payload: Value = serde_json::from_str(&reply.body).map_err(|e| {
        VistaError::Transport(format!("status {}: response is not JSON ({})", reply.status, e))
    })?;

    let malformed = |details: &str| VistaError::MalformedResponse {
        endpoint: endpoint.to_string(),
        details: details.to_string(),
    };

    let headers = payload.get("headers").filter(|v| !v.is_null());
    let body = payload.get("body").filter(|v| !v.is_null());
    let (Some(headers), Some(body)) = (headers, body) else {
        return Err(malformed("missing headers or body"));
    };

    if payload.get("error").is_some_and(is_error_flag) {
        let message = payload
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("no message")
            .to_string();
        return Err(VistaError::Upstream { message });
    }

    let headers = decode_headers(headers).ok_or_else(|| malformed("headers is not an object"))?;

    Ok(ApiResponse {
        body: body.clone(),
        headers,
    })
}

fn is_error_flag(value: &Value) -> bool {
    !matches!(value, Value::Null | Value::Bool(false))
}

fn decode_headers(raw: &Value) -> Option<ResponseHeaders> {
    let map = raw.as_object()?;
    let headers = map
        .iter()
        .map(|(name, values)| {
            let values = match values {
                Value::Array(items) => items.iter().map(scalar_text).collect(),
                other => vec![scalar_text(other)],
            };
            (name.clone(), values)
        })
        .collect();
    Some(headers)
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
