//! src/retrieve/http.rs
//!
//! Transport seam for the listings API. The client builds an `OutboundRequest`
//! and hands it to a `Transport`; `HttpTransport` is the reqwest-backed
//! implementation used in production, tests substitute their own.
use std::future::Future;
use std::time::Duration;

use reqwest::{Client, header::{AUTHORIZATION, HeaderValue}};

use crate::configs::VistaConfig;
use crate::core::error::VistaError;
use crate::loggers::Logger;

/// A fully-resolved POST: query string already applied to `url`.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    pub url: String,
    /// Complete `Authorization` header value.
    pub authorization: String,
    /// Form-encoded body fields.
    pub form: Vec<(String, String)>,
}

/// Raw reply. The body is read exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportReply {
    pub status: u16,
    pub body: String,
}

pub trait Transport {
    fn post(
        &self,
        request: &OutboundRequest,
    ) -> impl Future<Output = Result<TransportReply, VistaError>> + Send;
}

/// HttpOptions
///
/// Settings for the reqwest client behind `HttpTransport`.
#[derive(Debug, Clone)]
pub struct HttpOptions {
    /// Optional timeout for the underlying reqwest client.
    pub timeout: Option<Duration>,
    /// Sent as `user-agent`.
    pub user_agent: String,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(30)),
            user_agent: concat!("vista_listings/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpOptions {
    pub fn from_config(config: &VistaConfig) -> Self {
        Self {
            timeout: config.request_timeout(),
            ..Self::default()
        }
    }
}

/// HttpTransport
///
/// Single-attempt POST helper. No retries: one client instance, one call.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    logger: Logger,
}

impl HttpTransport {
    pub fn new(logger: Logger) -> Self {
        Self::new_with_opts(logger, None)
    }

    pub fn new_with_opts(logger: Logger, opts: Option<HttpOptions>) -> Self {
        let opts = opts.unwrap_or_default();
        let mut builder = Client::builder().user_agent(opts.user_agent);
        if let Some(timeout) = opts.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().unwrap_or_else(|_| Client::new());

        Self { client, logger }
    }
}

impl Transport for HttpTransport {
    async fn post(&self, request: &OutboundRequest) -> Result<TransportReply, VistaError> {
        crate::debug!(self.logger, "Request start", "method" => "POST", "url" => &request.url);

        let auth = HeaderValue::from_str(&request.authorization)
            .map_err(|e| VistaError::Internal(format!("Invalid authorization header: {}", e)))?;

        let resp = self
            .client
            .post(&request.url)
            .header(AUTHORIZATION, auth)
            .form(&request.form)
            .send()
            .await
            .map_err(|e| {
                crate::error!(self.logger, "Network failure", "url" => &request.url, "error" => e.to_string());
                VistaError::Transport(e.to_string())
            })?;

        let status = resp.status().as_u16();
        // Read body once and reuse
        let body = resp.text().await.map_err(|e| {
            crate::error!(self.logger, "Body read failure", "url" => &request.url, "error" => e.to_string());
            VistaError::Transport(e.to_string())
        })?;

        crate::debug!(self.logger, "Request done", "url" => &request.url, "status" => status, "bytes" => body.len());

        Ok(TransportReply { status, body })
    }
}
