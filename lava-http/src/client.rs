//! A client for the Lava Business API.
//!
//! [`GatewayClient`] owns the merchant secret key and performs the two
//! operations a merchant backend needs:
//!
//! - [`GatewayClient::create_invoice`] signs an [`InvoiceRequest`], posts it
//!   to `business/invoice/create` and classifies the JSON response
//! - [`GatewayClient::handle_webhook`] verifies the signature of an inbound
//!   payment webhook and parses it
//!
//! The client holds no mutable state, so one instance can serve concurrent
//! calls. Each call issues at most one HTTP request; nothing is retried.
//!
//! ## Error Handling
//!
//! Gateway-reported failures and malformed responses surface as
//! [`ClientError::Gateway`]. Transport failures keep the underlying
//! `reqwest` error together with a static context string.

use std::fmt::Display;
use std::time::Duration;

use http::HeaderMap;
use lava::{
    FieldMap, GatewayError, InvoiceInfo, InvoiceRequest, Signer, SuccessfulInvoiceInfo,
    parse_invoice_response,
};
use reqwest::Client;
use reqwest::header::ACCEPT;
use url::Url;

#[cfg(feature = "telemetry")]
use tracing::{Span, instrument};

use crate::config::GatewayConfig;
use crate::constants::{APPLICATION_JSON, DEFAULT_BASE_URL, INVOICE_CREATE_PATH, SIGNATURE_FIELD};
use crate::error::ClientError;

/// A client for the Lava Business API.
///
/// # Example
///
/// ```no_run
/// use lava_http::{GatewayClient, InvoiceRequest};
///
/// # async fn run() -> Result<(), lava_http::ClientError> {
/// let client = GatewayClient::new("merchant-secret-key");
/// let request = InvoiceRequest::new(30u32, "4d499d82-2b99-4a7e-be26-5742c41e69e7")
///     .with_expire(120)
///     .with_comment("Order #42");
///
/// let invoice = client.create_invoice(&request).await?;
/// println!("pay at {}", invoice.url);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct GatewayClient {
    /// Signs requests and verifies webhooks
    signer: Signer,
    /// Gateway base URL (e.g. `https://api.lava.ru/`)
    base_url: Url,
    /// Full URL to `POST business/invoice/create`
    invoice_url: Url,
    /// Shared Reqwest HTTP client
    client: Client,
    /// Optional custom headers sent with each request
    headers: HeaderMap,
    /// Optional request timeout
    timeout: Option<Duration>,
}

impl GatewayClient {
    /// Creates a client for the default gateway URL.
    ///
    /// # Panics
    ///
    /// Never in practice: the default URL is a valid constant.
    #[must_use]
    pub fn new(secret_key: impl Into<String>) -> Self {
        let base_url = Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid");
        Self::try_new(secret_key, base_url).expect("default invoice URL is valid")
    }

    /// Creates a client for a custom gateway base URL.
    ///
    /// The invoice endpoint is resolved relative to `base_url`; a missing
    /// trailing slash is added.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::UrlParse`] if the endpoint URL cannot be built.
    pub fn try_new(secret_key: impl Into<String>, mut base_url: Url) -> Result<Self, ClientError> {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let invoice_url =
            base_url
                .join(INVOICE_CREATE_PATH)
                .map_err(|e| ClientError::UrlParse {
                    context: "Failed to construct invoice URL",
                    source: e,
                })?;
        Ok(Self {
            signer: Signer::new(secret_key),
            base_url,
            invoice_url,
            client: Client::new(),
            headers: HeaderMap::new(),
            timeout: None,
        })
    }

    /// Creates a client from a [`GatewayConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::UrlParse`] if the endpoint URL cannot be built.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, ClientError> {
        let client = Self::try_new(config.secret_key.clone(), config.base_url.clone())?;
        Ok(match config.timeout() {
            Some(timeout) => client.with_timeout(timeout),
            None => client,
        })
    }

    /// Returns the base URL used by this client.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns the invoice-creation URL.
    #[must_use]
    pub const fn invoice_url(&self) -> &Url {
        &self.invoice_url
    }

    /// Returns the signer holding the merchant key.
    #[must_use]
    pub const fn signer(&self) -> &Signer {
        &self.signer
    }

    /// Returns any custom headers configured on the client.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the configured timeout, if any.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Attaches custom headers to all future requests.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Sets a timeout for all future requests.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Uses a pre-configured reqwest client.
    #[must_use]
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Signs `fields` with the merchant key.
    #[must_use]
    pub fn generate_signature(&self, fields: &FieldMap) -> String {
        self.signer.sign(fields)
    }

    /// Builds the request body for `request`: its wire fields plus the
    /// `signature` computed over them.
    #[must_use]
    pub fn signed_fields(&self, request: &InvoiceRequest) -> FieldMap {
        let mut fields = request.to_fields();
        let signature = self.signer.sign(&fields);
        fields.insert(SIGNATURE_FIELD.to_owned(), signature.into());
        fields
    }

    /// Creates an invoice.
    ///
    /// The outcome is read from the JSON body; the HTTP status line is not
    /// consulted.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Gateway`] if the gateway rejects the request
    /// or answers with an unexpected body, and [`ClientError::Http`] or
    /// [`ClientError::ResponseBodyRead`] on transport failure.
    #[cfg_attr(
        feature = "telemetry",
        instrument(
            name = "lava.client.create_invoice",
            skip_all,
            fields(
                shop_id = %request.shop_id,
                otel.status_code = tracing::field::Empty,
                error.message = tracing::field::Empty,
            ),
        )
    )]
    pub async fn create_invoice(&self, request: &InvoiceRequest) -> Result<InvoiceInfo, ClientError> {
        let fields = self.signed_fields(request);

        #[cfg(feature = "telemetry")]
        tracing::debug!(order_id = ?fields.get("orderId"), "Creating invoice");

        let result = self
            .post_json(&self.invoice_url, "POST business/invoice/create", &fields)
            .await
            .and_then(|body| parse_invoice_response(&body).map_err(ClientError::from));

        record_result_on_span(&result);

        result
    }

    /// Verifies and parses a payment webhook.
    ///
    /// `headers` are the request headers as name/value pairs, matched
    /// case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::WebhookSignature`] if the signature is
    /// missing or wrong, and [`GatewayError::ResponseFormat`] if the body
    /// lacks a required field.
    pub fn handle_webhook<I, K, V>(
        &self,
        body: &FieldMap,
        headers: I,
    ) -> Result<SuccessfulInvoiceInfo, GatewayError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        lava::handle_webhook(&self.signer, body, headers)
    }

    /// Verifies and parses a payment webhook received as an HTTP request.
    ///
    /// Header values that are not visible ASCII are ignored.
    ///
    /// # Errors
    ///
    /// See [`GatewayClient::handle_webhook`].
    pub fn handle_webhook_request(
        &self,
        body: &FieldMap,
        headers: &HeaderMap,
    ) -> Result<SuccessfulInvoiceInfo, GatewayError> {
        let pairs = headers
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|value| (name.as_str(), value)));
        self.handle_webhook(body, pairs)
    }

    /// POSTs `payload` as JSON and returns the raw response body.
    ///
    /// `context` is a human-readable identifier used in error messages (e.g. `"POST business/invoice/create"`).
    async fn post_json(
        &self,
        url: &Url,
        context: &'static str,
        payload: &FieldMap,
    ) -> Result<Vec<u8>, ClientError> {
        let mut req = self
            .client
            .post(url.clone())
            .header(ACCEPT, APPLICATION_JSON)
            .json(payload);
        for (key, value) in &self.headers {
            req = req.header(key, value);
        }
        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }
        let http_response = req
            .send()
            .await
            .map_err(|e| ClientError::Http { context, source: e })?;

        #[cfg(feature = "telemetry")]
        tracing::debug!(status = %http_response.status(), "Gateway responded");

        let body = http_response
            .bytes()
            .await
            .map_err(|e| ClientError::ResponseBodyRead { context, source: e })?;
        Ok(body.to_vec())
    }
}

/// Records the outcome of a request on a tracing span, including status and errors.
#[cfg(feature = "telemetry")]
fn record_result_on_span<R, E: Display>(result: &Result<R, E>) {
    let span = Span::current();
    match result {
        Ok(_) => {
            span.record("otel.status_code", "OK");
        }
        Err(err) => {
            span.record("otel.status_code", "ERROR");
            span.record("error.message", tracing::field::display(err));
            tracing::event!(tracing::Level::ERROR, error = %err, "Request to gateway failed");
        }
    }
}

/// Records the outcome of a request on a tracing span, including status and errors.
/// Noop if telemetry feature is off.
#[cfg(not(feature = "telemetry"))]
fn record_result_on_span<R, E: Display>(_result: &Result<R, E>) {}
