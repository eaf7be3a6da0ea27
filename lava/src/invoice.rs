//! Invoice requests and results.
//!
//! [`InvoiceRequest`] describes an invoice to create. Optional members that
//! are left unset are omitted from the signed payload entirely; they are
//! never sent as `null`. [`InvoiceInfo`] is what the gateway returns for a
//! created invoice.

use chrono::{Local, NaiveDateTime};
use rand::{RngExt, rng};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::{DisplayFromStr, PickFirst, serde_as};

use crate::fields::{Amount, FieldMap};
use crate::timestamp::parse_gateway_datetime;

/// Generates a merchant order id from the current local time and two
/// random numbers: `YYYYMMDD-NNNN-HHMMSS-NNNN`.
///
/// Uniqueness is probabilistic. The gateway reports a duplicate as a
/// parameter error.
#[must_use]
pub fn generate_order_id() -> String {
    let now = Local::now();
    let mut rng = rng();
    let first: u16 = rng.random_range(0..=9999);
    let second: u16 = rng.random_range(0..=9999);
    format!(
        "{}-{first:04}-{}-{second:04}",
        now.format("%Y%m%d"),
        now.format("%H%M%S"),
    )
}

/// Parameters of an invoice to create.
///
/// # Example
///
/// ```rust
/// use lava::InvoiceRequest;
///
/// let request = InvoiceRequest::new(30u32, "4d499d82-2b99-4a7e-be26-5742c41e69e7")
///     .with_order_id("6555215")
///     .with_expire(120)
///     .with_comment("Order #6555215");
///
/// let fields = request.to_fields();
/// assert_eq!(fields["orderId"], "6555215");
/// assert!(!fields.contains_key("hookUrl"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceRequest {
    /// Invoice sum.
    pub amount: Amount,
    /// Shop the invoice is issued on behalf of.
    pub shop_id: String,
    /// Merchant order id. Generated with [`generate_order_id`] when unset.
    pub order_id: Option<String>,
    /// Invoice lifetime in minutes.
    pub expire: Option<u32>,
    /// Opaque data echoed back in the payment webhook.
    pub custom_field: Option<String>,
    /// Comment shown to the payer.
    pub comment: Option<String>,
    /// URL the payment webhook is sent to.
    pub webhook_url: Option<String>,
    /// Redirect after a failed payment.
    pub fail_url: Option<String>,
    /// Redirect after a successful payment.
    pub success_url: Option<String>,
    /// Only these payment methods are offered.
    pub include_service: Option<Vec<String>>,
    /// These payment methods are hidden.
    pub exclude_service: Option<Vec<String>>,
}

impl InvoiceRequest {
    /// Creates a request with only the required members set.
    #[must_use]
    pub fn new(amount: impl Into<Amount>, shop_id: impl Into<String>) -> Self {
        Self {
            amount: amount.into(),
            shop_id: shop_id.into(),
            order_id: None,
            expire: None,
            custom_field: None,
            comment: None,
            webhook_url: None,
            fail_url: None,
            success_url: None,
            include_service: None,
            exclude_service: None,
        }
    }

    /// Sets the merchant order id.
    #[must_use]
    pub fn with_order_id(mut self, order_id: impl Into<String>) -> Self {
        self.order_id = Some(order_id.into());
        self
    }

    /// Sets the invoice lifetime in minutes.
    #[must_use]
    pub const fn with_expire(mut self, minutes: u32) -> Self {
        self.expire = Some(minutes);
        self
    }

    /// Sets the custom field echoed back in the webhook.
    #[must_use]
    pub fn with_custom_field(mut self, custom_field: impl Into<String>) -> Self {
        self.custom_field = Some(custom_field.into());
        self
    }

    /// Sets the payer-facing comment.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Sets the webhook URL.
    #[must_use]
    pub fn with_webhook_url(mut self, url: impl Into<String>) -> Self {
        self.webhook_url = Some(url.into());
        self
    }

    /// Sets the redirect URL for failed payments.
    #[must_use]
    pub fn with_fail_url(mut self, url: impl Into<String>) -> Self {
        self.fail_url = Some(url.into());
        self
    }

    /// Sets the redirect URL for successful payments.
    #[must_use]
    pub fn with_success_url(mut self, url: impl Into<String>) -> Self {
        self.success_url = Some(url.into());
        self
    }

    /// Restricts the payment methods offered.
    #[must_use]
    pub fn with_include_service<I, S>(mut self, services: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include_service = Some(services.into_iter().map(Into::into).collect());
        self
    }

    /// Hides payment methods.
    #[must_use]
    pub fn with_exclude_service<I, S>(mut self, services: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_service = Some(services.into_iter().map(Into::into).collect());
        self
    }

    /// Builds the unsigned wire fields for this request.
    ///
    /// When no order id was set a fresh one is generated on every call.
    #[must_use]
    pub fn to_fields(&self) -> FieldMap {
        let order_id = self.order_id.clone().unwrap_or_else(generate_order_id);

        let mut fields = FieldMap::new();
        fields.insert("orderId".to_owned(), Value::String(order_id));
        fields.insert("shopId".to_owned(), Value::String(self.shop_id.clone()));
        fields.insert("sum".to_owned(), self.amount.clone().into());

        put(&mut fields, "customFields", self.custom_field.as_deref());
        put(&mut fields, "comment", self.comment.as_deref());
        put(&mut fields, "hookUrl", self.webhook_url.as_deref());
        put(&mut fields, "failUrl", self.fail_url.as_deref());
        put(&mut fields, "successUrl", self.success_url.as_deref());
        put(&mut fields, "expire", self.expire);
        put(&mut fields, "includeService", self.include_service.clone());
        put(&mut fields, "excludeService", self.exclude_service.clone());
        fields
    }
}

fn put<T: Into<Value>>(fields: &mut FieldMap, key: &str, value: Option<T>) {
    if let Some(value) = value {
        fields.insert(key.to_owned(), value.into());
    }
}

/// A created invoice, as reported by the gateway.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceInfo {
    /// Gateway invoice id.
    pub invoice_id: String,
    /// Invoice sum.
    pub amount: f64,
    /// Time until which the invoice can be paid, as sent by the gateway.
    pub expired: String,
    /// Numeric invoice status.
    pub status: i64,
    /// Shop the invoice was issued on behalf of.
    pub shop_id: String,
    /// Merchant display name.
    pub merchant_name: String,
    /// Payment page URL.
    pub url: String,
    /// Invoice comment.
    pub comment: String,
    /// Payment methods offered.
    pub include_service: Vec<String>,
    /// Payment methods hidden.
    pub exclude_service: Vec<String>,
}

impl InvoiceInfo {
    /// Parses [`InvoiceInfo::expired`] as a local date-time.
    #[must_use]
    pub fn expires_at(&self) -> Option<NaiveDateTime> {
        parse_gateway_datetime(&self.expired)
    }
}

/// Wire form of the `data` object in a successful creation response.
#[serde_as]
#[derive(Debug, Deserialize)]
pub(crate) struct InvoiceData {
    id: String,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    amount: f64,
    expired: String,
    status: i64,
    shop_id: String,
    #[serde(rename = "merchantName", default)]
    merchant_name: Option<String>,
    url: String,
    #[serde(default)]
    comment: Option<String>,
    #[serde(default)]
    include_service: Option<Vec<String>>,
    #[serde(default)]
    exclude_service: Option<Vec<String>>,
}

impl From<InvoiceData> for InvoiceInfo {
    fn from(data: InvoiceData) -> Self {
        Self {
            invoice_id: data.id,
            amount: data.amount,
            expired: data.expired,
            status: data.status,
            shop_id: data.shop_id,
            merchant_name: data.merchant_name.unwrap_or_else(|| "Merchant".to_owned()),
            url: data.url,
            comment: data.comment.unwrap_or_else(|| "Comment".to_owned()),
            include_service: data.include_service.unwrap_or_default(),
            exclude_service: data.exclude_service.unwrap_or_default(),
        }
    }
}
