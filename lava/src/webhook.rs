//! Payment webhook verification and parsing.
//!
//! The gateway notifies the merchant of payment status changes with a JSON
//! POST whose `Authorization` header carries the signature of the body.
//! [`handle_webhook`] recomputes that signature with the merchant key and
//! only then reads the body.
//!
//! Receiving the HTTP request is the caller's job; this module only needs
//! the decoded body and the request headers.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::{DisplayFromStr, PickFirst, serde_as};

use crate::error::GatewayError;
use crate::fields::FieldMap;
use crate::signature::Signer;
use crate::timestamp::parse_pay_time;

/// Header carrying the webhook signature (matched case-insensitively).
pub const AUTHORIZATION_HEADER: &str = "authorization";

/// Invoice status reported for a completed payment.
pub const STATUS_SUCCESS: &str = "success";

/// Invoice state reported by a verified payment webhook.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuccessfulInvoiceInfo {
    /// Gateway invoice id.
    pub invoice_id: String,
    /// Merchant order id (empty if the gateway sent none).
    pub order_id: String,
    /// Raw invoice status.
    pub status: String,
    /// Whether `status` is [`STATUS_SUCCESS`].
    pub payed: bool,
    /// Payment time, or the time the webhook was processed if the gateway
    /// sent none.
    pub pay_time: NaiveDateTime,
    /// Invoice sum.
    pub amount: f64,
    /// Sum credited to the shop, net of the gateway fee.
    pub credited: f64,
    /// Custom field set at invoice creation (empty if none).
    pub custom_field: String,
}

#[serde_as]
#[derive(Debug, Deserialize)]
struct WebhookData {
    invoice_id: String,
    #[serde(default)]
    order_id: Option<String>,
    status: String,
    #[serde(default)]
    payed: Option<Value>,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    amount: f64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    credited: f64,
    #[serde(default)]
    custom_field: Option<String>,
}

impl From<WebhookData> for SuccessfulInvoiceInfo {
    fn from(data: WebhookData) -> Self {
        let pay_time = parse_pay_time(data.payed.as_ref().and_then(Value::as_str));
        Self {
            invoice_id: data.invoice_id,
            order_id: data.order_id.unwrap_or_default(),
            payed: data.status == STATUS_SUCCESS,
            status: data.status,
            pay_time,
            amount: data.amount,
            credited: data.credited,
            custom_field: data.custom_field.unwrap_or_default(),
        }
    }
}

/// Verifies and parses a payment webhook.
///
/// `headers` are the request headers as name/value pairs. Names are
/// compared case-insensitively; if a name repeats, the last value wins.
///
/// # Errors
///
/// Returns [`GatewayError::WebhookSignature`] if the `Authorization`
/// header is missing or does not match the body, in which case the body is
/// not read at all. Returns [`GatewayError::ResponseFormat`] if a required
/// field is missing or has the wrong type.
pub fn handle_webhook<I, K, V>(
    signer: &Signer,
    body: &FieldMap,
    headers: I,
) -> Result<SuccessfulInvoiceInfo, GatewayError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let authorization = headers
        .into_iter()
        .filter(|(name, _)| name.as_ref().eq_ignore_ascii_case(AUTHORIZATION_HEADER))
        .last()
        .ok_or_else(|| reject_signature("no 'Authorization' header"))?;

    if !signer.verify(body, authorization.1.as_ref()) {
        return Err(reject_signature("server and client signatures don't match"));
    }

    let data: WebhookData = serde_json::from_value(Value::Object(body.clone())).map_err(|e| {
        let err = GatewayError::response_format(format!("invalid webhook body: {e}"));
        #[cfg(feature = "telemetry")]
        tracing::warn!(error = %err, "Rejected webhook body");
        err
    })?;

    Ok(data.into())
}

fn reject_signature(reason: &str) -> GatewayError {
    #[cfg(feature = "telemetry")]
    tracing::warn!(reason, "Rejected webhook signature");
    GatewayError::webhook_signature(reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Local, Timelike};
    use serde_json::json;

    const SECRET_KEY: &str = "9de2257f00f5a8ca54b71197cd3b465e7bdfc8b3";

    fn body(value: Value) -> FieldMap {
        match value {
            Value::Object(map) => map,
            other => panic!("expected an object, got {other}"),
        }
    }

    fn paid_body() -> FieldMap {
        body(json!({
            "invoice_id": "7ea82675-4ded-4133-95a7-a6efbaf165cc",
            "order_id": "20231010-0042-120000-1337",
            "status": "success",
            "pay_time": "2023-10-10 12:05:00",
            "payed": "2023-10-10 12:05:00",
            "amount": "100.00",
            "credited": "97.50",
            "custom_field": "user:42",
        }))
    }

    #[test]
    fn test_known_signature_is_accepted() {
        let signer = Signer::new(SECRET_KEY);
        let headers = [(
            "Authorization",
            "a854aaafef121bac93dfd42c717f28ceec290835872d8b8605e1c9ca8ae7c14d",
        )];

        let info = handle_webhook(&signer, &paid_body(), headers).unwrap();

        assert_eq!(info.invoice_id, "7ea82675-4ded-4133-95a7-a6efbaf165cc");
        assert_eq!(info.order_id, "20231010-0042-120000-1337");
        assert_eq!(info.status, "success");
        assert!(info.payed);
        assert_eq!(
            (info.pay_time.year(), info.pay_time.month(), info.pay_time.day()),
            (2023, 10, 10)
        );
        assert_eq!((info.pay_time.hour(), info.pay_time.minute()), (12, 5));
        assert!((info.amount - 100.0).abs() < f64::EPSILON);
        assert!((info.credited - 97.5).abs() < f64::EPSILON);
        assert_eq!(info.custom_field, "user:42");
    }

    #[test]
    fn test_info_serializes_pay_time() {
        let signer = Signer::new(SECRET_KEY);
        let body = paid_body();
        let signature = signer.sign(&body);

        let info = handle_webhook(&signer, &body, [("Authorization", signature)]).unwrap();
        let value = serde_json::to_value(&info).unwrap();

        assert_eq!(value["pay_time"], json!("2023-10-10T12:05:00"));
        assert_eq!(value["payed"], json!(true));
        assert_eq!(value["order_id"], json!("20231010-0042-120000-1337"));
    }

    #[test]
    fn test_header_name_is_case_insensitive() {
        let signer = Signer::new(SECRET_KEY);
        let body = paid_body();
        let signature = signer.sign(&body);

        for name in ["authorization", "AUTHORIZATION", "AuThOrIzAtIoN"] {
            let headers = vec![(name.to_owned(), signature.clone())];
            assert!(handle_webhook(&signer, &body, headers).is_ok());
        }
    }

    #[test]
    fn test_missing_header_is_rejected() {
        let signer = Signer::new(SECRET_KEY);
        let headers = [("Content-Type", "application/json")];

        let err = handle_webhook(&signer, &paid_body(), headers).unwrap_err();
        assert!(matches!(err, GatewayError::WebhookSignature(_)));
    }

    #[test]
    fn test_missing_header_rejected_before_reading_body() {
        let signer = Signer::new(SECRET_KEY);
        let headers: [(&str, &str); 0] = [];

        let err = handle_webhook(&signer, &FieldMap::new(), headers).unwrap_err();
        assert!(matches!(err, GatewayError::WebhookSignature(_)));
    }

    #[test]
    fn test_wrong_signature_is_rejected() {
        let signer = Signer::new(SECRET_KEY);
        let forged = Signer::new("attacker").sign(&paid_body());

        let err = handle_webhook(&signer, &paid_body(), [("Authorization", forged)]).unwrap_err();
        assert!(matches!(err, GatewayError::WebhookSignature(_)));
    }

    #[test]
    fn test_tampered_body_is_rejected() {
        let signer = Signer::new(SECRET_KEY);
        let signature = signer.sign(&paid_body());
        let mut tampered = paid_body();
        tampered.insert("amount".into(), json!("1000000.00"));

        let err = handle_webhook(&signer, &tampered, [("authorization", signature)]).unwrap_err();
        assert!(matches!(err, GatewayError::WebhookSignature(_)));
    }

    #[test]
    fn test_last_duplicate_header_wins() {
        let signer = Signer::new(SECRET_KEY);
        let body = paid_body();
        let headers = [
            ("Authorization".to_owned(), signer.sign(&body)),
            ("authorization".to_owned(), "stale".to_owned()),
        ];

        let err = handle_webhook(&signer, &body, headers).unwrap_err();
        assert!(matches!(err, GatewayError::WebhookSignature(_)));
    }

    #[test]
    fn test_other_status_is_not_payed() {
        let signer = Signer::new(SECRET_KEY);
        for status in ["error", "cancel", "Success", ""] {
            let mut body = paid_body();
            body.insert("status".into(), json!(status));
            let signature = signer.sign(&body);

            let info = handle_webhook(&signer, &body, [("Authorization", signature)]).unwrap();
            assert!(!info.payed, "status {status:?} should not be payed");
            assert_eq!(info.status, status);
        }
    }

    #[test]
    fn test_optional_fields_default() {
        let signer = Signer::new(SECRET_KEY);
        let body = body(json!({
            "invoice_id": "inv-1",
            "status": "success",
            "amount": 10,
            "credited": 9.7,
        }));
        let signature = signer.sign(&body);

        let before = Local::now().naive_local();
        let info = handle_webhook(&signer, &body, [("Authorization", signature)]).unwrap();

        assert_eq!(info.order_id, "");
        assert_eq!(info.custom_field, "");
        assert!(info.pay_time >= before);
        assert!((info.credited - 9.7).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unparseable_pay_time_defaults_to_now() {
        let signer = Signer::new(SECRET_KEY);
        let mut body = paid_body();
        body.insert("payed".into(), json!("10.10.2023"));
        let signature = signer.sign(&body);

        let before = Local::now().naive_local();
        let info = handle_webhook(&signer, &body, [("Authorization", signature)]).unwrap();
        assert!(info.pay_time >= before);
    }

    #[test]
    fn test_missing_required_field_is_format_error() {
        let signer = Signer::new(SECRET_KEY);
        for field in ["invoice_id", "status", "amount", "credited"] {
            let mut body = paid_body();
            body.remove(field);
            let signature = signer.sign(&body);

            let err = handle_webhook(&signer, &body, [("Authorization", signature)]).unwrap_err();
            assert!(
                matches!(err, GatewayError::ResponseFormat(_)),
                "missing {field} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_non_numeric_amount_is_format_error() {
        let signer = Signer::new(SECRET_KEY);
        let mut body = paid_body();
        body.insert("credited".into(), json!("ninety"));
        let signature = signer.sign(&body);

        let err = handle_webhook(&signer, &body, [("Authorization", signature)]).unwrap_err();
        assert!(matches!(err, GatewayError::ResponseFormat(_)));
    }
}
