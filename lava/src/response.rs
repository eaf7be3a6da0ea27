//! Classification of invoice-creation responses.
//!
//! The gateway reports the outcome in the JSON body rather than the HTTP
//! status line: a top-level `status` field selects between a `data` object
//! (success) and an `error` payload (failure).
//!
//! | `status` | Outcome                                              |
//! |----------|------------------------------------------------------|
//! | `200`    | [`InvoiceInfo`] from `data`                          |
//! | `422`    | [`GatewayError::Parameter`] if `error` is an object  |
//! | `401`    | [`GatewayError::Signature`]                          |
//! | other    | [`GatewayError::Creation`] (missing status is `0`)   |
//!
//! An integral float status such as `200.0` counts as its integer value. A
//! status sent as a string is always a [`GatewayError::Creation`] carrying
//! the parsed code.

use serde_json::Value;

use crate::error::GatewayError;
use crate::invoice::{InvoiceData, InvoiceInfo};

/// Gateway status for a created invoice.
pub const STATUS_OK: i64 = 200;

/// Gateway status for a request signed with the wrong key.
pub const STATUS_UNAUTHORIZED: i64 = 401;

/// Gateway status for rejected request fields.
pub const STATUS_INVALID_PARAMETERS: i64 = 422;

/// Parses and classifies a raw invoice-creation response body.
///
/// # Errors
///
/// Returns [`GatewayError::ResponseFormat`] if `body` is not valid JSON,
/// otherwise whatever [`classify_invoice_response`] returns.
pub fn parse_invoice_response(body: &[u8]) -> Result<InvoiceInfo, GatewayError> {
    let response: Value = serde_json::from_slice(body)
        .map_err(|e| reject(format!("response body is not valid JSON: {e}")))?;
    classify_invoice_response(&response)
}

/// Classifies a decoded invoice-creation response.
///
/// # Errors
///
/// Returns [`GatewayError::ResponseFormat`] when the response shape is
/// unexpected, and [`GatewayError::Parameter`], [`GatewayError::Signature`]
/// or [`GatewayError::Creation`] when the gateway reports a failure.
pub fn classify_invoice_response(response: &Value) -> Result<InvoiceInfo, GatewayError> {
    let Some(response) = response.as_object() else {
        return Err(reject("response is not a JSON object"));
    };

    let error = response.get("error").cloned();
    let status = match response.get("status") {
        Some(Value::Number(status)) => status
            .as_i64()
            .or_else(|| status.as_f64().and_then(integral))
            .unwrap_or(0),
        // A quoted status never selects an outcome, but its code is kept.
        Some(Value::String(status)) => {
            return Err(GatewayError::Creation {
                code: status.trim().parse().unwrap_or(0),
                message: error,
            });
        }
        _ => 0,
    };

    match status {
        STATUS_OK => {
            let data = response
                .get("data")
                .ok_or_else(|| reject("no 'data' field"))?;
            let data: InvoiceData = serde_json::from_value(data.clone())
                .map_err(|e| reject(format!("invalid 'data' field: {e}")))?;
            Ok(data.into())
        }
        STATUS_INVALID_PARAMETERS => match error {
            Some(Value::Object(errors)) => Err(GatewayError::Parameter {
                code: status,
                errors,
            }),
            other => Err(reject(format!(
                "invalid 'error' field: {}",
                other.unwrap_or(Value::Null)
            ))),
        },
        STATUS_UNAUTHORIZED => Err(GatewayError::Signature {
            code: status,
            message: error,
        }),
        _ => Err(GatewayError::Creation {
            code: status,
            message: error,
        }),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn integral(status: f64) -> Option<i64> {
    (status.fract() == 0.0 && status.abs() < 1e15).then_some(status as i64)
}

fn reject(reason: impl Into<String>) -> GatewayError {
    let err = GatewayError::response_format(reason);
    #[cfg(feature = "telemetry")]
    tracing::warn!(error = %err, "Rejected invoice response");
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn complete_data() -> Value {
        json!({
            "id": "7ea82675-4ded-4133-95a7-a6efbaf165cc",
            "amount": 30.0,
            "expired": "2023-10-10 14:05:00",
            "status": 1,
            "shop_id": "4d499d82-2b99-4a7e-be26-5742c41e69e7",
            "url": "https://pay.lava.ru/invoice/7ea82675-4ded-4133-95a7-a6efbaf165cc",
        })
    }

    #[test]
    fn test_success_applies_defaults() {
        let info = classify_invoice_response(&json!({
            "status": 200,
            "data": complete_data(),
        }))
        .unwrap();

        assert_eq!(info.invoice_id, "7ea82675-4ded-4133-95a7-a6efbaf165cc");
        assert_eq!(info.status, 1);
        assert_eq!(info.shop_id, "4d499d82-2b99-4a7e-be26-5742c41e69e7");
        assert_eq!(info.merchant_name, "Merchant");
        assert_eq!(info.comment, "Comment");
        assert!(info.include_service.is_empty());
        assert!(info.exclude_service.is_empty());
    }

    #[test]
    fn test_success_keeps_optional_fields() {
        let mut data = complete_data();
        data["merchantName"] = json!("Coffee Shop");
        data["comment"] = json!("Latte");
        data["include_service"] = json!(["card"]);
        data["exclude_service"] = json!(["qiwi"]);

        let info = classify_invoice_response(&json!({"status": 200, "data": data})).unwrap();

        assert_eq!(info.merchant_name, "Coffee Shop");
        assert_eq!(info.comment, "Latte");
        assert_eq!(info.include_service, vec!["card".to_owned()]);
        assert_eq!(info.exclude_service, vec!["qiwi".to_owned()]);
    }

    #[test]
    fn test_success_without_data_is_format_error() {
        let err = classify_invoice_response(&json!({"status": 200})).unwrap_err();
        assert!(matches!(err, GatewayError::ResponseFormat(_)));
    }

    #[test]
    fn test_success_with_missing_required_field_is_format_error() {
        for field in ["id", "amount", "expired", "status", "shop_id", "url"] {
            let mut data = complete_data();
            data.as_object_mut().unwrap().remove(field);
            let err = classify_invoice_response(&json!({"status": 200, "data": data})).unwrap_err();
            assert!(
                matches!(err, GatewayError::ResponseFormat(_)),
                "missing {field} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_invalid_parameters() {
        let err = classify_invoice_response(&json!({
            "status": 422,
            "error": {"orderId": "The order id has already been taken."},
        }))
        .unwrap_err();

        assert_eq!(err.code(), Some(422));
        assert_eq!(err.invalid_fields(), vec!["orderId"]);
        assert!(matches!(err, GatewayError::Parameter { code: 422, .. }));
    }

    #[test]
    fn test_invalid_parameters_with_string_error_is_format_error() {
        let err = classify_invoice_response(&json!({
            "status": 422,
            "error": "Validation failed",
        }))
        .unwrap_err();
        assert!(matches!(err, GatewayError::ResponseFormat(_)));
    }

    #[test]
    fn test_invalid_parameters_without_error_is_format_error() {
        let err = classify_invoice_response(&json!({"status": 422})).unwrap_err();
        assert!(matches!(err, GatewayError::ResponseFormat(_)));

        let err = classify_invoice_response(&json!({"status": 422, "error": null})).unwrap_err();
        assert!(matches!(err, GatewayError::ResponseFormat(_)));
    }

    #[test]
    fn test_integral_float_status_is_classified() {
        let info = classify_invoice_response(&json!({
            "status": 200.0,
            "data": complete_data(),
        }))
        .unwrap();
        assert_eq!(info.status, 1);

        let err = classify_invoice_response(&json!({"status": 401.0})).unwrap_err();
        assert!(matches!(err, GatewayError::Signature { code: 401, .. }));

        let err = classify_invoice_response(&json!({"status": 200.5})).unwrap_err();
        assert!(matches!(err, GatewayError::Creation { code: 0, .. }));
    }

    #[test]
    fn test_string_status_keeps_code() {
        let err = classify_invoice_response(&json!({"status": "500", "error": "x"})).unwrap_err();
        assert_eq!(
            err,
            GatewayError::Creation {
                code: 500,
                message: Some(json!("x")),
            }
        );

        let err = classify_invoice_response(&json!({
            "status": "200",
            "data": complete_data(),
        }))
        .unwrap_err();
        assert!(matches!(err, GatewayError::Creation { code: 200, .. }));

        let err = classify_invoice_response(&json!({"status": "n/a"})).unwrap_err();
        assert!(matches!(err, GatewayError::Creation { code: 0, .. }));
    }

    #[test]
    fn test_unauthorized() {
        let err = classify_invoice_response(&json!({
            "status": 401,
            "error": "Unauthenticated",
        }))
        .unwrap_err();

        assert_eq!(
            err,
            GatewayError::Signature {
                code: 401,
                message: Some(json!("Unauthenticated")),
            }
        );
    }

    #[test]
    fn test_other_status_is_creation_error() {
        let err = classify_invoice_response(&json!({"status": 500, "error": "Server error"}))
            .unwrap_err();
        assert!(matches!(err, GatewayError::Creation { code: 500, .. }));
    }

    #[test]
    fn test_missing_status_defaults_to_zero() {
        let err = classify_invoice_response(&json!({"data": complete_data()})).unwrap_err();
        assert_eq!(
            err,
            GatewayError::Creation {
                code: 0,
                message: None,
            }
        );
    }

    #[test]
    fn test_non_object_response_is_format_error() {
        let err = classify_invoice_response(&json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, GatewayError::ResponseFormat(_)));
    }

    #[test]
    fn test_malformed_body_is_format_error() {
        let err = parse_invoice_response(b"<html>502 Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, GatewayError::ResponseFormat(_)));
    }

    #[test]
    fn test_parse_body_bytes() {
        let body = serde_json::to_vec(&json!({"status": 200, "data": complete_data()})).unwrap();
        let info = parse_invoice_response(&body).unwrap();
        assert!((info.amount - 30.0).abs() < f64::EPSILON);
    }
}
