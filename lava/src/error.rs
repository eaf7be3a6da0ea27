//! Error types for the Lava Business API.
//!
//! Every failure the gateway can report, and every way a gateway message
//! can be malformed, maps to exactly one [`GatewayError`] variant. The
//! variants are siblings: a malformed response is never a creation error.

use serde_json::{Map, Value};

/// Errors raised while creating an invoice or handling a webhook.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GatewayError {
    /// The gateway response (or webhook body) does not have the expected
    /// shape: malformed JSON, a missing required field or a wrong type.
    #[error("Invalid gateway response: {0}")]
    ResponseFormat(String),

    /// The gateway rejected one or more request fields (status 422).
    #[error("Invalid parameters: {fields}; Code: {code}; Message: {message}", fields = join_keys(.errors), message = Value::Object(.errors.clone()))]
    Parameter {
        /// Status code reported by the gateway.
        code: i64,
        /// Field-level detail, keyed by the name of the rejected field.
        errors: Map<String, Value>,
    },

    /// The gateway could not authenticate the request signature (status 401).
    #[error("Invalid signature. Code: {code}; Message: {}", display_message(.message))]
    Signature {
        /// Status code reported by the gateway.
        code: i64,
        /// Raw `error` payload, if the gateway sent one.
        message: Option<Value>,
    },

    /// An inbound webhook carried no signature or a signature that does not
    /// match its body. The webhook must not be processed.
    #[error("Invalid webhook signature: {0}")]
    WebhookSignature(String),

    /// Any other gateway status.
    #[error("Unexpected error. Code: {code}; Message: {}", display_message(.message))]
    Creation {
        /// Status code reported by the gateway (`0` if it sent none).
        code: i64,
        /// Raw `error` payload, if the gateway sent one.
        message: Option<Value>,
    },
}

impl GatewayError {
    /// Creates a [`GatewayError::ResponseFormat`] error.
    #[must_use]
    pub fn response_format(reason: impl Into<String>) -> Self {
        Self::ResponseFormat(reason.into())
    }

    /// Creates a [`GatewayError::WebhookSignature`] error.
    #[must_use]
    pub fn webhook_signature(reason: impl Into<String>) -> Self {
        Self::WebhookSignature(reason.into())
    }

    /// Returns the status code reported by the gateway, if any.
    #[must_use]
    pub const fn code(&self) -> Option<i64> {
        match self {
            Self::Parameter { code, .. }
            | Self::Signature { code, .. }
            | Self::Creation { code, .. } => Some(*code),
            Self::ResponseFormat(_) | Self::WebhookSignature(_) => None,
        }
    }

    /// Returns the names of the fields rejected by the gateway.
    ///
    /// Empty for every variant other than [`GatewayError::Parameter`].
    #[must_use]
    pub fn invalid_fields(&self) -> Vec<&str> {
        match self {
            Self::Parameter { errors, .. } => errors.keys().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }
}

fn join_keys(errors: &Map<String, Value>) -> String {
    errors.keys().map(String::as_str).collect::<Vec<_>>().join(", ")
}

fn display_message(message: &Option<Value>) -> String {
    match message {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}
