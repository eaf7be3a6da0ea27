#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types for the Lava Business API.
//!
//! This crate holds everything about the gateway protocol that does not
//! touch the network: the canonical HMAC-SHA256 signing scheme shared by
//! outbound requests and inbound webhooks, the invoice request and result
//! types, classification of invoice-creation responses, and webhook
//! verification. The HTTP transport lives in `lava-http`.
//!
//! # Modules
//!
//! - [`signature`] - Canonical JSON and HMAC-SHA256 signatures
//! - [`fields`] - Signed field maps and amounts
//! - [`invoice`] - Invoice requests, results and order-id generation
//! - [`response`] - Classification of invoice-creation responses
//! - [`webhook`] - Payment webhook verification and parsing
//! - [`timestamp`] - Gateway date-time parsing
//! - [`error`] - The gateway error taxonomy
//!
//! # Feature Flags
//!
//! - `telemetry` - Emits `tracing` events when a response or webhook is rejected

pub mod error;
pub mod fields;
pub mod invoice;
pub mod response;
pub mod signature;
pub mod timestamp;
pub mod webhook;

pub use error::GatewayError;
pub use fields::{Amount, FieldMap};
pub use invoice::{InvoiceInfo, InvoiceRequest, generate_order_id};
pub use response::{classify_invoice_response, parse_invoice_response};
pub use signature::{Signer, canonical_json, sign};
pub use webhook::{SuccessfulInvoiceInfo, handle_webhook};
