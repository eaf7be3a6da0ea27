#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! HTTP client for the Lava Business API.
//!
//! [`GatewayClient`] signs and sends invoice-creation requests and verifies
//! inbound payment webhooks. Protocol types and signing live in the `lava`
//! crate and are re-exported here for convenience.
//!
//! # Modules
//!
//! - [`client`] — The gateway client
//! - [`config`] — Serializable client configuration
//! - [`constants`] — Endpoint and header constants
//! - [`error`] — HTTP transport error types
//!
//! # Feature Flags
//!
//! - `telemetry` — Wraps gateway calls in `tracing` spans and logs failures

pub mod client;
pub mod config;
pub mod constants;
pub mod error;

pub use client::GatewayClient;
pub use config::GatewayConfig;
pub use error::ClientError;
pub use lava::{
    Amount, FieldMap, GatewayError, InvoiceInfo, InvoiceRequest, Signer, SuccessfulInvoiceInfo,
};
