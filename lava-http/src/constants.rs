//! HTTP-specific constants for the Lava Business API.

/// Default gateway base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.lava.ru/";

/// Invoice-creation endpoint, relative to the base URL.
pub const INVOICE_CREATE_PATH: &str = "business/invoice/create";

/// Field carrying the request signature in outbound bodies.
pub const SIGNATURE_FIELD: &str = "signature";

/// Media type the gateway expects in the `Accept` header.
pub const APPLICATION_JSON: &str = "application/json";
