//! Canonical request signing.
//!
//! The gateway authenticates both directions of traffic with the same
//! scheme: the field map is sorted by key, serialized to compact JSON, and
//! signed with HMAC-SHA256 keyed by the merchant secret. The gateway
//! recomputes the digest from its own serialization, so the bytes produced
//! by [`canonical_json`] must match the reference clients exactly:
//!
//! - keys in ascending byte order
//! - no whitespace after `:` or `,`
//! - every character outside printable ASCII escaped as `\uXXXX`
//!
//! ```rust
//! use lava::{FieldMap, canonical_json};
//! use serde_json::json;
//!
//! let mut fields = FieldMap::new();
//! fields.insert("sum".into(), json!(30));
//! fields.insert("orderId".into(), json!("6555215"));
//! assert_eq!(canonical_json(&fields), r#"{"orderId":"6555215","sum":30}"#);
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::io;

use hmac::{Hmac, Mac};
use serde::Serialize;
use serde_json::Value;
use serde_json::ser::Formatter;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::fields::FieldMap;

type HmacSha256 = Hmac<Sha256>;

/// Computes the signature of `fields` under `secret_key`.
///
/// Returns 64 lowercase hex characters. Pure and deterministic: the input
/// order of `fields` does not affect the result.
///
/// # Panics
///
/// Never in practice: HMAC accepts keys of any length.
#[must_use]
pub fn sign(fields: &FieldMap, secret_key: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret_key.as_bytes()).expect("HMAC can take key of any size");
    mac.update(canonical_json(fields).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Serializes `fields` into the exact byte form covered by the signature.
///
/// # Panics
///
/// Never in practice: serializing JSON values into memory cannot fail.
#[must_use]
pub fn canonical_json(fields: &FieldMap) -> String {
    let sorted: BTreeMap<&str, &Value> = fields.iter().map(|(k, v)| (k.as_str(), v)).collect();

    let mut buf = Vec::with_capacity(128);
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, AsciiFormatter);
    sorted
        .serialize(&mut serializer)
        .expect("serializing JSON values into memory cannot fail");

    String::from_utf8(buf).expect("canonical JSON is pure ASCII")
}

/// Holds the merchant secret key and signs field maps with it.
///
/// The key is read-only for the lifetime of the signer, so a single
/// instance can be shared freely between concurrent callers.
#[derive(Clone)]
pub struct Signer {
    secret_key: String,
}

impl Signer {
    /// Creates a signer for the given secret key.
    #[must_use]
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
        }
    }

    /// Signs `fields`. See [`sign`].
    #[must_use]
    pub fn sign(&self, fields: &FieldMap) -> String {
        sign(fields, &self.secret_key)
    }

    /// Checks `signature` against the signature of `fields`.
    ///
    /// The comparison is byte-for-byte on the hex string and runs in
    /// constant time.
    #[must_use]
    pub fn verify(&self, fields: &FieldMap, signature: &str) -> bool {
        let expected = self.sign(fields);
        expected.as_bytes().ct_eq(signature.as_bytes()).into()
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer").finish_non_exhaustive()
    }
}

/// Compact JSON formatter that escapes everything outside `0x20..=0x7E`.
///
/// `serde_json` already escapes quotes, backslashes and control
/// characters before handing string fragments to the formatter; the
/// remaining non-printable and non-ASCII characters are escaped here as
/// UTF-16 code units. Floats are written in the reference clients'
/// notation, see [`float_repr`].
#[derive(Debug, Clone, Copy)]
struct AsciiFormatter;

impl Formatter for AsciiFormatter {
    fn write_f64<W>(&mut self, writer: &mut W, value: f64) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(float_repr(value).as_bytes())
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let bytes = fragment.as_bytes();
        let mut start = 0;
        for (i, ch) in fragment.char_indices() {
            if (' '..='~').contains(&ch) {
                continue;
            }
            writer.write_all(&bytes[start..i])?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{unit:04x}")?;
            }
            start = i + ch.len_utf8();
        }
        writer.write_all(&bytes[start..])
    }
}

/// Formats a finite float with shortest round-trip digits, positionally
/// for decimal exponents in `-4..16` (always with a fractional part) and
/// in scientific notation otherwise, with a signed exponent of at least
/// two digits: `0.0001`, `1e-05`, `1000000000000000.0`, `1e+16`.
fn float_repr(value: f64) -> String {
    let scientific = format!("{:e}", value.abs());
    let (mantissa, exponent) = scientific
        .split_once('e')
        .unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    let shift = usize::try_from(exponent.unsigned_abs()).unwrap_or(0);
    let sign = if value.is_sign_negative() { "-" } else { "" };

    match exponent {
        0..16 => {
            let int_len = shift + 1;
            if digits.len() <= int_len {
                let zeros = "0".repeat(int_len - digits.len());
                format!("{sign}{digits}{zeros}.0")
            } else {
                let (int, frac) = digits.split_at(int_len);
                format!("{sign}{int}.{frac}")
            }
        }
        -4..0 => format!("{sign}0.{}{digits}", "0".repeat(shift - 1)),
        _ => {
            let (head, tail) = digits.split_at(1);
            let point = if tail.is_empty() { "" } else { "." };
            let exp_sign = if exponent < 0 { '-' } else { '+' };
            format!("{sign}{head}{point}{tail}e{exp_sign}{shift:02}")
        }
    }
}
