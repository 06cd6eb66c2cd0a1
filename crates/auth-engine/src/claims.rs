//! Unverified JWT payload inspection.
//!
//! Signature verification belongs to the backend. The engine only reads
//! claims it needs locally: the Apple nonce binding and the user id in
//! backend-issued id tokens.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::{Map, Value};

/// Decode the payload segment of a compact JWT.
///
/// Returns `None` when the token is not three dot-separated segments or the
/// payload is not a base64url JSON object.
pub fn decode_payload(token: &str) -> Option<Map<String, Value>> {
    let mut segments = token.split('.');
    let (_header, payload, _signature) = (segments.next()?, segments.next()?, segments.next()?);
    if segments.next().is_some() {
        return None;
    }

    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    match serde_json::from_slice::<Value>(&bytes).ok()? {
        Value::Object(claims) => Some(claims),
        _ => None,
    }
}

/// A single string claim.
pub fn string_claim(token: &str, name: &str) -> Option<String> {
    decode_payload(token)?
        .get(name)
        .and_then(Value::as_str)
        .map(str::to_string)
}
