//! Wire sentinels.
//!
//! A wire value is plain JSON-shaped data except for *tagged objects*:
//! maps whose [`SIG_KEY`] entry names what the object really is. The
//! constants here are shared with every other SDK and with the engine —
//! they are part of the wire protocol and must match byte for byte.
//!
//! | Signature | Meaning | Payload |
//! |-----------|---------|---------|
//! | [`ASSET_SIG`] | asset | one of `path`, `text`, `uri` |
//! | [`ARCHIVE_SIG`] | archive | one of `assets`, `path`, `uri` |
//! | [`SECRET_SIG`] | secret | `value` |
//! | [`RESOURCE_SIG`] | resource reference | `urn`, optional `id`, optional `packageVersion` |
//! | [`OUTPUT_VALUE_SIG`] | output value | optional `value`, `secret`, `dependencies` |
//!
//! The key cannot collide with user data: it is a random 128-bit value,
//! reserved by the protocol.

use serde_json::{Map, Value};

/// The reserved object key whose value names a tagged object's kind.
pub const SIG_KEY: &str = "4dabf18193072939515e22adb298388d";

/// Signature of an asset envelope.
pub const ASSET_SIG: &str = "c44067f5952c0a294b673a41bacd8c17";

/// Signature of an archive envelope.
pub const ARCHIVE_SIG: &str = "0def7320c3a5731c473e5ecbe6d01bc7";

/// Signature of a secret envelope.
pub const SECRET_SIG: &str = "1b47061264138c4ac30d75fd1eb44270";

/// Signature of a resource reference.
pub const RESOURCE_SIG: &str = "5cf8f73096256a8f31e491e813e4eb8e";

/// Signature of an output value.
pub const OUTPUT_VALUE_SIG: &str = "d0e6a833031e9bbcd3f4e8bde6ca49a4";

/// The wire stand-in for a value that will only be computed at apply
/// time.
pub const UNKNOWN_VALUE: &str = "04da6b54-80e4-46f7-96ec-b56ff0331ba9";

/// The signature of a tagged wire object, if it is one.
#[must_use]
pub fn signature_of(value: &Value) -> Option<&str> {
    value.as_object()?.get(SIG_KEY)?.as_str()
}

/// Returns `true` if the wire value is a secret envelope.
#[must_use]
pub fn is_secret_envelope(value: &Value) -> bool {
    signature_of(value) == Some(SECRET_SIG)
}

/// The payload of a secret envelope, if the wire value is one.
#[must_use]
pub fn unwrap_secret_envelope(value: &Value) -> Option<&Value> {
    if is_secret_envelope(value) {
        value.as_object()?.get("value")
    } else {
        None
    }
}

/// Wraps a wire value in a secret envelope.
#[must_use]
pub fn secret_envelope(value: Value) -> Value {
    let mut object = Map::new();
    object.insert(SIG_KEY.to_string(), Value::String(SECRET_SIG.to_string()));
    object.insert("value".to_string(), value);
    Value::Object(object)
}

/// Returns `true` if the wire value is the unknown marker.
#[must_use]
pub fn is_unknown_marker(value: &Value) -> bool {
    value.as_str() == Some(UNKNOWN_VALUE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn constants_match_the_protocol() {
        // Interop depends on these exact bytes.
        assert_eq!(SIG_KEY, "4dabf18193072939515e22adb298388d");
        assert_eq!(ASSET_SIG, "c44067f5952c0a294b673a41bacd8c17");
        assert_eq!(ARCHIVE_SIG, "0def7320c3a5731c473e5ecbe6d01bc7");
        assert_eq!(SECRET_SIG, "1b47061264138c4ac30d75fd1eb44270");
        assert_eq!(RESOURCE_SIG, "5cf8f73096256a8f31e491e813e4eb8e");
        assert_eq!(OUTPUT_VALUE_SIG, "d0e6a833031e9bbcd3f4e8bde6ca49a4");
        assert_eq!(UNKNOWN_VALUE, "04da6b54-80e4-46f7-96ec-b56ff0331ba9");
    }

    #[test]
    fn secret_envelopes_round_trip() {
        let envelope = secret_envelope(json!("hunter2"));
        assert!(is_secret_envelope(&envelope));
        assert_eq!(signature_of(&envelope), Some(SECRET_SIG));
        assert_eq!(unwrap_secret_envelope(&envelope), Some(&json!("hunter2")));
    }

    #[test]
    fn plain_values_are_not_envelopes() {
        assert!(!is_secret_envelope(&json!({"value": "x"})));
        assert_eq!(signature_of(&json!(["a"])), None);
        assert_eq!(unwrap_secret_envelope(&json!("x")), None);
    }

    #[test]
    fn unknown_marker_detection() {
        assert!(is_unknown_marker(&json!(UNKNOWN_VALUE)));
        assert!(!is_unknown_marker(&json!("some-string")));
    }
}
