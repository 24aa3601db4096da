//! Payload flattening
//!
//! Raw payloads nest device info, screen info, and SIM/network info one
//! level deep. Flattening moves every nested sub-object into the flat
//! namespace with fixed prefix-stripping and renaming rules. A payload that
//! still contains an object value afterwards has a shape this pipeline has
//! never seen; it is rejected rather than silently mishandled, so the rule
//! set gets extended deliberately.

use crate::app::models::RejectReason;
use crate::constants::{DEVICEINFO_PREFIX, fields};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Renames applied to the `screen` sub-object instead of dotted keys
const SCREEN_FIELD_RENAMES: &[(&str, &str)] = &[
    ("width", fields::SCREEN_WIDTH),
    ("height", fields::SCREEN_HEIGHT),
    ("devicePixelRatio", fields::DEVICE_PIXEL_RATIO),
];

/// Flatten a payload object into a single-level field map.
///
/// Rules, in order:
/// - a literal `deviceinfo.` key prefix is stripped
/// - the `screen` sub-object maps onto `screenWidth`/`screenHeight`/
///   `devicePixelRatio`
/// - any other sub-object flattens to dotted `parent.child` keys
/// - null values are dropped (missing and null are the same thing here)
///
/// Any object value remaining after one flattening pass is a rejection:
/// payloads are never more than one level deep.
pub fn flatten_payload(
    payload: Map<String, Value>,
) -> std::result::Result<BTreeMap<String, Value>, RejectReason> {
    let mut flat = BTreeMap::new();

    for (key, value) in payload {
        let key = key
            .strip_prefix(DEVICEINFO_PREFIX)
            .map(String::from)
            .unwrap_or(key);

        match value {
            Value::Object(screen) if key == "screen" => {
                for (sub_key, sub_value) in screen {
                    let renamed = SCREEN_FIELD_RENAMES
                        .iter()
                        .find(|(from, _)| *from == sub_key)
                        .map(|(_, to)| to.to_string())
                        .unwrap_or_else(|| format!("{}.{}", key, sub_key));
                    flat.insert(renamed, sub_value);
                }
            }
            Value::Object(nested) => {
                for (sub_key, sub_value) in nested {
                    flat.insert(format!("{}.{}", key, sub_key), sub_value);
                }
            }
            other => {
                flat.insert(key, other);
            }
        }
    }

    if flat.values().any(Value::is_object) {
        return Err(RejectReason::ResidualNesting);
    }

    flat.retain(|_, value| !value.is_null());

    Ok(flat)
}
