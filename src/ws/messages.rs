//! Parsing of incoming client updates.
//!
//! Updates are parsed field by field from a raw JSON object rather than
//! deserialized in one go, so a single badly-typed field is rejected on its
//! own while the remaining fields still apply.

use serde_json::{Map, Value};

use crate::domain::PoseUpdate;
use crate::error::UpdateError;

/// Result of parsing an update frame.
#[derive(Debug)]
pub struct ParsedUpdate<T> {
    /// The accepted part of the update.
    pub update: T,
    /// Fields that were present but rejected.
    pub rejected: Vec<UpdateError>,
}

/// Parses a pose update frame. Any subset of `x`, `y`, `angle` may be
/// present; each must be a finite number.
///
/// # Errors
///
/// Returns [`UpdateError::Malformed`] for invalid JSON and
/// [`UpdateError::NotAnObject`] for any other JSON value.
pub fn parse_pose_update(text: &str) -> Result<ParsedUpdate<PoseUpdate>, UpdateError> {
    let object = parse_object(text)?;
    let mut rejected = Vec::new();

    let update = PoseUpdate {
        x: number_field(&object, "x", &mut rejected),
        y: number_field(&object, "y", &mut rejected),
        angle: number_field(&object, "angle", &mut rejected),
    };

    Ok(ParsedUpdate { update, rejected })
}

/// Parses a paused update frame. `paused` must be a boolean; `None` means
/// the field was absent or rejected.
///
/// # Errors
///
/// Returns [`UpdateError::Malformed`] for invalid JSON and
/// [`UpdateError::NotAnObject`] for any other JSON value.
pub fn parse_paused_update(text: &str) -> Result<ParsedUpdate<Option<bool>>, UpdateError> {
    let object = parse_object(text)?;
    let mut rejected = Vec::new();

    let update = match object.get("paused") {
        None => None,
        Some(Value::Bool(paused)) => Some(*paused),
        Some(_) => {
            rejected.push(UpdateError::InvalidField {
                field: "paused",
                expected: "a boolean",
            });
            None
        }
    };

    Ok(ParsedUpdate { update, rejected })
}

fn parse_object(text: &str) -> Result<Map<String, Value>, UpdateError> {
    match serde_json::from_str::<Value>(text)? {
        Value::Object(object) => Ok(object),
        _ => Err(UpdateError::NotAnObject),
    }
}

fn number_field(
    object: &Map<String, Value>,
    field: &'static str,
    rejected: &mut Vec<UpdateError>,
) -> Option<f64> {
    let value = object.get(field)?;
    match value.as_f64() {
        Some(number) if number.is_finite() => Some(number),
        _ => {
            rejected.push(UpdateError::InvalidField {
                field,
                expected: "a finite number",
            });
            None
        }
    }
}
