//! Audit actions, actor projection and detail sanitisation.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use pondok_core::AppError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::ResolvedIdentity;

/// Message stored when a detail payload cannot be kept.
pub const DETAIL_PLACEHOLDER_MESSAGE: &str = "detail too complex to store";

/// Deepest nesting kept in audit details.
pub const MAX_DETAIL_DEPTH: usize = 32;

/// Largest serialized detail payload kept, in bytes.
pub const MAX_DETAIL_BYTES: usize = 64 * 1024;

const INTERNAL_KEY_PREFIXES: &[&str] = &["__", "$$"];

/// Record id stored when the caller did not supply one.
pub const MISSING_RECORD_ID: &str = "-";

/// Actions captured in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    /// A record was created.
    Create,
    /// A record was updated.
    Update,
    /// A record was deleted.
    Delete,
    /// A user signed in.
    Login,
    /// Data left the system through an export.
    Export,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Login => "LOGIN",
            Self::Export => "EXPORT",
        }
    }
}

impl Display for AuditAction {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "CREATE" => Ok(Self::Create),
            "UPDATE" => Ok(Self::Update),
            "DELETE" => Ok(Self::Delete),
            "LOGIN" => Ok(Self::Login),
            "EXPORT" => Ok(Self::Export),
            _ => Err(AppError::Validation(format!(
                "unknown audit action value '{value}'"
            ))),
        }
    }
}

/// Narrow view of the acting identity stored with each audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditActor {
    /// Account id as text.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Role storage value.
    pub role: String,
}

impl From<&ResolvedIdentity> for AuditActor {
    fn from(identity: &ResolvedIdentity) -> Self {
        Self {
            id: identity.id().to_string(),
            name: identity.name().to_owned(),
            role: identity.role().as_str().to_owned(),
        }
    }
}

/// Returns the fixed detail object stored in place of an unusable payload.
#[must_use]
pub fn detail_placeholder() -> Value {
    json!({ "error": DETAIL_PLACEHOLDER_MESSAGE })
}

/// Serializes any value into sanitized audit details.
///
/// Values that fail to serialize become the placeholder.
#[must_use]
pub fn details_from<T: Serialize + ?Sized>(value: &T) -> Value {
    match serde_json::to_value(value) {
        Ok(value) => sanitize_details(&value),
        Err(_) => detail_placeholder(),
    }
}

/// Strips framework internals and UI handles from a detail payload.
///
/// Object members that are dropped disappear; dropped array elements become
/// `null`. Payloads nested too deeply or too large become the placeholder.
#[must_use]
pub fn sanitize_details(details: &Value) -> Value {
    let sanitized = match strip_value(details, 0) {
        Ok(Some(value)) => value,
        Ok(None) | Err(TooComplex) => return detail_placeholder(),
    };

    match serde_json::to_vec(&sanitized) {
        Ok(bytes) if bytes.len() <= MAX_DETAIL_BYTES => sanitized,
        _ => detail_placeholder(),
    }
}

struct TooComplex;

fn strip_value(value: &Value, depth: usize) -> Result<Option<Value>, TooComplex> {
    if depth > MAX_DETAIL_DEPTH {
        return Err(TooComplex);
    }

    match value {
        Value::Object(map) => {
            if is_component_descriptor(map) || is_element_handle(map) {
                return Ok(None);
            }

            let mut stripped = Map::with_capacity(map.len());
            for (key, child) in map {
                if is_internal_key(key) {
                    continue;
                }
                if let Some(child) = strip_value(child, depth + 1)? {
                    stripped.insert(key.clone(), child);
                }
            }
            Ok(Some(Value::Object(stripped)))
        }
        Value::Array(items) => {
            let mut stripped = Vec::with_capacity(items.len());
            for item in items {
                stripped.push(strip_value(item, depth + 1)?.unwrap_or(Value::Null));
            }
            Ok(Some(Value::Array(stripped)))
        }
        scalar => Ok(Some(scalar.clone())),
    }
}

fn is_internal_key(key: &str) -> bool {
    INTERNAL_KEY_PREFIXES
        .iter()
        .any(|prefix| key.starts_with(prefix))
}

fn is_component_descriptor(map: &Map<String, Value>) -> bool {
    map.contains_key("$$typeof") || (map.contains_key("props") && map.contains_key("_owner"))
}

fn is_element_handle(map: &Map<String, Value>) -> bool {
    map.get("nodeType").is_some_and(Value::is_number)
        && map.get("nodeName").is_some_and(Value::is_string)
}
