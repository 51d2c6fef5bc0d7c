//! Recipe record parse boundary
//!
//! The document store is schema-less; documents arrive as raw JSON with
//! missing, extra, or oddly typed fields. This module is the single place
//! where raw documents are mapped into the typed `RecipeRecord` shape:
//! defaults and rejections happen here, never downstream in view code.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// One ingredient line of a recipe
///
/// Order within the recipe is display-significant and preserved as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    /// Quantity for `base_portions` portions, always positive
    pub amount: f64,
    pub unit: String,
}

/// A recipe as delivered to the presentation layer
///
/// Externally owned: fetched from the store and never mutated by this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeRecord {
    /// Opaque unique identifier, stable across pages
    pub id: String,

    /// Display title
    pub title: String,

    /// Portion count the stored ingredient amounts are written for
    pub base_portions: u32,

    /// Ingredient lines in display order
    pub ingredients: Vec<Ingredient>,

    /// Author user id, when the document carries one
    pub author: Option<String>,

    /// Creation timestamp; the sole feed ordering and pagination cursor key
    pub created_at: DateTime<Utc>,
}

impl RecipeRecord {
    /// Map a raw document into a `RecipeRecord`
    ///
    /// Returns `None` for documents missing an id, title, or usable
    /// `createdAt`; callers log and skip those. Missing or non-positive
    /// `basePortions` defaults to 1. Malformed ingredient entries are
    /// dropped, keeping the order of the rest. Unknown fields are ignored.
    pub fn from_value(data: &JsonValue) -> Option<Self> {
        let id = data
            .get("id")
            .or_else(|| data.get("_id"))
            .and_then(json_id_string)?;

        let title = data.get("title").and_then(|v| v.as_str())?.to_string();
        if title.is_empty() {
            return None;
        }

        let created_at = data.get("createdAt").and_then(parse_timestamp)?;

        let base_portions = data
            .get("basePortions")
            .and_then(JsonValue::as_i64)
            .filter(|n| *n > 0)
            .map(|n| n as u32)
            .unwrap_or(1);

        let ingredients = data
            .get("ingredients")
            .and_then(|v| v.as_array())
            .map(|items| items.iter().filter_map(parse_ingredient).collect())
            .unwrap_or_default();

        let author = data
            .get("author")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());

        Some(Self {
            id,
            title,
            base_portions,
            ingredients,
            author,
            created_at,
        })
    }
}

/// Extract an id as a string, tolerating Mongo `_id` object forms
fn json_id_string(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) if !s.is_empty() => Some(s.clone()),
        // Extended JSON ObjectId: { "$oid": "..." }
        JsonValue::Object(map) => map
            .get("$oid")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parse one ingredient entry, rejecting malformed ones
fn parse_ingredient(value: &JsonValue) -> Option<Ingredient> {
    let name = value.get("name").and_then(|v| v.as_str())?.to_string();
    if name.is_empty() {
        return None;
    }

    let amount = value.get("amount").and_then(JsonValue::as_f64)?;
    if !(amount > 0.0) || !amount.is_finite() {
        return None;
    }

    let unit = value
        .get("unit")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();

    Some(Ingredient { name, amount, unit })
}

/// Parse a timestamp from the shapes the store is known to emit:
/// epoch milliseconds, RFC 3339 strings, or extended JSON `$date` wrappers.
pub(crate) fn parse_timestamp(value: &JsonValue) -> Option<DateTime<Utc>> {
    match value {
        JsonValue::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        JsonValue::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        // Relaxed extended JSON: { "$date": "..." } or
        // canonical: { "$date": { "$numberLong": "..." } }
        JsonValue::Object(map) => {
            let inner = map.get("$date")?;
            match inner {
                JsonValue::Object(canonical) => canonical
                    .get("$numberLong")
                    .and_then(|v| v.as_str())
                    .and_then(|s| s.parse::<i64>().ok())
                    .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
                other => parse_timestamp(other),
            }
        }
        _ => None,
    }
}
