//! Parse-with-default step between raw editor input and [`Task`](super::Task) fields.
//!
//! Editors send whatever the user typed. Numeric fields never reject input:
//! anything that does not parse to a finite number becomes `0`, so the estimate
//! total stays well-defined.

use serde::Deserialize;
use serde_json::Value;

use super::domain::{Category, TaskUpdate};

/// Coerces free-text numeric input. Thousands separators and surrounding
/// whitespace are accepted; empty, non-numeric and non-finite input yield `0`.
pub fn coerce_number(raw: &str) -> f64 {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| *c != ',' && *c != '_')
        .collect();
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

/// Same as [`coerce_number`] but for JSON payloads, which may carry numbers,
/// strings, booleans or null for a numeric field.
pub fn coerce_json_number(value: &Value) -> f64 {
    match value {
        Value::Number(number) => number
            .as_f64()
            .filter(|value| value.is_finite())
            .unwrap_or(0.0),
        Value::String(raw) => coerce_number(raw),
        _ => 0.0,
    }
}

/// Base area input distinguishes "cleared" from zero: blank input unsets it.
pub fn coerce_base_area(value: &Value) -> Option<f64> {
    match value {
        Value::Null => None,
        Value::String(raw) if raw.trim().is_empty() => None,
        other => Some(coerce_json_number(other)),
    }
}

fn coerce_flag(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map(|n| n != 0.0).unwrap_or(false),
        Value::String(raw) => matches!(
            raw.trim().to_ascii_lowercase().as_str(),
            "true" | "1" | "on" | "yes"
        ),
        _ => false,
    }
}

fn coerce_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(raw) => raw.clone(),
        other => other.to_string(),
    }
}

/// Names of the editable task fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskField {
    #[serde(alias = "isChecked")]
    Included,
    Category,
    #[serde(alias = "item_name")]
    Name,
    Description,
    UnitPrice,
    #[serde(alias = "area")]
    Quantity,
}

/// An untyped field edit as it arrives from an editor.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTaskEdit {
    pub field: TaskField,
    #[serde(default)]
    pub value: Value,
}

impl RawTaskEdit {
    pub fn into_update(self) -> TaskUpdate {
        let RawTaskEdit { field, value } = self;
        match field {
            TaskField::Included => TaskUpdate::Included(coerce_flag(&value)),
            TaskField::Category => {
                TaskUpdate::Category(Category::from_label_or_other(&coerce_text(&value)))
            }
            TaskField::Name => TaskUpdate::Name(coerce_text(&value)),
            TaskField::Description => TaskUpdate::Description(coerce_text(&value)),
            TaskField::UnitPrice => TaskUpdate::UnitPrice(coerce_json_number(&value)),
            TaskField::Quantity => TaskUpdate::Quantity(coerce_json_number(&value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn malformed_numbers_become_zero() {
        assert_eq!(coerce_number(""), 0.0);
        assert_eq!(coerce_number("   "), 0.0);
        assert_eq!(coerce_number("abc"), 0.0);
        assert_eq!(coerce_number("NaN"), 0.0);
        assert_eq!(coerce_number("inf"), 0.0);
        assert_eq!(coerce_number("150,000"), 150000.0);
        assert_eq!(coerce_number(" 32.5 "), 32.5);
    }

    #[test]
    fn negative_numbers_are_kept_as_entered() {
        assert_eq!(coerce_number("-10"), -10.0);
        assert_eq!(coerce_json_number(&json!(-3)), -3.0);
    }

    #[test]
    fn json_numbers_accept_strings_and_reject_other_shapes() {
        assert_eq!(coerce_json_number(&json!("1200")), 1200.0);
        assert_eq!(coerce_json_number(&json!(null)), 0.0);
        assert_eq!(coerce_json_number(&json!(true)), 0.0);
        assert_eq!(coerce_json_number(&json!([1])), 0.0);
    }

    #[test]
    fn blank_base_area_unsets_it() {
        assert_eq!(coerce_base_area(&json!("")), None);
        assert_eq!(coerce_base_area(&json!(null)), None);
        assert_eq!(coerce_base_area(&json!("32")), Some(32.0));
        assert_eq!(coerce_base_area(&json!("x")), Some(0.0));
    }

    #[test]
    fn raw_edits_map_to_typed_updates() {
        let edit: RawTaskEdit =
            serde_json::from_value(json!({ "field": "area", "value": "" })).expect("parses");
        assert_eq!(edit.into_update(), TaskUpdate::Quantity(0.0));

        let edit: RawTaskEdit =
            serde_json::from_value(json!({ "field": "category", "value": "천장" }))
                .expect("parses");
        assert_eq!(edit.into_update(), TaskUpdate::Category(Category::Ceiling));

        let edit: RawTaskEdit =
            serde_json::from_value(json!({ "field": "isChecked", "value": false }))
                .expect("parses");
        assert_eq!(edit.into_update(), TaskUpdate::Included(false));

        let edit: RawTaskEdit =
            serde_json::from_value(json!({ "field": "category", "value": "욕실" }))
                .expect("parses");
        assert_eq!(edit.into_update(), TaskUpdate::Category(Category::Other));
    }
}
