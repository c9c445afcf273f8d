use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Square meters per pyung.
pub const PYUNG_TO_M2: f64 = 3.30578;

/// Trade categories shared by tasks and site photos. The list is closed.
///
/// Deserialization goes through [`Category::from_label_or_other`], so stored
/// rows written with older labels still load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Category {
    #[serde(rename = "설계")]
    Design,
    #[serde(rename = "가설 및 철거")]
    Demolition,
    #[serde(rename = "외관")]
    Facade,
    #[serde(rename = "바닥")]
    Flooring,
    #[serde(rename = "벽")]
    Wall,
    #[serde(rename = "천장")]
    Ceiling,
    #[serde(rename = "전기/통신")]
    ElectricalTelecom,
    #[serde(rename = "설비")]
    Plumbing,
    #[serde(rename = "소방")]
    FireSafety,
    #[serde(rename = "가구/집기")]
    Furniture,
    #[serde(rename = "기타")]
    Other,
}

impl Category {
    pub const fn ordered() -> [Self; 11] {
        [
            Self::Design,
            Self::Demolition,
            Self::Facade,
            Self::Flooring,
            Self::Wall,
            Self::Ceiling,
            Self::ElectricalTelecom,
            Self::Plumbing,
            Self::FireSafety,
            Self::Furniture,
            Self::Other,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Design => "설계",
            Self::Demolition => "가설 및 철거",
            Self::Facade => "외관",
            Self::Flooring => "바닥",
            Self::Wall => "벽",
            Self::Ceiling => "천장",
            Self::ElectricalTelecom => "전기/통신",
            Self::Plumbing => "설비",
            Self::FireSafety => "소방",
            Self::Furniture => "가구/집기",
            Self::Other => "기타",
        }
    }

    /// Quantity convention used when a task in this category is priced.
    pub const fn unit(self) -> QuantityUnit {
        match self {
            Self::Furniture => QuantityUnit::LumpSum,
            _ => QuantityUnit::Area,
        }
    }

    /// Resolves a display label, tolerating surrounding whitespace and a few
    /// shorthand spellings used by the analysis prompt and older sheets.
    pub fn from_label(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if let Some(category) = Self::ordered()
            .into_iter()
            .find(|category| category.label() == trimmed)
        {
            return Some(category);
        }

        match trimmed {
            "철거" | "가설/철거" | "철거/설비" => Some(Self::Demolition),
            "도배" => Some(Self::Wall),
            "파사드" => Some(Self::Facade),
            "전기" | "통신" | "전기/조명" => Some(Self::ElectricalTelecom),
            "가구" | "집기" => Some(Self::Furniture),
            _ => None,
        }
    }

    /// Boundary coercion for free-text category input: unknown labels land in 기타.
    pub fn from_label_or_other(raw: &str) -> Self {
        Self::from_label(raw).unwrap_or(Self::Other)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category '{0}'")]
pub struct UnknownCategory(pub String);

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from_label_or_other(&raw))
    }
}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::from_label(value).ok_or_else(|| UnknownCategory(value.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantityUnit {
    Area,
    LumpSum,
}

impl QuantityUnit {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Area => "평",
            Self::LumpSum => "식",
        }
    }
}

/// Identifier wrapper for estimate line items.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One estimate line item. Field names on the wire match the stored project blobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    #[serde(rename = "isChecked")]
    pub included: bool,
    pub category: Category,
    #[serde(rename = "item_name")]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub unit_price: f64,
    #[serde(rename = "area")]
    pub quantity: f64,
}

impl Task {
    pub fn line_total(&self) -> f64 {
        self.quantity * self.unit_price
    }

    /// Contribution to the estimate total; zero while excluded.
    pub fn included_total(&self) -> f64 {
        if self.included {
            self.line_total()
        } else {
            0.0
        }
    }
}

/// Field edits accepted by [`Estimate::update_task`](super::Estimate::update_task).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum TaskUpdate {
    Included(bool),
    Category(Category),
    Name(String),
    Description(String),
    UnitPrice(f64),
    Quantity(f64),
}

/// Reference to a stored site photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedImage {
    pub url: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}

pub fn pyung_to_m2(pyung: f64) -> f64 {
    (pyung * PYUNG_TO_M2 * 100.0).round() / 100.0
}

/// Formats a whole-won amount the way the ko-KR currency formatter does, e.g. `₩7,360,000`.
pub fn format_won(amount: f64) -> String {
    let rounded = if amount.is_finite() {
        amount.round() as i64
    } else {
        0
    };
    let digits = rounded.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    if rounded < 0 {
        format!("-₩{grouped}")
    } else {
        format!("₩{grouped}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_labels_round_trip_through_from_label() {
        for category in Category::ordered() {
            assert_eq!(Category::from_label(category.label()), Some(category));
        }
        assert_eq!(Category::from_label(" 바닥 "), Some(Category::Flooring));
        assert_eq!(Category::from_label("철거"), Some(Category::Demolition));
        assert_eq!(Category::from_label("욕실"), None);
        assert_eq!(Category::from_label_or_other("욕실"), Category::Other);
    }

    #[test]
    fn category_serializes_as_display_label() {
        let json = serde_json::to_string(&Category::ElectricalTelecom).expect("serializes");
        assert_eq!(json, "\"전기/통신\"");
        let parsed: Category = serde_json::from_str("\"가설 및 철거\"").expect("parses");
        assert_eq!(parsed, Category::Demolition);
    }

    #[test]
    fn stored_legacy_labels_deserialize_leniently() {
        let parsed: Vec<Category> =
            serde_json::from_str(r#"["철거/설비", "전기/조명", "도배", "목공", "욕실"]"#)
                .expect("legacy labels parse");
        assert_eq!(
            parsed,
            vec![
                Category::Demolition,
                Category::ElectricalTelecom,
                Category::Wall,
                Category::Other,
                Category::Other,
            ]
        );
    }

    #[test]
    fn task_uses_stored_blob_field_names() {
        let task = Task {
            id: TaskId("1".to_string()),
            included: true,
            category: Category::Flooring,
            name: "강마루 (전체)".to_string(),
            description: String::new(),
            unit_price: 110000.0,
            quantity: 32.0,
        };
        let value = serde_json::to_value(&task).expect("serializes");
        assert_eq!(value["isChecked"], serde_json::json!(true));
        assert_eq!(value["item_name"], serde_json::json!("강마루 (전체)"));
        assert_eq!(value["area"], serde_json::json!(32.0));
        assert_eq!(task.line_total(), 3_520_000.0);
    }

    #[test]
    fn task_update_is_tagged_by_field_name() {
        let update: TaskUpdate =
            serde_json::from_value(serde_json::json!({ "field": "unit_price", "value": 1200.0 }))
                .expect("parses");
        assert_eq!(update, TaskUpdate::UnitPrice(1200.0));
    }

    #[test]
    fn formats_won_with_grouping() {
        assert_eq!(format_won(7_360_000.0), "₩7,360,000");
        assert_eq!(format_won(0.0), "₩0");
        assert_eq!(format_won(999.6), "₩1,000");
        assert_eq!(format_won(-12_500.0), "-₩12,500");
        assert_eq!(format_won(f64::NAN), "₩0");
    }

    #[test]
    fn converts_pyung_to_square_meters() {
        assert_eq!(pyung_to_m2(32.0), 105.78);
        assert_eq!(pyung_to_m2(0.0), 0.0);
    }
}
