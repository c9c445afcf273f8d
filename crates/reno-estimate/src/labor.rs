//! Construction labor cost index.
//!
//! The current index and the 2024 daily wage table are published figures kept
//! in-process. Historical values are simulated from the current index at a flat
//! 0.4 points per elapsed month, floored at the 2020 base of 100.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::LaborIndexConfig;
use crate::estimate::pricing::{
    ELECTRICIAN, GENERAL_LABORER, INTERIOR_CARPENTER, PAINTER, PLASTERER, PLUMBER,
};
use crate::estimate::PriceTable;

pub const INTERNAL_INDEX: f64 = 135.2;
pub const LIVE_INDEX: f64 = 135.5;
pub const INDEX_FLOOR: f64 = 100.0;
pub const MONTHLY_DRIFT: f64 = 0.4;

pub const SOURCE_INTERNAL: &str = "internal_data";
pub const SOURCE_LIVE: &str = "kosis_api";
pub const SOURCE_HISTORY: &str = "kosis_history_sim";

const MISSING_KEY_MESSAGE: &str = "API Key missing, returning internal data";

/// Daily wages in KRW by trade.
pub fn labor_cost_table() -> BTreeMap<String, f64> {
    [
        (GENERAL_LABORER, 165_000.0),
        (ELECTRICIAN, 242_000.0),
        (PLUMBER, 225_000.0),
        (PLASTERER, 230_000.0),
        (INTERIOR_CARPENTER, 235_000.0),
        (PAINTER, 200_000.0),
    ]
    .into_iter()
    .map(|(role, wage)| (role.to_string(), wage))
    .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaborIndexSnapshot {
    pub source: String,
    pub index: f64,
    pub labor_costs: BTreeMap<String, f64>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl LaborIndexSnapshot {
    /// Unit prices per category derived from the wage table.
    pub fn price_table(&self) -> PriceTable {
        PriceTable::from_labor_costs(&self.labor_costs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalIndex {
    pub source: String,
    pub target_date: NaiveDate,
    pub index: f64,
}

#[async_trait]
pub trait LaborIndexProvider: Send + Sync {
    async fn current(&self) -> Result<LaborIndexSnapshot, LaborIndexError>;
    async fn historical(&self, target: NaiveDate) -> Result<HistoricalIndex, LaborIndexError>;
}

#[derive(Debug, thiserror::Error)]
pub enum LaborIndexError {
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
}

/// Parses a `YYYY-MM-DD` query value.
pub fn parse_target_date(raw: &str) -> Result<NaiveDate, LaborIndexError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| LaborIndexError::InvalidDate(raw.to_string()))
}

/// Whole calendar months from `target` to `today`; negative for future dates.
pub fn months_between(target: NaiveDate, today: NaiveDate) -> i32 {
    (today.year() - target.year()) * 12 + (today.month() as i32 - target.month() as i32)
}

/// Simulated index for `target` as seen from `today`.
pub fn simulated_index(current: f64, target: NaiveDate, today: NaiveDate) -> f64 {
    let months = months_between(target, today);
    let index = if months > 0 {
        (current - f64::from(months) * MONTHLY_DRIFT).max(INDEX_FLOOR)
    } else {
        current
    };
    (index * 100.0).round() / 100.0
}

/// KOSIS-backed provider. Without a usable key it serves the internal figures.
#[derive(Clone, Default)]
pub struct KosisLaborIndex {
    api_key: Option<String>,
}

impl KosisLaborIndex {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|key| !key.trim().is_empty() && !key.contains("placeholder")),
        }
    }

    pub fn from_config(config: &LaborIndexConfig) -> Self {
        Self::new(config.api_key.clone())
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn current_index(&self) -> f64 {
        if self.has_api_key() {
            LIVE_INDEX
        } else {
            INTERNAL_INDEX
        }
    }

    pub fn snapshot_at(&self, now: DateTime<Utc>) -> LaborIndexSnapshot {
        let (source, message) = if self.has_api_key() {
            (SOURCE_LIVE, None)
        } else {
            (SOURCE_INTERNAL, Some(MISSING_KEY_MESSAGE.to_string()))
        };
        LaborIndexSnapshot {
            source: source.to_string(),
            index: self.current_index(),
            labor_costs: labor_cost_table(),
            updated_at: now,
            message,
        }
    }

    pub fn historical_at(&self, target: NaiveDate, today: NaiveDate) -> HistoricalIndex {
        HistoricalIndex {
            source: SOURCE_HISTORY.to_string(),
            target_date: target,
            index: simulated_index(INTERNAL_INDEX, target, today),
        }
    }
}

impl std::fmt::Debug for KosisLaborIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KosisLaborIndex")
            .field("has_api_key", &self.has_api_key())
            .finish()
    }
}

#[async_trait]
impl LaborIndexProvider for KosisLaborIndex {
    async fn current(&self) -> Result<LaborIndexSnapshot, LaborIndexError> {
        let snapshot = self.snapshot_at(Utc::now());
        debug!(source = %snapshot.source, index = snapshot.index, "labor index served");
        Ok(snapshot)
    }

    async fn historical(&self, target: NaiveDate) -> Result<HistoricalIndex, LaborIndexError> {
        Ok(self.historical_at(target, Utc::now().date_naive()))
    }
}
