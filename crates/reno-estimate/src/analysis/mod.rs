//! Vision-model analysis of site photos.

mod gemini;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::estimate::{Category, RecommendationSet};

pub use gemini::{GeminiAnalyzer, DEFAULT_GEMINI_BASE, DEFAULT_GEMINI_MODEL};

/// Structured reading of one site photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteAnalysis {
    #[serde(default)]
    pub needs_demolition: bool,
    #[serde(default)]
    pub floor_condition: String,
    #[serde(default)]
    pub wall_condition: String,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub estimated_pyung: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expert_advice: Option<String>,
}

impl SiteAnalysis {
    /// Recommended labels resolved to categories. Unknown labels are dropped.
    pub fn recommended_categories(&self) -> RecommendationSet {
        RecommendationSet::from_labels(self.recommendations.iter())
    }

    /// Demolition is implied when the photo shows debris even if the list omits it.
    pub fn implies(&self, category: Category) -> bool {
        self.recommended_categories().contains(category)
            || (category == Category::Demolition && self.needs_demolition)
    }
}

#[async_trait]
pub trait SiteAnalyzer: Send + Sync {
    async fn analyze(&self, image_url: &str) -> Result<SiteAnalysis, AnalysisError>;

    /// Minimal round trip confirming the model answers.
    async fn check_connection(&self) -> Result<String, AnalysisError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("vision api key is missing")]
    MissingApiKey,
    #[error("image url is required")]
    MissingImageUrl,
    #[error("failed to fetch image: {0}")]
    ImageFetch(String),
    #[error("vision request failed: {0}")]
    Request(String),
    #[error("vision api error: {0}")]
    Upstream(String),
    #[error("vision response was not usable: {0}")]
    Malformed(String),
}

/// Removes Markdown code fences the model sometimes wraps JSON in.
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

/// Parses the model's text answer into a [`SiteAnalysis`].
pub fn parse_analysis(text: &str) -> Result<SiteAnalysis, AnalysisError> {
    let cleaned = strip_code_fences(text);
    serde_json::from_str(&cleaned).map_err(|err| AnalysisError::Malformed(err.to_string()))
}
