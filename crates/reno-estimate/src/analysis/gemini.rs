use async_trait::async_trait;
use base64::Engine as _;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use super::{parse_analysis, AnalysisError, SiteAnalysis, SiteAnalyzer};
use crate::config::VisionConfig;

pub const DEFAULT_GEMINI_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

const ANALYSIS_PROMPT: &str = "\
Analyze this construction site photo for a renovation estimate.
Return ONLY a JSON object with the following fields:
- \"needs_demolition\": true/false (Is there debris, old structures, or things needing removal?)
- \"floor_condition\": string (Brief description)
- \"wall_condition\": string (Brief description)
- \"recommendations\": array of strings (List of recommended construction categories from: \"가설 및 철거\", \"바닥\", \"벽\", \"천장\", \"전기/통신\", \"설비\", \"소방\")
- \"estimated_pyung\": number (Rough estimate of the area in Pyung, if visible, else null)
- \"expert_advice\": string (Optional one-line note for the site manager)";

const CONNECTION_CHECK_PROMPT: &str = "Hello, confirm connection.";

/// Gemini `generateContent` client.
#[derive(Clone)]
pub struct GeminiAnalyzer {
    http: reqwest::Client,
    api_key: Option<String>,
    api_base: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    error: Option<UpstreamError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpstreamError {
    #[serde(default)]
    message: String,
}

impl GeminiAnalyzer {
    pub fn new(
        api_key: Option<String>,
        api_base: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let api_base: String = api_base.into();
        Self {
            http: reqwest::Client::new(),
            api_key,
            api_base: api_base.trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }

    pub fn from_config(config: &VisionConfig) -> Self {
        Self::new(
            config.api_key.clone(),
            config.api_base.clone(),
            config.model.clone(),
        )
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self, api_key: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.api_base, self.model, api_key
        )
    }

    fn api_key(&self) -> Result<&str, AnalysisError> {
        self.api_key
            .as_deref()
            .ok_or(AnalysisError::MissingApiKey)
    }

    async fn fetch_image(&self, image_url: &str) -> Result<(String, String), AnalysisError> {
        let response = self
            .http
            .get(image_url)
            .send()
            .await
            .map_err(|err| AnalysisError::ImageFetch(err.to_string()))?;
        if !response.status().is_success() {
            return Err(AnalysisError::ImageFetch(format!(
                "image host returned {}",
                response.status().as_u16()
            )));
        }

        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .filter(|value| value.starts_with("image/"))
            .unwrap_or("image/jpeg")
            .to_string();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| AnalysisError::ImageFetch(err.to_string()))?;

        Ok((mime_type, base64::engine::general_purpose::STANDARD.encode(&bytes)))
    }

    async fn generate(&self, body: serde_json::Value) -> Result<String, AnalysisError> {
        let api_key = self.api_key()?;
        let response = self
            .http
            .post(self.endpoint(api_key))
            .json(&body)
            .send()
            .await
            .map_err(|err| AnalysisError::Request(err.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| AnalysisError::Request(err.to_string()))?;
        let parsed: GenerateResponse = serde_json::from_slice(&bytes).map_err(|err| {
            if status.is_success() {
                AnalysisError::Malformed(err.to_string())
            } else {
                AnalysisError::Upstream(format!("status {}", status.as_u16()))
            }
        })?;

        if let Some(error) = parsed.error {
            warn!(status = status.as_u16(), message = %error.message, "vision api returned an error");
            let message = if error.message.is_empty() {
                "vision api failed".to_string()
            } else {
                error.message
            };
            return Err(AnalysisError::Upstream(message));
        }

        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .and_then(|content| content.parts.into_iter().next())
            .and_then(|part| part.text)
            .ok_or_else(|| AnalysisError::Malformed("response had no candidate text".to_string()))
    }
}

impl std::fmt::Debug for GeminiAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiAnalyzer")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("configured", &self.api_key.is_some())
            .finish()
    }
}

#[async_trait]
impl SiteAnalyzer for GeminiAnalyzer {
    async fn analyze(&self, image_url: &str) -> Result<SiteAnalysis, AnalysisError> {
        self.api_key()?;
        if image_url.trim().is_empty() {
            return Err(AnalysisError::MissingImageUrl);
        }

        let (mime_type, data) = self.fetch_image(image_url).await?;
        debug!(image_url, mime_type = %mime_type, encoded_len = data.len(), "image fetched for analysis");

        let body = json!({
            "contents": [{
                "parts": [
                    { "text": ANALYSIS_PROMPT },
                    { "inline_data": { "mime_type": mime_type, "data": data } }
                ]
            }]
        });

        let text = self.generate(body).await?;
        parse_analysis(&text)
    }

    async fn check_connection(&self) -> Result<String, AnalysisError> {
        let body = json!({
            "contents": [{ "parts": [{ "text": CONNECTION_CHECK_PROMPT }] }]
        });
        self.generate(body).await
    }
}
