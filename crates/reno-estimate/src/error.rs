use crate::analysis::AnalysisError;
use crate::config::ConfigError;
use crate::estimate::SheetError;
use crate::labor::LaborIndexError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Sheet(SheetError),
    Labor(LaborIndexError),
    Analysis(AnalysisError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Sheet(err) => write!(f, "task sheet error: {}", err),
            AppError::Labor(err) => write!(f, "labor index error: {}", err),
            AppError::Analysis(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Sheet(err) => Some(err),
            AppError::Labor(err) => Some(err),
            AppError::Analysis(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Sheet(_) | AppError::Labor(_) => StatusCode::BAD_REQUEST,
            AppError::Analysis(AnalysisError::MissingImageUrl) => StatusCode::BAD_REQUEST,
            AppError::Analysis(AnalysisError::MissingApiKey) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Analysis(_) => StatusCode::BAD_GATEWAY,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<SheetError> for AppError {
    fn from(value: SheetError) -> Self {
        Self::Sheet(value)
    }
}

impl From<LaborIndexError> for AppError {
    fn from(value: LaborIndexError) -> Self {
        Self::Labor(value)
    }
}

impl From<AnalysisError> for AppError {
    fn from(value: AnalysisError) -> Self {
        Self::Analysis(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_errors_map_to_gateway_statuses() {
        let missing = AppError::from(AnalysisError::MissingApiKey).into_response();
        assert_eq!(missing.status(), StatusCode::SERVICE_UNAVAILABLE);

        let upstream =
            AppError::from(AnalysisError::Upstream("quota exceeded".to_string())).into_response();
        assert_eq!(upstream.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn labor_date_errors_are_bad_requests() {
        let response =
            AppError::from(LaborIndexError::InvalidDate("yesterday".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
