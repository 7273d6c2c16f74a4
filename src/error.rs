//! Error handling

use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::http::{HeaderValue, StatusCode};
use axum::response::IntoResponse;
use tracing::info;

use crate::compose::fallback_document;
use crate::constants::{PANEL_CACHE_CONTROL, SVG_CONTENT_TYPE};

/// Errors raised while loading layouts, fetching images or composing a panel.
#[derive(Debug)]
pub enum ToonError {
    /// The request could not be understood, eg a malformed query string
    BadRequest(String),
    /// A layout record or table failed validation
    InvalidLayout(String),
    /// An image reference could not be resolved or fetched
    Image(String),
    /// The layout table could not be parsed
    Parse(serde_json::Error),
    /// When an internal server error occurs
    InternalServerError(String),
}

impl std::fmt::Display for ToonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadRequest(message) => write!(f, "Bad request: {message}"),
            Self::InvalidLayout(message) => write!(f, "Invalid layout: {message}"),
            Self::Image(message) => write!(f, "Image error: {message}"),
            Self::Parse(err) => write!(f, "Failed to parse layout JSON: {err}"),
            Self::InternalServerError(message) => write!(f, "Internal error: {message}"),
        }
    }
}

impl std::error::Error for ToonError {}

impl From<serde_json::Error> for ToonError {
    fn from(err: serde_json::Error) -> Self {
        ToonError::Parse(err)
    }
}

impl From<std::io::Error> for ToonError {
    fn from(err: std::io::Error) -> Self {
        ToonError::InternalServerError(err.to_string())
    }
}

impl From<axum::http::Error> for ToonError {
    fn from(err: axum::http::Error) -> Self {
        ToonError::InternalServerError(err.to_string())
    }
}

impl From<url::ParseError> for ToonError {
    fn from(err: url::ParseError) -> Self {
        ToonError::Image(err.to_string())
    }
}

impl From<reqwest::Error> for ToonError {
    fn from(err: reqwest::Error) -> Self {
        ToonError::Image(err.to_string())
    }
}

/// Failures are drawn into the panel itself and served as 200, so embedding pages
/// always get a renderable image.
impl IntoResponse for ToonError {
    fn into_response(self) -> axum::response::Response {
        match &self {
            ToonError::BadRequest(_) => info!("{}", self),
            _ => tracing::error!("{}", self),
        }
        let body = fallback_document(&self.to_string());
        let mut response = axum::response::Response::new(axum::body::Body::from(body));
        *response.status_mut() = StatusCode::OK;
        let headers = response.headers_mut();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(SVG_CONTENT_TYPE));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static(PANEL_CACHE_CONTROL));
        headers.insert("x-toonpanel-error", HeaderValue::from_static(self.kind()));
        response
    }
}

impl ToonError {
    /// Short machine-readable name for the error variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad-request",
            Self::InvalidLayout(_) => "invalid-layout",
            Self::Image(_) => "image",
            Self::Parse(_) => "parse",
            Self::InternalServerError(_) => "internal",
        }
    }
}
