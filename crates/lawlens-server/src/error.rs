use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lawlens_core::flow::FlowError;
use lawlens_flows::{analyze::AnalyzeError, RunFlowError};
use serde::Serialize;
use thiserror::Error;

/// Message returned for every flow failure that is not the caller's fault.
pub const FLOW_FAILED_MESSAGE: &str = "Something went wrong while analyzing the document.";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("flow '{0}' not found")]
    FlowNotFound(String),
    #[error("{0}")]
    InvalidInput(String),
    #[error("The provided document has no text content.")]
    EmptyDocument,
    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),
    #[error("upload exceeds the size limit")]
    PayloadTooLarge,
    #[error(transparent)]
    Flow(FlowError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    code: &'static str,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::FlowNotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidInput(_) | Self::EmptyDocument => StatusCode::BAD_REQUEST,
            Self::UnsupportedFileType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Flow(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            Self::Flow(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::FlowNotFound(_) => "FLOW_NOT_FOUND",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::EmptyDocument => "EMPTY_DOCUMENT",
            Self::UnsupportedFileType(_) => "UNSUPPORTED_FILE_TYPE",
            Self::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            Self::Flow(e) if e.is_timeout() => "FLOW_TIMEOUT",
            Self::Flow(_) => "FLOW_FAILED",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// The text shown to the caller. Provider and internal details stay in the log.
    pub fn public_message(&self) -> String {
        match self {
            Self::Flow(e) if e.is_timeout() => "The model did not reply in time.".to_string(),
            Self::Flow(_) => FLOW_FAILED_MESSAGE.to_string(),
            Self::Internal(_) => "internal error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<FlowError> for ApiError {
    fn from(e: FlowError) -> Self {
        match e {
            FlowError::InvalidInput { .. } => Self::InvalidInput(e.to_string()),
            other => Self::Flow(other),
        }
    }
}

impl From<RunFlowError> for ApiError {
    fn from(e: RunFlowError) -> Self {
        match e {
            RunFlowError::UnknownFlow(name) => Self::FlowNotFound(name),
            RunFlowError::Flow(e) => e.into(),
        }
    }
}

impl From<AnalyzeError> for ApiError {
    fn from(e: AnalyzeError) -> Self {
        match e {
            AnalyzeError::EmptyDocument => Self::EmptyDocument,
            AnalyzeError::UnsupportedFileType(t) => Self::UnsupportedFileType(t),
            AnalyzeError::Extraction(e) => Self::InvalidInput(e.to_string()),
            AnalyzeError::Flow(e) => e.into(),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge
        } else {
            Self::InvalidInput(e.body_text())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Flow(e) => tracing::warn!(flow = e.flow(), "flow failed: {e}"),
            Self::Internal(e) => tracing::error!("internal error: {e:#}"),
            _ => {},
        }

        let body = ErrorResponse {
            success: false,
            error: self.public_message(),
            code: self.code(),
        };
        (self.status(), Json(body)).into_response()
    }
}
