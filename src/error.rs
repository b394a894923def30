//! Error types for translation, dispatch and the KairosDB client.

use axum::http::StatusCode;
use thiserror::Error;

/// A panel query that cannot be expressed as a KairosDB query.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TranslateError {
    #[error("aggregator '{aggregator}': sampling value '{value}' is not an integer")]
    InvalidSamplingValue { aggregator: String, value: String },

    #[error("aggregator '{aggregator}': sampling requires both value and unit")]
    IncompleteSampling { aggregator: String },

    #[error("invalid query model: {0}")]
    InvalidModel(String),

    #[error("query model has no query")]
    MissingQuery,
}

#[derive(Error, Debug)]
pub enum KairosClientError {
    #[error("kairosdb request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("kairosdb returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("kairosdb response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("kairosdb returned {actual} result sets for {expected} queries")]
    ResultCountMismatch { expected: usize, actual: usize },
}

/// Batch-level failure of a dispatch. No partial results accompany it.
#[derive(Error, Debug)]
pub enum DatasourceError {
    #[error("malformed query {ref_id}: {source}")]
    MalformedQuery {
        ref_id: String,
        #[source]
        source: TranslateError,
    },

    #[error("backend query failed: {0}")]
    Backend(#[from] KairosClientError),

    #[error("query cancelled: {0}")]
    Cancelled(String),
}

impl DatasourceError {
    pub fn malformed(ref_id: impl Into<String>, source: TranslateError) -> Self {
        Self::MalformedQuery {
            ref_id: ref_id.into(),
            source,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MalformedQuery { .. } => StatusCode::BAD_REQUEST,
            Self::Backend(_) => StatusCode::BAD_GATEWAY,
            Self::Cancelled(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}
