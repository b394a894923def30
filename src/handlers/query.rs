use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::DateTime;
use serde::Deserialize;

use crate::AppState;
use crate::models::datasource::{DatasourceQuery, DatasourceResponse, TimeRange};

/// `POST /api/v1/query` body: one dashboard refresh worth of panel queries.
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub time_range: TimeRangeParams,
    #[serde(default)]
    pub queries: Vec<DatasourceQuery>,
}

#[derive(Debug, Deserialize)]
pub struct TimeRangeParams {
    pub from: TimeBound,
    pub to: TimeBound,
}

/// Epoch milliseconds, as a number or digit string, or an RFC 3339 timestamp.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TimeBound {
    Millis(i64),
    Text(String),
}

impl TimeBound {
    pub fn to_epoch_ms(&self) -> Result<i64, String> {
        match self {
            TimeBound::Millis(ms) => Ok(*ms),
            TimeBound::Text(s) => {
                let s = s.trim();
                if let Ok(ms) = s.parse::<i64>() {
                    return Ok(ms);
                }
                DateTime::parse_from_rfc3339(s)
                    .map(|dt| dt.timestamp_millis())
                    .map_err(|e| format!("invalid timestamp '{s}': {e}"))
            }
        }
    }
}

impl TimeRangeParams {
    pub fn resolve(&self) -> Result<TimeRange, String> {
        let from_epoch_ms = self.from.to_epoch_ms()?;
        let to_epoch_ms = self.to.to_epoch_ms()?;
        if from_epoch_ms > to_epoch_ms {
            return Err(format!(
                "time range start {from_epoch_ms} is after end {to_epoch_ms}"
            ));
        }
        Ok(TimeRange {
            from_epoch_ms,
            to_epoch_ms,
        })
    }
}

/// Translate and run a batch of panel queries against KairosDB.
pub async fn execute_query(
    State(state): State<AppState>,
    Json(req): Json<QueryRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let range = req
        .time_range
        .resolve()
        .map_err(|e| (StatusCode::BAD_REQUEST, e))?;

    let results = state
        .datasource
        .query(&req.queries, range)
        .await
        .map_err(|e| {
            tracing::error!("Query failed: {e}");
            (e.status_code(), e.to_string())
        })?;

    Ok(Json(DatasourceResponse { results }))
}
