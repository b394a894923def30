use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Query window in epoch milliseconds, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub from_epoch_ms: i64,
    pub to_epoch_ms: i64,
}

/// A dashboard query as received: a reference id plus the encoded panel model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasourceQuery {
    pub ref_id: String,
    pub model_json: String,
}

/// Response to one dispatched batch, in submission order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DatasourceResponse {
    pub results: Vec<QueryResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub reference_id: String,
    pub series: Vec<TimeSeries>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub name: String,
    /// Always serialized as an object, `{}` when the series has no group tags.
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub timestamp: i64,
    pub value: f64,
}
