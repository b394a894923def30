use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

// ── Query side ──

/// Body of `POST /api/v1/datapoints/query`.
#[derive(Debug, Serialize)]
pub struct MetricQueryRequest<'a> {
    pub start_absolute: i64,
    pub end_absolute: i64,
    pub metrics: &'a [MetricQuery],
}

/// One metric in a KairosDB query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MetricQuery {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aggregators: Vec<Aggregator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_by: Option<Vec<Grouper>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Aggregator {
    pub name: String,
    #[serde(default)]
    pub align_sampling: bool,
    #[serde(default)]
    pub align_start_time: bool,
    #[serde(default)]
    pub align_end_time: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sampling: Option<Sampling>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sampling {
    pub value: i64,
    pub unit: String,
}

/// Grouper kind emitted for tag grouping.
pub const TAG_GROUPER: &str = "tag";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grouper {
    #[serde(rename = "name")]
    pub kind: String,
    pub tags: Vec<String>,
}

impl Grouper {
    pub fn tags(tags: Vec<String>) -> Self {
        Self {
            kind: TAG_GROUPER.to_string(),
            tags,
        }
    }
}

// ── Result side ──

/// Top-level KairosDB query response. `queries[i]` answers `metrics[i]`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct QueryResponse {
    #[serde(default)]
    pub queries: Vec<MetricQueryResults>,
}

/// All result groups produced for one submitted metric query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MetricQueryResults {
    #[serde(default)]
    pub sample_size: u64,
    #[serde(default)]
    pub results: Vec<MetricQueryResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MetricQueryResult {
    pub name: String,
    #[serde(rename = "group_by", default)]
    pub group_info: Vec<GroupInfo>,
    #[serde(default)]
    pub values: Vec<DataPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GroupInfo {
    #[serde(rename = "name")]
    pub kind: String,
    /// Keys the grouping was requested on. Informational only.
    #[serde(rename = "tags", default)]
    pub requested_tag_keys: Vec<String>,
    /// Resolved tag values for this group; may hold more keys than requested.
    #[serde(default, deserialize_with = "group_values")]
    pub group: BTreeMap<String, String>,
}

/// Value and time groupers send numbers (`{"group_number": 0}`); render them as strings.
fn group_values<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, serde_json::Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(k, v)| match v {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some((k, s)),
            other => Some((k, other.to_string())),
        })
        .collect())
}

/// `[timestamp_ms, value]` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint(pub i64, pub f64);
