use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Envelope the dashboard stores in each query's `model_json`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MetricRequest {
    #[serde(default)]
    pub query: Option<MetricQuery>,
}

/// A panel-level metric query as the dashboard editor builds it.
///
/// Editors serialize unset collections as `null`; those decode as empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MetricQuery {
    pub name: String,
    /// Tag key -> accepted values. A key with no values carries no filter.
    #[serde(default, deserialize_with = "nullable_tags")]
    pub tags: BTreeMap<String, Vec<String>>,
    /// Applied in order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub aggregators: Vec<Aggregator>,
    #[serde(default)]
    pub group_by: Option<GroupBy>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Aggregator {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub parameters: Vec<AggregatorParameter>,
}

/// Untyped name/value pair; interpreted by the translator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatorParameter {
    pub name: String,
    pub value: String,
}

impl AggregatorParameter {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GroupBy {
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// `null` map -> empty map, `"key": null` -> `"key": []`.
fn nullable_tags<'de, D>(deserializer: D) -> Result<BTreeMap<String, Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, Option<Vec<String>>>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(k, values)| (k, values.unwrap_or_default()))
        .collect())
}
