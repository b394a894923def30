//! Panel query -> KairosDB metric query.
//!
//! Aggregator parameters arrive as untyped name/value strings. Recognized
//! names are decoded into typed fields; anything else is ignored so newer
//! editor parameters don't break older adapters.

use crate::error::TranslateError;
use crate::models::datasource::DatasourceQuery;
use crate::models::kairos::{self, Grouper, Sampling};
use crate::models::panel::{self, MetricRequest};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AggregatorParam {
    Value,
    Unit,
    Sampling,
}

/// Map a parameter name to a recognized aggregator parameter.
pub fn to_aggregator_param(name: &str) -> Option<AggregatorParam> {
    match name {
        "value" => Some(AggregatorParam::Value),
        "unit" => Some(AggregatorParam::Unit),
        "sampling" => Some(AggregatorParam::Sampling),
        _ => None,
    }
}

/// Where aggregation buckets are anchored.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Alignment {
    #[default]
    None,
    Sampling,
    StartTime,
    EndTime,
}

/// Unrecognized modes align like `NONE`.
pub fn to_alignment(value: &str) -> Alignment {
    match value {
        "SAMPLING" => Alignment::Sampling,
        "START_TIME" => Alignment::StartTime,
        "END_TIME" => Alignment::EndTime,
        _ => Alignment::None,
    }
}

/// Decode the panel query carried in a dashboard query's `model_json`.
pub fn decode_panel_query(query: &DatasourceQuery) -> Result<panel::MetricQuery, TranslateError> {
    let request: MetricRequest = serde_json::from_str(&query.model_json)
        .map_err(|e| TranslateError::InvalidModel(e.to_string()))?;
    request.query.ok_or(TranslateError::MissingQuery)
}

/// Build the KairosDB query for one panel query.
pub fn translate(query: &panel::MetricQuery) -> Result<kairos::MetricQuery, TranslateError> {
    let tags = query
        .tags
        .iter()
        .filter(|(_, values)| !values.is_empty())
        .map(|(k, values)| (k.clone(), values.clone()))
        .collect();

    let aggregators = query
        .aggregators
        .iter()
        .map(translate_aggregator)
        .collect::<Result<Vec<_>, _>>()?;

    let group_by = query
        .group_by
        .as_ref()
        .filter(|g| !g.tags.is_empty())
        .map(|g| vec![Grouper::tags(g.tags.clone())]);

    Ok(kairos::MetricQuery {
        name: query.name.clone(),
        tags,
        aggregators,
        group_by,
    })
}

fn translate_aggregator(agg: &panel::Aggregator) -> Result<kairos::Aggregator, TranslateError> {
    let mut value: Option<i64> = None;
    let mut unit: Option<String> = None;
    let mut alignment = Alignment::None;

    for param in &agg.parameters {
        match to_aggregator_param(&param.name) {
            Some(AggregatorParam::Value) => {
                let parsed = param.value.trim().parse::<i64>().map_err(|_| {
                    TranslateError::InvalidSamplingValue {
                        aggregator: agg.name.clone(),
                        value: param.value.clone(),
                    }
                })?;
                value = Some(parsed);
            }
            Some(AggregatorParam::Unit) => unit = Some(param.value.clone()),
            Some(AggregatorParam::Sampling) => alignment = to_alignment(&param.value),
            None => {
                tracing::debug!(
                    "aggregator '{}': ignoring parameter '{}'",
                    agg.name,
                    param.name
                );
            }
        }
    }

    let sampling = match (value, unit) {
        (Some(value), Some(unit)) => Some(Sampling { value, unit }),
        (None, None) => None,
        _ => {
            return Err(TranslateError::IncompleteSampling {
                aggregator: agg.name.clone(),
            });
        }
    };

    // Aligning needs a sampling interval to align to.
    if alignment != Alignment::None && sampling.is_none() {
        return Err(TranslateError::IncompleteSampling {
            aggregator: agg.name.clone(),
        });
    }

    Ok(kairos::Aggregator {
        name: agg.name.clone(),
        align_sampling: alignment == Alignment::Sampling,
        align_start_time: alignment == Alignment::StartTime,
        align_end_time: alignment == Alignment::EndTime,
        sampling,
    })
}

// ═══════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════
