//! Batch dispatch: translate every panel query, make one KairosDB call,
//! map each result set back onto its reference id.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{DatasourceError, KairosClientError};
use crate::kairos_client::KairosClient;
use crate::models::datasource::{DatasourceQuery, QueryResult, TimeRange};
use crate::models::{kairos, panel};
use crate::result_mapper::map_results;
use crate::translate::{decode_panel_query, translate};

#[derive(Clone)]
pub struct Datasource {
    client: Arc<dyn KairosClient>,
    deadline: Option<Duration>,
}

impl Datasource {
    pub fn new(client: Arc<dyn KairosClient>) -> Self {
        Self {
            client,
            deadline: None,
        }
    }

    /// Bound the single KairosDB call; an elapsed deadline reports `Cancelled`.
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Decode and translate one dashboard query.
    pub fn create_metric_query(
        &self,
        query: &DatasourceQuery,
    ) -> Result<kairos::MetricQuery, DatasourceError> {
        let panel_query =
            decode_panel_query(query).map_err(|e| DatasourceError::malformed(&query.ref_id, e))?;
        translate(&panel_query).map_err(|e| DatasourceError::malformed(&query.ref_id, e))
    }

    /// Decode every dashboard query and dispatch them as one batch.
    pub async fn query(
        &self,
        queries: &[DatasourceQuery],
        range: TimeRange,
    ) -> Result<Vec<QueryResult>, DatasourceError> {
        let decoded = queries
            .iter()
            .map(|q| {
                decode_panel_query(q)
                    .map(|pq| (q.ref_id.clone(), pq))
                    .map_err(|e| DatasourceError::malformed(&q.ref_id, e))
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.dispatch(&decoded, range).await
    }

    pub async fn dispatch(
        &self,
        queries: &[(String, panel::MetricQuery)],
        range: TimeRange,
    ) -> Result<Vec<QueryResult>, DatasourceError> {
        self.dispatch_until(queries, range, std::future::pending::<()>())
            .await
    }

    /// Like `dispatch`, but abandons the KairosDB call as soon as `cancelled` completes.
    pub async fn dispatch_until<F>(
        &self,
        queries: &[(String, panel::MetricQuery)],
        range: TimeRange,
        cancelled: F,
    ) -> Result<Vec<QueryResult>, DatasourceError>
    where
        F: Future<Output = ()>,
    {
        let mut ref_ids = Vec::with_capacity(queries.len());
        let mut metrics = Vec::with_capacity(queries.len());
        for (ref_id, panel_query) in queries {
            let metric = translate(panel_query).map_err(|e| {
                tracing::warn!("query {ref_id} rejected: {e}");
                DatasourceError::malformed(ref_id, e)
            })?;
            tracing::debug!("query {ref_id}: {}", metric.name);
            ref_ids.push(ref_id.as_str());
            metrics.push(metric);
        }

        tracing::debug!(
            "dispatching {} queries for [{}, {}]",
            metrics.len(),
            range.from_epoch_ms,
            range.to_epoch_ms
        );

        let call = self.call_with_deadline(range, &metrics);
        let result_sets = tokio::select! {
            res = call => res.inspect_err(|e| tracing::error!("batch failed: {e}"))?,
            _ = cancelled => {
                tracing::warn!("batch of {} queries cancelled by caller", metrics.len());
                return Err(DatasourceError::Cancelled("cancelled by caller".to_string()));
            }
        };

        // Results are correlated by position only; a short answer would drop queries.
        if result_sets.len() != metrics.len() {
            let err = KairosClientError::ResultCountMismatch {
                expected: metrics.len(),
                actual: result_sets.len(),
            };
            tracing::error!("batch failed: {err}");
            return Err(err.into());
        }

        Ok(ref_ids
            .into_iter()
            .zip(result_sets.iter())
            .map(|(ref_id, results)| QueryResult {
                reference_id: ref_id.to_string(),
                series: map_results(results),
            })
            .collect())
    }

    async fn call_with_deadline(
        &self,
        range: TimeRange,
        metrics: &[kairos::MetricQuery],
    ) -> Result<Vec<kairos::MetricQueryResults>, DatasourceError> {
        let call = self.client.query_metrics(range, metrics);
        match self.deadline {
            Some(deadline) => match tokio::time::timeout(deadline, call).await {
                Ok(res) => Ok(res?),
                Err(_) => Err(DatasourceError::Cancelled(format!(
                    "deadline of {deadline:?} exceeded"
                ))),
            },
            None => Ok(call.await?),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════
