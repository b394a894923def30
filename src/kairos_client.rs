use async_trait::async_trait;
use std::time::Duration;

use crate::config::KairosConfig;
use crate::error::KairosClientError;
use crate::models::datasource::TimeRange;
use crate::models::kairos::{MetricQuery, MetricQueryRequest, MetricQueryResults, QueryResponse};

/// The one call this adapter makes against KairosDB.
///
/// Implementations must return exactly one result set per submitted query,
/// in submission order.
#[async_trait]
pub trait KairosClient: Send + Sync {
    async fn query_metrics(
        &self,
        range: TimeRange,
        queries: &[MetricQuery],
    ) -> Result<Vec<MetricQueryResults>, KairosClientError>;
}

/// KairosDB REST client. Cheap to clone; reqwest pools connections internally.
#[derive(Clone)]
pub struct HttpKairosClient {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpKairosClient {
    pub fn new(config: &KairosConfig) -> Result<Self, KairosClientError> {
        let mut builder = reqwest::Client::builder();
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }
        Ok(Self {
            http: builder.build()?,
            endpoint: config.query_endpoint(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl KairosClient for HttpKairosClient {
    async fn query_metrics(
        &self,
        range: TimeRange,
        queries: &[MetricQuery],
    ) -> Result<Vec<MetricQueryResults>, KairosClientError> {
        // KairosDB rejects a query with no metrics.
        if queries.is_empty() {
            return Ok(Vec::new());
        }

        let body = MetricQueryRequest {
            start_absolute: range.from_epoch_ms,
            end_absolute: range.to_epoch_ms,
            metrics: queries,
        };

        let resp = self.http.post(&self.endpoint).json(&body).send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(KairosClientError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: QueryResponse = serde_json::from_str(&text)?;
        tracing::debug!(
            "kairosdb answered {} queries ({} bytes)",
            parsed.queries.len(),
            text.len()
        );
        Ok(parsed.queries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, http::StatusCode, routing::post};
    use serde_json::{Value, json};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answer each submitted metric with a single ungrouped point at `start_absolute`.
    async fn fake_kairos(Json(body): Json<Value>) -> Json<Value> {
        let start = body["start_absolute"].as_i64().unwrap_or_default();
        let queries: Vec<Value> = body["metrics"]
            .as_array()
            .cloned()
            .unwrap_or_default()
            .iter()
            .map(|m| {
                json!({
                    "sample_size": 1,
                    "results": [{ "name": m["name"], "values": [[start, 1.5]] }]
                })
            })
            .collect();
        Json(json!({ "queries": queries }))
    }

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client_for(url: String) -> HttpKairosClient {
        HttpKairosClient::new(&KairosConfig {
            url,
            ..Default::default()
        })
        .unwrap()
    }

    fn metric(name: &str) -> MetricQuery {
        MetricQuery {
            name: name.to_string(),
            ..Default::default()
        }
    }

    const RANGE: TimeRange = TimeRange {
        from_epoch_ms: 1564682808000,
        to_epoch_ms: 1564682828000,
    };

    #[tokio::test]
    async fn test_query_metrics_round_trip() {
        let url = serve(Router::new().route("/api/v1/datapoints/query", post(fake_kairos))).await;
        let client = client_for(url);

        let results = client
            .query_metrics(RANGE, &[metric("MetricA"), metric("MetricB")])
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].results[0].name, "MetricA");
        assert_eq!(results[1].results[0].name, "MetricB");
        assert_eq!(results[1].results[0].values[0].0, RANGE.from_epoch_ms);
    }

    #[tokio::test]
    async fn test_error_status_surfaces_body() {
        let app = Router::new().route(
            "/api/v1/datapoints/query",
            post(|| async { (StatusCode::BAD_REQUEST, "metric[0](name) may not be empty") }),
        );
        let client = client_for(serve(app).await);

        let err = client.query_metrics(RANGE, &[metric("")]).await.unwrap_err();
        match err {
            KairosClientError::Status { status, body } => {
                assert_eq!(status, 400);
                assert!(body.contains("may not be empty"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_empty_batch_sends_no_request() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let app = Router::new().route(
            "/api/v1/datapoints/query",
            post(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    (StatusCode::BAD_REQUEST, "metrics may not be empty")
                }
            }),
        );
        let client = client_for(serve(app).await);

        let results = client.query_metrics(RANGE, &[]).await.unwrap();
        assert!(results.is_empty());
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_undecodable_body() {
        let app = Router::new().route("/api/v1/datapoints/query", post(|| async { "<html>" }));
        let client = client_for(serve(app).await);

        let err = client
            .query_metrics(RANGE, &[metric("MetricA")])
            .await
            .unwrap_err();
        assert!(matches!(err, KairosClientError::Decode(_)));
    }
}
