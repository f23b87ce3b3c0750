//! The query backend boundary.
//!
//! Resolved SQL leaves the crate through [`QueryBackend`]. Connection
//! handling and retries belong to the implementation; [`WithTimeout`] adds a
//! per-query time limit to any backend.

use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use serde_json::Value;

use super::session::ChartQuery;
use super::DashboardError;

/// Error reported by a query backend.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BackendError {
    #[error("Query failed: {0}")]
    Query(String),

    #[error("Query timed out")]
    Timeout,

    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

/// Executes resolved queries.
#[async_trait]
pub trait QueryBackend: Send + Sync {
    /// Run one query and return its rows as JSON.
    async fn execute(&self, sql: &str) -> Result<Value, BackendError>;

    /// Run several queries concurrently, preserving order.
    async fn execute_batch(&self, queries: &[String]) -> Vec<Result<Value, BackendError>> {
        let futures: Vec<_> = queries.iter().map(|sql| self.execute(sql)).collect();
        join_all(futures).await
    }
}

/// Default per-query limit for [`WithTimeout`] (30 seconds).
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 30;

/// Wraps a backend so that no single query runs longer than a limit.
#[derive(Debug, Clone)]
pub struct WithTimeout<B> {
    inner: B,
    timeout: Duration,
}

impl<B> WithTimeout<B> {
    pub fn new(inner: B, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn with_default_timeout(inner: B) -> Self {
        Self::new(inner, Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS))
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn into_inner(self) -> B {
        self.inner
    }
}

#[async_trait]
impl<B: QueryBackend> QueryBackend for WithTimeout<B> {
    async fn execute(&self, sql: &str) -> Result<Value, BackendError> {
        match tokio::time::timeout(self.timeout, self.inner.execute(sql)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(timeout_ms = self.timeout.as_millis() as u64, "query timed out");
                Err(BackendError::Timeout)
            }
        }
    }
}

/// Why a chart has no data.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChartError {
    #[error(transparent)]
    Resolve(#[from] DashboardError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// One chart's data, or the reason it has none.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    pub index: usize,
    pub title: String,
    pub result: Result<Value, ChartError>,
}

/// Send every resolved chart query to `backend` concurrently.
///
/// Charts whose query did not resolve are passed through with their error
/// and never reach the backend.
pub async fn dispatch<B>(backend: &B, queries: Vec<ChartQuery>) -> Vec<ChartData>
where
    B: QueryBackend + ?Sized,
{
    let futures: Vec<_> = queries
        .into_iter()
        .map(|query| async move {
            let result = match query.result {
                Ok(sql) => backend.execute(&sql).await.map_err(ChartError::from),
                Err(err) => Err(ChartError::from(err)),
            };
            if let Err(err) = &result {
                tracing::warn!(chart = query.index, error = %err, "chart has no data");
            }
            ChartData {
                index: query.index,
                title: query.title,
                result,
            }
        })
        .collect();

    join_all(futures).await
}
