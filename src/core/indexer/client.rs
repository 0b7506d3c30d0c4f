use super::Result;
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

pub const REQUESTS_QUERY: &str = r#"query Requests($registerId: String!) {
  requests(filter: { registerId: { like: $registerId } }) {
    nodes {
      id
      registerId
      target
      msg
      assets
      status
      createdAt
      txHash
      executedOrCancelledAt
    }
  }
}"#;

/// A registry request as stored by the indexer. `msg` is still base64.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRequest {
    pub id: String,
    #[serde(default)]
    pub register_id: String,
    #[serde(default)]
    pub target: String,
    pub msg: String,
    #[serde(default)]
    pub assets: serde_json::Value,
    pub status: String,
    pub created_at: String,
    #[serde(default)]
    pub tx_hash: String,
    #[serde(default)]
    pub executed_or_cancelled_at: Option<String>,
}

#[async_trait]
pub trait IndexerClient: Send + Sync {
    // All requests registered by `register_id`, in indexer order
    async fn requests_by_register(&self, register_id: &str) -> Result<Vec<RawRequest>>;
}

#[derive(Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Option<Vec<serde_json::Value>>,
}

#[derive(Deserialize)]
struct RequestsData {
    requests: RequestConnection,
}

#[derive(Deserialize)]
struct RequestConnection {
    nodes: Vec<RawRequest>,
}

#[derive(Debug, Clone)]
pub struct HttpIndexer {
    inner: reqwest::Client,
    endpoint: String,
}

impl HttpIndexer {
    pub fn new(endpoint: &str) -> Self {
        Self {
            inner: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post_graphql<T>(&self, query: &str, variables: serde_json::Value) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let response = self
            .inner
            .post(&self.endpoint)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?
            .error_for_status()?;

        let body: GraphQLResponse<T> = response.json().await?;

        match body.data {
            Some(data) => Ok(data),
            None => Err(anyhow!(
                "No data returned from query: errors: {:?}",
                body.errors
            )),
        }
    }
}

#[async_trait]
impl IndexerClient for HttpIndexer {
    async fn requests_by_register(&self, register_id: &str) -> Result<Vec<RawRequest>> {
        let data: RequestsData = self
            .post_graphql(REQUESTS_QUERY, json!({ "registerId": register_id }))
            .await
            .with_context(|| format!("Error querying requests from {}", self.endpoint))?;

        debug!(
            endpoint = %self.endpoint,
            count = data.requests.nodes.len(),
            "fetched requests"
        );
        Ok(data.requests.nodes)
    }
}

/// Queries `primary`, and on any failure repeats the same query against
/// `backup`. No retries beyond that.
#[derive(Debug, Clone)]
pub struct FallbackIndexer<P, B = P> {
    primary: P,
    backup: B,
}

impl<P, B> FallbackIndexer<P, B> {
    pub fn new(primary: P, backup: B) -> Self {
        Self { primary, backup }
    }
}

#[async_trait]
impl<P, B> IndexerClient for FallbackIndexer<P, B>
where
    P: IndexerClient,
    B: IndexerClient,
{
    async fn requests_by_register(&self, register_id: &str) -> Result<Vec<RawRequest>> {
        match self.primary.requests_by_register(register_id).await {
            Ok(requests) => Ok(requests),
            Err(primary_err) => {
                warn!(error = %primary_err, "primary indexer failed, querying backup");
                self.backup
                    .requests_by_register(register_id)
                    .await
                    .with_context(|| format!("Backup indexer failed after primary error: {primary_err}"))
            }
        }
    }
}
