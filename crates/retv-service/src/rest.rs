//! REST implementation of the feature-service boundary.
//!
//! Talks to the hosted feature dataset over its REST API: filtered reads via
//! the layer `query` endpoint, attribute updates via `applyEdits`. One layer
//! index per collection; the production dataset publishes defects, repairs
//! and inspections at indices 0, 7 and 9.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::error::{ServiceError, ServiceResult};
use crate::filter::Filter;
use crate::record::RawRecord;
use crate::{Collection, FeatureService, UpdateOutcome};

/// Collection → layer index mapping for the hosted dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerMap {
    pub defects: u32,
    pub repairs: u32,
    pub inspections: u32,
}

impl Default for LayerMap {
    fn default() -> Self {
        LayerMap {
            defects: 0,
            repairs: 7,
            inspections: 9,
        }
    }
}

impl LayerMap {
    fn index(&self, collection: Collection) -> u32 {
        match collection {
            Collection::Defects => self.defects,
            Collection::Repairs => self.repairs,
            Collection::Inspections => self.inspections,
        }
    }
}

/// Feature-service connection configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Base URL of the feature server, up to and including the service name
    /// (layer indices are appended per request).
    pub base_url: String,
    /// Access token for secured services (optional for public ones).
    pub token: Option<String>,
    /// Collection → layer index mapping.
    pub layers: LayerMap,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            base_url: std::env::var("RETV_SERVICE_URL")
                .unwrap_or_else(|_| "https://services.example.org/arcgis/rest/services/ssMgmtSys_SMSView/FeatureServer".to_string()),
            token: std::env::var("RETV_SERVICE_TOKEN").ok(),
            layers: LayerMap::default(),
        }
    }
}

impl ServiceConfig {
    /// Build the config from environment variables
    /// (`RETV_SERVICE_URL`, `RETV_SERVICE_TOKEN`).
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Config pointed at a specific feature server.
    pub fn new(base_url: &str) -> Self {
        ServiceConfig {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
            layers: LayerMap::default(),
        }
    }

    /// Set the access token.
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    /// Override the layer indices.
    pub fn with_layers(mut self, layers: LayerMap) -> Self {
        self.layers = layers;
        self
    }
}

/// REST feature-service client.
pub struct RestFeatureService {
    config: ServiceConfig,
    http_client: reqwest::Client,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

#[derive(Deserialize)]
struct QueryFeature {
    attributes: RawRecord,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    features: Vec<QueryFeature>,
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct EditResultError {
    description: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EditResult {
    object_id: i64,
    success: bool,
    error: Option<EditResultError>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EditResponse {
    #[serde(default)]
    update_results: Vec<EditResult>,
    error: Option<ApiError>,
}

impl RestFeatureService {
    /// Create a new client for the configured service.
    pub fn new(config: ServiceConfig) -> ServiceResult<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("retv/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ServiceError::Transport(e.to_string()))?;

        Ok(RestFeatureService {
            config,
            http_client,
        })
    }

    /// Create a client from environment variables.
    pub fn from_env() -> ServiceResult<Self> {
        Self::new(ServiceConfig::from_env())
    }

    fn layer_url(&self, collection: Collection, endpoint: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.layers.index(collection),
            endpoint
        )
    }
}

#[async_trait]
impl FeatureService for RestFeatureService {
    async fn query(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> ServiceResult<Vec<RawRecord>> {
        let url = self.layer_url(collection, "query");
        let where_clause = filter.to_where_clause();
        debug!(collection = %collection, where_clause = %where_clause, "querying feature layer");

        let mut params = vec![
            ("where", where_clause),
            ("outFields", "*".to_string()),
            ("f", "json".to_string()),
        ];
        if let Some(token) = &self.config.token {
            params.push(("token", token.clone()));
        }

        let response = self.http_client.get(&url).query(&params).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Transport(format!(
                "query on {} returned HTTP {}",
                collection, status
            )));
        }

        let body: QueryResponse = response.json().await?;
        if let Some(err) = body.error {
            warn!(collection = %collection, error = %err.message, "service rejected query");
            return Err(ServiceError::Malformed(err.message));
        }

        Ok(body.features.into_iter().map(|f| f.attributes).collect())
    }

    async fn update(
        &self,
        collection: Collection,
        record: &RawRecord,
    ) -> ServiceResult<UpdateOutcome> {
        let object_id = record.object_id().map_err(|_| ServiceError::NoObjectId)?;
        let url = self.layer_url(collection, "applyEdits");
        debug!(collection = %collection, object_id, "submitting attribute update");

        let updates = json!([{ "attributes": record }]).to_string();
        let mut form = vec![("updates", updates), ("f", "json".to_string())];
        if let Some(token) = &self.config.token {
            form.push(("token", token.clone()));
        }

        let response = self.http_client.post(&url).form(&form).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Transport(format!(
                "applyEdits on {} returned HTTP {}",
                collection, status
            )));
        }

        let body: EditResponse = response.json().await?;
        if let Some(err) = body.error {
            return Err(ServiceError::Malformed(err.message));
        }

        let result = body
            .update_results
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::Malformed("applyEdits returned no update result".to_string()))?;

        Ok(UpdateOutcome {
            object_id: result.object_id,
            success: result.success,
            error: result.error.map(|e| e.description),
        })
    }
}
