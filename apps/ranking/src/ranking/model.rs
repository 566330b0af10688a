//! Scoring model: pluggable, trait-based predictor over the feature vector.
//!
//! Default: `DecisionTreeModel`, a regression tree exported from the trained
//! model as plain node arrays and evaluated in-process.
//! Alternative: `HttpScoringModel`, which posts the vector to a remote
//! predict endpoint.
//!
//! `AppState` holds an `Arc<dyn ScoringModel>`, chosen at startup via config.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::ModelSource;
use crate::errors::AppError;
use crate::features::transform::{FeatureVector, FEATURE_NAMES};

const LEAF: i64 = -1;
const HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("could not read model artifact: {0}")]
    Io(#[from] std::io::Error),

    #[error("model artifact is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid tree: {0}")]
    InvalidTree(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model returned a non-finite score")]
    NonFinite,
}

impl From<ModelError> for AppError {
    fn from(e: ModelError) -> Self {
        AppError::Model(e.to_string())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// Opaque scoring function over the 6-field feature vector.
#[async_trait]
pub trait ScoringModel: Send + Sync {
    async fn predict(&self, features: &FeatureVector) -> Result<f64, AppError>;

    /// "decision_tree" or "http", shown in logs and health output.
    fn backend(&self) -> &'static str;
}

// ────────────────────────────────────────────────────────────────────────────
// DecisionTreeModel
// ────────────────────────────────────────────────────────────────────────────

/// Node arrays of a fitted regression tree, one entry per node.
#[derive(Debug, Deserialize)]
struct TreeArtifact {
    #[serde(default)]
    feature_names: Option<Vec<String>>,
    children_left: Vec<i64>,
    children_right: Vec<i64>,
    feature: Vec<i64>,
    threshold: Vec<f64>,
    value: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// In-process regression tree. `x[feature] <= threshold` goes left.
#[derive(Debug, Clone)]
pub struct DecisionTreeModel {
    nodes: Vec<TreeNode>,
}

impl DecisionTreeModel {
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, ModelError> {
        let artifact: TreeArtifact = serde_json::from_slice(bytes)?;
        Self::from_artifact(artifact)
    }

    pub fn from_path(path: &Path) -> Result<Self, ModelError> {
        let bytes = std::fs::read(path)?;
        Self::from_json_slice(&bytes)
    }

    fn from_artifact(artifact: TreeArtifact) -> Result<Self, ModelError> {
        if let Some(names) = &artifact.feature_names {
            if names.iter().map(String::as_str).ne(FEATURE_NAMES.iter().copied()) {
                return Err(ModelError::InvalidTree(format!(
                    "feature_names {names:?} do not match {FEATURE_NAMES:?}"
                )));
            }
        }

        let n = artifact.children_left.len();
        if n == 0 {
            return Err(ModelError::InvalidTree("tree has no nodes".to_string()));
        }
        let lengths = [
            artifact.children_right.len(),
            artifact.feature.len(),
            artifact.threshold.len(),
            artifact.value.len(),
        ];
        if lengths.iter().any(|len| *len != n) {
            return Err(ModelError::InvalidTree(format!(
                "node arrays differ in length: {n} vs {lengths:?}"
            )));
        }

        let nodes = (0..n)
            .map(|i| {
                let left = artifact.children_left[i];
                let right = artifact.children_right[i];
                if left == LEAF {
                    return Ok(TreeNode::Leaf {
                        value: artifact.value[i],
                    });
                }

                let child = |c: i64| -> Result<usize, ModelError> {
                    // children always point forward, so traversal terminates
                    usize::try_from(c)
                        .ok()
                        .filter(|c| *c > i && *c < n)
                        .ok_or_else(|| {
                            ModelError::InvalidTree(format!("node {i} has invalid child {c}"))
                        })
                };
                let feature = usize::try_from(artifact.feature[i])
                    .ok()
                    .filter(|f| *f < FEATURE_NAMES.len())
                    .ok_or_else(|| {
                        ModelError::InvalidTree(format!(
                            "node {i} splits on unknown feature {}",
                            artifact.feature[i]
                        ))
                    })?;

                Ok(TreeNode::Split {
                    feature,
                    threshold: artifact.threshold[i],
                    left: child(left)?,
                    right: child(right)?,
                })
            })
            .collect::<Result<Vec<_>, ModelError>>()?;

        Ok(Self { nodes })
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Walks the tree from the root to a leaf.
    pub fn evaluate(&self, input: &[f64; 6]) -> Result<f64, ModelError> {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                TreeNode::Leaf { value } => {
                    return if value.is_finite() {
                        Ok(*value)
                    } else {
                        Err(ModelError::NonFinite)
                    };
                }
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if input[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}

#[async_trait]
impl ScoringModel for DecisionTreeModel {
    async fn predict(&self, features: &FeatureVector) -> Result<f64, AppError> {
        let score = self.evaluate(&features.to_model_input())?;
        debug!(score, "decision tree prediction");
        Ok(score)
    }

    fn backend(&self) -> &'static str {
        "decision_tree"
    }
}

// ────────────────────────────────────────────────────────────────────────────
// HttpScoringModel
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct PredictResponse {
    score: f64,
}

/// Remote predict endpoint accepting the feature vector as JSON and
/// answering `{"score": f}`.
pub struct HttpScoringModel {
    client: Client,
    url: String,
}

impl HttpScoringModel {
    pub fn new(url: String) -> Result<Self, ModelError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client, url })
    }

    async fn call(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        let response: PredictResponse = self
            .client
            .post(&self.url)
            .json(features)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if response.score.is_finite() {
            Ok(response.score)
        } else {
            Err(ModelError::NonFinite)
        }
    }
}

#[async_trait]
impl ScoringModel for HttpScoringModel {
    async fn predict(&self, features: &FeatureVector) -> Result<f64, AppError> {
        Ok(self.call(features).await?)
    }

    fn backend(&self) -> &'static str {
        "http"
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Loading
// ────────────────────────────────────────────────────────────────────────────

/// Builds the configured scoring model. Fails startup if the artifact is
/// missing or malformed.
pub async fn load_scoring_model(source: &ModelSource) -> anyhow::Result<Arc<dyn ScoringModel>> {
    match source {
        ModelSource::Http { url } => {
            info!("Using remote scoring model at {url}");
            Ok(Arc::new(HttpScoringModel::new(url.clone())?))
        }
        ModelSource::File { path } => {
            let model = DecisionTreeModel::from_path(path)
                .with_context(|| format!("Failed to load model from {}", path.display()))?;
            info!(
                "Loaded decision tree ({} nodes) from {}",
                model.node_count(),
                path.display()
            );
            Ok(Arc::new(model))
        }
        ModelSource::S3 {
            bucket,
            key,
            endpoint,
            region,
            access_key_id,
            secret_access_key,
        } => {
            let credentials = Credentials::new(
                access_key_id,
                secret_access_key,
                None,
                None,
                "ranking-static",
            );
            let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
                .region(Region::new(region.clone()))
                .credentials_provider(credentials)
                .endpoint_url(endpoint)
                .load()
                .await;
            let s3 = aws_sdk_s3::Client::new(&s3_config);

            let object = s3
                .get_object()
                .bucket(bucket)
                .key(key)
                .send()
                .await
                .map_err(|e| anyhow::anyhow!("S3 download failed: {e}"))?;
            let bytes = object
                .body
                .collect()
                .await
                .map_err(|e| anyhow::anyhow!("S3 body read failed: {e}"))?
                .into_bytes();

            let model = DecisionTreeModel::from_json_slice(&bytes)
                .with_context(|| format!("Invalid model artifact at s3://{bucket}/{key}"))?;
            info!(
                "Loaded decision tree ({} nodes) from s3://{}/{}",
                model.node_count(),
                bucket,
                key
            );
            Ok(Arc::new(model))
        }
    }
}
