//! Transport-agnostic request/response layer.
//!
//! Field names match the JSON contract the browser client speaks:
//!
//! | Endpoint | Request | Response body |
//! |----------|---------|---------------|
//! | `upload` | CSV bytes | `data`, `columns`, `numeric_columns` |
//! | `generate-sample` | none | same as `upload` |
//! | `elbow` | `data`, `features`, `max_k` | `k_values`, `inertias`, `optimal_k` |
//! | `kmeans` | `data`, `features`, `n_clusters`, `distance_metric` | `clusters`, `plot_data`, `centroids`, `stats` |
//! | `hierarchical` | `data`, `features`, `n_clusters`, `linkage` | `clusters`, `plot_data`, `stats`, `dendrogram_url` |
//!
//! Every response carries `success`. On failure it carries only `success:
//! false`, `error` and `error_kind`; no partial result is returned.
//!
//! The engine does not render dendrograms. It hands the merge tree to an
//! optional [`DendrogramRenderer`] and returns the tree inline as well, so a
//! client without a renderer can lay it out itself.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cluster::Linkage;
use crate::config::EngineConfig;
use crate::distance::DistanceMetric;
use crate::error::{Error, Result};
use crate::hierarchy::Dendrogram;
use crate::matrix::FeatureMatrix;
use crate::stats::{cluster_sizes, within_cluster_ss};
use crate::table::{sample_table, ObservationTable, Row};

/// Response envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response<T> {
    /// Whether the request succeeded.
    pub success: bool,
    /// Result fields, present only on success.
    #[serde(flatten)]
    pub body: Option<T>,
    /// Human-readable failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Stable failure name, e.g. `InvalidColumnError`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
}

impl<T> From<Result<T>> for Response<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(body) => Self {
                success: true,
                body: Some(body),
                error: None,
                error_kind: None,
            },
            Err(e) => {
                tracing::warn!(kind = e.kind().as_str(), error = %e, "request failed");
                Self {
                    success: false,
                    body: None,
                    error: Some(e.to_string()),
                    error_kind: Some(e.kind().as_str()),
                }
            }
        }
    }
}

impl<T> Response<T> {
    /// Back to a `Result`, for in-process callers.
    pub fn into_result(self) -> std::result::Result<T, String> {
        match (self.success, self.body) {
            (true, Some(body)) => Ok(body),
            _ => Err(self.error.unwrap_or_default()),
        }
    }
}

/// Table returned by `upload` and `generate-sample`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableBody {
    /// Rows as records.
    pub data: Vec<Row>,
    /// All column names in table order.
    pub columns: Vec<String>,
    /// Columns usable as features.
    pub numeric_columns: Vec<String>,
}

impl From<ObservationTable> for TableBody {
    fn from(table: ObservationTable) -> Self {
        let columns = table.columns().to_vec();
        let numeric_columns = table.numeric_columns();
        Self {
            data: table.into_rows(),
            columns,
            numeric_columns,
        }
    }
}

/// `elbow` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElbowRequest {
    /// Observation rows.
    pub data: Vec<Row>,
    /// Feature columns, in axis order.
    pub features: Vec<String>,
    /// Largest k to try (capped by configuration).
    #[serde(default)]
    pub max_k: Option<usize>,
    /// Assignment metric for the sweep.
    #[serde(default)]
    pub distance_metric: Option<String>,
}

/// `elbow` response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElbowBody {
    /// Candidate k values.
    pub k_values: Vec<usize>,
    /// Inertia for each candidate.
    pub inertias: Vec<f64>,
    /// Selected k.
    pub optimal_k: usize,
}

/// `kmeans` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KmeansRequest {
    /// Observation rows.
    pub data: Vec<Row>,
    /// Feature columns, in axis order.
    pub features: Vec<String>,
    /// Number of clusters.
    #[serde(default)]
    pub n_clusters: Option<usize>,
    /// Assignment metric name.
    #[serde(default)]
    pub distance_metric: Option<String>,
}

/// `kmeans` response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KmeansBody {
    /// One label per row.
    pub clusters: Vec<usize>,
    /// Selected feature values per row.
    pub plot_data: Vec<Vec<f64>>,
    /// Final centroids.
    pub centroids: Vec<Vec<f64>>,
    /// Row count per label.
    pub stats: BTreeMap<usize, usize>,
    /// Requested k.
    pub n_clusters: usize,
    /// Echo of the selected features.
    pub features: Vec<String>,
    /// Sum of squared Euclidean distances to centroids.
    pub inertia: f64,
    /// Assignment passes run.
    pub iterations: usize,
    /// Whether labels stabilized before `max_iter`.
    pub converged: bool,
}

/// `hierarchical` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchicalRequest {
    /// Observation rows.
    pub data: Vec<Row>,
    /// Feature columns, in axis order.
    pub features: Vec<String>,
    /// Number of flat clusters.
    #[serde(default)]
    pub n_clusters: Option<usize>,
    /// Linkage name.
    #[serde(default)]
    pub linkage: Option<String>,
    /// Point metric name (ward accepts only euclidean).
    #[serde(default)]
    pub distance_metric: Option<String>,
}

/// `hierarchical` response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchicalBody {
    /// One label per row.
    pub clusters: Vec<usize>,
    /// Selected feature values per row.
    pub plot_data: Vec<Vec<f64>>,
    /// Row count per label.
    pub stats: BTreeMap<usize, usize>,
    /// Where the renderer put the dendrogram, if one is installed.
    pub dendrogram_url: Option<String>,
    /// Merge tree rows `[left, right, distance, size]`.
    pub linkage_matrix: Vec<[f64; 4]>,
    /// Leaf order for drawing the tree.
    pub leaf_order: Vec<usize>,
    /// Height separating the requested clusters.
    pub color_threshold: Option<f64>,
    /// Within-cluster sum of squares of the cut, comparable with k-means inertia.
    pub within_cluster_ss: f64,
    /// Requested cluster count.
    pub n_clusters: usize,
    /// Echo of the selected features.
    pub features: Vec<String>,
}

/// Draws a merge tree somewhere and says where.
pub trait DendrogramRenderer: Send + Sync {
    /// Render `dendrogram`, highlighting the cut into `n_clusters`.
    fn render(&self, dendrogram: &Dendrogram, n_clusters: usize, linkage: Linkage) -> Result<String>;
}

/// Operations reachable through [`Engine::handle_json`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// `generate-sample`: synthetic blob table.
    GenerateSample,
    /// `elbow`: inertia sweep over k.
    Elbow,
    /// `kmeans`: flat k-means clustering.
    Kmeans,
    /// `hierarchical`: agglomerative clustering and merge tree.
    Hierarchical,
}

impl FromStr for Endpoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim_matches('/').trim_start_matches("api/") {
            "generate-sample" => Ok(Self::GenerateSample),
            "elbow" => Ok(Self::Elbow),
            "kmeans" => Ok(Self::Kmeans),
            "hierarchical" => Ok(Self::Hierarchical),
            other => Err(Error::InvalidParameter {
                name: "endpoint",
                message: format!("no endpoint '{other}'"),
            }),
        }
    }
}

/// Stateless request handler.
///
/// Each call builds its own table, matrix and model; nothing is shared
/// between requests, so one `Engine` may serve many threads.
#[derive(Default)]
pub struct Engine {
    config: EngineConfig,
    renderer: Option<Box<dyn DendrogramRenderer>>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("renderer", &self.renderer.is_some())
            .finish()
    }
}

impl Engine {
    /// Create an engine after validating `config`.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            renderer: None,
        })
    }

    /// Install a dendrogram renderer.
    pub fn with_renderer(mut self, renderer: impl DendrogramRenderer + 'static) -> Self {
        self.renderer = Some(Box::new(renderer));
        self
    }

    /// Parse an uploaded file. Only `.csv` is supported.
    pub fn upload(&self, filename: &str, bytes: &[u8]) -> Response<TableBody> {
        self.try_upload(filename, bytes).into()
    }

    fn try_upload(&self, filename: &str, bytes: &[u8]) -> Result<TableBody> {
        if !filename.to_ascii_lowercase().ends_with(".csv") {
            return Err(Error::Ingest(format!("unsupported file format: {filename}")));
        }
        let table = ObservationTable::from_csv_reader(bytes)?;
        tracing::info!(filename, rows = table.len(), "uploaded table");
        Ok(table.into())
    }

    /// Synthetic blob data for trying the engine out.
    pub fn generate_sample(&self) -> Response<TableBody> {
        let seed = self.config.seed.unwrap_or(crate::cluster::Kmeans::DEFAULT_SEED);
        sample_table(self.config.sample_rows, self.config.sample_centers, seed)
            .map(TableBody::from)
            .into()
    }

    /// Inertia sweep and elbow selection.
    pub fn elbow(&self, req: &ElbowRequest) -> Response<ElbowBody> {
        self.try_elbow(req).into()
    }

    fn try_elbow(&self, req: &ElbowRequest) -> Result<ElbowBody> {
        let data = matrix(&req.data, &req.features)?;
        let metric = self.metric(req.distance_metric.as_deref())?;
        let max_k = req.max_k.unwrap_or(self.config.max_k_cap).min(self.config.max_k_cap);
        if max_k < self.config.min_k {
            return Err(Error::InvalidKRange(format!(
                "max_k={max_k} is below the first candidate k={}",
                self.config.min_k
            )));
        }
        let k_range: Vec<usize> = (self.config.min_k..=max_k).collect();

        let curve = self.config.elbow(metric).fit(&data, &k_range)?;
        Ok(ElbowBody {
            k_values: curve.k_values(),
            inertias: curve.inertias(),
            optimal_k: curve.optimal_k,
        })
    }

    /// K-means clustering.
    pub fn kmeans(&self, req: &KmeansRequest) -> Response<KmeansBody> {
        self.try_kmeans(req).into()
    }

    fn try_kmeans(&self, req: &KmeansRequest) -> Result<KmeansBody> {
        let data = matrix(&req.data, &req.features)?;
        let metric = self.metric(req.distance_metric.as_deref())?;
        let k = req.n_clusters.unwrap_or(self.config.n_clusters);

        let fit = self.config.kmeans(k, metric).fit(&data)?;
        Ok(KmeansBody {
            stats: cluster_sizes(&fit.labels),
            centroids: fit.centroid_rows(),
            plot_data: data.to_rows(),
            n_clusters: k,
            features: req.features.clone(),
            inertia: fit.inertia,
            iterations: fit.iterations,
            converged: fit.converged(),
            clusters: fit.labels,
        })
    }

    /// Agglomerative clustering.
    pub fn hierarchical(&self, req: &HierarchicalRequest) -> Response<HierarchicalBody> {
        self.try_hierarchical(req).into()
    }

    fn try_hierarchical(&self, req: &HierarchicalRequest) -> Result<HierarchicalBody> {
        let data = matrix(&req.data, &req.features)?;
        let linkage = match req.linkage.as_deref() {
            Some(name) => name.parse()?,
            None => self.config.linkage,
        };
        let metric = match req.distance_metric.as_deref() {
            Some(name) => name.parse()?,
            None => DistanceMetric::Euclidean,
        };
        let n_clusters = req.n_clusters.unwrap_or(self.config.n_clusters);

        let fit = self
            .config
            .hierarchical(n_clusters, linkage)
            .with_metric(metric)
            .fit(&data)?;
        let dendrogram_url = match &self.renderer {
            Some(r) => Some(r.render(&fit.dendrogram, n_clusters, linkage)?),
            None => None,
        };

        Ok(HierarchicalBody {
            stats: cluster_sizes(&fit.labels),
            plot_data: data.to_rows(),
            dendrogram_url,
            linkage_matrix: fit.dendrogram.linkage_matrix(),
            leaf_order: fit.dendrogram.leaf_order(),
            color_threshold: fit.dendrogram.color_threshold(n_clusters),
            within_cluster_ss: within_cluster_ss(&data, &fit.labels)?,
            n_clusters,
            features: req.features.clone(),
            clusters: fit.labels,
        })
    }

    /// Dispatch a JSON body to `endpoint` and serialize the response.
    ///
    /// Malformed JSON and unknown endpoints produce a failure envelope.
    pub fn handle_json(&self, endpoint: &str, body: &str) -> String {
        let endpoint = match endpoint.parse::<Endpoint>() {
            Ok(e) => e,
            Err(e) => return to_json(&failure::<()>(e)),
        };
        tracing::debug!(?endpoint, bytes = body.len(), "handling request");

        match endpoint {
            Endpoint::GenerateSample => to_json(&self.generate_sample()),
            Endpoint::Elbow => to_json(&parse(body).map(|r| self.elbow(&r)).unwrap_or_else(failure)),
            Endpoint::Kmeans => to_json(&parse(body).map(|r| self.kmeans(&r)).unwrap_or_else(failure)),
            Endpoint::Hierarchical => {
                to_json(&parse(body).map(|r| self.hierarchical(&r)).unwrap_or_else(failure))
            }
        }
    }

    fn metric(&self, name: Option<&str>) -> Result<DistanceMetric> {
        match name {
            Some(name) => name.parse(),
            None => Ok(self.config.metric),
        }
    }
}

fn matrix(rows: &[Row], features: &[String]) -> Result<FeatureMatrix> {
    let table = ObservationTable::from_records(rows.to_vec())?;
    FeatureMatrix::from_table(&table, features)
}

fn parse<T: for<'de> Deserialize<'de>>(body: &str) -> Result<T> {
    Ok(serde_json::from_str(body)?)
}

fn failure<T>(e: Error) -> Response<T> {
    Response::from(Err::<T, Error>(e))
}

fn to_json<T: Serialize>(resp: &Response<T>) -> String {
    serde_json::to_string(resp).unwrap_or_else(|e| {
        format!(
            r#"{{"success":false,"error":{},"error_kind":"IngestError"}}"#,
            serde_json::Value::String(e.to_string())
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_names() {
        assert_eq!("/api/kmeans".parse::<Endpoint>().unwrap(), Endpoint::Kmeans);
        assert_eq!("generate-sample".parse::<Endpoint>().unwrap(), Endpoint::GenerateSample);
        assert!("upload".parse::<Endpoint>().is_err());
    }

    #[test]
    fn test_failure_envelope_has_no_body() {
        let resp = failure::<ElbowBody>(Error::EmptyInput);
        let v = serde_json::to_value(&resp).unwrap();
        assert_eq!(v["success"], false);
        assert_eq!(v["error_kind"], "EmptyInputError");
        assert!(v.get("k_values").is_none());
    }

    #[test]
    fn test_upload_rejects_non_csv() {
        let resp = Engine::default().upload("data.xlsx", b"a,b\n1,2\n");
        assert!(!resp.success);
        assert_eq!(resp.error_kind, Some("IngestError"));
    }
}
