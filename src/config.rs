//! Request-layer defaults.
//!
//! Algorithms are configured with builders (`Kmeans::new(k).with_seed(..)`);
//! [`EngineConfig`] holds the defaults the request layer applies when a
//! request omits a field. It deserializes from JSON with every field optional.

use serde::{Deserialize, Serialize};

use crate::cluster::{ElbowSelector, HierarchicalClustering, Kmeans, Linkage};
use crate::distance::DistanceMetric;
use crate::error::{Error, Result};

/// Defaults for the request/response layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum k-means assignment passes.
    pub max_iter: usize,
    /// Seed for k-means initialization; `None` runs unseeded.
    pub seed: Option<u64>,
    /// Upper bound applied to a requested `max_k`.
    pub max_k_cap: usize,
    /// First k of the elbow sweep.
    pub min_k: usize,
    /// `n_clusters` when a request omits it.
    pub n_clusters: usize,
    /// Metric when a request omits `distance_metric`.
    pub metric: DistanceMetric,
    /// Linkage when a request omits `linkage`.
    pub linkage: Linkage,
    /// Rows in the generated sample table.
    pub sample_rows: usize,
    /// Blob centres in the generated sample table.
    pub sample_centers: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_iter: 300,
            seed: Some(Kmeans::DEFAULT_SEED),
            max_k_cap: 10,
            min_k: 1,
            n_clusters: 3,
            metric: DistanceMetric::Euclidean,
            linkage: Linkage::Ward,
            sample_rows: 150,
            sample_centers: 4,
        }
    }
}

impl EngineConfig {
    /// Parse from JSON; missing fields take defaults.
    pub fn from_json(s: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no request could succeed with.
    pub fn validate(&self) -> Result<()> {
        if self.max_iter == 0 {
            return Err(Error::InvalidParameter {
                name: "max_iter",
                message: "must be at least 1".into(),
            });
        }
        if self.min_k == 0 || self.min_k > self.max_k_cap {
            return Err(Error::InvalidParameter {
                name: "min_k",
                message: format!("must lie in [1, max_k_cap={}]", self.max_k_cap),
            });
        }
        if self.sample_centers == 0 || self.sample_rows < self.sample_centers {
            return Err(Error::InvalidParameter {
                name: "sample_rows",
                message: "need at least one row per sample centre".into(),
            });
        }
        Ok(())
    }

    /// A k-means runner with these defaults.
    pub fn kmeans(&self, k: usize, metric: DistanceMetric) -> Kmeans {
        let km = Kmeans::new(k).with_metric(metric).with_max_iter(self.max_iter);
        match self.seed {
            Some(s) => km.with_seed(s),
            None => km.unseeded(),
        }
    }

    /// An elbow selector with these defaults.
    pub fn elbow(&self, metric: DistanceMetric) -> ElbowSelector {
        let sel = ElbowSelector::new(metric).with_max_iter(self.max_iter);
        match self.seed {
            Some(s) => sel.with_seed(s),
            None => sel.unseeded(),
        }
    }

    /// A hierarchical clusterer.
    pub fn hierarchical(&self, n_clusters: usize, linkage: Linkage) -> HierarchicalClustering {
        HierarchicalClustering::new(n_clusters).with_linkage(linkage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EngineConfig::from_json(r#"{"max_k_cap": 6, "metric": "Manhattan", "seed": null}"#).unwrap();
        assert_eq!(config.max_k_cap, 6);
        assert_eq!(config.metric, DistanceMetric::Manhattan);
        assert_eq!(config.seed, None);
        assert_eq!(config.max_iter, 300);
        assert_eq!(config.linkage, Linkage::Ward);
    }

    #[test]
    fn test_invalid_config() {
        assert!(EngineConfig::from_json(r#"{"max_iter": 0}"#).is_err());
        assert!(EngineConfig::from_json(r#"{"min_k": 11}"#).is_err());
        assert!(EngineConfig::from_json(r#"{"metric": "hamming"}"#).is_err());
    }
}
