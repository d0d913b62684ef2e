//! Clustering traits.

use crate::error::Result;
use crate::matrix::FeatureMatrix;

/// Trait for hard clustering algorithms.
pub trait Clustering {
    /// Fit the model to data and return cluster assignments.
    ///
    /// Returns a vector of cluster labels, one per input row.
    fn fit_predict(&self, data: &FeatureMatrix) -> Result<Vec<usize>>;

    /// Get the number of clusters.
    fn n_clusters(&self) -> usize;
}
