//! Cluster assignment summaries.
//!
//! Counting is total over the assignment: every label that occurs appears
//! in the output. Labels that occur zero times are omitted unless asked for
//! via [`cluster_sizes_with_empty`].

use std::collections::BTreeMap;

use ndarray::{Array2, ArrayView1};
use serde::Serialize;

use crate::cluster::{inertia, mean_of};
use crate::error::{Error, Result};
use crate::matrix::FeatureMatrix;

/// Observation count per label, for labels that occur.
///
/// # Example
///
/// ```rust
/// use tabclust::stats::cluster_sizes;
///
/// let sizes = cluster_sizes(&[2, 0, 2, 2]);
/// assert_eq!(sizes.get(&0), Some(&1));
/// assert_eq!(sizes.get(&1), None);
/// assert_eq!(sizes.get(&2), Some(&3));
/// ```
pub fn cluster_sizes(labels: &[usize]) -> BTreeMap<usize, usize> {
    let mut sizes = BTreeMap::new();
    for &label in labels {
        *sizes.entry(label).or_insert(0) += 1;
    }
    sizes
}

/// Observation count for every label in `0..k`, zeros included.
///
/// Labels at or above `k` are still counted.
pub fn cluster_sizes_with_empty(labels: &[usize], k: usize) -> BTreeMap<usize, usize> {
    let mut sizes: BTreeMap<usize, usize> = (0..k).map(|c| (c, 0)).collect();
    for (label, count) in cluster_sizes(labels) {
        sizes.insert(label, count);
    }
    sizes
}

/// Size and feature-wise mean of one cluster.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterSummary {
    /// Cluster label.
    pub label: usize,
    /// Number of observations.
    pub size: usize,
    /// Mean of each feature column over the members.
    pub mean: Vec<f64>,
}

/// Per-cluster size and mean, in label order (empty labels omitted).
pub fn summarize(data: &FeatureMatrix, labels: &[usize]) -> Result<Vec<ClusterSummary>> {
    if labels.len() != data.nrows() {
        return Err(Error::DimensionMismatch {
            expected: data.nrows(),
            found: labels.len(),
        });
    }

    let summaries = cluster_sizes(labels)
        .into_iter()
        .map(|(label, size)| {
            let members = labels.iter().enumerate().filter(|&(_, &l)| l == label).map(|(i, _)| i);
            ClusterSummary {
                label,
                size,
                mean: mean_of(data, members).to_vec(),
            }
        })
        .collect();
    Ok(summaries)
}

/// Within-cluster sum of squares of an arbitrary assignment.
///
/// For hierarchical cuts this makes their compactness comparable with
/// k-means inertia.
pub fn within_cluster_ss(data: &FeatureMatrix, labels: &[usize]) -> Result<f64> {
    let summaries = summarize(data, labels)?;
    let k = summaries.last().map_or(0, |s| s.label + 1);
    let mut centroids = Array2::<f64>::zeros((k, data.ncols()));
    for s in &summaries {
        centroids.row_mut(s.label).assign(&ArrayView1::from(&s.mean[..]));
    }
    Ok(inertia(data, &centroids, labels))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizes_omit_empty_labels() {
        let sizes = cluster_sizes(&[0, 0, 3]);
        assert_eq!(sizes.into_iter().collect::<Vec<_>>(), vec![(0, 2), (3, 1)]);
    }

    #[test]
    fn test_sizes_with_empty() {
        let sizes = cluster_sizes_with_empty(&[0, 0, 3], 4);
        assert_eq!(
            sizes.into_iter().collect::<Vec<_>>(),
            vec![(0, 2), (1, 0), (2, 0), (3, 1)]
        );
    }

    #[test]
    fn test_sizes_sum_to_n() {
        let labels = [1, 2, 1, 0, 2, 2];
        assert_eq!(cluster_sizes(&labels).values().sum::<usize>(), labels.len());
    }

    #[test]
    fn test_summarize_and_wcss() {
        let data = FeatureMatrix::from_rows(&[
            vec![0.0, 0.0],
            vec![0.0, 1.0],
            vec![10.0, 10.0],
            vec![10.0, 11.0],
        ])
        .unwrap();
        let labels = [0, 0, 1, 1];
        let s = summarize(&data, &labels).unwrap();
        assert_eq!(s[0], ClusterSummary { label: 0, size: 2, mean: vec![0.0, 0.5] });
        assert_eq!(s[1].mean, vec![10.0, 10.5]);
        assert!((within_cluster_ss(&data, &labels).unwrap() - 1.0).abs() < 1e-12);
        assert!(summarize(&data, &[0, 1]).is_err());
    }
}
