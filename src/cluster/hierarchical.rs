//! Hierarchical (agglomerative) clustering.
//!
//! Bottom-up clustering that builds a **dendrogram** by iteratively
//! merging the closest clusters. Unlike K-means you don't need to
//! specify k in advance; cut the tree at any cluster count.
//!
//! # Linkage Methods
//!
//! The key choice: how do we define "distance between clusters"?
//!
//! | Linkage | Formula | Effect |
//! |---------|---------|--------|
//! | Single | min(d(a,b)) for a∈A, b∈B | Chaining; elongated clusters |
//! | Complete | max(d(a,b)) | Compact, spherical clusters |
//! | Average | mean(d(a,b)) | Balanced compromise |
//! | Ward | Δ SSE | Minimizes within-cluster variance |
//!
//! Single, complete and average work with any [`DistanceMetric`] and are
//! maintained with Lance–Williams updates, which reproduce the min / max /
//! size-weighted mean of the member-pair distances exactly.
//!
//! ## Ward's Method
//!
//! The merge distance is the increase in total within-cluster sum of
//! squares caused by merging A and B:
//!
//! ```text
//! Δ(A,B) = (nₐ × nᵦ)/(nₐ + nᵦ) × ||μₐ - μᵦ||²
//! ```
//!
//! This needs Euclidean geometry; any other metric is rejected.
//!
//! # Determinism
//!
//! Among equidistant candidate pairs the one with the lexicographically
//! smallest `(left id, right id)` merges first, so identical input always
//! yields the identical tree.
//!
//! Lance–Williams updates accumulate rounding differently from a direct
//! min / max / mean over member pairs, so two distances that are equal in
//! exact arithmetic can differ in the last bits. Distances within a relative
//! `1e-12` of each other count as equal before the id tie-break.
//!
//! # Cost
//!
//! O(n²) memory for the distance matrix and O(n³) time for the naive
//! closest-pair scan; intended for interactively sized tables.

use std::fmt;
use std::str::FromStr;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use super::traits::Clustering;
use crate::distance::{squared_euclidean, DistanceMetric};
use crate::error::{Error, Result};
use crate::hierarchy::Dendrogram;
use crate::matrix::FeatureMatrix;

/// Linkage method for hierarchical clustering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Linkage {
    /// Single linkage: minimum distance between clusters.
    Single,
    /// Complete linkage: maximum distance between clusters.
    Complete,
    /// Average linkage: mean distance between clusters.
    Average,
    /// Ward's method: minimize within-cluster variance.
    #[default]
    Ward,
}

impl Linkage {
    /// Canonical lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Linkage::Single => "single",
            Linkage::Complete => "complete",
            Linkage::Average => "average",
            Linkage::Ward => "ward",
        }
    }

    /// Whether this linkage accepts `metric`.
    pub fn supports(self, metric: DistanceMetric) -> bool {
        self != Linkage::Ward || metric == DistanceMetric::Euclidean
    }
}

impl fmt::Display for Linkage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Linkage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(Self::Single),
            "complete" => Ok(Self::Complete),
            "average" => Ok(Self::Average),
            "ward" => Ok(Self::Ward),
            other => Err(Error::InvalidParameter {
                name: "linkage",
                message: format!("unsupported linkage '{other}'"),
            }),
        }
    }
}

impl TryFrom<String> for Linkage {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Linkage> for String {
    fn from(l: Linkage) -> Self {
        l.name().to_string()
    }
}

/// Merge tree plus the flat cut requested.
#[derive(Debug, Clone, PartialEq)]
pub struct HierarchicalFit {
    /// Full merge history (N - 1 merges).
    pub dendrogram: Dendrogram,
    /// One label per observation, `0..n_clusters` by first appearance.
    pub labels: Vec<usize>,
}

/// Hierarchical (agglomerative) clustering.
#[derive(Debug, Clone)]
pub struct HierarchicalClustering {
    /// Number of clusters to produce.
    n_clusters: usize,
    /// Linkage method.
    linkage: Linkage,
    /// Point-to-point metric.
    metric: DistanceMetric,
}

impl HierarchicalClustering {
    /// Create a new hierarchical clusterer.
    pub fn new(n_clusters: usize) -> Self {
        Self {
            n_clusters,
            linkage: Linkage::Ward,
            metric: DistanceMetric::Euclidean,
        }
    }

    /// Set linkage method.
    pub fn with_linkage(mut self, linkage: Linkage) -> Self {
        self.linkage = linkage;
        self
    }

    /// Set the point-to-point metric.
    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    fn check_linkage(&self) -> Result<()> {
        if !self.linkage.supports(self.metric) {
            return Err(Error::IncompatibleLinkage {
                linkage: self.linkage.name(),
                metric: self.metric.name(),
            });
        }
        Ok(())
    }

    /// Fit the full tree and cut it at `n_clusters`.
    pub fn fit(&self, data: &FeatureMatrix) -> Result<HierarchicalFit> {
        let n = data.nrows();
        if n == 0 {
            return Err(Error::EmptyInput);
        }
        if self.n_clusters == 0 || self.n_clusters > n {
            return Err(Error::InvalidNClusters {
                requested: self.n_clusters,
                n_items: n,
            });
        }
        self.check_linkage()?;

        let dendrogram = self.fit_dendrogram(data)?;
        let labels = dendrogram.cut_to_k(self.n_clusters)?;
        Ok(HierarchicalFit { dendrogram, labels })
    }

    /// Fit and return the full dendrogram.
    pub fn fit_dendrogram(&self, data: &FeatureMatrix) -> Result<Dendrogram> {
        let n = data.nrows();
        if n == 0 {
            return Err(Error::EmptyInput);
        }
        self.check_linkage()?;

        // Slot i holds one live cluster; `ids[i]` is its current cluster id.
        let mut ids: Vec<usize> = (0..n).collect();
        let mut sizes = vec![1usize; n];
        let mut live = vec![true; n];
        let mut centroids: Vec<Array1<f64>> = match self.linkage {
            Linkage::Ward => (0..n).map(|i| data.row(i).to_owned()).collect(),
            _ => Vec::new(),
        };

        let mut dist = Array2::<f64>::zeros((n, n));
        for i in 0..n {
            for j in (i + 1)..n {
                let d = match self.linkage {
                    Linkage::Ward => 0.5 * squared_euclidean(data.row(i), data.row(j)),
                    _ => self.metric.distance(data.row(i), data.row(j)),
                };
                dist[[i, j]] = d;
                dist[[j, i]] = d;
            }
        }

        let mut dendro = Dendrogram::new(n);
        for step in 0..n.saturating_sub(1) {
            let (a, b, d) = closest_pair(&dist, &ids, &live);
            let (na, nb) = (sizes[a], sizes[b]);
            let merged = na + nb;

            // Fold b into a and refresh a's row.
            for k in (0..n).filter(|&k| live[k] && k != a && k != b) {
                let updated = match self.linkage {
                    Linkage::Single => dist[[a, k]].min(dist[[b, k]]),
                    Linkage::Complete => dist[[a, k]].max(dist[[b, k]]),
                    Linkage::Average => {
                        (na as f64 * dist[[a, k]] + nb as f64 * dist[[b, k]]) / merged as f64
                    }
                    Linkage::Ward => continue,
                };
                dist[[a, k]] = updated;
                dist[[k, a]] = updated;
            }
            if self.linkage == Linkage::Ward {
                let mean = (&centroids[a] * na as f64 + &centroids[b] * nb as f64) / merged as f64;
                centroids[a] = mean;
                for k in (0..n).filter(|&k| live[k] && k != a && k != b) {
                    let nk = sizes[k] as f64;
                    let m = merged as f64;
                    let updated = (m * nk) / (m + nk)
                        * squared_euclidean(centroids[a].view(), centroids[k].view());
                    dist[[a, k]] = updated;
                    dist[[k, a]] = updated;
                }
            }

            dendro.add_merge(ids[a], ids[b], d, merged);
            tracing::trace!(step, left = ids[a].min(ids[b]), right = ids[a].max(ids[b]), distance = d, "merge");

            ids[a] = n + step;
            sizes[a] = merged;
            live[b] = false;
        }

        tracing::info!(
            n_items = n,
            linkage = %self.linkage,
            metric = %self.metric,
            "agglomerative clustering finished"
        );
        Ok(dendro)
    }
}

/// Relative difference below which two linkage distances are a tie.
const TIE_TOLERANCE: f64 = 1e-12;

fn is_tie(a: f64, b: f64) -> bool {
    (a - b).abs() <= TIE_TOLERANCE * a.abs().max(b.abs())
}

/// Closest live pair `(slot_a, slot_b, distance)`.
///
/// Ties (see [`is_tie`]) resolve to the smallest `(min id, max id)` over
/// cluster ids.
fn closest_pair(dist: &Array2<f64>, ids: &[usize], live: &[bool]) -> (usize, usize, f64) {
    let n = ids.len();
    let mut best: Option<(usize, usize, f64, (usize, usize))> = None;
    for i in (0..n).filter(|&i| live[i]) {
        for j in ((i + 1)..n).filter(|&j| live[j]) {
            let d = dist[[i, j]];
            let key = (ids[i].min(ids[j]), ids[i].max(ids[j]));
            let better = match best {
                None => true,
                Some((_, _, bd, bkey)) if is_tie(d, bd) => key < bkey,
                Some((_, _, bd, _)) => d < bd,
            };
            if better {
                best = Some((i, j, d, key));
            }
        }
    }
    // n >= 2 live slots whenever this is called.
    best.map(|(i, j, d, _)| (i, j, d)).unwrap_or((0, 0, 0.0))
}

impl Clustering for HierarchicalClustering {
    fn fit_predict(&self, data: &FeatureMatrix) -> Result<Vec<usize>> {
        Ok(self.fit(data)?.labels)
    }

    fn n_clusters(&self) -> usize {
        self.n_clusters
    }
}
