//! K-means clustering.
//!
//! Partitions data into k clusters by minimizing **within-cluster sum of squares**
//! (WCSS, reported as *inertia*).
//!
//! # Lloyd's Algorithm
//!
//! 1. Initialize k centroids by sampling k distinct observations
//! 2. **Assign**: each point → nearest centroid under the configured metric
//! 3. **Update**: each centroid → arithmetic mean of its assigned points
//! 4. Repeat until no label changes, or `max_iter` assignments have run
//!
//! The update step is always the Euclidean mean, whatever metric drives the
//! assignment. Inertia is always squared Euclidean, so elbow curves computed
//! under different metrics stay comparable.
//!
//! # Initialization
//!
//! Centroids start at `k` distinct observations chosen by k-means++ sampling
//! driven by `StdRng::seed_from_u64(seed)`:
//!
//! 1. Choose the first observation uniformly at random
//! 2. Choose each next one with probability proportional to D(x)², the
//!    squared Euclidean distance to the nearest centroid chosen so far
//!
//! Chosen observations have D(x)² = 0 and are never drawn twice. When every
//! remaining weight is zero (duplicates) the next pick is uniform over the
//! unchosen indices. With a seed the whole run is deterministic;
//! [`Kmeans::unseeded`] draws from the thread RNG instead.
//!
//! # Empty clusters
//!
//! A centroid left without points is moved onto the observation lying
//! farthest from its own centroid (assignment metric, ties to the lowest
//! index). Several empty clusters take successive farthest observations.

use ndarray::{Array1, Array2};
use rand::prelude::*;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::traits::Clustering;
use crate::distance::{squared_euclidean, DistanceMetric};
use crate::error::{Error, Result};
use crate::matrix::FeatureMatrix;

/// Why a k-means run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// An assignment pass changed no label.
    Converged,
    /// `max_iter` assignment passes ran without stabilizing.
    MaxIterReached,
}

/// Result of a k-means run.
#[derive(Debug, Clone, PartialEq)]
pub struct KmeansFit {
    /// Final centroids, row `c` for label `c`.
    pub centroids: Array2<f64>,
    /// One label in `0..k` per observation.
    pub labels: Vec<usize>,
    /// Sum of squared Euclidean distances to the assigned centroid.
    pub inertia: f64,
    /// Assignment passes performed.
    pub iterations: usize,
    /// Stop condition.
    pub stop: StopReason,
}

impl KmeansFit {
    /// Whether the run converged before `max_iter`.
    pub fn converged(&self) -> bool {
        self.stop == StopReason::Converged
    }

    /// Centroids as nested vectors.
    pub fn centroid_rows(&self) -> Vec<Vec<f64>> {
        self.centroids.rows().into_iter().map(|r| r.to_vec()).collect()
    }
}

/// K-means clustering algorithm.
#[derive(Debug, Clone)]
pub struct Kmeans {
    /// Number of clusters.
    k: usize,
    /// Assignment metric.
    metric: DistanceMetric,
    /// Maximum assignment passes.
    max_iter: usize,
    /// Random seed; `None` draws from the thread RNG.
    seed: Option<u64>,
}

impl Kmeans {
    /// Default seed used unless one is given.
    pub const DEFAULT_SEED: u64 = 42;

    /// Create a new K-means clusterer.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            metric: DistanceMetric::Euclidean,
            max_iter: 300,
            seed: Some(Self::DEFAULT_SEED),
        }
    }

    /// Set the assignment metric.
    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Set maximum iterations.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Initialize from the thread RNG. Runs are no longer reproducible.
    pub fn unseeded(mut self) -> Self {
        self.seed = None;
        self
    }

    fn validate(&self, n: usize) -> Result<()> {
        if n == 0 {
            return Err(Error::EmptyInput);
        }
        if self.k == 0 || self.k > n {
            return Err(Error::InvalidK { k: self.k, n_items: n });
        }
        if self.max_iter == 0 {
            return Err(Error::InvalidParameter {
                name: "max_iter",
                message: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Pick k distinct observations as starting centroids (k-means++).
    fn init_centroids(&self, data: &FeatureMatrix, rng: &mut impl Rng) -> Array2<f64> {
        let n = data.nrows();
        let mut centroids = Array2::zeros((self.k, data.ncols()));
        let mut chosen = vec![false; n];

        let first = rng.random_range(0..n);
        chosen[first] = true;
        centroids.row_mut(0).assign(&data.row(first));

        // Squared distance from each point to its nearest chosen centroid.
        let mut weights: Vec<f64> = (0..n)
            .map(|j| squared_euclidean(data.row(j), data.row(first)))
            .collect();
        weights[first] = 0.0;

        for c in 1..self.k {
            let total: f64 = weights.iter().sum();
            let selected = if total > 0.0 {
                let threshold = rng.random::<f64>() * total;
                let mut cumsum = 0.0;
                let mut selected = None;
                for (j, &w) in weights.iter().enumerate() {
                    if w == 0.0 {
                        continue;
                    }
                    cumsum += w;
                    selected = Some(j);
                    if cumsum > threshold {
                        break;
                    }
                }
                selected
            } else {
                None
            };
            let selected = match selected {
                Some(j) => j,
                None => {
                    let open: Vec<usize> = (0..n).filter(|&j| !chosen[j]).collect();
                    open[rng.random_range(0..open.len())]
                }
            };

            chosen[selected] = true;
            centroids.row_mut(c).assign(&data.row(selected));
            for (j, w) in weights.iter_mut().enumerate() {
                *w = if chosen[j] {
                    0.0
                } else {
                    w.min(squared_euclidean(data.row(j), data.row(selected)))
                };
            }
        }

        centroids
    }

    /// Nearest centroid for one point; ties go to the lowest label.
    #[inline]
    fn nearest(&self, point: ndarray::ArrayView1<'_, f64>, centroids: &Array2<f64>) -> usize {
        let mut best_cluster = 0;
        let mut best_dist = f64::INFINITY;
        for (c, centroid) in centroids.rows().into_iter().enumerate() {
            let dist = self.metric.distance(point, centroid);
            if dist < best_dist {
                best_dist = dist;
                best_cluster = c;
            }
        }
        best_cluster
    }

    fn assign(&self, data: &FeatureMatrix, centroids: &Array2<f64>) -> Vec<usize> {
        #[cfg(feature = "parallel")]
        {
            (0..data.nrows())
                .into_par_iter()
                .map(|i| self.nearest(data.row(i), centroids))
                .collect()
        }

        #[cfg(not(feature = "parallel"))]
        {
            (0..data.nrows())
                .map(|i| self.nearest(data.row(i), centroids))
                .collect()
        }
    }

    /// Mean of each cluster; empty clusters are reseeded from far points.
    fn update(&self, data: &FeatureMatrix, labels: &[usize], previous: &Array2<f64>) -> Array2<f64> {
        let d = data.ncols();
        let mut sums = Array2::<f64>::zeros((self.k, d));
        let mut counts = vec![0usize; self.k];

        for (i, &c) in labels.iter().enumerate() {
            let mut row = sums.row_mut(c);
            row += &data.row(i);
            counts[c] += 1;
        }

        let empty: Vec<usize> = (0..self.k).filter(|&c| counts[c] == 0).collect();
        for (c, &count) in counts.iter().enumerate() {
            if count > 0 {
                sums.row_mut(c).mapv_inplace(|v| v / count as f64);
            }
        }

        if !empty.is_empty() {
            // Farthest first, lowest index on ties.
            let mut far: Vec<(usize, f64)> = labels
                .iter()
                .enumerate()
                .map(|(i, &c)| (i, self.metric.distance(data.row(i), previous.row(c))))
                .collect();
            far.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

            for (&c, &(i, dist)) in empty.iter().zip(far.iter()) {
                tracing::warn!(cluster = c, observation = i, distance = dist, "reseeding empty cluster");
                sums.row_mut(c).assign(&data.row(i));
            }
        }

        sums
    }

    /// Fit and return centroids, labels, inertia and stop reason.
    pub fn fit(&self, data: &FeatureMatrix) -> Result<KmeansFit> {
        let n = data.nrows();
        self.validate(n)?;

        let mut rng: Box<dyn RngCore> = match self.seed {
            Some(s) => Box::new(StdRng::seed_from_u64(s)),
            None => Box::new(rand::rng()),
        };

        let mut centroids = self.init_centroids(data, &mut rng);
        let mut labels: Vec<usize> = Vec::new();
        let mut stop = StopReason::MaxIterReached;
        let mut iterations = 0;

        for iter in 1..=self.max_iter {
            iterations = iter;
            let next = self.assign(data, &centroids);
            if next == labels {
                stop = StopReason::Converged;
                break;
            }
            labels = next;
            centroids = self.update(data, &labels, &centroids);
            tracing::debug!(iter, k = self.k, "k-means pass");
        }

        let inertia = inertia(data, &centroids, &labels);
        tracing::info!(
            k = self.k,
            metric = %self.metric,
            iterations,
            converged = stop == StopReason::Converged,
            inertia,
            "k-means finished"
        );

        Ok(KmeansFit {
            centroids,
            labels,
            inertia,
            iterations,
            stop,
        })
    }
}

/// Sum of squared Euclidean distances from each point to its centroid.
pub fn inertia(data: &FeatureMatrix, centroids: &Array2<f64>, labels: &[usize]) -> f64 {
    labels
        .iter()
        .enumerate()
        .map(|(i, &c)| squared_euclidean(data.row(i), centroids.row(c)))
        .sum()
}

/// Coordinate-wise mean of a set of rows.
pub(crate) fn mean_of(data: &FeatureMatrix, members: impl IntoIterator<Item = usize>) -> Array1<f64> {
    let mut sum = Array1::<f64>::zeros(data.ncols());
    let mut count = 0usize;
    for i in members {
        sum += &data.row(i);
        count += 1;
    }
    if count > 0 {
        sum.mapv_inplace(|v| v / count as f64);
    }
    sum
}

impl Clustering for Kmeans {
    fn fit_predict(&self, data: &FeatureMatrix) -> Result<Vec<usize>> {
        Ok(self.fit(data)?.labels)
    }

    fn n_clusters(&self) -> usize {
        self.k
    }
}
