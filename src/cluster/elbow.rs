//! Choosing k with the elbow method.
//!
//! Runs k-means for every candidate k, records the inertia of each run, and
//! picks the point of diminishing returns on the inertia-vs-k curve.
//!
//! # Chord distance
//!
//! Draw the chord from the first point `(k₁, I₁)` to the last `(kₙ, Iₙ)`.
//! The elbow is the interior point farthest (perpendicular distance) from
//! that chord:
//!
//! ```text
//! dist(i) = |Δk·(Iᵢ - I₁) - ΔI·(kᵢ - k₁)| / sqrt(Δk² + ΔI²)
//! ```
//!
//! Rescaling either axis multiplies every distance by the same factor, so the
//! argmax does not depend on the units of inertia.
//!
//! With fewer than three candidates there is no interior point and the
//! heuristic is undefined; the candidate with minimum inertia is chosen
//! instead and [`ElbowMethod::MinimumInertia`] is reported.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::kmeans::Kmeans;
use crate::distance::DistanceMetric;
use crate::error::{Error, Result};
use crate::matrix::FeatureMatrix;

/// How the optimal k was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElbowMethod {
    /// Maximum perpendicular distance from the first-to-last chord.
    ChordDistance,
    /// Fewer than three candidates: minimum inertia.
    MinimumInertia,
}

/// Inertia per candidate k, plus the chosen k.
#[derive(Debug, Clone, PartialEq)]
pub struct ElbowCurve {
    /// `(k, inertia)` in candidate order.
    pub points: Vec<(usize, f64)>,
    /// Selected cluster count.
    pub optimal_k: usize,
    /// Selection rule that produced `optimal_k`.
    pub method: ElbowMethod,
}

impl ElbowCurve {
    /// Candidate k values.
    pub fn k_values(&self) -> Vec<usize> {
        self.points.iter().map(|&(k, _)| k).collect()
    }

    /// Inertias aligned with [`ElbowCurve::k_values`].
    pub fn inertias(&self) -> Vec<f64> {
        self.points.iter().map(|&(_, i)| i).collect()
    }
}

/// Sweeps k-means over candidate k values.
#[derive(Debug, Clone)]
pub struct ElbowSelector {
    metric: DistanceMetric,
    max_iter: usize,
    seed: Option<u64>,
}

impl Default for ElbowSelector {
    fn default() -> Self {
        Self::new(DistanceMetric::Euclidean)
    }
}

impl ElbowSelector {
    /// Create a selector using `metric` for k-means assignment.
    pub fn new(metric: DistanceMetric) -> Self {
        Self {
            metric,
            max_iter: 300,
            seed: Some(Kmeans::DEFAULT_SEED),
        }
    }

    /// Set maximum iterations of each k-means run.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set the seed shared by every run in the sweep.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Use unseeded k-means runs.
    pub fn unseeded(mut self) -> Self {
        self.seed = None;
        self
    }

    fn kmeans(&self, k: usize) -> Kmeans {
        let km = Kmeans::new(k).with_metric(self.metric).with_max_iter(self.max_iter);
        match self.seed {
            Some(s) => km.with_seed(s),
            None => km.unseeded(),
        }
    }

    /// Run the sweep and select k.
    pub fn fit(&self, data: &FeatureMatrix, k_range: &[usize]) -> Result<ElbowCurve> {
        let n = data.nrows();
        if n == 0 {
            return Err(Error::EmptyInput);
        }
        if k_range.is_empty() {
            return Err(Error::InvalidKRange("no candidate k values".into()));
        }
        if let Some(&bad) = k_range.iter().find(|&&k| k < 1 || k > n) {
            return Err(Error::InvalidKRange(format!(
                "k={bad} outside [1, {n}]"
            )));
        }

        #[cfg(feature = "parallel")]
        let inertias: Result<Vec<f64>> = k_range
            .par_iter()
            .map(|&k| self.kmeans(k).fit(data).map(|fit| fit.inertia))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let inertias: Result<Vec<f64>> = k_range
            .iter()
            .map(|&k| self.kmeans(k).fit(data).map(|fit| fit.inertia))
            .collect();

        let points: Vec<(usize, f64)> = k_range.iter().copied().zip(inertias?).collect();
        let (optimal_k, method) = elbow_point(&points)?;

        tracing::info!(
            candidates = points.len(),
            optimal_k,
            method = ?method,
            "elbow sweep finished"
        );

        Ok(ElbowCurve {
            points,
            optimal_k,
            method,
        })
    }
}

/// Pick k from an inertia curve.
///
/// Three or more points use the chord-distance rule; fewer use minimum
/// inertia. Ties go to the earliest point.
///
/// # Example
///
/// ```rust
/// use tabclust::cluster::{elbow_point, ElbowMethod};
///
/// let curve = [(1, 100.0), (2, 40.0), (3, 30.0), (4, 28.0), (5, 27.0)];
/// assert_eq!(elbow_point(&curve).unwrap(), (2, ElbowMethod::ChordDistance));
/// ```
pub fn elbow_point(points: &[(usize, f64)]) -> Result<(usize, ElbowMethod)> {
    match points {
        [] => Err(Error::InvalidKRange("no candidate k values".into())),
        [_] | [_, _] => {
            let mut best = points[0];
            for &p in &points[1..] {
                if p.1 < best.1 {
                    best = p;
                }
            }
            Ok((best.0, ElbowMethod::MinimumInertia))
        }
        [first, .., last] => {
            let (k1, i1) = (first.0 as f64, first.1);
            let dk = last.0 as f64 - k1;
            let di = last.1 - i1;
            let norm = (dk * dk + di * di).sqrt();

            let mut best = (points[1].0, f64::NEG_INFINITY);
            for &(k, inertia) in &points[1..points.len() - 1] {
                let cross = dk * (inertia - i1) - di * (k as f64 - k1);
                let dist = if norm > 0.0 { cross.abs() / norm } else { 0.0 };
                if dist > best.1 {
                    best = (k, dist);
                }
            }
            Ok((best.0, ElbowMethod::ChordDistance))
        }
    }
}

/// Sweep `k_range` with default settings under `metric`.
pub fn find_optimal_k(
    data: &FeatureMatrix,
    metric: DistanceMetric,
    k_range: &[usize],
) -> Result<ElbowCurve> {
    ElbowSelector::new(metric).fit(data, k_range)
}
