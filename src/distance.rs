//! Distance metrics between feature vectors.
//!
//! Both clustering engines take a [`DistanceMetric`] and use it for every
//! point-to-point or point-to-centroid comparison. Metrics are identified by
//! name (case-insensitive) so request layers can pass them through as strings.
//!
//! | Name | Formula |
//! |------|---------|
//! | `euclidean` | sqrt(Σ (aᵢ - bᵢ)²) |
//! | `manhattan` | Σ \|aᵢ - bᵢ\| |
//! | `cosine` | 1 - a·b / (\|a\| \|b\|) |
//! | `chebyshev` | max \|aᵢ - bᵢ\| |
//!
//! # Cosine and the zero vector
//!
//! Cosine similarity is undefined when either vector has zero norm. Rather
//! than failing, cosine distance returns a fixed sentinel:
//!
//! - both vectors zero: `0.0` (the vectors are equal)
//! - exactly one vector zero: `1.0` (similarity taken as 0)
//!
//! The result is clamped to `[0, 2]` so rounding never yields a negative distance.

use std::fmt;
use std::str::FromStr;

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A registered distance metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DistanceMetric {
    /// L2 distance.
    #[default]
    Euclidean,
    /// L1 distance.
    Manhattan,
    /// One minus cosine similarity.
    Cosine,
    /// L∞ distance.
    Chebyshev,
}

impl DistanceMetric {
    /// All registered metrics.
    pub const ALL: [DistanceMetric; 4] = [
        DistanceMetric::Euclidean,
        DistanceMetric::Manhattan,
        DistanceMetric::Cosine,
        DistanceMetric::Chebyshev,
    ];

    /// Canonical lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            DistanceMetric::Euclidean => "euclidean",
            DistanceMetric::Manhattan => "manhattan",
            DistanceMetric::Cosine => "cosine",
            DistanceMetric::Chebyshev => "chebyshev",
        }
    }

    /// Distance between two rows of equal length.
    ///
    /// Callers guarantee equal dimensions; use [`DistanceMetric::try_distance`]
    /// for unchecked input.
    #[inline]
    pub fn distance(self, a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
        debug_assert_eq!(a.len(), b.len());
        match self {
            DistanceMetric::Euclidean => squared_euclidean(a, b).sqrt(),
            DistanceMetric::Manhattan => a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).sum(),
            DistanceMetric::Cosine => cosine(a, b),
            DistanceMetric::Chebyshev => a
                .iter()
                .zip(b.iter())
                .map(|(x, y)| (x - y).abs())
                .fold(0.0, f64::max),
        }
    }

    /// Distance between two slices, checking dimensions.
    pub fn try_distance(self, a: &[f64], b: &[f64]) -> Result<f64> {
        if a.len() != b.len() {
            return Err(Error::DimensionMismatch {
                expected: a.len(),
                found: b.len(),
            });
        }
        Ok(self.distance(ArrayView1::from(a), ArrayView1::from(b)))
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DistanceMetric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "euclidean" | "l2" => Ok(Self::Euclidean),
            "manhattan" | "l1" | "cityblock" => Ok(Self::Manhattan),
            "cosine" => Ok(Self::Cosine),
            "chebyshev" => Ok(Self::Chebyshev),
            _ => Err(Error::UnknownMetric(s.to_string())),
        }
    }
}

impl TryFrom<String> for DistanceMetric {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<DistanceMetric> for String {
    fn from(m: DistanceMetric) -> Self {
        m.name().to_string()
    }
}

/// Distance between `a` and `b` under the metric registered as `name`.
///
/// # Example
///
/// ```rust
/// use tabclust::distance::distance;
///
/// let d = distance("manhattan", &[0.0, 0.0], &[3.0, 4.0]).unwrap();
/// assert_eq!(d, 7.0);
/// assert!(distance("hamming", &[0.0], &[1.0]).is_err());
/// ```
pub fn distance(name: &str, a: &[f64], b: &[f64]) -> Result<f64> {
    name.parse::<DistanceMetric>()?.try_distance(a, b)
}

/// Squared Euclidean distance. Inertia and Ward linkage are defined on it
/// regardless of the configured metric.
#[inline]
pub fn squared_euclidean(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

fn cosine(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    let (aa, bb, ab) = a
        .iter()
        .zip(b.iter())
        .fold((0.0, 0.0, 0.0), |(aa, bb, ab), (&x, &y)| {
            (aa + x * x, bb + y * y, ab + x * y)
        });

    match (aa == 0.0, bb == 0.0) {
        (true, true) => 0.0,
        (true, false) | (false, true) => 1.0,
        (false, false) => (1.0 - ab / (aa.sqrt() * bb.sqrt())).clamp(0.0, 2.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_metrics() {
        let a = [1.0, 2.0, 3.0];
        let b = [4.0, 6.0, 3.0];
        assert!((distance("euclidean", &a, &b).unwrap() - 5.0).abs() < 1e-12);
        assert!((distance("manhattan", &a, &b).unwrap() - 7.0).abs() < 1e-12);
        assert!((distance("chebyshev", &a, &b).unwrap() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_names_are_case_insensitive() {
        assert_eq!("Euclidean".parse::<DistanceMetric>().unwrap(), DistanceMetric::Euclidean);
        assert_eq!(" COSINE ".parse::<DistanceMetric>().unwrap(), DistanceMetric::Cosine);
    }

    #[test]
    fn test_unknown_metric() {
        let err = distance("hamming", &[1.0], &[1.0]).unwrap_err();
        assert_eq!(err, Error::UnknownMetric("hamming".into()));
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = distance("euclidean", &[1.0, 2.0], &[1.0]).unwrap_err();
        assert_eq!(
            err,
            Error::DimensionMismatch {
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn test_cosine_basic() {
        let d = distance("cosine", &[1.0, 0.0], &[0.0, 1.0]).unwrap();
        assert!((d - 1.0).abs() < 1e-12);
        let d = distance("cosine", &[1.0, 1.0], &[2.0, 2.0]).unwrap();
        assert!(d.abs() < 1e-12);
        let d = distance("cosine", &[1.0, 0.0], &[-1.0, 0.0]).unwrap();
        assert!((d - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_cosine_zero_vector_sentinel() {
        assert_eq!(distance("cosine", &[0.0, 0.0], &[0.0, 0.0]).unwrap(), 0.0);
        assert_eq!(distance("cosine", &[0.0, 0.0], &[3.0, 4.0]).unwrap(), 1.0);
        assert_eq!(distance("cosine", &[3.0, 4.0], &[0.0, 0.0]).unwrap(), 1.0);
    }

    #[test]
    fn test_symmetric_and_zero_on_equal() {
        let a = [0.5, -2.0, 7.0];
        let b = [1.5, 3.0, -1.0];
        for m in DistanceMetric::ALL {
            let ab = m.try_distance(&a, &b).unwrap();
            let ba = m.try_distance(&b, &a).unwrap();
            assert!((ab - ba).abs() < 1e-12, "{m} not symmetric");
            assert!(m.try_distance(&a, &a).unwrap().abs() < 1e-12, "{m} d(a,a) != 0");
            assert!(ab >= 0.0);
        }
    }

    #[test]
    fn test_serde_round_trip_uses_names() {
        let json = serde_json::to_string(&DistanceMetric::Manhattan).unwrap();
        assert_eq!(json, "\"manhattan\"");
        let m: DistanceMetric = serde_json::from_str("\"Cosine\"").unwrap();
        assert_eq!(m, DistanceMetric::Cosine);
        assert!(serde_json::from_str::<DistanceMetric>("\"jaccard\"").is_err());
    }
}
