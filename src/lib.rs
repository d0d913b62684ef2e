//! # tabclust
//!
//! Clustering engine for tabular numeric data.
//!
//! Upload a table, pick numeric feature columns, then run:
//!
//! - **k-means** with a choice of assignment metric ([`cluster::Kmeans`])
//! - an **elbow sweep** over k to suggest a cluster count ([`cluster::ElbowSelector`])
//! - **agglomerative** clustering with single, complete, average or ward
//!   linkage, cut to a flat labelling ([`cluster::HierarchicalClustering`])
//!
//! The [`api`] module wraps these in JSON request/response shapes; the
//! algorithms themselves work on a [`FeatureMatrix`] and know nothing of JSON.
//!
//! ```rust
//! use tabclust::cluster::Kmeans;
//! use tabclust::FeatureMatrix;
//!
//! let data = FeatureMatrix::from_rows(&[
//!     vec![0.0, 0.0],
//!     vec![0.0, 1.0],
//!     vec![10.0, 10.0],
//!     vec![10.0, 11.0],
//! ])
//! .unwrap();
//! let fit = Kmeans::new(2).with_seed(42).fit(&data).unwrap();
//! assert!((fit.inertia - 1.0).abs() < 1e-12);
//! ```
//!
//! With the default `parallel` feature, the elbow sweep and the k-means
//! assignment step run on the rayon pool. Results do not depend on it.

#![forbid(unsafe_code)]

pub mod api;
pub mod cluster;
pub mod config;
pub mod distance;
/// Error types used across `tabclust`.
pub mod error;
pub mod hierarchy;
pub mod matrix;
pub mod stats;
pub mod table;

pub use api::{DendrogramRenderer, Endpoint, Engine, Response};
pub use cluster::{
    Clustering, ElbowCurve, ElbowSelector, HierarchicalClustering, Kmeans, KmeansFit, Linkage,
};
pub use config::EngineConfig;
pub use distance::DistanceMetric;
pub use error::{Error, ErrorKind, Result};
pub use hierarchy::{Dendrogram, Merge};
pub use matrix::FeatureMatrix;
pub use table::{ObservationTable, Row, Scalar};
