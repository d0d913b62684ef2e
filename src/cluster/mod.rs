//! Clustering algorithms for rows of a [`crate::FeatureMatrix`].
//!
//! ## K-means
//!
//! The classic algorithm: assign each point to the nearest centroid, then
//! update centroids to the mean of their points. Repeat.
//!
//! **Objective**: Minimize within-cluster sum of squares:
//!
//! ```text
//! J = Σ_k Σ_{x ∈ C_k} ||x - μ_k||²
//! ```
//!
//! **Assumptions**:
//! - Clusters are roughly spherical
//! - Clusters have similar sizes
//! - You know k in advance (or pick it with the elbow sweep)
//!
//! ## Elbow sweep
//!
//! [`ElbowSelector`] runs k-means over a range of k and picks the bend of
//! the inertia curve. Runs are independent, so with the `parallel` feature
//! they execute on the rayon pool; results keep candidate order.
//!
//! ## Hierarchical (Agglomerative) Clustering
//!
//! Bottom-up: start with each point as its own cluster, repeatedly merge
//! the two closest clusters until one remains. The merge history forms a
//! **dendrogram**, a binary tree you can cut at any cluster count.
//!
//! | Linkage | Distance | Effect |
//! |---------|----------|--------|
//! | Single | min(pairwise) | Chaining; elongated clusters |
//! | Complete | max(pairwise) | Compact, spherical clusters |
//! | Average | mean(pairwise) | Balanced compromise |
//! | Ward | SSE increase | Minimizes within-cluster variance |
//!
//! ## Usage
//!
//! ```rust
//! use tabclust::cluster::{Clustering, HierarchicalClustering, Kmeans, Linkage};
//! use tabclust::FeatureMatrix;
//!
//! let data = FeatureMatrix::from_rows(&[
//!     vec![0.0, 0.0],
//!     vec![0.0, 1.0],
//!     vec![10.0, 10.0],
//!     vec![10.0, 11.0],
//! ])
//! .unwrap();
//!
//! let labels = Kmeans::new(2).with_seed(42).fit_predict(&data).unwrap();
//! assert_eq!(labels[0], labels[1]);
//! assert_ne!(labels[0], labels[2]);
//!
//! let labels = HierarchicalClustering::new(2)
//!     .with_linkage(Linkage::Single)
//!     .fit_predict(&data)
//!     .unwrap();
//! assert_eq!(labels, vec![0, 0, 1, 1]);
//! ```

mod elbow;
mod hierarchical;
mod kmeans;
mod traits;

pub use elbow::{elbow_point, find_optimal_k, ElbowCurve, ElbowMethod, ElbowSelector};
pub use hierarchical::{HierarchicalClustering, HierarchicalFit, Linkage};
pub use kmeans::{inertia, Kmeans, KmeansFit, StopReason};
pub(crate) use kmeans::mean_of;
pub use traits::Clustering;
