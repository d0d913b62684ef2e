//! Merge trees produced by agglomerative clustering.
//!
//! A [`Dendrogram`] over `n` leaves records `n - 1` merges. Leaves carry ids
//! `0..n`; the cluster created by merge `s` gets id `n + s`. Cutting the tree
//! after `n - k` merges yields `k` flat clusters.

mod dendrogram;

pub use dendrogram::{Dendrogram, Merge};
