//! Dendrogram (merge tree) produced by agglomerative clustering.
//!
//! A dendrogram represents the nested structure of clusters produced
//! by agglomerative (bottom-up) clustering. Ids `0..n` are the original
//! items; merge `i` creates cluster id `n + i` (SciPy/MATLAB convention).
//!
//! Merge distances are not assumed to be monotone (centroid-style linkages
//! can invert), so cuts are by merge count, never by distance threshold.

use serde::Serialize;

use crate::error::{Error, Result};

/// A dendrogram representing hierarchical cluster merges.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dendrogram {
    /// Merge history, in merge order.
    merges: Vec<Merge>,
    /// Number of original items.
    n_items: usize,
}

/// A single merge operation in the dendrogram.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Merge {
    /// Smaller of the two merged cluster ids.
    pub left: usize,
    /// Larger of the two merged cluster ids.
    pub right: usize,
    /// Linkage distance at which the merge occurred.
    pub distance: f64,
    /// Number of items in the resulting cluster.
    pub size: usize,
}

/// Parent pointers over cluster ids, with path compression.
struct Forest {
    parent: Vec<usize>,
}

impl Forest {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut cur = x;
        while self.parent[cur] != root {
            let next = self.parent[cur];
            self.parent[cur] = root;
            cur = next;
        }
        root
    }
}

impl Dendrogram {
    /// Create an empty dendrogram for n items.
    pub fn new(n_items: usize) -> Self {
        Self {
            merges: Vec::with_capacity(n_items.saturating_sub(1)),
            n_items,
        }
    }

    /// Record a merge; ids are stored smaller first.
    pub fn add_merge(&mut self, a: usize, b: usize, distance: f64, size: usize) {
        self.merges.push(Merge {
            left: a.min(b),
            right: a.max(b),
            distance,
            size,
        });
    }

    /// Flat labels after applying exactly `n_items - n_clusters` merges.
    ///
    /// Labels are renumbered `0..n_clusters` in order of first appearance
    /// over items `0..n`, so they do not depend on internal id numbering.
    pub fn cut_to_k(&self, n_clusters: usize) -> Result<Vec<usize>> {
        let n = self.n_items;
        if n_clusters == 0 || n_clusters > n {
            return Err(Error::InvalidNClusters {
                requested: n_clusters,
                n_items: n,
            });
        }
        let n_merges = n - n_clusters;
        if n_merges > self.merges.len() {
            return Err(Error::InvalidNClusters {
                requested: n_clusters,
                n_items: n,
            });
        }

        let mut forest = Forest::new(n + n_merges);
        for (i, merge) in self.merges.iter().take(n_merges).enumerate() {
            let id = n + i;
            let ra = forest.find(merge.left);
            let rb = forest.find(merge.right);
            forest.parent[ra] = id;
            forest.parent[rb] = id;
        }

        let mut renumber: Vec<Option<usize>> = vec![None; n + n_merges];
        let mut next = 0;
        let labels = (0..n)
            .map(|item| {
                let root = forest.find(item);
                *renumber[root].get_or_insert_with(|| {
                    next += 1;
                    next - 1
                })
            })
            .collect();
        Ok(labels)
    }

    /// Distance of the first merge that a cut into `n_clusters` undoes.
    ///
    /// Renderers colour subtrees below this height. `None` when the cut
    /// undoes nothing (`n_clusters <= 1`) or is out of range.
    pub fn color_threshold(&self, n_clusters: usize) -> Option<f64> {
        if n_clusters <= 1 || n_clusters > self.n_items {
            return None;
        }
        self.merges
            .get(self.n_items - n_clusters)
            .map(|m| m.distance)
    }

    /// Items in left-to-right display order.
    ///
    /// Each subtree lists its `left` child before its `right` child.
    /// Unmerged roots (partial trees) are emitted newest first.
    pub fn leaf_order(&self) -> Vec<usize> {
        let n = self.n_items;
        let total = n + self.merges.len();
        let mut has_parent = vec![false; total];
        for m in &self.merges {
            has_parent[m.left] = true;
            has_parent[m.right] = true;
        }

        let mut order = Vec::with_capacity(n);
        let mut stack: Vec<usize> = (0..total).filter(|&id| !has_parent[id]).collect();
        while let Some(id) = stack.pop() {
            if id < n {
                order.push(id);
            } else {
                let m = &self.merges[id - n];
                stack.push(m.right);
                stack.push(m.left);
            }
        }
        order
    }

    /// SciPy-style linkage rows: `[left, right, distance, size]`.
    pub fn linkage_matrix(&self) -> Vec<[f64; 4]> {
        self.merges
            .iter()
            .map(|m| [m.left as f64, m.right as f64, m.distance, m.size as f64])
            .collect()
    }

    /// Number of original items.
    pub fn n_items(&self) -> usize {
        self.n_items
    }

    /// Number of merges recorded.
    pub fn n_merges(&self) -> usize {
        self.merges.len()
    }

    /// Iterate over merges.
    pub fn merges(&self) -> impl Iterator<Item = &Merge> {
        self.merges.iter()
    }

    /// Get the merge distances (for visualization).
    pub fn distances(&self) -> Vec<f64> {
        self.merges.iter().map(|m| m.distance).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn four() -> Dendrogram {
        let mut d = Dendrogram::new(4);
        d.add_merge(1, 0, 0.5, 2);
        d.add_merge(2, 3, 0.7, 2);
        d.add_merge(5, 4, 3.0, 4);
        d
    }

    #[test]
    fn test_merge_ids_are_ordered() {
        let d = four();
        let first = d.merges().next().unwrap();
        assert_eq!((first.left, first.right), (0, 1));
        assert_eq!(d.n_merges(), 3);
    }

    #[test]
    fn test_cut_to_k() {
        let d = four();
        assert_eq!(d.cut_to_k(4).unwrap(), vec![0, 1, 2, 3]);
        assert_eq!(d.cut_to_k(3).unwrap(), vec![0, 0, 1, 2]);
        assert_eq!(d.cut_to_k(2).unwrap(), vec![0, 0, 1, 1]);
        assert_eq!(d.cut_to_k(1).unwrap(), vec![0, 0, 0, 0]);
        assert!(d.cut_to_k(0).is_err());
        assert!(d.cut_to_k(5).is_err());
    }

    #[test]
    fn test_cut_ignores_non_monotone_distances() {
        let mut d = Dendrogram::new(3);
        d.add_merge(0, 1, 2.0, 2);
        d.add_merge(2, 3, 1.0, 3); // inversion
        assert_eq!(d.cut_to_k(2).unwrap(), vec![0, 0, 1]);
    }

    #[test]
    fn test_labels_follow_first_appearance() {
        let mut d = Dendrogram::new(3);
        d.add_merge(1, 2, 1.0, 2);
        d.add_merge(0, 3, 4.0, 3);
        assert_eq!(d.cut_to_k(2).unwrap(), vec![0, 1, 1]);
    }

    #[test]
    fn test_partial_tree_cut_out_of_range() {
        let mut d = Dendrogram::new(3);
        d.add_merge(0, 1, 1.0, 2);
        assert_eq!(d.cut_to_k(2).unwrap(), vec![0, 0, 1]);
        assert!(d.cut_to_k(1).is_err());
    }

    #[test]
    fn test_leaf_order_and_threshold() {
        let d = four();
        assert_eq!(d.leaf_order(), vec![0, 1, 2, 3]);
        assert_eq!(d.color_threshold(2), Some(3.0));
        assert_eq!(d.color_threshold(3), Some(0.7));
        assert_eq!(d.color_threshold(1), None);
        assert_eq!(d.color_threshold(9), None);
    }

    #[test]
    fn test_linkage_matrix_rows() {
        let rows = four().linkage_matrix();
        assert_eq!(rows[2], [4.0, 5.0, 3.0, 4.0]);
    }

    #[test]
    fn test_single_item() {
        let d = Dendrogram::new(1);
        assert_eq!(d.cut_to_k(1).unwrap(), vec![0]);
        assert_eq!(d.leaf_order(), vec![0]);
    }
}
