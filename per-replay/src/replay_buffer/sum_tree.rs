//! Sum tree for prioritized sampling.
//!
//! The tree is a complete binary tree stored in a flat array. With `n` leaves
//! (`n` a power of two), leaf `i` lives at position `n - 1 + i`, the parent of
//! node `k` is `(k - 1) / 2` and its children are `2k + 1` and `2k + 2`.
use crate::ReplayBufferError;

/// A binary tree where each internal node holds the sum of its children.
#[derive(Debug, Clone)]
pub struct SumTree {
    leaf_count: usize,
    tree: Vec<f64>,
}

impl SumTree {
    /// Creates a tree with `leaf_count` zero leaves.
    ///
    /// `leaf_count` must be a positive power of two.
    pub fn new(leaf_count: usize) -> Result<Self, ReplayBufferError> {
        if leaf_count == 0 || !leaf_count.is_power_of_two() {
            return Err(ReplayBufferError::InvalidArgument(format!(
                "leaf count of a sum tree must be a positive power of two, got {}",
                leaf_count
            )));
        }

        Ok(Self {
            leaf_count,
            tree: vec![0.0; 2 * leaf_count - 1],
        })
    }

    /// Creates a tree able to hold `capacity` leaves.
    ///
    /// The number of leaves is rounded up to the next power of two.
    pub fn with_capacity(capacity: usize) -> Result<Self, ReplayBufferError> {
        if capacity == 0 {
            return Err(ReplayBufferError::InvalidArgument(
                "capacity of a sum tree must be positive".to_string(),
            ));
        }
        Self::new(capacity.next_power_of_two())
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    #[inline]
    fn leaf_position(&self, ix: usize) -> usize {
        ix + self.leaf_count - 1
    }

    /// Sets the value of the `ix`-th leaf and updates its ancestors.
    ///
    /// The value overwrites the previous one. Runs in `O(log n)`.
    pub fn set(&mut self, ix: usize, value: f64) -> Result<(), ReplayBufferError> {
        self.check_index(ix)?;
        if !(value >= 0.0) || !value.is_finite() {
            return Err(ReplayBufferError::InvalidArgument(format!(
                "value of a sum tree leaf must be finite and non-negative, got {}",
                value
            )));
        }

        let k = self.leaf_position(ix);
        self.tree[k] = value;
        self.propagate(k);

        Ok(())
    }

    /// Recomputes the ancestors of node `k` from their children.
    ///
    /// Summing the children instead of adding a delta keeps an emptied subtree
    /// at exactly zero.
    fn propagate(&mut self, mut k: usize) {
        while k > 0 {
            k = (k - 1) / 2;
            self.tree[k] = self.tree[2 * k + 1] + self.tree[2 * k + 2];
        }
    }

    fn check_index(&self, ix: usize) -> Result<(), ReplayBufferError> {
        if ix >= self.leaf_count {
            return Err(ReplayBufferError::IndexOutOfRange {
                index: ix,
                len: self.leaf_count,
            });
        }
        Ok(())
    }

    /// Returns the value of the `ix`-th leaf.
    pub fn get(&self, ix: usize) -> Result<f64, ReplayBufferError> {
        self.check_index(ix)?;
        Ok(self.tree[self.leaf_position(ix)])
    }

    /// Sum of all leaves.
    pub fn total(&self) -> f64 {
        self.tree[0]
    }

    /// Finds the smallest leaf index `i` such that the sum of leaves in `[0, i]`
    /// is greater than `mass`.
    ///
    /// `mass` is expected to lie in `[0, total())`. When rounding pushes the
    /// descent towards an empty subtree the left branch is taken instead, so the
    /// returned leaf always has a non-zero value as long as `total() > 0`.
    pub fn find_prefix_sum(&self, mass: f64) -> usize {
        let mut k = 0;
        let mut mass = mass;

        while k < self.leaf_count - 1 {
            let left = 2 * k + 1;
            let right = left + 1;
            k = if mass < self.tree[left] || self.tree[right] <= 0.0 {
                left
            } else {
                mass -= self.tree[left];
                right
            };
        }

        k + 1 - self.leaf_count
    }

    /// Sum of leaves in `[lo, hi]`, both inclusive.
    ///
    /// Fails if `hi` is not a leaf index or if `lo > hi`.
    pub fn range_sum(&self, lo: usize, hi: usize) -> Result<f64, ReplayBufferError> {
        self.check_index(hi)?;
        if lo > hi {
            return Err(ReplayBufferError::InvalidArgument(format!(
                "empty leaf range [{}, {}]",
                lo, hi
            )));
        }

        // Half-open interval over tree positions, walked up level by level.
        let mut l = self.leaf_position(lo);
        let mut r = self.leaf_position(hi) + 1;
        let mut sum = 0.0;

        while l < r {
            // Right children have even positions.
            if l % 2 == 0 {
                sum += self.tree[l];
                l += 1;
            }
            if r % 2 == 0 {
                r -= 1;
                sum += self.tree[r];
            }
            if l >= r {
                break;
            }
            l = (l - 1) / 2;
            r = (r - 1) / 2;
        }

        Ok(sum)
    }
}

#[cfg(test)]
mod test {
    use super::SumTree;
    use crate::ReplayBufferError;

    fn assert_sum_invariant(sum_tree: &SumTree) {
        for k in 0..sum_tree.leaf_count - 1 {
            let children = sum_tree.tree[2 * k + 1] + sum_tree.tree[2 * k + 2];
            assert!((sum_tree.tree[k] - children).abs() < 1e-9, "node {}", k);
        }
        let leaves: f64 = (0..sum_tree.leaf_count).map(|i| sum_tree.get(i).unwrap()).sum();
        assert!((sum_tree.total() - leaves).abs() < 1e-9);
    }

    #[test]
    fn test_new_rejects_non_power_of_two() {
        assert!(matches!(
            SumTree::new(0),
            Err(ReplayBufferError::InvalidArgument(_))
        ));
        assert!(matches!(
            SumTree::new(6),
            Err(ReplayBufferError::InvalidArgument(_))
        ));

        let sum_tree = SumTree::new(8).unwrap();
        assert_eq!(sum_tree.tree.len(), 15);
        assert_eq!(sum_tree.total(), 0.0);
    }

    #[test]
    fn test_with_capacity_rounds_up() {
        assert_eq!(SumTree::with_capacity(1).unwrap().leaf_count(), 1);
        assert_eq!(SumTree::with_capacity(5).unwrap().leaf_count(), 8);
        assert_eq!(SumTree::with_capacity(8).unwrap().leaf_count(), 8);
        assert!(SumTree::with_capacity(0).is_err());
    }

    #[test]
    fn test_set_overwrites() {
        let mut sum_tree = SumTree::new(4).unwrap();
        sum_tree.set(2, 3.0).unwrap();
        sum_tree.set(2, 3.0).unwrap();
        assert_eq!(sum_tree.get(2), Ok(3.0));
        assert_eq!(sum_tree.total(), 3.0);

        sum_tree.set(2, 1.5).unwrap();
        assert_eq!(sum_tree.total(), 1.5);
        assert_sum_invariant(&sum_tree);
    }

    #[test]
    fn test_set_rejects_bad_input() {
        let mut sum_tree = SumTree::new(4).unwrap();
        assert_eq!(
            sum_tree.set(4, 1.0),
            Err(ReplayBufferError::IndexOutOfRange { index: 4, len: 4 })
        );
        assert!(sum_tree.set(0, -1.0).is_err());
        assert!(sum_tree.set(0, f64::NAN).is_err());
        assert!(sum_tree.set(0, f64::INFINITY).is_err());
        assert_eq!(sum_tree.total(), 0.0);
    }

    #[test]
    fn test_sum_invariant_after_updates() {
        let mut sum_tree = SumTree::with_capacity(13).unwrap();
        let values = [0.5, 0.2, 0.8, 0.3, 1.1, 2.5, 3.9, 0.0, 7.25, 0.1, 4.0, 0.6, 9.0];
        for (ix, &v) in values.iter().enumerate() {
            sum_tree.set(ix, v).unwrap();
            assert_sum_invariant(&sum_tree);
        }
        for (ix, &v) in values.iter().enumerate().rev() {
            sum_tree.set(ix, v * 0.5 + 0.25).unwrap();
            assert_sum_invariant(&sum_tree);
        }
        sum_tree.set(6, 0.0).unwrap();
        assert_sum_invariant(&sum_tree);
    }

    #[test]
    fn test_find_prefix_sum() {
        let data = [0.5, 0.2, 0.8, 0.3, 1.1, 2.5, 3.9];
        let mut sum_tree = SumTree::with_capacity(data.len()).unwrap();
        for (ix, &v) in data.iter().enumerate() {
            sum_tree.set(ix, v).unwrap();
        }

        assert_eq!(sum_tree.find_prefix_sum(0.0), 0);
        assert_eq!(sum_tree.find_prefix_sum(0.4), 0);
        assert_eq!(sum_tree.find_prefix_sum(0.5), 1);
        assert_eq!(sum_tree.find_prefix_sum(0.6), 1);
        assert_eq!(sum_tree.find_prefix_sum(1.2), 2);
        assert_eq!(sum_tree.find_prefix_sum(1.6), 3);
        assert_eq!(sum_tree.find_prefix_sum(2.0), 4);
        assert_eq!(sum_tree.find_prefix_sum(2.8), 4);
        assert_eq!(sum_tree.find_prefix_sum(9.2), 6);
    }

    #[test]
    fn test_find_prefix_sum_skips_zero_leaves() {
        let mut sum_tree = SumTree::new(8).unwrap();
        sum_tree.set(1, 2.0).unwrap();
        sum_tree.set(5, 1.0).unwrap();

        assert_eq!(sum_tree.find_prefix_sum(0.0), 1);
        assert_eq!(sum_tree.find_prefix_sum(1.999), 1);
        assert_eq!(sum_tree.find_prefix_sum(2.0), 5);
        assert_eq!(sum_tree.find_prefix_sum(2.999), 5);

        // Mass at the total stays inside the populated region.
        assert_eq!(sum_tree.find_prefix_sum(3.0), 5);
    }

    #[test]
    fn test_range_sum() {
        let mut sum_tree = SumTree::new(8).unwrap();
        for ix in 0..8 {
            sum_tree.set(ix, ix as f64).unwrap();
        }

        for lo in 0..8 {
            for hi in lo..8 {
                let expected: f64 = (lo..=hi).map(|i| i as f64).sum();
                assert_eq!(sum_tree.range_sum(lo, hi), Ok(expected), "[{}, {}]", lo, hi);
            }
        }
        assert_eq!(sum_tree.range_sum(0, 7), Ok(sum_tree.total()));
    }

    #[test]
    fn test_single_leaf() {
        let mut sum_tree = SumTree::new(1).unwrap();
        sum_tree.set(0, 2.0).unwrap();
        assert_eq!(sum_tree.total(), 2.0);
        assert_eq!(sum_tree.find_prefix_sum(1.0), 0);
        assert_eq!(sum_tree.range_sum(0, 0), Ok(2.0));
    }

    #[test]
    fn test_out_of_range_queries() {
        let mut sum_tree = SumTree::new(4).unwrap();
        sum_tree.set(3, 1.0).unwrap();

        assert_eq!(
            sum_tree.get(4),
            Err(ReplayBufferError::IndexOutOfRange { index: 4, len: 4 })
        );
        assert_eq!(
            sum_tree.range_sum(0, 4),
            Err(ReplayBufferError::IndexOutOfRange { index: 4, len: 4 })
        );
        assert!(matches!(
            sum_tree.range_sum(3, 2),
            Err(ReplayBufferError::InvalidArgument(_))
        ));
        assert_eq!(sum_tree.range_sum(3, 3), Ok(1.0));
    }
}
