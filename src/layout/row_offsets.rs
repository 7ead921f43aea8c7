//! Fenwick tree over per-record offset heights.
//!
//! Gives the top of any record and the record under any position in
//! O(log n), with O(log n) point updates when one record is re-measured.
//!
//! The tree is stored 1-indexed in `tree` (slot 0 unused); `values` keeps the
//! plain heights so a point update can compute its delta.

/// Prefix sums of record offset heights, indexed by store position.
#[derive(Debug, Clone, Default)]
pub struct RowOffsets {
    tree: Vec<f64>,
    values: Vec<f64>,
}

impl RowOffsets {
    /// Build from the offset height of every record in store order. O(n).
    pub fn from_values(values: Vec<f64>) -> Self {
        let n = values.len();
        let mut tree = Vec::with_capacity(n + 1);
        tree.push(0.0);
        tree.extend_from_slice(&values);
        for i in 1..=n {
            let parent = i + lowbit(i);
            let value = tree.get(i).copied().unwrap_or(0.0);
            if let Some(node) = tree.get_mut(parent) {
                *node += value;
            }
        }
        Self { tree, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    /// Replace the height at `index`. Returns `false` when out of range.
    pub fn set(&mut self, index: usize, value: f64) -> bool {
        let Some(slot) = self.values.get_mut(index) else {
            return false;
        };
        let delta = value - *slot;
        *slot = value;
        let mut i = index + 1;
        while let Some(node) = self.tree.get_mut(i) {
            *node += delta;
            i += lowbit(i);
        }
        true
    }

    /// Sum of the first `index` heights, i.e. the top of record `index`.
    pub fn top_of(&self, index: usize) -> f64 {
        let mut i = index.min(self.len());
        let mut sum = 0.0;
        while i > 0 {
            sum += self.tree.get(i).copied().unwrap_or(0.0);
            i -= lowbit(i);
        }
        sum
    }

    pub fn total(&self) -> f64 {
        self.top_of(self.len())
    }

    /// Number of leading records that end at or above `y`.
    ///
    /// For `y` inside the content this is the index of the record covering
    /// `y`; past the end it is `len()`.
    pub fn index_at(&self, y: f64) -> usize {
        let mut pos = 0;
        let mut remaining = y;
        let mut step = self.len().next_power_of_two();
        while step > 0 {
            if let Some(node) = self.tree.get(pos + step) {
                if *node <= remaining {
                    remaining -= *node;
                    pos += step;
                }
            }
            step >>= 1;
        }
        pos
    }
}

fn lowbit(i: usize) -> usize {
    i & i.wrapping_neg()
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    fn offsets() -> RowOffsets {
        RowOffsets::from_values(vec![30.0, 50.0, 70.0, 30.0, 50.0])
    }

    #[test]
    fn test_top_of_matches_running_sum() {
        let offsets = offsets();
        let tops: Vec<f64> = (0..=5).map(|i| offsets.top_of(i)).collect();
        assert_eq!(tops, vec![0.0, 30.0, 80.0, 150.0, 180.0, 230.0]);
        assert_eq!(offsets.total(), 230.0);
        assert_eq!(offsets.top_of(99), 230.0);
    }

    #[test]
    fn test_index_at_position() {
        let offsets = offsets();
        assert_eq!(offsets.index_at(0.0), 0);
        assert_eq!(offsets.index_at(29.9), 0);
        assert_eq!(offsets.index_at(30.0), 1);
        assert_eq!(offsets.index_at(149.0), 2);
        assert_eq!(offsets.index_at(229.0), 4);
        assert_eq!(offsets.index_at(230.0), 5);
        assert_eq!(RowOffsets::default().index_at(10.0), 0);
    }

    #[test]
    fn test_point_update_restacks_tops_below() {
        let mut offsets = offsets();
        assert!(offsets.set(1, 90.0));
        assert!(!offsets.set(5, 10.0));
        assert_eq!(offsets.get(1), Some(90.0));
        assert_eq!(offsets.top_of(1), 30.0);
        assert_eq!(offsets.top_of(2), 120.0);
        assert_eq!(offsets.total(), 270.0);
        assert_eq!(offsets.index_at(119.0), 1);
    }

    #[test]
    fn test_large_tree_agrees_with_linear_scan() {
        let values: Vec<f64> = (0..1000).map(|i| f64::from(20 + (i % 7) * 5)).collect();
        let offsets = RowOffsets::from_values(values.clone());
        let mut top = 0.0;
        for (i, height) in values.iter().enumerate() {
            assert_eq!(offsets.top_of(i), top);
            assert_eq!(offsets.index_at(top + height / 2.0), i);
            top += height;
        }
    }
}
