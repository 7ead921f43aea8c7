//! Measured row heights keyed by record id.
//!
//! Aggregates are maintained incrementally so the row manager can estimate
//! the height of unrendered records in O(1).

use std::collections::HashMap;

use crate::types::RecordId;

/// Last measured content height per record.
#[derive(Debug, Clone, Default)]
pub struct HeightMap {
    heights: HashMap<RecordId, f64>,
    /// Sum of all values in `heights`
    total_known_height: f64,
}

impl HeightMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a measured height. Returns `true` if the stored value changed.
    pub fn store(&mut self, id: RecordId, height: f64) -> bool {
        match self.heights.insert(id, height) {
            Some(old) if (old - height).abs() <= f64::EPSILON => false,
            Some(old) => {
                self.total_known_height += height - old;
                true
            }
            None => {
                self.total_known_height += height;
                true
            }
        }
    }

    /// Forget one record's height. Returns `true` if it was known.
    pub fn invalidate(&mut self, id: &RecordId) -> bool {
        match self.heights.remove(id) {
            Some(old) => {
                self.total_known_height -= old;
                if self.heights.is_empty() {
                    // Drop accumulated rounding error.
                    self.total_known_height = 0.0;
                }
                true
            }
            None => false,
        }
    }

    /// Keep only entries whose id satisfies `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&RecordId) -> bool) {
        self.heights.retain(|id, _| keep(id));
        self.total_known_height = self.heights.values().sum();
    }

    pub fn clear(&mut self) {
        self.heights.clear();
        self.total_known_height = 0.0;
    }

    pub fn get(&self, id: &RecordId) -> Option<f64> {
        self.heights.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.heights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }

    pub fn total_known_height(&self) -> f64 {
        self.total_known_height
    }

    /// Mean of the known heights, `None` when nothing is known.
    pub fn average(&self) -> Option<f64> {
        if self.heights.is_empty() {
            return None;
        }
        Some(self.total_known_height / self.heights.len() as f64)
    }

    /// Recomputed sum, for consistency checks.
    pub fn sum(&self) -> f64 {
        self.heights.values().sum()
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_average_of_known_heights() {
        let mut map = HeightMap::new();
        map.store(RecordId::Int(1), 40.0);
        map.store(RecordId::Int(2), 60.0);
        map.store(RecordId::Int(3), 50.0);
        assert_eq!(map.total_known_height(), 150.0);
        assert_eq!(map.average(), Some(50.0));
    }

    #[test]
    fn test_restore_replaces_value() {
        let mut map = HeightMap::new();
        assert!(map.store(RecordId::Int(1), 40.0));
        assert!(!map.store(RecordId::Int(1), 40.0));
        assert!(map.store(RecordId::Int(1), 25.0));
        assert_eq!(map.total_known_height(), 25.0);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_invalidate_and_retain() {
        let mut map = HeightMap::new();
        for i in 0..10 {
            map.store(RecordId::Int(i), 10.0 + i as f64);
        }
        assert!(map.invalidate(&RecordId::Int(0)));
        assert!(!map.invalidate(&RecordId::Int(0)));
        map.retain(|id| matches!(id, RecordId::Int(n) if n % 2 == 1));
        assert_eq!(map.len(), 5);
        assert_eq!(map.total_known_height(), map.sum());
        assert!(map.average().is_some());
        map.clear();
        assert_eq!(map.average(), None);
    }
}
