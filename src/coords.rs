//! Coordinate translation between requested indices and valid tensor addresses.
//!
//! Requests from interactive controls are arbitrary integers (negative,
//! past the end, inverted ranges). Every component routes them through
//! [`CoordinateTranslator`] instead of validating on its own; out-of-range
//! values are saturated to the nearest valid index and never reported as
//! errors.
//!
//! # Example
//!
//! ```
//! use shape_explorer::coords::{CoordinateTranslator, TimeRange};
//!
//! let t = CoordinateTranslator::new(10, 30, 100, 3);
//! assert_eq!(t.clamp_instance(-4), 0);
//! assert_eq!(t.clamp_instance(42), 9);
//! assert_eq!(t.clamp_time_range(50, 30), TimeRange { start: 50, end: 51 });
//! ```

use crate::store::{ArrayStore, TensorKind};

/// Half-open time interval `[start, end)` with `start < end` whenever the
/// series is non-empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeRange {
    pub start: usize,
    pub end: usize,
}

impl TimeRange {
    /// Number of time steps covered.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Snapshot of the extents used for clamping.
///
/// Extents of tensors that are not loaded are zero; clamping against a zero
/// extent always yields index 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CoordinateTranslator {
    instance_count: usize,
    shape_count: usize,
    time_length: usize,
    variable_count: usize,
}

impl CoordinateTranslator {
    pub fn new(
        instance_count: usize,
        shape_count: usize,
        time_length: usize,
        variable_count: usize,
    ) -> Self {
        Self {
            instance_count,
            shape_count,
            time_length,
            variable_count,
        }
    }

    /// Extents from the primary tensors (`x_train`, `arr_0`).
    pub fn from_store(store: &ArrayStore) -> Self {
        Self {
            instance_count: store.instance_count().unwrap_or(0),
            shape_count: store.shape_count().unwrap_or(0),
            time_length: store.time_length().unwrap_or(0),
            variable_count: store.variable_count().unwrap_or(0),
        }
    }

    /// Instance and shape extents taken from one auxiliary tensor.
    ///
    /// Heatmap, attention and region views address their own tensor, whose
    /// instance and shape axes may differ from `x_train`/`arr_0`.
    pub fn for_tensor(store: &ArrayStore, kind: TensorKind) -> Self {
        let base = Self::from_store(store);
        match store.shape_of(kind) {
            Some([instances, shapes, _]) => Self {
                instance_count: instances,
                shape_count: shapes,
                ..base
            },
            None => Self {
                instance_count: 0,
                shape_count: 0,
                ..base
            },
        }
    }

    pub fn instance_count(&self) -> usize {
        self.instance_count
    }

    pub fn shape_count(&self) -> usize {
        self.shape_count
    }

    pub fn time_length(&self) -> usize {
        self.time_length
    }

    pub fn variable_count(&self) -> usize {
        self.variable_count
    }

    pub fn clamp_instance(&self, instance: i64) -> usize {
        clamp_index(instance, self.instance_count)
    }

    pub fn clamp_shape(&self, shape: i64) -> usize {
        clamp_index(shape, self.shape_count)
    }

    pub fn clamp_variable(&self, variable: i64) -> usize {
        clamp_index(variable, self.variable_count)
    }

    /// Clamp a requested range so that `0 <= start < end <= time_length`.
    ///
    /// An empty or inverted request is widened to the single step at
    /// `start`. With a zero time length the result is the empty range at 0.
    pub fn clamp_time_range(&self, start: i64, end: i64) -> TimeRange {
        clamp_range(start, end, self.time_length)
    }

    /// Same rule as [`Self::clamp_time_range`], applied to a shape window.
    pub fn clamp_shape_range(&self, start: i64, end: i64) -> TimeRange {
        clamp_range(start, end, self.shape_count)
    }
}

fn clamp_index(value: i64, extent: usize) -> usize {
    if extent == 0 || value <= 0 {
        return 0;
    }
    usize::try_from(value).map_or(extent - 1, |v| v.min(extent - 1))
}

fn clamp_range(start: i64, end: i64, extent: usize) -> TimeRange {
    if extent == 0 {
        return TimeRange { start: 0, end: 0 };
    }
    let start = clamp_index(start, extent);
    let end = if end <= 0 {
        0
    } else {
        usize::try_from(end).map_or(extent, |e| e.min(extent))
    };
    TimeRange {
        start,
        end: end.max(start + 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_instance_idempotent_and_in_range() {
        let t = CoordinateTranslator::new(7, 0, 0, 0);
        for x in [-1_000_000, -1, 0, 3, 6, 7, 8, 1_000_000, i64::MIN, i64::MAX] {
            let once = t.clamp_instance(x);
            assert!(once < 7, "clamp({x}) = {once} out of range");
            assert_eq!(t.clamp_instance(once as i64), once);
        }
    }

    #[test]
    fn test_in_range_values_pass_through() {
        let t = CoordinateTranslator::new(10, 30, 100, 3);
        assert_eq!(t.clamp_instance(4), 4);
        assert_eq!(t.clamp_shape(29), 29);
        assert_eq!(t.clamp_variable(2), 2);
        assert_eq!(t.clamp_time_range(10, 60), TimeRange { start: 10, end: 60 });
    }

    #[test]
    fn test_zero_extent_yields_zero() {
        let t = CoordinateTranslator::default();
        assert_eq!(t.clamp_instance(5), 0);
        assert_eq!(t.clamp_shape(-5), 0);
        assert!(t.clamp_time_range(3, 9).is_empty());
    }

    #[test]
    fn test_time_range_rules() {
        let t = CoordinateTranslator::new(1, 1, 100, 1);

        // inverted -> one step at start
        assert_eq!(t.clamp_time_range(50, 30), TimeRange { start: 50, end: 51 });
        // empty -> one step at start
        assert_eq!(t.clamp_time_range(20, 20), TimeRange { start: 20, end: 21 });
        // negative start, end past the series
        assert_eq!(t.clamp_time_range(-5, 400), TimeRange { start: 0, end: 100 });
        // start past the series
        assert_eq!(t.clamp_time_range(150, 200), TimeRange { start: 99, end: 100 });
        // everything negative
        assert_eq!(t.clamp_time_range(-9, -3), TimeRange { start: 0, end: 1 });
    }

    #[test]
    fn test_time_range_invariant_holds() {
        let t = CoordinateTranslator::new(1, 1, 37, 1);
        for start in -40..80 {
            for end in [-3, 0, 1, 18, 36, 37, 38, 90] {
                let r = t.clamp_time_range(start, end);
                assert!(r.start < r.end && r.end <= 37, "{start},{end} -> {r:?}");
            }
        }
    }
}
