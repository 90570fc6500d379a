//! Attention ranking.
//!
//! For one instance, each shape's value channels are reduced to their
//! arithmetic mean and the shapes are ordered by that mean, highest first.
//! Equal means keep ascending shape-id order (the sort is stable over the
//! identity permutation). NaN means sort after every number.
//!
//! Instances are ranked independently; there is no cross-instance
//! normalization.
//!
//! # Indexing
//!
//! ```text
//! perm[rank]     = original shape id
//! rank_of[shape] = rank position of that shape
//! sorted[rank]   = mean[perm[rank]]
//! ```

use crate::coords::CoordinateTranslator;
use crate::error::{ExplorerError, Result};
use crate::render::RenderRequest;
use crate::store::{ArrayStore, TensorKind};
use ndarray::{Array3, ArrayView2, Axis};
use std::cmp::Ordering;

/// Ranking of the shapes of one instance.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedShapes {
    /// Mean value per shape, in original shape order
    pub means: Vec<f64>,
    /// Means in rank order (non-increasing)
    pub sorted_values: Vec<f64>,
    /// `perm[rank]` is the original shape id at that rank
    pub perm: Vec<usize>,
    /// `rank_of[shape]` is the rank position of that shape
    pub rank_of: Vec<usize>,
}

impl RankedShapes {
    pub fn shape_count(&self) -> usize {
        self.perm.len()
    }

    /// Original shape id at a rank position.
    pub fn original_id(&self, rank: usize) -> Option<usize> {
        self.perm.get(rank).copied()
    }
}

/// Descending order with NaN last.
fn descending(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

/// Rank the shapes of one instance: `slice` is (shape, value channel).
pub fn rank(slice: ArrayView2<'_, f64>) -> RankedShapes {
    let (shapes, channels) = slice.dim();

    let means: Vec<f64> = if channels == 0 {
        vec![f64::NAN; shapes]
    } else {
        slice
            .axis_iter(Axis(0))
            .map(|row| row.sum() / channels as f64)
            .collect()
    };

    let mut perm: Vec<usize> = (0..shapes).collect();
    perm.sort_by(|&a, &b| descending(means[a], means[b]));

    let mut rank_of = vec![0; shapes];
    for (position, &shape) in perm.iter().enumerate() {
        rank_of[shape] = position;
    }

    let sorted_values = perm.iter().map(|&s| means[s]).collect();

    RankedShapes {
        means,
        sorted_values,
        perm,
        rank_of,
    }
}

/// One row of the exported rank index.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RankEntry {
    /// 1-based instance id
    pub instance_id: usize,
    /// Original shape ids in descending-rank order
    pub order: Vec<usize>,
}

/// Rankings for every instance of one attention tensor.
#[derive(Debug, Clone)]
pub struct RankIndex {
    generation: u64,
    value_count: usize,
    rankings: Vec<RankedShapes>,
}

impl RankIndex {
    /// Rank every instance of an attention tensor.
    pub fn compute(attention: &Array3<f64>, generation: u64) -> Self {
        let value_count = attention.dim().2;

        #[cfg(feature = "parallel")]
        let rankings = {
            use rayon::prelude::*;
            let slices: Vec<ArrayView2<'_, f64>> = attention.outer_iter().collect();
            slices.into_par_iter().map(rank).collect()
        };

        #[cfg(not(feature = "parallel"))]
        let rankings = attention.outer_iter().map(rank).collect();

        Self {
            generation,
            value_count,
            rankings,
        }
    }

    /// Rank the attention tensor currently in the store.
    pub fn from_store(store: &ArrayStore) -> Result<Self> {
        let attention = store.tensor(TensorKind::Attention)?;
        let index = Self::compute(attention, store.generation(TensorKind::Attention));
        log::info!(
            "Ranked attention: {} instances x {} shapes ({} value channels)",
            index.instance_count(),
            index.shape_count(),
            index.value_count
        );
        Ok(index)
    }

    /// Whether this index was computed from the attention tensor now in the store.
    pub fn is_current(&self, store: &ArrayStore) -> bool {
        store.is_loaded(TensorKind::Attention)
            && store.generation(TensorKind::Attention) == self.generation
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn instance_count(&self) -> usize {
        self.rankings.len()
    }

    pub fn shape_count(&self) -> usize {
        self.rankings.first().map_or(0, RankedShapes::shape_count)
    }

    pub fn value_count(&self) -> usize {
        self.value_count
    }

    /// Ranking of one instance (0-based).
    pub fn instance(&self, instance: usize) -> Option<&RankedShapes> {
        self.rankings.get(instance)
    }

    /// Export structure: `[[instanceId (1-based), order], ...]`.
    pub fn entries(&self) -> Vec<RankEntry> {
        self.rankings
            .iter()
            .enumerate()
            .map(|(i, r)| RankEntry {
                instance_id: i + 1,
                order: r.perm.clone(),
            })
            .collect()
    }

    /// Top-ranked bars for one instance.
    ///
    /// `instance` is clamped to the index; `count` is capped at the shape
    /// count (negative counts yield no bars).
    pub fn top_bars(&self, instance: i64, count: i64) -> AttentionBars {
        let translator = CoordinateTranslator::new(self.instance_count(), self.shape_count(), 0, 0);
        let instance = translator.clamp_instance(instance);
        let count = usize::try_from(count)
            .unwrap_or(0)
            .min(self.shape_count());

        let (values, original_ids) = match self.rankings.get(instance) {
            Some(r) => (
                r.sorted_values[..count].to_vec(),
                r.perm[..count].to_vec(),
            ),
            None => (Vec::new(), Vec::new()),
        };

        AttentionBars {
            instance,
            values,
            original_ids,
        }
    }
}

/// Bar chart of the highest-ranked shapes of one instance.
#[derive(Debug, Clone, PartialEq)]
pub struct AttentionBars {
    /// Instance shown (0-based)
    pub instance: usize,
    /// Mean values, highest first
    pub values: Vec<f64>,
    /// Original shape id for each bar
    pub original_ids: Vec<usize>,
}

impl AttentionBars {
    pub fn title(&self) -> String {
        format!(
            "Attention Values: Instance {}, Top {} Shapes (High to Low)",
            self.instance + 1,
            self.values.len()
        )
    }

    pub fn render_requests(&self) -> Vec<RenderRequest> {
        vec![
            RenderRequest::Title(self.title()),
            RenderRequest::Bars {
                values: self.values.clone(),
            },
        ]
    }

    /// Annotation for the bar under the pointer; bars outside the chart yield nothing.
    pub fn hover(&self, bar: usize) -> Option<RenderRequest> {
        let id = *self.original_ids.get(bar)?;
        Some(RenderRequest::Annotation {
            position: (bar as f64, self.values[bar]),
            text: format!("Original Idx: {id}"),
        })
    }
}

/// Rebuild the `(instance, shape_count)` permutation table from exported entries.
///
/// Entries must be in instance order with uniform length.
pub fn permutation_table(entries: &[RankEntry]) -> Result<Vec<Vec<usize>>> {
    let width = entries.first().map_or(0, |e| e.order.len());
    entries
        .iter()
        .enumerate()
        .map(|(i, e)| {
            if e.instance_id != i + 1 || e.order.len() != width {
                Err(ExplorerError::shape_mismatch(
                    TensorKind::Attention,
                    format!(
                        "rank entry {} has id {} and {} ids, expected id {} and {} ids",
                        i,
                        e.instance_id,
                        e.order.len(),
                        i + 1,
                        width
                    ),
                ))
            } else {
                Ok(e.order.clone())
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array3};

    #[test]
    fn test_rank_descending_by_mean() {
        let slice = array![[1.0, 3.0], [5.0, 5.0], [0.0, 0.0], [2.0, 4.0]];
        let r = rank(slice.view());
        assert_eq!(r.means, vec![2.0, 5.0, 0.0, 3.0]);
        assert_eq!(r.perm, vec![1, 3, 0, 2]);
        assert_eq!(r.sorted_values, vec![5.0, 3.0, 2.0, 0.0]);
        assert_eq!(r.rank_of, vec![2, 0, 3, 1]);
    }

    #[test]
    fn test_ties_keep_ascending_ids() {
        let slice = array![[1.0], [2.0], [1.0], [2.0], [1.0]];
        let r = rank(slice.view());
        assert_eq!(r.perm, vec![1, 3, 0, 2, 4]);
    }

    #[test]
    fn test_nan_ranks_last() {
        let slice = array![[f64::NAN], [1.0], [-1.0]];
        let r = rank(slice.view());
        assert_eq!(r.perm, vec![1, 2, 0]);
    }

    #[test]
    fn test_permutation_is_bijection_and_non_increasing() {
        let attention = Array3::from_shape_fn((6, 17, 5), |(i, s, v)| {
            ((i * 31 + s * 17 + v * 7) % 13) as f64 * 0.25 - 1.0
        });
        let index = RankIndex::compute(&attention, 1);
        assert_eq!(index.instance_count(), 6);

        for i in 0..6 {
            let r = index.instance(i).unwrap();
            let mut seen = vec![false; 17];
            for &s in &r.perm {
                assert!(!seen[s]);
                seen[s] = true;
            }
            assert!(seen.iter().all(|&b| b));
            for w in r.sorted_values.windows(2) {
                assert!(w[0] >= w[1]);
            }
            for (rank_pos, &s) in r.perm.iter().enumerate() {
                assert_eq!(r.rank_of[s], rank_pos);
            }
        }
    }

    #[test]
    fn test_instances_ranked_independently() {
        let mut attention = Array3::<f64>::zeros((2, 3, 1));
        attention[[0, 0, 0]] = 9.0;
        attention[[1, 2, 0]] = 0.001;
        let index = RankIndex::compute(&attention, 1);
        assert_eq!(index.instance(0).unwrap().perm, vec![0, 1, 2]);
        assert_eq!(index.instance(1).unwrap().perm, vec![2, 0, 1]);
    }

    #[test]
    fn test_entries_are_one_based() {
        let attention = Array3::from_shape_fn((3, 4, 2), |(_, s, _)| s as f64);
        let entries = RankIndex::compute(&attention, 1).entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].instance_id, 1);
        assert_eq!(entries[2].instance_id, 3);
        assert_eq!(entries[1].order, vec![3, 2, 1, 0]);
        assert_eq!(permutation_table(&entries).unwrap()[2], vec![3, 2, 1, 0]);
    }

    #[test]
    fn test_top_bars_clamps_and_hovers() {
        let attention = Array3::from_shape_fn((2, 5, 1), |(_, s, _)| (s * s) as f64);
        let index = RankIndex::compute(&attention, 1);

        let bars = index.top_bars(99, 3);
        assert_eq!(bars.instance, 1);
        assert_eq!(bars.values, vec![16.0, 9.0, 4.0]);
        assert_eq!(bars.original_ids, vec![4, 3, 2]);

        match bars.hover(1) {
            Some(RenderRequest::Annotation { text, .. }) => assert_eq!(text, "Original Idx: 3"),
            other => panic!("unexpected hover: {other:?}"),
        }
        assert!(bars.hover(3).is_none());

        assert_eq!(index.top_bars(0, 50).values.len(), 5);
        assert!(index.top_bars(0, -2).values.is_empty());
    }

    #[test]
    fn test_permutation_table_rejects_gaps() {
        let entries = vec![
            RankEntry {
                instance_id: 1,
                order: vec![0, 1],
            },
            RankEntry {
                instance_id: 3,
                order: vec![1, 0],
            },
        ];
        assert!(permutation_table(&entries).is_err());
    }
}
