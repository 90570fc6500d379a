//! Per-plot sequence control entries.

use crate::coords::{CoordinateTranslator, TimeRange};
use crate::error::Result;
use crate::render::RenderRequest;
use crate::store::{ArrayStore, TensorKind};
use ndarray::s;
use serde::{Deserialize, Serialize};

/// Upper bound on concurrently rendered sequence plots.
pub const MAX_SEQUENCE_PLOTS: usize = 4;

/// Requested `(instance, variable, start, end)` for one plot.
///
/// Values are raw requests (0-based, possibly out of range); they are
/// clamped against the loaded tensor every time the plot is rendered, never
/// when they are set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceControlEntry {
    pub instance: i64,
    pub variable: i64,
    pub start_time: i64,
    pub end_time: i64,
}

impl Default for SequenceControlEntry {
    fn default() -> Self {
        Self {
            instance: 0,
            variable: 0,
            start_time: 0,
            end_time: 100,
        }
    }
}

impl SequenceControlEntry {
    pub fn new(instance: i64, variable: i64, start_time: i64, end_time: i64) -> Self {
        Self {
            instance,
            variable,
            start_time,
            end_time,
        }
    }

    /// Clamp this request against the current extents.
    pub fn resolve(&self, translator: &CoordinateTranslator) -> ResolvedEntry {
        ResolvedEntry {
            instance: translator.clamp_instance(self.instance),
            variable: translator.clamp_variable(self.variable),
            range: translator.clamp_time_range(self.start_time, self.end_time),
        }
    }
}

/// A control entry after clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedEntry {
    pub instance: usize,
    pub variable: usize,
    pub range: TimeRange,
}

/// Data for one sequence plot.
#[derive(Debug, Clone, PartialEq)]
pub struct SequencePlot {
    /// Plot slot (0-based)
    pub slot: usize,
    pub resolved: ResolvedEntry,
    pub time_axis: Vec<usize>,
    pub values: Vec<f64>,
}

impl SequencePlot {
    pub fn title(&self) -> String {
        let r = &self.resolved;
        format!(
            "Sequence {}: Instance {}, Variable {}\nTime {}-{} (Length: {})",
            self.slot + 1,
            r.instance + 1,
            r.variable + 1,
            r.range.start,
            r.range.end.saturating_sub(1),
            r.range.len()
        )
    }

    pub fn render_requests(&self) -> Vec<RenderRequest> {
        vec![
            RenderRequest::Title(self.title()),
            RenderRequest::Line {
                time_axis: self.time_axis.clone(),
                values: self.values.clone(),
                label: format!("Seq {}", self.slot + 1),
            },
        ]
    }
}

/// Owned set of control entries, one per requested plot.
///
/// Resizing keeps the entries that survive and creates new ones from the
/// default entry; entries removed by a shrink are forgotten.
#[derive(Debug, Clone)]
pub struct SequenceControlSet {
    entries: Vec<SequenceControlEntry>,
    defaults: SequenceControlEntry,
    max_plots: usize,
}

impl Default for SequenceControlSet {
    fn default() -> Self {
        Self::new(2, SequenceControlEntry::default(), MAX_SEQUENCE_PLOTS)
    }
}

impl SequenceControlSet {
    /// Create a set of `count` default entries (`count` bounded to `1..=max_plots`).
    pub fn new(count: usize, defaults: SequenceControlEntry, max_plots: usize) -> Self {
        let mut set = Self {
            entries: Vec::new(),
            defaults,
            max_plots: max_plots.clamp(1, MAX_SEQUENCE_PLOTS),
        };
        set.resize(count);
        set
    }

    /// Match the number of entries to `n`, bounded to `1..=max_plots`.
    ///
    /// Returns the number of entries after resizing.
    pub fn resize(&mut self, n: usize) -> usize {
        let n = n.clamp(1, self.max_plots);
        self.entries.resize(n, self.defaults);
        n
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_plots(&self) -> usize {
        self.max_plots
    }

    pub fn defaults(&self) -> SequenceControlEntry {
        self.defaults
    }

    pub fn entries(&self) -> &[SequenceControlEntry] {
        &self.entries
    }

    pub fn entry(&self, slot: usize) -> Option<&SequenceControlEntry> {
        self.entries.get(slot)
    }

    pub fn entry_mut(&mut self, slot: usize) -> Option<&mut SequenceControlEntry> {
        self.entries.get_mut(slot)
    }

    /// Replace one entry. Returns `false` if the slot does not exist.
    pub fn set(&mut self, slot: usize, entry: SequenceControlEntry) -> bool {
        match self.entries.get_mut(slot) {
            Some(e) => {
                *e = entry;
                true
            }
            None => false,
        }
    }

    /// Subplot grid `(rows, cols)` for the current plot count.
    pub fn layout(&self) -> (usize, usize) {
        match self.entries.len() {
            2 => (1, 2),
            3 => (1, 3),
            4 => (2, 2),
            _ => (1, 1),
        }
    }

    /// Extract one `(time axis, values)` pair per entry from `x_train`.
    ///
    /// Reads the store only; entries themselves are not modified by clamping.
    /// With no instances or no variables every plot is empty.
    pub fn render(&self, store: &ArrayStore) -> Result<Vec<SequencePlot>> {
        let instances = store.tensor(TensorKind::Instances)?;
        let translator = CoordinateTranslator::from_store(store);
        let (count, _, variables) = instances.dim();

        let plots = self
            .entries
            .iter()
            .enumerate()
            .map(|(slot, entry)| {
                let resolved = entry.resolve(&translator);
                if count == 0 || variables == 0 {
                    return SequencePlot {
                        slot,
                        resolved,
                        time_axis: Vec::new(),
                        values: Vec::new(),
                    };
                }
                let r = resolved.range;
                SequencePlot {
                    slot,
                    resolved,
                    time_axis: (r.start..r.end).collect(),
                    values: instances
                        .slice(s![resolved.instance, r.start..r.end, resolved.variable])
                        .to_vec(),
                }
            })
            .collect();

        Ok(plots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExplorerError;
    use ndarray::Array3;

    fn store(instances: usize, time: usize, vars: usize) -> ArrayStore {
        let mut store = ArrayStore::new();
        let x = Array3::from_shape_fn((instances, time, vars), |(i, t, v)| {
            (i * 10_000 + t * 10 + v) as f64
        });
        store.load(TensorKind::Instances, x.into_dyn()).unwrap();
        store
    }

    #[test]
    fn test_resize_bounds() {
        let mut set = SequenceControlSet::default();
        assert_eq!(set.len(), 2);
        assert_eq!(set.resize(0), 1);
        assert_eq!(set.resize(9), 4);
        assert_eq!(set.len(), 4);
    }

    #[test]
    fn test_shrink_then_grow_resets_removed_entries() {
        let mut set = SequenceControlSet::new(4, SequenceControlEntry::default(), 4);
        set.set(0, SequenceControlEntry::new(3, 1, 5, 25));
        set.set(1, SequenceControlEntry::new(7, 2, 10, 40));
        set.set(3, SequenceControlEntry::new(9, 0, 60, 90));

        set.resize(1);
        set.resize(4);

        assert_eq!(set.entry(0), Some(&SequenceControlEntry::new(3, 1, 5, 25)));
        assert_eq!(set.entry(1), Some(&SequenceControlEntry::new(0, 0, 0, 100)));
        assert_eq!(set.entry(3), Some(&SequenceControlEntry::new(0, 0, 0, 100)));
    }

    #[test]
    fn test_layout() {
        let mut set = SequenceControlSet::default();
        let grids: Vec<_> = (1..=4)
            .map(|n| {
                set.resize(n);
                set.layout()
            })
            .collect();
        assert_eq!(grids, vec![(1, 1), (1, 2), (1, 3), (2, 2)]);
    }

    #[test]
    fn test_render_requires_instances() {
        let set = SequenceControlSet::default();
        let err = set.render(&ArrayStore::new()).unwrap_err();
        assert!(matches!(
            err,
            ExplorerError::NotLoaded(TensorKind::Instances)
        ));
    }

    #[test]
    fn test_render_clamps_each_entry_independently() {
        let store = store(3, 50, 2);
        let mut set = SequenceControlSet::new(2, SequenceControlEntry::default(), 4);
        set.set(0, SequenceControlEntry::new(1, 1, 10, 13));
        set.set(1, SequenceControlEntry::new(99, -4, 45, 20));

        let plots = set.render(&store).unwrap();
        assert_eq!(plots.len(), 2);

        assert_eq!(plots[0].time_axis, vec![10, 11, 12]);
        assert_eq!(plots[0].values, vec![10_101.0, 10_111.0, 10_121.0]);

        // instance clamped to 2, variable to 0, inverted range to one step
        assert_eq!(plots[1].resolved.instance, 2);
        assert_eq!(plots[1].resolved.variable, 0);
        assert_eq!(plots[1].time_axis, vec![45]);
        assert_eq!(plots[1].values, vec![20_450.0]);

        // the stored request is left as entered
        assert_eq!(set.entry(1).unwrap().instance, 99);
    }

    #[test]
    fn test_entry_mut_edits_in_place() {
        let store = store(2, 30, 2);
        let mut set = SequenceControlSet::default();
        if let Some(entry) = set.entry_mut(1) {
            entry.instance = 1;
            entry.end_time = 2;
        }
        assert!(set.entry_mut(2).is_none());

        let plots = set.render(&store).unwrap();
        assert_eq!(plots[1].values, vec![10_000.0, 10_010.0]);
        assert_eq!(plots[0].values.len(), 30);
    }

    #[test]
    fn test_render_without_instances_or_variables_is_empty() {
        let shapes: [(usize, usize, usize); 2] = [(0, 50, 2), (2, 50, 0)];
        for shape in shapes {
            let mut store = ArrayStore::new();
            store
                .load(TensorKind::Instances, Array3::<f64>::zeros(shape).into_dyn())
                .unwrap();
            let plots = SequenceControlSet::default().render(&store).unwrap();
            assert_eq!(plots.len(), 2, "shape {shape:?}");
            assert!(plots.iter().all(|p| p.values.is_empty() && p.time_axis.is_empty()));
        }
    }

    #[test]
    fn test_default_end_clamped_to_series() {
        let store = store(1, 60, 1);
        let set = SequenceControlSet::new(1, SequenceControlEntry::default(), 4);
        let plot = &set.render(&store).unwrap()[0];
        assert_eq!(plot.time_axis.len(), 60);
        assert_eq!(plot.title(), "Sequence 1: Instance 1, Variable 1\nTime 0-59 (Length: 60)");
    }
}
