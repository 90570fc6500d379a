//! Sequence control set.
//!
//! Each requested line plot is described by an explicit
//! [`SequenceControlEntry`] value owned by the [`SequenceControlSet`], not by
//! any widget. Entries hold raw requests; rendering clamps them through the
//! coordinate translator and reads `x_train`, yielding one
//! `(time axis, values)` pair per plot.
//!
//! # Example
//!
//! ```ignore
//! use shape_explorer::sequence::{SequenceControlEntry, SequenceControlSet};
//!
//! let mut controls = SequenceControlSet::default();
//! controls.resize(3);
//! controls.set(2, SequenceControlEntry::new(4, 1, 0, 250));
//!
//! for plot in controls.render(&store)? {
//!     renderer.draw_line(&plot.time_axis, &plot.values, &plot.title());
//! }
//! ```

mod controls;

pub use controls::{
    ResolvedEntry, SequenceControlEntry, SequenceControlSet, SequencePlot, MAX_SEQUENCE_PLOTS,
};
