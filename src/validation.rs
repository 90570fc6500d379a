//! Dataset Validation Module
//!
//! Cross-tensor consistency checks and the load report. Load-time rank
//! checks live in the store and are hard failures; the checks here never
//! block a load. They report what the views will silently work around
//! (instance counts that disagree, regions running past the series, etc.).
//!
//! # Validation Categories
//!
//! 1. **Instance Agreement**: `x_train`, `arr_0`, `arr_1` have the same instance count
//! 2. **Region Descriptors**: at least 4 fields; end points inside the series
//! 3. **Shape Agreement**: heatmap and attention shape counts match `arr_0`
//! 4. **Value Ranges**: NaN/Inf detection
//!
//! # Usage
//!
//! ```ignore
//! use shape_explorer::validation::DatasetValidator;
//!
//! let checks = DatasetValidator::default().validate(&store);
//! for problem in checks.problems() {
//!     log::warn!("{}: {}", problem.name, problem.level);
//! }
//! ```

use crate::region::REGION_FIELDS;
use crate::store::{ArrayStore, TensorKind};
use ndarray::Axis;
use std::fmt;

/// Outcome of one check.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationLevel {
    /// Check passed
    Valid,
    /// The views work around the problem (clamping, no highlight)
    Warning(String),
    /// Data the views cannot display correctly
    Error(String),
}

impl ValidationLevel {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationLevel::Valid)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ValidationLevel::Error(_))
    }
}

impl fmt::Display for ValidationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationLevel::Valid => write!(f, "ok"),
            ValidationLevel::Warning(msg) => write!(f, "warning: {msg}"),
            ValidationLevel::Error(msg) => write!(f, "error: {msg}"),
        }
    }
}

/// One named check, e.g. `arr_1_instances` or `attention_finite`.
#[derive(Debug, Clone, PartialEq)]
pub struct Check {
    pub name: String,
    pub level: ValidationLevel,
}

/// Checks run against one store, in the order they ran.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationResult {
    checks: Vec<Check>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, name: impl Into<String>, level: ValidationLevel) {
        self.checks.push(Check {
            name: name.into(),
            level,
        });
    }

    fn pass(&mut self, name: impl Into<String>) {
        self.record(name, ValidationLevel::Valid);
    }

    fn warn(&mut self, name: impl Into<String>, msg: String) {
        self.record(name, ValidationLevel::Warning(msg));
    }

    fn fail(&mut self, name: impl Into<String>, msg: String) {
        self.record(name, ValidationLevel::Error(msg));
    }

    /// `pass` when `ok`, otherwise a warning built lazily.
    fn expect_or_warn(&mut self, name: impl Into<String>, ok: bool, msg: impl FnOnce() -> String) {
        if ok {
            self.pass(name);
        } else {
            self.warn(name, msg());
        }
    }

    /// No warnings and no errors.
    pub fn is_valid(&self) -> bool {
        self.checks.iter().all(|c| c.level.is_valid())
    }

    pub fn has_errors(&self) -> bool {
        self.checks.iter().any(|c| c.level.is_error())
    }

    /// Checks that did not pass.
    pub fn problems(&self) -> impl Iterator<Item = &Check> {
        self.checks.iter().filter(|c| !c.level.is_valid())
    }

    /// Warnings as `check: message`.
    pub fn warnings(&self) -> Vec<String> {
        self.messages(|level| match level {
            ValidationLevel::Warning(msg) => Some(msg),
            _ => None,
        })
    }

    /// Errors as `check: message`.
    pub fn errors(&self) -> Vec<String> {
        self.messages(|level| match level {
            ValidationLevel::Error(msg) => Some(msg),
            _ => None,
        })
    }

    fn messages(&self, pick: impl Fn(&ValidationLevel) -> Option<&String>) -> Vec<String> {
        self.checks
            .iter()
            .filter_map(|c| pick(&c.level).map(|msg| format!("{}: {msg}", c.name)))
            .collect()
    }

    /// Level recorded for a named check, if it ran.
    pub fn level(&self, name: &str) -> Option<&ValidationLevel> {
        self.checks.iter().find(|c| c.name == name).map(|c| &c.level)
    }

    pub fn check_count(&self) -> usize {
        self.checks.len()
    }

    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|c| c.level.is_valid()).count()
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Dataset checks: {}/{} passed",
            self.passed_count(),
            self.check_count()
        )?;
        for check in self.problems() {
            writeln!(f, "  - {}: {}", check.name, check.level)?;
        }
        Ok(())
    }
}

/// Configuration for dataset validation.
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    /// Check for NaN/Inf values in every loaded tensor
    pub check_nan_inf: bool,

    /// Check that region end points fit inside `x_train`'s time axis
    pub check_region_bounds: bool,

    /// Check that auxiliary tensors agree with the primary ones
    pub check_cross_tensor: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            check_nan_inf: true,
            check_region_bounds: true,
            check_cross_tensor: true,
        }
    }
}

/// Consistency checker for a loaded store.
#[derive(Debug, Clone, Default)]
pub struct DatasetValidator {
    config: ValidationConfig,
}

impl DatasetValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Run every enabled check against what is currently loaded.
    ///
    /// Checks involving an absent tensor are skipped.
    pub fn validate(&self, store: &ArrayStore) -> ValidationResult {
        let mut result = ValidationResult::new();

        if self.config.check_cross_tensor {
            self.validate_instance_agreement(store, &mut result);
            self.validate_shape_agreement(store, &mut result);
        }

        self.validate_region_fields(store, &mut result);

        if self.config.check_region_bounds {
            self.validate_region_bounds(store, &mut result);
        }

        if self.config.check_nan_inf {
            for kind in TensorKind::ALL {
                self.validate_finite(store, kind, &mut result);
            }
        }

        result
    }

    fn validate_instance_agreement(&self, store: &ArrayStore, result: &mut ValidationResult) {
        let Some([primary, _, _]) = store.shape_of(TensorKind::Instances) else {
            return;
        };

        for kind in [TensorKind::ShapeLengths, TensorKind::ShapeRegions] {
            if let Some([count, _, _]) = store.shape_of(kind) {
                result.expect_or_warn(format!("{kind}_instances"), count == primary, || {
                    format!("{kind} has {count} instances, x_train has {primary}")
                });
            }
        }
    }

    fn validate_shape_agreement(&self, store: &ArrayStore, result: &mut ValidationResult) {
        let Some([_, shapes, _]) = store.shape_of(TensorKind::ShapeLengths) else {
            return;
        };

        for kind in [
            TensorKind::ShapeRegions,
            TensorKind::Heatmap,
            TensorKind::Attention,
        ] {
            if let Some([_, count, _]) = store.shape_of(kind) {
                result.expect_or_warn(format!("{kind}_shapes"), count == shapes, || {
                    format!("{kind} has {count} shapes, arr_0 has {shapes}")
                });
            }
        }
    }

    fn validate_region_fields(&self, store: &ArrayStore, result: &mut ValidationResult) {
        let Some([_, _, fields]) = store.shape_of(TensorKind::ShapeRegions) else {
            return;
        };
        if fields < REGION_FIELDS {
            result.fail(
                "region_fields",
                format!("arr_1 has {fields} fields per shape, need at least {REGION_FIELDS}"),
            );
        } else {
            result.pass("region_fields");
        }
    }

    fn validate_region_bounds(&self, store: &ArrayStore, result: &mut ValidationResult) {
        let (Ok(regions), Ok(time_length)) = (
            store.tensor(TensorKind::ShapeRegions),
            store.time_length(),
        ) else {
            return;
        };
        if regions.dim().2 < REGION_FIELDS {
            return;
        }

        let t = time_length as i64;
        let mut outside = 0usize;
        let mut inverted = 0usize;
        for instance in regions.axis_iter(Axis(0)) {
            for vp in instance.axis_iter(Axis(0)) {
                let (start, end) = (vp[1] as i64, vp[2] as i64);
                if start < 0 || start >= t || end > t {
                    outside += 1;
                } else if start >= end {
                    inverted += 1;
                }
            }
        }

        result.expect_or_warn("region_bounds", outside == 0, || {
            format!("{outside} regions fall outside the time axis (length {time_length})")
        });
        result.expect_or_warn("region_order", inverted == 0, || {
            format!("{inverted} regions have start >= end and will not be highlighted")
        });
    }

    fn validate_finite(&self, store: &ArrayStore, kind: TensorKind, result: &mut ValidationResult) {
        let Ok(tensor) = store.tensor(kind) else {
            return;
        };
        let nan = tensor.iter().filter(|v| v.is_nan()).count();
        let inf = tensor.iter().filter(|v| v.is_infinite()).count();

        if nan == 0 && inf == 0 {
            result.pass(format!("{kind}_finite"));
        } else {
            result.fail(
                format!("{kind}_finite"),
                format!("{nan} NaN and {inf} infinite values"),
            );
        }
    }
}

/// Extents of the loaded dataset, for the load report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSummary {
    pub shapes: Vec<(TensorKind, [usize; 3])>,
    pub instance_count: Option<usize>,
    pub time_length: Option<usize>,
    pub variable_count: Option<usize>,
    pub shape_count: Option<usize>,
}

impl DatasetSummary {
    pub fn from_store(store: &ArrayStore) -> Self {
        Self {
            shapes: TensorKind::ALL
                .iter()
                .filter_map(|&k| store.shape_of(k).map(|s| (k, s)))
                .collect(),
            instance_count: store.instance_count().ok(),
            time_length: store.time_length().ok(),
            variable_count: store.variable_count().ok(),
            shape_count: store.shape_count().ok(),
        }
    }
}

impl fmt::Display for DatasetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.shapes.is_empty() {
            return writeln!(f, "No dataset loaded");
        }

        for (kind, [a, b, c]) in &self.shapes {
            writeln!(f, "  {kind} shape: ({a}, {b}, {c})")?;
        }

        let show = |v: Option<usize>| v.map_or_else(|| "-".to_string(), |n| n.to_string());
        writeln!(f, "Data ranges:")?;
        writeln!(f, "  Instance Number: {}", show(self.instance_count))?;
        writeln!(f, "  Time Length: {}", show(self.time_length))?;
        writeln!(f, "  Variable Number: {}", show(self.variable_count))?;
        writeln!(f, "  Shape Number: {}", show(self.shape_count))
    }
}

/// What a primary load reports back: extents plus consistency checks.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    pub summary: DatasetSummary,
    pub checks: ValidationResult,
}

impl LoadReport {
    pub fn from_store(store: &ArrayStore) -> Self {
        Self {
            summary: DatasetSummary::from_store(store),
            checks: DatasetValidator::new().validate(store),
        }
    }

    /// Send every failed check to the log: errors at `error!`, warnings at `warn!`.
    pub fn log_problems(&self) {
        for check in self.checks.problems() {
            match &check.level {
                ValidationLevel::Error(msg) => log::error!("{}: {msg}", check.name),
                ValidationLevel::Warning(msg) => log::warn!("{}: {msg}", check.name),
                ValidationLevel::Valid => {}
            }
        }
    }
}

impl fmt::Display for LoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.summary, self.checks)
    }
}
