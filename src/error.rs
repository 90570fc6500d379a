//! Error types for the exploration engine.
//!
//! Only load-time failures are errors. Interaction-time coordinate problems
//! (out-of-range indices, empty time ranges, clicks outside the rendered
//! window) are clamped or dropped by the components that see them and never
//! reach this type.

use crate::store::TensorKind;
use std::fmt;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ExplorerError>;

/// Errors reported to the caller verbatim.
#[derive(Debug)]
pub enum ExplorerError {
    /// A tensor's rank or kind-specific invariant did not hold.
    ShapeMismatch {
        /// Which tensor was being loaded
        kind: TensorKind,
        /// Human-readable description of the violated invariant
        reason: String,
    },

    /// A shape region descriptor has fewer than the 4 required fields.
    MalformedRegion {
        /// Instance index (0-based)
        instance: usize,
        /// Shape index (0-based)
        shape: usize,
        /// Number of fields actually present
        fields: usize,
    },

    /// The tensor required by an operation has not been loaded.
    NotLoaded(TensorKind),

    /// Filesystem failure during import or export.
    Io(std::io::Error),

    /// NumPy (.npy / .npz) encoding or decoding failure.
    Npy(String),

    /// Invalid configuration.
    Config(String),
}

impl ExplorerError {
    pub(crate) fn shape_mismatch(kind: TensorKind, reason: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            kind,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ExplorerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShapeMismatch { kind, reason } => {
                write!(f, "shape mismatch in {kind}: {reason}")
            }
            Self::MalformedRegion {
                instance,
                shape,
                fields,
            } => write!(
                f,
                "malformed region descriptor for instance {} shape {}: {} fields, need at least 4",
                instance + 1,
                shape + 1,
                fields
            ),
            Self::NotLoaded(kind) => write!(f, "{kind} data is not loaded"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Npy(msg) => write!(f, "NumPy format error: {msg}"),
            Self::Config(msg) => write!(f, "invalid configuration: {msg}"),
        }
    }
}

impl std::error::Error for ExplorerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ExplorerError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
