//! ## Crate layout
//! - `core`: unique and foreign indices, row mutations, errors, and
//!   observability.
//!
//! The `prelude` module mirrors the surface used by table code that owns
//! rows and keeps their indices in step.

pub use keyweave_core as core;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//
// Re-exports
//

pub use crate::core::{
    error::{ErrorClass, IndexConfigError, IndexError},
    identity::{IndexName, IndexNameError},
    index::{
        Applied, DataAction, ForeignIndex, IndexChange, IndexListener, RowIndex, UniqueIndex,
    },
    mutation::{self, RowMutation},
    obs::{
        EventReport, MetricsEvent, MetricsSink, metrics_report, metrics_reset_all,
        with_metrics_sink,
    },
    row::{RecordVersion, Row, RowChange, Versioned},
};

///
/// Prelude
///

pub mod prelude {
    pub use crate::core::prelude::*;
    pub use crate::core::{error::IndexError, index::IndexListener as _};
}
