//! Core runtime for Keyweave: unique and foreign indices, the constraint
//! notification channel between them, atomic row mutations, and the
//! observability sink.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod error;
pub mod identity;
pub mod index;
pub mod mutation;
pub mod obs;
pub mod row;

#[cfg(test)]
pub(crate) mod test_support;

///
/// CONSTANTS
///

/// Maximum length in bytes of an index name.
pub const MAX_INDEX_NAME_LEN: usize = 64;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors, sinks, or helpers are re-exported here.
///

pub mod prelude {
    pub use crate::{
        index::{Applied, ForeignIndex, RowIndex, UniqueIndex},
        mutation::RowMutation,
        row::{RecordVersion, Row, RowChange, Versioned},
    };
}
