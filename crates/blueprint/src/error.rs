//! Error types for Blueprint operations.
//!
//! Only caller errors and load failures surface as [`BlueprintError`].
//! Interactive rejections — an incompatible connection attempt, a disallowed
//! drop — are not errors: the gesture is discarded and, where useful, a
//! notification is queued instead.

use thiserror::Error;

use crate::item::ItemId;

/// The main error type for Blueprint operations.
#[derive(Debug, Error, PartialEq)]
pub enum BlueprintError {
    /// An item kind was offered to a stack whose policy rejects it.
    #[error("item '{item}' is not allowed in stack '{stack}'")]
    DisallowedItem { item: String, stack: String },

    /// An operation referenced an item id that is not in the diagram.
    #[error("unknown item id {0}")]
    UnknownItem(ItemId),

    /// A load or draft operation needed a column that the diagram lacks.
    #[error("no column can accept '{0}'")]
    NoColumn(String),
}
