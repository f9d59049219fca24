//! Error types for board updates.

use thiserror::Error;

use crate::model::{EventKind, OrderId};

/// Reason an event left the board unchanged.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("order {0} is already on the board")]
    DuplicateOrder(OrderId),

    #[error("{0}: order {1} not found")]
    NotFound(EventKind, OrderId),
}
