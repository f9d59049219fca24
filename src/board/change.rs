use std::fmt;

use crate::model::{OrderId, OrderStatus};

/// What an applied event did to the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardChange {
    Added {
        id: OrderId,
        status: OrderStatus,
    },
    Replaced {
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    },
    Removed {
        id: OrderId,
    },
}

impl BoardChange {
    pub fn id(&self) -> &OrderId {
        match self {
            BoardChange::Added { id, .. }
            | BoardChange::Replaced { id, .. }
            | BoardChange::Removed { id } => id,
        }
    }
}

impl fmt::Display for BoardChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoardChange::Added { id, status } => write!(f, "+ {id} {status}"),
            BoardChange::Replaced { id, from, to } if from == to => write!(f, "~ {id} {to}"),
            BoardChange::Replaced { id, from, to } => write!(f, "~ {id} {from} -> {to}"),
            BoardChange::Removed { id } => write!(f, "- {id}"),
        }
    }
}
