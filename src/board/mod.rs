//! Order list reducer.
//!
//! The board holds a store's orders, most recent first, and folds stream
//! events into it: new orders are prepended, updates replace the entry with
//! the same id, cancellations remove it. Events are applied in arrival order
//! and the last write wins.

use std::collections::{BTreeMap, HashMap};
use tokio_stream::{Stream, StreamExt};
use tracing::{info, warn};

use crate::model::{EventKind, Order, OrderId, StreamEvent};

mod change;
pub use change::BoardChange;

mod error;
pub use error::BoardError;

/// In-memory list of a store's orders, keyed by order id.
///
/// Orders are stored by display rank. Prepended orders rank above every
/// other entry and seeded history ranks below, so the highest rank is the
/// most recent.
#[derive(Debug, Default)]
pub struct OrderBoard {
    orders: BTreeMap<i64, Order>,
    ranks: HashMap<OrderId, i64>,
    front: i64,
    back: i64,
}

/// Public API
impl OrderBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the board over the given event stream
    pub async fn run(&mut self, mut stream: impl Stream<Item = StreamEvent> + Unpin) {
        while let Some(event) = stream.next().await {
            // a rejected event leaves the board untouched, keep consuming
            let _ = self.apply(event);
        }
    }

    /// Orders currently on the board, most recent first.
    pub fn orders(&self) -> impl ExactSizeIterator<Item = &Order> + '_ {
        self.orders.values().rev()
    }

    pub fn get(&self, id: &OrderId) -> Option<&Order> {
        self.ranks.get(id).and_then(|rank| self.orders.get(rank))
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Load order history behind whatever is already on the board.
    ///
    /// `history` is expected most recent first, as served by the history
    /// endpoint. Orders already present (delivered by the stream while the
    /// history was loading) are kept and the stale copy is skipped.
    pub fn seed(&mut self, history: impl IntoIterator<Item = Order>) -> usize {
        let mut added = 0;
        for order in history {
            if self.ranks.contains_key(&order.id) {
                continue;
            }
            self.back -= 1;
            self.insert(self.back, order);
            added += 1;
        }
        info!(added, total = self.orders.len(), "board seeded");
        added
    }

    /// Apply a single event on top of the current board
    pub fn apply(&mut self, event: StreamEvent) -> Result<BoardChange, BoardError> {
        let kind = event.kind();
        let id = event.order_id().clone();
        let result = match event {
            StreamEvent::NewOrder { order, .. } => self.apply_new(order),
            StreamEvent::OrderUpdated { order, .. } => self.apply_update(order),
            StreamEvent::OrderCancelled { id, .. } => self.apply_cancel(id),
        };

        match &result {
            Ok(change) => info!(kind = %kind, order = %id, change = %change, "event applied"),
            Err(e) => info!(kind = %kind, order = %id, reason = %e, "event skipped"),
        }
        result
    }
}

/// Private API
impl OrderBoard {
    fn insert(&mut self, rank: i64, order: Order) {
        self.ranks.insert(order.id.clone(), rank);
        self.orders.insert(rank, order);
    }

    /// `NEW_ORDER`: prepend, unless the id is already listed
    fn apply_new(&mut self, order: Order) -> Result<BoardChange, BoardError> {
        if self.ranks.contains_key(&order.id) {
            return Err(BoardError::DuplicateOrder(order.id));
        }

        let change = BoardChange::Added {
            id: order.id.clone(),
            status: order.status,
        };
        self.front += 1;
        self.insert(self.front, order);
        Ok(change)
    }

    /// `ORDER_UPDATED`: replace in place, keeping the entry's position
    fn apply_update(&mut self, order: Order) -> Result<BoardChange, BoardError> {
        let current = self
            .ranks
            .get(&order.id)
            .and_then(|rank| self.orders.get_mut(rank))
            .ok_or_else(|| BoardError::NotFound(EventKind::OrderUpdated, order.id.clone()))?;

        let from = current.status;
        let to = order.status;
        if from != to && !from.can_transition_to(to) {
            // out-of-order delivery or a backend correction; last write wins
            warn!(order = %order.id, %from, %to, "non-monotonic status change");
        }

        let change = BoardChange::Replaced {
            id: order.id.clone(),
            from,
            to,
        };
        *current = order;
        Ok(change)
    }

    /// `ORDER_CANCELLED`: remove the entry
    fn apply_cancel(&mut self, id: OrderId) -> Result<BoardChange, BoardError> {
        let rank = self
            .ranks
            .remove(&id)
            .ok_or_else(|| BoardError::NotFound(EventKind::OrderCancelled, id.clone()))?;

        self.orders.remove(&rank);
        Ok(BoardChange::Removed { id })
    }
}
