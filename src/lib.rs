pub mod amount;
pub mod board;
pub mod client;
pub mod connector;
pub mod csv;
pub mod model;
pub mod replay;
pub mod session;
pub mod sse;

pub use amount::Amount;
pub use board::{BoardChange, BoardError, OrderBoard};
pub use client::{ApiClient, ClientConfig, ClientError};
pub use connector::{ConnectionState, EventTransport, StreamConnector};
pub use model::{Order, OrderId, OrderStatus, StoreSlug, StreamEvent};
