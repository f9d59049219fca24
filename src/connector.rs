//! Event source connector.
//!
//! Holds one streaming connection per store, decodes its server-sent events
//! and forwards the typed [`StreamEvent`]s to a channel in arrival order.
//! There is no automatic retry: a dropped connection is reported through
//! [`ConnectionState::Error`] and stays down until [`StreamConnector::reconnect`].

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use std::fmt;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::client::ClientResult;
use crate::model::{StoreSlug, StreamEvent, parse_event};
use crate::sse::SseDecoder;

/// Raw body of an event stream, chunk by chunk.
pub type ByteStream = Pin<Box<dyn Stream<Item = ClientResult<Vec<u8>>> + Send>>;

/// Opens the streaming connection of a store.
#[async_trait]
pub trait EventTransport: Send + Sync + 'static {
    /// Open the stream, resuming after `last_event_id` when the server supports it.
    async fn open(&self, store: &StoreSlug, last_event_id: Option<&str>)
    -> ClientResult<ByteStream>;
}

/// Connection state surfaced for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected,
    Error(String),
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Connecting => f.write_str("connecting"),
            ConnectionState::Connected => f.write_str("connected"),
            ConnectionState::Error(message) => write!(f, "error: {message}"),
            ConnectionState::Closed => f.write_str("closed"),
        }
    }
}

/// Live connection to a store's order stream.
pub struct StreamConnector<T: EventTransport> {
    transport: Arc<T>,
    store: StoreSlug,
    events: mpsc::Sender<StreamEvent>,
    state: Arc<watch::Sender<ConnectionState>>,
    last_event_id: Arc<Mutex<Option<String>>>,
    task: Option<JoinHandle<()>>,
}

impl<T: EventTransport> StreamConnector<T> {
    /// Open the stream of `store` and start forwarding its events.
    ///
    /// Must be called from within a tokio runtime.
    pub fn connect(
        transport: Arc<T>,
        store: StoreSlug,
        events: mpsc::Sender<StreamEvent>,
    ) -> Self {
        let (state, _) = watch::channel(ConnectionState::Connecting);
        let mut connector = Self {
            transport,
            store,
            events,
            state: Arc::new(state),
            last_event_id: Arc::new(Mutex::new(None)),
            task: None,
        };
        connector.spawn();
        connector
    }

    pub fn store(&self) -> &StoreSlug {
        &self.store
    }

    /// Subscribe to connection state changes.
    pub fn state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        *self.state.borrow() == ConnectionState::Connected
    }

    /// Error message of the last failure, while in the error state.
    pub fn last_error(&self) -> Option<String> {
        match &*self.state.borrow() {
            ConnectionState::Error(message) => Some(message.clone()),
            _ => None,
        }
    }

    pub fn last_event_id(&self) -> Option<String> {
        self.last_event_id
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Close the current connection and open a new one.
    pub async fn reconnect(&mut self) {
        info!(store = %self.store, "reconnecting");
        self.stop().await;
        self.spawn();
    }

    /// Close the connection. No event is forwarded once this returns.
    pub async fn close(&mut self) {
        self.stop().await;
        self.state.send_replace(ConnectionState::Closed);
        info!(store = %self.store, "stream closed");
    }

    fn spawn(&mut self) {
        self.state.send_replace(ConnectionState::Connecting);
        let listener = Listener {
            transport: Arc::clone(&self.transport),
            store: self.store.clone(),
            events: self.events.clone(),
            state: Arc::clone(&self.state),
            last_event_id: Arc::clone(&self.last_event_id),
        };
        self.task = Some(tokio::spawn(listener.run()));
    }

    async fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            // join so that an in-flight send cannot land after we return
            let _ = task.await;
        }
    }
}

impl<T: EventTransport> Drop for StreamConnector<T> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.state.send_replace(ConnectionState::Closed);
    }
}

/// State moved into the spawned listener task.
struct Listener<T: EventTransport> {
    transport: Arc<T>,
    store: StoreSlug,
    events: mpsc::Sender<StreamEvent>,
    state: Arc<watch::Sender<ConnectionState>>,
    last_event_id: Arc<Mutex<Option<String>>>,
}

impl<T: EventTransport> Listener<T> {
    async fn run(self) {
        let resume_from = self
            .last_event_id
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let mut body = match self.transport.open(&self.store, resume_from.as_deref()).await {
            Ok(body) => body,
            Err(e) => return self.fail(e.to_string()),
        };
        self.state.send_replace(ConnectionState::Connected);
        info!(store = %self.store, resume_from = ?resume_from, "stream connected");

        let mut decoder = SseDecoder::new();
        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => return self.fail(e.to_string()),
            };

            for frame in decoder.feed(&chunk) {
                match parse_event(&frame.data) {
                    Ok(Some(event)) => {
                        if self.events.send(event).await.is_err() {
                            debug!(store = %self.store, "event receiver dropped");
                            self.state.send_replace(ConnectionState::Closed);
                            return;
                        }
                    }
                    Ok(None) => debug!(
                        store = %self.store,
                        data = %frame.data,
                        "unknown event type ignored"
                    ),
                    Err(e) => warn!(store = %self.store, error = %e, "malformed event skipped"),
                }
                // only once the frame is handed over, so a resume never skips it
                self.remember(frame.id);
            }
        }

        self.fail("connection closed by server".to_string());
    }

    fn remember(&self, id: Option<String>) {
        if let Some(id) = id {
            *self
                .last_event_id
                .lock()
                .unwrap_or_else(PoisonError::into_inner) = Some(id);
        }
    }

    fn fail(&self, message: String) {
        warn!(store = %self.store, error = %message, "stream error");
        self.state.send_replace(ConnectionState::Error(message));
    }
}
