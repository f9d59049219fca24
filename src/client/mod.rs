//! HTTP client for the ordering backend.
//!
//! Covers the two public order endpoints a store dashboard needs: the
//! paginated order history and the server-sent event stream.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, header};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::connector::{ByteStream, EventTransport};
use crate::model::{Order, StoreSlug};

mod config;
pub use config::{ClientConfig, DEFAULT_BASE_URL};

mod error;
pub use error::{ClientError, ClientResult};

const HISTORY_PATH: &str = "orders/public";
const STREAM_PATH: &str = "orders/public/stream";

/// Pagination metadata of a history page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageMeta {
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

/// One page of order history, most recent first.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderPage {
    pub data: Vec<Order>,
    #[serde(default)]
    pub meta: PageMeta,
}

impl OrderPage {
    /// Whether a page after this one may exist.
    fn has_more(&self, requested: u32, limit: u32) -> bool {
        if self.data.len() < limit as usize {
            return false;
        }
        self.meta.total_pages == 0 || requested < self.meta.total_pages
    }
}

/// Client for the backend's public order endpoints
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    config: ClientConfig,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        // no client-wide timeout: it would also cut the event stream
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// URL of a store's event stream.
    pub fn stream_url(&self, store: &StoreSlug) -> String {
        format!("{}?storeSlug={}", self.config.url(STREAM_PATH), store)
    }

    /// Fetch one page (1-based) of a store's order history.
    pub async fn list_orders(
        &self,
        store: &StoreSlug,
        page: u32,
        limit: u32,
    ) -> ClientResult<OrderPage> {
        let request = self
            .client
            .get(self.config.url(HISTORY_PATH))
            .timeout(self.config.timeout)
            .query(&[("storeSlug", store.as_str())])
            .query(&[("page", page), ("limit", limit)]);

        let response = request.send().await?;
        Self::handle_response(response).await
    }

    /// Walk the history pages until the last one or `max_orders` orders.
    pub async fn fetch_history(
        &self,
        store: &StoreSlug,
        page_size: u32,
        max_orders: usize,
    ) -> ClientResult<Vec<Order>> {
        let page_size = page_size.max(1);
        let mut orders = Vec::new();
        let mut page = 1;

        while orders.len() < max_orders {
            let batch = self.list_orders(store, page, page_size).await?;
            let more = batch.has_more(page, page_size);
            debug!(store = %store, page, received = batch.data.len(), "history page");
            orders.extend(batch.data);
            if !more {
                break;
            }
            page += 1;
        }

        orders.truncate(max_orders);
        Ok(orders)
    }

    /// Handle the HTTP response
    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ClientError::from_status(status, text));
        }

        serde_json::from_str(&text).map_err(Into::into)
    }
}

#[async_trait]
impl EventTransport for ApiClient {
    async fn open(
        &self,
        store: &StoreSlug,
        last_event_id: Option<&str>,
    ) -> ClientResult<ByteStream> {
        let mut request = self
            .client
            .get(self.config.url(STREAM_PATH))
            .query(&[("storeSlug", store.as_str())])
            .header(header::ACCEPT, "text/event-stream")
            .header(header::CACHE_CONTROL, "no-cache");

        if let Some(id) = last_event_id {
            request = request.header("Last-Event-ID", id);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await?;
            return Err(ClientError::from_status(status, text));
        }

        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(ClientError::from));
        Ok(Box::pin(body))
    }
}
