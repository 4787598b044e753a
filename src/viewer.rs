//! The client half: ask the proxy for a feed, render it, and keep the
//! display slots (loading, error, content) in a consistent state.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use reqwest::{Client, Url};
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::render::{render, RenderError, RenderedView};
use crate::storage::{KeyValueStore, SavedFeeds, ThemeStore};

const FALLBACK_FETCH_MESSAGE: &str = "Failed to fetch RSS feed";

#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("Please enter an RSS feed URL")]
    EmptyUrl,

    /// The proxy answered with an error body; the message is shown as-is.
    #[error("{0}")]
    Proxy(String),

    #[error("Failed to fetch RSS feed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error(transparent)]
    Render(#[from] RenderError),
}

#[derive(Deserialize)]
struct ProxyErrorBody {
    message: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct DisplayState {
    pub loading: bool,
    pub error: Option<String>,
    pub content: Option<RenderedView>,
}

/// Shared handle to what is currently on screen.
#[derive(Clone, Default)]
pub struct Display {
    state: Arc<Mutex<DisplayState>>,
}

impl Display {
    pub fn snapshot(&self) -> DisplayState {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, DisplayState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Clears the previous result and shows the loading indicator until
    /// the returned guard is dropped.
    fn begin_load(&self) -> LoadingGuard {
        let mut state = self.lock();
        state.error = None;
        state.content = None;
        state.loading = true;
        LoadingGuard {
            display: self.clone(),
        }
    }

    fn show_view(&self, view: RenderedView) {
        let mut state = self.lock();
        state.error = None;
        state.content = Some(view);
    }

    fn show_error(&self, message: String) {
        let mut state = self.lock();
        state.content = None;
        state.error = Some(message);
    }
}

pub struct LoadingGuard {
    display: Display,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.display.lock().loading = false;
    }
}

pub struct Viewer {
    client: Client,
    proxy_base: Url,
    display: Display,
}

impl Viewer {
    pub fn new(proxy_base: Url) -> reqwest::Result<Self> {
        let client = Client::builder()
            .user_agent("feedview/1.0")
            .build()?;

        Ok(Self {
            client,
            proxy_base,
            display: Display::default(),
        })
    }

    pub fn display(&self) -> &Display {
        &self.display
    }

    /// Loads `url` through the proxy and puts the outcome on the display.
    ///
    /// Loads are not coordinated: if two overlap, whichever settles last
    /// owns the display.
    pub async fn load_feed(&self, url: &str) {
        let url = url.trim();
        if url.is_empty() {
            self.display.show_error(ViewerError::EmptyUrl.to_string());
            return;
        }

        let _loading = self.display.begin_load();
        match self.fetch_view(url).await {
            Ok(view) => {
                info!("Rendered {} entries from {}", view.feed.entries.len(), url);
                self.display.show_view(view);
            }
            Err(e) => {
                warn!("Failed to load {}: {}", url, e);
                self.display.show_error(e.to_string());
            }
        }
    }

    pub async fn fetch_view(&self, url: &str) -> Result<RenderedView, ViewerError> {
        let response = self.client.get(self.endpoint(url)).send().await?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ProxyErrorBody>(&body)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or_else(|| FALLBACK_FETCH_MESSAGE.to_string());
            return Err(ViewerError::Proxy(message));
        }

        let xml = response.text().await?;
        Ok(render(&xml)?)
    }

    fn endpoint(&self, url: &str) -> Url {
        let mut endpoint = self.proxy_base.clone();
        endpoint.set_path("/api/rss");
        endpoint.query_pairs_mut().clear().append_pair("url", url);
        endpoint
    }
}

/// Everything the viewer needs, owned by the entry point.
pub struct AppContext {
    pub saved_feeds: SavedFeeds,
    pub theme: ThemeStore,
    pub viewer: Viewer,
}

impl AppContext {
    pub fn new(store: Arc<dyn KeyValueStore>, viewer: Viewer) -> Self {
        Self {
            saved_feeds: SavedFeeds::load(store.clone()),
            theme: ThemeStore::load(store),
            viewer,
        }
    }
}
