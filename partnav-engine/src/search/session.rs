//! Debounced search bar state
//!
//! Each keystroke restarts the debounce timer. When the timer fires, the
//! resolution runs as its own task so a later keystroke cancels only the
//! timer, never an in-flight provider call. Results are applied only when the
//! resolution's generation is still the latest, so a slow early query can
//! never overwrite the results of a faster later one.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use partnav_common::config::SearchConfig;
use partnav_common::{SearchResult, VehicleScope};

use crate::expansion::NavigatorCommand;
use crate::generation::GenerationCounter;
use crate::provider::CatalogProvider;

/// Which provider query backs the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    /// Vehicles and parts
    #[default]
    Catalog,
    /// Category names, annotated with the session's vehicle context
    Categories,
}

/// Snapshot of the search bar
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchView {
    pub query: String,
    pub results: Vec<SearchResult>,
    /// Dropdown visible
    pub open: bool,
    /// A resolution is in flight
    pub loading: bool,
    pub highlighted: Option<usize>,
}

/// What the surrounding app should do after a confirm or choose
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchAction {
    Vehicle(SearchResult),
    Part(SearchResult),
    Category(SearchResult),
    /// Enter pressed with nothing highlighted
    TextSearch(String),
}

impl SearchAction {
    fn for_result(result: SearchResult) -> Self {
        match result {
            SearchResult::Vehicle { .. } => SearchAction::Vehicle(result),
            SearchResult::Part { .. } => SearchAction::Part(result),
            SearchResult::Category { .. } => SearchAction::Category(result),
        }
    }

    /// Tree command this action maps to, if any
    pub fn into_command(self) -> Option<NavigatorCommand> {
        match self {
            SearchAction::Vehicle(result) => Some(NavigatorCommand::ExpandToVehicle(result)),
            SearchAction::Category(result) => Some(NavigatorCommand::ExpandToCategory(result)),
            SearchAction::Part(_) | SearchAction::TextSearch(_) => None,
        }
    }
}

/// Search bar state machine
pub struct SearchSession {
    provider: Arc<dyn CatalogProvider>,
    mode: SearchMode,
    debounce: Duration,
    min_query_len: usize,
    view: Arc<RwLock<SearchView>>,
    context: Arc<RwLock<Option<VehicleScope>>>,
    generation: GenerationCounter,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl SearchSession {
    pub fn new(provider: Arc<dyn CatalogProvider>, config: &SearchConfig) -> Self {
        Self {
            provider,
            mode: SearchMode::Catalog,
            debounce: config.debounce(),
            min_query_len: config.min_query_len,
            view: Arc::new(RwLock::new(SearchView::default())),
            context: Arc::new(RwLock::new(None)),
            generation: GenerationCounter::new(),
            pending: Mutex::new(None),
        }
    }

    pub fn with_mode(mut self, mode: SearchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> SearchMode {
        self.mode
    }

    /// Vehicle context used by category searches
    pub async fn set_context(&self, context: Option<VehicleScope>) {
        *self.context.write().await = context;
    }

    pub async fn context(&self) -> Option<VehicleScope> {
        self.context.read().await.clone()
    }

    pub async fn view(&self) -> SearchView {
        self.view.read().await.clone()
    }

    /// Latest generation issued by this session
    pub fn generation(&self) -> u64 {
        self.generation.current()
    }

    /// Replace the query text and schedule a debounced resolution
    pub async fn input(&self, query: impl Into<String>) {
        let query = query.into();
        let generation = self.generation.next();
        self.cancel_pending().await;

        let too_short = query.trim().chars().count() < self.min_query_len;
        {
            let mut view = self.view.write().await;
            view.query = query.clone();
            if too_short {
                view.results.clear();
                view.open = false;
                view.loading = false;
                view.highlighted = None;
            }
        }
        if too_short {
            return;
        }

        let resolution = Resolution {
            provider: Arc::clone(&self.provider),
            mode: self.mode,
            view: Arc::clone(&self.view),
            context: Arc::clone(&self.context),
            generation: self.generation.clone(),
        };
        let debounce = self.debounce;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            if !resolution.generation.is_current(generation) {
                return;
            }
            resolution.view.write().await.loading = true;
            // Detached: cancelling the timer must not cancel the provider call
            tokio::spawn(resolution.run(query, generation));
        });
        *self.pending.lock().await = Some(handle);
    }

    pub async fn highlight_next(&self) {
        let mut view = self.view.write().await;
        if !view.open || view.results.is_empty() {
            return;
        }
        let last = view.results.len() - 1;
        view.highlighted = Some(match view.highlighted {
            Some(i) => (i + 1).min(last),
            None => 0,
        });
    }

    /// Move the highlight up; moving up from the first row clears it
    pub async fn highlight_prev(&self) {
        let mut view = self.view.write().await;
        if !view.open {
            return;
        }
        view.highlighted = match view.highlighted {
            Some(i) if i > 0 => Some(i - 1),
            _ => None,
        };
    }

    /// Enter key
    pub async fn confirm(&self) -> Option<SearchAction> {
        let (open, highlighted, query) = {
            let view = self.view.read().await;
            (view.open, view.highlighted, view.query.clone())
        };

        if open {
            if let Some(index) = highlighted {
                if let Some(action) = self.choose(index).await {
                    return Some(action);
                }
            }
        }

        if query.trim().is_empty() {
            return None;
        }
        self.view.write().await.open = false;
        Some(SearchAction::TextSearch(query))
    }

    /// Pick a result by index
    ///
    /// The query becomes the result's label and the dropdown closes. No new
    /// resolution is scheduled for the replaced text.
    pub async fn choose(&self, index: usize) -> Option<SearchAction> {
        let result = {
            let view = self.view.read().await;
            view.results.get(index).cloned()?
        };

        self.generation.next();
        self.cancel_pending().await;

        let mut view = self.view.write().await;
        view.query = result.label().to_string();
        view.open = false;
        view.loading = false;
        view.highlighted = None;
        debug!(label = %result.label(), kind = result.kind(), "Search result chosen");

        Some(SearchAction::for_result(result))
    }

    /// Escape key or click outside
    pub async fn dismiss(&self) {
        self.view.write().await.open = false;
    }

    /// Focus reopens the dropdown when results are present
    pub async fn focus(&self) {
        let mut view = self.view.write().await;
        if !view.results.is_empty() {
            view.open = true;
        }
    }

    /// Clear button
    pub async fn clear(&self) {
        self.generation.next();
        self.cancel_pending().await;
        *self.view.write().await = SearchView::default();
    }

    async fn cancel_pending(&self) {
        if let Some(handle) = self.pending.lock().await.take() {
            handle.abort();
        }
    }
}

impl std::fmt::Debug for SearchSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchSession")
            .field("mode", &self.mode)
            .field("debounce", &self.debounce)
            .field("min_query_len", &self.min_query_len)
            .field("generation", &self.generation.current())
            .finish()
    }
}

/// One fired resolution, owned by its task
struct Resolution {
    provider: Arc<dyn CatalogProvider>,
    mode: SearchMode,
    view: Arc<RwLock<SearchView>>,
    context: Arc<RwLock<Option<VehicleScope>>>,
    generation: GenerationCounter,
}

impl Resolution {
    async fn run(self, query: String, generation: u64) {
        let outcome = match self.mode {
            SearchMode::Catalog => self.provider.search(&query).await,
            SearchMode::Categories => {
                let context = self.context.read().await.clone();
                self.provider.search_categories(&query, context.as_ref()).await
            }
        };

        if !self.generation.is_current(generation) {
            debug!(generation, latest = self.generation.current(), "Dropping stale search results");
            return;
        }

        let mut view = self.view.write().await;
        view.loading = false;
        view.highlighted = None;
        match outcome {
            Ok(results) => {
                view.open = !results.is_empty();
                view.results = results;
            }
            Err(e) => {
                warn!("Search failed for {:?}: {}", query, e);
                view.results.clear();
                view.open = false;
            }
        }
    }
}
