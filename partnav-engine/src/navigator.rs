//! Navigator session
//!
//! Wires the tree, the expansion controller and both search bars to one
//! provider and one event bus. The category search bar follows the vehicle
//! context announced on the bus (engine expansions and part-type selections).

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use partnav_common::config::NavigatorConfig;
use partnav_common::events::{EventBus, NavigatorEvent};
use partnav_common::{Part, Result};

use crate::compositor::compose_breadcrumb;
use crate::expansion::{ExpansionController, ExpansionOutcome, NavigatorCommand};
use crate::parts::{filter_parts, group_by_position, parts_for_selection};
use crate::provider::CatalogProvider;
use crate::search::{SearchAction, SearchMode, SearchSession};
use crate::tree::FitmentTree;

/// One navigator session over a catalog provider
pub struct Navigator {
    events: EventBus,
    tree: FitmentTree,
    controller: ExpansionController,
    search: SearchSession,
    category_search: Arc<SearchSession>,
    context_follower: JoinHandle<()>,
}

impl Navigator {
    /// Build the session and load the tree roots
    pub async fn start(provider: Arc<dyn CatalogProvider>, config: &NavigatorConfig) -> Result<Self> {
        let events = EventBus::new(config.events.capacity);
        let tree = FitmentTree::new(Arc::clone(&provider), events.clone());
        tree.load_roots().await?;

        let controller = ExpansionController::new(tree.clone());
        let search = SearchSession::new(Arc::clone(&provider), &config.search);
        let category_search = Arc::new(
            SearchSession::new(provider, &config.search).with_mode(SearchMode::Categories),
        );
        let context_follower =
            tokio::spawn(follow_vehicle_context(events.subscribe(), Arc::clone(&category_search)));

        info!(
            debounce_ms = config.search.debounce_ms,
            event_capacity = events.capacity(),
            "Navigator started"
        );

        Ok(Self { events, tree, controller, search, category_search, context_follower })
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NavigatorEvent> {
        self.events.subscribe()
    }

    pub fn tree(&self) -> &FitmentTree {
        &self.tree
    }

    pub fn controller(&self) -> &ExpansionController {
        &self.controller
    }

    /// Vehicle and part search bar
    pub fn search(&self) -> &SearchSession {
        &self.search
    }

    /// Category search bar, scoped to the current vehicle context
    pub fn category_search(&self) -> &SearchSession {
        &self.category_search
    }

    pub async fn execute(&self, command: NavigatorCommand) -> ExpansionOutcome {
        self.controller.execute(command).await
    }

    /// Carry out what a search bar confirm or choose asked for
    ///
    /// Returns `None` for actions that do not touch the tree (part picks and
    /// free-text searches are for the surrounding app).
    pub async fn apply(&self, action: SearchAction) -> Option<ExpansionOutcome> {
        let command = action.into_command()?;
        Some(self.execute(command).await)
    }

    /// Breadcrumb of the current part-type selection
    pub async fn breadcrumb(&self) -> String {
        let selection = self.tree.part_selection().await;
        compose_breadcrumb(selection.as_ref(), &self.tree.categories().await)
    }

    /// Parts for the current selection, filtered by `text`
    ///
    /// Empty when no part type is selected.
    pub async fn parts(&self, text: &str) -> Result<Vec<Part>> {
        let Some(selection) = self.tree.part_selection().await else {
            return Ok(Vec::new());
        };
        let parts = parts_for_selection(self.tree.provider().as_ref(), &selection).await?;
        Ok(filter_parts(&parts, text))
    }

    /// [`Navigator::parts`] grouped under their mounting position
    pub async fn parts_by_position(&self, text: &str) -> Result<BTreeMap<String, Vec<Part>>> {
        Ok(group_by_position(&self.parts(text).await?))
    }
}

impl Drop for Navigator {
    fn drop(&mut self) {
        self.context_follower.abort();
    }
}

impl std::fmt::Debug for Navigator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Navigator")
            .field("events", &self.events)
            .field("search", &self.search)
            .field("category_search", &self.category_search)
            .finish()
    }
}

/// Keep the category search context on the last announced vehicle
async fn follow_vehicle_context(
    mut rx: broadcast::Receiver<NavigatorEvent>,
    category_search: Arc<SearchSession>,
) {
    loop {
        match rx.recv().await {
            Ok(NavigatorEvent::VehicleExpanded { scope, .. }) => {
                debug!(engine_id = ?scope.engine_id, "Category search context from engine");
                category_search.set_context(Some(scope)).await;
            }
            Ok(NavigatorEvent::PartTypeSelected { selection, .. }) => {
                category_search.set_context(Some(selection.scope())).await;
            }
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("Context follower lagged {} events", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
