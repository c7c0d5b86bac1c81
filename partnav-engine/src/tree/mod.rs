//! Fitment tree: lazily loaded year → make → model → engine hierarchy crossed
//! with the category forest
//!
//! Expanding a node is the only thing that fetches its children, and every
//! expansion fetches afresh. Collapsing never cancels a fetch in flight; a
//! fetch result is only discarded when a newer fetch for the same node was
//! issued after it.
//!
//! Every selection change takes a generation from the tree's counter while
//! holding the state lock. Work that suspended before committing a selection
//! commits only if its generation is still the latest.

pub mod node;
pub mod state;

pub use node::{NodeLoad, TreeNode};
pub use state::{TreeState, TreeStats};

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

use partnav_common::events::{EventBus, NavigatorEvent};
use partnav_common::{
    Category, CategoryId, Engine, EngineId, Error, Fitment, Make, MakeId, Model, ModelId, NodeKey,
    PartSelection, Result, SelectedPath, TreeLevel, VehicleScope, Year,
};

use crate::generation::GenerationCounter;
use crate::provider::CatalogProvider;

/// Root category with its children, in catalog order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryBranch {
    pub category: Category,
    pub children: Vec<Category>,
}

/// Shared handle to the navigator's tree
///
/// Cheap to clone; clones share state and the event bus.
#[derive(Clone)]
pub struct FitmentTree {
    provider: Arc<dyn CatalogProvider>,
    state: Arc<RwLock<TreeState>>,
    events: EventBus,
    selection_generation: GenerationCounter,
}

impl FitmentTree {
    pub fn new(provider: Arc<dyn CatalogProvider>, events: EventBus) -> Self {
        Self {
            provider,
            state: Arc::new(RwLock::new(TreeState::new())),
            events,
            selection_generation: GenerationCounter::new(),
        }
    }

    pub fn provider(&self) -> &Arc<dyn CatalogProvider> {
        &self.provider
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NavigatorEvent> {
        self.events.subscribe()
    }

    /// Counter every selection change draws from
    pub fn selection_generation(&self) -> &GenerationCounter {
        &self.selection_generation
    }

    /// Fetch the years and the category list
    pub async fn load_roots(&self) -> Result<()> {
        let (years, categories) =
            tokio::join!(self.provider.get_years(), self.provider.get_categories());
        let (years, categories) = (years?, categories?);

        info!(years = years.len(), categories = categories.len(), "Loaded tree roots");
        self.state.write().await.set_roots(years, categories);
        Ok(())
    }

    /// Category list, fetched first if the roots were never loaded
    pub async fn ensure_categories(&self) -> Result<Vec<Category>> {
        {
            let state = self.state.read().await;
            if !state.categories().is_empty() {
                return Ok(state.categories().to_vec());
            }
        }

        let categories = self.provider.get_categories().await?;
        self.state.write().await.set_categories(categories.clone());
        Ok(categories)
    }

    pub async fn years(&self) -> Vec<Year> {
        self.state.read().await.years().to_vec()
    }

    pub async fn categories(&self) -> Vec<Category> {
        self.state.read().await.categories().to_vec()
    }

    /// Roots in list order, each with its children in list order
    pub async fn category_tree(&self) -> Vec<CategoryBranch> {
        let state = self.state.read().await;
        let categories = state.categories();
        categories
            .iter()
            .filter(|c| c.is_root())
            .map(|root| CategoryBranch {
                category: root.clone(),
                children: categories
                    .iter()
                    .filter(|c| c.parent_id == Some(root.id))
                    .cloned()
                    .collect(),
            })
            .collect()
    }

    /// Flip a node; returns the new expanded state
    ///
    /// The decision and the flip happen under one write guard.
    pub async fn toggle(&self, node: TreeNode) -> bool {
        let key = node.key();
        let ticket = {
            let mut state = self.state.write().await;
            if state.collapse(&key) {
                None
            } else {
                state.expand(key);
                Some(Self::issue_ticket(&mut state, node))
            }
        };

        match ticket {
            Some(ticket) => {
                self.after_expand(node, ticket).await;
                true
            }
            None => {
                self.after_collapse(key);
                false
            }
        }
    }

    /// Expand a node and wait for its child fetch
    ///
    /// Already expanded nodes are left alone (no fetch). Returns true when the
    /// node was newly expanded.
    pub async fn expand(&self, node: TreeNode) -> bool {
        let key = node.key();
        let ticket = {
            let mut state = self.state.write().await;
            if !state.expand(key) {
                return false;
            }
            Self::issue_ticket(&mut state, node)
        };

        self.after_expand(node, ticket).await;
        true
    }

    /// Collapse a node; returns false when it was not expanded
    pub async fn collapse(&self, node: TreeNode) -> bool {
        let key = node.key();
        if !self.state.write().await.collapse(&key) {
            return false;
        }

        self.after_collapse(key);
        true
    }

    /// Fetch ticket for a node that was just expanded; `None` when the level
    /// has no children to fetch
    fn issue_ticket(state: &mut TreeState, node: TreeNode) -> Option<u64> {
        match node.level() {
            TreeLevel::Year | TreeLevel::Make | TreeLevel::Model => Some(state.begin_load(node.key())),
            TreeLevel::Engine | TreeLevel::Category => None,
        }
    }

    async fn after_expand(&self, node: TreeNode, ticket: Option<u64>) {
        let key = node.key();
        debug!(%key, "Expanded node");
        self.events.emit_lossy(NavigatorEvent::NodeExpanded { key, timestamp: Utc::now() });

        match ticket {
            Some(ticket) => self.fetch_children(node, ticket).await,
            None if node.level() == TreeLevel::Engine => self.announce_vehicle(node).await,
            None => {}
        }
    }

    fn after_collapse(&self, key: NodeKey) {
        debug!(%key, "Collapsed node");
        self.events.emit_lossy(NavigatorEvent::NodeCollapsed { key, timestamp: Utc::now() });
    }

    pub async fn is_expanded(&self, key: &NodeKey) -> bool {
        self.state.read().await.is_expanded(key)
    }

    pub async fn node_load(&self, key: &NodeKey) -> Option<NodeLoad> {
        self.state.read().await.load(key).cloned()
    }

    pub async fn makes(&self, year: Year) -> Option<Vec<Make>> {
        self.state.read().await.makes(year).map(<[Make]>::to_vec)
    }

    pub async fn models(&self, year: Year, make_id: MakeId) -> Option<Vec<Model>> {
        self.state.read().await.models(year, make_id).map(<[Model]>::to_vec)
    }

    pub async fn engines(&self, make_id: MakeId, model_id: ModelId) -> Option<Vec<Engine>> {
        self.state.read().await.engines(make_id, model_id).map(<[Engine]>::to_vec)
    }

    /// Replace the selected path wholesale
    ///
    /// Supersedes any selection still pending; returns the generation taken.
    pub async fn select(&self, path: SelectedPath) -> u64 {
        let mut state = self.state.write().await;
        let generation = self.selection_generation.next();
        debug!(?path, generation, "Selected path");
        state.select(path);
        generation
    }

    /// Replace the selected path unless a later selection generation was issued
    pub async fn select_if_current(&self, path: SelectedPath, generation: u64) -> bool {
        let mut state = self.state.write().await;
        if !self.selection_generation.is_current(generation) {
            debug!(?path, generation, "Dropping superseded path selection");
            return false;
        }
        debug!(?path, generation, "Selected path");
        state.select(path);
        true
    }

    pub async fn selected_path(&self) -> SelectedPath {
        self.state.read().await.selected().clone()
    }

    /// Part type currently selected, if the path still points at one
    pub async fn part_selection(&self) -> Option<PartSelection> {
        self.state.read().await.part_selection().cloned()
    }

    /// Point the selection at a resolved part type and announce it
    ///
    /// Supersedes any selection still pending; returns the generation taken.
    pub async fn select_part_type(&self, selection: PartSelection) -> u64 {
        let generation = {
            let mut state = self.state.write().await;
            let generation = self.selection_generation.next();
            state.select_part(selection.clone());
            generation
        };
        self.announce_part_type(selection);
        generation
    }

    /// Select a resolved part type unless a later selection generation was
    /// issued; nothing is announced when superseded
    pub async fn select_part_type_if_current(&self, selection: PartSelection, generation: u64) -> bool {
        {
            let mut state = self.state.write().await;
            if !self.selection_generation.is_current(generation) {
                debug!(generation, category = %selection.category.name, "Dropping superseded part type");
                return false;
            }
            state.select_part(selection.clone());
        }
        self.announce_part_type(selection);
        true
    }

    fn announce_part_type(&self, selection: PartSelection) {
        info!(
            year = selection.year,
            make = %selection.make.name,
            model = %selection.model.name,
            engine = %selection.engine.name,
            category = %selection.category.name,
            "Part type selected"
        );
        self.events.emit_lossy(NavigatorEvent::PartTypeSelected {
            selection,
            timestamp: Utc::now(),
        });
    }

    /// Click on a category row under an engine
    ///
    /// A category with children toggles open or closed. A leaf category
    /// becomes the selected part type for `fitment`.
    pub async fn activate_category(
        &self,
        category_id: CategoryId,
        fitment: Fitment,
    ) -> Result<Option<PartSelection>> {
        let (category, has_children) = {
            let state = self.state.read().await;
            let categories = state.categories();
            let category = categories.iter().find(|c| c.id == category_id).cloned();
            let has_children = categories.iter().any(|c| c.parent_id == Some(category_id));
            (category, has_children)
        };
        let category =
            category.ok_or_else(|| Error::NotFound(format!("category {}", category_id)))?;

        if has_children {
            self.toggle(TreeNode::Category(category_id)).await;
            return Ok(None);
        }

        let selection = PartSelection::new(fitment, category);
        self.select_part_type(selection.clone()).await;
        Ok(Some(selection))
    }

    /// Row highlight: the selected category under the selected engine
    pub async fn is_highlighted(&self, category_id: CategoryId, engine_id: EngineId) -> bool {
        let state = self.state.read().await;
        let selected = state.selected();
        selected.category_id == Some(category_id) && selected.engine_id == Some(engine_id)
    }

    pub async fn expanded_keys(&self, level: Option<TreeLevel>) -> Vec<NodeKey> {
        self.state.read().await.expanded_keys(level)
    }

    pub async fn stats(&self) -> TreeStats {
        self.state.read().await.stats()
    }

    async fn fetch_children(&self, node: TreeNode, ticket: u64) {
        let key = node.key();
        let fetched = match node {
            TreeNode::Year(year) => self.provider.get_makes(year).await.map(NodeLoad::Makes),
            TreeNode::Make { year, make_id } => {
                self.provider.get_models(make_id, year).await.map(NodeLoad::Models)
            }
            TreeNode::Model { model_id, .. } => {
                self.provider.get_engines(model_id).await.map(NodeLoad::Engines)
            }
            TreeNode::Engine { .. } | TreeNode::Category(_) => return,
        };

        let (load, failure) = match fetched {
            Ok(load) => (load, None),
            Err(e) => (NodeLoad::Failed(e.to_string()), Some(e.to_string())),
        };
        let count = load.len();

        if !self.state.write().await.finish_load(key, ticket, load) {
            debug!(%key, ticket, "Discarding superseded child fetch");
            return;
        }

        match failure {
            Some(message) => {
                warn!(%key, "Child fetch failed: {}", message);
                self.events.emit_lossy(NavigatorEvent::NodeLoadFailed {
                    key,
                    message,
                    timestamp: Utc::now(),
                });
            }
            None => debug!(%key, count, "Loaded children"),
        }
    }

    /// Emit the vehicle context of an expanded engine
    ///
    /// Names come from the loaded make, model and engine lists; an engine
    /// expanded without them loaded announces nothing.
    async fn announce_vehicle(&self, node: TreeNode) {
        let TreeNode::Engine { year, make_id, model_id, engine_id } = node else {
            return;
        };

        let scope = {
            let state = self.state.read().await;
            let make = state.makes(year).and_then(|m| m.iter().find(|m| m.id == make_id));
            let model = state.models(year, make_id).and_then(|m| m.iter().find(|m| m.id == model_id));
            let engine = state
                .engines(make_id, model_id)
                .and_then(|e| e.iter().find(|e| e.id == engine_id));

            match (make, model, engine) {
                (Some(make), Some(model), Some(engine)) => VehicleScope {
                    year,
                    make_id,
                    make_name: make.name.clone(),
                    model_id,
                    model_name: model.name.clone(),
                    engine_id: Some(engine_id),
                    engine_name: Some(engine.name.clone()),
                },
                _ => {
                    debug!(engine_id, "Engine expanded before its ancestors loaded");
                    return;
                }
            }
        };

        self.events.emit_lossy(NavigatorEvent::VehicleExpanded { scope, timestamp: Utc::now() });
    }
}

impl std::fmt::Debug for FitmentTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FitmentTree").field("events", &self.events).finish()
    }
}
