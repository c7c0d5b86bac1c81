//! Expansion controller
//!
//! Reconciles a chosen search result with the tree: expands the ancestors
//! that reveal it and, for category results, resolves the full entities and
//! selects the part type. Each request takes a selection generation from the
//! tree first. A request overtaken while suspended, by a later request or by a
//! direct selection in the tree, is reported as superseded and leaves the
//! newer state alone.

use chrono::Utc;
use futures::future::join_all;
use thiserror::Error;
use tracing::{debug, warn};

use partnav_common::events::NavigatorEvent;
use partnav_common::{
    Category, PartSelection, SearchResult, SelectedPath, UnresolvedEntity, VehicleCoordinates,
};

use crate::compositor::{resolve_selection, SelectionRequest};
use crate::generation::GenerationCounter;
use crate::tree::{FitmentTree, TreeNode};

/// Imperative commands accepted by the navigator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigatorCommand {
    /// Reveal the vehicle coordinates a result carries
    ExpandToVehicle(SearchResult),
    /// Reveal and select a category under a fully specified vehicle
    ExpandToCategory(SearchResult),
    /// Flip a single node
    Toggle(TreeNode),
    /// Overwrite the selected path
    Select(SelectedPath),
}

/// Why a command was refused without touching the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("result carries no vehicle coordinates")]
    NoVehicle,

    #[error("vehicle coordinates skip a level")]
    NotAPrefix,

    #[error("result is not a category")]
    NotACategory,

    #[error("category result needs year, make, model and engine")]
    IncompleteVehicle,
}

/// Result of one command
#[derive(Debug, Clone, PartialEq)]
pub enum ExpansionOutcome {
    /// Ancestors expanded and the path selected
    Revealed { path: SelectedPath },
    /// Part type resolved and selected
    Selected(PartSelection),
    Toggled { expanded: bool },
    /// Path overwritten
    PathSelected,
    Rejected(RejectReason),
    /// Some ids did not resolve; ancestors stay expanded, nothing selected
    ResolutionFailed { unresolved: Vec<UnresolvedEntity> },
    /// A later request started while this one was suspended
    Superseded { generation: u64 },
}

/// Applies [`NavigatorCommand`]s to a [`FitmentTree`]
#[derive(Debug, Clone)]
pub struct ExpansionController {
    tree: FitmentTree,
    generation: GenerationCounter,
}

impl ExpansionController {
    pub fn new(tree: FitmentTree) -> Self {
        let generation = tree.selection_generation().clone();
        Self { tree, generation }
    }

    pub fn tree(&self) -> &FitmentTree {
        &self.tree
    }

    /// Latest generation issued
    pub fn generation(&self) -> u64 {
        self.generation.current()
    }

    pub async fn execute(&self, command: NavigatorCommand) -> ExpansionOutcome {
        match command {
            NavigatorCommand::ExpandToVehicle(result) => self.expand_to_vehicle(&result).await,
            NavigatorCommand::ExpandToCategory(result) => self.expand_to_category(&result).await,
            NavigatorCommand::Toggle(node) => ExpansionOutcome::Toggled {
                expanded: self.tree.toggle(node).await,
            },
            NavigatorCommand::Select(path) => {
                self.tree.select(path).await;
                ExpansionOutcome::PathSelected
            }
        }
    }

    /// Expand the year, make, model and engine nodes a result carries
    ///
    /// The selected path becomes exactly those coordinates. Nodes already
    /// expanded are not fetched again.
    pub async fn expand_to_vehicle(&self, result: &SearchResult) -> ExpansionOutcome {
        let Some(vehicle) = result.vehicle().filter(|v| !v.is_empty()) else {
            return ExpansionOutcome::Rejected(RejectReason::NoVehicle);
        };
        if !vehicle.is_prefix() {
            return ExpansionOutcome::Rejected(RejectReason::NotAPrefix);
        }

        let generation = self.generation.next();
        let path = SelectedPath::from_vehicle(vehicle);
        if !self.tree.select_if_current(path.clone(), generation).await {
            return ExpansionOutcome::Superseded { generation };
        }
        debug!(generation, label = %result.label(), "Revealing vehicle");

        self.reveal(vehicle).await;
        if !self.generation.is_current(generation) {
            return ExpansionOutcome::Superseded { generation };
        }

        ExpansionOutcome::Revealed { path }
    }

    /// Reveal and select a category for a fully specified vehicle
    ///
    /// Expands every vehicle ancestor plus the category's parent while the
    /// make, model and engine lists are fetched alongside. Selection happens
    /// only when every id resolves and no later request has started.
    pub async fn expand_to_category(&self, result: &SearchResult) -> ExpansionOutcome {
        let Some(request) = SelectionRequest::from_result(result) else {
            let reason = match result {
                SearchResult::Category { .. } => RejectReason::IncompleteVehicle,
                _ => RejectReason::NotACategory,
            };
            return ExpansionOutcome::Rejected(reason);
        };
        let Some(vehicle) = result.vehicle() else {
            return ExpansionOutcome::Rejected(RejectReason::IncompleteVehicle);
        };

        let generation = self.generation.next();
        debug!(generation, label = %result.label(), "Revealing category");

        let categories: Vec<Category> = self.tree.ensure_categories().await.unwrap_or_else(|e| {
            warn!("Category list unavailable: {}", e);
            Vec::new()
        });
        let parent_id = categories
            .iter()
            .find(|c| c.id == request.category_id)
            .and_then(|c| c.parent_id);

        let provider = self.tree.provider();
        let reveal = async {
            self.reveal(vehicle).await;
            if let Some(parent_id) = parent_id {
                self.tree.expand(TreeNode::Category(parent_id)).await;
            }
        };
        let fetch = async {
            tokio::join!(
                provider.get_makes(request.year),
                provider.get_models(request.make_id, request.year),
                provider.get_engines(request.model_id),
            )
        };
        let ((), (makes, models, engines)) = tokio::join!(reveal, fetch);

        if !self.generation.is_current(generation) {
            debug!(generation, latest = self.generation.current(), "Dropping superseded category expansion");
            return ExpansionOutcome::Superseded { generation };
        }

        let makes = makes.unwrap_or_else(|e| {
            warn!(year = request.year, "Make fetch failed: {}", e);
            Vec::new()
        });
        let models = models.unwrap_or_else(|e| {
            warn!(make_id = request.make_id, "Model fetch failed: {}", e);
            Vec::new()
        });
        let engines = engines.unwrap_or_else(|e| {
            warn!(model_id = request.model_id, "Engine fetch failed: {}", e);
            Vec::new()
        });

        match resolve_selection(&request, &makes, &models, &engines, &categories) {
            Ok(selection) => {
                if !self.tree.select_part_type_if_current(selection.clone(), generation).await {
                    return ExpansionOutcome::Superseded { generation };
                }
                ExpansionOutcome::Selected(selection)
            }
            Err(unresolved) => {
                let missing: Vec<String> = unresolved.iter().map(ToString::to_string).collect();
                warn!(label = %result.label(), "Could not resolve {}", missing.join(", "));
                self.tree.events().emit_lossy(NavigatorEvent::ResolutionFailed {
                    unresolved: unresolved.clone(),
                    timestamp: Utc::now(),
                });
                ExpansionOutcome::ResolutionFailed { unresolved }
            }
        }
    }

    /// Expand year, make and model together, then the engine
    ///
    /// The engine goes last so its vehicle announcement finds the names its
    /// ancestors loaded.
    async fn reveal(&self, vehicle: &VehicleCoordinates) {
        let mut ancestors = Vec::new();
        if let Some(year) = vehicle.year {
            ancestors.push(TreeNode::Year(year));
            if let Some(make_id) = vehicle.make_id {
                ancestors.push(TreeNode::Make { year, make_id });
                if let Some(model_id) = vehicle.model_id {
                    ancestors.push(TreeNode::Model { year, make_id, model_id });
                }
            }
        }
        join_all(ancestors.into_iter().map(|node| self.tree.expand(node))).await;

        if let (Some(year), Some(make_id), Some(model_id), Some(engine_id)) =
            (vehicle.year, vehicle.make_id, vehicle.model_id, vehicle.engine_id)
        {
            self.tree
                .expand(TreeNode::Engine { year, make_id, model_id, engine_id })
                .await;
        }
    }
}
