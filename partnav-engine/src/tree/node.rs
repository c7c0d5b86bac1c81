//! Tree node addresses and per-node load state

use serde::Serialize;

use partnav_common::{CategoryId, Engine, EngineId, Make, MakeId, Model, ModelId, NodeKey, TreeLevel, Year};

/// Full address of a node in the rendered tree
///
/// Carries every ancestor id the node's child fetch needs (a model's engines
/// are fetched by model id, but its own models list was scoped by year). The
/// expansion identity is the narrower [`NodeKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TreeNode {
    Year(Year),
    Make { year: Year, make_id: MakeId },
    Model { year: Year, make_id: MakeId, model_id: ModelId },
    Engine { year: Year, make_id: MakeId, model_id: ModelId, engine_id: EngineId },
    Category(CategoryId),
}

impl TreeNode {
    pub fn key(&self) -> NodeKey {
        match *self {
            TreeNode::Year(year) => NodeKey::Year { year },
            TreeNode::Make { year, make_id } => NodeKey::Make { year, make_id },
            TreeNode::Model { make_id, model_id, .. } => NodeKey::Model { make_id, model_id },
            TreeNode::Engine { engine_id, .. } => NodeKey::Engine { engine_id },
            TreeNode::Category(category_id) => NodeKey::Category { category_id },
        }
    }

    pub fn level(&self) -> TreeLevel {
        self.key().level()
    }
}

/// Children of an expanded node as last fetched
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "children", rename_all = "snake_case")]
pub enum NodeLoad {
    /// Fetch issued, no answer yet
    Loading,
    Makes(Vec<Make>),
    Models(Vec<Model>),
    Engines(Vec<Engine>),
    /// Fetch failed; the node stays expanded with no children
    Failed(String),
}

impl NodeLoad {
    pub fn is_loading(&self) -> bool {
        matches!(self, NodeLoad::Loading)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, NodeLoad::Failed(_))
    }

    /// Number of loaded children (0 while loading or after a failure)
    pub fn len(&self) -> usize {
        match self {
            NodeLoad::Makes(makes) => makes.len(),
            NodeLoad::Models(models) => models.len(),
            NodeLoad::Engines(engines) => engines.len(),
            NodeLoad::Loading | NodeLoad::Failed(_) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
