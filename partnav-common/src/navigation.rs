//! Navigation types shared between the tree, the search resolver and event consumers

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::{Category, CategoryId, Engine, EngineId, Make, MakeId, Model, ModelId, PartId, Year};

/// Hierarchy level of a tree node
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeLevel {
    Year,
    Make,
    Model,
    Engine,
    Category,
}

impl fmt::Display for TreeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TreeLevel::Year => "year",
            TreeLevel::Make => "make",
            TreeLevel::Model => "model",
            TreeLevel::Engine => "engine",
            TreeLevel::Category => "category",
        };
        f.write_str(name)
    }
}

/// Identity of one expandable tree node
///
/// Each variant carries exactly the parent-scope fields that distinguish the
/// node: a make is scoped by year, a model by make. Engines and categories are
/// keyed globally because their ids are unique across the whole catalog, so an
/// engine or category expanded under one vehicle reads as expanded under every
/// vehicle that shows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "level", rename_all = "snake_case")]
pub enum NodeKey {
    Year { year: Year },
    Make { year: Year, make_id: MakeId },
    Model { make_id: MakeId, model_id: ModelId },
    Engine { engine_id: EngineId },
    Category { category_id: CategoryId },
}

impl NodeKey {
    pub fn level(&self) -> TreeLevel {
        match self {
            NodeKey::Year { .. } => TreeLevel::Year,
            NodeKey::Make { .. } => TreeLevel::Make,
            NodeKey::Model { .. } => TreeLevel::Model,
            NodeKey::Engine { .. } => TreeLevel::Engine,
            NodeKey::Category { .. } => TreeLevel::Category,
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKey::Year { year } => write!(f, "year:{}", year),
            NodeKey::Make { year, make_id } => write!(f, "make:{}/{}", year, make_id),
            NodeKey::Model { make_id, model_id } => write!(f, "model:{}/{}", make_id, model_id),
            NodeKey::Engine { engine_id } => write!(f, "engine:{}", engine_id),
            NodeKey::Category { category_id } => write!(f, "category:{}", category_id),
        }
    }
}

/// Currently selected coordinates in the tree
///
/// Always replaced wholesale; partial paths are never merged into a previous one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedPath {
    pub year: Option<Year>,
    pub make_id: Option<MakeId>,
    pub model_id: Option<ModelId>,
    pub engine_id: Option<EngineId>,
    pub category_id: Option<CategoryId>,
}

impl SelectedPath {
    /// Path holding exactly the vehicle ids present in `coords`
    pub fn from_vehicle(coords: &VehicleCoordinates) -> Self {
        Self {
            year: coords.year,
            make_id: coords.make_id,
            model_id: coords.model_id,
            engine_id: coords.engine_id,
            category_id: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Vehicle coordinates carried by a search result
///
/// A well-formed value is a prefix of year → make → model → engine; names are
/// informational and travel alongside their ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleCoordinates {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<Year>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub make_id: Option<MakeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub make_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<ModelId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_id: Option<EngineId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_name: Option<String>,
}

impl VehicleCoordinates {
    pub fn for_year(year: Year) -> Self {
        Self { year: Some(year), ..Self::default() }
    }

    pub fn with_make(mut self, make: &Make) -> Self {
        self.make_id = Some(make.id);
        self.make_name = Some(make.name.clone());
        self
    }

    pub fn with_model(mut self, model: &Model) -> Self {
        self.model_id = Some(model.id);
        self.model_name = Some(model.name.clone());
        self
    }

    pub fn with_engine(mut self, engine: &Engine) -> Self {
        self.engine_id = Some(engine.id);
        self.engine_name = Some(engine.name.clone());
        self
    }

    /// True when no vehicle id is present
    pub fn is_empty(&self) -> bool {
        self.year.is_none() && self.make_id.is_none() && self.model_id.is_none() && self.engine_id.is_none()
    }

    /// True when the present ids form a contiguous prefix starting at year
    pub fn is_prefix(&self) -> bool {
        let present = [
            self.year.is_some(),
            self.make_id.is_some(),
            self.model_id.is_some(),
            self.engine_id.is_some(),
        ];
        let depth = present.iter().take_while(|p| **p).count();
        present[depth..].iter().all(|p| !p)
    }

    /// True when all four vehicle ids are present
    pub fn is_complete(&self) -> bool {
        self.year.is_some() && self.make_id.is_some() && self.model_id.is_some() && self.engine_id.is_some()
    }
}

/// Ambient vehicle context used to scope category search
///
/// Emitted when an engine node is expanded so the surrounding app can jump
/// straight to category search for that vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleScope {
    pub year: Year,
    pub make_id: MakeId,
    pub make_name: String,
    pub model_id: ModelId,
    pub model_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_id: Option<EngineId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_name: Option<String>,
}

impl From<&VehicleScope> for VehicleCoordinates {
    fn from(scope: &VehicleScope) -> Self {
        Self {
            year: Some(scope.year),
            make_id: Some(scope.make_id),
            make_name: Some(scope.make_name.clone()),
            model_id: Some(scope.model_id),
            model_name: Some(scope.model_name.clone()),
            engine_id: scope.engine_id,
            engine_name: scope.engine_name.clone(),
        }
    }
}

/// Typed candidate produced by free-text resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SearchResult {
    #[serde(rename_all = "camelCase")]
    Vehicle {
        label: String,
        vehicle: VehicleCoordinates,
    },
    #[serde(rename_all = "camelCase")]
    Part {
        label: String,
        part_number: String,
        part_id: PartId,
    },
    /// Category match; `vehicle` is empty unless the search ran with a context
    #[serde(rename_all = "camelCase")]
    Category {
        label: String,
        category_id: CategoryId,
        category_name: String,
        #[serde(default)]
        vehicle: VehicleCoordinates,
    },
}

impl SearchResult {
    pub fn label(&self) -> &str {
        match self {
            SearchResult::Vehicle { label, .. }
            | SearchResult::Part { label, .. }
            | SearchResult::Category { label, .. } => label,
        }
    }

    /// Short kind name used by listings ("vehicle", "part", "category")
    pub fn kind(&self) -> &'static str {
        match self {
            SearchResult::Vehicle { .. } => "vehicle",
            SearchResult::Part { .. } => "part",
            SearchResult::Category { .. } => "category",
        }
    }

    /// Vehicle coordinates carried by the result, if any
    pub fn vehicle(&self) -> Option<&VehicleCoordinates> {
        match self {
            SearchResult::Vehicle { vehicle, .. } => Some(vehicle),
            SearchResult::Category { vehicle, .. } if !vehicle.is_empty() => Some(vehicle),
            _ => None,
        }
    }

    pub fn category_id(&self) -> Option<CategoryId> {
        match self {
            SearchResult::Category { category_id, .. } => Some(*category_id),
            _ => None,
        }
    }
}

/// Concrete vehicle configuration shown on an engine row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fitment {
    pub year: Year,
    pub make: Make,
    pub model: Model,
    pub engine: Engine,
}

/// Fully-resolved vehicle + category coordinate passed to the parts query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartSelection {
    pub year: Year,
    pub make: Make,
    pub model: Model,
    pub engine: Engine,
    pub category: Category,
}

impl PartSelection {
    pub fn new(fitment: Fitment, category: Category) -> Self {
        Self {
            year: fitment.year,
            make: fitment.make,
            model: fitment.model,
            engine: fitment.engine,
            category,
        }
    }

    /// Selected path pointing at this selection
    pub fn path(&self) -> SelectedPath {
        SelectedPath {
            year: Some(self.year),
            make_id: Some(self.make.id),
            model_id: Some(self.model.id),
            engine_id: Some(self.engine.id),
            category_id: Some(self.category.id),
        }
    }

    pub fn scope(&self) -> VehicleScope {
        VehicleScope {
            year: self.year,
            make_id: self.make.id,
            make_name: self.make.name.clone(),
            model_id: self.model.id,
            model_name: self.model.name.clone(),
            engine_id: Some(self.engine.id),
            engine_name: Some(self.engine.name.clone()),
        }
    }
}

/// Identifier that could not be resolved to a concrete catalog entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "entity", content = "id", rename_all = "snake_case")]
pub enum UnresolvedEntity {
    Make(MakeId),
    Model(ModelId),
    Engine(EngineId),
    Category(CategoryId),
}

impl fmt::Display for UnresolvedEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnresolvedEntity::Make(id) => write!(f, "make {}", id),
            UnresolvedEntity::Model(id) => write!(f, "model {}", id),
            UnresolvedEntity::Engine(id) => write!(f, "engine {}", id),
            UnresolvedEntity::Category(id) => write!(f, "category {}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_keys_hash_structurally() {
        use std::collections::HashSet;

        // "1-23" vs "12-3" collided as concatenated strings; tagged keys do not
        let mut keys = HashSet::new();
        keys.insert(NodeKey::Model { make_id: 1, model_id: 23 });
        keys.insert(NodeKey::Model { make_id: 12, model_id: 3 });
        keys.insert(NodeKey::Make { year: 2010, make_id: 5 });
        keys.insert(NodeKey::Make { year: 2011, make_id: 5 });
        assert_eq!(keys.len(), 4);

        assert_eq!(NodeKey::Engine { engine_id: 7 }.level(), TreeLevel::Engine);
        assert_eq!(NodeKey::Make { year: 2010, make_id: 5 }.to_string(), "make:2010/5");
    }

    #[test]
    fn test_vehicle_coordinates_prefix_rules() {
        let year_only = VehicleCoordinates::for_year(2010);
        assert!(year_only.is_prefix());
        assert!(!year_only.is_complete());

        let gap = VehicleCoordinates {
            year: Some(2010),
            model_id: Some(3),
            ..VehicleCoordinates::default()
        };
        assert!(!gap.is_prefix());

        assert!(VehicleCoordinates::default().is_prefix());
        assert!(VehicleCoordinates::default().is_empty());
    }

    #[test]
    fn test_search_result_serializes_with_type_tag() {
        let result = SearchResult::Part {
            label: "Bosch 0986".to_string(),
            part_number: "0986".to_string(),
            part_id: 4,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["type"], "part");
        assert_eq!(json["partNumber"], "0986");
        assert!(result.vehicle().is_none());
    }

    #[test]
    fn test_category_result_without_context_has_no_vehicle() {
        let result = SearchResult::Category {
            label: "Brakes > Pads".to_string(),
            category_id: 2,
            category_name: "Pads".to_string(),
            vehicle: VehicleCoordinates::default(),
        };
        assert!(result.vehicle().is_none());
        assert_eq!(result.category_id(), Some(2));
    }
}
