//! Catalog entity models
//!
//! Plain records shared by the catalog provider, the search resolver and the
//! fitment tree. Field names serialize in camelCase so catalog snapshots stay
//! compatible with the storefront's JSON payloads.

use serde::{Deserialize, Serialize};

/// Model year; the root of the vehicle hierarchy
pub type Year = u16;
pub type MakeId = u32;
pub type ModelId = u32;
pub type EngineId = u32;
pub type CategoryId = u32;
pub type PartId = u32;

/// Vehicle manufacturer
///
/// Only valid within the years that index it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Make {
    pub id: MakeId,
    pub name: String,
    /// Country badge shown next to the make (e.g. "JP")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// Vehicle model, valid only within a specific (year, make) scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    pub id: ModelId,
    pub name: String,
    pub make_id: MakeId,
}

/// Engine option of a model; leaf of the vehicle side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Engine {
    pub id: EngineId,
    pub name: String,
    pub model_id: ModelId,
}

/// Part-type category
///
/// Categories form a two-level forest: roots have no parent, children point
/// at a root. Deeper nesting is rejected when a catalog snapshot is validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<CategoryId>,
}

impl Category {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Price/quality tier of a part
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartTier {
    Economy,
    DailyDriver,
    Premium,
    Performance,
}

impl PartTier {
    /// Display label for tier badges
    pub fn label(&self) -> &'static str {
        match self {
            PartTier::Economy => "Economy",
            PartTier::DailyDriver => "Daily Driver",
            PartTier::Premium => "Premium",
            PartTier::Performance => "Performance",
        }
    }
}

/// Part record as stored in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    pub id: PartId,
    pub brand: String,
    pub part_number: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    pub tier: PartTier,
    #[serde(default)]
    pub warranty: String,
    #[serde(default)]
    pub stock: u32,
    /// Mounting position ("Front", "Rear Left", ...) when it matters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    pub category_id: CategoryId,
    pub engine_id: EngineId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_deserializes_missing_parent_as_root() {
        let category: Category = serde_json::from_str(r#"{"id": 1, "name": "Brakes"}"#).unwrap();
        assert!(category.is_root());

        let child: Category =
            serde_json::from_str(r#"{"id": 2, "name": "Pads", "parentId": 1}"#).unwrap();
        assert_eq!(child.parent_id, Some(1));
        assert!(!child.is_root());
    }

    #[test]
    fn test_part_tier_uses_snake_case() {
        let json = serde_json::to_string(&PartTier::DailyDriver).unwrap();
        assert_eq!(json, "\"daily_driver\"");
    }
}
