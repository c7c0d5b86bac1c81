//! # partnav Common Library
//!
//! Shared code for the parts-catalog navigator including:
//! - Catalog entity models (years, makes, models, engines, categories, parts)
//! - Navigation types (node keys, selected path, search results, part selections)
//! - Event types (NavigatorEvent enum) and the broadcast EventBus
//! - Configuration loading
//! - Common error type

pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod navigation;

pub use error::{Error, Result};
pub use models::{Category, CategoryId, Engine, EngineId, Make, MakeId, Model, ModelId, Part, PartId, PartTier, Year};
pub use navigation::{
    Fitment, NodeKey, PartSelection, SearchResult, SelectedPath, TreeLevel, UnresolvedEntity,
    VehicleCoordinates, VehicleScope,
};
