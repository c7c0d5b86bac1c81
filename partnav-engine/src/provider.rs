//! Catalog data provider seam
//!
//! Everything the navigator knows about the catalog arrives through this
//! trait. Each call is a suspension point; the tree and the expansion
//! controller never hold a lock across one.

use async_trait::async_trait;
use partnav_common::{
    Category, CategoryId, Engine, EngineId, Make, MakeId, Model, ModelId, Part, Result,
    SearchResult, VehicleScope, Year,
};

/// Catalog data provider - implemented by the in-memory catalog and by test doubles
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// All model years, in display order
    async fn get_years(&self) -> Result<Vec<Year>>;

    /// Makes offered in `year`
    async fn get_makes(&self, year: Year) -> Result<Vec<Make>>;

    /// Models of `make_id` offered in `year`
    async fn get_models(&self, make_id: MakeId, year: Year) -> Result<Vec<Model>>;

    /// Engines of `model_id`
    async fn get_engines(&self, model_id: ModelId) -> Result<Vec<Engine>>;

    /// Flat category list (roots and their children)
    async fn get_categories(&self) -> Result<Vec<Category>>;

    /// Parts in a category, restricted to an engine when given
    async fn get_parts(&self, category_id: CategoryId, engine_id: Option<EngineId>) -> Result<Vec<Part>>;

    /// Free-text resolution over vehicles and parts
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>>;

    /// Free-text resolution over categories, annotated with `context` when given
    async fn search_categories(
        &self,
        query: &str,
        context: Option<&VehicleScope>,
    ) -> Result<Vec<SearchResult>>;
}
