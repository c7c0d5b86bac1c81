//! In-memory catalog snapshot and provider
//!
//! The snapshot is the serialized form (JSON) of the whole catalog: entity
//! lists plus the year → make and year → make → model availability indexes.
//! [`Catalog`] is the validated, id-indexed view the resolver walks, and
//! [`InMemoryCatalog`] serves it through [`CatalogProvider`].

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use partnav_common::{
    Category, CategoryId, Engine, EngineId, Error, Make, MakeId, Model, ModelId, Part, Result,
    SearchResult, VehicleScope, Year,
};

use crate::provider::CatalogProvider;
use crate::search::SearchResolver;

/// Serialized catalog snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSnapshot {
    pub years: Vec<Year>,
    pub makes: Vec<Make>,
    pub models: Vec<Model>,
    pub engines: Vec<Engine>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub parts: Vec<Part>,
    /// Make ids offered per year, in display order
    #[serde(default)]
    pub year_makes: BTreeMap<Year, Vec<MakeId>>,
    /// Model ids offered per (year, make), in display order
    #[serde(default)]
    pub models_by_make_year: BTreeMap<Year, BTreeMap<MakeId, Vec<ModelId>>>,
}

impl CatalogSnapshot {
    /// Check structural invariants
    ///
    /// - ids are unique per entity kind
    /// - models and engines point at existing parents
    /// - categories are at most two levels deep (a parent must be a root)
    /// - availability indexes and parts reference existing entities
    pub fn validate(&self) -> Result<()> {
        fn unique<I: IntoIterator<Item = u32>>(kind: &str, ids: I) -> Result<HashSet<u32>> {
            let mut seen = HashSet::new();
            for id in ids {
                if !seen.insert(id) {
                    return Err(Error::InvalidCatalog(format!("duplicate {} id {}", kind, id)));
                }
            }
            Ok(seen)
        }

        let make_ids = unique("make", self.makes.iter().map(|m| m.id))?;
        let model_ids = unique("model", self.models.iter().map(|m| m.id))?;
        let engine_ids = unique("engine", self.engines.iter().map(|e| e.id))?;
        unique("part", self.parts.iter().map(|p| p.id))?;

        if let Some(model) = self.models.iter().find(|m| !make_ids.contains(&m.make_id)) {
            return Err(Error::InvalidCatalog(format!(
                "model {} references unknown make {}",
                model.id, model.make_id
            )));
        }
        if let Some(engine) = self.engines.iter().find(|e| !model_ids.contains(&e.model_id)) {
            return Err(Error::InvalidCatalog(format!(
                "engine {} references unknown model {}",
                engine.id, engine.model_id
            )));
        }

        self.validate_categories()?;

        for (year, make_list) in &self.year_makes {
            if let Some(id) = make_list.iter().find(|id| !make_ids.contains(id)) {
                return Err(Error::InvalidCatalog(format!(
                    "year {} lists unknown make {}",
                    year, id
                )));
            }
        }

        let model_make: HashMap<ModelId, MakeId> =
            self.models.iter().map(|m| (m.id, m.make_id)).collect();
        for (year, by_make) in &self.models_by_make_year {
            for (make_id, model_list) in by_make {
                for model_id in model_list {
                    match model_make.get(model_id) {
                        Some(owner) if owner == make_id => {}
                        Some(owner) => {
                            return Err(Error::InvalidCatalog(format!(
                                "year {} lists model {} under make {} but it belongs to make {}",
                                year, model_id, make_id, owner
                            )))
                        }
                        None => {
                            return Err(Error::InvalidCatalog(format!(
                                "year {} lists unknown model {}",
                                year, model_id
                            )))
                        }
                    }
                }
            }
        }

        let category_ids: HashSet<CategoryId> = self.categories.iter().map(|c| c.id).collect();
        for part in &self.parts {
            if !category_ids.contains(&part.category_id) || !engine_ids.contains(&part.engine_id) {
                return Err(Error::InvalidCatalog(format!(
                    "part {} references unknown category {} or engine {}",
                    part.id, part.category_id, part.engine_id
                )));
            }
        }

        Ok(())
    }

    fn validate_categories(&self) -> Result<()> {
        let mut by_id: HashMap<CategoryId, &Category> = HashMap::new();
        for category in &self.categories {
            if by_id.insert(category.id, category).is_some() {
                return Err(Error::InvalidCatalog(format!("duplicate category id {}", category.id)));
            }
        }

        for category in &self.categories {
            let Some(parent_id) = category.parent_id else { continue };
            if parent_id == category.id {
                return Err(Error::InvalidCatalog(format!(
                    "category {} is its own parent",
                    category.id
                )));
            }
            match by_id.get(&parent_id) {
                None => {
                    return Err(Error::InvalidCatalog(format!(
                        "category {} references unknown parent {}",
                        category.id, parent_id
                    )))
                }
                // Parent must itself be a root: two levels at most, no cycles
                Some(parent) if !parent.is_root() => {
                    return Err(Error::InvalidCatalog(format!(
                        "category {} nests below non-root category {}",
                        category.id, parent_id
                    )))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

/// Validated catalog with id lookups
#[derive(Debug, Clone)]
pub struct Catalog {
    snapshot: CatalogSnapshot,
    makes: HashMap<MakeId, usize>,
    models: HashMap<ModelId, usize>,
    engines: HashMap<EngineId, usize>,
    categories: HashMap<CategoryId, usize>,
}

impl Catalog {
    pub fn from_snapshot(snapshot: CatalogSnapshot) -> Result<Self> {
        snapshot.validate()?;

        let makes = snapshot.makes.iter().enumerate().map(|(i, m)| (m.id, i)).collect();
        let models = snapshot.models.iter().enumerate().map(|(i, m)| (m.id, i)).collect();
        let engines = snapshot.engines.iter().enumerate().map(|(i, e)| (e.id, i)).collect();
        let categories = snapshot.categories.iter().enumerate().map(|(i, c)| (c.id, i)).collect();

        Ok(Self { snapshot, makes, models, engines, categories })
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let snapshot: CatalogSnapshot = serde_json::from_str(json)?;
        Self::from_snapshot(snapshot)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let catalog = Self::from_json_str(&content)?;
        info!(
            path = %path.display(),
            years = catalog.snapshot.years.len(),
            makes = catalog.snapshot.makes.len(),
            models = catalog.snapshot.models.len(),
            engines = catalog.snapshot.engines.len(),
            categories = catalog.snapshot.categories.len(),
            parts = catalog.snapshot.parts.len(),
            "Loaded catalog snapshot"
        );
        Ok(catalog)
    }

    pub fn snapshot(&self) -> &CatalogSnapshot {
        &self.snapshot
    }

    pub fn years(&self) -> &[Year] {
        &self.snapshot.years
    }

    pub fn make(&self, id: MakeId) -> Option<&Make> {
        self.makes.get(&id).map(|i| &self.snapshot.makes[*i])
    }

    pub fn model(&self, id: ModelId) -> Option<&Model> {
        self.models.get(&id).map(|i| &self.snapshot.models[*i])
    }

    pub fn engine(&self, id: EngineId) -> Option<&Engine> {
        self.engines.get(&id).map(|i| &self.snapshot.engines[*i])
    }

    pub fn category(&self, id: CategoryId) -> Option<&Category> {
        self.categories.get(&id).map(|i| &self.snapshot.categories[*i])
    }

    pub fn categories(&self) -> &[Category] {
        &self.snapshot.categories
    }

    pub fn parts(&self) -> &[Part] {
        &self.snapshot.parts
    }

    /// Make ids indexed for `year`; empty when the year is unknown
    pub fn make_ids_for_year(&self, year: Year) -> &[MakeId] {
        self.snapshot.year_makes.get(&year).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Model ids indexed for (year, make); `None` when the pair has no index
    pub fn model_ids_for(&self, year: Year, make_id: MakeId) -> Option<&[ModelId]> {
        self.snapshot
            .models_by_make_year
            .get(&year)
            .and_then(|by_make| by_make.get(&make_id))
            .map(Vec::as_slice)
    }

    /// Makes for a year
    ///
    /// A year without an index entry falls back to every make.
    pub fn makes_for_year(&self, year: Year) -> Vec<Make> {
        match self.snapshot.year_makes.get(&year) {
            Some(ids) => ids.iter().filter_map(|id| self.make(*id)).cloned().collect(),
            None => self.snapshot.makes.clone(),
        }
    }

    /// Models of a make for a year
    ///
    /// Without a (year, make) index entry, every model of the make is returned.
    pub fn models_for(&self, make_id: MakeId, year: Year) -> Vec<Model> {
        match self.model_ids_for(year, make_id) {
            Some(ids) => ids.iter().filter_map(|id| self.model(*id)).cloned().collect(),
            None => self
                .snapshot
                .models
                .iter()
                .filter(|m| m.make_id == make_id)
                .cloned()
                .collect(),
        }
    }

    /// Engines of a model, in snapshot order
    pub fn engines_for(&self, model_id: ModelId) -> Vec<Engine> {
        self.snapshot
            .engines
            .iter()
            .filter(|e| e.model_id == model_id)
            .cloned()
            .collect()
    }

    pub fn parts_for(&self, category_id: CategoryId, engine_id: Option<EngineId>) -> Vec<Part> {
        self.snapshot
            .parts
            .iter()
            .filter(|p| p.category_id == category_id)
            .filter(|p| engine_id.map_or(true, |id| p.engine_id == id))
            .cloned()
            .collect()
    }
}

/// Per-operation call counters of a provider
#[derive(Debug, Default)]
pub struct ProviderStats {
    years: AtomicU64,
    makes: AtomicU64,
    models: AtomicU64,
    engines: AtomicU64,
    categories: AtomicU64,
    parts: AtomicU64,
    searches: AtomicU64,
}

/// Point-in-time copy of [`ProviderStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchCounts {
    pub years: u64,
    pub makes: u64,
    pub models: u64,
    pub engines: u64,
    pub categories: u64,
    pub parts: u64,
    pub searches: u64,
}

impl ProviderStats {
    pub fn counts(&self) -> FetchCounts {
        FetchCounts {
            years: self.years.load(Ordering::Relaxed),
            makes: self.makes.load(Ordering::Relaxed),
            models: self.models.load(Ordering::Relaxed),
            engines: self.engines.load(Ordering::Relaxed),
            categories: self.categories.load(Ordering::Relaxed),
            parts: self.parts.load(Ordering::Relaxed),
            searches: self.searches.load(Ordering::Relaxed),
        }
    }

    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Catalog provider over an in-memory snapshot
///
/// Never caches between calls: every request is answered afresh from the
/// snapshot, so repeated expansions are observable through [`ProviderStats`].
pub struct InMemoryCatalog {
    catalog: Arc<Catalog>,
    resolver: SearchResolver,
    latency: Option<Duration>,
    stats: ProviderStats,
}

impl InMemoryCatalog {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
            resolver: SearchResolver::default(),
            latency: None,
            stats: ProviderStats::default(),
        }
    }

    /// Delay every call by `latency` (simulates a remote catalog)
    pub fn with_latency(mut self, latency: Option<Duration>) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.resolver = SearchResolver::new(max_results);
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn stats(&self) -> FetchCounts {
        self.stats.counts()
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl CatalogProvider for InMemoryCatalog {
    async fn get_years(&self) -> Result<Vec<Year>> {
        ProviderStats::bump(&self.stats.years);
        self.simulate_latency().await;
        Ok(self.catalog.years().to_vec())
    }

    async fn get_makes(&self, year: Year) -> Result<Vec<Make>> {
        ProviderStats::bump(&self.stats.makes);
        self.simulate_latency().await;
        let makes = self.catalog.makes_for_year(year);
        debug!(year, count = makes.len(), "get_makes");
        Ok(makes)
    }

    async fn get_models(&self, make_id: MakeId, year: Year) -> Result<Vec<Model>> {
        ProviderStats::bump(&self.stats.models);
        self.simulate_latency().await;
        let models = self.catalog.models_for(make_id, year);
        debug!(make_id, year, count = models.len(), "get_models");
        Ok(models)
    }

    async fn get_engines(&self, model_id: ModelId) -> Result<Vec<Engine>> {
        ProviderStats::bump(&self.stats.engines);
        self.simulate_latency().await;
        Ok(self.catalog.engines_for(model_id))
    }

    async fn get_categories(&self) -> Result<Vec<Category>> {
        ProviderStats::bump(&self.stats.categories);
        self.simulate_latency().await;
        Ok(self.catalog.categories().to_vec())
    }

    async fn get_parts(&self, category_id: CategoryId, engine_id: Option<EngineId>) -> Result<Vec<Part>> {
        ProviderStats::bump(&self.stats.parts);
        self.simulate_latency().await;
        Ok(self.catalog.parts_for(category_id, engine_id))
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        ProviderStats::bump(&self.stats.searches);
        self.simulate_latency().await;
        Ok(self.resolver.resolve(&self.catalog, query))
    }

    async fn search_categories(
        &self,
        query: &str,
        context: Option<&VehicleScope>,
    ) -> Result<Vec<SearchResult>> {
        ProviderStats::bump(&self.stats.searches);
        self.simulate_latency().await;
        Ok(self.resolver.resolve_categories(&self.catalog, query, context))
    }
}
