//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;

use partnav_common::events::NavigatorEvent;
use partnav_common::{
    Category, CategoryId, Engine, EngineId, Error, Make, MakeId, Model, ModelId, Part, Result,
    SearchResult, VehicleCoordinates, VehicleScope, Year,
};
use partnav_engine::{Catalog, CatalogProvider, FetchCounts, InMemoryCatalog};

pub const SAMPLE_CATALOG: &str = include_str!("../../fixtures/sample_catalog.json");

pub fn sample_catalog() -> Catalog {
    Catalog::from_json_str(SAMPLE_CATALOG).expect("fixture catalog is valid")
}

pub fn sample_provider() -> Arc<InMemoryCatalog> {
    Arc::new(InMemoryCatalog::new(sample_catalog()))
}

/// Category result for a fully specified vehicle
pub fn category_result(
    year: Year,
    make_id: MakeId,
    model_id: ModelId,
    engine_id: EngineId,
    category_id: CategoryId,
) -> SearchResult {
    SearchResult::Category {
        label: format!("category {}", category_id),
        category_id,
        category_name: String::new(),
        vehicle: VehicleCoordinates {
            year: Some(year),
            make_id: Some(make_id),
            model_id: Some(model_id),
            engine_id: Some(engine_id),
            ..Default::default()
        },
    }
}

pub fn vehicle_result(year: Year, make_id: Option<MakeId>, model_id: Option<ModelId>) -> SearchResult {
    SearchResult::Vehicle {
        label: format!("{} {:?} {:?}", year, make_id, model_id),
        vehicle: VehicleCoordinates { year: Some(year), make_id, model_id, ..Default::default() },
    }
}

/// Every event currently buffered on `rx`
pub fn drain(rx: &mut broadcast::Receiver<NavigatorEvent>) -> Vec<NavigatorEvent> {
    std::iter::from_fn(|| rx.try_recv().ok()).collect()
}

pub fn count_type(events: &[NavigatorEvent], event_type: &str) -> usize {
    events.iter().filter(|e| e.event_type() == event_type).count()
}

/// Provider wrapper with per-call delays and injected failures
pub struct ScriptedProvider {
    inner: InMemoryCatalog,
    search_delays: HashMap<String, Duration>,
    engine_delays: HashMap<ModelId, Duration>,
    failing_years: HashSet<Year>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            inner: InMemoryCatalog::new(sample_catalog()),
            search_delays: HashMap::new(),
            engine_delays: HashMap::new(),
            failing_years: HashSet::new(),
        }
    }

    /// Delay `search(query)` by `delay`
    pub fn delay_search(mut self, query: &str, delay: Duration) -> Self {
        self.search_delays.insert(query.to_string(), delay);
        self
    }

    /// Delay `get_engines(model_id)` by `delay`
    pub fn delay_engines(mut self, model_id: ModelId, delay: Duration) -> Self {
        self.engine_delays.insert(model_id, delay);
        self
    }

    /// Fail `get_makes(year)`
    pub fn fail_makes(mut self, year: Year) -> Self {
        self.failing_years.insert(year);
        self
    }

    pub fn stats(&self) -> FetchCounts {
        self.inner.stats()
    }

    async fn pause(delay: Option<&Duration>) {
        if let Some(delay) = delay {
            tokio::time::sleep(*delay).await;
        }
    }
}

#[async_trait]
impl CatalogProvider for ScriptedProvider {
    async fn get_years(&self) -> Result<Vec<Year>> {
        self.inner.get_years().await
    }

    async fn get_makes(&self, year: Year) -> Result<Vec<Make>> {
        if self.failing_years.contains(&year) {
            return Err(Error::Provider(format!("makes for {} unavailable", year)));
        }
        self.inner.get_makes(year).await
    }

    async fn get_models(&self, make_id: MakeId, year: Year) -> Result<Vec<Model>> {
        self.inner.get_models(make_id, year).await
    }

    async fn get_engines(&self, model_id: ModelId) -> Result<Vec<Engine>> {
        Self::pause(self.engine_delays.get(&model_id)).await;
        self.inner.get_engines(model_id).await
    }

    async fn get_categories(&self) -> Result<Vec<Category>> {
        self.inner.get_categories().await
    }

    async fn get_parts(&self, category_id: CategoryId, engine_id: Option<EngineId>) -> Result<Vec<Part>> {
        self.inner.get_parts(category_id, engine_id).await
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        Self::pause(self.search_delays.get(query)).await;
        self.inner.search(query).await
    }

    async fn search_categories(
        &self,
        query: &str,
        context: Option<&VehicleScope>,
    ) -> Result<Vec<SearchResult>> {
        self.inner.search_categories(query, context).await
    }
}
