//! Free-text resolution over the catalog
//!
//! Walks the vehicle hierarchy in catalog order (years × indexed makes ×
//! indexed models × engines), then parts, producing typed results. Ordering is
//! the iteration order; there is no scoring.

use std::collections::HashSet;

use tracing::debug;

use partnav_common::{SearchResult, VehicleCoordinates, VehicleScope, Year};

use crate::catalog::Catalog;

/// Default cap on results of one resolution
pub const DEFAULT_MAX_RESULTS: usize = 10;

/// Tokenized query
#[derive(Debug, Clone, PartialEq, Eq)]
struct ParsedQuery {
    /// Whole query, lowercased and trimmed
    text: String,
    /// First four-digit token
    year: Option<Year>,
    /// Every token that is not a four-digit number
    names: Vec<String>,
}

impl ParsedQuery {
    fn parse(query: &str) -> Option<Self> {
        let text = query.trim().to_lowercase();
        if text.is_empty() {
            return None;
        }

        let is_year = |token: &str| token.len() == 4 && token.bytes().all(|b| b.is_ascii_digit());
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let year = tokens
            .iter()
            .find(|t| is_year(t))
            .and_then(|t| t.parse::<Year>().ok());
        let names = tokens
            .iter()
            .filter(|t| !is_year(t))
            .map(|t| t.to_string())
            .collect();

        Some(Self { text, year, names })
    }

    /// True when no name token was given or one is contained in `name`
    fn names_match(tokens: &[&str], name: &str) -> bool {
        tokens.is_empty() || tokens.iter().any(|t| name.contains(t))
    }
}

/// Stateless search resolver
#[derive(Debug, Clone, Copy)]
pub struct SearchResolver {
    max_results: usize,
}

impl Default for SearchResolver {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RESULTS)
    }
}

impl SearchResolver {
    pub fn new(max_results: usize) -> Self {
        Self { max_results: max_results.max(1) }
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    /// Resolve a query into vehicle and part results
    ///
    /// Blank input yields no results. A typed year restricts the walk to that
    /// year and lists every make indexed for it; without a year only makes
    /// matching a name token are walked. Models are matched against the name
    /// tokens the make name does not already contain. Parts match when the
    /// whole query is contained in their brand or part number.
    pub fn resolve(&self, catalog: &Catalog, query: &str) -> Vec<SearchResult> {
        let Some(parsed) = ParsedQuery::parse(query) else {
            return Vec::new();
        };

        let mut results = Vec::new();
        self.collect_vehicles(catalog, &parsed, &mut results);
        collect_parts(catalog, &parsed.text, &mut results);

        let results = self.finish(results);
        debug!(query = %parsed.text, year = ?parsed.year, count = results.len(), "Resolved search");
        results
    }

    /// Resolve a query against category names
    ///
    /// Labels read `"{parent} > {child}"` for child categories. When `context`
    /// is given, every result carries its vehicle coordinates.
    pub fn resolve_categories(
        &self,
        catalog: &Catalog,
        query: &str,
        context: Option<&VehicleScope>,
    ) -> Vec<SearchResult> {
        let text = query.trim().to_lowercase();
        if text.is_empty() {
            return Vec::new();
        }

        let vehicle = context.map(VehicleCoordinates::from).unwrap_or_default();
        let results = catalog
            .categories()
            .iter()
            .filter(|c| c.name.to_lowercase().contains(&text))
            .map(|category| {
                let parent = category.parent_id.and_then(|id| catalog.category(id));
                let label = match parent {
                    Some(parent) => format!("{} > {}", parent.name, category.name),
                    None => category.name.clone(),
                };
                SearchResult::Category {
                    label,
                    category_id: category.id,
                    category_name: category.name.clone(),
                    vehicle: vehicle.clone(),
                }
            })
            .collect();

        self.finish(results)
    }

    fn collect_vehicles(&self, catalog: &Catalog, parsed: &ParsedQuery, out: &mut Vec<SearchResult>) {
        let names: Vec<&str> = parsed.names.iter().map(String::as_str).collect();

        for &year in catalog.years() {
            if parsed.year.is_some_and(|y| y != year) {
                continue;
            }

            for &make_id in catalog.make_ids_for_year(year) {
                let Some(make) = catalog.make(make_id) else { continue };
                let make_lower = make.name.to_lowercase();
                let make_matches = ParsedQuery::names_match(&names, &make_lower);

                if !make_matches && parsed.year.is_none() {
                    continue;
                }

                let make_coords = VehicleCoordinates::for_year(year).with_make(make);
                if parsed.year.is_some() && make_matches {
                    out.push(SearchResult::Vehicle {
                        label: format!("{} {}", year, make.name),
                        vehicle: make_coords.clone(),
                    });
                }

                let remaining: Vec<&str> =
                    names.iter().copied().filter(|t| !make_lower.contains(t)).collect();

                for &model_id in catalog.model_ids_for(year, make_id).unwrap_or(&[]) {
                    let Some(model) = catalog.model(model_id) else { continue };
                    if !ParsedQuery::names_match(&remaining, &model.name.to_lowercase()) {
                        continue;
                    }

                    let model_label = format!("{} {} {}", year, make.name, model.name);
                    let model_coords = make_coords.clone().with_model(model);
                    out.push(SearchResult::Vehicle {
                        label: model_label.clone(),
                        vehicle: model_coords.clone(),
                    });

                    for engine in catalog.engines_for(model_id) {
                        out.push(SearchResult::Vehicle {
                            label: format!("{} {}", model_label, engine.name),
                            vehicle: model_coords.clone().with_engine(&engine),
                        });
                    }
                }
            }
        }
    }

    /// Deduplicate by label (first seen wins) and cap
    fn finish(&self, results: Vec<SearchResult>) -> Vec<SearchResult> {
        let mut seen = HashSet::new();
        results
            .into_iter()
            .filter(|r| seen.insert(r.label().to_string()))
            .take(self.max_results)
            .collect()
    }
}

fn collect_parts(catalog: &Catalog, text: &str, out: &mut Vec<SearchResult>) {
    for part in catalog.parts() {
        if part.part_number.to_lowercase().contains(text) || part.brand.to_lowercase().contains(text) {
            out.push(SearchResult::Part {
                label: format!("{} {}", part.brand, part.part_number),
                part_number: part.part_number.clone(),
                part_id: part.id,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::from_json_str(include_str!("../../fixtures/sample_catalog.json")).unwrap()
    }

    fn labels(results: &[SearchResult]) -> Vec<&str> {
        results.iter().map(SearchResult::label).collect()
    }

    #[test]
    fn test_parse_picks_first_four_digit_token() {
        let parsed = ParsedQuery::parse("  Honda 2010 Civic 2011 ").unwrap();
        assert_eq!(parsed.year, Some(2010));
        assert_eq!(parsed.names, vec!["honda", "civic"]);
        assert_eq!(parsed.text, "honda 2010 civic 2011");

        // Five digits is a name token
        let parsed = ParsedQuery::parse("20100").unwrap();
        assert_eq!(parsed.year, None);

        assert!(ParsedQuery::parse("   ").is_none());
    }

    #[test]
    fn test_blank_query_is_empty() {
        let resolver = SearchResolver::default();
        assert!(resolver.resolve(&catalog(), "").is_empty());
        assert!(resolver.resolve_categories(&catalog(), "  ", None).is_empty());
    }

    #[test]
    fn test_year_and_model_lists_model_then_engines() {
        let results = SearchResolver::default().resolve(&catalog(), "2010 civic");
        assert_eq!(
            labels(&results),
            vec!["2010 Honda Civic", "2010 Honda Civic 1.8L", "2010 Honda Civic 2.0L"]
        );

        let engine_rows: Vec<_> = results
            .iter()
            .filter(|r| r.vehicle().is_some_and(|v| v.engine_id.is_some()))
            .collect();
        assert_eq!(engine_rows.len(), 2);
        assert!(engine_rows.iter().all(|r| r.label().starts_with("2010 Honda Civic")));
    }

    #[test]
    fn test_year_and_make_lists_make_row_first() {
        let results = SearchResolver::default().resolve(&catalog(), "2010 honda");
        assert_eq!(results[0].label(), "2010 Honda");
        assert_eq!(results[1].label(), "2010 Honda Civic");
        assert_eq!(results.len(), 8);

        let make_row = results[0].vehicle().unwrap();
        assert_eq!(make_row.make_id, Some(5));
        assert!(make_row.model_id.is_none());
    }

    #[test]
    fn test_without_year_unmatched_makes_are_skipped() {
        let results = SearchResolver::default().resolve(&catalog(), "bosch");
        assert!(results.iter().all(|r| r.kind() == "part"));
        // Bosch BP1234 appears twice in the catalog and is listed once
        assert_eq!(labels(&results), vec!["Bosch BP1234", "Bosch 3397118"]);
    }

    #[test]
    fn test_results_are_capped() {
        let results = SearchResolver::default().resolve(&catalog(), "honda");
        assert_eq!(results.len(), DEFAULT_MAX_RESULTS);
        assert_eq!(results[0].label(), "2009 Honda Civic");

        let results = SearchResolver::new(3).resolve(&catalog(), "honda");
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn test_category_labels_and_context() {
        let resolver = SearchResolver::default();
        let results = resolver.resolve_categories(&catalog(), "brake", None);
        assert_eq!(labels(&results), vec!["Brakes", "Brakes > Brake Pads"]);
        assert!(results.iter().all(|r| r.vehicle().is_none()));

        let scope = VehicleScope {
            year: 2010,
            make_id: 5,
            make_name: "Honda".to_string(),
            model_id: 20,
            model_name: "Civic".to_string(),
            engine_id: Some(200),
            engine_name: Some("1.8L".to_string()),
        };
        let results = resolver.resolve_categories(&catalog(), "rotor", Some(&scope));
        assert_eq!(results.len(), 1);
        let vehicle = results[0].vehicle().unwrap();
        assert!(vehicle.is_complete());
        assert_eq!(vehicle.engine_id, Some(200));
    }
}
