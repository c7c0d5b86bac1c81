//! Selection compositor
//!
//! Turns identifier-only coordinates into a canonical [`PartSelection`] and
//! renders the breadcrumb shown above the parts list. Both are pure.

use partnav_common::{
    Category, CategoryId, Engine, EngineId, Fitment, Make, MakeId, Model, ModelId, PartSelection,
    SearchResult, UnresolvedEntity, Year,
};

/// Breadcrumb for the current selection
///
/// `"{year} {make} {model} > {engine} > {parent} > {category}"`, with the
/// parent segment omitted for root categories. A category missing from
/// `categories` falls back to the selection's own category name with no
/// parent. No selection renders as an empty string.
pub fn compose_breadcrumb(selection: Option<&PartSelection>, categories: &[Category]) -> String {
    let Some(selection) = selection else {
        return String::new();
    };

    let listed = categories.iter().find(|c| c.id == selection.category.id);
    let parent = listed
        .and_then(|c| c.parent_id)
        .and_then(|parent_id| categories.iter().find(|c| c.id == parent_id));

    let category_label = match (listed, parent) {
        (Some(category), Some(parent)) => format!("{} > {}", parent.name, category.name),
        _ => selection.category.name.clone(),
    };

    format!(
        "{} {} {} > {} > {}",
        selection.year, selection.make.name, selection.model.name, selection.engine.name, category_label
    )
}

/// Identifier-only request for a part-type selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionRequest {
    pub year: Year,
    pub make_id: MakeId,
    pub model_id: ModelId,
    pub engine_id: EngineId,
    pub category_id: CategoryId,
}

impl SelectionRequest {
    /// Request carried by a category result with a complete vehicle context
    pub fn from_result(result: &SearchResult) -> Option<Self> {
        let SearchResult::Category { category_id, vehicle, .. } = result else {
            return None;
        };
        Some(Self {
            year: vehicle.year?,
            make_id: vehicle.make_id?,
            model_id: vehicle.model_id?,
            engine_id: vehicle.engine_id?,
            category_id: *category_id,
        })
    }
}

/// Resolve every id of `request` against fetched entity lists
///
/// Succeeds only when make, model, engine and category all resolve;
/// otherwise returns every id that did not, in hierarchy order.
pub fn resolve_selection(
    request: &SelectionRequest,
    makes: &[Make],
    models: &[Model],
    engines: &[Engine],
    categories: &[Category],
) -> std::result::Result<PartSelection, Vec<UnresolvedEntity>> {
    let make = makes.iter().find(|m| m.id == request.make_id);
    let model = models.iter().find(|m| m.id == request.model_id);
    let engine = engines.iter().find(|e| e.id == request.engine_id);
    let category = categories.iter().find(|c| c.id == request.category_id);

    match (make, model, engine, category) {
        (Some(make), Some(model), Some(engine), Some(category)) => Ok(PartSelection::new(
            Fitment {
                year: request.year,
                make: make.clone(),
                model: model.clone(),
                engine: engine.clone(),
            },
            category.clone(),
        )),
        _ => {
            let mut unresolved = Vec::new();
            if make.is_none() {
                unresolved.push(UnresolvedEntity::Make(request.make_id));
            }
            if model.is_none() {
                unresolved.push(UnresolvedEntity::Model(request.model_id));
            }
            if engine.is_none() {
                unresolved.push(UnresolvedEntity::Engine(request.engine_id));
            }
            if category.is_none() {
                unresolved.push(UnresolvedEntity::Category(request.category_id));
            }
            Err(unresolved)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use partnav_common::VehicleCoordinates;

    fn category(id: CategoryId, name: &str, parent_id: Option<CategoryId>) -> Category {
        Category { id, name: name.to_string(), parent_id }
    }

    fn categories() -> Vec<Category> {
        vec![
            category(1, "Brakes", None),
            category(2, "Brake Pads", Some(1)),
            category(7, "Wipers", None),
        ]
    }

    fn selection(category: Category) -> PartSelection {
        PartSelection::new(
            Fitment {
                year: 2010,
                make: Make { id: 5, name: "Honda".to_string(), country: None },
                model: Model { id: 20, name: "Civic".to_string(), make_id: 5 },
                engine: Engine { id: 200, name: "1.8L".to_string(), model_id: 20 },
            },
            category,
        )
    }

    #[test]
    fn test_breadcrumb_includes_parent_for_child_category() {
        let crumb = compose_breadcrumb(Some(&selection(category(2, "Brake Pads", Some(1)))), &categories());
        assert_eq!(crumb, "2010 Honda Civic > 1.8L > Brakes > Brake Pads");
    }

    #[test]
    fn test_breadcrumb_omits_parent_for_root_category() {
        let crumb = compose_breadcrumb(Some(&selection(category(7, "Wipers", None))), &categories());
        assert_eq!(crumb, "2010 Honda Civic > 1.8L > Wipers");
    }

    #[test]
    fn test_breadcrumb_falls_back_to_selection_name() {
        let crumb = compose_breadcrumb(Some(&selection(category(42, "Mirrors", Some(1)))), &categories());
        assert_eq!(crumb, "2010 Honda Civic > 1.8L > Mirrors");

        assert_eq!(compose_breadcrumb(None, &categories()), "");
    }

    #[test]
    fn test_resolve_selection_reports_every_missing_id() {
        let request = SelectionRequest { year: 2010, make_id: 5, model_id: 20, engine_id: 999, category_id: 77 };
        let makes = vec![Make { id: 5, name: "Honda".to_string(), country: None }];
        let models = vec![Model { id: 20, name: "Civic".to_string(), make_id: 5 }];

        let unresolved = resolve_selection(&request, &makes, &models, &[], &categories()).unwrap_err();
        assert_eq!(
            unresolved,
            vec![UnresolvedEntity::Engine(999), UnresolvedEntity::Category(77)]
        );
    }

    #[test]
    fn test_request_needs_complete_vehicle() {
        let partial = SearchResult::Category {
            label: "Brakes > Brake Pads".to_string(),
            category_id: 2,
            category_name: "Brake Pads".to_string(),
            vehicle: VehicleCoordinates { year: Some(2010), make_id: Some(5), ..Default::default() },
        };
        assert!(SelectionRequest::from_result(&partial).is_none());

        let vehicle = SearchResult::Vehicle {
            label: "2010 Honda".to_string(),
            vehicle: VehicleCoordinates { year: Some(2010), make_id: Some(5), ..Default::default() },
        };
        assert!(SelectionRequest::from_result(&vehicle).is_none());
    }
}
