//! Parts query for a resolved selection

use std::collections::BTreeMap;

use partnav_common::{Part, PartSelection, Result};

use crate::provider::CatalogProvider;

/// Group header for parts without a mounting position
pub const UNPOSITIONED: &str = "Other";

/// Parts fitting the selection's category and engine
pub async fn parts_for_selection(
    provider: &dyn CatalogProvider,
    selection: &PartSelection,
) -> Result<Vec<Part>> {
    provider
        .get_parts(selection.category.id, Some(selection.engine.id))
        .await
}

/// Case-insensitive text filter over brand, part number, description,
/// position and warranty
///
/// Blank text keeps every part.
pub fn filter_parts(parts: &[Part], text: &str) -> Vec<Part> {
    if text.trim().is_empty() {
        return parts.to_vec();
    }

    let needle = text.to_lowercase();
    parts
        .iter()
        .filter(|part| searchable_text(part).contains(&needle))
        .cloned()
        .collect()
}

/// Parts grouped by mounting position, positions sorted
pub fn group_by_position(parts: &[Part]) -> BTreeMap<String, Vec<Part>> {
    let mut groups: BTreeMap<String, Vec<Part>> = BTreeMap::new();
    for part in parts {
        let position = part.position.as_deref().unwrap_or(UNPOSITIONED);
        groups.entry(position.to_string()).or_default().push(part.clone());
    }
    groups
}

fn searchable_text(part: &Part) -> String {
    [
        Some(part.brand.as_str()),
        Some(part.part_number.as_str()),
        Some(part.description.as_str()),
        part.position.as_deref(),
        Some(part.warranty.as_str()),
    ]
    .into_iter()
    .flatten()
    .filter(|field| !field.is_empty())
    .collect::<Vec<_>>()
    .join(" ")
    .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    fn parts() -> Vec<Part> {
        Catalog::from_json_str(include_str!("../fixtures/sample_catalog.json"))
            .unwrap()
            .parts_for(2, None)
    }

    #[test]
    fn test_blank_filter_keeps_everything() {
        assert_eq!(filter_parts(&parts(), "   ").len(), parts().len());
    }

    #[test]
    fn test_filter_matches_any_field() {
        let parts = parts();

        let rear = filter_parts(&parts, "REAR");
        assert_eq!(rear.len(), 1);
        assert_eq!(rear[0].brand, "Wagner");

        // Brand and part number read as one string
        assert_eq!(filter_parts(&parts, "akebono act").len(), 1);
        assert_eq!(filter_parts(&parts, "limited lifetime").len(), 1);
        assert!(filter_parts(&parts, "titanium").is_empty());
    }

    #[test]
    fn test_group_by_position() {
        let mut parts = parts();
        parts[0].position = None;

        let groups = group_by_position(&parts);
        let positions: Vec<_> = groups.keys().map(String::as_str).collect();
        assert_eq!(positions, vec!["Front", "Other", "Rear"]);
    }
}
