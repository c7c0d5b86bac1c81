//! Synchronous tree state
//!
//! Expanded keys, per-node load results, the selected path and the root
//! lists. Holds no I/O: [`FitmentTree`](super::FitmentTree) wraps it in a lock
//! and drives the provider calls around it.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use partnav_common::{
    Category, Engine, Make, MakeId, Model, ModelId, NodeKey, PartSelection, SelectedPath, TreeLevel,
    Year,
};

use super::node::NodeLoad;

/// Tree statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TreeStats {
    pub expanded: usize,
    pub loading: usize,
    pub failed: usize,
    /// Child fetches issued since the tree was created
    pub fetches_issued: u64,
}

#[derive(Debug, Clone)]
struct LoadSlot {
    ticket: u64,
    load: NodeLoad,
}

/// Expansion and selection state of one navigator session
#[derive(Debug, Default)]
pub struct TreeState {
    years: Vec<Year>,
    categories: Vec<Category>,
    expanded: HashSet<NodeKey>,
    loads: HashMap<NodeKey, LoadSlot>,
    selected: SelectedPath,
    part_selection: Option<PartSelection>,
    next_ticket: u64,
}

impl TreeState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_roots(&mut self, years: Vec<Year>, categories: Vec<Category>) {
        self.years = years;
        self.categories = categories;
    }

    pub fn set_categories(&mut self, categories: Vec<Category>) {
        self.categories = categories;
    }

    pub fn years(&self) -> &[Year] {
        &self.years
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn is_expanded(&self, key: &NodeKey) -> bool {
        self.expanded.contains(key)
    }

    /// Mark `key` expanded; false when it already was
    pub fn expand(&mut self, key: NodeKey) -> bool {
        self.expanded.insert(key)
    }

    /// Mark `key` collapsed; false when it was not expanded
    ///
    /// Loaded children are kept. An in-flight fetch still lands.
    pub fn collapse(&mut self, key: &NodeKey) -> bool {
        self.expanded.remove(key)
    }

    /// Record a new fetch for `key` and return its ticket
    pub fn begin_load(&mut self, key: NodeKey) -> u64 {
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        self.loads.insert(key, LoadSlot { ticket, load: NodeLoad::Loading });
        ticket
    }

    /// Store a fetch result if `ticket` is the latest fetch for `key`
    ///
    /// Returns false when a newer fetch was issued in the meantime.
    pub fn finish_load(&mut self, key: NodeKey, ticket: u64, load: NodeLoad) -> bool {
        match self.loads.get_mut(&key) {
            Some(slot) if slot.ticket == ticket => {
                slot.load = load;
                true
            }
            _ => false,
        }
    }

    pub fn load(&self, key: &NodeKey) -> Option<&NodeLoad> {
        self.loads.get(key).map(|slot| &slot.load)
    }

    /// Makes loaded under an expanded year
    pub fn makes(&self, year: Year) -> Option<&[Make]> {
        match self.load(&NodeKey::Year { year }) {
            Some(NodeLoad::Makes(makes)) => Some(makes),
            _ => None,
        }
    }

    /// Models loaded under a (year, make) node
    pub fn models(&self, year: Year, make_id: MakeId) -> Option<&[Model]> {
        match self.load(&NodeKey::Make { year, make_id }) {
            Some(NodeLoad::Models(models)) => Some(models),
            _ => None,
        }
    }

    /// Engines loaded under a (make, model) node
    pub fn engines(&self, make_id: MakeId, model_id: ModelId) -> Option<&[Engine]> {
        match self.load(&NodeKey::Model { make_id, model_id }) {
            Some(NodeLoad::Engines(engines)) => Some(engines),
            _ => None,
        }
    }

    pub fn selected(&self) -> &SelectedPath {
        &self.selected
    }

    /// Replace the selected path wholesale
    ///
    /// A part selection survives only if it still points at the new path.
    pub fn select(&mut self, path: SelectedPath) {
        if self.part_selection.as_ref().is_some_and(|s| s.path() != path) {
            self.part_selection = None;
        }
        self.selected = path;
    }

    /// Select a resolved part type; the path follows it
    pub fn select_part(&mut self, selection: PartSelection) {
        self.selected = selection.path();
        self.part_selection = Some(selection);
    }

    pub fn part_selection(&self) -> Option<&PartSelection> {
        self.part_selection.as_ref()
    }

    /// Expanded keys, optionally restricted to one level, in key order
    pub fn expanded_keys(&self, level: Option<TreeLevel>) -> Vec<NodeKey> {
        let mut keys: Vec<NodeKey> = self
            .expanded
            .iter()
            .filter(|k| level.map_or(true, |l| k.level() == l))
            .copied()
            .collect();
        keys.sort();
        keys
    }

    pub fn stats(&self) -> TreeStats {
        TreeStats {
            expanded: self.expanded.len(),
            loading: self.loads.values().filter(|s| s.load.is_loading()).count(),
            failed: self.loads.values().filter(|s| s.load.is_failed()).count(),
            fetches_issued: self.next_ticket,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make(id: MakeId, name: &str) -> Make {
        Make { id, name: name.to_string(), country: None }
    }

    #[test]
    fn test_expand_and_collapse_flip_membership() {
        let mut state = TreeState::new();
        let key = NodeKey::Make { year: 2010, make_id: 5 };

        assert!(state.expand(key));
        assert!(!state.expand(key));
        assert!(state.is_expanded(&key));
        // Same make under another year is a different node
        assert!(!state.is_expanded(&NodeKey::Make { year: 2011, make_id: 5 }));

        assert!(state.collapse(&key));
        assert!(!state.collapse(&key));
        assert!(!state.is_expanded(&key));
    }

    #[test]
    fn test_superseded_fetch_is_discarded() {
        let mut state = TreeState::new();
        let key = NodeKey::Year { year: 2010 };

        let first = state.begin_load(key);
        let second = state.begin_load(key);
        assert!(state.finish_load(key, second, NodeLoad::Makes(vec![make(5, "Honda")])));
        assert!(!state.finish_load(key, first, NodeLoad::Makes(Vec::new())));

        assert_eq!(state.makes(2010).unwrap()[0].name, "Honda");
        assert_eq!(state.stats().fetches_issued, 2);
    }

    #[test]
    fn test_collapse_keeps_loaded_children() {
        let mut state = TreeState::new();
        let key = NodeKey::Year { year: 2010 };
        state.expand(key);
        let ticket = state.begin_load(key);
        state.collapse(&key);

        assert!(state.finish_load(key, ticket, NodeLoad::Makes(vec![make(1, "Toyota")])));
        assert!(state.makes(2010).is_some());
        assert!(!state.is_expanded(&key));
    }

    #[test]
    fn test_new_path_drops_stale_part_selection() {
        let selection = PartSelection {
            year: 2010,
            make: make(5, "Honda"),
            model: Model { id: 20, name: "Civic".to_string(), make_id: 5 },
            engine: Engine { id: 200, name: "1.8L".to_string(), model_id: 20 },
            category: Category { id: 2, name: "Brake Pads".to_string(), parent_id: Some(1) },
        };

        let mut state = TreeState::new();
        state.select_part(selection.clone());
        state.select(selection.path());
        assert!(state.part_selection().is_some());

        state.select(SelectedPath { year: Some(2010), ..Default::default() });
        assert!(state.part_selection().is_none());
        assert_eq!(state.selected().year, Some(2010));
    }

    #[test]
    fn test_expanded_keys_by_level() {
        let mut state = TreeState::new();
        state.expand(NodeKey::Engine { engine_id: 200 });
        state.expand(NodeKey::Year { year: 2011 });
        state.expand(NodeKey::Year { year: 2010 });

        assert_eq!(
            state.expanded_keys(Some(TreeLevel::Year)),
            vec![NodeKey::Year { year: 2010 }, NodeKey::Year { year: 2011 }]
        );
        assert_eq!(state.expanded_keys(None).len(), 3);
    }

    #[test]
    fn test_stats_count_loading_and_failed() {
        let mut state = TreeState::new();
        state.begin_load(NodeKey::Year { year: 2010 });
        let ticket = state.begin_load(NodeKey::Year { year: 2011 });
        state.finish_load(NodeKey::Year { year: 2011 }, ticket, NodeLoad::Failed("boom".to_string()));

        let stats = state.stats();
        assert_eq!(stats.loading, 1);
        assert_eq!(stats.failed, 1);
    }
}
