//! # partnav engine
//!
//! Catalog navigation and search resolution for an auto-parts catalog:
//! free-text queries resolve to points in the year → make → model → engine
//! hierarchy, and chosen results drive a lazily loaded fitment tree to the
//! matching vehicle and part category.
//!
//! **Architecture:**
//! - [`provider`]: async seam to the catalog data
//! - [`catalog`]: validated in-memory snapshot implementing the provider
//! - [`search`]: resolver plus the debounced search bar session
//! - [`tree`]: expansion and selection state with lazy child fetches
//! - [`expansion`]: commands that reveal and select search results in the tree
//! - [`compositor`]: canonical part selection and breadcrumb
//! - [`navigator`]: one session wiring everything to a shared event bus

pub mod catalog;
pub mod compositor;
pub mod expansion;
pub mod generation;
pub mod navigator;
pub mod parts;
pub mod provider;
pub mod search;
pub mod tree;

pub use catalog::{Catalog, CatalogSnapshot, FetchCounts, InMemoryCatalog};
pub use compositor::{compose_breadcrumb, resolve_selection, SelectionRequest};
pub use expansion::{ExpansionController, ExpansionOutcome, NavigatorCommand, RejectReason};
pub use generation::GenerationCounter;
pub use navigator::Navigator;
pub use provider::CatalogProvider;
pub use search::{SearchAction, SearchMode, SearchResolver, SearchSession, SearchView};
pub use tree::{CategoryBranch, FitmentTree, NodeLoad, TreeNode, TreeStats};
