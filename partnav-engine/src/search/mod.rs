//! Free-text search: the stateless resolver and the debounced search bar session

pub mod resolver;
pub mod session;

pub use resolver::{SearchResolver, DEFAULT_MAX_RESULTS};
pub use session::{SearchAction, SearchMode, SearchSession, SearchView};
