//! Parameter search: candidate lattice, train/test split, ranking.

mod engine;
mod lattice;
mod result;

pub use engine::{
    DEFAULT_TOP_N, DEFAULT_TRAIN_RATIO, MIN_SEARCH_BARS, ParameterSearchEngine,
};
pub use lattice::{LatticeConfig, generate_candidates};
pub use result::SearchResult;
