pub mod trending;
pub mod upstream;

pub use trending::{
    CacheEnvelope, CacheSource, Category, Score, Section, TrendingAggregate, TrendingItem,
    DEFAULT_DESCRIPTION, SCORE_NOT_AVAILABLE,
};
