pub mod providers;
pub mod selection;
pub mod trending;

pub use selection::select_sections;
pub use trending::{CacheStatus, TrendingCache};
