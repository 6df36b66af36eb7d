pub mod format;
pub mod mock;
pub mod resilient;
pub mod web;

pub use format::{format_observation, format_results, NO_RESULTS_MESSAGE};
pub use mock::MockSearchProvider;
pub use resilient::ResilientSearchProvider;
pub use web::TavilySearchProvider;
