pub mod executor;
pub mod sanitizer;
pub mod wildcard;

pub use executor::QueryExecutor;
pub use sanitizer::sanitize;
