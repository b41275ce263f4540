pub mod api;
pub mod auth;
pub mod config;
pub mod constants;
pub mod core;
pub mod infrastructure;

pub use crate::core::errors::AkahidegnError;
pub use crate::core::services::AkahidegnService;
pub use crate::infrastructure::logging::in_memory::InMemoryLogging;
pub use crate::infrastructure::preferences::in_memory::InMemoryPreferences;
pub use crate::infrastructure::store::in_memory::InMemoryStore;

#[cfg(test)]
mod tests; // Include integration tests
