pub mod handlers;
pub mod models;
pub mod openapi;

use crate::core::services::AkahidegnService;
use crate::infrastructure::{
    logging::in_memory::InMemoryLogging, preferences::in_memory::InMemoryPreferences, store::in_memory::InMemoryStore,
};

pub use handlers::api_routes;
pub use openapi::ApiDoc;

/// The service as wired into the HTTP server.
pub type AppService = AkahidegnService<InMemoryLogging, InMemoryStore, InMemoryPreferences>;
