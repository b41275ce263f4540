mod join_tests;

use crate::core::clock::ManualClock;
use crate::core::membership::JoinStrategy;
use crate::core::models::location::GeoPoint;
use crate::core::models::user::Session;
use crate::core::services::AkahidegnService;
use crate::infrastructure::logging::in_memory::InMemoryLogging;
use crate::infrastructure::preferences::in_memory::InMemoryPreferences;
use crate::infrastructure::store::in_memory::InMemoryStore;
use std::sync::Arc;

pub type TestService = AkahidegnService<InMemoryLogging, InMemoryStore, InMemoryPreferences>;

pub const NOW: i64 = 1_700_000_000_000;

pub fn create_test_service() -> TestService {
    let storage = InMemoryStore::new();
    let logging = InMemoryLogging::new();
    let preferences = InMemoryPreferences::new();
    AkahidegnService::new(storage, logging, preferences, "test-secret".to_string())
}

/// A service on a manual clock set to [`NOW`], plus handles to its store and
/// clock.
pub fn create_controlled_service(strategy: JoinStrategy) -> (TestService, InMemoryStore, Arc<ManualClock>) {
    let storage = InMemoryStore::new();
    let clock = Arc::new(ManualClock::new(NOW));
    let service = AkahidegnService::new(
        storage.clone(),
        InMemoryLogging::new(),
        InMemoryPreferences::new(),
        "test-secret".to_string(),
    )
    .with_clock(clock.clone())
    .with_join_strategy(strategy);
    (service, storage, clock)
}

pub fn session(user_id: &str) -> Session {
    Session::new(user_id)
}

pub fn bole() -> GeoPoint {
    GeoPoint { lat: 8.9806, lng: 38.7578 }
}
