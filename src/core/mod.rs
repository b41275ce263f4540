pub mod clock;
pub mod errors;
pub mod expiry;
pub mod membership;
pub mod models;
pub mod search_history;
pub mod services;
pub mod state;
