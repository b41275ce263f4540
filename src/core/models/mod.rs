pub mod audit;
pub mod group;
pub mod location;
pub mod user;
pub mod wire;
