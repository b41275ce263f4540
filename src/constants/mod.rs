pub mod actions;
pub mod limits;
