pub mod creature;
pub mod events;
pub mod models;
pub mod wizard;
