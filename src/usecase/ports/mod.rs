pub mod events;
pub mod repo;
