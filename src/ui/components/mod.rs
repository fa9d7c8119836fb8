pub mod filters;
pub mod summary;
pub mod table;
