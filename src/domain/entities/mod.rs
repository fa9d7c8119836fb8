pub mod dataset;
pub mod feedback;
pub mod field;
pub mod filter;
pub mod schema;
pub mod sync;
pub mod view;
pub mod work_item;
