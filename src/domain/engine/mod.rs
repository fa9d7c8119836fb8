pub mod aggregator;
pub mod columns;
pub mod coordinator;
pub mod evaluator;
pub mod filter_store;
pub mod paginator;
pub mod sorter;
pub mod text;
