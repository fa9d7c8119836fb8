pub mod app;
pub mod config;
pub mod domain;
pub mod infra;
pub mod telemetry;
pub mod usecase;

#[cfg(feature = "desktop")]
pub mod platform;
#[cfg(feature = "desktop")]
pub mod ui;

#[cfg(test)]
mod tests;
