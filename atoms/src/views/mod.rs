pub mod model;
pub mod service;

pub use model::{LastView, ViewSummary};
