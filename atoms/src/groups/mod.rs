pub mod model;
pub mod service;

pub use model::{GroupType, LabelGroup};
