// Re-export model types; service functions stay namespaced
pub mod model;
pub mod service;

pub use model::{
    format_timestamp, parse_timestamp, Blob, ImageDocument, ImageRef, LabelCommit, LabelEntry,
    LabelSet, LabelValue,
};
