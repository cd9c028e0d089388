//! Domain models and storage for food-truck snapshot labeling.
//!
//! Every atom keeps its model next to the DynamoDB service functions that
//! read and write it; [`store`] exposes those through traits so the
//! labeling workflow can run against DynamoDB/S3 or in memory.

pub mod dynamo;
pub mod error;
pub mod groups;
pub mod media;
pub mod memory;
pub mod s3;
pub mod store;
pub mod views;

pub use error::{StoreError, StoreResult};
pub use store::{BlobStore, LabelStore};
