//! Labeling workflow over the document and blob stores: image assignment,
//! label reconciliation, and the read-only projections built on them.

pub mod assignment;
pub mod cleanup;
pub mod export;
pub mod groups;
pub mod reconcile;
pub mod responses;
pub mod snapshots;
pub mod views;

#[cfg(test)]
mod testing;
