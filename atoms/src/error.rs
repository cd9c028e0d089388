use thiserror::Error;

/// Failures surfaced by the document and blob stores.
///
/// Absence on reads is modelled as `Ok(None)`, not as an error. `NotFound`
/// is reserved for writes that target a document which does not exist.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{what} not found")]
    NotFound { what: String },

    #[error("{what} was modified concurrently")]
    Conflict { what: String },

    #[error("Invalid label: {0}")]
    InvalidLabel(String),

    #[error("Malformed document: {0}")]
    Malformed(String),

    #[error("Store error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    pub fn not_found(what: impl Into<String>) -> Self {
        StoreError::NotFound { what: what.into() }
    }

    pub fn conflict(what: impl Into<String>) -> Self {
        StoreError::Conflict { what: what.into() }
    }
}

/// Wraps an SDK failure with the operation that produced it.
pub(crate) fn backend<E>(operation: &str, err: E) -> StoreError
where
    E: std::error::Error,
{
    StoreError::Backend(format!(
        "{} error: {}",
        operation,
        aws_sdk_dynamodb::error::DisplayErrorContext(&err)
    ))
}
