use lambda_http::{http::StatusCode, Body, Error, Response};
use serde::Serialize;
use truckspy_atoms::StoreError;

/// JSON response; CORS headers are added by the router.
pub fn json<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(serde_json::to_string(value)?.into())
        .map_err(Box::new)?)
}

/// `{}`: absence of data is never a distinguishable status.
pub fn empty_object() -> Result<Response<Body>, Error> {
    json(StatusCode::OK, &serde_json::json!({}))
}

pub fn error(status: StatusCode, message: &str) -> Result<Response<Body>, Error> {
    json(status, &serde_json::json!({ "error": message }))
}

/// Rejected submissions are client errors, everything else is a server error.
pub fn store_error(err: &StoreError) -> Result<Response<Body>, Error> {
    match err {
        StoreError::InvalidLabel(_) => error(StatusCode::BAD_REQUEST, &err.to_string()),
        _ => error(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string()),
    }
}
