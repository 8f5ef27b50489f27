//! Remote call classification.
//!
//! Every network exchange the holder app performs funnels through the
//! [`NetworkResultFactory`], which turns the raw outcome of a call into
//! either its value or exactly one [`NetworkRequestError`] variant. UI
//! layers decide messaging by matching on the variant; no caller ever
//! inspects status codes or error strings directly.

mod factory;
mod result;

pub use factory::{
    ErrorBodyConverter, HttpErrorInterceptor, JsonErrorBodyConverter, NetworkResultFactory,
};
pub use result::{BackendErrorResponse, CallError, HttpError, NetworkRequestError, Step};

/// Result type alias for classified network calls.
#[allow(clippy::module_name_repetitions)]
pub type NetworkRequestResult<T> = Result<T, NetworkRequestError>;
