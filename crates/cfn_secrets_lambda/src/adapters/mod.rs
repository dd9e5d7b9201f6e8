//! Collaborator seams used by the handlers, plus their AWS-backed implementations.
//!
//! Handlers are synchronous. The AWS implementations bridge into the async SDKs
//! with [`run_blocking`], which requires a multi-threaded Tokio runtime.

use std::future::Future;

pub mod key_service;
pub mod parameter_store;
pub mod response;

pub(crate) fn run_blocking<F: Future>(future: F) -> F::Output {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
