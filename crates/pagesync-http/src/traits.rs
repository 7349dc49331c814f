//! Trait abstraction for the buffered HTTP primitive.
//!
//! The git transport only needs "send one whole request, get one whole
//! response back". Keeping that behind a trait lets the transport be driven by
//! a recording mock in tests.

use crate::{HttpRequest, HttpResponse, Result};

/// A single-call, fully-buffered HTTP primitive.
///
/// Implementations must not fail on non-2xx responses: the status is returned
/// to the caller, which decides what it means.
pub trait BufferedHttp: Send + Sync {
    /// Issue one request and return the whole response.
    ///
    /// # Errors
    /// Returns error only when no response was received at all.
    fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}
