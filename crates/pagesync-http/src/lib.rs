//! # pagesync-http
//!
//! The buffered HTTP primitive used by pagesync's git transport: one call per
//! protocol round, whole request body in, whole response body out.
//!
//! # Security
//!
//! Access tokens are held in `SecretString`, which zeroizes memory when
//! dropped, and are only exposed while building the `Authorization` header.

mod auth;
mod client;
mod error;
mod traits;
mod types;

pub use auth::{CredentialCallback, Credentials, TOKEN_PASSWORD};
pub use client::HttpClient;
pub use error::{Error, Result};
pub use traits::BufferedHttp;
pub use types::{HttpRequest, HttpResponse};
// Re-export SecretString for constructing Credentials
pub use secrecy::SecretString;
