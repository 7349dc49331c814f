//! Credentials for authenticated remote operations.

use std::fmt;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use secrecy::{ExposeSecret, SecretString};

/// Password sent alongside a personal access token.
///
/// Token-based basic auth puts the token in the username slot; the password
/// is a fixed value the server ignores.
pub const TOKEN_PASSWORD: &str = "x-oauth-basic";

/// Username/password pair supplied for one remote request.
pub struct Credentials {
    /// Username slot (holds the access token).
    pub username: SecretString,
    /// Password slot.
    pub password: String,
}

impl Credentials {
    /// Credentials for a personal access token.
    #[must_use]
    pub fn token(token: &str) -> Self {
        Self {
            username: SecretString::new(token.to_owned().into_boxed_str()),
            password: TOKEN_PASSWORD.to_owned(),
        }
    }

    /// Value for an `Authorization` header.
    #[must_use]
    pub fn basic_header(&self) -> String {
        let raw = format!("{}:{}", self.username.expose_secret(), self.password);
        format!("Basic {}", STANDARD.encode(raw))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &"[REDACTED]")
            .field("password", &self.password)
            .finish()
    }
}

/// Callback invoked at request time to obtain credentials.
pub type CredentialCallback = Arc<dyn Fn() -> Credentials + Send + Sync>;
