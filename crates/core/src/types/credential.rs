//! Bearer credential issued by the backend at login.
//!
//! The token is opaque to the client. It is wrapped in a [`SecretString`] so it
//! never shows up in `Debug` output or log lines.

use core::fmt;

use secrecy::{ExposeSecret, SecretString};

/// Errors that can occur when constructing a [`Credential`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// The token is empty or whitespace.
    #[error("credential cannot be empty")]
    Empty,
}

/// An opaque bearer token authorizing backend requests.
///
/// ## Examples
///
/// ```
/// use smartsales_core::Credential;
///
/// let credential = Credential::parse("9944b09199c62bcf9418ad846dd0e4bbdfc6ee4b").unwrap();
/// assert_eq!(
///     credential.authorization_header(),
///     "Token 9944b09199c62bcf9418ad846dd0e4bbdfc6ee4b"
/// );
///
/// assert!(Credential::parse("  ").is_err());
/// assert!(!format!("{credential:?}").contains("9944b"));
/// ```
#[derive(Clone)]
pub struct Credential(SecretString);

impl Credential {
    /// Scheme used in the `Authorization` header.
    pub const SCHEME: &'static str = "Token";

    /// Parse a credential from the raw token string.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::Empty`] if the token is empty or whitespace.
    pub fn parse(token: &str) -> Result<Self, CredentialError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(CredentialError::Empty);
        }
        Ok(Self(SecretString::from(token.to_owned())))
    }

    /// Expose the raw token, for persistence and request headers only.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    /// Value for the `Authorization` header (`Token <token>`).
    #[must_use]
    pub fn authorization_header(&self) -> String {
        format!("{} {}", Self::SCHEME, self.expose())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&"[REDACTED]").finish()
    }
}

impl PartialEq for Credential {
    fn eq(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

impl Eq for Credential {}

impl std::str::FromStr for Credential {
    type Err = CredentialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims() {
        let credential = Credential::parse("  abc123\n").unwrap();
        assert_eq!(credential.expose(), "abc123");
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(Credential::parse(""), Err(CredentialError::Empty));
        assert_eq!(Credential::parse("\t "), Err(CredentialError::Empty));
    }

    #[test]
    fn test_debug_redacts_token() {
        let credential = Credential::parse("super_secret_token").unwrap();
        let debug_output = format!("{credential:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_token"));
    }

    #[test]
    fn test_authorization_header() {
        let credential: Credential = "abc".parse().unwrap();
        assert_eq!(credential.authorization_header(), "Token abc");
    }
}
