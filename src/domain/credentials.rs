//! Source API credentials
//!
//! Credentials are built once per job, handed to the source client for
//! authentication and dropped as soon as a session exists. They are not `Clone`
//! so that a copy cannot outlive the job by accident.

use crate::config::{secret_string, SecretString};
use crate::domain::{Result, WaymarkError};
use secrecy::ExposeSecret;

/// Identity/secret pair for the source API
#[derive(Debug)]
pub struct Credentials {
    identity: String,
    secret: SecretString,
}

impl Credentials {
    /// Creates credentials from an identity (email) and a protected secret
    pub fn new(identity: impl Into<String>, secret: SecretString) -> Result<Self> {
        let identity = identity.into();
        if identity.trim().is_empty() {
            return Err(WaymarkError::Configuration(
                "credential identity cannot be empty".to_string(),
            ));
        }
        if secret.expose_secret().is_empty() {
            return Err(WaymarkError::Configuration(
                "credential secret cannot be empty".to_string(),
            ));
        }
        Ok(Self { identity, secret })
    }

    /// Parses the `email:password` API key form
    ///
    /// The split happens at the first `:`, so passwords may contain colons.
    ///
    /// # Examples
    ///
    /// ```
    /// use waymark::domain::Credentials;
    ///
    /// let creds = Credentials::from_api_key("rider@example.com:pa:ss").unwrap();
    /// assert_eq!(creds.identity(), "rider@example.com");
    /// assert!(Credentials::from_api_key("no-separator").is_err());
    /// ```
    pub fn from_api_key(api_key: &str) -> Result<Self> {
        let (identity, secret) = api_key.split_once(':').ok_or_else(|| {
            WaymarkError::Configuration(
                "API key must have the form 'email:password'".to_string(),
            )
        })?;
        Self::new(identity.trim(), secret_string(secret.to_string()))
    }

    /// Returns the identity (email address)
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Returns the protected secret
    pub fn secret(&self) -> &SecretString {
        &self.secret
    }
}
