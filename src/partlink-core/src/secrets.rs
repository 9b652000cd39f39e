//! Secure credential storage using the OS keyring.
//!
//! Supplier connections carry two values that must never land in the plain
//! settings file: the OAuth client secret and the raw token response. Both
//! are stored under the "partlink" service with a user key of the form
//! `<supplier>/<connection>/<kind>`.

use thiserror::Error;

/// Service name used for all Partlink credentials in the OS keyring.
const SERVICE_NAME: &str = "partlink";

/// Errors that can occur when accessing the credential store.
#[derive(Debug, Error)]
pub enum SecretsError {
    #[error("credential not found: {key}")]
    NotFound { key: String },

    #[error("keyring access denied: {0}")]
    AccessDenied(String),

    #[error("keyring unavailable: {0}")]
    Unavailable(String),

    #[error("keyring error: {0}")]
    Other(String),
}

impl From<keyring::Error> for SecretsError {
    fn from(err: keyring::Error) -> Self {
        match err {
            keyring::Error::NoEntry => SecretsError::NotFound {
                key: "unknown".into(),
            },
            keyring::Error::NoStorageAccess(e) => SecretsError::AccessDenied(e.to_string()),
            keyring::Error::PlatformFailure(e) => SecretsError::Unavailable(e.to_string()),
            other => SecretsError::Other(other.to_string()),
        }
    }
}

pub type SecretsResult<T> = Result<T, SecretsError>;

/// Kinds of secret a supplier connection keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecretKind {
    /// OAuth client secret issued by the supplier's developer portal.
    ClientSecret,
    /// Raw JSON body of the last successful token exchange.
    TokenResponse,
}

impl SecretKind {
    fn as_str(&self) -> &'static str {
        match self {
            SecretKind::ClientSecret => "client_secret",
            SecretKind::TokenResponse => "token_response",
        }
    }
}

/// Credential store backed by the OS keyring.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    service: String,
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore {
    pub fn new() -> Self {
        Self {
            service: SERVICE_NAME.into(),
        }
    }

    fn build_key(supplier: &str, connection: &str, kind: SecretKind) -> String {
        format!("{}/{}/{}", supplier, connection, kind.as_str())
    }

    pub fn store(
        &self,
        supplier: &str,
        connection: &str,
        kind: SecretKind,
        secret: &str,
    ) -> SecretsResult<()> {
        let key = Self::build_key(supplier, connection, kind);
        let entry = keyring::Entry::new(&self.service, &key)?;
        entry.set_password(secret)?;
        tracing::debug!(supplier, connection, kind = ?kind, "stored credential in keyring");
        Ok(())
    }

    /// Returns `SecretsError::NotFound` if the secret doesn't exist.
    pub fn get(&self, supplier: &str, connection: &str, kind: SecretKind) -> SecretsResult<String> {
        let key = Self::build_key(supplier, connection, kind);
        let entry = keyring::Entry::new(&self.service, &key)?;
        match entry.get_password() {
            Ok(secret) => Ok(secret),
            Err(keyring::Error::NoEntry) => Err(SecretsError::NotFound { key }),
            Err(e) => Err(e.into()),
        }
    }

    /// Succeeds when the secret is already absent.
    pub fn delete(&self, supplier: &str, connection: &str, kind: SecretKind) -> SecretsResult<()> {
        let key = Self::build_key(supplier, connection, kind);
        let entry = keyring::Entry::new(&self.service, &key)?;
        match entry.delete_credential() {
            Ok(()) => {
                tracing::debug!(supplier, connection, kind = ?kind, "deleted credential from keyring");
                Ok(())
            }
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Keyring round-trips need a live secret service, so only key layout is covered here.

    #[test]
    fn key_building() {
        let key = CredentialStore::build_key("digikey", "default", SecretKind::ClientSecret);
        assert_eq!(key, "digikey/default/client_secret");
    }

    #[test]
    fn secret_kind_as_str() {
        assert_eq!(SecretKind::ClientSecret.as_str(), "client_secret");
        assert_eq!(SecretKind::TokenResponse.as_str(), "token_response");
    }
}
