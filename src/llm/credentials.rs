//! Credential lookup for the inference backend

use super::LlmError;

/// Source of the bearer credential attached to inference requests.
///
/// Acquisition (role assumption, token exchange) lives behind this seam;
/// `Ok(None)` means the backend is called without an `Authorization` header.
pub trait CredentialSource: Send + Sync {
    fn bearer_token(&self) -> Result<Option<String>, LlmError>;
}

/// Credential fixed at startup from configuration
#[derive(Clone, Default)]
pub struct StaticCredentials {
    token: Option<String>,
}

impl StaticCredentials {
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }
}

// Never print the token itself
impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("configured", &self.token.is_some())
            .finish()
    }
}

impl CredentialSource for StaticCredentials {
    fn bearer_token(&self) -> Result<Option<String>, LlmError> {
        match &self.token {
            Some(token) if token.trim().is_empty() => Err(LlmError::credential(
                "inference credential is configured but empty",
            )),
            Some(token) => Ok(Some(token.trim().to_string())),
            None => Ok(None),
        }
    }
}
