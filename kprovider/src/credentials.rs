//! In-memory API key storage with redacted debug output.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::{ProviderError, ProviderId};

#[derive(Clone, PartialEq, Eq)]
pub struct SecretString {
    value: String,
}

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn expose(&self) -> &str {
        self.value.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.value.trim().is_empty()
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl Drop for SecretString {
    fn drop(&mut self) {
        // SAFETY: zero bytes are valid UTF-8, so the string stays well-formed.
        unsafe {
            self.value.as_mut_vec().fill(0);
        }
    }
}

#[derive(Default)]
pub struct SecureCredentialManager {
    api_keys: Mutex<HashMap<ProviderId, SecretString>>,
}

impl std::fmt::Debug for SecureCredentialManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecureCredentialManager([REDACTED])")
    }
}

impl SecureCredentialManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_api_key(
        &self,
        provider: ProviderId,
        api_key: impl Into<String>,
    ) -> Result<(), ProviderError> {
        let api_key = SecretString::new(api_key.into().trim());
        if api_key.is_empty() {
            return Err(ProviderError::authentication("api key must not be empty"));
        }

        self.keys()?.insert(provider, api_key);
        Ok(())
    }

    pub fn api_key(&self, provider: ProviderId) -> Result<Option<SecretString>, ProviderError> {
        Ok(self.keys()?.get(&provider).cloned())
    }

    pub fn has_credentials(&self, provider: ProviderId) -> Result<bool, ProviderError> {
        Ok(self.keys()?.contains_key(&provider))
    }

    pub fn clear(&self, provider: ProviderId) -> Result<bool, ProviderError> {
        Ok(self.keys()?.remove(&provider).is_some())
    }

    pub(crate) fn require_api_key(&self, provider: ProviderId) -> Result<SecretString, ProviderError> {
        self.api_key(provider)?.ok_or_else(|| {
            ProviderError::authentication(format!("no {provider} API key configured"))
        })
    }

    fn keys(&self) -> Result<MutexGuard<'_, HashMap<ProviderId, SecretString>>, ProviderError> {
        self.api_keys
            .lock()
            .map_err(|_| ProviderError::other("credential manager lock poisoned"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProviderErrorKind;

    #[test]
    fn api_keys_are_trimmed_and_redacted() {
        let manager = SecureCredentialManager::new();
        manager
            .set_api_key(ProviderId::OpenAi, "  sk-test-key \n")
            .expect("key should store");

        let key = manager
            .api_key(ProviderId::OpenAi)
            .expect("lookup should work")
            .expect("key should exist");
        assert_eq!(key.expose(), "sk-test-key");
        assert_eq!(format!("{key:?}"), "[REDACTED]");
        assert_eq!(format!("{manager:?}"), "SecureCredentialManager([REDACTED])");
    }

    #[test]
    fn blank_keys_are_rejected_and_missing_keys_fail_authentication() {
        let manager = SecureCredentialManager::new();
        let err = manager
            .set_api_key(ProviderId::OpenRouter, "   ")
            .expect_err("blank key must fail");
        assert_eq!(err.kind, ProviderErrorKind::Authentication);

        let err = manager
            .require_api_key(ProviderId::OpenRouter)
            .expect_err("missing key must fail");
        assert_eq!(err.kind, ProviderErrorKind::Authentication);
        assert!(err.message.contains("openrouter"));
    }

    #[test]
    fn clear_removes_credentials() {
        let manager = SecureCredentialManager::new();
        manager
            .set_api_key(ProviderId::OpenAi, "sk-1")
            .expect("key should store");
        assert!(manager.has_credentials(ProviderId::OpenAi).expect("lookup"));
        assert!(manager.clear(ProviderId::OpenAi).expect("clear"));
        assert!(!manager.has_credentials(ProviderId::OpenAi).expect("lookup"));
    }
}
