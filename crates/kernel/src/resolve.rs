//! Backend credential resolution.
//!
//! Two sources are consulted per value: explicit process configuration
//! (`FOLIO_BACKEND_URL`, `FOLIO_BACKEND_KEY`) first, then the embedded
//! [`BackendSettings`]. Empty values count as absent.

use secrecy::{ExposeSecret, SecretString};

use crate::settings::BackendSettings;

pub const URL_VAR: &str = "FOLIO_BACKEND_URL";
pub const KEY_VAR: &str = "FOLIO_BACKEND_KEY";

/// Outcome of credential resolution. Either field may be missing; that is the
/// supported "run without a backend" state, not an error.
pub struct ResolvedBackend {
    pub url: Option<String>,
    pub key: Option<SecretString>,
}

impl ResolvedBackend {
    /// Resolution that never finds anything.
    pub fn empty() -> Self {
        Self {
            url: None,
            key: None,
        }
    }

    pub fn new(url: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            url: non_empty(Some(url.into())),
            key: non_empty(Some(key.into())).map(SecretString::from),
        }
    }

    /// Resolve against the real process environment.
    pub fn resolve(embedded: &BackendSettings) -> Self {
        Self::resolve_with(embedded, |name| std::env::var(name).ok())
    }

    /// Resolve with an injectable process lookup.
    pub fn resolve_with<F>(embedded: &BackendSettings, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = non_empty(lookup(URL_VAR)).or_else(|| non_empty(embedded.url.clone()));
        let key = non_empty(lookup(KEY_VAR)).or_else(|| non_empty(embedded.key.clone()));

        let resolved = Self {
            url,
            key: key.map(SecretString::from),
        };

        tracing::debug!(
            has_url = resolved.url.is_some(),
            has_key = resolved.key.is_some(),
            "backend configuration resolved"
        );

        resolved
    }

    /// Both values are present.
    pub fn is_configured(&self) -> bool {
        self.url.is_some() && self.key.is_some()
    }

    /// Borrow both values, or `None` when either is missing.
    pub fn credentials(&self) -> Option<(&str, &SecretString)> {
        match (&self.url, &self.key) {
            (Some(url), Some(key)) => Some((url.as_str(), key)),
            _ => None,
        }
    }
}

impl Clone for ResolvedBackend {
    fn clone(&self) -> Self {
        Self {
            url: self.url.clone(),
            key: self
                .key
                .as_ref()
                .map(|key| SecretString::from(key.expose_secret().to_owned())),
        }
    }
}

impl std::fmt::Debug for ResolvedBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedBackend")
            .field("url", &self.url)
            .field("has_key", &self.key.is_some())
            .finish()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
