use std::sync::Arc;
use std::time::Duration;

use folio_kernel::settings::BackendSettings;
use folio_kernel::ResolvedBackend;
use once_cell::sync::OnceCell;
use secrecy::SecretString;

use crate::client::BackendClient;
use crate::error::BackendError;
use crate::rest::RestClient;

type ClientFactory =
    dyn Fn(&str, &SecretString) -> Result<Arc<dyn BackendClient>, BackendError> + Send + Sync;

/// Owns the resolved backend configuration and the one client built from it.
///
/// The client is created on first use and reused for the lifetime of the
/// gateway, even if the environment changes afterwards. A gateway without
/// credentials hands out no client at all.
pub struct Gateway {
    config: ResolvedBackend,
    factory: Box<ClientFactory>,
    client: OnceCell<Arc<dyn BackendClient>>,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("config", &self.config)
            .field("client_ready", &self.client.get().is_some())
            .finish()
    }
}

impl Gateway {
    /// Gateway that builds a [`RestClient`] from `config` on first use.
    pub fn new(config: ResolvedBackend, timeout: Option<Duration>) -> Self {
        Self::with_factory(config, move |url, key| {
            let client = RestClient::new(url, key, timeout)?;
            Ok(Arc::new(client) as Arc<dyn BackendClient>)
        })
    }

    /// Resolve credentials from the process and `settings`, then defer to [`Gateway::new`].
    pub fn from_settings(settings: &BackendSettings) -> Self {
        let config = ResolvedBackend::resolve(settings);
        if !config.is_configured() {
            tracing::warn!("backend not configured; catalog runs on local data");
        }
        Self::new(config, settings.timeout_ms.map(Duration::from_millis))
    }

    /// Gateway with a custom client constructor.
    pub fn with_factory<F>(config: ResolvedBackend, factory: F) -> Self
    where
        F: Fn(&str, &SecretString) -> Result<Arc<dyn BackendClient>, BackendError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            config,
            factory: Box::new(factory),
            client: OnceCell::new(),
        }
    }

    /// Gateway whose client already exists.
    pub fn with_client(client: Arc<dyn BackendClient>) -> Self {
        Self {
            config: ResolvedBackend::empty(),
            factory: Box::new(|_, _| {
                Err(BackendError::Build("client was supplied up front".to_string()))
            }),
            client: OnceCell::with_value(client),
        }
    }

    /// Gateway that never yields a client.
    pub fn unconfigured() -> Self {
        Self::with_factory(ResolvedBackend::empty(), |_, _| {
            Err(BackendError::Build("backend not configured".to_string()))
        })
    }

    /// The configuration this gateway was built with.
    pub fn config(&self) -> &ResolvedBackend {
        &self.config
    }

    pub fn is_configured(&self) -> bool {
        self.client.get().is_some() || self.config.is_configured()
    }

    /// The shared client, or `None` when credentials are missing or the
    /// client could not be built.
    pub fn client(&self) -> Option<Arc<dyn BackendClient>> {
        if let Some(client) = self.client.get() {
            return Some(Arc::clone(client));
        }

        let (url, key) = self.config.credentials()?;
        match self.client.get_or_try_init(|| (self.factory)(url, key)) {
            Ok(client) => Some(Arc::clone(client)),
            Err(err) => {
                tracing::warn!(error = %err, "could not create backend client");
                None
            }
        }
    }
}
