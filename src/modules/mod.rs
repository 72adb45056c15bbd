pub mod books;

use std::sync::Arc;

use folio_backend::Gateway;
use folio_identity::IdentityGateway;
use folio_kernel::settings::Settings;

use books::CatalogRepository;

/// The services presentation code talks to, all sharing one gateway.
#[derive(Debug, Clone)]
pub struct Services {
    pub gateway: Arc<Gateway>,
    pub catalog: Arc<CatalogRepository>,
    pub identity: IdentityGateway,
}

impl Services {
    /// Resolve backend credentials from the process and `settings`, then wire
    /// the catalog and identity services to a single gateway.
    pub fn from_settings(settings: &Settings) -> Self {
        let gateway = Arc::new(Gateway::from_settings(&settings.backend));
        Self::with_gateway(gateway, settings)
    }

    pub fn with_gateway(gateway: Arc<Gateway>, settings: &Settings) -> Self {
        let catalog = CatalogRepository::from_settings(Arc::clone(&gateway), &settings.backend);
        let identity = IdentityGateway::new(Arc::clone(&gateway));
        Self {
            gateway,
            catalog: Arc::new(catalog),
            identity,
        }
    }
}
