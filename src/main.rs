use anyhow::Context;
use folio_app::{CatalogSource, Services};
use folio_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load folio settings")?;
    folio_telemetry::init(&settings.telemetry);

    tracing::info!(
        env = ?settings.environment,
        backend = ?settings.backend,
        "folio-app bootstrap starting"
    );

    let services = Services::from_settings(&settings);
    let catalog = services.catalog.fetch_books().await;

    tracing::info!(
        books = catalog.data.len(),
        remote = catalog.source == CatalogSource::Remote,
        "folio-app bootstrap complete"
    );
    Ok(())
}
