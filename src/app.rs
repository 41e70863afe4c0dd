//! Process bootstrap: storage, module registry, HTTP server.

use std::sync::Arc;

use anyhow::Context;
use bookshelf_kernel::{
    settings::{DatabaseSettings, Settings},
    InitCtx, ModuleRegistry,
};

use crate::modules::{
    self,
    books::{BookGateway, InMemoryBookGateway, SeaOrmBookGateway},
};

/// Pick the book store named by `database.url`
pub async fn book_gateway(settings: &DatabaseSettings) -> anyhow::Result<Arc<dyn BookGateway>> {
    if settings.is_memory() {
        tracing::warn!("using the in-memory book store; data is lost on exit");
        return Ok(Arc::new(InMemoryBookGateway::new()));
    }

    let db = bookshelf_db::connect(settings).await?;
    Ok(Arc::new(SeaOrmBookGateway::new(db)))
}

/// Register and initialize every module against the given gateway
pub async fn build_registry(
    settings: &Settings,
    book_gateway: Arc<dyn BookGateway>,
) -> anyhow::Result<ModuleRegistry> {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, book_gateway)?;

    registry
        .init_all(&InitCtx { settings })
        .await
        .context("module initialization failed")?;

    Ok(registry)
}

/// Serve until a shutdown signal arrives, then stop modules
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let gateway = book_gateway(&settings.database).await?;
    let registry = build_registry(&settings, gateway).await?;

    tracing::info!("bookshelf-app bootstrap complete");
    bookshelf_http::start_server(&registry, &settings).await?;

    registry.stop_all().await
}

/// Create the storage schema without serving
pub async fn init_storage(settings: &DatabaseSettings) -> anyhow::Result<()> {
    let gateway = book_gateway(settings).await?;
    gateway
        .prepare()
        .await
        .context("failed to prepare book storage")?;
    tracing::info!("book storage ready");
    Ok(())
}
