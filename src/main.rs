use anyhow::Context;
use bookshelf_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("failed to load Bookshelf settings")?;
    bookshelf_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        db = %bookshelf_db::redact(&settings.database.url),
        "bookshelf-app bootstrap starting"
    );

    bookshelf_app::app::run(settings).await
}
