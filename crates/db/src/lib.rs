//! Database connection factory.

use std::time::Duration;

use anyhow::Context;
use bookshelf_kernel::settings::DatabaseSettings;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Open a pooled connection for `settings.url`.
///
/// In-memory SQLite databases are private to a single connection, so the pool is
/// pinned to one connection for them.
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<DatabaseConnection> {
    if settings.is_memory() {
        anyhow::bail!("database url 'memory' selects the in-process store; nothing to connect");
    }

    let max_connections = if is_sqlite_memory(&settings.url) {
        1
    } else {
        settings.max_connections.max(1)
    };

    let mut options = ConnectOptions::new(settings.url.clone());
    options
        .max_connections(max_connections)
        .connect_timeout(CONNECT_TIMEOUT)
        .sqlx_logging(false);

    tracing::info!(
        target: "bookshelf-db",
        url = %redact(&settings.url),
        max_connections,
        "connecting to database"
    );

    let db = Database::connect(options)
        .await
        .with_context(|| format!("failed to connect to {}", redact(&settings.url)))?;

    tracing::info!(
        target: "bookshelf-db",
        backend = ?db.get_database_backend(),
        "database connection established"
    );

    Ok(db)
}

fn is_sqlite_memory(url: &str) -> bool {
    url.starts_with("sqlite:") && url.contains(":memory:")
}

/// Strip credentials from a connection URL before it reaches the logs.
pub fn redact(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***{}", &url[..scheme_end], &url[at..])
        }
        _ => url.to_string(),
    }
}
