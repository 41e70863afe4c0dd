use async_trait::async_trait;
use axum::Router;

/// What a module sees while it initializes
pub struct InitCtx<'a> {
    pub settings: &'a crate::settings::Settings,
}

/// A unit of application functionality with its own routes and lifecycle
#[async_trait]
pub trait Module: Sync + Send {
    /// Unique name; also the mount point under `/api/{name}`
    fn name(&self) -> &'static str;

    /// Prepare storage and other resources before the HTTP server binds
    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Routes relative to the module's mount point
    fn routes(&self) -> Router {
        Router::new()
    }

    /// OpenAPI fragment with module-relative paths; merged into the service document
    fn openapi(&self) -> Option<serde_json::Value> {
        None
    }

    /// Release resources during shutdown
    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
