pub mod books;

use std::sync::Arc;

use bookshelf_kernel::ModuleRegistry;

use books::BookGateway;

/// Register all application modules with the registry
pub fn register_all(
    registry: &mut ModuleRegistry,
    book_gateway: Arc<dyn BookGateway>,
) -> anyhow::Result<()> {
    registry.register(books::create_module(book_gateway))
}
