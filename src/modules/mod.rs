pub mod books;

use bookshelf_db::Database;
use bookshelf_kernel::{settings::Settings, ModuleRegistry};

/// Register all project-specific modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, db: &Database, settings: &Settings) {
    registry.register(books::create_module(db, settings.books.clone()));
}
