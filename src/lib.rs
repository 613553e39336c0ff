//! Bookshelf application library
//!
//! Wires the books module onto the kernel, storage and HTTP crates.

pub mod modules;
pub mod utils;

use anyhow::Context;
use axum::Router;
use bookshelf_db::Database;
use bookshelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};

/// A bootstrapped application: open database plus initialized modules
pub struct App {
    pub registry: ModuleRegistry,
    pub db: Database,
}

impl App {
    /// Connect the database, register modules, apply their migrations and
    /// run their init hooks.
    pub async fn bootstrap(settings: &Settings) -> anyhow::Result<Self> {
        let db = Database::connect(&settings.database.connect_options())
            .await
            .with_context(|| "failed to open database")?;

        let mut registry = ModuleRegistry::new();
        modules::register_all(&mut registry, &db, settings);

        registry.apply_migrations(&db).await?;

        let app = Self { registry, db };
        app.registry.init_modules(&app.ctx(settings)).await?;
        Ok(app)
    }

    pub fn ctx<'a>(&'a self, settings: &'a Settings) -> InitCtx<'a> {
        InitCtx {
            settings,
            db: &self.db,
        }
    }

    /// Full HTTP router for this application
    pub fn router(&self, settings: &Settings) -> Router {
        bookshelf_http::build_router(&self.registry, settings)
    }
}
