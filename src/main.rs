use anyhow::Context;
use bookshelf_app::{utils, App};
use bookshelf_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load bookshelf settings")?;

    bookshelf_telemetry::init(&settings.telemetry);

    tracing::info!(
        env = ?settings.environment,
        "bookshelf bootstrap starting"
    );

    let app = App::bootstrap(&settings).await?;
    app.registry.start_modules(&app.ctx(&settings)).await?;

    tracing::info!(db = %app.db.location(), "bookshelf bootstrap complete");

    let served =
        bookshelf_http::start_server(&app.registry, &settings, utils::shutdown_signal()).await;

    app.registry.stop_modules().await?;
    served
}
