use anyhow::{bail, Context};
use inkwell_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load Inkwell settings")?;
    inkwell_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        port = settings.server.port,
        storage = ?settings.storage.backend,
        "inkwell-app bootstrap starting"
    );

    if settings.server.serverless {
        bail!("serverless platform detected; the host owns the listener and should mount inkwell_app::build_app");
    }

    inkwell_app::run(&settings).await?;

    tracing::info!("inkwell-app shut down cleanly");
    Ok(())
}
