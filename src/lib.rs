//! Inkwell bookstore application library
//!
//! Wires the record store, upload handler and HTTP modules together. The
//! binary in `main.rs` only loads settings, installs telemetry and calls
//! [`run`].

pub mod modules;
pub mod store;
pub mod upload;
pub mod validation;

use inkwell_kernel::{settings::Settings, InitCtx, ModuleRegistry};

use crate::upload::UploadStore;

/// Construct the store and upload handler from settings and register every
/// module against them.
pub fn build_registry(settings: &Settings) -> ModuleRegistry {
    let store = store::open(&settings.storage);
    let uploads = UploadStore::new(settings.uploads.dir.clone(), settings.uploads.max_bytes);

    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, store, uploads);
    registry
}

/// Build the application router with modules initialized, for hosts that
/// own their own listener.
pub async fn build_app(settings: &Settings) -> anyhow::Result<axum::Router> {
    let registry = build_registry(settings);
    let ctx = InitCtx { settings };
    registry.init_modules(&ctx).await?;
    registry.start_modules(&ctx).await?;
    Ok(inkwell_http::build_app(&registry, settings))
}

/// Run the full lifecycle: init, start, serve until shutdown, stop.
pub async fn run(settings: &Settings) -> anyhow::Result<()> {
    let registry = build_registry(settings);
    let ctx = InitCtx { settings };

    registry.init_modules(&ctx).await?;
    registry.start_modules(&ctx).await?;

    let served = inkwell_http::start_server(&registry, settings).await;

    registry.stop_modules().await?;
    served
}
