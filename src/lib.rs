pub mod clipboard;
pub mod controller;
pub mod decoder;
pub mod error;
pub mod host;
pub mod logging;
pub mod notification;
pub mod settings;
pub mod surface;

pub use error::{AppError, AppResult};

use settings::{SettingsContext, SettingsStore};

/// Entrypoint used by higher-level integrations and CLI bindings.
pub fn run() -> AppResult<()> {
    let store = SettingsStore::with_default_path();
    let settings = store.as_ref().map(|s| s.load_or_default()).unwrap_or_default();
    logging::init(settings.enable_debug);
    if let Err(err) = &store {
        tracing::warn!(?err, "settings path unavailable; using defaults");
    }

    tracing::info!("starting stringlens");
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    host::run_session(stdin.lock(), stdout.lock(), SettingsContext::new(settings))?;
    Ok(())
}
