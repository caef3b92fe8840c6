use std::path::PathBuf;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod app;

use app::gameplay::{demo_catalog, load_catalog_file, AdventureCatalog};

const CATALOG_ENV_VAR: &str = "ADVENTURE_CATALOG";

fn main() {
    init_tracing();
    info!("=== Adventure Sim Startup ===");

    let catalog = match load_startup_catalog() {
        Ok(catalog) => catalog,
        Err(error) => {
            error!(error = %error, "catalog_load_failed");
            std::process::exit(1);
        }
    };

    if let Err(error) = app::run_demo_session(catalog) {
        error!(error = %error, "demo_session_failed");
        std::process::exit(1);
    }
}

/// Catalog named by `ADVENTURE_CATALOG`, or the built-in demo world
/// when the variable is unset.
fn load_startup_catalog() -> Result<AdventureCatalog, String> {
    match std::env::var(CATALOG_ENV_VAR) {
        Ok(path) => {
            info!(path = %path, "loading_catalog_from_env");
            load_catalog_file(&PathBuf::from(path))
        }
        Err(_) => Ok(demo_catalog()),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
