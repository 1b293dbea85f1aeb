//! Veritox: the classification and confirmation decision engine behind a
//! drug-testing clinic's intake pipeline.
//!
//! The crate resolves noisy extracted donor identities against the client
//! registry, scores pending lab records for uploaded reports, classifies
//! detected substances against the medication snapshot frozen at
//! collection time, and drives the confirmation workflow to a final
//! compliance status. PDF extraction, email rendering, and the review UI
//! are external collaborators exchanging plain data with this library.

pub mod config;
pub mod confirmation;
pub mod db;
pub mod intake;
pub mod matching;
pub mod models;
pub mod notify;
pub mod screening;

use tracing_subscriber::EnvFilter;

/// Initialize tracing for binaries embedding the engine.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} v{}", config::APP_NAME, config::APP_VERSION);
}
