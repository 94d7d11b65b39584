use bibliotek_core::config::{dir_from_env_value, max_upload_bytes_from_env_value};
use bibliotek_core::{CoreConfig, DEFAULT_DATA_DIR, DEFAULT_REST_ADDR, DEFAULT_UPLOADS_DIR};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the Bibliotek server.
///
/// Reads configuration from the environment (and `.env`, if present), opens the catalog,
/// uploads directory and user accounts, and serves the REST API.
///
/// # Environment Variables
/// - `BIBLIOTEK_REST_ADDR`: REST server address (default: "0.0.0.0:8080")
/// - `BIBLIOTEK_UPLOADS_DIR`: directory holding stored PDFs and covers (default: "uploads")
/// - `BIBLIOTEK_DATA_DIR`: directory holding the catalog and `users.json` (default: "bibliotek_data")
/// - `BIBLIOTEK_MAX_UPLOAD_BYTES`: largest accepted upload body (default: 50 MiB)
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - a configuration value is invalid,
/// - the storage directories cannot be opened, or
/// - the server address cannot be bound or the server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("bibliotek_run=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("bibliotek_core=info".parse()?)
                .add_directive("bibliotek_files=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr =
        std::env::var("BIBLIOTEK_REST_ADDR").unwrap_or_else(|_| DEFAULT_REST_ADDR.into());
    let uploads_dir = dir_from_env_value(
        std::env::var("BIBLIOTEK_UPLOADS_DIR").ok(),
        DEFAULT_UPLOADS_DIR,
    );
    let data_dir = dir_from_env_value(std::env::var("BIBLIOTEK_DATA_DIR").ok(), DEFAULT_DATA_DIR);
    let max_upload_bytes =
        max_upload_bytes_from_env_value(std::env::var("BIBLIOTEK_MAX_UPLOAD_BYTES").ok())?;

    let cfg = CoreConfig::new(uploads_dir, data_dir, max_upload_bytes)?;

    tracing::info!(
        "++ Starting Bibliotek REST on {} (uploads: {}, data: {})",
        rest_addr,
        cfg.uploads_dir().display(),
        cfg.data_dir().display()
    );

    api_rest::serve(&rest_addr, cfg).await
}
