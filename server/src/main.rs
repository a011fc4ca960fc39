//! Funkraum Server – Einstiegspunkt
//!
//! Laedt die Konfiguration, initialisiert das Logging und verdrahtet den
//! Voice-Praesenz-Abgleich.

use anyhow::Result;
use funkraum_server::{config::ServerConfig, App};

#[tokio::main]
async fn main() -> Result<()> {
    // Konfigurationsdatei-Pfad aus Umgebungsvariable oder Standard
    let config_pfad =
        std::env::var("FUNKRAUM_CONFIG").unwrap_or_else(|_| "config.toml".into());

    // Konfiguration laden (Standardwerte falls Datei fehlt)
    let config = ServerConfig::laden(&config_pfad)?;

    // Logging initialisieren
    logging_initialisieren(&config.logging.level, &config.logging.format);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_pfad,
        standard_region = %config.regions.default,
        regionen = config.regions.available.len(),
        "Funkraum Server wird initialisiert"
    );

    let _app = App::aus_config(&config)?;

    tracing::info!("Voice-Praesenz-Abgleich bereit");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown-Signal empfangen, Server wird beendet");

    Ok(())
}

/// Initialisiert tracing-subscriber mit dem konfigurierten Level und Format
fn logging_initialisieren(level: &str, format: &str) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt().with_env_filter(filter).with_target(true).init();
        }
    }
}
