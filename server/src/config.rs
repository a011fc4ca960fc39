//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Server ohne Konfigurationsdatei
//! lauffaehig ist. Der Region-Katalog wird beim Laden validiert –
//! Duplikate oder ein fehlender Standard verhindern den Start.

use anyhow::Context;
use funkraum_presence::RegionCatalog;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
    /// Region-Katalog fuer die Server-Zuweisung
    pub regions: RegionCatalog,
}

impl ServerConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei
    ///
    /// Fehlt die Datei, gelten die Standardwerte. Ein vorhandener aber
    /// unlesbarer oder invalider Katalog ist ein harter Startfehler.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        let config = if Path::new(pfad).exists() {
            let inhalt = std::fs::read_to_string(pfad)
                .with_context(|| format!("Konfigurationsdatei nicht lesbar: {pfad}"))?;
            toml::from_str(&inhalt)
                .with_context(|| format!("Konfigurationsdatei nicht parsebar: {pfad}"))?
        } else {
            tracing::debug!(pfad = %pfad, "Keine Konfigurationsdatei – Standardwerte aktiv");
            Self::default()
        };

        config
            .regions
            .validieren()
            .context("Region-Katalog invalide")?;

        Ok(config)
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_konfiguration_ist_gueltig() {
        let config = ServerConfig::default();
        assert!(config.regions.validieren().is_ok());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn fehlende_datei_gibt_standardwerte() {
        let config = ServerConfig::laden("/nicht/vorhanden/funkraum.toml").unwrap();
        assert_eq!(config.logging.format, "text");
    }

    #[test]
    fn katalog_aus_toml() {
        let toml = r#"
            [logging]
            level = "debug"

            [regions]
            default = "amsterdam"

            [[regions.available]]
            id = "amsterdam"
            endpoint = "voice-ams.example:9987"
        "#;
        let config: ServerConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.regions.default, "amsterdam");
        assert!(config.regions.validieren().is_ok());
    }

    #[test]
    fn invalider_katalog_wird_abgewiesen() {
        let toml = r#"
            [regions]
            default = "mond"

            [[regions.available]]
            id = "amsterdam"
            endpoint = "voice-ams.example:9987"
        "#;
        let config: ServerConfig = toml::from_str(toml).unwrap();
        assert!(config.regions.validieren().is_err());
    }
}
