//! Fehlertypen fuer Funkraum
//!
//! Zentraler Fehler-Enum der alle moeglichen Fehlerzustaende abdeckt.
//! Untermodule koennen eigene Fehler definieren und via `#[from]` konvertieren.

use thiserror::Error;

/// Globaler Result-Alias fuer Funkraum
pub type Result<T> = std::result::Result<T, FunkraumError>;

/// Alle moeglichen Fehler im Funkraum-System
#[derive(Debug, Error)]
pub enum FunkraumError {
    // --- Ressourcen ---
    #[error("Guild nicht gefunden: {0}")]
    GuildNichtGefunden(String),

    #[error("Mitglied nicht gefunden: user={user}, guild={guild}")]
    MitgliedNichtGefunden { user: String, guild: String },

    #[error("Benutzer nicht gefunden: {0}")]
    BenutzerNichtGefunden(String),

    // --- Persistenz ---
    #[error("Speicherfehler: {0}")]
    Speicher(String),

    // --- Event-Zustellung ---
    #[error("Event-Zustellung fehlgeschlagen: {0}")]
    Fanout(String),

    // --- Konfiguration ---
    #[error("Konfigurationsfehler: {0}")]
    Konfiguration(String),

    // --- Intern ---
    #[error("Interner Fehler: {0}")]
    Intern(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl FunkraumError {
    /// Erstellt einen internen Fehler aus einer beliebigen Nachricht
    pub fn intern(msg: impl Into<String>) -> Self {
        Self::Intern(msg.into())
    }

    /// Erstellt einen Konfigurationsfehler
    pub fn konfiguration(msg: impl Into<String>) -> Self {
        Self::Konfiguration(msg.into())
    }

    /// Gibt true zurueck wenn der Fehler wiederholbar sein koennte
    pub fn ist_wiederholbar(&self) -> bool {
        matches!(self, Self::Speicher(_) | Self::Fanout(_))
    }
}
