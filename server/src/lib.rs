//! funkraum-server – Zusammenbau des Voice-Praesenz-Dienstes
//!
//! Verdrahtet den Abgleich mit den In-Memory-Backends und dem
//! Broadcast-Fanout. Die Transportschicht (Gateway-Verbindungen, Schema-
//! Validierung) liegt ausserhalb dieses Repos und reicht Absichten ueber
//! [`App::reconciler`] herein.

pub mod config;

use std::sync::Arc;

use config::ServerConfig;
use funkraum_presence::{
    BroadcastFanout, MemoryGuildLookup, MemoryMemberDirectory, MemoryVoiceStateStore,
    RegionResolver, VoiceReconciler,
};

/// Verdrahtete Anwendung
///
/// Verzeichnis und Guild-Lookup sind nach aussen sichtbar, damit die
/// einbettende Schicht sie befuellen kann.
pub struct App {
    pub reconciler: Arc<VoiceReconciler>,
    pub fanout: BroadcastFanout,
    pub mitglieder: MemoryMemberDirectory,
    pub guilds: MemoryGuildLookup,
}

impl App {
    /// Baut die Anwendung aus der Konfiguration
    ///
    /// Der Region-Katalog wird hier erneut validiert – der Resolver
    /// startet nicht mit einem invaliden Katalog.
    pub fn aus_config(config: &ServerConfig) -> anyhow::Result<Self> {
        let store = MemoryVoiceStateStore::neu();
        let mitglieder = MemoryMemberDirectory::neu();
        let guilds = MemoryGuildLookup::neu();
        let fanout = BroadcastFanout::neu();

        let regionen =
            RegionResolver::neu(config.regions.clone(), Arc::new(guilds.clone()))?;

        let reconciler = Arc::new(VoiceReconciler::neu(
            Arc::new(store),
            Arc::new(mitglieder.clone()),
            regionen,
            Arc::new(fanout.clone()),
        ));

        Ok(Self {
            reconciler,
            fanout,
            mitglieder,
            guilds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use funkraum_core::types::{ChannelId, SessionId, UserId};
    use funkraum_presence::{AbgleichErgebnis, VoiceStateIntent};

    #[tokio::test]
    async fn app_aus_standard_konfiguration_verarbeitet_absichten() {
        let app = App::aus_config(&ServerConfig::default()).unwrap();
        let mut rx = app.fanout.abonnieren();

        let ergebnis = app
            .reconciler
            .abgleichen(
                SessionId::new(),
                UserId::new(),
                VoiceStateIntent::beitritt(None, ChannelId::new()),
            )
            .await
            .unwrap();

        assert!(matches!(ergebnis, AbgleichErgebnis::Angewendet { .. }));
        assert!(rx.try_recv().is_ok(), "Haupt-Event muss ankommen");
    }

    #[test]
    fn invalider_katalog_verhindert_den_zusammenbau() {
        let mut config = ServerConfig::default();
        config.regions.default = "mond".into();
        assert!(App::aus_config(&config).is_err());
    }
}
