//! Event-Fanout – Zustellung typisierter Events an Subscriber
//!
//! Der Abgleich veroeffentlicht fire-and-forget; der Fanout garantiert
//! at-least-once-Zustellung an aktuelle Subscriber des jeweiligen Scopes.
//! Die Broadcast-Implementierung dient dem Single-Instance-Betrieb; bei
//! Multi-Instance-Betrieb kann der Trait durch NATS o.ae. erfuellt werden.

use async_trait::async_trait;
use funkraum_core::error::Result;
use funkraum_core::types::{ChannelId, GuildId, UserId};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::member::PublicMember;
use crate::state::PublicVoiceState;

// ---------------------------------------------------------------------------
// Scope und Events
// ---------------------------------------------------------------------------

/// Zustell-Scope eines Events
///
/// Gesetzte Felder schraenken die Empfaengermenge ein: Subscriber der
/// Guild, des Kanals oder der Benutzer selbst.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventScope {
    pub guild_id: Option<GuildId>,
    pub channel_id: Option<ChannelId>,
    pub user_id: Option<UserId>,
}

impl EventScope {
    /// Scope nur fuer eine Guild
    pub fn fuer_guild(guild_id: GuildId) -> Self {
        Self {
            guild_id: Some(guild_id),
            ..Self::default()
        }
    }

    /// Scope nur fuer einen Benutzer
    pub fn fuer_benutzer(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }
}

/// Vom Abgleich veroeffentlichte Gateway-Events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GatewayEvent {
    /// Voice-Praesenz eines Benutzers hat sich geaendert
    ///
    /// `member` ist nur beim Haupt-Event gesetzt; synthetische
    /// Leave-Events tragen kein Mitglied.
    VoiceStateUpdate {
        state: PublicVoiceState,
        member: Option<PublicMember>,
    },
    /// Server-Zuweisung: Credential und Endpoint fuer den Voice-Server
    ///
    /// `channel_id` ist nur bei Direktanrufen gesetzt (`guild_id == None`).
    VoiceServerUpdate {
        token: String,
        guild_id: Option<GuildId>,
        endpoint: String,
        channel_id: Option<ChannelId>,
    },
}

// ---------------------------------------------------------------------------
// Contract
// ---------------------------------------------------------------------------

/// Fanout-Contract
#[async_trait]
pub trait EventFanout: Send + Sync {
    /// Stellt ein Event an alle aktuellen Subscriber des Scopes zu
    async fn veroeffentlichen(&self, event: GatewayEvent, scope: EventScope) -> Result<()>;
}

// ---------------------------------------------------------------------------
// BroadcastFanout
// ---------------------------------------------------------------------------

/// Groesse des Broadcast-Kanals fuer Gateway-Events
const EVENT_KANAL_GROESSE: usize = 256;

/// Fanout ueber einen tokio-Broadcast-Kanal
///
/// Die Scope-Filterung uebernimmt die Empfaengerseite; dieser Fanout
/// stellt jedem Abonnenten das (Event, Scope)-Paar zu.
#[derive(Clone)]
pub struct BroadcastFanout {
    tx: broadcast::Sender<(GatewayEvent, EventScope)>,
}

impl BroadcastFanout {
    /// Erstellt einen neuen Broadcast-Fanout
    pub fn neu() -> Self {
        let (tx, _) = broadcast::channel(EVENT_KANAL_GROESSE);
        Self { tx }
    }

    /// Abonniert alle zukuenftigen Events
    pub fn abonnieren(&self) -> broadcast::Receiver<(GatewayEvent, EventScope)> {
        self.tx.subscribe()
    }

    /// Anzahl der aktuellen Abonnenten
    pub fn abonnenten(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for BroadcastFanout {
    fn default() -> Self {
        Self::neu()
    }
}

#[async_trait]
impl EventFanout for BroadcastFanout {
    async fn veroeffentlichen(&self, event: GatewayEvent, scope: EventScope) -> Result<()> {
        // Ohne Abonnenten schlaegt send fehl – das ist kein Fehler,
        // es gibt schlicht niemanden der das Event sehen will.
        if let Err(e) = self.tx.send((event, scope)) {
            tracing::debug!(fehler = %e, "Gateway-Event ohne Abonnenten verworfen");
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{VoiceState, VoiceStateIntent};
    use funkraum_core::types::SessionId;

    fn test_event() -> GatewayEvent {
        let state = VoiceState::neu(
            UserId::new(),
            SessionId::new(),
            &VoiceStateIntent::default(),
        );
        GatewayEvent::VoiceStateUpdate {
            state: state.public_projektion(),
            member: None,
        }
    }

    #[tokio::test]
    async fn event_erreicht_abonnenten() {
        let fanout = BroadcastFanout::neu();
        let mut rx = fanout.abonnieren();

        let scope = EventScope::fuer_guild(GuildId::new());
        fanout
            .veroeffentlichen(test_event(), scope.clone())
            .await
            .unwrap();

        let (event, empfangener_scope) = rx.try_recv().unwrap();
        assert!(matches!(event, GatewayEvent::VoiceStateUpdate { .. }));
        assert_eq!(empfangener_scope, scope);
    }

    #[tokio::test]
    async fn veroeffentlichen_ohne_abonnenten_ist_kein_fehler() {
        let fanout = BroadcastFanout::neu();
        assert_eq!(fanout.abonnenten(), 0);

        let ergebnis = fanout
            .veroeffentlichen(test_event(), EventScope::default())
            .await;
        assert!(ergebnis.is_ok());
    }

    #[test]
    fn events_sind_serde_kompatibel() {
        let event = test_event();
        let json = serde_json::to_string(&event).unwrap();
        let _: GatewayEvent = serde_json::from_str(&json).unwrap();
    }
}
