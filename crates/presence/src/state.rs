//! Voice-Praesenz-Datensatz und Client-Absicht
//!
//! `VoiceState` ist die eine Quelle der Wahrheit fuer "wo ist dieser
//! Benutzer gerade verbunden". Pro Benutzer existiert hoechstens ein
//! Datensatz; ein Disconnect ist eine Mutation (beide IDs `None`),
//! keine Loeschung.

use funkraum_core::types::{ChannelId, GuildId, SessionId, UserId};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// VoiceState
// ---------------------------------------------------------------------------

/// Persistierter Voice-Praesenz-Datensatz eines Benutzers
///
/// `session_id` gehoert der zuletzt erfolgreich durchgesetzten Session.
/// `token` wird bei jedem Session-Wechsel neu erzeugt und darf bei
/// getrenntem Zustand (`channel_id == None`) veraltet stehen bleiben –
/// es wird dann nicht dereferenziert.
///
/// Das Mitglied fuer das Haupt-Event ist bewusst KEIN Feld dieses
/// Datensatzes: es ist transient und wird erst beim Event-Bau angehaengt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceState {
    /// Besitzender Benutzer (unveraenderlich nach Erstellung)
    pub user_id: UserId,
    /// Session die aktuell die Praesenz-Hoheit hat
    pub session_id: SessionId,
    /// Guild der Verbindung (`None` bei Direktanruf oder getrennt)
    pub guild_id: Option<GuildId>,
    /// Kanal innerhalb der Guild, oder Direktanruf-Kanal bei `guild_id == None`
    pub channel_id: Option<ChannelId>,
    /// Opakes Zugangs-Token fuer den Voice-Server
    pub token: Option<String>,
    /// Server-seitig stummgeschaltet (Moderation)
    pub deaf: bool,
    /// Server-seitig Mikrofon deaktiviert (Moderation)
    pub mute: bool,
    /// Server-seitig unterdrueckt (Moderation)
    pub suppress: bool,
    /// Client hat Ausgabe deaktiviert
    pub self_deaf: bool,
    /// Client hat Mikrofon deaktiviert
    pub self_mute: bool,
    /// Client unterdrueckt sich selbst
    pub self_suppress: bool,
}

impl VoiceState {
    /// Erstellt einen frischen Datensatz aus der ersten Absicht
    ///
    /// Die Moderations-Flags starten mit `false`; nur die Absichts-Felder
    /// werden uebernommen.
    pub fn neu(user_id: UserId, session_id: SessionId, absicht: &VoiceStateIntent) -> Self {
        let mut state = Self {
            user_id,
            session_id,
            guild_id: None,
            channel_id: None,
            token: None,
            deaf: false,
            mute: false,
            suppress: false,
            self_deaf: false,
            self_mute: false,
            self_suppress: false,
        };
        state.absicht_anwenden(absicht);
        state
    }

    /// Uebernimmt die Felder einer Absicht in den Datensatz
    ///
    /// Moderations-Flags (`deaf`/`mute`/`suppress`) bleiben unberuehrt –
    /// Clients duerfen nur ihre self_*-Flags setzen.
    pub fn absicht_anwenden(&mut self, absicht: &VoiceStateIntent) {
        self.guild_id = absicht.guild_id;
        self.channel_id = absicht.channel_id;
        self.self_deaf = absicht.self_deaf;
        self.self_mute = absicht.self_mute;
        if let Some(suppress) = absicht.self_suppress {
            self.self_suppress = suppress;
        }
    }

    /// Gibt `true` zurueck wenn der Benutzer aktuell verbunden ist
    pub fn ist_verbunden(&self) -> bool {
        self.channel_id.is_some()
    }

    /// Oeffentliche Projektion des Datensatzes (ohne Token)
    ///
    /// Nur diese Felder duerfen an Subscriber gehen; das Token ist ein
    /// Bearer-Credential und bleibt beim Besitzer.
    pub fn public_projektion(&self) -> PublicVoiceState {
        PublicVoiceState {
            user_id: self.user_id,
            session_id: self.session_id,
            guild_id: self.guild_id,
            channel_id: self.channel_id,
            deaf: self.deaf,
            mute: self.mute,
            suppress: self.suppress,
            self_deaf: self.self_deaf,
            self_mute: self.self_mute,
            self_suppress: self.self_suppress,
        }
    }
}

// ---------------------------------------------------------------------------
// VoiceStateIntent
// ---------------------------------------------------------------------------

/// Vom Client gemeldete gewuenschte Voice-Praesenz
///
/// Kommt bereits schema-validiert aus der Verbindungsschicht; dieser
/// Crate prueft die Struktur nicht erneut. `guild_id` und `channel_id`
/// beide `None` bedeutet "trennen".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VoiceStateIntent {
    pub guild_id: Option<GuildId>,
    pub channel_id: Option<ChannelId>,
    pub self_deaf: bool,
    pub self_mute: bool,
    /// Optional – fehlt im Payload aelterer Clients
    pub self_suppress: Option<bool>,
}

impl VoiceStateIntent {
    /// Absicht "Kanal beitreten"
    pub fn beitritt(guild_id: Option<GuildId>, channel_id: ChannelId) -> Self {
        Self {
            guild_id,
            channel_id: Some(channel_id),
            ..Self::default()
        }
    }

    /// Absicht "Verbindung trennen" (beide IDs `None`)
    pub fn trennen() -> Self {
        Self::default()
    }
}

// ---------------------------------------------------------------------------
// PublicVoiceState
// ---------------------------------------------------------------------------

/// Broadcast-sichere Teilmenge eines `VoiceState` (Token ausgeschlossen)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicVoiceState {
    pub user_id: UserId,
    pub session_id: SessionId,
    pub guild_id: Option<GuildId>,
    pub channel_id: Option<ChannelId>,
    pub deaf: bool,
    pub mute: bool,
    pub suppress: bool,
    pub self_deaf: bool,
    pub self_mute: bool,
    pub self_suppress: bool,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
