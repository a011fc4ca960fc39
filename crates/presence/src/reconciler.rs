//! Voice-Abgleich – Absicht gegen Praesenz-Datensatz
//!
//! Kern des Crates: nimmt genau eine Absicht entgegen, laedt den
//! Praesenz-Datensatz des Benutzers, berechnet den Uebergang und treibt
//! die geordnete Event-Emission plus Server-Zuweisung.
//!
//! Die Uebergangs-Entscheidung ist eine pure Funktion ohne I/O
//! ([`uebergang_berechnen`]); der [`VoiceReconciler`] haengt die I/O an
//! den Raendern an: laden -> Leave-Events -> Mitglied -> speichern ->
//! Haupt-Event -> Zuweisung.
//!
//! Bekanntes Teil-Fehlerfenster: das Cross-Guild-Leave-Event ist bereits
//! veroeffentlicht wenn die Mitglieds-Aufloesung den Abgleich abbricht.
//! Die Aufloesung bleibt dafuer strikt VOR der Persistenz, damit nie ein
//! Datensatz gespeichert wird dessen Haupt-Event nicht gebaut werden kann.

use dashmap::DashMap;
use funkraum_core::error::{FunkraumError, Result};
use funkraum_core::types::{SessionId, UserId};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

use crate::fanout::{EventFanout, EventScope, GatewayEvent};
use crate::member::MemberDirectory;
use crate::region::RegionResolver;
use crate::state::{VoiceState, VoiceStateIntent};
use crate::store::VoiceStateStore;
use crate::token::voice_token_generieren;

// ---------------------------------------------------------------------------
// Pure Uebergangs-Entscheidung
// ---------------------------------------------------------------------------

/// Ergebnis der puren Uebergangs-Entscheidung
#[derive(Debug)]
pub enum Uebergang {
    /// Fremde Session wollte die Praesenz loeschen – stillschweigend
    /// ignoriert, keine Mutation, keine Events
    Ignoriert,
    /// Absicht wird angewendet
    Anwenden(UebergangsPlan),
}

/// Plan fuer einen anzuwendenden Uebergang
#[derive(Debug)]
pub struct UebergangsPlan {
    /// Datensatz nach Anwendung der Absicht (Session bereits gesetzt,
    /// Token noch nicht rotiert)
    pub neuer_state: VoiceState,
    /// Datensatz muss angelegt statt gespeichert werden
    pub anlegen: bool,
    /// Erste Praesenz-Behauptung ueberhaupt (nie zuvor Guild/Kanal gesetzt)
    pub erstmalig: bool,
    /// Kanal weicht vom gespeicherten Kanal ab
    pub kanal_gewechselt: bool,
    /// Vorherige Session weicht ab – Token muss neu erzeugt werden
    pub token_rotieren: bool,
    /// Synthetische Leave-Events, strikt VOR dem Haupt-Event zu senden
    pub leave_events: Vec<(GatewayEvent, EventScope)>,
}

/// Berechnet den Uebergang fuer eine Absicht (keine I/O)
///
/// Besitz-Asymmetrie, bewusst so belassen: eine besitzende Session darf
/// immer aktualisieren; eine fremde Session darf die Praesenz nur durch
/// einen Beitritt uebernehmen (last-writer-wins), nie durch Loeschen
/// blanken. Geprueft wird dafuer nur `channel_id` der Absicht.
pub fn uebergang_berechnen(
    bisheriger: Option<&VoiceState>,
    session_id: SessionId,
    user_id: UserId,
    absicht: &VoiceStateIntent,
) -> Uebergang {
    let alt = match bisheriger {
        Some(alt) => alt,
        None => {
            // Kein Datensatz ist kein Fehler: erste Behauptung legt an.
            // Frische Datensaetze rotieren das Token immer.
            let neuer = VoiceState::neu(user_id, session_id, absicht);
            return Uebergang::Anwenden(UebergangsPlan {
                neuer_state: neuer,
                anlegen: true,
                erstmalig: true,
                kanal_gewechselt: false,
                token_rotieren: true,
                leave_events: Vec::new(),
            });
        }
    };

    // Besitz-Wache: fremde Session darf fremde Praesenz nicht loeschen
    if alt.session_id != session_id && absicht.channel_id.is_none() {
        return Uebergang::Ignoriert;
    }

    let erstmalig = alt.guild_id.is_none() && alt.channel_id.is_none();
    let kanal_gewechselt = alt.channel_id != absicht.channel_id;

    let mut leave_events = Vec::new();

    // Guild-Wechsel: die alte Guild bekommt sonst nie ein Event – ihr wird
    // ein Leave (alter Zustand, Kanal genullt) vorangestellt
    if let Some(alte_guild) = alt.guild_id {
        if absicht.guild_id != Some(alte_guild) && alt.session_id == session_id {
            let mut projektion = alt.public_projektion();
            projektion.channel_id = None;
            leave_events.push((
                GatewayEvent::VoiceStateUpdate {
                    state: projektion,
                    member: None,
                },
                EventScope::fuer_guild(alte_guild),
            ));
        }
    }

    let mut neuer = alt.clone();
    neuer.absicht_anwenden(absicht);

    // Voll-Disconnect: beide IDs genullt – der alte Kanal/die alte Guild
    // (auch der guild-lose Direktanruf) erfaehrt vom Verlassen
    if alt.session_id == session_id
        && absicht.guild_id.is_none()
        && absicht.channel_id.is_none()
        && (alt.guild_id.is_some() || alt.channel_id.is_some())
    {
        let mut projektion = alt.public_projektion();
        projektion.guild_id = None;
        projektion.channel_id = None;
        leave_events.push((
            GatewayEvent::VoiceStateUpdate {
                state: projektion,
                member: None,
            },
            EventScope {
                guild_id: alt.guild_id,
                channel_id: alt.channel_id,
                user_id: None,
            },
        ));
    }

    let token_rotieren = alt.session_id != session_id;
    neuer.session_id = session_id;

    Uebergang::Anwenden(UebergangsPlan {
        neuer_state: neuer,
        anlegen: false,
        erstmalig,
        kanal_gewechselt,
        token_rotieren,
        leave_events,
    })
}

// ---------------------------------------------------------------------------
// VoiceReconciler
// ---------------------------------------------------------------------------

/// Ergebnis eines Abgleichs
#[derive(Debug)]
pub enum AbgleichErgebnis {
    /// Von der Besitz-Wache verworfen – nichts mutiert, nichts gesendet
    Ignoriert,
    /// Absicht angewendet
    Angewendet {
        /// Der persistierte Datensatz nach dem Abgleich
        state: VoiceState,
        /// Alle veroeffentlichten Events in Sende-Reihenfolge
        events: Vec<(GatewayEvent, EventScope)>,
    },
}

/// Gleicht Client-Absichten gegen den Praesenz-Datensatz ab
///
/// Pro Benutzer ist hoechstens ein Abgleich gleichzeitig unterwegs
/// (Sperren-Map), sonst waere das Read-Modify-Write zwischen zwei
/// Sessions desselben Benutzers ein Lost-Update-Rennen. Verschiedene
/// Benutzer laufen unserialisiert nebeneinander.
pub struct VoiceReconciler {
    store: Arc<dyn VoiceStateStore>,
    mitglieder: Arc<dyn MemberDirectory>,
    regionen: RegionResolver,
    fanout: Arc<dyn EventFanout>,
    /// Pro-Benutzer-Sperren; Eintraege leben so lange wie der Prozess
    sperren: DashMap<UserId, Arc<Mutex<()>>>,
}

impl VoiceReconciler {
    /// Erstellt einen neuen Reconciler
    pub fn neu(
        store: Arc<dyn VoiceStateStore>,
        mitglieder: Arc<dyn MemberDirectory>,
        regionen: RegionResolver,
        fanout: Arc<dyn EventFanout>,
    ) -> Self {
        Self {
            store,
            mitglieder,
            regionen,
            fanout,
            sperren: DashMap::new(),
        }
    }

    /// Gleicht eine Absicht ab
    ///
    /// Laeuft einmal angenommen bis zum Ende oder schlaegt fehl; eine
    /// Abbruch-Semantik gibt es nicht. Fehler der Mitglieds-Aufloesung
    /// und der Persistenz brechen ab; Zustell-Fehler NACH der Persistenz
    /// werden nur geloggt – der Store bleibt die Quelle der Wahrheit.
    pub async fn abgleichen(
        &self,
        session_id: SessionId,
        user_id: UserId,
        absicht: VoiceStateIntent,
    ) -> Result<AbgleichErgebnis> {
        let start = Instant::now();

        let sperre = self.benutzer_sperre(user_id);
        let _wache = sperre.lock().await;

        let bisheriger = self.store.laden(user_id).await?;

        let plan = match uebergang_berechnen(bisheriger.as_ref(), session_id, user_id, &absicht) {
            Uebergang::Ignoriert => {
                tracing::debug!(
                    user_id = %user_id,
                    session_id = %session_id,
                    "Fremde Session wollte Praesenz loeschen – ignoriert"
                );
                return Ok(AbgleichErgebnis::Ignoriert);
            }
            Uebergang::Anwenden(plan) => plan,
        };

        let UebergangsPlan {
            mut neuer_state,
            anlegen,
            erstmalig,
            kanal_gewechselt,
            token_rotieren,
            leave_events,
        } = plan;

        let mut gesendet = Vec::new();

        // Leave-Events strikt VOR Haupt-Update und Zuweisung: Subscriber
        // duerfen nie einen Join vor dem zugehoerigen Leave sehen
        for (event, scope) in leave_events {
            self.fanout
                .veroeffentlichen(event.clone(), scope.clone())
                .await?;
            gesendet.push((event, scope));
        }

        // Mitglied aufloesen BEVOR gespeichert wird: wer eine Guild
        // behauptet muss dort Mitglied sein, und es darf kein Datensatz
        // entstehen dessen Haupt-Event nicht gebaut werden kann
        let mitglied = match neuer_state.guild_id {
            Some(guild_id) => Some(self.mitglieder.aufloesen(user_id, guild_id).await?),
            None => None,
        };

        if token_rotieren {
            neuer_state.token = Some(voice_token_generieren());
        }

        if anlegen {
            self.store.erstellen(neuer_state.clone()).await?;
        } else {
            self.store.speichern(neuer_state.clone()).await?;
        }

        // Haupt-Event: aktueller oeffentlicher Zustand plus Mitglied
        let haupt_event = GatewayEvent::VoiceStateUpdate {
            state: neuer_state.public_projektion(),
            member: mitglied.as_ref().map(|m| m.public_projektion()),
        };
        let haupt_scope = EventScope {
            guild_id: neuer_state.guild_id,
            channel_id: neuer_state.channel_id,
            user_id: Some(user_id),
        };
        self.nach_persistenz_veroeffentlichen(&mut gesendet, haupt_event, haupt_scope)
            .await;

        // Server-Zuweisung nur bei neuem oder gewechseltem Kanal – beim
        // Verlassen gibt es nichts zuzuweisen
        if (erstmalig || kanal_gewechselt) && neuer_state.channel_id.is_some() {
            let region = self.regionen.aufloesen(neuer_state.guild_id).await?;
            let token = neuer_state.token.clone().ok_or_else(|| {
                FunkraumError::intern("Token fehlt trotz aktiver Kanalverbindung")
            })?;
            let zuweisung = GatewayEvent::VoiceServerUpdate {
                token,
                guild_id: neuer_state.guild_id,
                endpoint: region.endpoint,
                // Nur Direktanrufe tragen den Kanal: ohne Guild kann der
                // Empfaenger ihn sonst nicht zuordnen
                channel_id: if neuer_state.guild_id.is_none() {
                    neuer_state.channel_id
                } else {
                    None
                },
            };
            self.nach_persistenz_veroeffentlichen(
                &mut gesendet,
                zuweisung,
                EventScope::fuer_benutzer(user_id),
            )
            .await;
        }

        tracing::info!(
            user_id = %user_id,
            session_id = %session_id,
            guild_id = ?neuer_state.guild_id,
            channel_id = ?neuer_state.channel_id,
            events = gesendet.len(),
            dauer_ms = start.elapsed().as_millis() as u64,
            "Voice-State abgeglichen"
        );

        Ok(AbgleichErgebnis::Angewendet {
            state: neuer_state,
            events: gesendet,
        })
    }

    /// Holt (oder legt an) die Abgleich-Sperre eines Benutzers
    fn benutzer_sperre(&self, user_id: UserId) -> Arc<Mutex<()>> {
        self.sperren
            .entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Veroeffentlicht nach erfolgreicher Persistenz
    ///
    /// Zustell-Fehler revidieren den gespeicherten Datensatz nicht mehr;
    /// der naechste Abgleich spiegelt ihn ohnehin korrekt wider.
    async fn nach_persistenz_veroeffentlichen(
        &self,
        gesendet: &mut Vec<(GatewayEvent, EventScope)>,
        event: GatewayEvent,
        scope: EventScope,
    ) {
        match self
            .fanout
            .veroeffentlichen(event.clone(), scope.clone())
            .await
        {
            Ok(()) => gesendet.push((event, scope)),
            Err(e) => {
                tracing::warn!(
                    fehler = %e,
                    "Event-Zustellung nach Persistenz fehlgeschlagen – Datensatz bleibt gueltig"
                );
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
