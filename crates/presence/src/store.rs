//! Voice-State-Store – Persistenz-Contract und In-Memory-Referenz
//!
//! Das Repository-Pattern entkoppelt den Abgleich von der konkreten
//! Persistenz. Die In-Memory-Implementierung dient Tests und dem
//! Single-Instance-Betrieb; eine Datenbank-Implementierung kann den
//! Trait spaeter erfuellen.

use async_trait::async_trait;
use dashmap::DashMap;
use funkraum_core::error::Result;
use funkraum_core::types::UserId;
use std::sync::Arc;

use crate::state::VoiceState;

/// Persistenz-Contract fuer Voice-Praesenz-Datensaetze
///
/// Schluessel ist immer die `user_id` – pro Benutzer existiert hoechstens
/// ein Datensatz.
#[async_trait]
pub trait VoiceStateStore: Send + Sync {
    /// Laedt den Datensatz eines Benutzers
    ///
    /// `None` ist kein Fehler – der Benutzer hatte schlicht noch nie
    /// eine Voice-Praesenz.
    async fn laden(&self, user_id: UserId) -> Result<Option<VoiceState>>;

    /// Legt einen neuen Datensatz an
    async fn erstellen(&self, state: VoiceState) -> Result<()>;

    /// Speichert einen bestehenden Datensatz
    async fn speichern(&self, state: VoiceState) -> Result<()>;
}

// ---------------------------------------------------------------------------
// MemoryVoiceStateStore
// ---------------------------------------------------------------------------

/// In-Memory-Store ueber DashMap
///
/// Thread-safe via Arc + DashMap. Clone teilt den inneren Zustand.
#[derive(Clone, Default)]
pub struct MemoryVoiceStateStore {
    eintraege: Arc<DashMap<UserId, VoiceState>>,
}

impl MemoryVoiceStateStore {
    /// Erstellt einen neuen leeren Store
    pub fn neu() -> Self {
        Self::default()
    }

    /// Anzahl der gespeicherten Datensaetze
    pub fn anzahl(&self) -> usize {
        self.eintraege.len()
    }
}

#[async_trait]
impl VoiceStateStore for MemoryVoiceStateStore {
    async fn laden(&self, user_id: UserId) -> Result<Option<VoiceState>> {
        Ok(self.eintraege.get(&user_id).map(|e| e.clone()))
    }

    async fn erstellen(&self, state: VoiceState) -> Result<()> {
        self.eintraege.insert(state.user_id, state);
        Ok(())
    }

    async fn speichern(&self, state: VoiceState) -> Result<()> {
        self.eintraege.insert(state.user_id, state);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::VoiceStateIntent;
    use funkraum_core::types::SessionId;

    #[tokio::test]
    async fn laden_ohne_datensatz_gibt_none() {
        let store = MemoryVoiceStateStore::neu();
        let geladen = store.laden(UserId::new()).await.unwrap();
        assert!(geladen.is_none());
    }

    #[tokio::test]
    async fn erstellen_und_laden() {
        let store = MemoryVoiceStateStore::neu();
        let state = VoiceState::neu(
            UserId::new(),
            SessionId::new(),
            &VoiceStateIntent::default(),
        );

        store.erstellen(state.clone()).await.unwrap();

        let geladen = store.laden(state.user_id).await.unwrap();
        assert_eq!(geladen, Some(state));
        assert_eq!(store.anzahl(), 1);
    }

    #[tokio::test]
    async fn speichern_ueberschreibt_datensatz() {
        let store = MemoryVoiceStateStore::neu();
        let mut state = VoiceState::neu(
            UserId::new(),
            SessionId::new(),
            &VoiceStateIntent::default(),
        );
        store.erstellen(state.clone()).await.unwrap();

        state.self_mute = true;
        store.speichern(state.clone()).await.unwrap();

        let geladen = store.laden(state.user_id).await.unwrap().unwrap();
        assert!(geladen.self_mute);
        assert_eq!(store.anzahl(), 1, "Speichern darf keinen zweiten Datensatz anlegen");
    }

    #[tokio::test]
    async fn clone_teilt_inneren_state() {
        let store1 = MemoryVoiceStateStore::neu();
        let store2 = store1.clone();
        let state = VoiceState::neu(
            UserId::new(),
            SessionId::new(),
            &VoiceStateIntent::default(),
        );

        store1.erstellen(state.clone()).await.unwrap();
        assert!(store2.laden(state.user_id).await.unwrap().is_some());
    }
}
