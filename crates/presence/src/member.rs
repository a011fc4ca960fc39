//! Mitglieder-Verzeichnis und Guild-Lookup
//!
//! Externe Contracts: wer ist Mitglied welcher Guild (mit Rollen und
//! oeffentlicher Projektion fuer Events) und welche Region eine Guild
//! deklariert. Die In-Memory-Implementierungen dienen Tests und dem
//! Single-Instance-Betrieb.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use funkraum_core::error::{FunkraumError, Result};
use funkraum_core::types::{GuildId, UserId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Benutzer- und Mitglieds-Projektionen
// ---------------------------------------------------------------------------

/// Oeffentliche Benutzer-Projektion
///
/// Nur diese vier Felder duerfen in Broadcast-Events auftauchen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: UserId,
    pub username: String,
    pub discriminator: String,
    pub avatar: Option<String>,
}

/// Mitglieds-Datensatz aus dem Verzeichnis
///
/// Verknuepft einen Benutzer mit einer Guild: Rollen, Beitrittszeitpunkt,
/// Moderations-Flags und die oeffentliche Benutzer-Projektion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub user_id: UserId,
    pub guild_id: GuildId,
    /// Rollen-IDs des Mitglieds in dieser Guild
    pub roles: Vec<Uuid>,
    /// Rolle die das Mitglied in der Mitgliederliste hervorhebt
    pub hoisted_role: Option<Uuid>,
    pub joined_at: DateTime<Utc>,
    pub deaf: bool,
    pub mute: bool,
    pub user: PublicUser,
}

impl Member {
    /// Oeffentliche Projektion fuer Broadcast-Events
    pub fn public_projektion(&self) -> PublicMember {
        PublicMember {
            roles: self.roles.clone(),
            hoisted_role: self.hoisted_role,
            joined_at: self.joined_at,
            deaf: self.deaf,
            mute: self.mute,
            user: self.user.clone(),
        }
    }
}

/// Broadcast-sichere Teilmenge eines Mitglieds
///
/// Bewusst ohne `guild_id`/interne Felder – Subscriber kennen die Guild
/// bereits aus dem Event-Scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicMember {
    pub roles: Vec<Uuid>,
    pub hoisted_role: Option<Uuid>,
    pub joined_at: DateTime<Utc>,
    pub deaf: bool,
    pub mute: bool,
    pub user: PublicUser,
}

// ---------------------------------------------------------------------------
// Contracts
// ---------------------------------------------------------------------------

/// Verzeichnis-Contract: loest (Benutzer, Guild) zu Mitgliedsdaten auf
#[async_trait]
pub trait MemberDirectory: Send + Sync {
    /// Loest ein Mitglied auf
    ///
    /// Ein fehlendes Mitglied ist ein harter Fehler – ein Benutzer kann
    /// keiner Guild beitreten in der er kein Mitglied ist.
    async fn aufloesen(&self, user_id: UserId, guild_id: GuildId) -> Result<Member>;
}

/// Guild-Datensatz, reduziert auf das was der Abgleich braucht
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guild {
    pub id: GuildId,
    /// Deklarierte Region-ID, oder `None` wenn die Guild keine setzt
    pub region: Option<String>,
}

/// Guild-Lookup-Contract
#[async_trait]
pub trait GuildLookup: Send + Sync {
    /// Laedt eine Guild anhand ihrer ID
    ///
    /// `None` ist kein Fehler – die Region-Aufloesung faellt dann auf
    /// den Katalog-Standard zurueck.
    async fn laden(&self, guild_id: GuildId) -> Result<Option<Guild>>;
}

// ---------------------------------------------------------------------------
// In-Memory-Implementierungen
// ---------------------------------------------------------------------------

/// In-Memory-Mitgliederverzeichnis ueber DashMap
#[derive(Clone, Default)]
pub struct MemoryMemberDirectory {
    mitglieder: Arc<DashMap<(UserId, GuildId), Member>>,
}

impl MemoryMemberDirectory {
    /// Erstellt ein neues leeres Verzeichnis
    pub fn neu() -> Self {
        Self::default()
    }

    /// Fuegt ein Mitglied ein (Test- und Bootstrap-Helfer)
    pub fn einfuegen(&self, mitglied: Member) {
        self.mitglieder
            .insert((mitglied.user_id, mitglied.guild_id), mitglied);
    }
}

#[async_trait]
impl MemberDirectory for MemoryMemberDirectory {
    async fn aufloesen(&self, user_id: UserId, guild_id: GuildId) -> Result<Member> {
        self.mitglieder
            .get(&(user_id, guild_id))
            .map(|m| m.clone())
            .ok_or_else(|| FunkraumError::MitgliedNichtGefunden {
                user: user_id.to_string(),
                guild: guild_id.to_string(),
            })
    }
}

/// In-Memory-Guild-Lookup ueber DashMap
#[derive(Clone, Default)]
pub struct MemoryGuildLookup {
    guilds: Arc<DashMap<GuildId, Guild>>,
}

impl MemoryGuildLookup {
    /// Erstellt einen neuen leeren Lookup
    pub fn neu() -> Self {
        Self::default()
    }

    /// Fuegt eine Guild ein (Test- und Bootstrap-Helfer)
    pub fn einfuegen(&self, guild: Guild) {
        self.guilds.insert(guild.id, guild);
    }
}

#[async_trait]
impl GuildLookup for MemoryGuildLookup {
    async fn laden(&self, guild_id: GuildId) -> Result<Option<Guild>> {
        Ok(self.guilds.get(&guild_id).map(|g| g.clone()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn test_mitglied(user_id: UserId, guild_id: GuildId) -> Member {
        Member {
            user_id,
            guild_id,
            roles: vec![Uuid::new_v4()],
            hoisted_role: None,
            joined_at: Utc::now(),
            deaf: false,
            mute: false,
            user: PublicUser {
                id: user_id,
                username: "testuser".into(),
                discriminator: "0001".into(),
                avatar: None,
            },
        }
    }

    #[tokio::test]
    async fn mitglied_aufloesen() {
        let verzeichnis = MemoryMemberDirectory::neu();
        let uid = UserId::new();
        let gid = GuildId::new();
        verzeichnis.einfuegen(test_mitglied(uid, gid));

        let mitglied = verzeichnis.aufloesen(uid, gid).await.unwrap();
        assert_eq!(mitglied.user_id, uid);
        assert_eq!(mitglied.guild_id, gid);
    }

    #[tokio::test]
    async fn fehlendes_mitglied_ist_fehler() {
        let verzeichnis = MemoryMemberDirectory::neu();
        let ergebnis = verzeichnis.aufloesen(UserId::new(), GuildId::new()).await;
        assert!(matches!(
            ergebnis,
            Err(FunkraumError::MitgliedNichtGefunden { .. })
        ));
    }

    #[tokio::test]
    async fn guild_laden_und_fehlen() {
        let lookup = MemoryGuildLookup::neu();
        let gid = GuildId::new();
        lookup.einfuegen(Guild {
            id: gid,
            region: Some("frankfurt".into()),
        });

        let guild = lookup.laden(gid).await.unwrap().unwrap();
        assert_eq!(guild.region.as_deref(), Some("frankfurt"));

        assert!(lookup.laden(GuildId::new()).await.unwrap().is_none());
    }

    #[test]
    fn public_projektion_hat_nur_erlaubte_felder() {
        let mitglied = test_mitglied(UserId::new(), GuildId::new());
        let json = serde_json::to_value(mitglied.public_projektion()).unwrap();
        let objekt = json.as_object().unwrap();

        let erlaubt = ["roles", "hoisted_role", "joined_at", "deaf", "mute", "user"];
        assert_eq!(objekt.len(), erlaubt.len());
        for feld in erlaubt {
            assert!(objekt.contains_key(feld), "Feld fehlt: {feld}");
        }

        let user = json["user"].as_object().unwrap();
        let user_erlaubt = ["id", "username", "discriminator", "avatar"];
        assert_eq!(user.len(), user_erlaubt.len());
    }
}
