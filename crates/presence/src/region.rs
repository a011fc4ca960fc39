//! Region-Katalog und Region-Aufloesung
//!
//! Der Katalog ist statische Konfiguration: eine geordnete Liste von
//! Regionen plus ein designierter Standard. Duplikate oder ein fehlender
//! Standard sind Konfigurationsfehler und werden beim Start abgewiesen,
//! nicht pro Request.

use funkraum_core::error::{FunkraumError, Result};
use funkraum_core::types::GuildId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

use crate::member::GuildLookup;

// ---------------------------------------------------------------------------
// Katalog
// ---------------------------------------------------------------------------

/// Eine Serving-Region mit ihrem Voice-Endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Stabile Region-ID (z.B. "frankfurt")
    pub id: String,
    /// Endpoint des Voice-Servers dieser Region
    pub endpoint: String,
}

/// Geordneter Katalog aller Serving-Regionen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionCatalog {
    /// ID der Standard-Region (muss in `available` vorkommen)
    pub default: String,
    /// Verfuegbare Regionen, pro ID genau ein Eintrag
    pub available: Vec<Region>,
}

impl Default for RegionCatalog {
    fn default() -> Self {
        Self {
            default: "frankfurt".into(),
            available: vec![Region {
                id: "frankfurt".into(),
                endpoint: "voice-ffm.funkraum.example:9987".into(),
            }],
        }
    }
}

impl RegionCatalog {
    /// Prueft die Start-Invarianten des Katalogs
    ///
    /// Doppelte Region-IDs oder ein Standard ohne passenden Eintrag sind
    /// Konfigurationsfehler; der Prozess darf damit nicht starten.
    pub fn validieren(&self) -> Result<()> {
        if self.available.is_empty() {
            return Err(FunkraumError::konfiguration(
                "Region-Katalog ist leer",
            ));
        }

        let mut gesehen = HashSet::new();
        for region in &self.available {
            if !gesehen.insert(region.id.as_str()) {
                return Err(FunkraumError::konfiguration(format!(
                    "Doppelte Region-ID im Katalog: {}",
                    region.id
                )));
            }
        }

        if self.finden(&self.default).is_none() {
            return Err(FunkraumError::konfiguration(format!(
                "Standard-Region '{}' fehlt im Katalog",
                self.default
            )));
        }

        Ok(())
    }

    /// Sucht eine Region anhand ihrer ID
    pub fn finden(&self, id: &str) -> Option<&Region> {
        self.available.iter().find(|r| r.id == id)
    }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Loest die Serving-Region fuer eine Guild auf
///
/// Deklariert die Guild eine im Katalog vorhandene Region, gewinnt diese;
/// sonst (keine Guild, keine Region, unbekannte Region-ID) der Standard.
#[derive(Clone)]
pub struct RegionResolver {
    katalog: RegionCatalog,
    guilds: Arc<dyn GuildLookup>,
}

impl RegionResolver {
    /// Erstellt einen Resolver; validiert den Katalog sofort
    pub fn neu(katalog: RegionCatalog, guilds: Arc<dyn GuildLookup>) -> Result<Self> {
        katalog.validieren()?;
        Ok(Self { katalog, guilds })
    }

    /// Loest die Region fuer eine (optionale) Guild auf
    ///
    /// Direktanrufe (`guild_id == None`) landen immer beim Standard.
    pub async fn aufloesen(&self, guild_id: Option<GuildId>) -> Result<Region> {
        let deklariert = match guild_id {
            Some(gid) => self
                .guilds
                .laden(gid)
                .await?
                .and_then(|guild| guild.region),
            None => None,
        };

        let region = deklariert
            .as_deref()
            .and_then(|id| self.katalog.finden(id))
            .or_else(|| self.katalog.finden(&self.katalog.default))
            .ok_or_else(|| {
                // Durch validieren() beim Start ausgeschlossen
                FunkraumError::konfiguration(format!(
                    "Standard-Region '{}' fehlt im Katalog",
                    self.katalog.default
                ))
            })?;

        Ok(region.clone())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::member::{Guild, MemoryGuildLookup};

    fn test_katalog() -> RegionCatalog {
        RegionCatalog {
            default: "frankfurt".into(),
            available: vec![
                Region {
                    id: "frankfurt".into(),
                    endpoint: "voice-ffm.example:9987".into(),
                },
                Region {
                    id: "amsterdam".into(),
                    endpoint: "voice-ams.example:9987".into(),
                },
            ],
        }
    }

    #[test]
    fn katalog_validierung_akzeptiert_gueltigen_katalog() {
        assert!(test_katalog().validieren().is_ok());
    }

    #[test]
    fn katalog_validierung_lehnt_duplikate_ab() {
        let mut katalog = test_katalog();
        katalog.available.push(Region {
            id: "frankfurt".into(),
            endpoint: "voice-ffm2.example:9987".into(),
        });
        assert!(matches!(
            katalog.validieren(),
            Err(FunkraumError::Konfiguration(_))
        ));
    }

    #[test]
    fn katalog_validierung_lehnt_fehlenden_standard_ab() {
        let mut katalog = test_katalog();
        katalog.default = "mond".into();
        assert!(katalog.validieren().is_err());
    }

    #[test]
    fn leerer_katalog_ist_fehler() {
        let katalog = RegionCatalog {
            default: "frankfurt".into(),
            available: vec![],
        };
        assert!(katalog.validieren().is_err());
    }

    #[tokio::test]
    async fn guild_region_gewinnt() {
        let guilds = MemoryGuildLookup::neu();
        let gid = GuildId::new();
        guilds.einfuegen(Guild {
            id: gid,
            region: Some("amsterdam".into()),
        });

        let resolver = RegionResolver::neu(test_katalog(), Arc::new(guilds)).unwrap();
        let region = resolver.aufloesen(Some(gid)).await.unwrap();
        assert_eq!(region.endpoint, "voice-ams.example:9987");
    }

    #[tokio::test]
    async fn unbekannte_region_faellt_auf_standard_zurueck() {
        let guilds = MemoryGuildLookup::neu();
        let gid = GuildId::new();
        guilds.einfuegen(Guild {
            id: gid,
            region: Some("atlantis".into()),
        });

        let resolver = RegionResolver::neu(test_katalog(), Arc::new(guilds)).unwrap();
        let region = resolver.aufloesen(Some(gid)).await.unwrap();
        assert_eq!(region.id, "frankfurt");
    }

    #[tokio::test]
    async fn guild_ohne_region_faellt_auf_standard_zurueck() {
        let guilds = MemoryGuildLookup::neu();
        let gid = GuildId::new();
        guilds.einfuegen(Guild { id: gid, region: None });

        let resolver = RegionResolver::neu(test_katalog(), Arc::new(guilds)).unwrap();
        let region = resolver.aufloesen(Some(gid)).await.unwrap();
        assert_eq!(region.id, "frankfurt");
    }

    #[tokio::test]
    async fn direktanruf_nutzt_standard() {
        let resolver =
            RegionResolver::neu(test_katalog(), Arc::new(MemoryGuildLookup::neu())).unwrap();
        let region = resolver.aufloesen(None).await.unwrap();
        assert_eq!(region.id, "frankfurt");
    }

    #[tokio::test]
    async fn unbekannte_guild_faellt_auf_standard_zurueck() {
        let resolver =
            RegionResolver::neu(test_katalog(), Arc::new(MemoryGuildLookup::neu())).unwrap();
        let region = resolver.aufloesen(Some(GuildId::new())).await.unwrap();
        assert_eq!(region.id, "frankfurt");
    }
}
