//! funkraum-presence – Voice-Praesenz-Abgleich
//!
//! Dieser Crate implementiert den Abgleich zwischen der vom Client
//! gemeldeten Voice-Absicht und dem einen persistierten Praesenz-Datensatz
//! pro Benutzer. Er entscheidet welche Events in welcher Reihenfolge an
//! Subscriber gehen und fordert eine Server-Zuweisung an.
//!
//! ## Architektur
//!
//! ```text
//! VoiceStateIntent (Client, bereits schema-validiert)
//!     |
//!     v
//! VoiceReconciler
//!     |  pro Benutzer serialisiert (Sperren-Map)
//!     |
//!     +-- uebergang_berechnen   (pure Entscheidung, keine I/O)
//!     +-- VoiceStateStore       (laden / erstellen / speichern)
//!     +-- MemberDirectory       (Mitglied fuer Haupt-Event)
//!     +-- RegionResolver        (Guild-Region -> Endpoint)
//!     +-- EventFanout           (Leave -> Haupt-Update -> Zuweisung)
//! ```

pub mod fanout;
pub mod member;
pub mod reconciler;
pub mod region;
pub mod state;
pub mod store;
pub mod token;

// Bequeme Re-Exporte
pub use fanout::{BroadcastFanout, EventFanout, EventScope, GatewayEvent};
pub use member::{
    Guild, GuildLookup, Member, MemberDirectory, MemoryGuildLookup, MemoryMemberDirectory,
    PublicMember, PublicUser,
};
pub use reconciler::{AbgleichErgebnis, VoiceReconciler};
pub use region::{Region, RegionCatalog, RegionResolver};
pub use state::{PublicVoiceState, VoiceState, VoiceStateIntent};
pub use store::{MemoryVoiceStateStore, VoiceStateStore};
pub use token::voice_token_generieren;
