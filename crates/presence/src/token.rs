//! Voice-Token-Generierung
//!
//! Tokens sind opake Bearer-Credentials fuer den Zugang zum Voice-Server.
//! Keine Struktur ausser Unratbarkeit und Eindeutigkeit; gespeichert wird
//! der Klartext im Praesenz-Datensatz, nie in Events.

use rand::RngCore;

/// Generiert ein kryptografisch sicheres Voice-Token
///
/// Format: "vt_" + 43 Zeichen URL-sicheres Base64 (256 Bit Entropie)
pub fn voice_token_generieren() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    let encoded = base64::Engine::encode(
        &base64::engine::general_purpose::URL_SAFE_NO_PAD,
        bytes,
    );
    format!("vt_{}", encoded)
}
