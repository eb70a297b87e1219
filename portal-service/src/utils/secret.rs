//! Hashing, verification, and generation of credential material.
//!
//! Access keys and one-time access tokens are hashed with Argon2id before
//! they touch the store. Verification also accepts a legacy plaintext stored
//! form (pre-migration rows), compared in constant time; that branch goes
//! away once the last legacy row is rehashed.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::{Rng, RngCore};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Namespace tag on every human-typeable access identifier.
pub const ACCESS_ID_PREFIX: &str = "IP-";

/// Unambiguous alphabet for access identifiers: no I, O, 0, or 1.
const ACCESS_ID_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const ACCESS_ID_LEN: usize = 8;

const ACCESS_KEY_BYTES: usize = 16;
const ACCESS_TOKEN_BYTES: usize = 32;

/// Normalize a manually transcribed secret: surrounding whitespace and
/// letter case carry no meaning for issued codes.
pub fn normalize_secret(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

/// Hash a secret with Argon2id. Salt is generated and embedded in the
/// PHC-format output.
pub fn hash_secret(secret: &str) -> Result<String, anyhow::Error> {
    let argon2 = Argon2::default();
    let salt = SaltString::generate(&mut OsRng);

    let hash = argon2
        .hash_password(normalize_secret(secret).as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash secret: {}", e))?
        .to_string();

    Ok(hash)
}

/// Verify a candidate secret against a stored form.
///
/// Stored forms come in two shapes: an Argon2 PHC string (detected by its
/// prefix) or a legacy plaintext value compared in constant time. Any
/// mismatch, empty input, or malformed stored hash verifies false.
pub fn verify_secret(candidate: &str, stored: &str) -> bool {
    if stored.is_empty() || candidate.trim().is_empty() {
        return false;
    }

    let normalized = normalize_secret(candidate);

    if stored.starts_with("$argon2") {
        match PasswordHash::new(stored) {
            Ok(parsed) => Argon2::default()
                .verify_password(normalized.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                tracing::debug!(error = %e, "Stored secret hash is malformed");
                false
            }
        }
    } else {
        // Legacy plaintext stored form. Constant-time compare so the branch
        // does not leak match position.
        bool::from(normalized.as_bytes().ct_eq(stored.as_bytes()))
    }
}

/// Generate a human-typeable access identifier, e.g. `IP-KQ7M2XWB`.
pub fn generate_access_id() -> String {
    let mut rng = rand::thread_rng();
    let code: String = (0..ACCESS_ID_LEN)
        .map(|_| ACCESS_ID_ALPHABET[rng.gen_range(0..ACCESS_ID_ALPHABET.len())] as char)
        .collect();
    format!("{}{}", ACCESS_ID_PREFIX, code)
}

/// Generate a random access key (hex).
pub fn generate_access_key() -> String {
    let mut bytes = [0u8; ACCESS_KEY_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Generate a random one-time access token (hex, longer than the key).
pub fn generate_access_token() -> String {
    let mut bytes = [0u8; ACCESS_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Digest an invite token for storage and lookup. Invite tokens are random
/// high-entropy values, so an unsalted digest is sufficient and keeps them
/// addressable by hash.
pub fn digest_invite_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_round_trips() {
        let hash = hash_secret("3f2a9bc1d4e5f607").expect("Failed to hash secret");
        assert!(hash.starts_with("$argon2"));
        assert!(verify_secret("3f2a9bc1d4e5f607", &hash));
        assert!(!verify_secret("3f2a9bc1d4e5f608", &hash));
    }

    #[test]
    fn verification_tolerates_case_and_whitespace() {
        let hash = hash_secret("deadbeefcafe").expect("Failed to hash secret");
        assert!(verify_secret("  DEADBEEFCAFE  ", &hash));
        assert!(verify_secret("DeadBeefCafe", &hash));
    }

    #[test]
    fn same_secret_hashes_differently() {
        let h1 = hash_secret("deadbeefcafe").unwrap();
        let h2 = hash_secret("deadbeefcafe").unwrap();
        assert_ne!(h1, h2);
        assert!(verify_secret("deadbeefcafe", &h1));
        assert!(verify_secret("deadbeefcafe", &h2));
    }

    #[test]
    fn legacy_plaintext_stored_form_compares_normalized() {
        assert!(verify_secret("  ab12cd34 ", "AB12CD34"));
        assert!(!verify_secret("ab12cd35", "AB12CD34"));
    }

    #[test]
    fn empty_and_malformed_inputs_verify_false() {
        assert!(!verify_secret("anything", ""));
        assert!(!verify_secret("", "AB12CD34"));
        assert!(!verify_secret("   ", "AB12CD34"));
        // Prefix says argon2 but the rest is garbage.
        assert!(!verify_secret("anything", "$argon2id$not-a-real-hash"));
    }

    #[test]
    fn access_id_uses_unambiguous_alphabet() {
        for _ in 0..50 {
            let id = generate_access_id();
            assert!(id.starts_with(ACCESS_ID_PREFIX));
            let code = &id[ACCESS_ID_PREFIX.len()..];
            assert_eq!(code.len(), ACCESS_ID_LEN);
            for c in code.chars() {
                assert!(!"IO01".contains(c), "confusable character {} in {}", c, id);
                assert!(c.is_ascii_uppercase() || c.is_ascii_digit());
            }
        }
    }

    #[test]
    fn token_is_longer_than_key() {
        let key = generate_access_key();
        let token = generate_access_token();
        assert_eq!(key.len(), 32);
        assert_eq!(token.len(), 64);
        assert!(token.len() > key.len());
    }

    #[test]
    fn invite_token_digest_is_stable_hex() {
        let d1 = digest_invite_token("some-token");
        let d2 = digest_invite_token("some-token");
        assert_eq!(d1, d2);
        assert_eq!(d1.len(), 64);
        assert_ne!(d1, digest_invite_token("other-token"));
    }
}
