//! Encryption at rest for third-party OAuth tokens, plus random state
//! tokens for the OAuth handshake.
//!
//! Tokens are sealed with AES-256-GCM. The key is the SHA-256 digest of the
//! application secret; every encryption uses a fresh 96-bit nonce which is
//! prepended to the ciphertext, and the whole is base64 encoded. The
//! associated data names the owning user and the token kind, so a
//! ciphertext copied into another row fails to decrypt.

use aes_gcm::aead::{Aead, Payload};
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::{Rng, RngCore};
use sha2::{Digest, Sha256};

use crate::error::CoreError;
use crate::types::DbId;

const NONCE_LEN: usize = 12;

/// Length of OAuth `state` values.
const STATE_TOKEN_LENGTH: usize = 40;

/// Which token of a user's Google credentials is being sealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }
}

/// Symmetric cipher for OAuth tokens.
#[derive(Clone)]
pub struct TokenCipher {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for TokenCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TokenCipher(..)")
    }
}

impl TokenCipher {
    /// Derive the cipher key from the application secret.
    pub fn from_secret(secret: &str) -> Self {
        let key = Sha256::digest(secret.as_bytes());
        let cipher = Aes256Gcm::new(&key);
        Self { cipher }
    }

    /// Seal `plaintext` for `user_id`.
    pub fn encrypt(&self, plaintext: &str, user_id: DbId, kind: TokenKind) -> Result<String, CoreError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::rng().fill_bytes(&mut nonce_bytes);
        let aad = associated_data(user_id, kind);

        let ciphertext = self
            .cipher
            .encrypt(
                Nonce::from_slice(&nonce_bytes),
                Payload {
                    msg: plaintext.as_bytes(),
                    aad: aad.as_bytes(),
                },
            )
            .map_err(|_| CoreError::Internal("Token encryption failed".into()))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(sealed))
    }

    /// Open a value produced by [`TokenCipher::encrypt`] for the same user
    /// and kind.
    pub fn decrypt(&self, sealed: &str, user_id: DbId, kind: TokenKind) -> Result<String, CoreError> {
        let bytes = STANDARD
            .decode(sealed)
            .map_err(|_| CoreError::Internal("Stored token is not valid base64".into()))?;
        if bytes.len() <= NONCE_LEN {
            return Err(CoreError::Internal("Stored token is truncated".into()));
        }
        let (nonce, ciphertext) = bytes.split_at(NONCE_LEN);
        let aad = associated_data(user_id, kind);

        let plaintext = self
            .cipher
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: ciphertext,
                    aad: aad.as_bytes(),
                },
            )
            .map_err(|_| CoreError::Internal("Token decryption failed".into()))?;

        String::from_utf8(plaintext)
            .map_err(|_| CoreError::Internal("Decrypted token is not UTF-8".into()))
    }
}

fn associated_data(user_id: DbId, kind: TokenKind) -> String {
    format!("google_sheet_tokens:{user_id}:{}", kind.as_str())
}

/// Random alphanumeric value for the OAuth `state` parameter.
pub fn generate_state_token() -> String {
    rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(STATE_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn cipher() -> TokenCipher {
        TokenCipher::from_secret("unit-test-secret")
    }

    #[test]
    fn encrypt_then_decrypt() {
        let sealed = cipher().encrypt("ya29.token", 7, TokenKind::Access).unwrap();
        assert_ne!(sealed, "ya29.token");
        assert_eq!(cipher().decrypt(&sealed, 7, TokenKind::Access).unwrap(), "ya29.token");
    }

    #[test]
    fn nonce_makes_ciphertexts_differ() {
        let a = cipher().encrypt("same", 1, TokenKind::Refresh).unwrap();
        let b = cipher().encrypt("same", 1, TokenKind::Refresh).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn ciphertext_is_bound_to_user_and_kind() {
        let sealed = cipher().encrypt("secret", 1, TokenKind::Access).unwrap();
        assert_matches!(cipher().decrypt(&sealed, 2, TokenKind::Access), Err(CoreError::Internal(_)));
        assert_matches!(cipher().decrypt(&sealed, 1, TokenKind::Refresh), Err(CoreError::Internal(_)));
    }

    #[test]
    fn other_secret_cannot_decrypt() {
        let sealed = cipher().encrypt("secret", 1, TokenKind::Access).unwrap();
        let other = TokenCipher::from_secret("another-secret");
        assert!(other.decrypt(&sealed, 1, TokenKind::Access).is_err());
    }

    #[test]
    fn garbage_input_is_rejected() {
        assert!(cipher().decrypt("not base64 !!", 1, TokenKind::Access).is_err());
        assert!(cipher().decrypt("AAAA", 1, TokenKind::Access).is_err());
    }

    #[test]
    fn state_tokens_are_random_alphanumeric() {
        let a = generate_state_token();
        let b = generate_state_token();
        assert_eq!(a.len(), STATE_TOKEN_LENGTH);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }
}
