//! Client session tokens and password hashing
//!
//! The session of a client is stored completely in a cookie. The [SessionToken] is serialized as
//! JSON, signed with HMAC-SHA256 using the application secret and encoded as
//! `<base64 payload>.<base64 signature>`.

use crate::data_store::UserId;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use ring::hmac;
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionToken {
    #[serde(rename = "u")]
    user_id: Option<UserId>,
    /// Unix timestamp of the creation of the token
    #[serde(rename = "t")]
    issued_at: i64,
}

impl SessionToken {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        SessionToken {
            user_id: None,
            issued_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Parse and validate a session token from its string representation.
    ///
    /// The signature is checked with the given `secret`. Tokens issued more than `max_age` ago are
    /// rejected.
    pub fn from_string(
        data: &str,
        secret: &str,
        max_age: std::time::Duration,
    ) -> Result<Self, SessionError> {
        let (payload, signature) = data
            .split_once('.')
            .ok_or(SessionError::InvalidTokenFormat)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| SessionError::InvalidTokenFormat)?;
        let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
        hmac::verify(&key, payload.as_bytes(), &signature)
            .map_err(|_| SessionError::SignatureVerificationFailed)?;

        let payload = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| SessionError::InvalidTokenFormat)?;
        let token: SessionToken =
            serde_json::from_slice(&payload).map_err(|_| SessionError::InvalidTokenFormat)?;

        let age = chrono::Utc::now().timestamp() - token.issued_at;
        if age < 0 || age as u64 > max_age.as_secs() {
            return Err(SessionError::ExpiredToken);
        }
        Ok(token)
    }

    /// Serialize and sign the session token
    pub fn as_string(&self, secret: &str) -> String {
        let payload = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(self).expect("Session token should always be serializable"),
        );
        let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
        let signature = hmac::sign(&key, payload.as_bytes());
        format!("{}.{}", payload, URL_SAFE_NO_PAD.encode(signature.as_ref()))
    }

    /// Store the authenticated user in the session. This restarts the session's lifetime.
    pub fn set_user(&mut self, user_id: UserId) {
        self.user_id = Some(user_id);
        self.issued_at = chrono::Utc::now().timestamp();
    }

    pub fn get_user_id(&self) -> Option<UserId> {
        self.user_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    InvalidTokenFormat,
    SignatureVerificationFailed,
    ExpiredToken,
}

/// Hash a password with argon2 for storing it in the users table.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let mut salt = [0u8; 16];
    SystemRandom::new()
        .fill(&mut salt)
        .map_err(|_| PasswordError("Could not generate random salt".to_owned()))?;
    let salt = SaltString::encode_b64(&salt).map_err(|e| PasswordError(e.to_string()))?;
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError(e.to_string()))?
        .to_string())
}

/// Check a password against a stored argon2 hash. Invalid hashes never match.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed_hash) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok(),
        Err(_) => false,
    }
}

#[derive(Debug)]
pub struct PasswordError(String);

impl std::fmt::Display for PasswordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Could not hash password: {}", self.0)
    }
}

impl std::error::Error for PasswordError {}
