//! # pa-auth-simple
//!
//! Shared-secret implementation of `AuthProvider`.
//! The site password is checked against an Argon2 PHC string; sessions are
//! stateless tokens of the form `{expires_unix}.{hex hmac-sha256}`.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use pa_core::error::{AppError, Result};
use pa_core::traits::{AuthProvider, SessionToken};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub struct SimpleAuthProvider {
    /// `None` disables password login entirely.
    password_hash: Option<SecretString>,
    /// Keyed once at construction and cloned per signature.
    signer: HmacSha256,
    session_ttl: Duration,
}

impl SimpleAuthProvider {
    pub fn new(
        password_hash: Option<SecretString>,
        session_secret: &SecretString,
        session_ttl: Duration,
    ) -> Result<Self> {
        let signer = HmacSha256::new_from_slice(session_secret.expose_secret().as_bytes())
            .map_err(AppError::internal)?;
        Ok(Self {
            password_hash,
            signer,
            session_ttl,
        })
    }

    fn signature(&self, expires: i64) -> HmacSha256 {
        let mut mac = self.signer.clone();
        mac.update(expires.to_string().as_bytes());
        mac
    }

    pub fn issue_session_at(&self, now: DateTime<Utc>) -> SessionToken {
        let expires_at = now + self.session_ttl;
        let expires = expires_at.timestamp();
        let sig = hex::encode(self.signature(expires).finalize().into_bytes());
        SessionToken {
            token: format!("{expires}.{sig}"),
            expires_at,
        }
    }

    pub fn validate_session_at(&self, token: &str, now: DateTime<Utc>) -> bool {
        let Some((expires, sig)) = token.trim().split_once('.') else {
            return false;
        };
        let (Ok(expires), Ok(sig)) = (expires.parse::<i64>(), hex::decode(sig)) else {
            return false;
        };
        self.signature(expires).verify_slice(&sig).is_ok() && expires > now.timestamp()
    }
}

#[async_trait]
impl AuthProvider for SimpleAuthProvider {
    /// Verifies if a provided password matches the stored Argon2 hash.
    async fn verify_password(&self, password: &str) -> bool {
        let Some(hash) = &self.password_hash else {
            return false;
        };
        let parsed_hash = match PasswordHash::new(hash.expose_secret()) {
            Ok(p) => p,
            Err(e) => {
                log::error!("configured site password hash is not a valid PHC string: {e}");
                return false;
            }
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }

    fn issue_session(&self) -> SessionToken {
        self.issue_session_at(Utc::now())
    }

    fn validate_session(&self, token: &str) -> bool {
        self.validate_session_at(token, Utc::now())
    }
}

/// Produces the PHC string to put in `auth.site_password_hash`.
pub fn hash_password(password: &str) -> Result<String> {
    let mut salt = [0u8; 16];
    getrandom::getrandom(&mut salt).map_err(AppError::internal)?;
    let salt = SaltString::encode_b64(&salt).map_err(AppError::internal)?;
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(AppError::internal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_hash(password: &str) -> SecretString {
        let salt = SaltString::encode_b64(b"fixed-test-salt!").unwrap();
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .unwrap()
            .to_string();
        SecretString::from(hash)
    }

    fn provider(hash: Option<SecretString>) -> SimpleAuthProvider {
        let secret = SecretString::from("k3y".to_string());
        SimpleAuthProvider::new(hash, &secret, Duration::hours(1)).unwrap()
    }

    #[tokio::test]
    async fn test_verify_password() {
        let auth = provider(Some(fixed_hash("hunter2")));
        assert!(auth.verify_password("hunter2").await);
        assert!(!auth.verify_password("hunter3").await);
    }

    #[tokio::test]
    async fn test_verify_without_or_with_broken_hash() {
        assert!(!provider(None).verify_password("anything").await);
        let broken = provider(Some(SecretString::from("not-a-phc-string".to_string())));
        assert!(!broken.verify_password("anything").await);
    }

    #[test]
    fn test_session_round_trip_and_expiry() {
        let auth = provider(None);
        let now = Utc.with_ymd_and_hms(2025, 10, 1, 12, 0, 0).unwrap();
        let session = auth.issue_session_at(now);

        assert_eq!(session.expires_at, now + Duration::hours(1));
        assert!(auth.validate_session_at(&session.token, now));
        assert!(!auth.validate_session_at(&session.token, now + Duration::hours(2)));
    }

    #[test]
    fn test_tampered_or_foreign_tokens_are_rejected() {
        let auth = provider(None);
        let now = Utc.with_ymd_and_hms(2025, 10, 1, 12, 0, 0).unwrap();
        let token = auth.issue_session_at(now).token;
        let (expires, sig) = token.split_once('.').unwrap();

        let extended = format!("{}.{sig}", expires.parse::<i64>().unwrap() + 3600);
        assert!(!auth.validate_session_at(&extended, now));
        assert!(!auth.validate_session_at("garbage", now));
        assert!(!auth.validate_session_at("123.zz", now));

        let secret = SecretString::from("other".to_string());
        let other = SimpleAuthProvider::new(None, &secret, Duration::hours(1)).unwrap();
        assert!(!other.validate_session_at(&token, now));
    }

    #[tokio::test]
    async fn test_hash_password_output_verifies() {
        let hash = hash_password("open sesame").unwrap();
        assert!(hash.starts_with("$argon2"));
        let auth = provider(Some(SecretString::from(hash)));
        assert!(auth.verify_password("open sesame").await);
    }
}
