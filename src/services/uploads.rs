//! Signed upload credentials for the third-party media service

use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha1::Sha1;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    config::MediaConfig,
    error::{AppError, AppResult},
};

type HmacSha1 = Hmac<Sha1>;

/// Short-lived credentials the upload widget presents to the media service
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UploadAuth {
    /// One-time token
    pub token: String,
    /// Unix timestamp after which the credentials are rejected
    pub expire: u64,
    /// Hex HMAC-SHA1 of token+expire, keyed with the service private key
    pub signature: String,
    /// Public key the client passes alongside the upload
    pub public_key: String,
}

#[derive(Clone)]
pub struct UploadsService {
    config: MediaConfig,
}

impl UploadsService {
    pub fn new(config: MediaConfig) -> Self {
        Self { config }
    }

    /// Generate signed upload credentials
    pub fn upload_auth(&self) -> AppResult<UploadAuth> {
        let token = Uuid::new_v4().to_string();
        let expire = Utc::now().timestamp() as u64 + self.config.token_ttl_seconds;
        let signature = self.sign(&token, expire)?;

        Ok(UploadAuth {
            token,
            expire,
            signature,
            public_key: self.config.public_key.clone(),
        })
    }

    fn sign(&self, token: &str, expire: u64) -> AppResult<String> {
        let mut mac = HmacSha1::new_from_slice(self.config.private_key.as_bytes())
            .map_err(|e| AppError::Internal(format!("Failed to build HMAC: {}", e)))?;
        mac.update(token.as_bytes());
        mac.update(expire.to_string().as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> UploadsService {
        UploadsService::new(MediaConfig {
            public_key: "public_test_key".to_string(),
            private_key: "private_test_key".to_string(),
            url_endpoint: "https://media.example.com/bookwise".to_string(),
            token_ttl_seconds: 900,
        })
    }

    #[test]
    fn signature_is_hex_sha1_sized() {
        let svc = service();
        let sig = svc.sign("token-a", 1_900_000_000).unwrap();
        assert_eq!(sig.len(), 40);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn signature_is_deterministic_per_token_and_expire() {
        let svc = service();
        let a = svc.sign("token-a", 1_900_000_000).unwrap();
        let b = svc.sign("token-a", 1_900_000_000).unwrap();
        let c = svc.sign("token-b", 1_900_000_000).unwrap();
        let d = svc.sign("token-a", 1_900_000_001).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn upload_auth_expires_in_the_future() {
        let svc = service();
        let auth = svc.upload_auth().unwrap();
        assert!(auth.expire > Utc::now().timestamp() as u64);
        assert_eq!(auth.public_key, "public_test_key");

        // Tokens are one-time: two calls never share one
        let other = svc.upload_auth().unwrap();
        assert_ne!(auth.token, other.token);
    }
}
