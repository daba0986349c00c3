//! API credentials and request signing.
//!
//! The secret never leaves this module: callers hand over the payload to
//! sign and get back a hex signature. The secret is zeroized on drop.

use crate::error::{GatewayError, GatewayResult};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::Zeroizing;

type HmacSha256 = Hmac<Sha256>;

/// Venue API credentials.
pub struct ApiCredentials {
    api_key: String,
    secret: Zeroizing<String>,
}

impl ApiCredentials {
    pub fn new(api_key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            secret: Zeroizing::new(secret.into()),
        }
    }

    /// Load credentials from environment variables.
    pub fn from_env(key_var: &str, secret_var: &str) -> GatewayResult<Self> {
        let api_key = std::env::var(key_var).map_err(|_| {
            GatewayError::Credentials(format!("environment variable {key_var} not set"))
        })?;
        let secret = std::env::var(secret_var).map_err(|_| {
            GatewayError::Credentials(format!("environment variable {secret_var} not set"))
        })?;
        if api_key.is_empty() || secret.is_empty() {
            return Err(GatewayError::Credentials(
                "API key and secret must be non-empty".to_string(),
            ));
        }
        Ok(Self::new(api_key, secret))
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// HMAC-SHA256 signature of `payload`, hex-encoded.
    pub fn sign(&self, payload: &str) -> GatewayResult<String> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| GatewayError::Credentials(e.to_string()))?;
        mac.update(payload.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

impl std::fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material.
        f.debug_struct("ApiCredentials")
            .field("api_key", &"***")
            .field("secret", &"***")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_known_vector() {
        // Reference vector from the venue's API documentation.
        let creds = ApiCredentials::new(
            "vmPUZE6mv9SD5VNHk4HlWFsOr6aKE2zvsw0MuIgwCIPy6utIco14y7Ju91duEh8A",
            "NhqPtmdSJYdKjVHjA7PZj4Mge3R5YNiP1e3UZjInClVN65XAbvqqM6A7H5fATj0j",
        );
        let payload = "symbol=LTCBTC&side=BUY&type=LIMIT&timeInForce=GTC&quantity=1&price=0.1&recvWindow=5000&timestamp=1499827319559";
        let signature = creds.sign(payload).unwrap();
        assert_eq!(
            signature,
            "c8db56825ae71d6d79447849e617115f4a920fa2acdcab2b053c4b2838bd6b71"
        );
    }

    #[test]
    fn test_debug_hides_secret() {
        let creds = ApiCredentials::new("my-api-key", "my-api-secret");
        let debug = format!("{creds:?}");
        assert!(!debug.contains("my-api-key"));
        assert!(!debug.contains("my-api-secret"));
        assert!(debug.contains("***"));
    }
}
