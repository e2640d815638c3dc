//! Signed download links for the video pack.
//!
//! Pack archives live behind a BunnyCDN pull zone with URL token
//! authentication. A link carries `token` and `expires` query parameters;
//! the edge recomputes `sha256(key + path + expires)` and rejects mismatches
//! and expired links, so links can be handed to buyers without exposing the
//! origin.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use secrecy::ExposeSecret;
use sha2::{Digest, Sha256};

use crate::config::CdnConfig;

/// Generates signed, expiring CDN URLs.
#[derive(Clone)]
pub struct DownloadLinkSigner {
    base_url: String,
    token_key: String,
    link_ttl_secs: u64,
}

impl DownloadLinkSigner {
    /// Create a signer from CDN configuration.
    #[must_use]
    pub fn new(config: &CdnConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            token_key: config.token_key.expose_secret().to_owned(),
            link_ttl_secs: config.link_ttl_secs,
        }
    }

    /// Signed URL for a pack archive, valid for the configured TTL.
    #[must_use]
    pub fn pack_url(&self, pack_slug: &str) -> String {
        let expires = chrono::Utc::now().timestamp() + i64::try_from(self.link_ttl_secs).unwrap_or(i64::MAX);
        self.signed_url(&format!("/{pack_slug}.zip"), expires)
    }

    /// Signed URL for an arbitrary CDN path with an explicit expiry.
    #[must_use]
    pub fn signed_url(&self, path: &str, expires: i64) -> String {
        let token = self.token_for(path, expires);
        format!("{}{path}?token={token}&expires={expires}", self.base_url)
    }

    /// URL-safe token for a path/expiry pair.
    ///
    /// BunnyCDN token authentication: base64 of `sha256(key + path + expires)`
    /// with `+` → `-`, `/` → `_`, and padding stripped.
    fn token_for(&self, path: &str, expires: i64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.token_key.as_bytes());
        hasher.update(path.as_bytes());
        hasher.update(expires.to_string().as_bytes());
        let digest = hasher.finalize();

        STANDARD
            .encode(digest)
            .replace('+', "-")
            .replace('/', "_")
            .trim_end_matches('=')
            .to_owned()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn test_signer() -> DownloadLinkSigner {
        DownloadLinkSigner::new(&CdnConfig {
            base_url: "https://cdn.bearbeat.mx/".to_owned(),
            token_key: SecretString::from("test-token-key"),
            link_ttl_secs: 3600,
        })
    }

    #[test]
    fn test_signed_url_shape() {
        let signer = test_signer();
        let url = signer.signed_url("/bear-beat-pack.zip", 1_900_000_000);

        assert!(url.starts_with("https://cdn.bearbeat.mx/bear-beat-pack.zip?token="));
        assert!(url.ends_with("&expires=1900000000"));
        // Trailing slash on the base URL must not produce a double slash
        assert!(!url.contains(".mx//"));
    }

    #[test]
    fn test_token_is_url_safe() {
        let signer = test_signer();
        // Probe a few expiry values; the token must never carry +, / or =
        for expires in [1_700_000_000_i64, 1_800_000_001, 1_900_000_002, 2_000_000_003] {
            let token = signer.token_for("/bear-beat-pack.zip", expires);
            assert!(!token.contains('+'), "token contains '+': {token}");
            assert!(!token.contains('/'), "token contains '/': {token}");
            assert!(!token.contains('='), "token contains '=': {token}");
        }
    }

    #[test]
    fn test_token_depends_on_path_and_expiry() {
        let signer = test_signer();
        let a = signer.token_for("/bear-beat-pack.zip", 1_900_000_000);
        let b = signer.token_for("/bear-beat-pack.zip", 1_900_000_001);
        let c = signer.token_for("/other-pack.zip", 1_900_000_000);

        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_token_is_deterministic() {
        let signer = test_signer();
        let a = signer.token_for("/bear-beat-pack.zip", 1_900_000_000);
        let b = signer.token_for("/bear-beat-pack.zip", 1_900_000_000);
        assert_eq!(a, b);
    }

    #[test]
    fn test_pack_url_expires_in_the_future() {
        let signer = test_signer();
        let url = signer.pack_url("bear-beat-pack");

        let expires: i64 = url
            .rsplit_once("&expires=")
            .unwrap()
            .1
            .parse()
            .unwrap();
        assert!(expires > chrono::Utc::now().timestamp());
    }
}
