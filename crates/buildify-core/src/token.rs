//! Bearer token issue and validation for logged-in users.
//!
//! Tokens are HMAC-SHA256 based, scoped to a user and an expiry instant.
//! Format: `bfy_at_<user_id>_<expires_unix>_<hmac_hex>`, with the HMAC
//! computed over `<user_id>:<expires_unix>`.

use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Token prefix used to identify buildify access tokens.
const TOKEN_PREFIX: &str = "bfy_at_";

/// Environment variable holding the hex-encoded signing secret.
pub const TOKEN_SECRET_ENV: &str = "BUILDIFY_TOKEN_SECRET";

/// Errors that can occur during token operations.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("invalid token format: {0}")]
    InvalidFormat(String),

    #[error("invalid user ID in token: {0}")]
    InvalidUserId(String),

    #[error("invalid expiry in token: {0}")]
    InvalidExpiry(String),

    #[error("token HMAC verification failed")]
    HmacMismatch,

    #[error("token expired at {0}")]
    Expired(DateTime<Utc>),

    #[error("token secret is missing or empty")]
    MissingSecret,
}

/// Signing configuration.
#[derive(Clone)]
pub struct TokenConfig {
    /// The HMAC secret key bytes.
    secret: Vec<u8>,
    /// Lifetime of newly issued tokens.
    pub ttl: Duration,
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenConfig {
    /// Default token lifetime: one hour.
    pub const DEFAULT_TTL_SECS: i64 = 3600;

    /// Create a config with the default lifetime. An empty secret is
    /// rejected.
    pub fn new(secret: Vec<u8>) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::MissingSecret);
        }
        Ok(Self {
            secret,
            ttl: Duration::seconds(Self::DEFAULT_TTL_SECS),
        })
    }

    /// Create a config from a hex-encoded secret.
    pub fn from_hex(secret_hex: &str) -> Result<Self, TokenError> {
        let secret = hex::decode(secret_hex.trim())
            .map_err(|e| TokenError::InvalidFormat(format!("token secret is not valid hex: {e}")))?;
        Self::new(secret)
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

/// Claims extracted from a validated token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Issue a token for `user_id`, valid for `config.ttl` from `now`.
pub fn issue_token(config: &TokenConfig, user_id: Uuid, now: DateTime<Utc>) -> String {
    let expires = (now + config.ttl).timestamp();
    let message = format!("{user_id}:{expires}");
    let mac = compute_hmac(&config.secret, message.as_bytes());
    format!("{TOKEN_PREFIX}{user_id}_{expires}_{}", hex::encode(mac))
}

/// Validate a token at instant `now` and extract its claims.
///
/// The HMAC is checked (in constant time) before the expiry, so a forged
/// token is reported as [`TokenError::HmacMismatch`] even if it is also
/// expired.
pub fn validate_token(
    config: &TokenConfig,
    token: &str,
    now: DateTime<Utc>,
) -> Result<TokenClaims, TokenError> {
    let rest = token.strip_prefix(TOKEN_PREFIX).ok_or_else(|| {
        TokenError::InvalidFormat(format!("token must start with '{TOKEN_PREFIX}'"))
    })?;

    // A hyphenated UUID is exactly 36 characters.
    if rest.len() < 36 || !rest.is_char_boundary(36) {
        return Err(TokenError::InvalidFormat(
            "token too short to contain a user ID".to_string(),
        ));
    }
    let (user_id_str, after_user_id) = rest.split_at(36);
    let user_id =
        Uuid::parse_str(user_id_str).map_err(|e| TokenError::InvalidUserId(e.to_string()))?;

    let after_underscore = after_user_id.strip_prefix('_').ok_or_else(|| {
        TokenError::InvalidFormat("expected underscore after user ID".to_string())
    })?;
    let (expires_str, hmac_hex) = after_underscore.split_once('_').ok_or_else(|| {
        TokenError::InvalidFormat("expected underscore between expiry and hmac".to_string())
    })?;
    let expires: i64 = expires_str
        .parse()
        .map_err(|e: std::num::ParseIntError| TokenError::InvalidExpiry(e.to_string()))?;

    let provided_mac = hex::decode(hmac_hex)
        .map_err(|e| TokenError::InvalidFormat(format!("invalid hex in hmac: {e}")))?;
    let message = format!("{user_id}:{expires}");
    verify_hmac_constant_time(&config.secret, message.as_bytes(), &provided_mac)?;

    let expires_at = DateTime::<Utc>::from_timestamp(expires, 0)
        .ok_or_else(|| TokenError::InvalidExpiry(format!("{expires} is out of range")))?;
    if now >= expires_at {
        return Err(TokenError::Expired(expires_at));
    }

    Ok(TokenClaims {
        user_id,
        expires_at,
    })
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header_value: &str) -> Option<&str> {
    let (scheme, token) = header_value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

fn new_mac(key: &[u8]) -> HmacSha256 {
    // HMAC accepts keys of any length; `new_from_slice` cannot fail here.
    match HmacSha256::new_from_slice(key) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC can take key of any size"),
    }
}

fn compute_hmac(key: &[u8], message: &[u8]) -> Vec<u8> {
    let mut mac = new_mac(key);
    mac.update(message);
    mac.finalize().into_bytes().to_vec()
}

/// Verify HMAC using the `hmac` crate's constant-time `verify_slice`.
fn verify_hmac_constant_time(
    key: &[u8],
    message: &[u8],
    expected_mac: &[u8],
) -> Result<(), TokenError> {
    let mut mac = new_mac(key);
    mac.update(message);
    mac.verify_slice(expected_mac)
        .map_err(|_| TokenError::HmacMismatch)
}
