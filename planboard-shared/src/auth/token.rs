//! Session token issuing and verification
//!
//! Session tokens are JWTs signed with an HMAC algorithm and a shared secret.
//! A token binds a subject (the credential's username) to an absolute expiry.
//! Any tampering invalidates the signature.
//!
//! # Lifecycle
//!
//! ```text
//! Issued ──> Valid (now < exp) ──> Expired (now >= exp)
//! ```
//!
//! Expired is terminal. Logging out re-signs the same claims with `exp = now`,
//! which produces a token that is already expired. The service keeps no
//! revocation list: copies of the original token stay valid until their own
//! expiry.
//!
//! # Configuration
//!
//! [`TokenConfig`] is passed to [`TokenService::new`] explicitly. Only the HMAC
//! family (HS256, HS384, HS512) is accepted.
//!
//! # Example
//!
//! ```
//! use chrono::Duration;
//! use planboard_shared::auth::token::{TokenConfig, TokenService};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = TokenService::new(TokenConfig::new("a-secret-key-that-is-at-least-32-bytes"))?;
//!
//! let issued = service.issue("alice", Duration::minutes(60))?;
//! assert_eq!(service.verify(&issued.token)?, "alice");
//!
//! let logged_out = service.invalidate(&issued.token)?;
//! assert!(service.verify(&logged_out.token).is_err());
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Issuer written into and required from every token
pub const DEFAULT_ISSUER: &str = "planboard";

/// Default session length
pub const DEFAULT_TTL_MINUTES: i64 = 60;

/// Error type for token operations
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Failed to sign a token
    #[error("Failed to create token: {0}")]
    Signing(String),

    /// Token expiry has passed
    #[error("Token has expired")]
    Expired,

    /// Bad signature, wrong issuer or malformed token
    #[error("Invalid token: {0}")]
    Invalid(String),

    /// Configured algorithm is unknown or not an HMAC algorithm
    #[error("Unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

/// Signing configuration for [`TokenService`]
#[derive(Clone)]
pub struct TokenConfig {
    /// Shared HMAC secret
    pub secret: String,

    /// HMAC signing algorithm
    pub algorithm: Algorithm,

    /// Lifetime used by [`TokenService::issue_default`]
    pub default_ttl: Duration,

    /// Value of the `iss` claim
    pub issuer: String,
}

impl TokenConfig {
    /// HS256, 60 minute sessions, issuer "planboard"
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            algorithm: Algorithm::HS256,
            default_ttl: Duration::minutes(DEFAULT_TTL_MINUTES),
            issuer: DEFAULT_ISSUER.to_string(),
        }
    }

    /// Sets the algorithm from its identifier (e.g. "HS512")
    pub fn with_algorithm(mut self, name: &str) -> Result<Self, TokenError> {
        self.algorithm = parse_algorithm(name)?;
        Ok(self)
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .field("default_ttl", &self.default_ttl)
            .field("issuer", &self.issuer)
            .finish()
    }
}

/// Parses an algorithm identifier, accepting only HS256, HS384 and HS512
pub fn parse_algorithm(name: &str) -> Result<Algorithm, TokenError> {
    let algorithm = Algorithm::from_str(name.trim())
        .map_err(|_| TokenError::UnsupportedAlgorithm(name.to_string()))?;

    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(algorithm),
        _ => Err(TokenError::UnsupportedAlgorithm(name.to_string())),
    }
}

/// Claims carried by a session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - the credential's username
    pub sub: String,

    /// Issuer
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Expired once `now >= exp`
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// A freshly signed token and its absolute expiry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues, verifies and invalidates session tokens
#[derive(Clone)]
pub struct TokenService {
    config: Arc<TokenConfig>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenService {
    /// Builds the service from an explicit configuration
    ///
    /// # Errors
    ///
    /// Returns `TokenError::UnsupportedAlgorithm` if the configured algorithm is
    /// not HMAC-based
    pub fn new(config: TokenConfig) -> Result<Self, TokenError> {
        if !matches!(
            config.algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(TokenError::UnsupportedAlgorithm(format!(
                "{:?}",
                config.algorithm
            )));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    /// Signs a token for `subject` that expires `ttl` from now
    ///
    /// # Errors
    ///
    /// `TokenError::Signing` if `now + ttl` is beyond the representable range
    pub fn issue(&self, subject: &str, ttl: Duration) -> Result<IssuedToken, TokenError> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| TokenError::Signing(format!("Token lifetime out of range: {}", ttl)))?;

        let claims = Claims {
            sub: subject.to_string(),
            iss: self.config.issuer.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        self.sign(&claims)
    }

    /// Signs a token with the configured default lifetime
    pub fn issue_default(&self, subject: &str) -> Result<IssuedToken, TokenError> {
        self.issue(subject, self.config.default_ttl)
    }

    /// Verifies signature, issuer and expiry, returning the subject
    ///
    /// # Errors
    ///
    /// - `TokenError::Expired` once `now >= exp`
    /// - `TokenError::Invalid` for bad signatures, wrong issuer or malformed input
    pub fn verify(&self, token: &str) -> Result<String, TokenError> {
        self.decode(token).map(|claims| claims.sub)
    }

    /// Logs a token out by re-signing its claims with `exp = now`
    ///
    /// The returned token is already expired. The original token is not revoked.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Invalid` when the input is already expired or does
    /// not verify; there is nothing to invalidate in either case.
    pub fn invalidate(&self, token: &str) -> Result<IssuedToken, TokenError> {
        let mut claims = self.decode(token).map_err(|e| match e {
            TokenError::Expired => TokenError::Invalid("token already expired".to_string()),
            other => other,
        })?;

        claims.exp = Utc::now().timestamp();
        debug!(subject = %claims.sub, "Re-signing token with immediate expiry");

        self.sign(&claims)
    }

    fn sign(&self, claims: &Claims) -> Result<IssuedToken, TokenError> {
        let header = Header::new(self.config.algorithm);
        let token = encode(&header, claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(format!("Token encoding failed: {}", e)))?;

        Ok(IssuedToken {
            token,
            expires_at: claims.expires_at(),
        })
    }

    fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(self.config.algorithm);
        validation.set_issuer(&[self.config.issuer.as_str()]);
        validation.validate_exp = true;
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            }
        })?;

        // The library treats exp == now as still valid; the session model does not.
        if data.claims.is_expired() {
            return Err(TokenError::Expired);
        }

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn service() -> TokenService {
        TokenService::new(TokenConfig::new(SECRET)).unwrap()
    }

    #[test]
    fn test_issue_then_verify_returns_subject() {
        let service = service();
        let issued = service.issue("alice", Duration::minutes(60)).unwrap();

        assert_eq!(service.verify(&issued.token).unwrap(), "alice");

        let remaining = issued.expires_at - Utc::now();
        assert!(remaining.num_seconds() > 3500);
        assert!(remaining.num_seconds() <= 3600);
    }

    #[test]
    fn test_issue_default_uses_configured_ttl() {
        let config = TokenConfig::new(SECRET).with_default_ttl(Duration::minutes(5));
        let service = TokenService::new(config).unwrap();

        let issued = service.issue_default("bob").unwrap();
        let remaining = issued.expires_at - Utc::now();
        assert!(remaining.num_seconds() <= 300);
        assert!(remaining.num_seconds() > 250);
    }

    #[test]
    fn test_verify_after_ttl_fails_as_expired() {
        let service = service();
        let issued = service.issue("alice", Duration::seconds(-3600)).unwrap();

        assert!(matches!(service.verify(&issued.token), Err(TokenError::Expired)));
    }

    #[test]
    fn test_expiry_equal_to_now_is_expired() {
        let service = service();
        let issued = service.issue("alice", Duration::zero()).unwrap();

        assert!(matches!(service.verify(&issued.token), Err(TokenError::Expired)));
    }

    #[test]
    fn test_out_of_range_ttl_is_an_error() {
        let service = service();

        for ttl in [Duration::minutes(1_000_000_000_000), Duration::MAX] {
            let result = service.issue("alice", ttl);
            assert!(matches!(result, Err(TokenError::Signing(_))));
        }
    }

    #[test]
    fn test_verify_with_wrong_secret() {
        let issued = service().issue("alice", Duration::minutes(5)).unwrap();
        let other = TokenService::new(TokenConfig::new("a-completely-different-secret-value")).unwrap();

        assert!(matches!(other.verify(&issued.token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_tampered_token_is_rejected() {
        let service = service();
        let issued = service.issue("alice", Duration::minutes(5)).unwrap();

        let mut parts: Vec<String> = issued.token.split('.').map(str::to_string).collect();
        let forged = service.issue("mallory", Duration::minutes(5)).unwrap();
        parts[1] = forged.token.split('.').nth(1).unwrap().to_string();
        let tampered = parts.join(".");

        assert!(matches!(service.verify(&tampered), Err(TokenError::Invalid(_))));
        assert!(service.verify("not-a-token").is_err());
    }

    #[test]
    fn test_wrong_issuer_is_rejected() {
        let mut config = TokenConfig::new(SECRET);
        config.issuer = "someone-else".to_string();
        let foreign = TokenService::new(config).unwrap();
        let issued = foreign.issue("alice", Duration::minutes(5)).unwrap();

        assert!(matches!(service().verify(&issued.token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_invalidate_produces_expired_token() {
        let service = service();
        let issued = service.issue("alice", Duration::minutes(60)).unwrap();

        let logged_out = service.invalidate(&issued.token).unwrap();
        assert!(logged_out.expires_at <= Utc::now());
        assert!(matches!(service.verify(&logged_out.token), Err(TokenError::Expired)));

        // No revocation list: the original copy stays valid
        assert_eq!(service.verify(&issued.token).unwrap(), "alice");
    }

    #[test]
    fn test_invalidate_expired_token_fails() {
        let service = service();
        let issued = service.issue("alice", Duration::seconds(-10)).unwrap();

        assert!(matches!(service.invalidate(&issued.token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_parse_algorithm() {
        assert_eq!(parse_algorithm("HS256").unwrap(), Algorithm::HS256);
        assert_eq!(parse_algorithm("HS384").unwrap(), Algorithm::HS384);
        assert_eq!(parse_algorithm("HS512").unwrap(), Algorithm::HS512);
        assert!(matches!(parse_algorithm("RS256"), Err(TokenError::UnsupportedAlgorithm(_))));
        assert!(matches!(parse_algorithm("nope"), Err(TokenError::UnsupportedAlgorithm(_))));
    }

    #[test]
    fn test_hs512_round_trip() {
        let config = TokenConfig::new(SECRET).with_algorithm("HS512").unwrap();
        let service = TokenService::new(config).unwrap();
        let issued = service.issue("carol", Duration::minutes(1)).unwrap();

        assert_eq!(service.verify(&issued.token).unwrap(), "carol");
    }

    #[test]
    fn test_non_hmac_algorithm_rejected_at_construction() {
        let mut config = TokenConfig::new(SECRET);
        config.algorithm = Algorithm::RS256;
        assert!(TokenService::new(config).is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let rendered = format!("{:?}", TokenConfig::new(SECRET));
        assert!(!rendered.contains(SECRET));
        assert!(rendered.contains("<redacted>"));
    }
}
