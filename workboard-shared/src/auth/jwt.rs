/// JWT issuance and validation
///
/// Tokens are HS256 signed. Access and refresh tokens use separate secrets
/// and lifetimes, both carried by [`JwtSettings`].
///
/// # Claims
///
/// - `sub`: user id
/// - `iss`: always `"workboard"`
/// - `iat` / `nbf` / `exp`: Unix timestamps
/// - `jti`: random id, so two tokens minted in the same second differ
/// - `token_type`: `"access"` or `"refresh"`
///
/// # Example
///
/// ```
/// use chrono::Duration;
/// use workboard_shared::auth::jwt::{JwtSettings, TokenType};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let settings = JwtSettings::new(
///     "access-secret",
///     "refresh-secret",
///     Duration::minutes(15),
///     Duration::days(7),
/// );
///
/// let (token, _) = settings.issue(42, TokenType::Access)?;
/// let claims = settings.validate_access_token(&token)?;
/// assert_eq!(claims.sub, 42);
/// # Ok(())
/// # }
/// ```

use std::fmt;

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const ISSUER: &str = "workboard";

/// Longest accepted token lifetime
pub const MAX_TTL_DAYS: i64 = 3650;

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Failed to create token: {0}")]
    CreateError(String),

    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    #[error("Token has expired")]
    Expired,

    /// Malformed token or lifetime string
    #[error("Invalid token format: {0}")]
    InvalidFormat(String),

    #[error("Invalid issuer: expected {expected}")]
    InvalidIssuer { expected: String },

    /// Valid token of the other kind
    #[error("Expected {expected} token")]
    WrongTokenType { expected: TokenType },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: i64,

    pub iss: String,

    pub iat: i64,

    pub exp: i64,

    pub nbf: i64,

    pub jti: Uuid,

    pub token_type: TokenType,
}

impl Claims {
    /// Creates claims valid from now for `ttl`
    pub fn new(user_id: i64, token_type: TokenType, ttl: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: now
                .checked_add_signed(ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC)
                .timestamp(),
            nbf: now.timestamp(),
            jti: Uuid::new_v4(),
            token_type,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }

    /// Expiry as a timestamp, for persisting refresh tokens
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// Signs `claims` with `secret`
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Verifies signature, expiry, `nbf` and issuer, and returns the claims
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer {
            expected: ISSUER.to_string(),
        },
        jsonwebtoken::errors::ErrorKind::InvalidToken => JwtError::InvalidFormat(e.to_string()),
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}

/// Parses a token lifetime such as `15m`, `7d`, `12h`, `30s` or `3600`
///
/// A bare number is read as seconds. The value must be positive and at most
/// [`MAX_TTL_DAYS`] days.
pub fn parse_ttl(value: &str) -> Result<Duration, JwtError> {
    let value = value.trim();
    let invalid = || JwtError::InvalidFormat(format!("invalid token lifetime '{}'", value));

    let (digits, unit) = match value.char_indices().last() {
        Some((idx, c)) if c.is_ascii_alphabetic() => (&value[..idx], Some(c.to_ascii_lowercase())),
        Some(_) => (value, None),
        None => return Err(invalid()),
    };

    let amount: i64 = digits.parse().map_err(|_| invalid())?;
    if amount <= 0 {
        return Err(invalid());
    }

    let ttl = match unit {
        None | Some('s') => Duration::try_seconds(amount),
        Some('m') => Duration::try_minutes(amount),
        Some('h') => Duration::try_hours(amount),
        Some('d') => Duration::try_days(amount),
        Some(_) => None,
    }
    .ok_or_else(invalid)?;

    if ttl > Duration::days(MAX_TTL_DAYS) {
        return Err(invalid());
    }

    Ok(ttl)
}

/// Secrets and lifetimes for both token kinds
#[derive(Clone)]
pub struct JwtSettings {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtSettings")
            .field("access_secret", &"<redacted>")
            .field("refresh_secret", &"<redacted>")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

impl JwtSettings {
    pub fn new(
        access_secret: impl Into<String>,
        refresh_secret: impl Into<String>,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            access_ttl,
            refresh_ttl,
        }
    }

    fn secret(&self, token_type: TokenType) -> &str {
        match token_type {
            TokenType::Access => &self.access_secret,
            TokenType::Refresh => &self.refresh_secret,
        }
    }

    fn ttl(&self, token_type: TokenType) -> Duration {
        match token_type {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        }
    }

    /// Mints a token for `user_id`, returning it with its claims
    pub fn issue(&self, user_id: i64, token_type: TokenType) -> Result<(String, Claims), JwtError> {
        let claims = Claims::new(user_id, token_type, self.ttl(token_type));
        let token = create_token(&claims, self.secret(token_type))?;
        Ok((token, claims))
    }

    fn validate(&self, token: &str, expected: TokenType) -> Result<Claims, JwtError> {
        let claims = validate_token(token, self.secret(expected))?;

        if claims.token_type != expected {
            return Err(JwtError::WrongTokenType { expected });
        }

        Ok(claims)
    }

    pub fn validate_access_token(&self, token: &str) -> Result<Claims, JwtError> {
        self.validate(token, TokenType::Access)
    }

    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims, JwtError> {
        self.validate(token, TokenType::Refresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> JwtSettings {
        JwtSettings::new(
            "test-access-secret-at-least-32-bytes",
            "test-refresh-secret-at-least-32-bytes",
            Duration::minutes(15),
            Duration::days(7),
        )
    }

    #[test]
    fn test_claims_creation() {
        let claims = Claims::new(7, TokenType::Access, Duration::hours(1));

        assert_eq!(claims.sub, 7);
        assert_eq!(claims.iss, "workboard");
        assert_eq!(claims.exp - claims.iat, 3600);
        assert!(!claims.is_expired());
        assert_eq!(claims.expires_at().timestamp(), claims.exp);
    }

    #[test]
    fn test_jti_is_unique() {
        let a = Claims::new(1, TokenType::Refresh, Duration::days(1));
        let b = Claims::new(1, TokenType::Refresh, Duration::days(1));
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn test_issue_and_validate() {
        let settings = settings();

        let (access, _) = settings.issue(5, TokenType::Access).unwrap();
        let (refresh, refresh_claims) = settings.issue(5, TokenType::Refresh).unwrap();

        assert_eq!(settings.validate_access_token(&access).unwrap().sub, 5);
        assert_eq!(settings.validate_refresh_token(&refresh).unwrap(), refresh_claims);
    }

    #[test]
    fn test_token_types_do_not_cross() {
        let settings = settings();
        let (access, _) = settings.issue(5, TokenType::Access).unwrap();
        let (refresh, _) = settings.issue(5, TokenType::Refresh).unwrap();

        // Different secrets, so the signature check fails first
        assert!(settings.validate_refresh_token(&access).is_err());
        assert!(settings.validate_access_token(&refresh).is_err());
    }

    #[test]
    fn test_wrong_type_with_shared_secret() {
        let settings = JwtSettings::new("same", "same", Duration::minutes(1), Duration::days(1));
        let (refresh, _) = settings.issue(1, TokenType::Refresh).unwrap();

        let err = settings.validate_access_token(&refresh).unwrap_err();
        assert!(matches!(
            err,
            JwtError::WrongTokenType {
                expected: TokenType::Access
            }
        ));
    }

    #[test]
    fn test_validate_with_wrong_secret() {
        let claims = Claims::new(1, TokenType::Access, Duration::hours(1));
        let token = create_token(&claims, "secret1").unwrap();

        assert!(validate_token(&token, "wrong-secret").is_err());
    }

    #[test]
    fn test_validate_expired_token() {
        let claims = Claims::new(1, TokenType::Access, Duration::seconds(-3600));
        assert!(claims.is_expired());

        let token = create_token(&claims, "secret").unwrap();
        assert!(matches!(validate_token(&token, "secret"), Err(JwtError::Expired)));
    }

    #[test]
    fn test_validate_garbage() {
        assert!(validate_token("not.a.token", "secret").is_err());
        assert!(validate_token("", "secret").is_err());
    }

    #[test]
    fn test_parse_ttl() {
        assert_eq!(parse_ttl("15m").unwrap(), Duration::minutes(15));
        assert_eq!(parse_ttl("7d").unwrap(), Duration::days(7));
        assert_eq!(parse_ttl("12h").unwrap(), Duration::hours(12));
        assert_eq!(parse_ttl("30s").unwrap(), Duration::seconds(30));
        assert_eq!(parse_ttl("3600").unwrap(), Duration::seconds(3600));
        assert_eq!(parse_ttl(" 1D ").unwrap(), Duration::days(1));

        assert!(parse_ttl("").is_err());
        assert!(parse_ttl("m").is_err());
        assert!(parse_ttl("0").is_err());
        assert!(parse_ttl("-5m").is_err());
        assert!(parse_ttl("10w").is_err());
        assert!(parse_ttl("ten").is_err());
    }

    #[test]
    fn test_parse_ttl_rejects_oversized_lifetimes() {
        assert_eq!(parse_ttl("3650d").unwrap(), Duration::days(MAX_TTL_DAYS));
        assert!(parse_ttl("3651d").is_err());
        assert!(parse_ttl("9999999999999d").is_err());
        assert!(parse_ttl("9999999999999999h").is_err());
        assert!(matches!(parse_ttl("9223372036854775807s"), Err(JwtError::InvalidFormat(_))));
    }

    #[test]
    fn test_claims_expiry_saturates() {
        let claims = Claims::new(7, TokenType::Access, Duration::days(365 * 1_000_000));

        assert_eq!(claims.exp, DateTime::<Utc>::MAX_UTC.timestamp());
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_settings_debug_redacts_secrets() {
        let rendered = format!("{:?}", settings());
        assert!(!rendered.contains("test-access-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
