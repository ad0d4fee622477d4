/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing
/// - [`jwt`]: access/refresh token issuance and validation
/// - [`middleware`]: Axum bearer-token middleware and the [`middleware::AuthContext`] extractor
/// - [`authorization`]: membership and role checks against the store
///
/// # Example
///
/// ```
/// use chrono::Duration;
/// use workboard_shared::auth::jwt::{JwtSettings, TokenType};
/// use workboard_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let settings = JwtSettings::new("access", "refresh", Duration::minutes(15), Duration::days(7));
/// let (token, claims) = settings.issue(1, TokenType::Access)?;
/// assert_eq!(settings.validate_access_token(&token)?.jti, claims.jti);
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
