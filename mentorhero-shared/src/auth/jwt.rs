/// JWT token generation and validation module
///
/// Session tokens for MentorHero users. Tokens are signed with HS256
/// (HMAC-SHA256) and carry the user's identity and role so handlers never
/// re-read the users table just to authorize a call.
///
/// # Security
///
/// - **Algorithm**: HS256 (HMAC with SHA-256)
/// - **Expiration**: 30 days from issuance
/// - **Validation**: signature, expiration, not-before, and issuer checks
/// - **Secret Management**: secrets should be at least 32 bytes (256 bits)
///
/// # Example
///
/// ```
/// use mentorhero_shared::auth::jwt::{create_token, validate_token, Claims};
/// use mentorhero_shared::models::user::UserRole;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let claims = Claims::new(Uuid::new_v4(), "ana1".to_string(), UserRole::Tutor);
/// let token = create_token(&claims, "your-secret-key-at-least-32-bytes")?;
///
/// let validated = validate_token(&token, "your-secret-key-at-least-32-bytes")?;
/// assert_eq!(validated.username, "ana1");
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::UserRole;

/// Issuer written into and required from every token
pub const TOKEN_ISSUER: &str = "mentorhero";

/// How long an issued session token stays valid
pub fn token_validity() -> Duration {
    Duration::days(30)
}

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Failed to validate token
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Invalid issuer
    #[error("Invalid issuer: expected {expected}")]
    InvalidIssuer { expected: String },
}

/// JWT claims structure
///
/// # Standard Claims
///
/// - `sub`: Subject (user ID)
/// - `iss`: Issuer (always "mentorhero")
/// - `iat`: Issued at timestamp
/// - `exp`: Expiration timestamp
/// - `nbf`: Not before timestamp
///
/// # Custom Claims
///
/// - `username`: login name, shown in UI contexts
/// - `role`: Learner/Tutor/Admin, used for endpoint gating
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - User ID
    pub sub: Uuid,

    /// Issuer - Always "mentorhero"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    /// Username (custom claim)
    pub username: String,

    /// User role (custom claim)
    pub role: UserRole,
}

impl Claims {
    /// Creates new claims with the standard 30-day expiration
    ///
    /// # Example
    ///
    /// ```
    /// use mentorhero_shared::auth::jwt::Claims;
    /// use mentorhero_shared::models::user::UserRole;
    /// use uuid::Uuid;
    ///
    /// let claims = Claims::new(Uuid::new_v4(), "maria".to_string(), UserRole::Learner);
    /// assert!(!claims.is_expired());
    /// ```
    pub fn new(user_id: Uuid, username: String, role: UserRole) -> Self {
        Self::with_expiration(user_id, username, role, token_validity())
    }

    /// Creates claims with a custom expiration (tests use this to mint
    /// already-expired tokens)
    pub fn with_expiration(
        user_id: Uuid,
        username: String,
        role: UserRole,
        expires_in: Duration,
    ) -> Self {
        let now = Utc::now();
        let expiration = now + expires_in;

        Self {
            sub: user_id,
            iss: TOKEN_ISSUER.to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            nbf: now.timestamp(),
            username,
            role,
        }
    }

    /// Checks if the token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Creates a JWT token from claims
///
/// Signs the token using HS256 with the provided secret.
///
/// # Errors
///
/// Returns `JwtError::CreateError` if token encoding fails
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Validates a JWT token and extracts claims
///
/// Verifies the signature, expiration, not-before time, and that the
/// issuer is "mentorhero". Any failure is terminal; there is no fallback
/// identity.
///
/// # Errors
///
/// Returns `JwtError::Expired` for expired tokens, `JwtError::InvalidIssuer`
/// for issuer mismatches, and `JwtError::ValidationError` for everything
/// else (bad signature, malformed token, missing claims).
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[TOKEN_ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer {
            expected: TOKEN_ISSUER.to_string(),
        },
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_token_validity_is_thirty_days() {
        assert_eq!(token_validity(), Duration::days(30));
    }

    #[test]
    fn test_claims_creation() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, "ana1".to_string(), UserRole::Tutor);

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.username, "ana1");
        assert_eq!(claims.role, UserRole::Tutor);
        assert_eq!(claims.iss, TOKEN_ISSUER);
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_create_and_validate_token() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, "maria".to_string(), UserRole::Learner);
        let token = create_token(&claims, SECRET).expect("Should create token");

        let validated = validate_token(&token, SECRET).expect("Should validate token");
        assert_eq!(validated.sub, user_id);
        assert_eq!(validated.username, "maria");
        assert_eq!(validated.role, UserRole::Learner);
        assert_eq!(validated.iss, TOKEN_ISSUER);
    }

    #[test]
    fn test_validate_with_wrong_secret() {
        let claims = Claims::new(Uuid::new_v4(), "ana1".to_string(), UserRole::Tutor);
        let token = create_token(&claims, "secret1").expect("Should create token");

        let result = validate_token(&token, "wrong-secret");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_expired_token() {
        let claims = Claims::with_expiration(
            Uuid::new_v4(),
            "ana1".to_string(),
            UserRole::Tutor,
            Duration::seconds(-3600), // Negative duration = already expired
        );

        assert!(claims.is_expired());

        let token = create_token(&claims, SECRET).expect("Should create token");
        let result = validate_token(&token, SECRET);

        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), JwtError::Expired));
    }

    #[test]
    fn test_validate_wrong_issuer() {
        let mut claims = Claims::new(Uuid::new_v4(), "ana1".to_string(), UserRole::Tutor);
        claims.iss = "someone-else".to_string();

        let token = create_token(&claims, SECRET).expect("Should create token");
        let result = validate_token(&token, SECRET);

        assert!(matches!(
            result.unwrap_err(),
            JwtError::InvalidIssuer { .. }
        ));
    }

    #[test]
    fn test_validate_garbage_token() {
        let result = validate_token("not-a-jwt-at-all", SECRET);
        assert!(matches!(
            result.unwrap_err(),
            JwtError::ValidationError(_)
        ));
    }

    #[test]
    fn test_role_claim_survives_roundtrip() {
        for role in [UserRole::Learner, UserRole::Tutor, UserRole::Admin] {
            let claims = Claims::new(Uuid::new_v4(), "user".to_string(), role);
            let token = create_token(&claims, SECRET).unwrap();
            let validated = validate_token(&token, SECRET).unwrap();
            assert_eq!(validated.role, role);
        }
    }
}
