/// Authentication utilities
///
/// Secure authentication primitives for MentorHero:
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and the registration policy
/// - [`jwt`]: session token generation and validation (HS256, 30 days)
/// - [`middleware`]: Bearer-token middleware and the request `AuthContext`
///
/// # Security Features
///
/// - **Password Hashing**: Argon2id with 64 MB memory, 3 iterations,
///   per-user random salt
/// - **Session Tokens**: HS256 signing, issuer-pinned, 30-day expiration
/// - **Constant-time Comparison**: verification uses constant-time
///   operations inside the argon2 crate
///
/// # Example
///
/// ```no_run
/// use mentorhero_shared::auth::jwt::{create_token, Claims};
/// use mentorhero_shared::auth::password::{hash_password, verify_password};
/// use mentorhero_shared::models::user::UserRole;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let claims = Claims::new(Uuid::new_v4(), "ana1".to_string(), UserRole::Tutor);
/// let token = create_token(&claims, "secret-key-at-least-32-bytes-long")?;
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod middleware;
pub mod password;
