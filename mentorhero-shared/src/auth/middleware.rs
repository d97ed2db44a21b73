/// Authentication middleware for Axum
///
/// Validates `Authorization: Bearer <token>` headers on protected routes
/// and places the verified identity into request extensions as an
/// [`AuthContext`]. There is exactly one credential type (the session JWT),
/// and every verification failure maps to 401 so callers cannot
/// distinguish missing, malformed, and expired tokens.
///
/// # Example
///
/// ```no_run
/// use axum::{middleware, routing::get, Extension, Router};
/// use mentorhero_shared::auth::middleware::{create_jwt_middleware, AuthContext};
///
/// async fn protected_handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("Hello, {}!", auth.username)
/// }
///
/// let app: Router = Router::new()
///     .route("/protected", get(protected_handler))
///     .layer(middleware::from_fn(create_jwt_middleware("your-jwt-secret")));
/// ```

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::jwt::{validate_token, Claims, JwtError};
use crate::models::user::UserRole;

/// Authentication context added to request extensions
///
/// Handlers extract it with Axum's `Extension` extractor; its contents come
/// from the verified token claims, never from request data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Username from the token
    pub username: String,

    /// Role from the token, used for endpoint gating
    pub role: UserRole,
}

impl AuthContext {
    /// Creates auth context from validated JWT claims
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            user_id: claims.sub,
            username: claims.username.clone(),
            role: claims.role,
        }
    }
}

/// Error type for authentication middleware
///
/// Every variant renders as 401 with a JSON `{"message": ...}` body.
#[derive(Debug)]
pub enum AuthError {
    /// Missing authorization header
    MissingCredentials,

    /// Authorization header is not a Bearer token
    InvalidFormat,

    /// Token validation failed
    InvalidToken(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match self {
            AuthError::MissingCredentials => "Missing authentication token".to_string(),
            AuthError::InvalidFormat => "Expected Bearer token".to_string(),
            AuthError::InvalidToken(msg) => msg,
        };

        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": message })),
        )
            .into_response()
    }
}

/// JWT authentication middleware
///
/// # Errors
///
/// Returns 401 Unauthorized if the Authorization header is missing, is not
/// a Bearer token, or the token fails validation (bad signature, expired,
/// wrong issuer).
pub async fn jwt_auth_middleware(
    secret: String,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidFormat)?;

    let claims = validate_token(token, &secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        JwtError::InvalidIssuer { .. } => AuthError::InvalidToken("Invalid issuer".to_string()),
        _ => AuthError::InvalidToken("Invalid token".to_string()),
    })?;

    let auth_context = AuthContext::from_claims(&claims);
    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}

/// Creates a JWT authentication middleware closure
///
/// Captures the secret so the middleware can be attached with
/// `axum::middleware::from_fn` without threading application state through.
pub fn create_jwt_middleware(
    secret: impl Into<String>,
) -> impl Fn(
    Request,
    Next,
) -> std::pin::Pin<
    Box<dyn std::future::Future<Output = Result<Response, AuthError>> + Send>,
> + Clone {
    let secret = secret.into();
    move |req, next| {
        let secret = secret.clone();
        Box::pin(jwt_auth_middleware(secret, req, next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, middleware::from_fn, routing::get, Extension, Router};
    use tower::ServiceExt;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_auth_context_from_claims() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, "ana1".to_string(), UserRole::Tutor);

        let context = AuthContext::from_claims(&claims);

        assert_eq!(context.user_id, user_id);
        assert_eq!(context.username, "ana1");
        assert_eq!(context.role, UserRole::Tutor);
    }

    #[test]
    fn test_auth_error_responses_are_all_401() {
        for err in [
            AuthError::MissingCredentials,
            AuthError::InvalidFormat,
            AuthError::InvalidToken("Token expired".to_string()),
        ] {
            let response = err.into_response();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
    }

    fn test_app() -> Router {
        async fn handler(Extension(auth): Extension<AuthContext>) -> String {
            auth.username
        }

        Router::new()
            .route("/protected", get(handler))
            .layer(from_fn(create_jwt_middleware(SECRET)))
    }

    #[tokio::test]
    async fn test_missing_header_is_rejected() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .uri("/protected")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_non_bearer_header_is_rejected() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .uri("/protected")
                    .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_valid_token_reaches_handler() {
        let claims = Claims::new(Uuid::new_v4(), "maria".to_string(), UserRole::Learner);
        let token = crate::auth::jwt::create_token(&claims, SECRET).unwrap();

        let response = test_app()
            .oneshot(
                Request::builder()
                    .uri("/protected")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_tampered_token_is_rejected() {
        let claims = Claims::new(Uuid::new_v4(), "maria".to_string(), UserRole::Learner);
        let token = crate::auth::jwt::create_token(&claims, "some-other-secret-32-bytes-long!").unwrap();

        let response = test_app()
            .oneshot(
                Request::builder()
                    .uri("/protected")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
