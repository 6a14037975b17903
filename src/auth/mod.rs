//! Authentication and authorization.
//!
//! JWT bearer tokens (HS256) issued at login. The auth middleware accepts the
//! token from the `Authorization: Bearer` header or a `?token=` query
//! parameter so printable receipts can be opened in a new browser tab.
//! Role-based access control knows two roles: OWNER and KASIR.

use async_trait::async_trait;
use axum::{
    extract::Request,
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::EntityTrait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::user;
use crate::errors::ServiceError;
use crate::models::Role;

/// Claim structure for JWT tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,  // Subject (user ID)
    pub role: String, // OWNER or KASIR
    pub iat: i64,     // Issued at time
    pub exp: i64,     // Expiration time
}

/// Authenticated user data, loaded from the database on every request
/// so deactivated accounts lose access immediately.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
    pub name: String,
    pub role: String,
}

impl AuthUser {
    pub fn has_role(&self, role: Role) -> bool {
        self.role == role.to_string()
    }

    pub fn is_owner(&self) -> bool {
        self.has_role(Role::Owner)
    }
}

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_expiration: Duration,
}

impl AuthConfig {
    pub fn new(jwt_secret: String, token_expiration: Duration) -> Self {
        Self {
            jwt_secret,
            token_expiration,
        }
    }
}

/// Authentication service that handles credential checks and token issuance
#[derive(Debug, Clone)]
pub struct AuthService {
    pub config: AuthConfig,
    pub db: Arc<DbPool>,
}

impl AuthService {
    pub fn new(config: AuthConfig, db: Arc<DbPool>) -> Self {
        Self { config, db }
    }

    /// Verify a username/password pair against the users table.
    /// Wrong username, wrong password and inactive accounts are
    /// indistinguishable to the caller apart from the inactive message.
    pub async fn verify_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<user::Model, ServiceError> {
        use sea_orm::{ColumnTrait, QueryFilter};

        let user = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&*self.db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                ServiceError::Unauthorized("Username atau password salah".to_string())
            })?;

        let valid = bcrypt::verify(password, &user.password_hash)
            .map_err(|e| ServiceError::HashError(e.to_string()))?;
        if !valid {
            return Err(ServiceError::Unauthorized(
                "Username atau password salah".to_string(),
            ));
        }

        if !user.is_active {
            return Err(ServiceError::Unauthorized(
                "Akun Anda tidak aktif".to_string(),
            ));
        }

        Ok(user)
    }

    /// Generate a JWT token for a user
    pub fn generate_token(&self, user: &user::Model) -> Result<String, ServiceError> {
        let now = Utc::now();
        let exp = now
            + ChronoDuration::from_std(self.config.token_expiration)
                .map_err(|_| ServiceError::InternalError("Invalid token duration".to_string()))?;

        let claims = Claims {
            sub: user.id.to_string(),
            role: user.role.clone(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| ServiceError::JwtError(e.to_string()))
    }

    /// Validate a JWT token and extract the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })?
        .claims;

        Ok(claims)
    }

    /// Validate a token and load the matching active user from the database
    pub async fn authenticate(&self, token: &str) -> Result<AuthUser, AuthError> {
        let claims = self.validate_token(token)?;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;

        let user = user::Entity::find_by_id(user_id)
            .one(&*self.db)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?
            .ok_or(AuthError::UserNotFound)?;

        if !user.is_active {
            return Err(AuthError::InactiveUser);
        }

        Ok(AuthUser {
            id: user.id,
            username: user.username,
            name: user.name,
            role: user.role,
        })
    }

    /// Hash a password for storage
    pub fn hash_password(&self, password: &str) -> Result<String, ServiceError> {
        bcrypt::hash(password, 10).map_err(|e| ServiceError::HashError(e.to_string()))
    }
}

/// Authentication error types
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Token tidak ditemukan")]
    MissingToken,

    #[error("Token tidak valid")]
    InvalidToken,

    #[error("Token sudah kedaluwarsa")]
    TokenExpired,

    #[error("Pengguna tidak ditemukan")]
    UserNotFound,

    #[error("Akun Anda tidak aktif")]
    InactiveUser,

    #[error("Akses ditolak. Hanya owner yang diizinkan")]
    OwnerOnly,

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingToken
            | Self::InvalidToken
            | Self::TokenExpired
            | Self::UserNotFound
            | Self::InactiveUser => StatusCode::UNAUTHORIZED,
            Self::OwnerOnly => StatusCode::FORBIDDEN,
            Self::DatabaseError(_) | Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "auth failure");
            "Terjadi kesalahan pada server".to_string()
        } else {
            self.to_string()
        };

        let body = Json(serde_json::json!({
            "success": false,
            "message": message,
        }));

        (status, body).into_response()
    }
}

/// Pull a bearer token out of the Authorization header or the `token`
/// query parameter.
fn extract_token(request: &Request) -> Option<String> {
    if let Some(auth_header) = request.headers().get(header::AUTHORIZATION) {
        if let Ok(auth_value) = auth_header.to_str() {
            if let Some(token) = auth_value.strip_prefix("Bearer ") {
                return Some(token.trim().to_string());
            }
        }
    }

    request
        .uri()
        .query()
        .and_then(|query| {
            query
                .split('&')
                .find_map(|pair| pair.strip_prefix("token="))
        })
        .filter(|token| !token.is_empty())
        .map(|token| token.to_string())
}

/// Authentication middleware that validates the token and stashes the
/// resolved user in the request extensions.
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let auth_service = match request.extensions().get::<Arc<AuthService>>() {
        Some(service) => service.clone(),
        None => {
            return AuthError::InternalError("Authentication service not available".to_string())
                .into_response();
        }
    };

    let token = match extract_token(&request) {
        Some(token) => token,
        None => return AuthError::MissingToken.into_response(),
    };

    match auth_service.authenticate(&token).await {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// Role middleware restricting a route group to OWNER accounts
pub async fn owner_middleware(request: Request, next: Next) -> Result<Response, AuthError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or(AuthError::MissingToken)?;

    if !user.is_owner() {
        return Err(AuthError::OwnerOnly);
    }

    Ok(next.run(request).await)
}

#[async_trait]
impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AuthError::MissingToken)
    }
}

/// Extractor that additionally requires the OWNER role. Used on routes
/// whose path is shared with KASIR-accessible methods, where group-level
/// middleware cannot apply.
#[derive(Debug, Clone)]
pub struct OwnerUser(pub AuthUser);

#[async_trait]
impl<S> axum::extract::FromRequestParts<S> for OwnerUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AuthError::MissingToken)?;

        if !user.is_owner() {
            return Err(AuthError::OwnerOnly);
        }

        Ok(OwnerUser(user))
    }
}

/// Extension methods for Router to add auth middleware
pub trait AuthRouterExt {
    fn with_auth(self) -> Self;
    fn with_owner(self) -> Self;
}

impl<S> AuthRouterExt for axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_auth(self) -> Self {
        self.layer(axum::middleware::from_fn(auth_middleware))
    }

    fn with_owner(self) -> Self {
        self.layer(axum::middleware::from_fn(owner_middleware))
            .with_auth()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> AuthService {
        AuthService::new(
            AuthConfig::new(
                "test_secret_key_for_token_round_trips_only".to_string(),
                Duration::from_secs(3600),
            ),
            Arc::new(sea_orm::DatabaseConnection::Disconnected),
        )
    }

    fn test_user(role: &str) -> user::Model {
        user::Model {
            id: Uuid::new_v4(),
            username: "kasir1".to_string(),
            password_hash: String::new(),
            name: "Kasir Satu".to_string(),
            email: None,
            role: role.to_string(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn token_round_trip_preserves_claims() {
        let service = test_service();
        let user = test_user("KASIR");

        let token = service.generate_token(&user).unwrap();
        let claims = service.validate_token(&token).unwrap();

        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.role, "KASIR");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn tampered_token_is_rejected() {
        let service = test_service();
        let user = test_user("OWNER");

        let mut token = service.generate_token(&user).unwrap();
        token.push('x');
        assert!(matches!(
            service.validate_token(&token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn owner_role_check() {
        let owner = AuthUser {
            id: Uuid::new_v4(),
            username: "owner".into(),
            name: "Owner".into(),
            role: "OWNER".into(),
        };
        let kasir = AuthUser {
            id: Uuid::new_v4(),
            username: "kasir".into(),
            name: "Kasir".into(),
            role: "KASIR".into(),
        };
        assert!(owner.is_owner());
        assert!(!kasir.is_owner());
    }
}
