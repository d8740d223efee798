/*!
 * # Authentication Module
 *
 * Per-user JWT authentication for the reseller API. Accounts are stored in
 * the `users` table with argon2 password hashes; every protected endpoint
 * resolves the bearer token to an [`AuthUser`] whose id scopes all data
 * access.
 */

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::config::AppConfig;
use crate::entities::user;

/// Claim structure for JWT tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,   // Subject (user ID)
    pub name: String,  // User's display name
    pub email: String, // User's email
    pub jti: String,   // JWT ID (unique identifier for this token)
    pub iat: i64,      // Issued at time
    pub exp: i64,      // Expiration time
    pub nbf: i64,      // Not valid before time
    pub iss: String,   // Issuer
    pub aud: String,   // Audience
}

/// Authenticated user data extracted from the JWT token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub token_id: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AuthError::MissingAuth)
    }
}

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_expiration_secs: usize,
    pub issuer: String,
    pub audience: String,
}

impl AuthConfig {
    pub fn from_app_config(cfg: &AppConfig) -> Self {
        Self {
            jwt_secret: cfg.jwt_secret.clone(),
            token_expiration_secs: cfg.jwt_expiration,
            issuer: cfg.auth_issuer.clone(),
            audience: cfg.auth_audience.clone(),
        }
    }
}

/// Issues and validates tokens, and manages user accounts.
pub struct AuthService {
    config: AuthConfig,
    db: Arc<DatabaseConnection>,
}

impl AuthService {
    pub fn new(config: AuthConfig, db: Arc<DatabaseConnection>) -> Self {
        Self { config, db }
    }

    /// Registers a new account and returns it with a fresh access token.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(
        &self,
        request: RegisterRequest,
    ) -> Result<(user::Model, AccessToken), AuthError> {
        request
            .validate()
            .map_err(|e| AuthError::InvalidRequest(e.to_string()))?;

        let existing = user::Entity::find()
            .filter(user::Column::Email.eq(request.email.as_str()))
            .one(&*self.db)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;
        if existing.is_some() {
            return Err(AuthError::EmailInUse);
        }

        let password_hash = self.hash_password(&request.password)?;
        let now = Utc::now();

        let account = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(request.email),
            name: Set(request.name),
            password_hash: Set(password_hash),
            created_at: Set(now),
            updated_at: Set(None),
        }
        .insert(&*self.db)
        .await
        .map_err(|e| {
            error!("Failed to insert user account: {}", e);
            AuthError::DatabaseError(e.to_string())
        })?;

        let token = self.generate_token(&account)?;
        Ok((account, token))
    }

    /// Verifies credentials and returns an access token.
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn login(
        &self,
        credentials: LoginCredentials,
    ) -> Result<(user::Model, AccessToken), AuthError> {
        let account = user::Entity::find()
            .filter(user::Column::Email.eq(credentials.email.as_str()))
            .one(&*self.db)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?
            .ok_or(AuthError::InvalidCredentials)?;

        self.verify_password(&credentials.password, &account.password_hash)?;

        let token = self.generate_token(&account)?;
        Ok((account, token))
    }

    /// Loads the account behind an already-validated token.
    pub async fn get_user(&self, user_id: Uuid) -> Result<user::Model, AuthError> {
        user::Entity::find_by_id(user_id)
            .one(&*self.db)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?
            .ok_or(AuthError::UserNotFound)
    }

    /// Generates a signed access token for the given account.
    pub fn generate_token(&self, account: &user::Model) -> Result<AccessToken, AuthError> {
        let now = Utc::now();
        let expires_at = now + ChronoDuration::seconds(self.config.token_expiration_secs as i64);

        let claims = Claims {
            sub: account.id.to_string(),
            name: account.name.clone(),
            email: account.email.clone(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            nbf: now.timestamp(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))?;

        Ok(AccessToken {
            access_token: token,
            token_type: "Bearer".to_string(),
            expires_in: self.config.token_expiration_secs as u64,
        })
    }

    /// Validates a token signature and standard claims.
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&[&self.config.audience]);

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => {
                debug!("Token validation failed: {}", e);
                AuthError::InvalidToken
            }
        })?;

        Ok(token_data.claims)
    }

    fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::InternalError(format!("Password hashing failed: {}", e)))
    }

    fn verify_password(&self, password: &str, stored_hash: &str) -> Result<(), AuthError> {
        let parsed = PasswordHash::new(stored_hash)
            .map_err(|e| AuthError::InternalError(format!("Stored hash is malformed: {}", e)))?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| AuthError::InvalidCredentials)
    }
}

/// Issued access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Registration payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "A valid email address is required"))]
    pub email: String,
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Login payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

/// Account data safe to expose over HTTP
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<user::Model> for UserProfile {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            name: model.name,
            created_at: model.created_at,
        }
    }
}

/// Response for register/login: the account plus its token
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: UserProfile,
    pub token: AccessToken,
}

/// Authentication error types
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing authentication")]
    MissingAuth,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Token creation failed: {0}")]
    TokenCreation(String),

    #[error("Email is already registered")]
    EmailInUse,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("User not found")]
    UserNotFound,

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_code, error_message): (StatusCode, &str, String) = match &self {
            Self::MissingAuth => (
                StatusCode::UNAUTHORIZED,
                "AUTH_MISSING",
                "Authentication required".to_string(),
            ),
            Self::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "AUTH_INVALID_CREDENTIALS",
                "Invalid credentials".to_string(),
            ),
            Self::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "AUTH_INVALID_TOKEN",
                "Invalid authentication token".to_string(),
            ),
            Self::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                "AUTH_TOKEN_EXPIRED",
                "Authentication token has expired".to_string(),
            ),
            Self::EmailInUse => (
                StatusCode::CONFLICT,
                "AUTH_EMAIL_IN_USE",
                "Email is already registered".to_string(),
            ),
            Self::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "AUTH_INVALID_REQUEST", msg.clone())
            }
            Self::UserNotFound => (
                StatusCode::NOT_FOUND,
                "AUTH_USER_NOT_FOUND",
                "User not found".to_string(),
            ),
            Self::TokenCreation(_) | Self::DatabaseError(_) | Self::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "AUTH_INTERNAL_ERROR",
                "Internal authentication error".to_string(),
            ),
        };

        let body = serde_json::json!({
            "error": {
                "code": error_code,
                "message": error_message,
            }
        });

        (status, Json(body)).into_response()
    }
}

/// Middleware resolving the bearer token into an [`AuthUser`] extension.
///
/// Expects `Arc<AuthService>` to be present in the request extensions,
/// inserted by an outer `Extension` layer.
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let headers = request.headers().clone();

    let auth_service = match request.extensions().get::<Arc<AuthService>>() {
        Some(service) => service.clone(),
        None => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Authentication service not available",
            )
                .into_response();
        }
    };

    match extract_auth_from_headers(&headers, &auth_service) {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// Extract authentication info from request headers
fn extract_auth_from_headers(
    headers: &HeaderMap,
    auth_service: &AuthService,
) -> Result<AuthUser, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuth)?;
    let auth_value = auth_header.to_str().map_err(|_| AuthError::InvalidToken)?;
    if !auth_value.starts_with("Bearer ") {
        return Err(AuthError::MissingAuth);
    }

    let token = auth_value.trim_start_matches("Bearer ").trim();
    let claims = auth_service.validate_token(token)?;
    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;

    Ok(AuthUser {
        user_id,
        name: claims.name,
        email: claims.email,
        token_id: claims.jti,
    })
}

/// Authentication routes
pub fn auth_routes() -> axum::Router<Arc<AuthService>> {
    axum::Router::new()
        .route("/register", axum::routing::post(register_handler))
        .route("/login", axum::routing::post(login_handler))
        .route("/me", axum::routing::get(me_handler))
}

/// Register handler
pub async fn register_handler(
    State(auth_service): State<Arc<AuthService>>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AuthError> {
    let (account, token) = auth_service.register(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: account.into(),
            token,
        }),
    ))
}

/// Login handler
pub async fn login_handler(
    State(auth_service): State<Arc<AuthService>>,
    Json(credentials): Json<LoginCredentials>,
) -> Result<Json<AuthResponse>, AuthError> {
    let (account, token) = auth_service.login(credentials).await?;
    Ok(Json(AuthResponse {
        user: account.into(),
        token,
    }))
}

/// Current-user handler; resolves the bearer token itself so the route
/// works without the protected-router middleware.
pub async fn me_handler(
    State(auth_service): State<Arc<AuthService>>,
    headers: HeaderMap,
) -> Result<Json<UserProfile>, AuthError> {
    let auth_user = extract_auth_from_headers(&headers, &auth_service)?;
    let account = auth_service.get_user(auth_user.user_id).await?;
    Ok(Json(account.into()))
}
