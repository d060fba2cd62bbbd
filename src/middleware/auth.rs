use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{
    authorization::{Basic, Bearer},
    Authorization, HeaderMapExt,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};

use crate::entities::user::{self, Entity as User};
use crate::error::AppError;
use crate::state::AppState;

/// The authenticated principal. Every ownership check compares against `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: i32,
    pub username: String,
}

#[derive(Serialize, Deserialize)]
struct Claims {
    sub: String,
    uid: i32,
    exp: usize,
}

pub fn issue_token(user: &user::Model, secret: &str, ttl_secs: u64) -> Result<String, AppError> {
    let expiration = chrono::Utc::now().timestamp() as usize + ttl_secs as usize;

    let claims = Claims {
        sub: user.username.clone(),
        uid: user.id,
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
    .map_err(|e| AppError::InternalServerError(format!("Token encode error: {}", e)))
}

fn verify_token(token: &str, secret: &str) -> Result<AuthUser, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!("JWT decode error: {}", e);
        AppError::Unauthorized("Invalid or expired token".to_string())
    })?;

    Ok(AuthUser {
        id: token_data.claims.uid,
        username: token_data.claims.sub,
    })
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::InternalServerError(format!("Hash error: {}", e)))
}

/// Looks up an active user and checks the password against its argon2 hash.
pub async fn verify_credentials(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
) -> Result<Option<user::Model>, AppError> {
    let Some(user) = User::find()
        .filter(user::Column::Username.eq(username))
        .filter(user::Column::IsActive.eq(true))
        .one(db)
        .await?
    else {
        return Ok(None);
    };

    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|e| AppError::InternalServerError(format!("Hash parse error: {}", e)))?;

    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
    {
        Ok(Some(user))
    } else {
        Ok(None)
    }
}

/// Accepts `Authorization: Basic` or `Authorization: Bearer <jwt>`.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_user = if let Some(Authorization(bearer)) =
        req.headers().typed_get::<Authorization<Bearer>>()
    {
        let claimed = verify_token(bearer.token(), &state.config.jwt_secret)?;
        // A deactivated account loses access before its token expires.
        let user = User::find_by_id(claimed.id)
            .filter(user::Column::IsActive.eq(true))
            .one(&state.db)
            .await?
            .ok_or_else(|| {
                tracing::debug!("Bearer token for inactive or missing user: {}", claimed.username);
                AppError::Unauthorized("User is inactive or deleted.".to_string())
            })?;
        AuthUser {
            id: user.id,
            username: user.username,
        }
    } else if let Some(Authorization(basic)) = req.headers().typed_get::<Authorization<Basic>>() {
        let user = verify_credentials(&state.db, basic.username(), basic.password())
            .await?
            .ok_or_else(|| {
                tracing::debug!("Basic auth failed for: {}", basic.username());
                AppError::Unauthorized("Invalid username/password.".to_string())
            })?;
        AuthUser {
            id: user.id,
            username: user.username,
        }
    } else {
        return Err(AppError::Unauthorized(
            "Authentication credentials were not provided.".to_string(),
        ));
    };

    req.extensions_mut().insert(auth_user);

    Ok(next.run(req).await)
}
