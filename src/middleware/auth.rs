use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::routes::AppState;

/// Roles that may see and edit every session.
const PRIVILEGED_ROLES: &[&str] = &["ADMINISTRADOR", "ADMIN"];

/// Access token claims. Tokens are issued by the external auth service.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // user id
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub roles: Vec<String>,
    pub exp: i64,
    pub iat: i64,
}

/// Authenticated caller identity.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub name: String,
    pub roles: Vec<String>,
}

impl AuthUser {
    pub fn is_privileged(&self) -> bool {
        self.roles
            .iter()
            .any(|r| PRIVILEGED_ROLES.contains(&r.trim().to_uppercase().as_str()))
    }

    /// Owners and privileged callers may touch a session.
    pub fn can_access(&self, creator_id: &str) -> bool {
        self.is_privileged() || self.user_id == creator_id
    }
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        let name = if claims.name.trim().is_empty() {
            claims.sub.clone()
        } else {
            claims.name
        };
        Self {
            user_id: claims.sub,
            name,
            roles: claims.roles,
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(AuthError::MissingToken)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidToken)?;

        let claims = verify_access_token(token, &state.jwt_secret)?;

        Ok(AuthUser::from(claims))
    }
}

#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    ExpiredToken,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AuthError::MissingToken => (
                StatusCode::UNAUTHORIZED,
                "missing_token",
                "Authorization token is required",
            ),
            AuthError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "invalid_token",
                "Invalid authorization token",
            ),
            AuthError::ExpiredToken => (
                StatusCode::UNAUTHORIZED,
                "expired_token",
                "Authorization token has expired",
            ),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

pub fn verify_access_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
        _ => AuthError::InvalidToken,
    })?;

    Ok(token_data.claims)
}

/// Signs a token the way the auth service does. Tests only.
#[cfg(test)]
pub fn sign_test_token(user_id: &str, name: &str, roles: &[&str], secret: &str) -> String {
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};

    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        name: name.to_string(),
        roles: roles.iter().map(|r| r.to_string()).collect(),
        iat: now.timestamp(),
        exp: (now + Duration::minutes(15)).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("test token signs")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn administrator_role_is_privileged() {
        let user = AuthUser {
            user_id: "u1".into(),
            name: "Ana".into(),
            roles: vec!["supervisor".into(), "administrador".into()],
        };
        assert!(user.is_privileged());
        assert!(user.can_access("someone-else"));
    }

    #[test]
    fn plain_user_only_reaches_own_sessions() {
        let user = AuthUser {
            user_id: "u1".into(),
            name: "Ana".into(),
            roles: vec!["SUPERVISOR".into()],
        };
        assert!(user.can_access("u1"));
        assert!(!user.can_access("u2"));
    }

    #[test]
    fn signed_token_round_trips() {
        let token = sign_test_token("u7", "Luis", &["ADMIN"], "secret");
        let claims = verify_access_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, "u7");
        assert_eq!(claims.roles, vec!["ADMIN".to_string()]);
        assert!(matches!(
            verify_access_token(&token, "other"),
            Err(AuthError::InvalidToken)
        ));
    }
}
