use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

pub const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub role: Option<String>,
}

impl Claims {
    /// Subject as a user id, when the token carries one.
    pub fn user_id(&self) -> Option<Uuid> {
        self.sub.parse().ok()
    }

    pub fn is_admin(&self) -> bool {
        self.role
            .as_deref()
            .is_some_and(|r| r.eq_ignore_ascii_case(ADMIN_ROLE))
    }
}

fn reject(status: StatusCode, code: &str) -> Response {
    (status, Json(json!({ "error": code }))).into_response()
}

fn bearer_claims(req: &Request) -> Result<Claims, Response> {
    let Some(auth_header) = req.headers().get(axum::http::header::AUTHORIZATION) else {
        return Err(reject(StatusCode::UNAUTHORIZED, "missing_authorization"));
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return Err(reject(StatusCode::UNAUTHORIZED, "bad_authorization"));
    };
    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return Err(reject(StatusCode::UNAUTHORIZED, "unsupported_scheme"));
    };

    let config = crate::config::get_config();
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| reject(StatusCode::UNAUTHORIZED, "invalid_token"))
}

/// Admin-only routes: a valid bearer token whose `role` claim is `admin`.
pub async fn require_admin(mut req: Request, next: Next) -> Response {
    let claims = match bearer_claims(&req) {
        Ok(claims) => claims,
        Err(response) => return response,
    };
    if !claims.is_admin() {
        tracing::warn!(sub = %claims.sub, role = ?claims.role, "non-admin token rejected");
        return reject(StatusCode::FORBIDDEN, "forbidden");
    }
    req.extensions_mut().insert(claims);
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(sub: &str, role: Option<&str>) -> Claims {
        Claims {
            sub: sub.to_string(),
            exp: 0,
            role: role.map(str::to_string),
        }
    }

    #[test]
    fn admin_role_is_case_insensitive() {
        assert!(claims("x", Some("Admin")).is_admin());
        assert!(!claims("x", Some("editor")).is_admin());
        assert!(!claims("x", None).is_admin());
    }

    #[test]
    fn subject_parses_as_user_id_when_possible() {
        let id = Uuid::new_v4();
        assert_eq!(claims(&id.to_string(), None).user_id(), Some(id));
        assert_eq!(claims("service-account", None).user_id(), None);
    }
}
