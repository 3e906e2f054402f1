//! 会话令牌
//!
//! 登录由外部身份提供方完成，会话以 HS256 JWT 携带身份记录。
//! WebSocket 握手从 `?token=` 读取，HTTP 接口从 `Authorization: Bearer` 读取。

use axum::http::HeaderMap;
use config::SessionConfig;
use domain::Identity;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// JWT Claims：身份记录加过期时间
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub exp: i64, // 过期时间 (Unix timestamp)
}

impl Claims {
    pub fn into_identity(self) -> Identity {
        let mut identity = Identity::new(self.id, self.name);
        identity.is_admin = self.is_admin;
        identity.group_name = self.group_name;
        identity.group_color = self.group_color;
        identity.avatar = self.avatar;
        identity
    }
}

#[derive(Clone)]
pub struct JwtService {
    config: SessionConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn new(config: SessionConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_ref());
        let decoding_key = DecodingKey::from_secret(config.secret.as_ref());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// 为身份签发会话令牌
    pub fn issue(&self, identity: &Identity) -> Result<String, ApiError> {
        let exp = chrono::Utc::now() + chrono::Duration::hours(self.config.expiration_hours);

        let claims = Claims {
            id: identity.id.clone(),
            name: identity.name.clone(),
            is_admin: identity.is_admin,
            group_name: identity.group_name.clone(),
            group_color: identity.group_color.clone(),
            avatar: identity.avatar.clone(),
            exp: exp.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|err| {
            ApiError::internal_server_error(format!("Token generation failed: {err}"))
        })
    }

    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|token_data| token_data.claims)
            .map_err(|err| ApiError::unauthorized(format!("Invalid token: {err}")))
    }

    /// 从 headers 中提取和验证 token
    pub fn identity_from_headers(&self, headers: &HeaderMap) -> Result<Identity, ApiError> {
        let auth_header = headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|header| header.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Missing authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::unauthorized("Invalid authorization header format"))?;

        Ok(self.verify(token)?.into_identity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header::AUTHORIZATION, HeaderValue};

    fn service(secret: &str) -> JwtService {
        JwtService::new(SessionConfig {
            secret: secret.to_string(),
            expiration_hours: 1,
        })
    }

    #[test]
    fn issued_token_carries_identity() {
        let jwt = service("0123456789abcdef0123456789abcdef");
        let identity = Identity::new("7", "Alice").admin().with_group("Staff", "#c00");
        let token = jwt.issue(&identity).unwrap();

        let restored = jwt.verify(&token).unwrap().into_identity();
        assert_eq!(restored.name, "Alice");
        assert!(restored.is_admin);
        assert_eq!(restored.group_color.as_deref(), Some("#c00"));
        assert_eq!(restored.socket, None);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = service("0123456789abcdef0123456789abcdef")
            .issue(&Identity::new("1", "Bob"))
            .unwrap();
        let err = service("ffffffffffffffffffffffffffffffff").verify(&token).unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn bearer_header_is_required() {
        let jwt = service("0123456789abcdef0123456789abcdef");
        let mut headers = HeaderMap::new();
        assert!(jwt.identity_from_headers(&headers).is_err());

        let token = jwt.issue(&Identity::new("1", "Bob")).unwrap();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {token}")).unwrap());
        assert_eq!(jwt.identity_from_headers(&headers).unwrap().name, "Bob");
    }
}
