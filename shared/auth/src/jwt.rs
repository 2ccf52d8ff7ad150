use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use driveconnect_common::{AppError, JwtConfig, UserRole};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
}

impl Claims {
    pub fn new(
        user_id: Uuid,
        email: String,
        name: String,
        role: UserRole,
        config: &JwtConfig,
    ) -> Self {
        let now = Utc::now();
        let exp = now + Duration::hours(config.expiration_hours as i64);

        Self {
            sub: user_id.to_string(),
            email,
            name,
            role,
            exp: exp.timestamp(),
            iat: now.timestamp(),
            iss: config.issuer.clone(),
        }
    }

    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| AppError::Authentication("Invalid user ID in token".to_string()))
    }
}

#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtService {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_ref()),
            decoding_key: DecodingKey::from_secret(secret.as_ref()),
            validation,
        }
    }

    pub fn generate_token(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))
    }

    /// Expired sessions get their own message so the client can prompt a
    /// re-login instead of treating the token as garbage.
    pub fn validate_token(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => {
                    AppError::Authentication("Session expired, please sign in again".to_string())
                }
                _ => AppError::Authentication("Invalid token".to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret".to_string(),
            expiration_hours: 24,
            issuer: "driveconnect-test".to_string(),
        }
    }

    #[test]
    fn claims_round_trip() {
        let config = test_config();
        let service = JwtService::new(&config.secret);
        let user_id = Uuid::new_v4();

        let claims = Claims::new(
            user_id,
            "marie@example.nc".to_string(),
            "Marie".to_string(),
            UserRole::Student,
            &config,
        );

        let token = service.generate_token(&claims).unwrap();
        let decoded = service.validate_token(&token).unwrap();

        assert_eq!(decoded.user_id().unwrap(), user_id);
        assert_eq!(decoded.email, "marie@example.nc");
        assert_eq!(decoded.role, UserRole::Student);
    }

    #[test]
    fn expired_token_gets_a_distinct_message() {
        let config = test_config();
        let service = JwtService::new(&config.secret);

        let mut claims = Claims::new(
            Uuid::new_v4(),
            "j@example.nc".to_string(),
            "Jean".to_string(),
            UserRole::Instructor,
            &config,
        );
        claims.exp = (Utc::now() - Duration::hours(2)).timestamp();
        claims.iat = (Utc::now() - Duration::hours(3)).timestamp();

        let token = service.generate_token(&claims).unwrap();
        match service.validate_token(&token) {
            Err(AppError::Authentication(msg)) => assert!(msg.contains("expired")),
            other => panic!("expected expired-session error, got {:?}", other),
        }
    }

    #[test]
    fn tampered_token_is_invalid() {
        let config = test_config();
        let service = JwtService::new(&config.secret);
        let other = JwtService::new("another-secret");

        let claims = Claims::new(
            Uuid::new_v4(),
            "x@example.nc".to_string(),
            "X".to_string(),
            UserRole::Student,
            &config,
        );
        let token = other.generate_token(&claims).unwrap();

        match service.validate_token(&token) {
            Err(AppError::Authentication(msg)) => assert_eq!(msg, "Invalid token"),
            other => panic!("expected invalid-token error, got {:?}", other),
        }
    }
}
