use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use driveconnect_auth::{Claims, JwtService, PasswordService};
use driveconnect_common::{AppError, UserRole};
use driveconnect_database::User;

use crate::config::AppConfig;
use crate::models::{AuthResponse, LoginRequest, RegisterRequest, UserInfo};
use crate::state::AppState;

const LOGIN_FAILED: &str = "Incorrect email or password";

pub struct AccountService {
    db_pool: PgPool,
    jwt_service: JwtService,
    config: AppConfig,
}

impl AccountService {
    pub fn new(state: &AppState) -> Self {
        Self {
            db_pool: state.db_pool.clone(),
            jwt_service: state.jwt_service.clone(),
            config: state.config.clone(),
        }
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, AppError> {
        PasswordService::validate_password_strength(&request.password)?;
        let role = UserRole::parse(&request.role)?;

        // Emails are matched case-insensitively: stored lowercased
        let email = request.email.trim().to_lowercase();
        let name = request.name.trim().to_string();

        let existing = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)",
        )
        .bind(&email)
        .fetch_one(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        if existing {
            return Err(AppError::Conflict("This email is already in use".to_string()));
        }

        let password_hash = PasswordService::hash_password(&request.password)?;

        let user_id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO users (id, email, name, role, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user_id)
        .bind(&email)
        .bind(&name)
        .bind(role.as_str())
        .bind(&password_hash)
        .execute(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        // Instructors get a profile row with Nouméa defaults; if that insert
        // fails, compensate by removing the half-created account.
        if role == UserRole::Instructor {
            let profile_insert = sqlx::query(
                r#"
                INSERT INTO instructors (user_id, location, hourly_rate, verified, is_online, lat, lng)
                VALUES ($1, 'Nouméa', 4500, FALSE, FALSE, -22.2758, 166.4580)
                "#,
            )
            .bind(user_id)
            .execute(&self.db_pool)
            .await;

            if let Err(err) = profile_insert {
                if let Err(cleanup_err) = sqlx::query("DELETE FROM users WHERE id = $1")
                    .bind(user_id)
                    .execute(&self.db_pool)
                    .await
                {
                    tracing::warn!(
                        "Failed to remove user {} after instructor profile error: {}",
                        user_id,
                        cleanup_err
                    );
                }
                return Err(AppError::Database(err));
            }
        }

        tracing::info!("User registered: {} ({})", name, email);
        self.auth_response(user_id, email, name, role)
    }

    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AppError> {
        let email = request.email.trim().to_lowercase();

        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(&email)
            .fetch_optional(&self.db_pool)
            .await
            .map_err(AppError::Database)?;

        let user = match user {
            Some(user) => user,
            None => {
                PasswordService::dummy_verify();
                return Err(AppError::Authentication(LOGIN_FAILED.to_string()));
            }
        };

        let role = UserRole::parse(&user.role)
            .map_err(|_| AppError::Internal("Invalid role in database".to_string()))?;

        // A role mismatch answers exactly like a bad password: no oracle
        if let Some(requested) = &request.role {
            if UserRole::parse(requested).ok() != Some(role) {
                PasswordService::dummy_verify();
                return Err(AppError::Authentication(LOGIN_FAILED.to_string()));
            }
        }

        if !PasswordService::verify_password(&request.password, &user.password_hash)? {
            return Err(AppError::Authentication(LOGIN_FAILED.to_string()));
        }

        tracing::info!("User logged in: {} ({})", user.name, user.email);
        self.auth_response(user.id, user.email, user.name, role)
    }

    fn auth_response(
        &self,
        user_id: Uuid,
        email: String,
        name: String,
        role: UserRole,
    ) -> Result<AuthResponse, AppError> {
        let claims = Claims::new(user_id, email.clone(), name.clone(), role, &self.config.jwt);
        let token = self.jwt_service.generate_token(&claims)?;

        Ok(AuthResponse {
            token,
            user: UserInfo {
                uid: user_id,
                email,
                name,
                role,
            },
            expires_at: Utc::now() + Duration::hours(self.config.jwt.expiration_hours as i64),
        })
    }
}
