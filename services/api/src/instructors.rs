use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use driveconnect_common::AppError;
use driveconnect_database::Instructor;

use crate::config::BookingPolicy;
use crate::models::{InstructorListing, InstructorWithUser, UpdateInstructorRequest};
use crate::ranking;
use crate::state::AppState;

pub struct InstructorService {
    db_pool: PgPool,
    policy: BookingPolicy,
}

impl InstructorService {
    pub fn new(state: &AppState) -> Self {
        Self {
            db_pool: state.db_pool.clone(),
            policy: state.config.policy.clone(),
        }
    }

    /// Public discovery listing: verified instructors only, ordered by
    /// visibility score. The fetch is rating-descending so score ties keep
    /// that order.
    pub async fn list_ranked(&self) -> Result<Vec<InstructorListing>, AppError> {
        let rows = sqlx::query_as::<_, InstructorWithUser>(
            r#"
            SELECT i.*, u.name, u.email
            FROM instructors i
            JOIN users u ON u.id = i.user_id
            WHERE i.verified = TRUE
            ORDER BY i.rating DESC
            "#,
        )
        .fetch_all(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        let ranked = ranking::rank_by(rows, Utc::now(), |row| &row.instructor);

        Ok(ranked
            .into_iter()
            .map(|(row, score)| InstructorListing::from_ranked(row, score))
            .collect())
    }

    pub async fn get_by_user(&self, user_id: Uuid) -> Result<Instructor, AppError> {
        sqlx::query_as::<_, Instructor>("SELECT * FROM instructors WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.db_pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound("Instructor profile not found".to_string()))
    }

    pub async fn update_own(
        &self,
        user_id: Uuid,
        request: UpdateInstructorRequest,
    ) -> Result<Instructor, AppError> {
        // Ensure the profile exists before updating
        let profile = self.get_by_user(user_id).await?;

        if let Some(rate) = request.hourly_rate {
            if rate < self.policy.min_hourly_rate {
                return Err(AppError::Validation(format!(
                    "Minimum rate: {} XPF/h",
                    self.policy.min_hourly_rate
                )));
            }
        }

        let updated = sqlx::query_as::<_, Instructor>(
            r#"
            UPDATE instructors SET
                location = COALESCE($2, location),
                phone_number = COALESCE($3, phone_number),
                hourly_rate = COALESCE($4, hourly_rate),
                experience = COALESCE($5, experience),
                is_online = COALESCE($6, is_online),
                lat = COALESCE($7, lat),
                lng = COALESCE($8, lng)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(profile.id)
        .bind(&request.location)
        .bind(&request.phone_number)
        .bind(request.hourly_rate)
        .bind(request.experience)
        .bind(request.is_online)
        .bind(request.lat)
        .bind(request.lng)
        .fetch_one(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        tracing::info!("Instructor {} updated their profile", updated.id);
        Ok(updated)
    }
}
