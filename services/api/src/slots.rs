use chrono::{NaiveDate, NaiveTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use driveconnect_common::AppError;
use driveconnect_database::Slot;

use crate::config::BookingPolicy;
use crate::models::CreateSlotRequest;
use crate::pricing;
use crate::state::AppState;

pub struct SlotService {
    db_pool: PgPool,
    policy: BookingPolicy,
}

impl SlotService {
    pub fn new(state: &AppState) -> Self {
        Self {
            db_pool: state.db_pool.clone(),
            policy: state.config.policy.clone(),
        }
    }

    /// Public listing: available future slots for one instructor, earliest
    /// first.
    pub async fn list_available(&self, instructor_id: Uuid) -> Result<Vec<Slot>, AppError> {
        let today = Utc::now().date_naive();

        sqlx::query_as::<_, Slot>(
            r#"
            SELECT * FROM slots
            WHERE instructor_id = $1 AND available = TRUE AND date >= $2
            ORDER BY date ASC, time ASC
            "#,
        )
        .bind(instructor_id)
        .bind(today)
        .fetch_all(&self.db_pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn create(
        &self,
        instructor_id: Uuid,
        request: CreateSlotRequest,
    ) -> Result<Slot, AppError> {
        let (date, time, duration, hourly_rate) = validate_slot_request(request, &self.policy)?;

        // Duplicate start times are rejected up front; the unique constraint
        // on (instructor_id, date, time) backstops the race.
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM slots WHERE instructor_id = $1 AND date = $2 AND time = $3)",
        )
        .bind(instructor_id)
        .bind(date)
        .bind(time)
        .fetch_one(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        if exists {
            return Err(AppError::Conflict(
                "You already have a slot at this time".to_string(),
            ));
        }

        let price = pricing::slot_price(hourly_rate, duration);

        let slot = sqlx::query_as::<_, Slot>(
            r#"
            INSERT INTO slots (id, instructor_id, date, time, duration, price, available)
            VALUES ($1, $2, $3, $4, $5, $6, TRUE)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(instructor_id)
        .bind(date)
        .bind(time)
        .bind(duration)
        .bind(price)
        .fetch_one(&self.db_pool)
        .await
        .map_err(|err| match &err {
            // Two concurrent publishes can pass the pre-check; the unique
            // constraint decides, and the loser gets the same conflict.
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::Conflict("You already have a slot at this time".to_string())
            }
            _ => AppError::Database(err),
        })?;

        tracing::info!(
            "Slot {} published by instructor {} ({} {})",
            slot.id,
            instructor_id,
            slot.date,
            slot.time
        );
        Ok(slot)
    }

    /// A slot can only be deleted by its owner, and only while no
    /// non-cancelled booking references it.
    pub async fn delete(&self, instructor_id: Uuid, slot_id: Uuid) -> Result<(), AppError> {
        let slot = sqlx::query_as::<_, Slot>("SELECT * FROM slots WHERE id = $1")
            .bind(slot_id)
            .fetch_optional(&self.db_pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound("Slot not found".to_string()))?;

        if slot.instructor_id != instructor_id {
            return Err(AppError::Authorization(
                "This slot does not belong to you".to_string(),
            ));
        }

        let actively_booked = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM bookings WHERE slot_id = $1 AND status != 'cancelled')",
        )
        .bind(slot_id)
        .fetch_one(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        if actively_booked {
            return Err(AppError::Conflict("Cannot delete a booked slot".to_string()));
        }

        sqlx::query("DELETE FROM slots WHERE id = $1")
            .bind(slot_id)
            .execute(&self.db_pool)
            .await
            .map_err(AppError::Database)?;

        tracing::info!("Slot {} deleted by instructor {}", slot_id, instructor_id);
        Ok(())
    }
}

fn validate_slot_request(
    request: CreateSlotRequest,
    policy: &BookingPolicy,
) -> Result<(NaiveDate, NaiveTime, f64, i64), AppError> {
    let (date, time, duration, price) = match (
        request.date,
        request.time,
        request.duration,
        request.price,
    ) {
        (Some(date), Some(time), Some(duration), Some(price)) => (date, time, duration, price),
        _ => {
            return Err(AppError::Validation("All fields are required".to_string()));
        }
    };

    let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
        .map_err(|_| AppError::Validation("Invalid date format, expected YYYY-MM-DD".to_string()))?;
    let time = NaiveTime::parse_from_str(&time, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(&time, "%H:%M"))
        .map_err(|_| AppError::Validation("Invalid time format, expected HH:MM".to_string()))?;

    if !duration.is_finite() || duration <= 0.0 {
        return Err(AppError::Validation("Duration must be positive".to_string()));
    }
    if price < policy.min_hourly_rate {
        return Err(AppError::Validation(format!(
            "Minimum rate: {} XPF",
            policy.min_hourly_rate
        )));
    }
    if date < Utc::now().date_naive() {
        return Err(AppError::Validation("Date must be in the future".to_string()));
    }

    Ok((date, time, duration, price))
}
