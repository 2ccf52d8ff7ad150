//! Slot reservation and the booking lifecycle.
//!
//! Reservation claims the slot with a guarded update before inserting the
//! booking row; the guard is the only synchronization point in the system,
//! so at most one booking ever holds a slot. The lifecycle actions (cancel,
//! confirm, reject) are plain single-row writes over the resolved actor.

use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use driveconnect_common::{AppError, BookingStatus};
use driveconnect_database::{Booking, Slot};

use crate::access::{self, BookingActor, CallerView};
use crate::config::BookingPolicy;
use crate::extractor::CurrentUser;
use crate::models::{BookingAction, BookingActionOutcome, BookingResponse, BookingWithName};
use crate::pricing;
use crate::state::AppState;

pub struct BookingService {
    db_pool: PgPool,
    policy: BookingPolicy,
}

impl BookingService {
    pub fn new(state: &AppState) -> Self {
        Self {
            db_pool: state.db_pool.clone(),
            policy: state.config.policy.clone(),
        }
    }

    /// Reserve a slot for a student. Existence is checked separately from
    /// availability so "never existed" and "just got taken" answer
    /// differently.
    pub async fn reserve(
        &self,
        student_id: Uuid,
        slot_id: Uuid,
        payment_ref: Option<String>,
    ) -> Result<BookingResponse, AppError> {
        let slot = sqlx::query_as::<_, Slot>("SELECT * FROM slots WHERE id = $1")
            .bind(slot_id)
            .fetch_optional(&self.db_pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound("Slot not found".to_string()))?;

        if !slot.available {
            return Err(AppError::Conflict(
                "This slot is no longer available".to_string(),
            ));
        }
        if slot.lesson_datetime() <= Utc::now().naive_utc() {
            return Err(AppError::Validation("This slot is in the past".to_string()));
        }

        // Claim the slot first. Zero rows affected means another request won
        // the race between our read and this write.
        let claimed =
            sqlx::query("UPDATE slots SET available = FALSE WHERE id = $1 AND available = TRUE")
                .bind(slot_id)
                .execute(&self.db_pool)
                .await
                .map_err(AppError::Database)?;

        if claimed.rows_affected() == 0 {
            return Err(AppError::Conflict(
                "This slot was just booked by someone else".to_string(),
            ));
        }

        let (commission, net) = pricing::commission_split(slot.price, &self.policy);

        let inserted = sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings (
                id, slot_id, student_id, instructor_id, date, time, duration,
                amount, commission, net, status, payment_status, payment_ref
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 'confirmed', 'paid', $11)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(slot_id)
        .bind(student_id)
        .bind(slot.instructor_id)
        .bind(slot.date)
        .bind(slot.time)
        .bind(slot.duration)
        .bind(slot.price)
        .bind(commission)
        .bind(net)
        .bind(&payment_ref)
        .fetch_one(&self.db_pool)
        .await;

        let booking = match inserted {
            Ok(booking) => booking,
            Err(err) => {
                // Best-effort release of the claimed slot; failure is logged
                // and not re-verified.
                if let Err(release_err) =
                    sqlx::query("UPDATE slots SET available = TRUE WHERE id = $1")
                        .bind(slot_id)
                        .execute(&self.db_pool)
                        .await
                {
                    tracing::warn!(
                        "Failed to release slot {} after booking insert error: {}",
                        slot_id,
                        release_err
                    );
                }
                return Err(AppError::Database(err));
            }
        };

        let instructor_name = self.instructor_name(slot.instructor_id).await;
        tracing::info!(
            "Booking {} created: slot {} reserved by student {}",
            booking.id,
            slot_id,
            student_id
        );
        Ok(BookingResponse::from_booking(booking, instructor_name, None))
    }

    /// The caller's bookings, newest first, with the counterpart's name
    /// joined in for display.
    pub async fn list_for(&self, view: CallerView) -> Result<Vec<BookingResponse>, AppError> {
        match view {
            CallerView::Student(student_id) => {
                let rows = sqlx::query_as::<_, BookingWithName>(
                    r#"
                    SELECT b.*, u.name AS counterpart_name
                    FROM bookings b
                    JOIN instructors i ON i.id = b.instructor_id
                    JOIN users u ON u.id = i.user_id
                    WHERE b.student_id = $1
                    ORDER BY b.created_at DESC
                    "#,
                )
                .bind(student_id)
                .fetch_all(&self.db_pool)
                .await
                .map_err(AppError::Database)?;

                Ok(rows
                    .into_iter()
                    .map(|row| {
                        BookingResponse::from_booking(row.booking, Some(row.counterpart_name), None)
                    })
                    .collect())
            }
            CallerView::Instructor { instructor_id, .. } => {
                let rows = sqlx::query_as::<_, BookingWithName>(
                    r#"
                    SELECT b.*, u.name AS counterpart_name
                    FROM bookings b
                    JOIN users u ON u.id = b.student_id
                    WHERE b.instructor_id = $1
                    ORDER BY b.created_at DESC
                    "#,
                )
                .bind(instructor_id)
                .fetch_all(&self.db_pool)
                .await
                .map_err(AppError::Database)?;

                Ok(rows
                    .into_iter()
                    .map(|row| {
                        BookingResponse::from_booking(row.booking, None, Some(row.counterpart_name))
                    })
                    .collect())
            }
        }
    }

    /// Apply a lifecycle action. Ownership is resolved before any mutation;
    /// a cancelled booking is terminal for every action.
    pub async fn apply_action(
        &self,
        user: &CurrentUser,
        booking_id: Uuid,
        action: BookingAction,
    ) -> Result<BookingActionOutcome, AppError> {
        let booking = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1")
            .bind(booking_id)
            .fetch_optional(&self.db_pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

        let actor = access::actor_for_booking(&self.db_pool, user, &booking).await?;
        if actor == BookingActor::Outsider {
            return Err(AppError::Authorization("Not authorized".to_string()));
        }

        if BookingStatus::parse(&booking.status)? == BookingStatus::Cancelled {
            return Err(AppError::Conflict(
                "This booking is already cancelled".to_string(),
            ));
        }

        match action {
            BookingAction::Cancel => self.cancel(booking, actor).await,
            BookingAction::Confirm => {
                self.require_instructor(actor)?;
                // Idempotent: re-confirming a confirmed booking is a no-op
                self.set_status(booking.id, BookingStatus::Confirmed).await?;
                Ok(BookingActionOutcome::plain())
            }
            BookingAction::Reject => {
                self.require_instructor(actor)?;
                self.set_status(booking.id, BookingStatus::Rejected).await?;
                // Rejection means no service was rendered: the slot always
                // goes back on sale.
                self.release_slot(booking.slot_id).await?;
                tracing::info!("Booking {} rejected by instructor", booking.id);
                Ok(BookingActionOutcome::plain())
            }
        }
    }

    async fn cancel(
        &self,
        booking: Booking,
        actor: BookingActor,
    ) -> Result<BookingActionOutcome, AppError> {
        let cancelled_by = actor
            .role()
            .ok_or_else(|| AppError::Authorization("Not authorized".to_string()))?;

        let now = Utc::now();
        let hours_until_lesson = pricing::hours_until(booking.lesson_datetime(), now.naive_utc());
        let ruling = pricing::rule_on_cancellation(
            cancelled_by,
            hours_until_lesson,
            booking.amount,
            &self.policy,
        );

        sqlx::query(
            r#"
            UPDATE bookings
            SET status = 'cancelled', cancelled_by = $2, refund_amount = $3, cancelled_at = $4
            WHERE id = $1
            "#,
        )
        .bind(booking.id)
        .bind(cancelled_by.as_str())
        .bind(ruling.refund_amount)
        .bind(now)
        .execute(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        if ruling.release_slot {
            self.release_slot(booking.slot_id).await?;
        }

        if ruling.apply_penalty {
            // The booking already carries the instructor id; no re-fetch
            let penalty_until = now + Duration::days(self.policy.penalty_days);
            sqlx::query(
                "UPDATE instructors SET penalty_until = $2, visibility_penalty = $3 WHERE id = $1",
            )
            .bind(booking.instructor_id)
            .bind(penalty_until)
            .bind(self.policy.penalty_points)
            .execute(&self.db_pool)
            .await
            .map_err(AppError::Database)?;

            tracing::info!(
                "Visibility penalty applied to instructor {} until {}",
                booking.instructor_id,
                penalty_until
            );
        }

        tracing::info!(
            "Booking {} cancelled by {} ({} refund)",
            booking.id,
            cancelled_by.as_str(),
            ruling.refund_pct
        );

        Ok(BookingActionOutcome {
            refund_amount: Some(ruling.refund_amount),
            refund_label: Some(ruling.refund_label.to_string()),
            penalty_applied: ruling.apply_penalty,
        })
    }

    fn require_instructor(&self, actor: BookingActor) -> Result<(), AppError> {
        if actor != BookingActor::OwningInstructor {
            return Err(AppError::Authorization("Instructors only".to_string()));
        }
        Ok(())
    }

    async fn set_status(&self, booking_id: Uuid, status: BookingStatus) -> Result<(), AppError> {
        sqlx::query("UPDATE bookings SET status = $2 WHERE id = $1")
            .bind(booking_id)
            .bind(status.as_str())
            .execute(&self.db_pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }

    async fn release_slot(&self, slot_id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE slots SET available = TRUE WHERE id = $1")
            .bind(slot_id)
            .execute(&self.db_pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }

    async fn instructor_name(&self, instructor_id: Uuid) -> Option<String> {
        let name = sqlx::query_scalar::<_, String>(
            "SELECT u.name FROM instructors i JOIN users u ON u.id = i.user_id WHERE i.id = $1",
        )
        .bind(instructor_id)
        .fetch_optional(&self.db_pool)
        .await;

        match name {
            Ok(name) => name,
            Err(err) => {
                // Display-only lookup; the booking itself already succeeded
                tracing::warn!("Failed to load instructor name: {}", err);
                None
            }
        }
    }
}
