//! Authorization context: who the caller is relative to the resource.
//!
//! Resolved once at the boundary into a tagged variant, then dispatched —
//! handlers never re-derive ownership ad hoc.

use sqlx::PgPool;
use uuid::Uuid;

use driveconnect_common::{AppError, UserRole};
use driveconnect_database::Booking;

use crate::extractor::CurrentUser;

/// Caller identity resolved against the instructors table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallerView {
    Student(Uuid),
    Instructor { user_id: Uuid, instructor_id: Uuid },
}

/// Relationship between a caller and one specific booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingActor {
    OwningStudent,
    OwningInstructor,
    Outsider,
}

impl BookingActor {
    pub fn role(&self) -> Option<UserRole> {
        match self {
            BookingActor::OwningStudent => Some(UserRole::Student),
            BookingActor::OwningInstructor => Some(UserRole::Instructor),
            BookingActor::Outsider => None,
        }
    }
}

pub async fn instructor_id_for_user(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Option<Uuid>, AppError> {
    sqlx::query_scalar::<_, Uuid>("SELECT id FROM instructors WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)
}

/// Resolve the caller once. Instructors without a profile row cannot act in
/// any instructor capacity, so that is a hard NotFound here.
pub async fn resolve_caller(pool: &PgPool, user: &CurrentUser) -> Result<CallerView, AppError> {
    match user.claims.role {
        UserRole::Student => Ok(CallerView::Student(user.user_id)),
        UserRole::Instructor => instructor_id_for_user(pool, user.user_id)
            .await?
            .map(|instructor_id| CallerView::Instructor {
                user_id: user.user_id,
                instructor_id,
            })
            .ok_or_else(|| AppError::NotFound("Instructor profile not found".to_string())),
    }
}

/// Pure ownership decision for a booking. `instructor_id` is the caller's
/// own profile id, already looked up (None when the caller has no profile).
pub fn resolve_actor(
    role: UserRole,
    user_id: Uuid,
    instructor_id: Option<Uuid>,
    booking: &Booking,
) -> BookingActor {
    match role {
        UserRole::Student if booking.student_id == user_id => BookingActor::OwningStudent,
        UserRole::Instructor => match instructor_id {
            Some(id) if booking.instructor_id == id => BookingActor::OwningInstructor,
            _ => BookingActor::Outsider,
        },
        _ => BookingActor::Outsider,
    }
}

/// Ownership decision for a booking, with the single instructor lookup done
/// here when the caller claims the instructor role.
pub async fn actor_for_booking(
    pool: &PgPool,
    user: &CurrentUser,
    booking: &Booking,
) -> Result<BookingActor, AppError> {
    let instructor_id = match user.claims.role {
        UserRole::Instructor => instructor_id_for_user(pool, user.user_id).await?,
        UserRole::Student => None,
    };
    Ok(resolve_actor(user.claims.role, user.user_id, instructor_id, booking))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn booking(student_id: Uuid, instructor_id: Uuid) -> Booking {
        Booking {
            id: Uuid::new_v4(),
            slot_id: Uuid::new_v4(),
            student_id,
            instructor_id,
            date: Utc::now().date_naive(),
            time: chrono::NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            duration: 1.0,
            amount: 4500,
            commission: 90,
            net: 4410,
            status: "confirmed".to_string(),
            payment_status: "paid".to_string(),
            payment_ref: None,
            cancelled_by: None,
            refund_amount: None,
            cancelled_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn owning_student_matches_on_user_id() {
        let student = Uuid::new_v4();
        let b = booking(student, Uuid::new_v4());

        assert_eq!(
            resolve_actor(UserRole::Student, student, None, &b),
            BookingActor::OwningStudent
        );
        assert_eq!(
            resolve_actor(UserRole::Student, Uuid::new_v4(), None, &b),
            BookingActor::Outsider
        );
    }

    #[test]
    fn owning_instructor_matches_on_profile_id() {
        let instructor = Uuid::new_v4();
        let caller = Uuid::new_v4();
        let b = booking(Uuid::new_v4(), instructor);

        assert_eq!(
            resolve_actor(UserRole::Instructor, caller, Some(instructor), &b),
            BookingActor::OwningInstructor
        );
        assert_eq!(
            resolve_actor(UserRole::Instructor, caller, Some(Uuid::new_v4()), &b),
            BookingActor::Outsider
        );
        // Instructor role without a profile row owns nothing
        assert_eq!(
            resolve_actor(UserRole::Instructor, caller, None, &b),
            BookingActor::Outsider
        );
    }

    #[test]
    fn a_student_id_never_matches_as_instructor() {
        // Exactly one of student/instructor/neither applies: role gates the
        // comparison, ids alone are not enough.
        let shared_id = Uuid::new_v4();
        let b = booking(shared_id, Uuid::new_v4());

        assert_eq!(
            resolve_actor(UserRole::Instructor, shared_id, None, &b),
            BookingActor::Outsider
        );
    }
}
