use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use driveconnect_common::{AppError, UserRole};
use driveconnect_database::{Booking, Instructor};

// Auth

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: String,
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// Optional role filter; a mismatch answers exactly like a bad password.
    pub role: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserInfo {
    pub uid: Uuid,
    pub email: String,
    pub name: String,
    pub role: UserRole,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserInfo,
    pub expires_at: DateTime<Utc>,
}

// Slots

#[derive(Debug, Deserialize)]
pub struct SlotsQuery {
    #[serde(rename = "instructorId")]
    pub instructor_id: Option<Uuid>,
}

/// All fields are optional at the wire level so a missing field answers with
/// an explicit validation message instead of a deserialization failure.
#[derive(Debug, Deserialize)]
pub struct CreateSlotRequest {
    pub date: Option<String>,
    pub time: Option<String>,
    pub duration: Option<f64>,
    pub price: Option<i64>,
}

// Bookings

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    #[serde(rename = "slotId")]
    pub slot_id: Option<Uuid>,
    #[serde(rename = "externalPaymentRef")]
    pub external_payment_ref: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BookingActionRequest {
    pub action: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingAction {
    Cancel,
    Confirm,
    Reject,
}

impl BookingAction {
    pub fn parse(value: Option<&str>) -> Result<Self, AppError> {
        match value {
            Some("cancel") => Ok(BookingAction::Cancel),
            Some("confirm") => Ok(BookingAction::Confirm),
            Some("reject") => Ok(BookingAction::Reject),
            _ => Err(AppError::Validation(
                "Invalid action. Valid actions: cancel, confirm, reject".to_string(),
            )),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub id: Uuid,
    pub slot_id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub duration: f64,
    pub amount: i64,
    pub commission: i64,
    pub net: i64,
    pub status: String,
    pub payment_status: String,
    pub cancelled_by: Option<String>,
    pub refund_amount: Option<i64>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructor_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_name: Option<String>,
}

impl BookingResponse {
    pub fn from_booking(
        booking: Booking,
        instructor_name: Option<String>,
        student_name: Option<String>,
    ) -> Self {
        Self {
            id: booking.id,
            slot_id: booking.slot_id,
            date: booking.date,
            time: booking.time,
            duration: booking.duration,
            amount: booking.amount,
            commission: booking.commission,
            net: booking.net,
            status: booking.status,
            payment_status: booking.payment_status,
            cancelled_by: booking.cancelled_by,
            refund_amount: booking.refund_amount,
            cancelled_at: booking.cancelled_at,
            created_at: booking.created_at,
            instructor_name,
            student_name,
        }
    }
}

/// Booking row joined with the counterpart's display name.
#[derive(Debug, FromRow)]
pub struct BookingWithName {
    #[sqlx(flatten)]
    pub booking: Booking,
    pub counterpart_name: String,
}

#[derive(Debug, Serialize)]
pub struct BookingActionOutcome {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund_amount: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund_label: Option<String>,
    pub penalty_applied: bool,
}

impl BookingActionOutcome {
    pub fn plain() -> Self {
        Self {
            refund_amount: None,
            refund_label: None,
            penalty_applied: false,
        }
    }
}

// Instructors

/// Instructor row joined with the owning user's identity.
#[derive(Debug, FromRow)]
pub struct InstructorWithUser {
    #[sqlx(flatten)]
    pub instructor: Instructor,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct InstructorListing {
    pub id: Uuid,
    pub uid: Uuid,
    pub name: String,
    pub email: String,
    pub rating: Decimal,
    pub total_reviews: i32,
    pub experience: Option<i32>,
    pub location: String,
    pub hourly_rate: i64,
    pub phone_number: Option<String>,
    pub verified: bool,
    pub is_online: bool,
    pub lat: f64,
    pub lng: f64,
    pub penalty_until: Option<DateTime<Utc>>,
    pub visibility_penalty: i32,
    pub score: Decimal,
}

impl InstructorListing {
    pub fn from_ranked(row: InstructorWithUser, score: Decimal) -> Self {
        let i = row.instructor;
        Self {
            id: i.id,
            uid: i.user_id,
            name: row.name,
            email: row.email,
            rating: i.rating,
            total_reviews: i.total_reviews,
            experience: i.experience,
            location: i.location,
            hourly_rate: i.hourly_rate,
            phone_number: i.phone_number,
            verified: i.verified,
            is_online: i.is_online,
            lat: i.lat,
            lng: i.lng,
            penalty_until: i.penalty_until,
            visibility_penalty: i.visibility_penalty,
            score,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateInstructorRequest {
    pub location: Option<String>,
    pub phone_number: Option<String>,
    pub hourly_rate: Option<i64>,
    pub experience: Option<i32>,
    pub is_online: Option<bool>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}
