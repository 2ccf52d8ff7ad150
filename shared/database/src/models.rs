use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Identity record. Never mutated by the booking core; deleted only as the
/// compensating action when a dependent instructor profile fails to create.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Instructor {
    pub id: Uuid,
    pub user_id: Uuid,
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
    pub created_at: DateTime<Utc>,
}

impl Instructor {
    /// The visibility penalty is active only while its window is open;
    /// every read re-evaluates this, so no cleanup job exists.
    pub fn penalty_active(&self, now: DateTime<Utc>) -> bool {
        self.penalty_until.map_or(false, |until| until > now)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Slot {
    pub id: Uuid,
    pub instructor_id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub duration: f64,
    pub price: i64,
    pub available: bool,
    pub created_at: DateTime<Utc>,
}

impl Slot {
    pub fn lesson_datetime(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }
}

/// Date/time/duration/amount are denormalized from the slot at reservation
/// time, so later slot edits cannot retroactively alter a booking.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub slot_id: Uuid,
    pub student_id: Uuid,
    pub instructor_id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub duration: f64,
    pub amount: i64,
    pub commission: i64,
    pub net: i64,
    pub status: String,
    pub payment_status: String,
    pub payment_ref: Option<String>,
    pub cancelled_by: Option<String>,
    pub refund_amount: Option<i64>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn lesson_datetime(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }
}
