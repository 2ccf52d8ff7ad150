//! Discovery ordering: rating-based score with the active visibility penalty
//! subtracted. The penalty is re-evaluated on every read, so it goes inert on
//! its own once the window elapses.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use driveconnect_database::Instructor;

pub fn visibility_score(instructor: &Instructor, now: DateTime<Utc>) -> Decimal {
    let penalty = if instructor.penalty_active(now) {
        instructor.visibility_penalty
    } else {
        0
    };
    instructor.rating * Decimal::from(100) - Decimal::from(penalty)
}

/// Order items by descending score. The sort is stable, so equal scores keep
/// the underlying fetch order (rating-descending from the store).
pub fn rank_by<T>(
    items: Vec<T>,
    now: DateTime<Utc>,
    instructor_of: impl Fn(&T) -> &Instructor,
) -> Vec<(T, Decimal)> {
    let mut scored: Vec<(T, Decimal)> = items
        .into_iter()
        .map(|item| {
            let score = visibility_score(instructor_of(&item), now);
            (item, score)
        })
        .collect();
    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored
}
