//! Money rules: slot pricing, commission split, and the cancellation ruling.
//!
//! Everything here is pure so the refund tiers can be pinned down in tests
//! without a store.

use chrono::NaiveDateTime;

use driveconnect_common::UserRole;

use crate::config::BookingPolicy;

/// Stored slot price: hourly rate times duration, rounded to whole XPF.
pub fn slot_price(hourly_rate: i64, duration_hours: f64) -> i64 {
    (hourly_rate as f64 * duration_hours).round() as i64
}

/// Platform commission and instructor net for a booking amount.
pub fn commission_split(amount: i64, policy: &BookingPolicy) -> (i64, i64) {
    let commission = (amount as f64 * policy.commission_rate).round() as i64;
    (commission, amount - commission)
}

pub fn hours_until(lesson: NaiveDateTime, now: NaiveDateTime) -> f64 {
    (lesson - now).num_seconds() as f64 / 3600.0
}

/// Everything `cancel` decides before any row is touched.
#[derive(Debug, Clone, PartialEq)]
pub struct CancellationRuling {
    pub refund_pct: u32,
    pub refund_amount: i64,
    pub refund_label: &'static str,
    pub release_slot: bool,
    pub apply_penalty: bool,
}

/// Refund tiers are evaluated strictly in order: full tier, half tier, none.
/// An instructor cancelling always refunds in full, and additionally takes a
/// visibility penalty when the lesson is less than a day away.
pub fn rule_on_cancellation(
    cancelled_by: UserRole,
    hours_until_lesson: f64,
    amount: i64,
    policy: &BookingPolicy,
) -> CancellationRuling {
    let (mut refund_pct, mut refund_label) = if hours_until_lesson >= policy.full_refund_hours {
        (100, "100% refunded")
    } else if hours_until_lesson >= policy.half_refund_hours {
        (50, "50% refunded")
    } else {
        (0, "No refund")
    };

    if cancelled_by == UserRole::Instructor {
        refund_pct = 100;
        refund_label = "100% refunded (instructor cancellation)";
    }

    let refund_amount = (amount as f64 * refund_pct as f64 / 100.0).round() as i64;

    CancellationRuling {
        refund_pct,
        refund_amount,
        refund_label,
        // A sub-threshold refund keeps the slot off the market: the
        // instructor's time was blocked too close to the lesson.
        release_slot: refund_pct >= policy.slot_release_refund_pct,
        apply_penalty: cancelled_by == UserRole::Instructor
            && hours_until_lesson < policy.half_refund_hours,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> BookingPolicy {
        BookingPolicy::default()
    }

    #[test]
    fn slot_price_is_rate_times_duration_rounded() {
        assert_eq!(slot_price(3000, 2.0), 6000);
        assert_eq!(slot_price(3500, 1.5), 5250);
        assert_eq!(slot_price(1001, 1.5), 1502); // 1501.5 rounds up
    }

    #[test]
    fn commission_split_takes_two_percent() {
        let (commission, net) = commission_split(6000, &policy());
        assert_eq!(commission, 120);
        assert_eq!(net, 5880);
    }

    #[test]
    fn refund_tier_boundaries() {
        let p = policy();
        let at = |hours: f64| rule_on_cancellation(UserRole::Student, hours, 6000, &p);

        assert_eq!(at(48.0).refund_pct, 100);
        assert_eq!(at(47.99).refund_pct, 50);
        assert_eq!(at(24.0).refund_pct, 50);
        assert_eq!(at(23.99).refund_pct, 0);
    }

    #[test]
    fn instructor_cancellation_always_refunds_in_full() {
        let p = policy();
        let ruling = rule_on_cancellation(UserRole::Instructor, 2.0, 6000, &p);
        assert_eq!(ruling.refund_pct, 100);
        assert_eq!(ruling.refund_amount, 6000);
        assert_eq!(ruling.refund_label, "100% refunded (instructor cancellation)");
    }

    #[test]
    fn refund_amount_is_rounded_percentage_of_amount() {
        let p = policy();
        let ruling = rule_on_cancellation(UserRole::Student, 30.0, 6000, &p);
        assert_eq!(ruling.refund_pct, 50);
        assert_eq!(ruling.refund_amount, 3000);

        // Odd amount rounds instead of truncating
        let ruling = rule_on_cancellation(UserRole::Student, 30.0, 6001, &p);
        assert_eq!(ruling.refund_amount, 3001); // 3000.5 rounds up
    }

    #[test]
    fn slot_released_only_at_half_refund_or_better() {
        let p = policy();
        assert!(rule_on_cancellation(UserRole::Student, 50.0, 6000, &p).release_slot);
        assert!(rule_on_cancellation(UserRole::Student, 30.0, 6000, &p).release_slot);
        assert!(!rule_on_cancellation(UserRole::Student, 3.0, 6000, &p).release_slot);
        // Instructor cancelling late still releases (forced 100% refund)
        assert!(rule_on_cancellation(UserRole::Instructor, 3.0, 6000, &p).release_slot);
    }

    #[test]
    fn penalty_only_for_instructor_cancelling_under_a_day() {
        let p = policy();
        assert!(rule_on_cancellation(UserRole::Instructor, 23.0, 6000, &p).apply_penalty);
        assert!(!rule_on_cancellation(UserRole::Instructor, 24.0, 6000, &p).apply_penalty);
        assert!(!rule_on_cancellation(UserRole::Student, 2.0, 6000, &p).apply_penalty);
    }

    #[test]
    fn tiers_follow_a_varied_policy() {
        let p = BookingPolicy {
            full_refund_hours: 72.0,
            half_refund_hours: 12.0,
            ..BookingPolicy::default()
        };
        assert_eq!(rule_on_cancellation(UserRole::Student, 50.0, 1000, &p).refund_pct, 50);
        assert_eq!(rule_on_cancellation(UserRole::Student, 72.0, 1000, &p).refund_pct, 100);
        assert_eq!(rule_on_cancellation(UserRole::Student, 11.9, 1000, &p).refund_pct, 0);
    }
}
