//! Rental charge computation.
//!
//! A closed rental is billed `elapsed_hours * hourly_rate +
//! kilometers_driven * per_km_rate`. Elapsed time is fractional (90 minutes
//! bills as 1.5 hours) and every step uses exact decimal arithmetic.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Milliseconds in one hour; elapsed time is measured at millisecond resolution.
const MILLIS_PER_HOUR: i64 = 3_600_000;

/// Default number of decimal places kept on a billed amount.
pub const DEFAULT_AMOUNT_SCALE: u32 = 2;

/// Largest scale a [`Decimal`] can carry.
pub const MAX_AMOUNT_SCALE: u32 = 28;

/// The per-car billing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tariff {
    /// Price per hour of rental.
    pub hourly_rate: Decimal,
    /// Price per kilometre driven.
    pub per_km_rate: Decimal,
}

/// Compute the elapsed time between two instants in fractional hours.
///
/// # Errors
///
/// Returns a validation error if `end` precedes `start`.
pub fn elapsed_hours(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Decimal> {
    if end < start {
        return Err(Error::validation(
            "end_time",
            format!("{end} precedes rental start {start}"),
        ));
    }

    let millis = (end - start).num_milliseconds();
    Ok(Decimal::from(millis) / Decimal::from(MILLIS_PER_HOUR))
}

/// How billed amounts are rounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillingPolicy {
    amount_scale: u32,
}

impl Default for BillingPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_AMOUNT_SCALE)
    }
}

impl BillingPolicy {
    /// Create a policy that keeps `amount_scale` decimal places.
    ///
    /// Scales above [`MAX_AMOUNT_SCALE`] are clamped.
    #[must_use]
    pub fn new(amount_scale: u32) -> Self {
        Self {
            amount_scale: amount_scale.min(MAX_AMOUNT_SCALE),
        }
    }

    /// Number of decimal places kept on a billed amount.
    #[must_use]
    pub fn amount_scale(&self) -> u32 {
        self.amount_scale
    }

    /// Compute the total charge for a rental.
    ///
    /// The exact result is rounded half-to-even at the policy's scale.
    ///
    /// # Errors
    ///
    /// Returns a validation error if an input is negative or the charge
    /// overflows the decimal range.
    pub fn charge(&self, hours: Decimal, tariff: Tariff, kilometers: Decimal) -> Result<Decimal> {
        if hours.is_sign_negative() && !hours.is_zero() {
            return Err(Error::validation("elapsed_hours", "must not be negative"));
        }
        if kilometers.is_sign_negative() && !kilometers.is_zero() {
            return Err(Error::validation("kilometers_driven", "must not be negative"));
        }

        let overflow = || Error::validation("total_amount", "charge exceeds the decimal range");
        let time_charge = hours
            .checked_mul(tariff.hourly_rate)
            .ok_or_else(overflow)?;
        let distance_charge = kilometers
            .checked_mul(tariff.per_km_rate)
            .ok_or_else(overflow)?;
        let total = time_charge
            .checked_add(distance_charge)
            .ok_or_else(overflow)?;

        Ok(total.round_dp_with_strategy(self.amount_scale, RoundingStrategy::MidpointNearestEven))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 8, 0, 0).unwrap()
    }

    fn tariff(hourly: Decimal, per_km: Decimal) -> Tariff {
        Tariff {
            hourly_rate: hourly,
            per_km_rate: per_km,
        }
    }

    #[test]
    fn test_elapsed_hours_is_fractional() {
        let hours = elapsed_hours(start(), start() + Duration::minutes(90)).unwrap();
        assert_eq!(hours, dec!(1.5));
    }

    #[test]
    fn test_elapsed_hours_zero() {
        assert_eq!(elapsed_hours(start(), start()).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_elapsed_hours_rejects_reversed_interval() {
        let err = elapsed_hours(start(), start() - Duration::seconds(1)).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_two_hours_and_five_km() {
        let hours = elapsed_hours(start(), start() + Duration::hours(2)).unwrap();
        let total = BillingPolicy::default()
            .charge(hours, tariff(dec!(10), dec!(2)), dec!(5))
            .unwrap();
        assert_eq!(total, dec!(30));
    }

    #[test]
    fn test_half_hour_bills_half_rate() {
        let hours = elapsed_hours(start(), start() + Duration::minutes(30)).unwrap();
        let total = BillingPolicy::default()
            .charge(hours, tariff(dec!(10), dec!(0)), Decimal::ZERO)
            .unwrap();
        assert_eq!(total, dec!(5));
    }

    #[test]
    fn test_no_binary_float_drift() {
        // 0.1 + 0.2 is not 0.3 in binary floating point.
        let total = BillingPolicy::default()
            .charge(dec!(1), tariff(dec!(0.1), dec!(0.2)), dec!(1))
            .unwrap();
        assert_eq!(total, dec!(0.3));
    }

    #[test]
    fn test_rounds_half_to_even() {
        let policy = BillingPolicy::new(2);
        let total = policy
            .charge(dec!(1), tariff(dec!(0.125), dec!(0)), dec!(0))
            .unwrap();
        assert_eq!(total, dec!(0.12));

        let total = policy
            .charge(dec!(1), tariff(dec!(0.135), dec!(0)), dec!(0))
            .unwrap();
        assert_eq!(total, dec!(0.14));
    }

    #[test]
    fn test_rounding_keeps_configured_scale() {
        let hours = elapsed_hours(start(), start() + Duration::minutes(20)).unwrap();
        let total = BillingPolicy::new(4)
            .charge(hours, tariff(dec!(10), dec!(0)), dec!(0))
            .unwrap();
        assert_eq!(total, dec!(3.3333));
    }

    #[test]
    fn test_negative_kilometers_rejected() {
        let err = BillingPolicy::default()
            .charge(dec!(1), tariff(dec!(10), dec!(2)), dec!(-1))
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_overflow_is_an_error() {
        let err = BillingPolicy::default()
            .charge(Decimal::MAX, tariff(dec!(2), dec!(0)), dec!(0))
            .unwrap_err();
        assert!(err.to_string().contains("total_amount"));
    }

    #[test]
    fn test_scale_is_clamped() {
        assert_eq!(BillingPolicy::new(40).amount_scale(), MAX_AMOUNT_SCALE);
    }
}
