//! Installment schedule generation.
//!
//! A financing plan turns a financed principal into `n` installments at a
//! fixed frequency. With zero interest the principal is split evenly and the
//! remainder cents go on the last installment. With interest the French
//! (constant installment) system is used: every installment pays the
//! interest accrued on the outstanding balance plus a principal share, and
//! the last installment absorbs rounding so that principal adds up exactly
//! to the financed amount.
//!
//! Amounts are integer cents. Floating point is used only to compute the
//! annuity factor, and the result is rounded back to cents immediately.

use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Upper bound on installments per plan (30 years monthly).
pub const MAX_INSTALLMENTS: u32 = 360;

/// Upper bound on annual interest, in basis points (1000%).
pub const MAX_ANNUAL_INTEREST_BPS: u32 = 100_000;

/// How often installments fall due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentFrequency {
    Weekly,
    Biweekly,
    Monthly,
    Quarterly,
    Annually,
}

impl PaymentFrequency {
    pub fn periods_per_year(self) -> u32 {
        match self {
            PaymentFrequency::Weekly => 52,
            PaymentFrequency::Biweekly => 26,
            PaymentFrequency::Monthly => 12,
            PaymentFrequency::Quarterly => 4,
            PaymentFrequency::Annually => 1,
        }
    }

    /// Date `periods` steps after `start`.
    ///
    /// Month based frequencies clamp to the last day of shorter months, so
    /// a plan starting on January 31st falls due on February 28th/29th.
    pub fn advance(self, start: NaiveDate, periods: u32) -> Option<NaiveDate> {
        match self {
            PaymentFrequency::Weekly => start.checked_add_days(Days::new(7 * periods as u64)),
            PaymentFrequency::Biweekly => start.checked_add_days(Days::new(14 * periods as u64)),
            PaymentFrequency::Monthly => start.checked_add_months(Months::new(periods)),
            PaymentFrequency::Quarterly => start.checked_add_months(Months::new(3 * periods)),
            PaymentFrequency::Annually => start.checked_add_months(Months::new(12 * periods)),
        }
    }
}

/// Inputs for schedule generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinancingPlan {
    pub financed_cents: i64,
    pub installments: u32,
    pub annual_interest_bps: u32,
    pub frequency: PaymentFrequency,
    /// Due date of the first installment.
    pub start_date: NaiveDate,
}

/// One row of a generated schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduledInstallment {
    pub number: u32,
    pub due_date: NaiveDate,
    pub principal_cents: i64,
    pub interest_cents: i64,
    pub amount_cents: i64,
    pub balance_after_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error("financed amount must be positive")]
    NonPositivePrincipal,

    #[error("number of installments must be between 1 and {MAX_INSTALLMENTS}")]
    InstallmentCount,

    #[error("annual interest must not exceed {MAX_ANNUAL_INTEREST_BPS} basis points")]
    InterestTooHigh,

    #[error("installment due dates fall outside the supported calendar range")]
    DateOutOfRange,

    #[error("financed amount is too small for {0} installments")]
    PrincipalTooSmall(u32),
}

/// Build the full installment schedule for a plan.
pub fn build_schedule(plan: &FinancingPlan) -> Result<Vec<ScheduledInstallment>, ScheduleError> {
    if plan.financed_cents <= 0 {
        return Err(ScheduleError::NonPositivePrincipal);
    }
    if plan.installments == 0 || plan.installments > MAX_INSTALLMENTS {
        return Err(ScheduleError::InstallmentCount);
    }
    if plan.annual_interest_bps > MAX_ANNUAL_INTEREST_BPS {
        return Err(ScheduleError::InterestTooHigh);
    }
    if plan.financed_cents < plan.installments as i64 {
        return Err(ScheduleError::PrincipalTooSmall(plan.installments));
    }

    let n = plan.installments;
    let rate = periodic_rate(plan.annual_interest_bps, plan.frequency);
    let annuity = annuity_cents(plan.financed_cents, rate, n);

    let mut schedule = Vec::with_capacity(n as usize);
    let mut balance = plan.financed_cents;

    for number in 1..=n {
        let due_date = plan
            .frequency
            .advance(plan.start_date, number - 1)
            .ok_or(ScheduleError::DateOutOfRange)?;

        let interest = (balance as f64 * rate).round() as i64;
        let principal = if number == n {
            balance
        } else {
            (annuity - interest).clamp(0, balance)
        };
        balance -= principal;

        schedule.push(ScheduledInstallment {
            number,
            due_date,
            principal_cents: principal,
            interest_cents: interest,
            amount_cents: principal + interest,
            balance_after_cents: balance,
        });
    }

    Ok(schedule)
}

/// Interest rate per period as a fraction (0.01 = 1%).
pub fn periodic_rate(annual_interest_bps: u32, frequency: PaymentFrequency) -> f64 {
    annual_interest_bps as f64 / 10_000.0 / frequency.periods_per_year() as f64
}

/// Constant installment amount, rounded to cents.
///
/// With a zero rate this is the even split (floor); the remainder lands on
/// the last installment in `build_schedule`.
fn annuity_cents(principal: i64, rate: f64, n: u32) -> i64 {
    if rate == 0.0 {
        return principal / n as i64;
    }
    let factor = rate / (1.0 - (1.0 + rate).powi(-(n as i32)));
    (principal as f64 * factor).round() as i64
}

/// Totals of a schedule, as shown on plan previews.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScheduleTotals {
    pub principal_cents: i64,
    pub interest_cents: i64,
    pub total_cents: i64,
}

pub fn totals(schedule: &[ScheduledInstallment]) -> ScheduleTotals {
    let principal_cents = schedule.iter().map(|i| i.principal_cents).sum();
    let interest_cents = schedule.iter().map(|i| i.interest_cents).sum();
    ScheduleTotals {
        principal_cents,
        interest_cents,
        total_cents: principal_cents + interest_cents,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn plan(financed: i64, n: u32, bps: u32, frequency: PaymentFrequency) -> FinancingPlan {
        FinancingPlan {
            financed_cents: financed,
            installments: n,
            annual_interest_bps: bps,
            frequency,
            start_date: date(2025, 1, 31),
        }
    }

    #[test]
    fn test_zero_interest_puts_remainder_on_last() {
        let schedule = build_schedule(&plan(100_000, 3, 0, PaymentFrequency::Monthly)).unwrap();
        let amounts: Vec<i64> = schedule.iter().map(|i| i.amount_cents).collect();
        assert_eq!(amounts, vec![33_333, 33_333, 33_334]);
        assert!(schedule.iter().all(|i| i.interest_cents == 0));
        assert_eq!(schedule.last().unwrap().balance_after_cents, 0);
    }

    #[test]
    fn test_french_system_amounts() {
        // 10,000.00 at 12% nominal annual, 12 monthly installments.
        let schedule =
            build_schedule(&plan(1_000_000, 12, 1_200, PaymentFrequency::Monthly)).unwrap();

        assert_eq!(schedule.len(), 12);
        assert_eq!(schedule[0].interest_cents, 10_000);
        assert_eq!(schedule[0].amount_cents, 88_849);

        let t = totals(&schedule);
        assert_eq!(t.principal_cents, 1_000_000);
        assert_eq!(t.total_cents, t.principal_cents + t.interest_cents);

        // Rounding drift stays within a few cents on the last installment.
        let last = schedule.last().unwrap();
        assert!((last.amount_cents - 88_849).abs() <= 12);
        assert_eq!(last.balance_after_cents, 0);
    }

    #[test]
    fn test_interest_decreases_over_time() {
        let schedule =
            build_schedule(&plan(5_000_000, 24, 6_000, PaymentFrequency::Monthly)).unwrap();
        for pair in schedule.windows(2) {
            assert!(pair[1].interest_cents <= pair[0].interest_cents);
            assert!(pair[1].balance_after_cents < pair[0].balance_after_cents);
        }
    }

    #[test]
    fn test_monthly_due_dates_clamp_to_month_end() {
        let schedule = build_schedule(&plan(90_000, 3, 0, PaymentFrequency::Monthly)).unwrap();
        let dates: Vec<NaiveDate> = schedule.iter().map(|i| i.due_date).collect();
        assert_eq!(dates, vec![date(2025, 1, 31), date(2025, 2, 28), date(2025, 3, 31)]);
    }

    #[test]
    fn test_weekly_and_quarterly_due_dates() {
        let weekly = build_schedule(&plan(30_000, 3, 0, PaymentFrequency::Weekly)).unwrap();
        assert_eq!(weekly[2].due_date, date(2025, 2, 14));

        let quarterly = build_schedule(&plan(30_000, 2, 0, PaymentFrequency::Quarterly)).unwrap();
        assert_eq!(quarterly[1].due_date, date(2025, 4, 30));
    }

    #[test]
    fn test_rejects_invalid_plans() {
        assert_eq!(
            build_schedule(&plan(0, 3, 0, PaymentFrequency::Monthly)),
            Err(ScheduleError::NonPositivePrincipal)
        );
        assert_eq!(
            build_schedule(&plan(1_000, 0, 0, PaymentFrequency::Monthly)),
            Err(ScheduleError::InstallmentCount)
        );
        assert_eq!(
            build_schedule(&plan(1_000, 361, 0, PaymentFrequency::Monthly)),
            Err(ScheduleError::InstallmentCount)
        );
        assert_eq!(
            build_schedule(&plan(1_000, 3, 100_001, PaymentFrequency::Monthly)),
            Err(ScheduleError::InterestTooHigh)
        );
        assert_eq!(
            build_schedule(&plan(2, 3, 0, PaymentFrequency::Monthly)),
            Err(ScheduleError::PrincipalTooSmall(3))
        );
    }

    #[test]
    fn test_periodic_rate() {
        assert!((periodic_rate(1_200, PaymentFrequency::Monthly) - 0.01).abs() < 1e-12);
        assert!((periodic_rate(5_200, PaymentFrequency::Weekly) - 0.01).abs() < 1e-12);
        assert_eq!(periodic_rate(0, PaymentFrequency::Annually), 0.0);
    }
}
