//! Payment allocation across installments and status derivation.
//!
//! A payment is applied to one installment (the oldest unpaid one unless the
//! caller targets a specific number). Whatever exceeds what that installment
//! still owes spills over to the remaining unpaid installments in ascending
//! order. A payment larger than the total outstanding balance is rejected.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Installment as seen by the allocator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallmentBalance {
    pub id: Uuid,
    pub number: i32,
    pub due_date: NaiveDate,
    pub amount_cents: i64,
    pub paid_cents: i64,
}

impl InstallmentBalance {
    pub fn outstanding_cents(&self) -> i64 {
        (self.amount_cents - self.paid_cents).max(0)
    }
}

/// Portion of a payment applied to one installment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Allocation {
    pub installment_id: Uuid,
    pub number: i32,
    pub amount_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AllocationError {
    #[error("payment amount must be positive")]
    NonPositiveAmount,

    #[error("the account has no outstanding balance")]
    NothingOwed,

    #[error("payment of {requested} exceeds the outstanding balance of {outstanding}")]
    ExceedsOutstanding { requested: i64, outstanding: i64 },

    #[error("installment {0} does not exist")]
    UnknownInstallment(i32),

    #[error("installment {0} is already paid")]
    AlreadyPaid(i32),
}

/// Split `amount_cents` across installments.
///
/// Allocation order is the target (or the lowest-numbered unpaid
/// installment), then every other unpaid installment by ascending number.
pub fn allocate_payment(
    installments: &[InstallmentBalance],
    amount_cents: i64,
    target: Option<i32>,
) -> Result<Vec<Allocation>, AllocationError> {
    if amount_cents <= 0 {
        return Err(AllocationError::NonPositiveAmount);
    }

    let mut open: Vec<&InstallmentBalance> = installments
        .iter()
        .filter(|i| i.outstanding_cents() > 0)
        .collect();
    open.sort_by_key(|i| i.number);

    let outstanding: i64 = open.iter().map(|i| i.outstanding_cents()).sum();
    if outstanding == 0 {
        return Err(AllocationError::NothingOwed);
    }
    if amount_cents > outstanding {
        return Err(AllocationError::ExceedsOutstanding {
            requested: amount_cents,
            outstanding,
        });
    }

    if let Some(number) = target {
        if !installments.iter().any(|i| i.number == number) {
            return Err(AllocationError::UnknownInstallment(number));
        }
        let position = open
            .iter()
            .position(|i| i.number == number)
            .ok_or(AllocationError::AlreadyPaid(number))?;
        let targeted = open.remove(position);
        open.insert(0, targeted);
    }

    let mut remaining = amount_cents;
    let mut allocations = Vec::new();
    for installment in open {
        if remaining == 0 {
            break;
        }
        let applied = remaining.min(installment.outstanding_cents());
        allocations.push(Allocation {
            installment_id: installment.id,
            number: installment.number,
            amount_cents: applied,
        });
        remaining -= applied;
    }

    Ok(allocations)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstallmentStatus {
    Pending,
    Partial,
    Paid,
    Overdue,
}

/// Status of one installment on `today`. Overdue wins over partial.
pub fn installment_status(
    amount_cents: i64,
    paid_cents: i64,
    due_date: NaiveDate,
    today: NaiveDate,
) -> InstallmentStatus {
    if paid_cents >= amount_cents {
        InstallmentStatus::Paid
    } else if due_date < today {
        InstallmentStatus::Overdue
    } else if paid_cents > 0 {
        InstallmentStatus::Partial
    } else {
        InstallmentStatus::Pending
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    Active,
    Overdue,
    PaidOff,
    Cancelled,
}

impl AccountStatus {
    pub fn accepts_payments(self) -> bool {
        matches!(self, AccountStatus::Active | AccountStatus::Overdue)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AccountStatus::Active => "ACTIVE",
            AccountStatus::Overdue => "OVERDUE",
            AccountStatus::PaidOff => "PAID_OFF",
            AccountStatus::Cancelled => "CANCELLED",
        }
    }
}

/// Account status implied by its installments.
///
/// `Cancelled` is terminal. `PaidOff` is not: annulling a payment can bring
/// a paid-off account back to `Active` or `Overdue`.
pub fn account_status(current: AccountStatus, installments: &[InstallmentStatus]) -> AccountStatus {
    if current == AccountStatus::Cancelled {
        return AccountStatus::Cancelled;
    }
    if installments.iter().all(|s| *s == InstallmentStatus::Paid) {
        AccountStatus::PaidOff
    } else if installments.contains(&InstallmentStatus::Overdue) {
        AccountStatus::Overdue
    } else {
        AccountStatus::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    fn installments(paid: &[i64]) -> Vec<InstallmentBalance> {
        paid.iter()
            .enumerate()
            .map(|(idx, paid)| InstallmentBalance {
                id: Uuid::from_u128(idx as u128 + 1),
                number: idx as i32 + 1,
                due_date: date(idx as u32 + 1, 10),
                amount_cents: 10_000,
                paid_cents: *paid,
            })
            .collect()
    }

    #[test]
    fn test_exact_payment_hits_oldest_unpaid() {
        let list = installments(&[10_000, 0, 0]);
        let allocations = allocate_payment(&list, 10_000, None).unwrap();
        assert_eq!(allocations.len(), 1);
        assert_eq!(allocations[0].number, 2);
        assert_eq!(allocations[0].amount_cents, 10_000);
    }

    #[test]
    fn test_surplus_cascades_forward() {
        let list = installments(&[0, 0, 0]);
        let allocations = allocate_payment(&list, 25_000, None).unwrap();
        let split: Vec<(i32, i64)> = allocations.iter().map(|a| (a.number, a.amount_cents)).collect();
        assert_eq!(split, vec![(1, 10_000), (2, 10_000), (3, 5_000)]);
    }

    #[test]
    fn test_partial_installment_completed_first() {
        let list = installments(&[4_000, 0]);
        let allocations = allocate_payment(&list, 8_000, None).unwrap();
        let split: Vec<(i32, i64)> = allocations.iter().map(|a| (a.number, a.amount_cents)).collect();
        assert_eq!(split, vec![(1, 6_000), (2, 2_000)]);
    }

    #[test]
    fn test_target_goes_first_then_ascending() {
        let list = installments(&[0, 0, 0, 0]);
        let allocations = allocate_payment(&list, 15_000, Some(3)).unwrap();
        let split: Vec<(i32, i64)> = allocations.iter().map(|a| (a.number, a.amount_cents)).collect();
        assert_eq!(split, vec![(3, 10_000), (1, 5_000)]);
    }

    #[test]
    fn test_rejections() {
        let list = installments(&[10_000, 5_000]);
        assert_eq!(
            allocate_payment(&list, 0, None),
            Err(AllocationError::NonPositiveAmount)
        );
        assert_eq!(
            allocate_payment(&list, 5_001, None),
            Err(AllocationError::ExceedsOutstanding {
                requested: 5_001,
                outstanding: 5_000
            })
        );
        assert_eq!(
            allocate_payment(&list, 100, Some(1)),
            Err(AllocationError::AlreadyPaid(1))
        );
        assert_eq!(
            allocate_payment(&list, 100, Some(9)),
            Err(AllocationError::UnknownInstallment(9))
        );
        assert_eq!(
            allocate_payment(&installments(&[10_000]), 1, None),
            Err(AllocationError::NothingOwed)
        );
    }

    #[test]
    fn test_installment_status() {
        let today = date(3, 1);
        assert_eq!(installment_status(100, 100, date(1, 1), today), InstallmentStatus::Paid);
        assert_eq!(installment_status(100, 50, date(1, 1), today), InstallmentStatus::Overdue);
        assert_eq!(installment_status(100, 50, date(4, 1), today), InstallmentStatus::Partial);
        assert_eq!(installment_status(100, 0, date(3, 1), today), InstallmentStatus::Pending);
    }

    #[test]
    fn test_account_status_transitions() {
        use InstallmentStatus::*;
        assert_eq!(account_status(AccountStatus::Active, &[Paid, Paid]), AccountStatus::PaidOff);
        assert_eq!(account_status(AccountStatus::PaidOff, &[Paid, Pending]), AccountStatus::Active);
        assert_eq!(account_status(AccountStatus::Active, &[Paid, Overdue]), AccountStatus::Overdue);
        assert_eq!(account_status(AccountStatus::Overdue, &[Paid, Partial]), AccountStatus::Active);
        assert_eq!(account_status(AccountStatus::Cancelled, &[Paid, Paid]), AccountStatus::Cancelled);
    }

    #[test]
    fn test_accepts_payments() {
        assert!(AccountStatus::Active.accepts_payments());
        assert!(AccountStatus::Overdue.accepts_payments());
        assert!(!AccountStatus::PaidOff.accepts_payments());
        assert!(!AccountStatus::Cancelled.accepts_payments());
    }
}
