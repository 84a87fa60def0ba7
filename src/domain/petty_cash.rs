//! Petty cash rules.
//!
//! Money flows deposit → withdrawal → spend. A deposit is cash placed in a
//! branch float, a withdrawal hands part of it to a person, and spends
//! justify what that person did with it.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DepositStatus {
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WithdrawalStatus {
    PendingJustification,
    PartiallyJustified,
    Justified,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PettyCashError {
    #[error("amount must be positive")]
    NonPositiveAmount,

    #[error("deposit is closed")]
    DepositClosed,

    #[error("withdrawal of {requested} exceeds the {available} still available in the deposit")]
    DepositExhausted { requested: i64, available: i64 },

    #[error("spend of {requested} exceeds the {available} left to justify on the withdrawal")]
    WithdrawalExhausted { requested: i64, available: i64 },

    #[error("deposit has withdrawals pending justification")]
    PendingWithdrawals,
}

pub fn withdrawal_status(amount_cents: i64, justified_cents: i64) -> WithdrawalStatus {
    if justified_cents >= amount_cents {
        WithdrawalStatus::Justified
    } else if justified_cents > 0 {
        WithdrawalStatus::PartiallyJustified
    } else {
        WithdrawalStatus::PendingJustification
    }
}

/// Check a new withdrawal against its deposit.
pub fn check_withdrawal(
    deposit_status: DepositStatus,
    deposit_amount_cents: i64,
    withdrawn_cents: i64,
    requested_cents: i64,
) -> Result<(), PettyCashError> {
    if requested_cents <= 0 {
        return Err(PettyCashError::NonPositiveAmount);
    }
    if deposit_status == DepositStatus::Closed {
        return Err(PettyCashError::DepositClosed);
    }
    let available = deposit_amount_cents - withdrawn_cents;
    if requested_cents > available {
        return Err(PettyCashError::DepositExhausted {
            requested: requested_cents,
            available,
        });
    }
    Ok(())
}

/// Check a new spend against its withdrawal.
pub fn check_spend(
    deposit_status: DepositStatus,
    withdrawal_amount_cents: i64,
    justified_cents: i64,
    requested_cents: i64,
) -> Result<(), PettyCashError> {
    if requested_cents <= 0 {
        return Err(PettyCashError::NonPositiveAmount);
    }
    if deposit_status == DepositStatus::Closed {
        return Err(PettyCashError::DepositClosed);
    }
    let available = withdrawal_amount_cents - justified_cents;
    if requested_cents > available {
        return Err(PettyCashError::WithdrawalExhausted {
            requested: requested_cents,
            available,
        });
    }
    Ok(())
}

/// A deposit may close once every withdrawal is fully justified.
pub fn check_close(withdrawals: &[WithdrawalStatus]) -> Result<(), PettyCashError> {
    if withdrawals.iter().all(|s| *s == WithdrawalStatus::Justified) {
        Ok(())
    } else {
        Err(PettyCashError::PendingWithdrawals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_withdrawal_status() {
        assert_eq!(withdrawal_status(1_000, 0), WithdrawalStatus::PendingJustification);
        assert_eq!(withdrawal_status(1_000, 400), WithdrawalStatus::PartiallyJustified);
        assert_eq!(withdrawal_status(1_000, 1_000), WithdrawalStatus::Justified);
    }

    #[test]
    fn test_check_withdrawal() {
        assert!(check_withdrawal(DepositStatus::Open, 10_000, 6_000, 4_000).is_ok());
        assert_eq!(
            check_withdrawal(DepositStatus::Open, 10_000, 6_000, 4_001),
            Err(PettyCashError::DepositExhausted {
                requested: 4_001,
                available: 4_000
            })
        );
        assert_eq!(
            check_withdrawal(DepositStatus::Closed, 10_000, 0, 1),
            Err(PettyCashError::DepositClosed)
        );
        assert_eq!(
            check_withdrawal(DepositStatus::Open, 10_000, 0, 0),
            Err(PettyCashError::NonPositiveAmount)
        );
    }

    #[test]
    fn test_check_spend() {
        assert!(check_spend(DepositStatus::Open, 5_000, 4_999, 1).is_ok());
        assert!(matches!(
            check_spend(DepositStatus::Open, 5_000, 4_999, 2),
            Err(PettyCashError::WithdrawalExhausted { .. })
        ));
    }

    #[test]
    fn test_check_close() {
        assert!(check_close(&[]).is_ok());
        assert!(check_close(&[WithdrawalStatus::Justified]).is_ok());
        assert_eq!(
            check_close(&[WithdrawalStatus::Justified, WithdrawalStatus::PartiallyJustified]),
            Err(PettyCashError::PendingWithdrawals)
        );
    }
}
