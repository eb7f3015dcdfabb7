use rust_decimal::{Decimal, prelude::Zero};
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BalanceError {
    #[error("Amount must be greater than zero, got {amount}")]
    InvalidAmount { amount: Decimal },
    #[error("Insufficient funds: balance {balance} is less than {amount}")]
    InsufficientFunds { balance: Decimal, amount: Decimal },
    #[error("Balance overflow when adding {amount} to {balance}")]
    Overflow { balance: Decimal, amount: Decimal },
}

fn ensure_positive(amount: Decimal) -> Result<(), BalanceError> {
    if amount > Decimal::zero() {
        Ok(())
    } else {
        Err(BalanceError::InvalidAmount { amount })
    }
}

/// Adds `amount` to `balance`.
pub fn credit(balance: Decimal, amount: Decimal) -> Result<Decimal, BalanceError> {
    ensure_positive(amount)?;
    balance
        .checked_add(amount)
        .ok_or(BalanceError::Overflow { balance, amount })
}

/// Subtracts `amount` from `balance`, never going below zero.
pub fn debit(balance: Decimal, amount: Decimal) -> Result<Decimal, BalanceError> {
    ensure_positive(amount)?;
    if balance < amount {
        return Err(BalanceError::InsufficientFunds { balance, amount });
    }
    Ok(balance - amount)
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn credit_adds_exact_amount() {
        assert_eq!(credit(dec!(0.1), dec!(0.2)).unwrap(), dec!(0.3));
        assert_eq!(credit(dec!(100.00), dec!(0.01)).unwrap(), dec!(100.01));
    }

    #[test]
    fn credit_rejects_non_positive_amount() {
        let err = credit(dec!(10), dec!(0)).unwrap_err();
        assert_eq!(err, BalanceError::InvalidAmount { amount: dec!(0) });
        let err = credit(dec!(10), dec!(-1)).unwrap_err();
        assert!(matches!(err, BalanceError::InvalidAmount { .. }));
    }

    #[test]
    fn credit_detects_overflow() {
        let err = credit(Decimal::MAX, dec!(1)).unwrap_err();
        assert!(matches!(err, BalanceError::Overflow { .. }));
    }

    #[test]
    fn debit_down_to_zero() {
        assert_eq!(debit(dec!(100.00), dec!(40.00)).unwrap(), dec!(60.00));
        assert_eq!(debit(dec!(40), dec!(40)).unwrap(), Decimal::zero());
    }

    #[test]
    fn debit_rejects_overdraft() {
        let err = debit(dec!(50.00), dec!(75.00)).unwrap_err();
        assert_eq!(
            err,
            BalanceError::InsufficientFunds {
                balance: dec!(50.00),
                amount: dec!(75.00)
            }
        );
        assert_eq!(
            err.to_string(),
            "Insufficient funds: balance 50.00 is less than 75.00"
        );
    }

    #[test]
    fn debit_rejects_non_positive_amount() {
        let err = debit(dec!(50), dec!(0)).unwrap_err();
        assert!(matches!(err, BalanceError::InvalidAmount { .. }));
    }
}
