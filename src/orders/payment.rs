//! Payment tenders.

use jiff::civil::DateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::orders::OrderError;

/// Accepted payment methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// Physical cash; the only tender that can carry change.
    Cash,
    /// Card terminal.
    Card,
    /// Bank transfer.
    Transfer,
    /// QR wallet payment.
    Qr,
    /// Put on the customer's account.
    OnAccount,
}

/// A single tender towards an order; orders support split payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    method: PaymentMethod,
    amount: Decimal,
    paid_at: DateTime,
}

impl Payment {
    /// Creates a payment.
    ///
    /// # Errors
    ///
    /// Fails when `amount` is not strictly positive.
    pub fn new(method: PaymentMethod, amount: Decimal, paid_at: DateTime) -> Result<Self, OrderError> {
        if amount <= Decimal::ZERO {
            return Err(OrderError::NonPositivePayment(amount));
        }
        Ok(Self {
            method,
            amount,
            paid_at,
        })
    }

    /// Tender method.
    pub fn method(&self) -> PaymentMethod {
        self.method
    }

    /// Amount paid.
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// When the payment was taken.
    pub fn paid_at(&self) -> DateTime {
        self.paid_at
    }

    /// Whether this tender is cash.
    pub fn is_cash(&self) -> bool {
        self.method == PaymentMethod::Cash
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use super::*;

    #[test]
    fn rejects_non_positive_amount() {
        let at = date(2026, 1, 10).at(21, 0, 0, 0);

        let zero = Payment::new(PaymentMethod::Cash, Decimal::ZERO, at);
        assert!(matches!(zero, Err(OrderError::NonPositivePayment(_))));

        let negative = Payment::new(PaymentMethod::Card, Decimal::from(-5), at);
        assert!(matches!(negative, Err(OrderError::NonPositivePayment(_))));
    }
}
