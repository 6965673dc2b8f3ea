use std::{cmp::Ordering, fmt};

use crate::{Currency, EngineError, ResultEngine};

/// Monetary amount as **integer minor units** plus a currency tag.
///
/// Use this type for **all** monetary values in the engine (item totals,
/// contribution and debt amounts) to avoid floating-point drift across many
/// small contributions.
///
/// Arithmetic and comparison between two amounts of different currencies
/// fails with [`CurrencyMismatch`]; the engine never converts.
///
/// # Examples
///
/// ```rust
/// use engine::{Currency, Money};
///
/// let a = Money::new(12_34, Currency::Uyu);
/// let b = Money::new(66, Currency::Uyu);
/// assert_eq!(a.checked_add(b).unwrap().amount_minor(), 1300);
/// assert_eq!(a.to_string(), "12.34 UYU");
/// ```
///
/// [`CurrencyMismatch`]: EngineError::CurrencyMismatch
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Money {
    amount_minor: i64,
    currency: Currency,
}

impl Money {
    /// Creates a new amount from integer minor units.
    #[must_use]
    pub const fn new(amount_minor: i64, currency: Currency) -> Self {
        Self {
            amount_minor,
            currency,
        }
    }

    #[must_use]
    pub const fn zero(currency: Currency) -> Self {
        Self::new(0, currency)
    }

    /// Returns the raw value in minor units.
    #[must_use]
    pub const fn amount_minor(self) -> i64 {
        self.amount_minor
    }

    #[must_use]
    pub const fn currency(self) -> Currency {
        self.currency
    }

    /// Returns `true` if the amount is strictly positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.amount_minor > 0
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.amount_minor == 0
    }

    fn ensure_same_currency(self, rhs: Money) -> ResultEngine<()> {
        if self.currency != rhs.currency {
            return Err(EngineError::CurrencyMismatch(format!(
                "cannot combine {} with {}",
                self.currency.code(),
                rhs.currency.code()
            )));
        }
        Ok(())
    }

    /// Addition; fails on currency mismatch or overflow.
    pub fn checked_add(self, rhs: Money) -> ResultEngine<Money> {
        self.ensure_same_currency(rhs)?;
        let amount = self
            .amount_minor
            .checked_add(rhs.amount_minor)
            .ok_or_else(|| EngineError::InvalidAmount("amount overflow".to_string()))?;
        Ok(Money::new(amount, self.currency))
    }

    /// Subtraction; may yield a negative amount in intermediate computation.
    pub fn checked_sub(self, rhs: Money) -> ResultEngine<Money> {
        self.ensure_same_currency(rhs)?;
        let amount = self
            .amount_minor
            .checked_sub(rhs.amount_minor)
            .ok_or_else(|| EngineError::InvalidAmount("amount overflow".to_string()))?;
        Ok(Money::new(amount, self.currency))
    }

    /// Comparison; fails on currency mismatch.
    pub fn compare(self, rhs: Money) -> ResultEngine<Ordering> {
        self.ensure_same_currency(rhs)?;
        Ok(self.amount_minor.cmp(&rhs.amount_minor))
    }

    /// Splits the amount into `parts` shares whose sum is exactly `self`.
    ///
    /// Integer minor-unit division; the remainder (`amount mod parts`) is
    /// handed out one minor unit at a time to the leading shares, so shares
    /// differ by at most one minor unit. Callers that need a deterministic
    /// assignment order the recipients before calling.
    pub fn split_even(self, parts: usize) -> ResultEngine<Vec<Money>> {
        if parts == 0 {
            return Err(EngineError::InvalidAmount(
                "cannot split between zero parts".to_string(),
            ));
        }
        if self.amount_minor < 0 {
            return Err(EngineError::InvalidAmount(
                "cannot split a negative amount".to_string(),
            ));
        }
        let n = parts as i64;
        let base = self.amount_minor / n;
        let remainder = self.amount_minor % n;

        let shares = (0..n)
            .map(|i| {
                let extra = i64::from(i < remainder);
                Money::new(base + extra, self.currency)
            })
            .collect();
        Ok(shares)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.amount_minor < 0 { "-" } else { "" };
        let abs = self.amount_minor.unsigned_abs();
        let scale = 10u64.pow(u32::from(self.currency.minor_units()));
        let major = abs / scale;
        let minor = abs % scale;
        write!(
            f,
            "{sign}{major}.{minor:0width$} {code}",
            width = self.currency.minor_units() as usize,
            code = self.currency.code()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats_minor_units() {
        assert_eq!(Money::new(0, Currency::Uyu).to_string(), "0.00 UYU");
        assert_eq!(Money::new(1, Currency::Uyu).to_string(), "0.01 UYU");
        assert_eq!(Money::new(1050, Currency::Usd).to_string(), "10.50 USD");
        assert_eq!(Money::new(-1050, Currency::Eur).to_string(), "-10.50 EUR");
    }

    #[test]
    fn add_rejects_currency_mismatch() {
        let a = Money::new(100, Currency::Uyu);
        let b = Money::new(100, Currency::Usd);
        assert!(matches!(
            a.checked_add(b),
            Err(EngineError::CurrencyMismatch(_))
        ));
        assert!(matches!(
            a.compare(b),
            Err(EngineError::CurrencyMismatch(_))
        ));
    }

    #[test]
    fn split_even_is_exact() {
        let shares = Money::new(1000, Currency::Uyu).split_even(2).unwrap();
        assert_eq!(
            shares.iter().copied().map(Money::amount_minor).collect::<Vec<_>>(),
            vec![500, 500]
        );

        let shares = Money::new(1001, Currency::Uyu).split_even(3).unwrap();
        assert_eq!(
            shares.iter().copied().map(Money::amount_minor).collect::<Vec<_>>(),
            vec![334, 334, 333]
        );
        assert_eq!(shares.iter().copied().map(Money::amount_minor).sum::<i64>(), 1001);
    }

    #[test]
    fn split_even_rejects_zero_parts() {
        assert!(Money::new(100, Currency::Uyu).split_even(0).is_err());
    }

    #[test]
    fn split_even_handles_amount_smaller_than_parts() {
        let shares = Money::new(2, Currency::Uyu).split_even(3).unwrap();
        assert_eq!(
            shares.iter().copied().map(Money::amount_minor).collect::<Vec<_>>(),
            vec![1, 1, 0]
        );
    }
}
