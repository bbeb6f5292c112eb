//! [`Money`]-related definitions.

use std::{fmt, str::FromStr};

use rust_decimal::{prelude::ToPrimitive as _, Decimal};

use crate::define_kind;

/// Amount of money in some [`Currency`].
///
/// Textual representation is `{amount}{currency}`, e.g. `1500.50USD`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Money {
    /// Amount of this [`Money`].
    pub amount: Decimal,

    /// [`Currency`] of this amount.
    pub currency: Currency,
}

impl Money {
    /// Indicates whether this [`Money`] amount is strictly positive.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { amount, currency } = self;
        if amount.is_integer() {
            write!(f, "{}{currency}", amount.to_i128().expect("integer"))
        } else {
            write!(f, "{amount}{currency}")
        }
    }
}

impl FromStr for Money {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let at = s
            .len()
            .checked_sub(3)
            .filter(|&at| at > 0 && s.is_char_boundary(at))
            .ok_or("too short")?;

        let (amount, currency) = s.split_at(at);
        let amount = Decimal::from_str(amount).map_err(|_| "invalid amount")?;
        let currency =
            Currency::from_str(currency).map_err(|_| "invalid currency")?;

        Ok(Self { amount, currency })
    }
}

define_kind! {
    #[doc = "Currency of a [`Money`] amount."]
    enum Currency {
        #[doc = "US Dollar."]
        Usd = 1,

        #[doc = "Euro."]
        Eur = 2,

        #[doc = "Cuban Peso."]
        Cup = 3,
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use rust_decimal::Decimal;

    use super::{Currency, Money};

    fn decimal(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn from_str() {
        assert_eq!(
            Money::from_str("1500.50USD").unwrap(),
            Money {
                amount: decimal("1500.50"),
                currency: Currency::Usd,
            },
        );
        assert_eq!(
            Money::from_str("980EUR").unwrap(),
            Money {
                amount: decimal("980"),
                currency: Currency::Eur,
            },
        );
        assert_eq!(
            Money::from_str("12000.00CUP").unwrap(),
            Money {
                amount: decimal("12000.00"),
                currency: Currency::Cup,
            },
        );

        assert!(Money::from_str("1500").is_err());
        assert!(Money::from_str("USD").is_err());
        assert!(Money::from_str("1500.50Us").is_err());
        assert!(Money::from_str("1500.50Dollars").is_err());
        assert!(Money::from_str("abcUSD").is_err());
        assert!(Money::from_str("1€€").is_err());
    }

    #[test]
    fn to_string() {
        assert_eq!(
            Money {
                amount: decimal("1500.50"),
                currency: Currency::Usd,
            }
            .to_string(),
            "1500.50USD",
        );
        assert_eq!(
            Money {
                amount: decimal("12000.00"),
                currency: Currency::Cup,
            }
            .to_string(),
            "12000CUP",
        );
    }

    #[test]
    fn positivity() {
        let money = |s| Money::from_str(s).unwrap();

        assert!(money("0.01USD").is_positive());
        assert!(!money("0EUR").is_positive());
        assert!(!money("-5CUP").is_positive());
    }
}
