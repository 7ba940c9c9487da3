//! # Money and Quantity
//!
//! Provides the `Money` and `Quantity` types for handling amounts safely.
//!
//! ## Why Decimal?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  With binary floating point:                                            │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A minimart also sells by weight:                                      │
//! │    0.25 kg × 3 edits ± 0.05 kg ... drift accumulates on every edit     │
//! │                                                                         │
//! │  OUR SOLUTION: base-10 Decimal for prices AND quantities               │
//! │    0.1 + 0.2 = 0.3 exactly                                              │
//! │    Rounding happens once, explicitly, when an amount is due            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use minimart_core::money::{Money, Quantity};
//!
//! let price = Money::from_cents(1099);          // 10.99
//! let weight = "0.5".parse::<Quantity>().unwrap();
//!
//! let line_total = price * weight;              // 5.495 (exact)
//! assert_eq!(line_total.round_currency(), Money::from_cents(550));
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use std::str::FromStr;

/// Decimal places of the store currency.
pub const CURRENCY_DECIMALS: u32 = 2;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary amount.
///
/// ## Design Decisions
/// - **Exact**: arithmetic never rounds; `round_currency` is explicit
/// - **Signed**: change and refunds can be computed as differences
/// - **Transparent serde**: a plain JSON number, as the ERP sends it
///
/// ## Where Money is Used
/// ```text
/// CatalogItem.price ──► CartLine.unit_price ──► CartLine.line_total
///                                                      │
///                     CartEngine.total() ◄─────────────┘
///                            │
///                            ▼
///               amount due ──► tendered ──► change
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero money.
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Wraps a decimal amount.
    #[inline]
    pub const fn new(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ```rust
    /// use minimart_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(1099).to_string(), "10.99");
    /// ```
    #[inline]
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, CURRENCY_DECIMALS))
    }

    /// Returns the underlying decimal amount.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Rounds to the currency's decimal places, midpoint away from zero.
    ///
    /// Applied to the amount due and for display; nothing else rounds.
    pub fn round_currency(&self) -> Money {
        Money(
            self.0
                .round_dp_with_strategy(CURRENCY_DECIMALS, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Multiplies a unit price by a quantity.
    ///
    /// ```rust
    /// use minimart_core::money::{Money, Quantity};
    ///
    /// let unit_price = Money::from_cents(299);
    /// let line_total = unit_price.multiply_quantity(Quantity::from_units(3));
    /// assert_eq!(line_total, Money::from_cents(897));
    /// ```
    #[inline]
    pub fn multiply_quantity(&self, quantity: Quantity) -> Money {
        Money(self.0 * quantity.value())
    }

    /// `multiply_quantity`, or `None` if the product leaves `Decimal` range.
    #[inline]
    pub fn checked_multiply_quantity(&self, quantity: Quantity) -> Option<Money> {
        self.0.checked_mul(quantity.value()).map(Money)
    }

    /// Addition, or `None` on overflow.
    #[inline]
    pub fn checked_add(&self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }
}

/// Shows the amount at currency precision, without a symbol.
///
/// The terminal adds the configured currency symbol for display.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.round_currency().0)
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim()).map(Money)
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<Quantity> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, quantity: Quantity) -> Self {
        self.multiply_quantity(quantity)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, Add::add)
    }
}

// =============================================================================
// Quantity Type
// =============================================================================

/// A quantity of an item: units, or fractional units for weighed goods.
///
/// Used both for cart line quantities and stock estimates, so a
/// reservation is exactly the quantity it was taken from the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(Decimal);

impl Quantity {
    pub const ZERO: Quantity = Quantity(Decimal::ZERO);

    /// One unit: what a scan adds and what the +/- buttons move.
    pub const ONE: Quantity = Quantity(Decimal::ONE);

    #[inline]
    pub const fn new(value: Decimal) -> Self {
        Quantity(value)
    }

    /// Whole units.
    #[inline]
    pub fn from_units(units: i64) -> Self {
        Quantity(Decimal::from(units))
    }

    #[inline]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    #[inline]
    pub fn abs(&self) -> Quantity {
        Quantity(self.0.abs())
    }

    /// Addition clamped at the largest representable quantity.
    #[inline]
    pub fn saturating_add(&self, other: Quantity) -> Quantity {
        Quantity(self.0.saturating_add(other.0))
    }
}

/// Displays without trailing zeros: `1`, `0.5`, `2.25`.
impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl FromStr for Quantity {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim()).map(Quantity)
    }
}

impl Add for Quantity {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Quantity(self.0 + other.0)
    }
}

impl AddAssign for Quantity {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Quantity {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Quantity(self.0 - other.0)
    }
}

impl SubAssign for Quantity {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Quantity {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Quantity(-self.0)
    }
}

impl Sum for Quantity {
    fn sum<I: Iterator<Item = Quantity>>(iter: I) -> Self {
        iter.fold(Quantity::ZERO, Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
