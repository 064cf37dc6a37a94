//! Bet numbers, digit classes and wager styles.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{LottoError, Result, constants};

// ---------------------------------------------------------------------------
// BetNumber
// ---------------------------------------------------------------------------

/// A validated bet number: a non-empty string of ASCII digits.
///
/// Leading zeros are significant (`"07"` and `"7"` are different numbers
/// with different digit lengths).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BetNumber(String);

impl BetNumber {
    /// Parse and validate a bet number.
    ///
    /// # Errors
    /// Returns `InvalidWager` for empty, non-digit or over-long input.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.is_empty() || raw.len() > constants::MAX_BET_DIGITS {
            return Err(LottoError::InvalidWager {
                reason: format!(
                    "bet number {raw:?} must have 1..={} digits",
                    constants::MAX_BET_DIGITS
                ),
            });
        }
        if !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(LottoError::InvalidWager {
                reason: format!("bet number {raw:?} must contain only digits"),
            });
        }
        Ok(Self(raw.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of digits, including leading zeros.
    #[must_use]
    pub fn digit_len(&self) -> usize {
        self.0.len()
    }

    /// Numeric value, ignoring leading zeros.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
            .bytes()
            .fold(0u64, |acc, b| acc * 10 + u64::from(b - b'0'))
    }

    #[must_use]
    pub fn digit_class(&self) -> DigitClass {
        DigitClass::of_len(self.digit_len())
    }
}

impl TryFrom<String> for BetNumber {
    type Error = LottoError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<BetNumber> for String {
    fn from(value: BetNumber) -> Self {
        value.0
    }
}

impl fmt::Display for BetNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// DigitClass
// ---------------------------------------------------------------------------

/// Digit bucket that selects the default ceiling and the payout rate row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DigitClass {
    /// Numbers with at most two digits.
    TwoDigit,
    /// Numbers with three or more digits.
    ThreeDigit,
}

impl DigitClass {
    #[must_use]
    pub fn of_len(len: usize) -> Self {
        if len <= 2 {
            Self::TwoDigit
        } else {
            Self::ThreeDigit
        }
    }
}

impl fmt::Display for DigitClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TwoDigit => write!(f, "2D"),
            Self::ThreeDigit => write!(f, "3D"),
        }
    }
}

// ---------------------------------------------------------------------------
// WagerStyle
// ---------------------------------------------------------------------------

/// How a bet number is played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WagerStyle {
    /// Straight play on the top prize digits.
    #[serde(alias = "straight")]
    Top,
    /// Straight play on the bottom prize digits.
    Bottom,
    /// Permutation play: any ordering of the drawn digits wins.
    Tote,
}

impl WagerStyle {
    pub const ALL: [Self; 3] = [Self::Top, Self::Bottom, Self::Tote];
}

impl fmt::Display for WagerStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Top => write!(f, "TOP"),
            Self::Bottom => write!(f, "BOTTOM"),
            Self::Tote => write!(f, "TOTE"),
        }
    }
}

// ---------------------------------------------------------------------------
// StyleStakes
// ---------------------------------------------------------------------------

/// Stake per wager style for one bet number. Zero means "not played".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleStakes {
    #[serde(default)]
    pub top: Decimal,
    #[serde(default)]
    pub bottom: Decimal,
    #[serde(default)]
    pub tote: Decimal,
}

impl StyleStakes {
    #[must_use]
    pub fn top(amount: Decimal) -> Self {
        Self {
            top: amount,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn get(&self, style: WagerStyle) -> Decimal {
        match style {
            WagerStyle::Top => self.top,
            WagerStyle::Bottom => self.bottom,
            WagerStyle::Tote => self.tote,
        }
    }

    pub fn add(&mut self, style: WagerStyle, amount: Decimal) {
        match style {
            WagerStyle::Top => self.top += amount,
            WagerStyle::Bottom => self.bottom += amount,
            WagerStyle::Tote => self.tote += amount,
        }
    }

    /// Merge another set of stakes into this one.
    pub fn absorb(&mut self, other: &Self) {
        for style in WagerStyle::ALL {
            self.add(style, other.get(style));
        }
    }

    #[must_use]
    pub fn total(&self) -> Decimal {
        self.top + self.bottom + self.tote
    }

    /// Styles with a nonzero stake, in `WagerStyle::ALL` order.
    pub fn played(&self) -> impl Iterator<Item = (WagerStyle, Decimal)> + '_ {
        WagerStyle::ALL
            .into_iter()
            .map(|style| (style, self.get(style)))
            .filter(|(_, amount)| !amount.is_zero())
    }
}
