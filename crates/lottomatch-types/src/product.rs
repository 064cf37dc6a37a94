//! Lottery products and their recurrence configuration.
//!
//! A product is read-only to the engine: the round generator consults its
//! strategy to decide when the next round opens and closes, and the
//! admission controller reads its payout rate table.

use std::fmt;

use chrono::NaiveTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{DigitClass, ProductId, WagerStyle};

/// How successive rounds of a product are laid out in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStrategy {
    /// One round every calendar day.
    Daily,
    /// Back-to-back rounds of `interval_minutes` each.
    Interval,
    /// Rounds on fixed days of the month (plus floating exceptions).
    MonthlyFixedDays,
    /// Rounds on the floating month/day list (plus fixed days, if any).
    MonthlyFloatingDates,
    /// Rounds only on the configured days of the week.
    Onlyday,
}

impl GenerationStrategy {
    /// Whether the strategy scans calendar days (everything but `Interval`).
    #[must_use]
    pub fn is_calendar(self) -> bool {
        !matches!(self, Self::Interval)
    }
}

impl fmt::Display for GenerationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Daily => write!(f, "DAILY"),
            Self::Interval => write!(f, "INTERVAL"),
            Self::MonthlyFixedDays => write!(f, "MONTHLY_FIXED_DAYS"),
            Self::MonthlyFloatingDates => write!(f, "MONTHLY_FLOATING_DATES"),
            Self::Onlyday => write!(f, "ONLYDAY"),
        }
    }
}

/// A specific (month, day) pair, e.g. a draw moved to 17 January.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FloatingDate {
    pub month: u32,
    pub day: u32,
}

/// Payout multipliers for one digit class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleRates {
    pub top: Decimal,
    pub bottom: Decimal,
    pub tote: Decimal,
}

/// Payout rate table keyed by digit class and wager style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutRates {
    pub two_digit: StyleRates,
    pub three_digit: StyleRates,
}

impl PayoutRates {
    #[must_use]
    pub fn rate(&self, class: DigitClass, style: WagerStyle) -> Decimal {
        let row = match class {
            DigitClass::TwoDigit => &self.two_digit,
            DigitClass::ThreeDigit => &self.three_digit,
        };
        match style {
            WagerStyle::Top => row.top,
            WagerStyle::Bottom => row.bottom,
            WagerStyle::Tote => row.tote,
        }
    }
}

impl Default for PayoutRates {
    fn default() -> Self {
        Self {
            two_digit: StyleRates {
                top: Decimal::new(90, 0),
                bottom: Decimal::new(90, 0),
                tote: Decimal::new(13, 0),
            },
            three_digit: StyleRates {
                top: Decimal::new(900, 0),
                bottom: Decimal::new(150, 0),
                tote: Decimal::new(150, 0),
            },
        }
    }
}

/// A lottery product ("lotto type") and everything the generator needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LotteryProduct {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub rates: PayoutRates,
    pub generation_strategy: GenerationStrategy,
    #[serde(default)]
    pub interval_minutes: Option<u32>,
    #[serde(default)]
    pub monthly_fixed_days: Vec<u32>,
    #[serde(default)]
    pub monthly_floating_dates: Vec<FloatingDate>,
    /// Days of week, 0 = Sunday .. 6 = Saturday.
    #[serde(default)]
    pub specific_days_of_week: Vec<u32>,
    /// Days added to the cutoff's calendar day to get the open day.
    #[serde(default)]
    pub betting_skip_start_day: i32,
    #[serde(with = "hhmm")]
    pub betting_start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub betting_cutoff_time: NaiveTime,
    /// Seed for `Round::limit_2d_amount` on generated rounds.
    #[serde(default)]
    pub default_limit_2d: Option<Decimal>,
    /// Seed for `Round::limit_3d_amount` on generated rounds.
    #[serde(default)]
    pub default_limit_3d: Option<Decimal>,
}

impl LotteryProduct {
    /// A product with the given strategy and a 00:00 → 15:30 betting window.
    #[must_use]
    pub fn new(name: impl Into<String>, generation_strategy: GenerationStrategy) -> Self {
        Self {
            id: ProductId::new(),
            name: name.into(),
            rates: PayoutRates::default(),
            generation_strategy,
            interval_minutes: None,
            monthly_fixed_days: Vec::new(),
            monthly_floating_dates: Vec::new(),
            specific_days_of_week: Vec::new(),
            betting_skip_start_day: 0,
            betting_start_time: NaiveTime::MIN,
            betting_cutoff_time: NaiveTime::from_hms_opt(15, 30, 0).unwrap_or(NaiveTime::MIN),
            default_limit_2d: None,
            default_limit_3d: None,
        }
    }
}

/// Serde helpers for `HH:MM` local wall-clock strings.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, FORMAT)
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M:%S"))
            .map_err(|e| D::Error::custom(format!("invalid time of day {raw:?}: {e}")))
    }
}
