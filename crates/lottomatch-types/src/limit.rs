//! Limit rules and exemptions scoped to a round.
//!
//! A round's limit configuration is the set of [`LimitRule`]s plus the
//! round's own default 2-digit / 3-digit ceilings. Rules are replaced
//! wholesale on edit, never patched in place.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{BetNumber, LottoError, Result, Role, RoundId, UserId, WagerStyle};

/// Which wager style a range rule constrains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitKind {
    #[serde(alias = "straight")]
    Top,
    Bottom,
    Tote,
    /// Aggregate ceiling over every style of the number.
    All,
}

impl LimitKind {
    /// Whether this per-style kind constrains `style`. `All` never does;
    /// it is checked separately as an aggregate.
    #[must_use]
    pub fn constrains(self, style: WagerStyle) -> bool {
        matches!(
            (self, style),
            (Self::Top, WagerStyle::Top)
                | (Self::Bottom, WagerStyle::Bottom)
                | (Self::Tote, WagerStyle::Tote)
        )
    }
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Top => write!(f, "TOP"),
            Self::Bottom => write!(f, "BOTTOM"),
            Self::Tote => write!(f, "TOTE"),
            Self::All => write!(f, "ALL"),
        }
    }
}

/// A single ceiling rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule_type", rename_all = "snake_case")]
pub enum LimitRule {
    /// Exact bet number → ceiling for every style of that number.
    Number {
        bet_number: BetNumber,
        max_amount: Decimal,
    },
    /// Inclusive numeric range gated on digit length and style.
    Range {
        range_start: String,
        range_end: String,
        max_amount: Decimal,
        #[serde(rename = "number_limit_types")]
        kind: LimitKind,
    },
}

impl LimitRule {
    /// Build a range rule from string bounds.
    #[must_use]
    pub fn range(start: &str, end: &str, kind: LimitKind, max_amount: Decimal) -> Self {
        Self::Range {
            range_start: start.to_string(),
            range_end: end.to_string(),
            max_amount,
            kind,
        }
    }

    #[must_use]
    pub fn number(bet_number: BetNumber, max_amount: Decimal) -> Self {
        Self::Number {
            bet_number,
            max_amount,
        }
    }

    #[must_use]
    pub fn max_amount(&self) -> Decimal {
        match self {
            Self::Number { max_amount, .. } | Self::Range { max_amount, .. } => *max_amount,
        }
    }

    /// Whether a range rule covers `number`: same digit length as both
    /// bounds, and numerically inside `[start, end]`. Number rules never
    /// match here; they are looked up exactly.
    #[must_use]
    pub fn range_covers(&self, number: &BetNumber) -> bool {
        let Self::Range {
            range_start,
            range_end,
            ..
        } = self
        else {
            return false;
        };
        let len = number.digit_len();
        if range_start.len() != len || range_end.len() != len {
            return false;
        }
        let (Some(start), Some(end)) = (numeric(range_start), numeric(range_end)) else {
            return false;
        };
        (start..=end).contains(&number.value())
    }

    /// `end - start` for range rules; `None` for number rules.
    #[must_use]
    pub fn width(&self) -> Option<u64> {
        match self {
            Self::Range {
                range_start,
                range_end,
                ..
            } => Some(numeric(range_end)?.saturating_sub(numeric(range_start)?)),
            Self::Number { .. } => None,
        }
    }

    /// Structural validation applied whenever rules are replaced.
    ///
    /// # Errors
    /// Returns `InvalidLimitRule` describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.max_amount() <= Decimal::ZERO {
            return Err(LottoError::InvalidLimitRule {
                reason: format!("max_amount {} must be positive", self.max_amount()),
            });
        }
        if let Self::Range {
            range_start,
            range_end,
            ..
        } = self
        {
            let start = BetNumber::parse(range_start).map_err(|_| invalid_bound(range_start))?;
            let end = BetNumber::parse(range_end).map_err(|_| invalid_bound(range_end))?;
            if start.digit_len() != end.digit_len() {
                return Err(LottoError::InvalidLimitRule {
                    reason: format!(
                        "range bounds {range_start}..{range_end} must have the same digit length"
                    ),
                });
            }
            if start.value() > end.value() {
                return Err(LottoError::InvalidLimitRule {
                    reason: format!("range start {range_start} is after end {range_end}"),
                });
            }
        }
        Ok(())
    }
}

fn invalid_bound(raw: &str) -> LottoError {
    LottoError::InvalidLimitRule {
        reason: format!("range bound {raw:?} is not a digit string"),
    }
}

fn numeric(raw: &str) -> Option<u64> {
    BetNumber::parse(raw).ok().map(|n| n.value())
}

// ---------------------------------------------------------------------------
// Exemption
// ---------------------------------------------------------------------------

/// Who an exemption applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "exemption_type", rename_all = "snake_case")]
pub enum ExemptionTarget {
    User { user_id: UserId },
    Role { user_role: Role },
}

/// Per-round waiver of every limit check for a user or a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exemption {
    pub lotto_round_id: RoundId,
    #[serde(flatten)]
    pub target: ExemptionTarget,
}

impl Exemption {
    #[must_use]
    pub fn user(round_id: RoundId, user_id: UserId) -> Self {
        Self {
            lotto_round_id: round_id,
            target: ExemptionTarget::User { user_id },
        }
    }

    #[must_use]
    pub fn role(round_id: RoundId, role: impl Into<String>) -> Self {
        Self {
            lotto_round_id: round_id,
            target: ExemptionTarget::Role {
                user_role: Role::new(role),
            },
        }
    }

    #[must_use]
    pub fn applies_to(&self, user_id: UserId, role: &Role) -> bool {
        match &self.target {
            ExemptionTarget::User { user_id: exempt } => *exempt == user_id,
            ExemptionTarget::Role { user_role } => user_role == role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(raw: &str) -> BetNumber {
        BetNumber::parse(raw).unwrap()
    }

    #[test]
    fn range_covers_inclusive_bounds() {
        let rule = LimitRule::range("10", "19", LimitKind::Top, Decimal::new(100, 0));
        assert!(rule.range_covers(&n("10")));
        assert!(rule.range_covers(&n("19")));
        assert!(!rule.range_covers(&n("20")));
        assert_eq!(rule.width(), Some(9));
    }

    #[test]
    fn range_is_gated_on_digit_length() {
        let rule = LimitRule::range("000", "099", LimitKind::Top, Decimal::new(100, 0));
        assert!(rule.range_covers(&n("012")));
        // Same numeric value, wrong digit length.
        assert!(!rule.range_covers(&n("12")));
    }

    #[test]
    fn number_rule_never_covers_as_range() {
        let rule = LimitRule::number(n("12"), Decimal::new(100, 0));
        assert!(!rule.range_covers(&n("12")));
        assert_eq!(rule.width(), None);
    }

    #[test]
    fn kind_constrains_matching_style_only() {
        assert!(LimitKind::Top.constrains(WagerStyle::Top));
        assert!(!LimitKind::Top.constrains(WagerStyle::Bottom));
        assert!(!LimitKind::All.constrains(WagerStyle::Tote));
    }

    #[test]
    fn validate_catches_bad_ranges() {
        let mixed = LimitRule::range("1", "99", LimitKind::Top, Decimal::ONE);
        assert!(matches!(mixed.validate(), Err(LottoError::InvalidLimitRule { .. })));
        let reversed = LimitRule::range("50", "10", LimitKind::Top, Decimal::ONE);
        assert!(reversed.validate().is_err());
        let negative = LimitRule::number(n("12"), Decimal::new(-1, 0));
        assert!(negative.validate().is_err());
        let zero = LimitRule::number(n("12"), Decimal::ZERO);
        assert!(zero.validate().is_err());
        let letters = LimitRule::range("ab", "cd", LimitKind::All, Decimal::ONE);
        assert!(letters.validate().is_err());
        let ok = LimitRule::range("00", "99", LimitKind::All, Decimal::ONE);
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn range_rule_serde_shape() {
        let rule = LimitRule::range("00", "49", LimitKind::Tote, Decimal::new(300, 0));
        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(json["rule_type"], "range");
        assert_eq!(json["number_limit_types"], "tote");
        assert_eq!(json["range_start"], "00");

        let straight: LimitRule = serde_json::from_str(
            r#"{"rule_type":"range","range_start":"00","range_end":"99",
                "max_amount":"10","number_limit_types":"straight"}"#,
        )
        .unwrap();
        assert!(matches!(straight, LimitRule::Range { kind: LimitKind::Top, .. }));
    }

    #[test]
    fn exemption_matching() {
        let round = RoundId::new();
        let user = UserId::new();
        let agent = Role::new("agent");
        assert!(Exemption::user(round, user).applies_to(user, &agent));
        assert!(!Exemption::user(round, UserId::new()).applies_to(user, &agent));
        assert!(Exemption::role(round, "agent").applies_to(UserId::new(), &agent));
        assert!(!Exemption::role(round, "admin").applies_to(user, &agent));
    }

    #[test]
    fn exemption_serde_shape() {
        let ex = Exemption::role(RoundId::new(), "agent");
        let json = serde_json::to_value(&ex).unwrap();
        assert_eq!(json["exemption_type"], "role");
        assert_eq!(json["user_role"], "agent");
        let back: Exemption = serde_json::from_value(json).unwrap();
        assert_eq!(back, ex);
    }
}
