//! Limit resolver: which ceiling governs a (number, style) pair.
//!
//! Resolution is a pure function of the round's rules and default ceilings.
//!
//! ## Priority
//!
//! 1. A specific-number rule for exactly this number. It governs every
//!    style of the number and shadows all range rules and the default.
//! 2. The most specific range rule whose kind matches the style and which
//!    covers the number (same digit length, inside `[start, end]`).
//!    Narrowest `end - start` wins; ties go to the lower ceiling, then to
//!    the earlier rule.
//! 3. The round's digit-class default, only when no range rule of any
//!    kind covers the number. The default caps the *sum* of all styles.
//! 4. Unlimited.
//!
//! Independently of the per-style ceiling, an `all` range rule caps the sum
//! of every style for the number (unless a specific-number rule exists).

use lottomatch_types::{
    BetNumber, LimitBreach, LimitKind, LimitRule, LimitScope, Round, StyleStakes, WagerStyle,
};
use rust_decimal::Decimal;

/// Where a ceiling came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CeilingSource {
    Specific,
    Range,
    Default,
}

/// The ceiling governing one (number, style) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ceiling {
    Limited {
        amount: Decimal,
        source: CeilingSource,
    },
    Unlimited,
}

impl Ceiling {
    #[must_use]
    pub fn amount(&self) -> Option<Decimal> {
        match self {
            Self::Limited { amount, .. } => Some(*amount),
            Self::Unlimited => None,
        }
    }
}

/// Resolves ceilings against one round's limit configuration.
#[derive(Debug, Clone, Copy)]
pub struct LimitResolver<'a> {
    rules: &'a [LimitRule],
    round: &'a Round,
}

impl<'a> LimitResolver<'a> {
    #[must_use]
    pub fn new(rules: &'a [LimitRule], round: &'a Round) -> Self {
        Self { rules, round }
    }

    /// Resolve the ceiling for one style of a number.
    #[must_use]
    pub fn resolve(&self, number: &BetNumber, style: WagerStyle) -> Ceiling {
        if let Some(amount) = self.specific(number) {
            return Ceiling::Limited {
                amount,
                source: CeilingSource::Specific,
            };
        }
        if let Some(amount) = self.narrowest_range(number, |kind| kind.constrains(style)) {
            return Ceiling::Limited {
                amount,
                source: CeilingSource::Range,
            };
        }
        if !self.rules.iter().any(|rule| rule.range_covers(number)) {
            if let Some(amount) = self.round.default_limit(number.digit_class()) {
                return Ceiling::Limited {
                    amount,
                    source: CeilingSource::Default,
                };
            }
        }
        Ceiling::Unlimited
    }

    /// The `all` aggregate ceiling for a number, if one applies.
    #[must_use]
    pub fn aggregate(&self, number: &BetNumber) -> Option<Decimal> {
        if self.specific(number).is_some() {
            return None;
        }
        self.narrowest_range(number, |kind| kind == LimitKind::All)
    }

    /// Every ceiling that applies to a number, ready to check stakes against.
    #[must_use]
    pub fn plan(&self, number: &BetNumber) -> NumberLimits {
        let mut limits = NumberLimits {
            bet_number: number.clone(),
            per_style: Vec::new(),
            all_styles: self.aggregate(number),
            round_default: None,
        };
        for style in WagerStyle::ALL {
            match self.resolve(number, style) {
                Ceiling::Limited {
                    amount,
                    source: CeilingSource::Specific | CeilingSource::Range,
                } => limits.per_style.push((style, amount)),
                Ceiling::Limited {
                    amount,
                    source: CeilingSource::Default,
                } => limits.round_default = Some(amount),
                Ceiling::Unlimited => {}
            }
        }
        limits
    }

    fn specific(&self, number: &BetNumber) -> Option<Decimal> {
        self.rules.iter().find_map(|rule| match rule {
            LimitRule::Number {
                bet_number,
                max_amount,
            } if bet_number == number => Some(*max_amount),
            _ => None,
        })
    }

    fn narrowest_range(
        &self,
        number: &BetNumber,
        kind_matches: impl Fn(LimitKind) -> bool,
    ) -> Option<Decimal> {
        self.rules
            .iter()
            .filter(|rule| match rule {
                LimitRule::Range { kind, .. } => kind_matches(*kind),
                LimitRule::Number { .. } => false,
            })
            .filter(|rule| rule.range_covers(number))
            // min_by_key keeps the first of equal keys, so position breaks the last tie.
            .min_by_key(|rule| (rule.width().unwrap_or(u64::MAX), rule.max_amount()))
            .map(LimitRule::max_amount)
    }
}

/// All ceilings resolved for one bet number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberLimits {
    pub bet_number: BetNumber,
    /// Per-style ceilings from specific-number or range rules.
    pub per_style: Vec<(WagerStyle, Decimal)>,
    /// `all` range ceiling on the sum of styles.
    pub all_styles: Option<Decimal>,
    /// Digit-class default on the sum of styles.
    pub round_default: Option<Decimal>,
}

impl NumberLimits {
    #[must_use]
    pub fn is_unlimited(&self) -> bool {
        self.per_style.is_empty() && self.all_styles.is_none() && self.round_default.is_none()
    }

    /// Every ceiling `existing + incoming` would exceed. Per-style ceilings
    /// are only checked for styles the incoming stakes actually play.
    #[must_use]
    pub fn breaches(&self, existing: &StyleStakes, incoming: &StyleStakes) -> Vec<LimitBreach> {
        let mut out = Vec::new();
        for &(style, ceiling) in &self.per_style {
            let add = incoming.get(style);
            if add.is_zero() {
                continue;
            }
            self.push_if_over(&mut out, LimitScope::Style(style), ceiling, existing.get(style), add);
        }
        let total = incoming.total();
        if !total.is_zero() {
            if let Some(ceiling) = self.all_styles {
                self.push_if_over(&mut out, LimitScope::AllStyles, ceiling, existing.total(), total);
            }
            if let Some(ceiling) = self.round_default {
                self.push_if_over(&mut out, LimitScope::RoundDefault, ceiling, existing.total(), total);
            }
        }
        out
    }

    fn push_if_over(
        &self,
        out: &mut Vec<LimitBreach>,
        scope: LimitScope,
        ceiling: Decimal,
        exposure: Decimal,
        incoming: Decimal,
    ) {
        if exposure + incoming > ceiling {
            out.push(LimitBreach {
                bet_number: self.bet_number.clone(),
                scope,
                ceiling,
                exposure,
                incoming,
            });
        }
    }
}
