//! Recurrence math: the next betting window of a product.
//!
//! Pure functions of the product, an anchor and the current instant. Local
//! wall-clock settings (`HH:MM`, calendar days) are interpreted in the
//! operating timezone; everything returned is a UTC instant.
//!
//! ## Strategies
//!
//! - **interval**: open at the anchor instant (truncated to the minute),
//!   close `interval_minutes` later, stepped forward until the cutoff is in
//!   the future.
//! - **calendar** (`daily`, `onlyday`, `monthly_fixed_days`,
//!   `monthly_floating_dates`): scan day by day from the anchor's local day
//!   for a valid day whose cutoff is in the future. The open day is the
//!   cutoff day shifted by `betting_skip_start_day`.

use chrono::{DateTime, Datelike, Days, FixedOffset, NaiveDate, TimeDelta, Timelike, Utc};
use lottomatch_types::{GenerationStrategy, LotteryProduct, LottoError, Result};

/// Where the search for the next window starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// The product has never had a round; start from now.
    First,
    /// Start from the cutoff of the product's latest round.
    After(DateTime<Utc>),
}

/// A computed betting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub open: DateTime<Utc>,
    pub cutoff: DateTime<Utc>,
}

/// Compute the next window for `product`.
///
/// # Errors
/// - `RecurrenceConfig` if the product's parameters are unusable or yield
///   `open >= cutoff`
/// - `GenerationExhausted` if no calendar day within `horizon_days` fits
pub fn next_window(
    product: &LotteryProduct,
    anchor: Anchor,
    now: DateTime<Utc>,
    tz: FixedOffset,
    horizon_days: u32,
) -> Result<Window> {
    check_parameters(product)?;
    let window = match product.generation_strategy {
        GenerationStrategy::Interval => interval_window(product, anchor, now)?,
        _ => calendar_window(product, anchor, now, tz, horizon_days)?,
    };
    if window.open >= window.cutoff {
        return Err(config_error(
            product,
            format!("open {} is not before cutoff {}", window.open, window.cutoff),
        ));
    }
    Ok(window)
}

/// Whether `day` is a drawing day for a calendar strategy.
#[must_use]
pub fn is_valid_day(product: &LotteryProduct, day: NaiveDate) -> bool {
    match product.generation_strategy {
        GenerationStrategy::Daily => true,
        GenerationStrategy::Onlyday => product
            .specific_days_of_week
            .contains(&day.weekday().num_days_from_sunday()),
        GenerationStrategy::MonthlyFixedDays | GenerationStrategy::MonthlyFloatingDates => {
            product.monthly_fixed_days.contains(&day.day())
                || product
                    .monthly_floating_dates
                    .iter()
                    .any(|f| f.month == day.month() && f.day == day.day())
        }
        GenerationStrategy::Interval => false,
    }
}

fn check_parameters(product: &LotteryProduct) -> Result<()> {
    match product.generation_strategy {
        GenerationStrategy::Interval => match product.interval_minutes {
            Some(minutes) if minutes > 0 => Ok(()),
            _ => Err(config_error(product, "interval_minutes must be positive".to_string())),
        },
        GenerationStrategy::Daily => Ok(()),
        GenerationStrategy::Onlyday => {
            if product.specific_days_of_week.is_empty() {
                return Err(config_error(product, "specific_days_of_week is empty".to_string()));
            }
            if let Some(bad) = product.specific_days_of_week.iter().find(|d| **d > 6) {
                return Err(config_error(
                    product,
                    format!("day of week {bad} outside 0 (Sunday)..=6"),
                ));
            }
            Ok(())
        }
        GenerationStrategy::MonthlyFixedDays | GenerationStrategy::MonthlyFloatingDates => {
            if product.monthly_fixed_days.is_empty() && product.monthly_floating_dates.is_empty() {
                return Err(config_error(
                    product,
                    "monthly_fixed_days and monthly_floating_dates are both empty".to_string(),
                ));
            }
            if let Some(bad) = product.monthly_fixed_days.iter().find(|d| !(1..=31).contains(*d)) {
                return Err(config_error(product, format!("day of month {bad} outside 1..=31")));
            }
            Ok(())
        }
    }
}

fn interval_window(product: &LotteryProduct, anchor: Anchor, now: DateTime<Utc>) -> Result<Window> {
    let minutes = product.interval_minutes.unwrap_or_default();
    let step = TimeDelta::minutes(i64::from(minutes));
    let base = match anchor {
        Anchor::First => now,
        Anchor::After(cutoff) => cutoff,
    };
    let base = truncate_to_minute(base);
    let mut open = base;
    let mut cutoff = base + step;
    if cutoff <= now {
        let elapsed = (now - cutoff).num_seconds();
        let steps = elapsed / step.num_seconds() + 1;
        let skip = TimeDelta::minutes(steps.saturating_mul(i64::from(minutes)));
        open += skip;
        cutoff += skip;
    }
    Ok(Window { open, cutoff })
}

fn calendar_window(
    product: &LotteryProduct,
    anchor: Anchor,
    now: DateTime<Utc>,
    tz: FixedOffset,
    horizon_days: u32,
) -> Result<Window> {
    let (base, first) = match anchor {
        Anchor::First => (now, true),
        Anchor::After(cutoff) => (cutoff, false),
    };
    let base_day = base.with_timezone(&tz).date_naive();

    for offset in 0..horizon_days {
        let Some(day) = base_day.checked_add_days(Days::new(u64::from(offset))) else {
            break;
        };
        if (!first && day == base_day) || !is_valid_day(product, day) {
            continue;
        }
        let cutoff = local_instant(product, day, product.betting_cutoff_time, tz)?;
        if cutoff <= now {
            continue;
        }
        let open_day = day
            .checked_add_signed(TimeDelta::days(i64::from(product.betting_skip_start_day)))
            .ok_or_else(|| config_error(product, "betting_skip_start_day out of range".to_string()))?;
        let open = local_instant(product, open_day, product.betting_start_time, tz)?;
        return Ok(Window { open, cutoff });
    }

    Err(LottoError::GenerationExhausted {
        product_id: product.id,
        horizon_days,
    })
}

fn local_instant(
    product: &LotteryProduct,
    day: NaiveDate,
    time: chrono::NaiveTime,
    tz: FixedOffset,
) -> Result<DateTime<Utc>> {
    day.and_time(time)
        .and_local_timezone(tz)
        .single()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| config_error(product, format!("{day} {time} has no single local instant")))
}

fn truncate_to_minute(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(instant)
}

fn config_error(product: &LotteryProduct, reason: String) -> LottoError {
    LottoError::RecurrenceConfig {
        product_id: product.id,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveTime, TimeZone};
    use lottomatch_types::FloatingDate;

    use super::*;

    const HORIZON: u32 = 730;

    fn bangkok() -> FixedOffset {
        FixedOffset::east_opt(7 * 3600).unwrap()
    }

    /// A UTC instant from Bangkok wall-clock values.
    fn local(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        bangkok()
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn product(strategy: GenerationStrategy) -> LotteryProduct {
        let mut p = LotteryProduct::new("Test", strategy);
        p.betting_start_time = hm(6, 0);
        p.betting_cutoff_time = hm(15, 30);
        p
    }

    #[test]
    fn interval_first_round_starts_now() {
        let mut p = product(GenerationStrategy::Interval);
        p.interval_minutes = Some(30);
        let now = local(2026, 5, 1, 10, 7) + TimeDelta::seconds(42);
        let w = next_window(&p, Anchor::First, now, bangkok(), HORIZON).unwrap();
        assert_eq!(w.open, local(2026, 5, 1, 10, 7));
        assert_eq!(w.cutoff, local(2026, 5, 1, 10, 37));
    }

    #[test]
    fn interval_steps_thirty_minutes_after_previous_cutoff() {
        let mut p = product(GenerationStrategy::Interval);
        p.interval_minutes = Some(30);
        let previous = local(2026, 5, 1, 10, 0);
        let now = local(2026, 5, 1, 10, 0);
        let w = next_window(&p, Anchor::After(previous), now, bangkok(), HORIZON).unwrap();
        assert_eq!(w.open, local(2026, 5, 1, 10, 0));
        assert_eq!(w.cutoff, local(2026, 5, 1, 10, 30));
    }

    #[test]
    fn interval_catches_up_with_stale_anchor() {
        let mut p = product(GenerationStrategy::Interval);
        p.interval_minutes = Some(30);
        let previous = local(2026, 5, 1, 10, 0);
        let now = local(2026, 5, 1, 12, 45);
        let w = next_window(&p, Anchor::After(previous), now, bangkok(), HORIZON).unwrap();
        assert_eq!(w.open, local(2026, 5, 1, 12, 30));
        assert_eq!(w.cutoff, local(2026, 5, 1, 13, 0));
        assert!(w.cutoff > now);

        // Landing exactly on a boundary moves one more step.
        let w = next_window(&p, Anchor::After(previous), local(2026, 5, 1, 13, 0), bangkok(), HORIZON)
            .unwrap();
        assert_eq!(w.cutoff, local(2026, 5, 1, 13, 30));
    }

    #[test]
    fn interval_without_minutes_is_config_error() {
        let p = product(GenerationStrategy::Interval);
        let err = next_window(&p, Anchor::First, local(2026, 5, 1, 0, 0), bangkok(), HORIZON).unwrap_err();
        assert!(matches!(err, LottoError::RecurrenceConfig { .. }));
    }

    #[test]
    fn daily_first_round_is_today_when_cutoff_ahead() {
        let p = product(GenerationStrategy::Daily);
        let w = next_window(&p, Anchor::First, local(2026, 5, 1, 9, 0), bangkok(), HORIZON).unwrap();
        assert_eq!(w.cutoff, local(2026, 5, 1, 15, 30));
        assert_eq!(w.open, local(2026, 5, 1, 6, 0));
    }

    #[test]
    fn daily_first_round_moves_to_tomorrow_after_cutoff() {
        let p = product(GenerationStrategy::Daily);
        let w = next_window(&p, Anchor::First, local(2026, 5, 1, 16, 0), bangkok(), HORIZON).unwrap();
        assert_eq!(w.cutoff, local(2026, 5, 2, 15, 30));
    }

    #[test]
    fn daily_never_reuses_the_anchor_day() {
        let p = product(GenerationStrategy::Daily);
        let previous = local(2026, 5, 1, 15, 30);
        // Even if it were still early on the anchor day, the next round is tomorrow.
        let now = local(2026, 5, 1, 8, 0);
        let w = next_window(&p, Anchor::After(previous), now, bangkok(), HORIZON).unwrap();
        assert_eq!(w.cutoff, local(2026, 5, 2, 15, 30));
    }

    #[test]
    fn open_is_cutoff_day_plus_skip_at_start_time() {
        let mut p = product(GenerationStrategy::Daily);
        p.betting_skip_start_day = -1;
        p.betting_start_time = hm(16, 0);
        let w = next_window(&p, Anchor::First, local(2026, 5, 1, 9, 0), bangkok(), HORIZON).unwrap();
        assert_eq!(w.cutoff, local(2026, 5, 1, 15, 30));
        assert_eq!(w.open, local(2026, 4, 30, 16, 0));
    }

    #[test]
    fn open_after_cutoff_is_config_error() {
        let mut p = product(GenerationStrategy::Daily);
        p.betting_start_time = hm(16, 0);
        let err = next_window(&p, Anchor::First, local(2026, 5, 1, 9, 0), bangkok(), HORIZON).unwrap_err();
        assert!(matches!(err, LottoError::RecurrenceConfig { .. }));
    }

    #[test]
    fn onlyday_picks_matching_weekday() {
        let mut p = product(GenerationStrategy::Onlyday);
        // 2026-05-01 is a Friday; ask for Monday (1) and Wednesday (3).
        p.specific_days_of_week = vec![1, 3];
        let w = next_window(&p, Anchor::First, local(2026, 5, 1, 9, 0), bangkok(), HORIZON).unwrap();
        assert_eq!(w.cutoff, local(2026, 5, 4, 15, 30));

        let w = next_window(&p, Anchor::After(w.cutoff), w.cutoff, bangkok(), HORIZON).unwrap();
        assert_eq!(w.cutoff, local(2026, 5, 6, 15, 30));
    }

    #[test]
    fn sunday_is_zero() {
        let mut p = product(GenerationStrategy::Onlyday);
        p.specific_days_of_week = vec![0];
        let w = next_window(&p, Anchor::First, local(2026, 5, 1, 9, 0), bangkok(), HORIZON).unwrap();
        assert_eq!(w.cutoff, local(2026, 5, 3, 15, 30));
    }

    #[test]
    fn monthly_fixed_days_and_floating_dates() {
        let mut p = product(GenerationStrategy::MonthlyFixedDays);
        p.monthly_fixed_days = vec![1, 16];
        let previous = local(2026, 5, 1, 15, 30);
        let w = next_window(&p, Anchor::After(previous), previous, bangkok(), HORIZON).unwrap();
        assert_eq!(w.cutoff, local(2026, 5, 16, 15, 30));

        let mut p = product(GenerationStrategy::MonthlyFloatingDates);
        p.monthly_floating_dates = vec![FloatingDate { month: 12, day: 30 }];
        let w = next_window(&p, Anchor::After(previous), previous, bangkok(), HORIZON).unwrap();
        assert_eq!(w.cutoff, local(2026, 12, 30, 15, 30));
    }

    #[test]
    fn unreachable_date_exhausts_horizon() {
        let mut p = product(GenerationStrategy::MonthlyFloatingDates);
        p.monthly_floating_dates = vec![FloatingDate { month: 2, day: 30 }];
        let err = next_window(&p, Anchor::First, local(2026, 5, 1, 9, 0), bangkok(), HORIZON).unwrap_err();
        assert!(matches!(err, LottoError::GenerationExhausted { horizon_days: 730, .. }));
    }

    #[test]
    fn local_day_boundary_uses_operating_timezone() {
        let p = product(GenerationStrategy::Daily);
        // 2026-05-01 20:00 UTC is already 2026-05-02 03:00 in Bangkok.
        let now = Utc.with_ymd_and_hms(2026, 5, 1, 20, 0, 0).unwrap();
        let w = next_window(&p, Anchor::First, now, bangkok(), HORIZON).unwrap();
        assert_eq!(w.cutoff, local(2026, 5, 2, 15, 30));
        assert_eq!(w.cutoff, Utc.with_ymd_and_hms(2026, 5, 2, 8, 30, 0).unwrap());
    }

    #[test]
    fn empty_weekday_set_is_config_error() {
        let p = product(GenerationStrategy::Onlyday);
        let err = next_window(&p, Anchor::First, local(2026, 5, 1, 9, 0), bangkok(), HORIZON).unwrap_err();
        assert!(matches!(err, LottoError::RecurrenceConfig { .. }));
    }
}
