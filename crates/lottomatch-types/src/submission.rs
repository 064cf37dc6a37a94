//! Incoming wager submissions.

use serde::{Deserialize, Serialize};

use crate::{BetNumber, LottoError, Principal, Result, RoundId, StyleStakes, constants};

/// One submitted line: a bet number and its stake per style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WagerLine {
    pub bet_number: BetNumber,
    pub stakes: StyleStakes,
}

impl WagerLine {
    #[must_use]
    pub fn new(bet_number: BetNumber, stakes: StyleStakes) -> Self {
        Self { bet_number, stakes }
    }
}

/// A batch of wager lines submitted together against one round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub principal: Principal,
    pub round_id: RoundId,
    pub lines: Vec<WagerLine>,
    #[serde(default)]
    pub note: Option<String>,
}

impl Submission {
    #[must_use]
    pub fn new(principal: Principal, round_id: RoundId, lines: Vec<WagerLine>) -> Self {
        Self {
            principal,
            round_id,
            lines,
            note: None,
        }
    }

    /// Shape checks that need no store access.
    ///
    /// # Errors
    /// Returns `InvalidWager` for empty submissions, too many lines,
    /// negative stakes, or lines with nothing staked.
    pub fn validate(&self) -> Result<()> {
        if self.lines.is_empty() {
            return Err(LottoError::InvalidWager {
                reason: "submission has no lines".to_string(),
            });
        }
        if self.lines.len() > constants::MAX_LINES_PER_SUBMISSION {
            return Err(LottoError::InvalidWager {
                reason: format!(
                    "submission has {} lines, max {}",
                    self.lines.len(),
                    constants::MAX_LINES_PER_SUBMISSION
                ),
            });
        }
        for line in &self.lines {
            let stakes = &line.stakes;
            if [stakes.top, stakes.bottom, stakes.tote]
                .iter()
                .any(|s| s.is_sign_negative())
            {
                return Err(LottoError::InvalidWager {
                    reason: format!("negative stake on {}", line.bet_number),
                });
            }
            if stakes.total().is_zero() {
                return Err(LottoError::InvalidWager {
                    reason: format!("nothing staked on {}", line.bet_number),
                });
            }
        }
        Ok(())
    }
}
