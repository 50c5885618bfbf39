//! Time-tiered end-of-session reward.
//!
//! A session of `n` questions finished within `2n` seconds pays triple, within
//! `3n` seconds double, otherwise single. The first unit of every
//! first-try-correct answer was already paid during play, so only the part
//! above it (the bonus) is still owed.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Seconds per question at or under which the elite tier applies.
pub const FAST_SECONDS_PER_QUESTION: u32 = 2;
/// Seconds per question at or under which the fast tier applies.
pub const NORMAL_SECONDS_PER_QUESTION: u32 = 3;

/// Reward bracket chosen by elapsed time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewardTier {
    Elite,
    Fast,
    Complete,
}

impl RewardTier {
    pub fn multiplier(self) -> u32 {
        match self {
            RewardTier::Elite => 3,
            RewardTier::Fast => 2,
            RewardTier::Complete => 1,
        }
    }

    /// Celebratory headline shown with the summary.
    pub fn headline(self) -> &'static str {
        match self {
            RewardTier::Elite => "Beyond the limit!!",
            RewardTier::Fast => "Godspeed!!",
            RewardTier::Complete => "Complete!",
        }
    }
}

impl fmt::Display for RewardTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RewardTier::Elite => write!(f, "elite"),
            RewardTier::Fast => write!(f, "fast"),
            RewardTier::Complete => write!(f, "complete"),
        }
    }
}

/// Gold owed at the end of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    pub tier: RewardTier,
    /// Gold already paid during play (one per first-try-correct answer).
    pub base_gold: u32,
    /// `base_gold * multiplier`.
    pub final_gold: u32,
    /// `final_gold - base_gold`; the amount still to credit.
    pub bonus_gold: u32,
}

impl Reward {
    pub fn multiplier(&self) -> u32 {
        self.tier.multiplier()
    }
}

/// Pick the tier for `elapsed_seconds` over `question_count` questions.
/// Both thresholds are inclusive.
pub fn tier_for(elapsed_seconds: u32, question_count: u32) -> RewardTier {
    let fast = question_count.saturating_mul(FAST_SECONDS_PER_QUESTION);
    let normal = question_count.saturating_mul(NORMAL_SECONDS_PER_QUESTION);

    if elapsed_seconds <= fast {
        RewardTier::Elite
    } else if elapsed_seconds <= normal {
        RewardTier::Fast
    } else {
        RewardTier::Complete
    }
}

/// Compute the end-of-session reward.
pub fn calculate_reward(correct_count: u32, elapsed_seconds: u32, question_count: u32) -> Reward {
    let tier = tier_for(elapsed_seconds, question_count);
    let final_gold = correct_count.saturating_mul(tier.multiplier());
    Reward {
        tier,
        base_gold: correct_count,
        final_gold,
        bonus_gold: final_gold - correct_count,
    }
}
