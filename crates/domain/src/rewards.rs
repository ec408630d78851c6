//! Reward calculator for prediction stakes
//!
//! Two multiplier tables coexist deliberately: `vote_multiplier` backs the
//! per-vote payout at resolution time, while `generation_multiplier` backs
//! the reward estimate shown when a prediction is created. They diverge in
//! the platform's ledger and are kept as separate named functions rather
//! than unified.

use serde::{Deserialize, Serialize};

use crate::entities::Difficulty;
use crate::UserId;

/// One reward or refund owed to a user.
///
/// State machines return ledgers of these; applying them to token balances
/// is the caller's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardEntry {
    pub user_id: UserId,
    pub amount: u32,
}

/// Multiplier applied to a winning vote's stake at resolution time.
pub fn vote_multiplier(difficulty: Difficulty) -> f64 {
    match difficulty {
        Difficulty::Easy => 1.2,
        Difficulty::Medium => 1.5,
        Difficulty::Hard => 2.0,
        Difficulty::Extreme => 3.0,
    }
}

/// Multiplier used by the generation-time reward estimate.
pub fn generation_multiplier(difficulty: Difficulty) -> u32 {
    match difficulty {
        Difficulty::Easy => 1,
        Difficulty::Medium => 2,
        Difficulty::Hard => 5,
        Difficulty::Extreme => 10,
    }
}

/// Payout for a winning vote: `round(amount * vote_multiplier)`.
///
/// Never negative; a zero stake yields zero.
pub fn vote_reward(amount: u32, difficulty: Difficulty) -> u32 {
    (f64::from(amount) * vote_multiplier(difficulty)).round() as u32
}

/// Estimated payout shown at creation time:
/// `floor((stake*2 + stake*(multiplier-1)) * (confidence/50) * accuracy)`.
///
/// `confidence` is clamped to [0, 100] and `accuracy` to [0, 1]; the result
/// is never negative, and zero stake or zero accuracy yields zero.
pub fn estimated_reward(stake: u32, difficulty: Difficulty, confidence: u32, accuracy: f64) -> u32 {
    let confidence = confidence.min(100);
    let accuracy = accuracy.clamp(0.0, 1.0);
    let multiplier = generation_multiplier(difficulty);
    let base = u64::from(stake) * 2 + u64::from(stake) * u64::from(multiplier - 1);
    let scaled = base as f64 * (f64::from(confidence) / 50.0) * accuracy;
    scaled.floor() as u32
}
