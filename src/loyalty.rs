// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Telecom Network Engine - Loyalty Tiers
//
// Normal -> Gold on a payment that lifts the balance over the threshold.
// Gold -> Platinum after an unbroken streak of video calls.
// Platinum -> Gold after an unbroken streak of texts.
// Gold/Platinum -> Normal as soon as the balance goes negative.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{CommunicationKind, Credits, TierLabel};

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Thresholds driving tier transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoyaltyPolicy {
    /// Balance that must be strictly exceeded after a payment to reach Gold.
    pub gold_balance_threshold: Decimal,
    /// Consecutive origin video calls that take Gold to Platinum.
    pub platinum_video_streak: u32,
    /// Consecutive origin texts that take Platinum back to Gold.
    pub gold_text_streak: u32,
}

impl Default for LoyaltyPolicy {
    fn default() -> Self {
        Self {
            gold_balance_threshold: dec!(500),
            platinum_video_streak: 5,
            gold_text_streak: 2,
        }
    }
}

// ---------------------------------------------------------------------------
// LoyaltyTier
// ---------------------------------------------------------------------------

/// A client's tier together with the streak the tier is counting.
///
/// Transitions return a fresh value; the owner swaps it in wholesale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoyaltyTier {
    #[default]
    Normal,
    Gold {
        video_streak: u32,
    },
    Platinum {
        text_streak: u32,
    },
}

impl LoyaltyTier {
    pub fn label(&self) -> TierLabel {
        match self {
            Self::Normal => TierLabel::Normal,
            Self::Gold { .. } => TierLabel::Gold,
            Self::Platinum { .. } => TierLabel::Platinum,
        }
    }

    /// Tier after the client paid a communication. `balance` already
    /// reflects the payment.
    pub fn on_payment(self, balance: Credits, policy: &LoyaltyPolicy) -> Self {
        match self {
            Self::Normal if balance.0 > policy.gold_balance_threshold => Self::Gold { video_streak: 0 },
            other => other,
        }
    }

    /// Tier after the client completed a communication as its origin.
    /// `balance` already includes that communication's debt.
    pub fn on_communication(self, balance: Credits, kind: CommunicationKind, policy: &LoyaltyPolicy) -> Self {
        match self {
            Self::Normal => Self::Normal,
            Self::Gold { .. } | Self::Platinum { .. } if balance.is_negative() => Self::Normal,
            Self::Gold { video_streak } => {
                if kind != CommunicationKind::Video {
                    return Self::Gold { video_streak: 0 };
                }
                let streak = video_streak + 1;
                if streak >= policy.platinum_video_streak {
                    Self::Platinum { text_streak: 0 }
                } else {
                    Self::Gold { video_streak: streak }
                }
            }
            Self::Platinum { text_streak } => {
                if kind.is_interactive() {
                    return Self::Platinum { text_streak: 0 };
                }
                let streak = text_streak + 1;
                if streak >= policy.gold_text_streak {
                    Self::Gold { video_streak: 0 }
                } else {
                    Self::Platinum { text_streak: streak }
                }
            }
        }
    }
}
