// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Telecom Network Engine - Tariff Plans

//! Tariff tables: pricing of a finished communication.
//!
//! A plan is pure data indexed by loyalty tier and communication kind, so an
//! alternate plan is a different table rather than different code. The
//! built-in `base` plan is [`TariffPlan::default`].

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{CommunicationKind, Credits, TierLabel};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while loading a plan from its serialized form.
#[derive(Debug, thiserror::Error)]
pub enum TariffError {
    #[error("tariff plan does not parse: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("text bands for {0} do not end with an open-ended band")]
    UnboundedBandMissing(TierLabel),

    #[error("{tier} rate {rate} is outside 0..={max}", max = TariffPlan::MAX_RATE)]
    RateOutOfRange { tier: TierLabel, rate: Decimal },
}

// ---------------------------------------------------------------------------
// Text pricing
// ---------------------------------------------------------------------------

/// How a text band charges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextPricing {
    /// Fixed amount regardless of length.
    Flat(Decimal),
    /// Amount multiplied by the character count.
    PerChar(Decimal),
}

/// One length band. Applies to messages shorter than `below` characters;
/// `None` is the open-ended tail band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBand {
    pub below: Option<u32>,
    pub pricing: TextPricing,
}

impl TextBand {
    const fn under(below: u32, pricing: TextPricing) -> Self {
        Self { below: Some(below), pricing }
    }

    const fn rest(pricing: TextPricing) -> Self {
        Self { below: None, pricing }
    }

    fn covers(&self, chars: u32) -> bool {
        self.below.map_or(true, |limit| chars < limit)
    }
}

// ---------------------------------------------------------------------------
// Interactive pricing
// ---------------------------------------------------------------------------

/// Per-unit rate of an interactive medium.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractiveRate {
    /// Rate when the destination is in the origin's friend set.
    pub friendly: Decimal,
    pub regular: Decimal,
}

impl InteractiveRate {
    const fn new(friendly: Decimal, regular: Decimal) -> Self {
        Self { friendly, regular }
    }

    pub fn per_unit(&self, friendly: bool) -> Decimal {
        if friendly {
            self.friendly
        } else {
            self.regular
        }
    }
}

// ---------------------------------------------------------------------------
// TierRates / TariffPlan
// ---------------------------------------------------------------------------

/// Everything one loyalty tier pays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierRates {
    /// Checked in order; the first covering band wins.
    pub text: Vec<TextBand>,
    pub voice: InteractiveRate,
    pub video: InteractiveRate,
}

impl TierRates {
    fn text_cost(&self, chars: u32) -> Option<Decimal> {
        match self.text.iter().find(|band| band.covers(chars)) {
            Some(TextBand { pricing: TextPricing::Flat(amount), .. }) => Some(*amount),
            Some(TextBand { pricing: TextPricing::PerChar(rate), .. }) => rate.checked_mul(Decimal::from(chars)),
            None => Some(Decimal::ZERO),
        }
    }

    fn rates(&self) -> impl Iterator<Item = Decimal> + '_ {
        let text = self.text.iter().map(|band| match band.pricing {
            TextPricing::Flat(amount) | TextPricing::PerChar(amount) => amount,
        });
        let interactive = [self.voice, self.video].into_iter().flat_map(|r| [r.friendly, r.regular]);
        text.chain(interactive)
    }

    fn has_open_band(&self) -> bool {
        self.text.last().is_some_and(|band| band.below.is_none())
    }
}

/// Pricing table keyed by tier and communication kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TariffPlan {
    pub normal: TierRates,
    pub gold: TierRates,
    pub platinum: TierRates,
}

impl Default for TariffPlan {
    fn default() -> Self {
        use TextPricing::{Flat, PerChar};
        Self {
            normal: TierRates {
                text: vec![
                    TextBand::under(50, Flat(dec!(10))),
                    TextBand::under(100, Flat(dec!(16))),
                    TextBand::rest(PerChar(dec!(2))),
                ],
                voice: InteractiveRate::new(dec!(10), dec!(20)),
                video: InteractiveRate::new(dec!(15), dec!(30)),
            },
            gold: TierRates {
                text: vec![TextBand::under(100, Flat(dec!(10))), TextBand::rest(PerChar(dec!(2)))],
                voice: InteractiveRate::new(dec!(5), dec!(10)),
                video: InteractiveRate::new(dec!(5), dec!(10)),
            },
            platinum: TierRates {
                text: vec![TextBand::under(50, Flat(dec!(0))), TextBand::rest(Flat(dec!(4)))],
                voice: InteractiveRate::new(dec!(10), dec!(20)),
                video: InteractiveRate::new(dec!(5), dec!(10)),
            },
        }
    }
}

impl TariffPlan {
    /// Name of the plan every network ships with.
    pub const BASE: &'static str = "base";

    /// Largest accepted amount in any band or rate. Keeps every cost, and
    /// every balance summed over `u32` communications, inside `Decimal`.
    pub const MAX_RATE: Decimal = dec!(1000000);

    /// Look up the rates of a given [`TierLabel`].
    pub fn for_tier(&self, tier: TierLabel) -> &TierRates {
        match tier {
            TierLabel::Normal => &self.normal,
            TierLabel::Gold => &self.gold,
            TierLabel::Platinum => &self.platinum,
        }
    }

    /// Cost of a finished communication.
    ///
    /// `units` is the character count for text and the duration otherwise.
    /// `friendly` only affects interactive media. `None` when the cost does
    /// not fit in a `Decimal`.
    pub fn price(&self, kind: CommunicationKind, tier: TierLabel, units: u32, friendly: bool) -> Option<Credits> {
        let rates = self.for_tier(tier);
        let cost = match kind {
            CommunicationKind::Text => rates.text_cost(units),
            CommunicationKind::Voice => rates.voice.per_unit(friendly).checked_mul(Decimal::from(units)),
            CommunicationKind::Video => rates.video.per_unit(friendly).checked_mul(Decimal::from(units)),
        };
        cost.map(Credits::from_decimal)
    }

    /// Check that every tier prices long texts and that no amount is negative
    /// or above [`MAX_RATE`](Self::MAX_RATE).
    pub fn validate(&self) -> Result<(), TariffError> {
        for tier in [TierLabel::Normal, TierLabel::Gold, TierLabel::Platinum] {
            let rates = self.for_tier(tier);
            if !rates.has_open_band() {
                return Err(TariffError::UnboundedBandMissing(tier));
            }
            if let Some(rate) = rates.rates().find(|r| r.is_sign_negative() || *r > Self::MAX_RATE) {
                return Err(TariffError::RateOutOfRange { tier, rate });
            }
        }
        Ok(())
    }

    /// Load a plan from JSON and [`validate`](Self::validate) it.
    pub fn from_json(raw: &str) -> Result<Self, TariffError> {
        let plan: Self = serde_json::from_str(raw)?;
        plan.validate()?;
        Ok(plan)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use CommunicationKind::{Text, Video, Voice};
    use TierLabel::{Gold, Normal, Platinum};

    fn base() -> TariffPlan {
        TariffPlan::default()
    }

    #[test]
    fn test_normal_text_bands() {
        let plan = base();
        assert_eq!(plan.price(Text, Normal, 40, false), Some(Credits(dec!(10))));
        assert_eq!(plan.price(Text, Normal, 49, false), Some(Credits(dec!(10))));
        assert_eq!(plan.price(Text, Normal, 50, false), Some(Credits(dec!(16))));
        assert_eq!(plan.price(Text, Normal, 99, false), Some(Credits(dec!(16))));
        assert_eq!(plan.price(Text, Normal, 100, false), Some(Credits(dec!(200))));
    }

    #[test]
    fn test_gold_and_platinum_text_bands() {
        let plan = base();
        assert_eq!(plan.price(Text, Gold, 99, false), Some(Credits(dec!(10))));
        assert_eq!(plan.price(Text, Gold, 120, false), Some(Credits(dec!(240))));
        assert_eq!(plan.price(Text, Platinum, 49, false), Some(Credits(dec!(0))));
        assert_eq!(plan.price(Text, Platinum, 500, false), Some(Credits(dec!(4))));
    }

    #[test]
    fn test_text_ignores_friendship() {
        let plan = base();
        assert_eq!(plan.price(Text, Normal, 10, true), plan.price(Text, Normal, 10, false));
    }

    #[test]
    fn test_interactive_rates_per_tier() {
        let plan = base();
        assert_eq!(plan.price(Voice, Normal, 3, false), Some(Credits(dec!(60))));
        assert_eq!(plan.price(Voice, Normal, 3, true), Some(Credits(dec!(30))));
        assert_eq!(plan.price(Voice, Gold, 3, false), Some(Credits(dec!(30))));
        assert_eq!(plan.price(Voice, Platinum, 3, true), Some(Credits(dec!(30))));
        assert_eq!(plan.price(Video, Normal, 2, false), Some(Credits(dec!(60))));
        assert_eq!(plan.price(Video, Normal, 2, true), Some(Credits(dec!(30))));
        assert_eq!(plan.price(Video, Gold, 2, true), Some(Credits(dec!(10))));
        assert_eq!(plan.price(Video, Platinum, 2, false), Some(Credits(dec!(20))));
    }

    #[test]
    fn test_zero_duration_costs_nothing() {
        assert!(base().price(Video, Normal, 0, false).is_some_and(|c| c.is_zero()));
    }

    #[test]
    fn test_json_round_trip_keeps_rates() {
        let raw = serde_json::to_string(&base()).expect("test: serialize plan");
        let plan = TariffPlan::from_json(&raw).expect("test: parse plan");
        assert_eq!(plan, base());
    }

    #[test]
    fn test_json_without_tail_band_is_rejected() {
        let mut plan = base();
        plan.gold.text.pop();
        let raw = serde_json::to_string(&plan).expect("test: serialize plan");
        let err = TariffPlan::from_json(&raw).expect_err("test: gold has no tail band");
        assert!(matches!(err, TariffError::UnboundedBandMissing(TierLabel::Gold)), "got {err:?}");
    }

    #[test]
    fn test_overflowing_cost_is_none() {
        let mut plan = base();
        plan.normal.voice.regular = Decimal::MAX;
        plan.normal.text = vec![TextBand::rest(TextPricing::PerChar(Decimal::MAX))];
        assert_eq!(plan.price(Voice, Normal, 2, false), None);
        assert_eq!(plan.price(Text, Normal, 2, false), None);
        assert_eq!(plan.price(Voice, Normal, 1, false), Some(Credits(Decimal::MAX)));
    }

    #[test]
    fn test_json_rate_above_cap_is_rejected() {
        let mut plan = base();
        plan.normal.voice.regular = Decimal::MAX;
        let raw = serde_json::to_string(&plan).expect("test: serialize plan");
        let err = TariffPlan::from_json(&raw).expect_err("test: rate above cap");
        assert!(
            matches!(err, TariffError::RateOutOfRange { tier: TierLabel::Normal, rate } if rate == Decimal::MAX),
            "got {err:?}"
        );
    }

    #[test]
    fn test_negative_rate_is_rejected() {
        let mut plan = base();
        plan.platinum.text[0].pricing = TextPricing::Flat(dec!(-1));
        let err = plan.validate().expect_err("test: negative amount");
        assert!(matches!(err, TariffError::RateOutOfRange { tier: TierLabel::Platinum, .. }), "got {err:?}");
        assert!(base().validate().is_ok());
    }
}
